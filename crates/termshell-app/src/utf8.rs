//! Decoding byte chunks that may split a UTF-8 sequence.

/// Take the longest decodable prefix of `pending` as text, leaving an
/// incomplete trailing sequence behind for the next chunk.
///
/// Bytes that can never form valid UTF-8 are replaced with U+FFFD.
pub fn drain_utf8(pending: &mut Vec<u8>) -> String {
    let valid = match std::str::from_utf8(pending) {
        Ok(_) => pending.len(),
        Err(e) if e.error_len().is_none() => e.valid_up_to(),
        Err(_) => pending.len(),
    };
    let rest = pending.split_off(valid);
    let text = String::from_utf8_lossy(pending).into_owned();
    *pending = rest;
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_drains_fully() {
        let mut pending = b"hello".to_vec();
        assert_eq!(drain_utf8(&mut pending), "hello");
        assert!(pending.is_empty());
    }

    #[test]
    fn split_sequence_is_carried_over() {
        let bytes = "h\u{e9}".as_bytes();
        let mut pending = bytes[..2].to_vec();
        assert_eq!(drain_utf8(&mut pending), "h");
        assert_eq!(pending, vec![bytes[1]]);

        pending.push(bytes[2]);
        assert_eq!(drain_utf8(&mut pending), "\u{e9}");
        assert!(pending.is_empty());
    }

    #[test]
    fn invalid_bytes_are_replaced() {
        let mut pending = vec![b'a', 0xff, b'b'];
        assert_eq!(drain_utf8(&mut pending), "a\u{fffd}b");
        assert!(pending.is_empty());
    }
}
