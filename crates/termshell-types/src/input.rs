//! Raw terminal input decoding.
//!
//! Terminals deliver keystrokes as byte chunks mixing printable text,
//! control characters, and ANSI escape sequences. [`decode`] maps a chunk
//! to platform-agnostic [`Key`] events; line editors never look at raw
//! bytes themselves.

/// A decoded keystroke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// Printable character.
    Char(char),
    /// Carriage return or line feed.
    Enter,
    /// Delete-left (DEL or BS).
    Backspace,
    /// Delete-right (`ESC [ 3 ~`).
    Delete,
    /// Horizontal tab (completion trigger).
    Tab,
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    /// Ctrl-C.
    Interrupt,
    /// Ctrl-D.
    EndOfInput,
    /// Anything else: stray control bytes, unsupported escapes.
    Unknown,
}

const ESC: char = '\x1b';

/// Decode a raw input chunk into keys, preserving order.
///
/// A `\r\n` pair counts as a single [`Key::Enter`].
pub fn decode(data: &str) -> Vec<Key> {
    let mut keys = Vec::new();
    let mut chars = data.chars().peekable();

    while let Some(ch) = chars.next() {
        let key = match ch {
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                Key::Enter
            },
            '\n' => Key::Enter,
            '\t' => Key::Tab,
            '\x7f' | '\x08' => Key::Backspace,
            '\x03' => Key::Interrupt,
            '\x04' => Key::EndOfInput,
            ESC => decode_escape(&mut chars),
            c if c.is_control() => Key::Unknown,
            c => Key::Char(c),
        };
        keys.push(key);
    }

    keys
}

/// Decode the remainder of an escape sequence after `ESC`.
fn decode_escape(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> Key {
    match chars.peek() {
        Some('[') | Some('O') => {
            chars.next();
        },
        _ => return Key::Unknown,
    }

    // Collect numeric parameters up to the final byte.
    let mut params = String::new();
    while let Some(&c) = chars.peek() {
        if c.is_ascii_digit() || c == ';' {
            params.push(c);
            chars.next();
        } else {
            break;
        }
    }

    match (chars.next(), params.as_str()) {
        (Some('A'), _) => Key::Up,
        (Some('B'), _) => Key::Down,
        (Some('C'), _) => Key::Right,
        (Some('D'), _) => Key::Left,
        (Some('H'), _) => Key::Home,
        (Some('F'), _) => Key::End,
        (Some('~'), "1") | (Some('~'), "7") => Key::Home,
        (Some('~'), "4") | (Some('~'), "8") => Key::End,
        (Some('~'), "3") => Key::Delete,
        _ => Key::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn printable_text() {
        assert_eq!(decode("hi"), vec![Key::Char('h'), Key::Char('i')]);
    }

    #[test]
    fn unicode_text() {
        assert_eq!(decode("\u{e9}"), vec![Key::Char('\u{e9}')]);
    }

    #[test]
    fn enter_variants() {
        assert_eq!(decode("\r"), vec![Key::Enter]);
        assert_eq!(decode("\n"), vec![Key::Enter]);
        assert_eq!(decode("\r\n"), vec![Key::Enter]);
        assert_eq!(decode("\n\n"), vec![Key::Enter, Key::Enter]);
    }

    #[test]
    fn control_keys() {
        assert_eq!(
            decode("\t\x7f\x08\x03\x04"),
            vec![
                Key::Tab,
                Key::Backspace,
                Key::Backspace,
                Key::Interrupt,
                Key::EndOfInput
            ]
        );
    }

    #[test]
    fn arrow_keys() {
        assert_eq!(
            decode("\x1b[A\x1b[B\x1b[C\x1b[D"),
            vec![Key::Up, Key::Down, Key::Right, Key::Left]
        );
    }

    #[test]
    fn ss3_arrows_and_home_end() {
        assert_eq!(decode("\x1bOA"), vec![Key::Up]);
        assert_eq!(decode("\x1bOH\x1bOF"), vec![Key::Home, Key::End]);
    }

    #[test]
    fn tilde_sequences() {
        assert_eq!(decode("\x1b[3~"), vec![Key::Delete]);
        assert_eq!(decode("\x1b[1~\x1b[4~"), vec![Key::Home, Key::End]);
    }

    #[test]
    fn unsupported_escape_is_unknown() {
        assert_eq!(decode("\x1b[5~"), vec![Key::Unknown]);
        assert_eq!(decode("\x1bx"), vec![Key::Unknown, Key::Char('x')]);
    }

    #[test]
    fn bare_escape_at_end() {
        assert_eq!(decode("\x1b"), vec![Key::Unknown]);
    }

    #[test]
    fn mixed_chunk_keeps_order() {
        assert_eq!(
            decode("a\x1b[Db\r"),
            vec![Key::Char('a'), Key::Left, Key::Char('b'), Key::Enter]
        );
    }

    #[test]
    fn stray_control_is_unknown() {
        assert_eq!(decode("\x01"), vec![Key::Unknown]);
    }

    mod prop {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn printable_ascii_decodes_one_char_per_key(text in "[ -~]{0,64}") {
                let keys = decode(&text);
                prop_assert_eq!(keys.len(), text.chars().count());
                for (key, ch) in keys.iter().zip(text.chars()) {
                    prop_assert_eq!(*key, Key::Char(ch));
                }
            }

            #[test]
            fn decode_never_panics(text in "\\PC{0,32}") {
                let _ = decode(&text);
            }
        }
    }
}
