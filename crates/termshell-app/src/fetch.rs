//! Minimal HTTP/1.0 GET client for the `fetch` command.
//!
//! Plain HTTP over `std::net::TcpStream` only. The request runs on a worker
//! thread and the body is streamed back in chunks as it arrives, so the
//! shell's executor never blocks on the network.

use std::io::{Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::thread;
use std::time::Duration;

use futures::channel::mpsc;

use termshell_types::error::{Result, ShellError};

use crate::utf8::drain_utf8;

/// Upper bound on the status line plus headers.
const MAX_HEAD_SIZE: usize = 16 * 1024;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

const READ_TIMEOUT: Duration = Duration::from_secs(15);

/// Parsed `http://host[:port][/path]` URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Url {
    pub host: String,
    pub port: u16,
    pub path: String,
}

impl Url {
    /// Parse a URL. A missing scheme is taken as `http://`.
    pub fn parse(input: &str) -> Result<Self> {
        let rest = match input.split_once("://") {
            Some(("http", rest)) => rest,
            Some(("https", _)) => {
                return Err(ShellError::Command(
                    "https is not supported, use http://".to_string(),
                ));
            },
            Some((scheme, _)) => {
                return Err(ShellError::Command(format!("unsupported scheme: {scheme}")));
            },
            None => input,
        };

        let (authority, path) = match rest.find('/') {
            Some(i) => (&rest[..i], &rest[i..]),
            None => (rest, "/"),
        };
        let (host, port) = match authority.rsplit_once(':') {
            Some((host, port)) => {
                let port = port
                    .parse::<u16>()
                    .map_err(|_| ShellError::Command(format!("bad port: {port}")))?;
                (host, port)
            },
            None => (authority, 80),
        };
        if host.is_empty() {
            return Err(ShellError::Command(format!("missing host in {input}")));
        }

        Ok(Self {
            host: host.to_string(),
            port,
            path: path.to_string(),
        })
    }

    fn host_header(&self) -> String {
        if self.port == 80 {
            self.host.clone()
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

/// Start a GET for `url` on a worker thread.
///
/// Body chunks arrive on the returned channel; a failure is sent as the
/// last item. The channel closes when the response ends.
pub fn spawn_get(url: Url) -> mpsc::UnboundedReceiver<Result<String>> {
    let (tx, rx) = mpsc::unbounded();
    thread::spawn(move || {
        let result = get(&url, |chunk| tx.unbounded_send(Ok(chunk)).is_ok());
        if let Err(e) = result {
            log::debug!("fetch {}{} failed: {e}", url.host, url.path);
            let _ = tx.unbounded_send(Err(e));
        }
    });
    rx
}

/// Perform the request, handing body text to `sink` until it returns
/// `false` or the body ends.
fn get(url: &Url, mut sink: impl FnMut(String) -> bool) -> Result<()> {
    let mut stream = tcp_connect(&url.host, url.port)?;
    send_request(&mut stream, url)?;

    let mut buf = Vec::with_capacity(8192);
    let mut chunk = [0u8; 8192];
    let body_start = loop {
        let n = stream.read(&mut chunk)?;
        if n == 0 {
            return Err(ShellError::Command(
                "connection closed before response headers".to_string(),
            ));
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(end) = find_head_end(&buf) {
            break end;
        }
        if buf.len() > MAX_HEAD_SIZE {
            return Err(ShellError::Command("response headers too large".to_string()));
        }
    };

    let status = parse_status(&String::from_utf8_lossy(&buf[..body_start]))?;
    if !(200..300).contains(&status) {
        return Err(ShellError::Command(format!("HTTP {status}")));
    }

    let mut pending = buf.split_off(body_start);
    loop {
        let text = drain_utf8(&mut pending);
        if !text.is_empty() && !sink(text) {
            return Ok(());
        }
        let n = stream.read(&mut chunk)?;
        if n == 0 {
            break;
        }
        pending.extend_from_slice(&chunk[..n]);
    }
    if !pending.is_empty() {
        sink(String::from_utf8_lossy(&pending).into_owned());
    }
    Ok(())
}

/// Resolve and connect with a timeout.
pub fn tcp_connect(host: &str, port: u16) -> Result<TcpStream> {
    let addr = (host, port)
        .to_socket_addrs()?
        .next()
        .ok_or_else(|| ShellError::Command(format!("no addresses for {host}:{port}")))?;
    let stream = TcpStream::connect_timeout(&addr, CONNECT_TIMEOUT)?;
    stream.set_read_timeout(Some(READ_TIMEOUT))?;
    Ok(stream)
}

fn send_request(stream: &mut impl Write, url: &Url) -> Result<()> {
    // HTTP/1.0 keeps the body unchunked and closes the connection after it.
    let request = format!(
        "GET {} HTTP/1.0\r\n\
         Host: {}\r\n\
         User-Agent: termshell/{}\r\n\
         Accept: */*\r\n\
         \r\n",
        url.path,
        url.host_header(),
        env!("CARGO_PKG_VERSION"),
    );
    stream.write_all(request.as_bytes())?;
    Ok(())
}

/// Offset of the first body byte, if the blank line has arrived.
fn find_head_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n").map(|i| i + 4)
}

fn parse_status(head: &str) -> Result<u16> {
    let status_line = head.lines().next().unwrap_or_default();
    let mut parts = status_line.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some(version), Some(code)) if version.starts_with("HTTP/") => code
            .parse()
            .map_err(|_| ShellError::Command(format!("bad status code: {code}"))),
        _ => Err(ShellError::Command(format!(
            "malformed status line: {status_line}"
        ))),
    }
}
