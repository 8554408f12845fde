//! Terminal bound to the process's stdin and stdout.

use std::io::{self, Read, Write};
use std::thread;

use futures::channel::mpsc;

use termshell_types::terminal::{DataListener, DataListeners, ListenerId, Terminal};

use crate::utf8::drain_utf8;

/// Writes go straight to stdout; input arrives through [`StdioTerminal::emit`],
/// fed by [`spawn_stdin_reader`].
#[derive(Default)]
pub struct StdioTerminal {
    listeners: DataListeners,
}

impl StdioTerminal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&self, data: &str) {
        self.listeners.emit(data);
    }
}

impl Terminal for StdioTerminal {
    fn write(&self, text: &str) {
        let mut out = io::stdout().lock();
        if let Err(e) = out.write_all(text.as_bytes()).and_then(|()| out.flush()) {
            log::warn!("stdout write failed: {e}");
        }
    }

    fn on_data(&self, listener: DataListener) -> ListenerId {
        self.listeners.subscribe(listener)
    }

    fn off_data(&self, id: ListenerId) {
        self.listeners.unsubscribe(id);
    }
}

/// Read stdin on a background thread, forwarding each chunk as it arrives.
///
/// The channel closes at end of input or on a read error.
pub fn spawn_stdin_reader() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded();
    thread::spawn(move || {
        let mut stdin = io::stdin().lock();
        let mut buf = [0u8; 1024];
        let mut pending = Vec::new();
        loop {
            match stdin.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => {
                    pending.extend_from_slice(&buf[..n]);
                    let chunk = drain_utf8(&mut pending);
                    if chunk.is_empty() {
                        continue;
                    }
                    if tx.unbounded_send(chunk).is_err() {
                        break;
                    }
                },
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    log::error!("stdin read failed: {e}");
                    break;
                },
            }
        }
        log::debug!("stdin closed");
    });
    rx
}
