//! LocalEcho: line editing over a raw terminal.
//!
//! The editor owns one data subscription on the terminal while attached.
//! Keystrokes that arrive with no read in flight are dropped.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use futures::channel::oneshot;
use futures::future::{self, FutureExt, LocalBoxFuture};

use termshell_types::config::ShellConfig;
use termshell_types::editor::{AutocompleteHandler, LineEditor};
use termshell_types::error::{Result, ShellError};
use termshell_types::input::{Key, decode};
use termshell_types::terminal::{ListenerId, Terminal};

use crate::buffer::LineBuffer;
use crate::history::History;

/// The read currently waiting on user input.
enum PendingRead {
    Line(oneshot::Sender<Result<String>>),
    Char(oneshot::Sender<Result<char>>),
}

impl PendingRead {
    fn fail(self, err: ShellError) {
        // The reader may have been dropped already; nothing to report then.
        match self {
            PendingRead::Line(tx) => {
                let _ = tx.send(Err(err));
            },
            PendingRead::Char(tx) => {
                let _ = tx.send(Err(err));
            },
        }
    }
}

/// Local-echo line editor bound to a terminal.
pub struct LocalEcho {
    this: Weak<LocalEcho>,
    terminal: Rc<dyn Terminal>,
    config: ShellConfig,
    buffer: RefCell<LineBuffer>,
    prompt: RefCell<String>,
    history: RefCell<History>,
    pending: RefCell<Option<PendingRead>>,
    completers: RefCell<Vec<AutocompleteHandler>>,
    listener: Cell<Option<ListenerId>>,
    closed: Cell<bool>,
}

impl LocalEcho {
    /// Create an editor and attach it to `terminal`.
    pub fn new(terminal: Rc<dyn Terminal>, config: &ShellConfig) -> Rc<Self> {
        let echo = Rc::new_cyclic(|this| Self {
            this: Weak::clone(this),
            terminal,
            config: config.clone(),
            buffer: RefCell::new(LineBuffer::new()),
            prompt: RefCell::new(String::new()),
            history: RefCell::new(History::new(config.history_size)),
            pending: RefCell::new(None),
            completers: RefCell::new(Vec::new()),
            listener: Cell::new(None),
            closed: Cell::new(false),
        });
        echo.attach();
        echo
    }

    /// Whether the editor currently consumes terminal input.
    pub fn is_attached(&self) -> bool {
        self.listener.get().is_some()
    }

    /// Whether input has ended.
    pub fn is_closed(&self) -> bool {
        self.closed.get()
    }

    /// Lines entered so far, oldest first.
    pub fn history(&self) -> Vec<String> {
        self.history.borrow().entries().map(str::to_string).collect()
    }

    /// End input for good: the in-flight read and every later read fail
    /// with `InputClosed`.
    pub fn close(&self) {
        if self.closed.replace(true) {
            return;
        }
        self.detach();
        if let Some(pending) = self.pending.take() {
            pending.fail(ShellError::InputClosed);
        }
        log::debug!("line editor closed");
    }

    fn handle_data(&self, data: &str) {
        for key in decode(data) {
            self.handle_key(key);
        }
    }

    fn handle_key(&self, key: Key) {
        let char_read = match &*self.pending.borrow() {
            None => return,
            Some(PendingRead::Char(_)) => true,
            Some(PendingRead::Line(_)) => false,
        };
        if char_read {
            self.handle_char_key(key);
        } else {
            self.handle_line_key(key);
        }
    }

    fn handle_char_key(&self, key: Key) {
        let ch = match key {
            Key::Char(c) => c,
            Key::Enter => '\n',
            Key::Tab => '\t',
            Key::Interrupt => {
                self.terminal.write("^C");
                self.abort_read("^C");
                return;
            },
            Key::EndOfInput => {
                self.close();
                return;
            },
            _ => return,
        };
        let pending = self.pending.take();
        if let Some(PendingRead::Char(tx)) = pending {
            self.terminal.write("\r\n");
            let _ = tx.send(Ok(ch));
        }
    }

    fn handle_line_key(&self, key: Key) {
        match key {
            Key::Char(c) => {
                let at_end = self.buffer.borrow().at_end();
                self.buffer.borrow_mut().insert(c);
                if !self.config.echo_input {
                    return;
                }
                if at_end {
                    self.terminal.write(c.encode_utf8(&mut [0; 4]));
                } else {
                    self.redraw();
                }
            },
            Key::Enter => self.submit_line(),
            Key::Backspace => {
                if self.buffer.borrow_mut().backspace() {
                    self.redraw();
                }
            },
            Key::Delete => {
                if self.buffer.borrow_mut().delete() {
                    self.redraw();
                }
            },
            Key::Left => {
                if self.buffer.borrow_mut().move_left() {
                    self.terminal.write("\x1b[D");
                }
            },
            Key::Right => {
                if self.buffer.borrow_mut().move_right() {
                    self.terminal.write("\x1b[C");
                }
            },
            Key::Home => {
                self.buffer.borrow_mut().home();
                self.redraw();
            },
            Key::End => {
                self.buffer.borrow_mut().end();
                self.redraw();
            },
            Key::Up => {
                let entry = self.history.borrow_mut().older().map(str::to_string);
                if let Some(entry) = entry {
                    self.buffer.borrow_mut().set(&entry);
                    self.redraw();
                }
            },
            Key::Down => {
                let entry = self.history.borrow_mut().newer().map(str::to_string);
                if let Some(entry) = entry {
                    self.buffer.borrow_mut().set(&entry);
                    self.redraw();
                }
            },
            Key::Tab => {
                if self.config.tab_complete {
                    self.complete();
                }
            },
            Key::Interrupt => {
                // Discard the line and prompt again; the read stays pending.
                self.terminal.write("^C\r\n");
                self.buffer.borrow_mut().clear();
                self.history.borrow_mut().reset_cursor();
                let prompt = self.prompt.borrow().clone();
                self.print(&prompt);
            },
            Key::EndOfInput => {
                if self.buffer.borrow().is_empty() {
                    self.close();
                } else if self.buffer.borrow_mut().delete() {
                    self.redraw();
                }
            },
            Key::Unknown => {},
        }
    }

    fn submit_line(&self) {
        let line = self.buffer.borrow_mut().take();
        self.history.borrow_mut().push(&line);
        if self.config.echo_input {
            self.terminal.write("\r\n");
        }
        let pending = self.pending.take();
        if let Some(PendingRead::Line(tx)) = pending {
            let _ = tx.send(Ok(line));
        }
    }

    /// Repaint the prompt's last line and the buffer, then place the cursor.
    fn redraw(&self) {
        let buffer = self.buffer.borrow();
        let prompt = self.prompt.borrow();
        let prompt_tail = prompt.rsplit('\n').next().unwrap_or("");
        let mut out = format!("\r\x1b[K{prompt_tail}{}", buffer.text());
        let back = buffer.len() - buffer.cursor();
        if back > 0 {
            out.push_str(&format!("\x1b[{back}D"));
        }
        self.terminal.write(&out);
    }

    fn complete(&self) {
        let input = self.buffer.borrow().before_cursor().to_string();
        let mut tokens: Vec<String> = input.split_whitespace().map(str::to_string).collect();
        if tokens.is_empty() || input.ends_with(char::is_whitespace) {
            tokens.push(String::new());
        }
        let index = tokens.len() - 1;
        let partial = tokens[index].clone();

        let handlers: Vec<AutocompleteHandler> =
            self.completers.borrow().iter().map(Rc::clone).collect();
        let mut candidates: Vec<String> = Vec::new();
        for candidate in handlers.iter().flat_map(|h| h(index, tokens.as_slice())) {
            if candidate.starts_with(&partial) && !candidates.contains(&candidate) {
                candidates.push(candidate);
            }
        }

        match candidates.len() {
            0 => {},
            1 => {
                let rest = format!("{} ", &candidates[0][partial.len()..]);
                self.buffer.borrow_mut().insert_str(&rest);
                self.redraw();
            },
            _ => {
                let prefix = common_prefix(&candidates);
                if prefix.len() > partial.len() {
                    self.buffer.borrow_mut().insert_str(&prefix[partial.len()..]);
                    self.redraw();
                } else {
                    self.terminal.write("\r\n");
                    self.print_wide(&candidates);
                    self.redraw();
                }
            },
        }
    }

    fn begin_read(&self, prompt: &str, pending: PendingRead) {
        if let Some(previous) = self.pending.replace(Some(pending)) {
            previous.fail(ShellError::ReadAborted(
                "superseded by a new read".to_string(),
            ));
        }
        *self.prompt.borrow_mut() = prompt.to_string();
        self.buffer.borrow_mut().clear();
        self.history.borrow_mut().reset_cursor();
        self.print(prompt);
    }
}

impl LineEditor for LocalEcho {
    fn read(&self, prompt: &str) -> LocalBoxFuture<'static, Result<String>> {
        if self.closed.get() {
            return future::ready(Err(ShellError::InputClosed)).boxed_local();
        }
        let (tx, rx) = oneshot::channel();
        self.begin_read(prompt, PendingRead::Line(tx));
        async move { rx.await.unwrap_or(Err(ShellError::InputClosed)) }.boxed_local()
    }

    fn read_char(&self, prompt: &str) -> LocalBoxFuture<'static, Result<char>> {
        if self.closed.get() {
            return future::ready(Err(ShellError::InputClosed)).boxed_local();
        }
        let (tx, rx) = oneshot::channel();
        self.begin_read(prompt, PendingRead::Char(tx));
        async move { rx.await.unwrap_or(Err(ShellError::InputClosed)) }.boxed_local()
    }

    fn abort_read(&self, reason: &str) {
        if let Some(pending) = self.pending.take() {
            self.terminal.write("\r\n");
            pending.fail(ShellError::ReadAborted(reason.to_string()));
        }
    }

    fn print(&self, text: &str) {
        self.terminal.write(&normalize_newlines(text));
    }

    fn println(&self, text: &str) {
        self.print(&format!("{text}\n"));
    }

    fn print_wide(&self, items: &[String]) {
        if items.is_empty() {
            return;
        }
        let width = items.iter().map(|i| i.chars().count()).max().unwrap_or(0) + 2;
        let cols = (self.config.columns / width).max(1);
        for row in items.chunks(cols) {
            let mut line = String::new();
            for item in row {
                line.push_str(&format!("{item:width$}"));
            }
            self.println(line.trim_end());
        }
    }

    fn attach(&self) {
        if self.listener.get().is_some() || self.closed.get() {
            return;
        }
        let this = Weak::clone(&self.this);
        let id = self.terminal.on_data(Box::new(move |data| {
            if let Some(echo) = this.upgrade() {
                echo.handle_data(data);
            }
        }));
        self.listener.set(Some(id));
        log::debug!("line editor attached (listener {})", id.0);
    }

    fn detach(&self) {
        if let Some(id) = self.listener.take() {
            self.terminal.off_data(id);
            log::debug!("line editor detached (listener {})", id.0);
        }
    }

    fn add_autocomplete_handler(&self, handler: AutocompleteHandler) {
        self.completers.borrow_mut().push(handler);
    }
}

impl Drop for LocalEcho {
    fn drop(&mut self) {
        if let Some(id) = self.listener.take() {
            self.terminal.off_data(id);
        }
    }
}

/// Convert bare `\n` to `\r\n` so output starts at column zero.
fn normalize_newlines(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\n', "\r\n")
}

/// Longest common prefix of all items, on character boundaries.
fn common_prefix(items: &[String]) -> &str {
    let Some(first) = items.first() else {
        return "";
    };
    let mut len = first.len();
    for item in &items[1..] {
        let shared = first
            .char_indices()
            .zip(item.chars())
            .take_while(|((_, a), b)| a == b)
            .last()
            .map_or(0, |((i, a), _)| i + a.len_utf8());
        len = len.min(shared);
    }
    &first[..len]
}
