//! Shared test utilities for termshell-core tests.
//!
//! Provides a [`MockEditor`] that queues input lines and counts
//! attach/detach transitions, and a thread-local log capture for asserting
//! on warnings.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;

use futures::channel::oneshot;
use futures::future::{self, FutureExt, LocalBoxFuture};
use log::{Level, LevelFilter, Log, Metadata, Record};

use termshell_types::editor::{AutocompleteHandler, LineEditor};
use termshell_types::error::{Result, ShellError};

/// Line editor double driven directly by the test.
#[derive(Default)]
pub struct MockEditor {
    queued: RefCell<VecDeque<String>>,
    queued_chars: RefCell<VecDeque<char>>,
    pending_line: RefCell<Option<oneshot::Sender<Result<String>>>>,
    pending_char: RefCell<Option<oneshot::Sender<Result<char>>>>,
    output: RefCell<String>,
    completers: RefCell<Vec<AutocompleteHandler>>,
    closed: Cell<bool>,
    pub reads: Cell<usize>,
    pub attaches: Cell<usize>,
    pub detaches: Cell<usize>,
}

impl MockEditor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer the pending line read, or queue the line for the next one.
    pub fn feed(&self, line: &str) {
        match self.pending_line.take() {
            Some(tx) => {
                let _ = tx.send(Ok(line.to_string()));
            },
            None => self.queued.borrow_mut().push_back(line.to_string()),
        }
    }

    pub fn feed_char(&self, ch: char) {
        match self.pending_char.take() {
            Some(tx) => {
                let _ = tx.send(Ok(ch));
            },
            None => self.queued_chars.borrow_mut().push_back(ch),
        }
    }

    /// End input: the pending read and later reads fail with `InputClosed`.
    pub fn close(&self) {
        self.closed.set(true);
        if let Some(tx) = self.pending_line.take() {
            let _ = tx.send(Err(ShellError::InputClosed));
        }
        if let Some(tx) = self.pending_char.take() {
            let _ = tx.send(Err(ShellError::InputClosed));
        }
    }

    pub fn has_pending_read(&self) -> bool {
        self.pending_line.borrow().is_some() || self.pending_char.borrow().is_some()
    }

    pub fn output(&self) -> String {
        self.output.borrow().clone()
    }

    /// Run every registered completion handler.
    pub fn complete(&self, index: usize, tokens: &[String]) -> Vec<String> {
        self.completers
            .borrow()
            .iter()
            .flat_map(|h| h(index, tokens))
            .collect()
    }
}

impl LineEditor for MockEditor {
    fn read(&self, _prompt: &str) -> LocalBoxFuture<'static, Result<String>> {
        self.reads.set(self.reads.get() + 1);
        if self.closed.get() {
            return future::ready(Err(ShellError::InputClosed)).boxed_local();
        }
        if let Some(line) = self.queued.borrow_mut().pop_front() {
            return future::ready(Ok(line)).boxed_local();
        }
        let (tx, rx) = oneshot::channel();
        *self.pending_line.borrow_mut() = Some(tx);
        async move { rx.await.unwrap_or(Err(ShellError::InputClosed)) }.boxed_local()
    }

    fn read_char(&self, _prompt: &str) -> LocalBoxFuture<'static, Result<char>> {
        self.reads.set(self.reads.get() + 1);
        if self.closed.get() {
            return future::ready(Err(ShellError::InputClosed)).boxed_local();
        }
        if let Some(ch) = self.queued_chars.borrow_mut().pop_front() {
            return future::ready(Ok(ch)).boxed_local();
        }
        let (tx, rx) = oneshot::channel();
        *self.pending_char.borrow_mut() = Some(tx);
        async move { rx.await.unwrap_or(Err(ShellError::InputClosed)) }.boxed_local()
    }

    fn abort_read(&self, reason: &str) {
        if let Some(tx) = self.pending_line.take() {
            let _ = tx.send(Err(ShellError::ReadAborted(reason.to_string())));
        }
        if let Some(tx) = self.pending_char.take() {
            let _ = tx.send(Err(ShellError::ReadAborted(reason.to_string())));
        }
    }

    fn print(&self, text: &str) {
        self.output.borrow_mut().push_str(text);
    }

    fn println(&self, text: &str) {
        let mut out = self.output.borrow_mut();
        out.push_str(text);
        out.push('\n');
    }

    fn print_wide(&self, items: &[String]) {
        self.println(&items.join(" "));
    }

    fn attach(&self) {
        self.attaches.set(self.attaches.get() + 1);
    }

    fn detach(&self) {
        self.detaches.set(self.detaches.get() + 1);
    }

    fn add_autocomplete_handler(&self, handler: AutocompleteHandler) {
        self.completers.borrow_mut().push(handler);
    }
}

thread_local! {
    static WARNINGS: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
}

/// Logger that keeps warnings per test thread.
struct CaptureLogger;

impl Log for CaptureLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= Level::Warn
    }

    fn log(&self, record: &Record<'_>) {
        if record.level() == Level::Warn {
            WARNINGS.with(|w| w.borrow_mut().push(record.args().to_string()));
        }
    }

    fn flush(&self) {}
}

static LOGGER: CaptureLogger = CaptureLogger;

/// Install the capture logger (once per process) and clear this thread's
/// captured warnings.
pub fn init_capture_logger() {
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(LevelFilter::Warn);
    }
    WARNINGS.with(|w| w.borrow_mut().clear());
}

/// Warnings logged on this thread since [`init_capture_logger`].
pub fn captured_warnings() -> Vec<String> {
    WARNINGS.with(|w| w.borrow().clone())
}
