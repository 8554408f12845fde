//! Terminal collaborator trait and an in-memory implementation.
//!
//! A terminal accepts text for display and emits raw input chunks to any
//! subscribed data listeners. Everything runs on one thread, so the trait
//! takes `&self` and implementations use interior mutability.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Callback invoked with each raw input chunk.
pub type DataListener = Box<dyn FnMut(&str)>;

/// Handle returned by [`Terminal::on_data`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// Display surface plus raw input event source.
pub trait Terminal {
    /// Write text to the display.
    fn write(&self, text: &str);

    /// Subscribe to raw input data events.
    fn on_data(&self, listener: DataListener) -> ListenerId;

    /// Remove a data listener. Unknown ids are ignored.
    fn off_data(&self, id: ListenerId);
}

/// Subscriber list for a terminal's data event.
///
/// Terminal implementations embed one of these to get `on_data`/`off_data`
/// bookkeeping and re-entrancy-safe dispatch.
#[derive(Default)]
pub struct DataListeners {
    listeners: RefCell<Vec<(ListenerId, Rc<RefCell<DataListener>>)>>,
    next_id: Cell<u64>,
}

impl DataListeners {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, listener: DataListener) -> ListenerId {
        let id = ListenerId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.listeners
            .borrow_mut()
            .push((id, Rc::new(RefCell::new(listener))));
        id
    }

    pub fn unsubscribe(&self, id: ListenerId) {
        self.listeners.borrow_mut().retain(|(i, _)| *i != id);
    }

    pub fn len(&self) -> usize {
        self.listeners.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Deliver a raw input chunk to every subscribed listener.
    ///
    /// Callbacks may subscribe, unsubscribe, or write while this runs.
    /// Listeners removed by an earlier callback during the same emit are
    /// skipped.
    pub fn emit(&self, data: &str) {
        let snapshot: Vec<(ListenerId, Rc<RefCell<DataListener>>)> = self
            .listeners
            .borrow()
            .iter()
            .map(|(id, l)| (*id, Rc::clone(l)))
            .collect();
        for (id, listener) in snapshot {
            let still_subscribed = self.listeners.borrow().iter().any(|(i, _)| *i == id);
            if !still_subscribed {
                continue;
            }
            if let Ok(mut callback) = listener.try_borrow_mut() {
                callback(data);
            } else {
                log::warn!("re-entrant emit skipped for listener {}", id.0);
            }
        }
    }
}

/// In-memory terminal that records output and lets callers emit input.
///
/// Used as the test surface throughout the workspace and by embedders
/// that render output themselves.
#[derive(Default)]
pub struct MemoryTerminal {
    output: RefCell<String>,
    listeners: DataListeners,
}

impl MemoryTerminal {
    /// Create a terminal with no output and no listeners.
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far.
    pub fn output(&self) -> String {
        self.output.borrow().clone()
    }

    /// Return and clear everything written so far.
    pub fn take_output(&self) -> String {
        std::mem::take(&mut *self.output.borrow_mut())
    }

    /// Number of currently subscribed data listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Simulate the user typing `data`.
    pub fn emit(&self, data: &str) {
        self.listeners.emit(data);
    }
}

impl Terminal for MemoryTerminal {
    fn write(&self, text: &str) {
        self.output.borrow_mut().push_str(text);
    }

    fn on_data(&self, listener: DataListener) -> ListenerId {
        self.listeners.subscribe(listener)
    }

    fn off_data(&self, id: ListenerId) {
        self.listeners.unsubscribe(id);
    }
}
