//! Line-editing collaborator trait.
//!
//! A line editor masks raw terminal input into line-based reads. The shell
//! only ever talks to it through [`LineEditor`].

use std::rc::Rc;

use futures::future::LocalBoxFuture;

use crate::error::Result;

/// Autocomplete callback: `(token_index, tokens) -> candidates`.
pub type AutocompleteHandler = Rc<dyn Fn(usize, &[String]) -> Vec<String>>;

/// Line-buffered input controller bound to a terminal.
pub trait LineEditor {
    /// Read one line. Resolves when the user presses enter.
    fn read(&self, prompt: &str) -> LocalBoxFuture<'static, Result<String>>;

    /// Read a single character.
    fn read_char(&self, prompt: &str) -> LocalBoxFuture<'static, Result<char>>;

    /// Cancel the in-flight read, resolving it with `ReadAborted(reason)`.
    fn abort_read(&self, reason: &str);

    /// Print text without a trailing newline.
    fn print(&self, text: &str);

    /// Print text followed by a newline.
    fn println(&self, text: &str);

    /// Print items laid out in columns.
    fn print_wide(&self, items: &[String]);

    /// Start consuming terminal input.
    fn attach(&self);

    /// Stop consuming terminal input.
    fn detach(&self);

    /// Register a completion source consulted on tab.
    fn add_autocomplete_handler(&self, handler: AutocompleteHandler);
}
