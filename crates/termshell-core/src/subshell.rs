//! Per-invocation I/O handle.

use std::rc::Rc;

use termshell_types::error::{Result, ShellError};

use crate::raw_stream::RawStream;
use crate::shell::ShellInner;

/// Capability handle given to a running command.
///
/// A sub-shell is tied to the generation of the invocation that created it.
/// Once that invocation ends, every operation fails with
/// [`ShellError::Destroyed`], so background work a command leaves behind
/// cannot keep using the terminal. Clones share the same generation.
#[derive(Clone)]
pub struct SubShell {
    inner: Rc<ShellInner>,
    generation: u64,
}

impl SubShell {
    pub(crate) fn new(inner: Rc<ShellInner>, generation: u64) -> Self {
        Self { inner, generation }
    }

    pub(crate) fn inner(&self) -> &Rc<ShellInner> {
        &self.inner
    }

    /// Generation number of the owning invocation.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_destroyed(&self) -> bool {
        !self.inner.is_live(self.generation)
    }

    fn check(&self) -> Result<()> {
        if self.is_destroyed() {
            return Err(ShellError::Destroyed);
        }
        Ok(())
    }

    /// Read a single character.
    pub async fn read_char(&self, prompt: &str) -> Result<char> {
        self.check()?;
        self.inner.ensure_line_input()?;
        self.inner.editor().read_char(prompt).await
    }

    /// Read one line of input.
    pub async fn read_line(&self, prompt: &str) -> Result<String> {
        self.check()?;
        self.inner.ensure_line_input()?;
        self.inner.editor().read(prompt).await
    }

    /// Cancel the in-flight read with `reason`.
    pub fn abort_read(&self, reason: &str) -> Result<()> {
        self.check()?;
        self.inner.editor().abort_read(reason);
        Ok(())
    }

    pub fn print(&self, text: &str) -> Result<()> {
        self.check()?;
        self.inner.editor().print(text);
        Ok(())
    }

    pub fn print_line(&self, text: &str) -> Result<()> {
        self.check()?;
        self.inner.editor().println(text);
        Ok(())
    }

    /// Print items laid out in columns.
    pub fn print_list(&self, items: &[String]) -> Result<()> {
        self.check()?;
        self.inner.editor().print_wide(items);
        Ok(())
    }

    /// Names of all registered commands, in registration order.
    pub fn commands(&self) -> Result<Vec<String>> {
        self.check()?;
        Ok(self.inner.registry().names())
    }

    /// Open a stream of raw terminal input.
    ///
    /// Nothing happens until the stream is first polled; from then until it
    /// ends, the line editor is detached and line reads fail with
    /// [`ShellError::InputBusy`].
    pub fn open_raw_stream(&self) -> Result<RawStream> {
        self.check()?;
        Ok(RawStream::new(self.clone()))
    }

    /// End this invocation's scope early. Calling it again does nothing.
    pub fn destroy(&self) {
        self.inner.end_invocation(self.generation);
    }
}

impl std::fmt::Debug for SubShell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubShell")
            .field("generation", &self.generation)
            .field("destroyed", &self.is_destroyed())
            .finish()
    }
}
