//! Dispatcher and REPL loop.
//!
//! The shell reads a line, resolves the first token in the registry, runs
//! the command with a fresh [`SubShell`], waits for it to finish, destroys
//! the sub-shell, and reads again. Everything lives on one thread; shared
//! state is `Rc` plus `RefCell`/`Cell`.

use std::cell::{Cell, Ref, RefCell};
use std::rc::{Rc, Weak};

use termshell_types::config::ShellConfig;
use termshell_types::editor::{AutocompleteHandler, LineEditor};
use termshell_types::error::{Result, ShellError};
use termshell_types::terminal::{DataListener, ListenerId, Terminal};

use crate::command::{Args, Command, CommandResult, FnCommand, drain_into};
use crate::registry::CommandRegistry;
use crate::subshell::SubShell;

/// Which consumer currently owns terminal input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputOwner {
    LineEditor,
    RawStream,
}

/// Split a line on runs of whitespace.
///
/// There is no quoting or escaping: `echo "a b"` yields three tokens.
pub fn tokenize(line: &str) -> Vec<String> {
    line.split_whitespace().map(str::to_string).collect()
}

/// Terminal input held by a raw stream.
struct RawSession {
    generation: u64,
    listener: ListenerId,
    /// Whether the line editor was attached when the session began.
    reattach: bool,
}

pub(crate) struct ShellInner {
    terminal: Rc<dyn Terminal>,
    editor: Rc<dyn LineEditor>,
    config: ShellConfig,
    registry: RefCell<CommandRegistry>,
    attached: Cell<bool>,
    live: RefCell<Vec<u64>>,
    next_generation: Cell<u64>,
    raw: RefCell<Option<RawSession>>,
}

impl ShellInner {
    pub(crate) fn editor(&self) -> &dyn LineEditor {
        &*self.editor
    }

    pub(crate) fn registry(&self) -> Ref<'_, CommandRegistry> {
        self.registry.borrow()
    }

    pub(crate) fn is_live(&self, generation: u64) -> bool {
        self.live.borrow().contains(&generation)
    }

    fn begin_invocation(&self) -> u64 {
        let generation = self.next_generation.get() + 1;
        self.next_generation.set(generation);
        self.live.borrow_mut().push(generation);
        log::debug!("sub-shell {generation} created");
        generation
    }

    /// Retire a generation and release any raw input it still holds.
    pub(crate) fn end_invocation(&self, generation: u64) {
        let removed = {
            let mut live = self.live.borrow_mut();
            let before = live.len();
            live.retain(|g| *g != generation);
            live.len() != before
        };
        if !removed {
            return;
        }
        log::debug!("sub-shell {generation} destroyed");
        let held = matches!(&*self.raw.borrow(), Some(s) if s.generation == generation);
        if held {
            self.teardown_raw();
        }
    }

    /// Fails with `InputBusy` while a raw stream owns terminal input.
    pub(crate) fn ensure_line_input(&self) -> Result<()> {
        if self.raw.borrow().is_some() {
            return Err(ShellError::InputBusy);
        }
        Ok(())
    }

    /// Take terminal input away from the line editor and route it to
    /// `listener`.
    pub(crate) fn claim_raw(&self, generation: u64, listener: DataListener) -> Result<ListenerId> {
        if self.raw.borrow().is_some() {
            return Err(ShellError::InputBusy);
        }
        let reattach = self.attached.replace(false);
        if reattach {
            self.editor.detach();
        }
        let id = self.terminal.on_data(listener);
        *self.raw.borrow_mut() = Some(RawSession {
            generation,
            listener: id,
            reattach,
        });
        log::debug!("raw stream {} claimed input for sub-shell {generation}", id.0);
        Ok(id)
    }

    /// Release the session owned by `listener`. A session that was already
    /// torn down is left alone.
    pub(crate) fn release_raw(&self, listener: ListenerId) {
        let owned = matches!(&*self.raw.borrow(), Some(s) if s.listener == listener);
        if owned {
            self.teardown_raw();
        }
    }

    fn teardown_raw(&self) {
        let Some(session) = self.raw.borrow_mut().take() else {
            return;
        };
        self.terminal.off_data(session.listener);
        log::debug!("raw stream {} released input", session.listener.0);
        if session.reattach && !self.attached.replace(true) {
            self.editor.attach();
        }
    }

    fn input_owner(&self) -> InputOwner {
        if self.raw.borrow().is_some() {
            InputOwner::RawStream
        } else {
            InputOwner::LineEditor
        }
    }
}

/// Destroys its sub-shell on every exit path out of [`Shell::run`].
struct InvocationGuard(SubShell);

impl Drop for InvocationGuard {
    fn drop(&mut self) {
        self.0.destroy();
    }
}

/// Command shell over a terminal and a line editor.
///
/// Cloning is cheap and every clone drives the same registry and loop.
/// The editor is assumed to be attached to the terminal when the shell is
/// created.
#[derive(Clone)]
pub struct Shell {
    inner: Rc<ShellInner>,
}

impl Shell {
    pub fn new(terminal: Rc<dyn Terminal>, editor: Rc<dyn LineEditor>) -> Self {
        Self::with_config(terminal, editor, ShellConfig::default())
    }

    pub fn with_config(
        terminal: Rc<dyn Terminal>,
        editor: Rc<dyn LineEditor>,
        config: ShellConfig,
    ) -> Self {
        let inner = Rc::new(ShellInner {
            terminal,
            editor,
            config,
            registry: RefCell::new(CommandRegistry::new()),
            attached: Cell::new(true),
            live: RefCell::new(Vec::new()),
            next_generation: Cell::new(0),
            raw: RefCell::new(None),
        });

        let weak: Weak<ShellInner> = Rc::downgrade(&inner);
        let handler: AutocompleteHandler = Rc::new(move |index: usize, tokens: &[String]| {
            let Some(inner) = weak.upgrade() else {
                return Vec::new();
            };
            // Registry is mutably borrowed if this runs during registration.
            inner
                .registry
                .try_borrow()
                .map(|registry| registry.complete(index, tokens))
                .unwrap_or_default()
        });
        inner.editor.add_autocomplete_handler(handler);

        Self { inner }
    }

    /// Register a closure command.
    pub fn command<F>(&self, name: &str, handler: F) -> &Self
    where
        F: Fn(SubShell, Args) -> CommandResult + 'static,
    {
        self.register(Box::new(FnCommand::new(name, handler)))
    }

    /// Register a closure command with an argument completion function.
    pub fn command_with_completion<F, C>(&self, name: &str, handler: F, completer: C) -> &Self
    where
        F: Fn(SubShell, Args) -> CommandResult + 'static,
        C: Fn(usize, &[String]) -> Vec<String> + 'static,
    {
        self.register(Box::new(
            FnCommand::new(name, handler).with_completer(completer),
        ))
    }

    /// Register any [`Command`]. A duplicate name replaces the earlier one.
    pub fn register(&self, command: Box<dyn Command>) -> &Self {
        self.inner.registry.borrow_mut().register(command);
        self
    }

    /// Registered command names, in registration order.
    pub fn commands(&self) -> Vec<String> {
        self.inner.registry().names()
    }

    /// `(name, description)` pairs in registration order.
    pub fn command_list(&self) -> Vec<(String, String)> {
        self.inner
            .registry()
            .list()
            .into_iter()
            .map(|(n, d)| (n.to_string(), d.to_string()))
            .collect()
    }

    /// Completion candidates for the token at `index`.
    pub fn complete(&self, index: usize, tokens: &[String]) -> Vec<String> {
        self.inner.registry().complete(index, tokens)
    }

    pub fn config(&self) -> &ShellConfig {
        &self.inner.config
    }

    /// Hand terminal input back to the line editor.
    ///
    /// Does nothing when already attached or while a raw stream owns input.
    pub fn attach(&self) {
        if self.inner.raw.borrow().is_some() {
            return;
        }
        if !self.inner.attached.replace(true) {
            self.inner.editor.attach();
            log::debug!("shell attached");
        }
    }

    /// Stop the line editor from consuming terminal input.
    pub fn detach(&self) {
        if self.inner.attached.replace(false) {
            self.inner.editor.detach();
            log::debug!("shell detached");
        }
    }

    pub fn is_attached(&self) -> bool {
        self.inner.attached.get()
    }

    pub fn input_owner(&self) -> InputOwner {
        self.inner.input_owner()
    }

    pub(crate) fn open_invocation(&self) -> SubShell {
        let generation = self.inner.begin_invocation();
        SubShell::new(Rc::clone(&self.inner), generation)
    }

    /// Run one command to completion.
    ///
    /// The command's sub-shell is destroyed when this returns, whether the
    /// command succeeded, failed, or its stream ran dry.
    pub async fn run(&self, name: &str, args: Args) -> Result<()> {
        let command = self
            .inner
            .registry()
            .lookup(name)
            .ok_or_else(|| ShellError::CommandNotFound(name.to_string()))?;

        let shell = self.open_invocation();
        let _guard = InvocationGuard(shell.clone());
        match command.execute(shell.clone(), args) {
            CommandResult::Single(fut) => fut.await,
            CommandResult::Streamed(stream) => drain_into(&shell, stream).await,
        }
    }

    /// Tokenize `line` and run it. A blank line does nothing.
    pub async fn run_line(&self, line: &str) -> Result<()> {
        let mut tokens = tokenize(line);
        if tokens.is_empty() {
            return Ok(());
        }
        let name = tokens.remove(0);
        self.run(&name, Args::new(tokens)).await
    }

    /// Read, dispatch, report, repeat.
    ///
    /// Returns `Ok` once input is closed. An aborted top-level read is simply
    /// issued again. Command failures are printed and never end the loop.
    pub async fn repl(&self) -> Result<()> {
        loop {
            let line = match self.inner.editor.read(&self.inner.config.prompt).await {
                Ok(line) => line,
                Err(ShellError::InputClosed) => {
                    log::debug!("input closed, leaving repl");
                    return Ok(());
                },
                Err(ShellError::ReadAborted(reason)) => {
                    log::debug!("prompt read aborted: {reason}");
                    continue;
                },
                Err(e) => return Err(e),
            };

            match self.run_line(&line).await {
                Ok(()) => {},
                Err(ShellError::InputClosed) => {
                    log::debug!("input closed during command, leaving repl");
                    return Ok(());
                },
                Err(e) => self.report(&e),
            }
        }
    }

    fn report(&self, err: &ShellError) {
        match err {
            ShellError::CommandNotFound(name) => log::debug!("unknown command {name}"),
            _ => log::error!("command failed: {err}"),
        }
        self.inner.editor.println(&err.to_string());
    }
}

impl std::fmt::Debug for Shell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Shell")
            .field("commands", &self.commands())
            .field("attached", &self.is_attached())
            .field("input_owner", &self.input_owner())
            .finish()
    }
}
