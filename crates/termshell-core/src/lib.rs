//! Command shell layered over a terminal and a line editor.
//!
//! The shell is a registry-based dispatch loop. Commands are registered by
//! name; the loop reads a line, resolves the first token, and runs the
//! command with a [`SubShell`] that is only valid for that one invocation.
//! Commands that need unbuffered keystrokes open a [`RawStream`], which
//! takes terminal input away from the line editor until it ends.

mod command;
mod raw_stream;
mod registry;
mod shell;
mod subshell;
#[cfg(test)]
pub(crate) mod test_utils;
#[cfg(test)]
mod tests;

/// Positional arguments passed to a command.
pub use command::Args;
/// A single executable command trait.
pub use command::Command;
/// What a command hands back to the dispatcher: one future or a stream of output.
pub use command::CommandResult;
/// Closure-backed command with an optional completion function.
pub use command::FnCommand;
/// Cancellable stream of raw terminal input chunks.
pub use raw_stream::RawStream;
/// Insertion-ordered registry of commands.
pub use registry::CommandRegistry;
/// Which consumer currently owns terminal input.
pub use shell::InputOwner;
/// The shell: registry, dispatcher, and REPL loop.
pub use shell::Shell;
/// Split a line on runs of whitespace.
pub use shell::tokenize;
/// Per-invocation I/O handle given to a running command.
pub use subshell::SubShell;
