//! Command trait and handler result types.

use std::future::Future;
use std::ops::Deref;

use futures::future::{self, FutureExt, LocalBoxFuture};
use futures::stream::{LocalBoxStream, Stream, StreamExt};

use termshell_types::error::Result;

use crate::subshell::SubShell;

/// Result of invoking a command.
///
/// A command either does its own I/O and resolves once (`Single`), or hands
/// back a stream whose every item the dispatcher prints (`Streamed`).
pub enum CommandResult {
    Single(LocalBoxFuture<'static, Result<()>>),
    Streamed(LocalBoxStream<'static, Result<String>>),
}

impl CommandResult {
    /// Wrap a future that performs the command's work.
    pub fn single<F>(fut: F) -> Self
    where
        F: Future<Output = Result<()>> + 'static,
    {
        Self::Single(fut.boxed_local())
    }

    /// Wrap a stream of output chunks.
    pub fn streamed<S>(stream: S) -> Self
    where
        S: Stream<Item = Result<String>> + 'static,
    {
        Self::Streamed(stream.boxed_local())
    }

    /// A command that has already finished.
    pub fn done() -> Self {
        Self::Single(future::ready(Ok(())).boxed_local())
    }
}

impl std::fmt::Debug for CommandResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Single(_) => f.write_str("CommandResult::Single(..)"),
            Self::Streamed(_) => f.write_str("CommandResult::Streamed(..)"),
        }
    }
}

/// Positional command arguments (everything after the command name).
///
/// Dereferences to `[String]`. Tokens of the form `key=value` can also be
/// looked up by key with [`Args::named`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Args(Vec<String>);

impl Args {
    pub fn new(args: Vec<String>) -> Self {
        Self(args)
    }

    /// Value of the first `key=value` argument with this key.
    pub fn named(&self, key: &str) -> Option<&str> {
        self.0.iter().find_map(|arg| {
            arg.split_once('=')
                .filter(|(k, _)| *k == key)
                .map(|(_, v)| v)
        })
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}

impl Deref for Args {
    type Target = [String];

    fn deref(&self) -> &[String] {
        &self.0
    }
}

impl From<Vec<String>> for Args {
    fn from(args: Vec<String>) -> Self {
        Self(args)
    }
}

impl<'a> From<&[&'a str]> for Args {
    fn from(args: &[&'a str]) -> Self {
        Self(args.iter().map(|s| s.to_string()).collect())
    }
}

/// A single executable command.
pub trait Command {
    /// The command name (what the user types).
    fn name(&self) -> &str;

    /// One-line description for `help`.
    fn description(&self) -> &str {
        ""
    }

    /// Usage string (e.g. "fetch <url>").
    fn usage(&self) -> &str {
        self.name()
    }

    /// Run the command. `shell` is valid until the returned result finishes.
    fn execute(&self, shell: SubShell, args: Args) -> CommandResult;

    /// Completion candidates for the argument at `index` (0 is the first
    /// argument, not the command name). `args` excludes the command name.
    fn complete(&self, _index: usize, _args: &[String]) -> Vec<String> {
        Vec::new()
    }
}

type Handler = Box<dyn Fn(SubShell, Args) -> CommandResult>;
type Completer = Box<dyn Fn(usize, &[String]) -> Vec<String>>;

/// Command built from closures.
pub struct FnCommand {
    name: String,
    description: String,
    usage: String,
    handler: Handler,
    completer: Option<Completer>,
}

impl FnCommand {
    pub fn new<F>(name: &str, handler: F) -> Self
    where
        F: Fn(SubShell, Args) -> CommandResult + 'static,
    {
        Self {
            name: name.to_string(),
            description: String::new(),
            usage: name.to_string(),
            handler: Box::new(handler),
            completer: None,
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn with_usage(mut self, usage: &str) -> Self {
        self.usage = usage.to_string();
        self
    }

    /// Attach an argument completion function.
    pub fn with_completer<C>(mut self, completer: C) -> Self
    where
        C: Fn(usize, &[String]) -> Vec<String> + 'static,
    {
        self.completer = Some(Box::new(completer));
        self
    }
}

impl Command for FnCommand {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn usage(&self) -> &str {
        &self.usage
    }

    fn execute(&self, shell: SubShell, args: Args) -> CommandResult {
        (self.handler)(shell, args)
    }

    fn complete(&self, index: usize, args: &[String]) -> Vec<String> {
        match &self.completer {
            Some(completer) => completer(index, args),
            None => Vec::new(),
        }
    }
}

/// Print every item of a stream through the sub-shell, stopping at the
/// first error.
pub(crate) async fn drain_into(
    shell: &SubShell,
    mut stream: LocalBoxStream<'static, Result<String>>,
) -> Result<()> {
    while let Some(item) = stream.next().await {
        shell.print(&item?)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn args_deref_to_slice() {
        let args = Args::from(&["a", "b"][..]);
        assert_eq!(args.len(), 2);
        assert_eq!(args[0], "a");
        assert_eq!(args.join(" "), "a b");
    }

    #[test]
    fn args_named_lookup() {
        let args = Args::from(&["url=ws://localhost:8080", "verbose", "x=1=2"][..]);
        assert_eq!(args.named("url"), Some("ws://localhost:8080"));
        assert_eq!(args.named("x"), Some("1=2"));
        assert_eq!(args.named("verbose"), None);
        assert_eq!(args.named("missing"), None);
    }

    #[test]
    fn args_into_vec() {
        let args = Args::new(vec!["z".to_string()]);
        assert_eq!(args.into_vec(), vec!["z".to_string()]);
    }

    #[test]
    fn fn_command_metadata() {
        let cmd = FnCommand::new("fetch", |_, _| CommandResult::done())
            .with_description("Download a URL")
            .with_usage("fetch <url>");
        assert_eq!(cmd.name(), "fetch");
        assert_eq!(cmd.description(), "Download a URL");
        assert_eq!(cmd.usage(), "fetch <url>");
    }

    #[test]
    fn fn_command_defaults() {
        let cmd = FnCommand::new("echo", |_, _| CommandResult::done());
        assert_eq!(cmd.description(), "");
        assert_eq!(cmd.usage(), "echo");
        assert!(cmd.complete(0, &[]).is_empty());
    }

    #[test]
    fn fn_command_completer() {
        let cmd = FnCommand::new("git", |_, _| CommandResult::done()).with_completer(
            |index, args| match index {
                0 => vec!["commit".to_string(), "checkout".to_string()],
                _ => vec![format!("after-{}", args[0])],
            },
        );
        assert_eq!(cmd.complete(0, &[String::new()]), vec!["commit", "checkout"]);
        assert_eq!(
            cmd.complete(1, &["commit".to_string(), String::new()]),
            vec!["after-commit"]
        );
    }

    #[test]
    fn command_result_debug() {
        assert_eq!(
            format!("{:?}", CommandResult::done()),
            "CommandResult::Single(..)"
        );
        let streamed = CommandResult::streamed(futures::stream::empty());
        assert_eq!(format!("{streamed:?}"), "CommandResult::Streamed(..)");
    }
}
