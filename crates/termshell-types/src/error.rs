//! Error types for termshell.

use std::io;

/// Errors produced by the termshell framework.
#[derive(Debug, thiserror::Error)]
pub enum ShellError {
    #[error("Command Not Found: {0}")]
    CommandNotFound(String),

    #[error("Terminal destroyed")]
    Destroyed,

    #[error("terminal input is claimed by a raw stream")]
    InputBusy,

    #[error("read aborted: {0}")]
    ReadAborted(String),

    #[error("input closed")]
    InputClosed,

    #[error("{0}")]
    Command(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, ShellError>;
