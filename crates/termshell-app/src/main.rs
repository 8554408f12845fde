//! termshell entry point.
//!
//! Runs the shell over stdin/stdout with the sample commands registered.
//! Stdin is read on a background thread and fed to the terminal from a
//! task on the local executor; everything else runs on the main thread.
//! Set `RUST_LOG` to see shell lifecycle logging on stderr.

mod commands;
mod fetch;
mod stdio;
mod utf8;

use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::rc::Rc;

use anyhow::{Context, Result};
use futures::StreamExt;
use futures::executor::LocalPool;
use futures::task::LocalSpawnExt;

use termshell_core::Shell;
use termshell_echo::LocalEcho;
use termshell_types::config::ShellConfig;
use termshell_types::editor::LineEditor;
use termshell_types::terminal::Terminal;

use stdio::StdioTerminal;

/// Config file read from the working directory when `TERMSHELL_CONFIG` is unset.
const DEFAULT_CONFIG_FILE: &str = "termshell.toml";

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let mut config = load_config()?;
    if io::stdin().is_terminal() {
        // A cooked-mode tty already echoes what the user types.
        config.echo_input = false;
    }

    let terminal = Rc::new(StdioTerminal::new());
    let echo = LocalEcho::new(Rc::clone(&terminal) as Rc<dyn Terminal>, &config);
    let t: Rc<StdioTerminal> = Rc::clone(&terminal);
    let e: Rc<LocalEcho> = Rc::clone(&echo);
    let shell = Shell::with_config(t, e, config);
    commands::register(&shell);
    log::info!("registered {} commands", shell.commands().len());

    let mut pool = LocalPool::new();
    let mut input = stdio::spawn_stdin_reader();
    let pump = Rc::clone(&terminal);
    let pump_echo = Rc::clone(&echo);
    pool.spawner()
        .spawn_local(async move {
            while let Some(chunk) = input.next().await {
                pump.emit(&chunk);
            }
            pump_echo.close();
        })
        .context("failed to spawn stdin task")?;

    echo.println("Type `help` to list commands.");
    pool.run_until(shell.repl())?;
    Ok(())
}

/// Load `TERMSHELL_CONFIG`, else `termshell.toml` if present, else defaults.
fn load_config() -> Result<ShellConfig> {
    let explicit = std::env::var_os("TERMSHELL_CONFIG").map(PathBuf::from);
    let required = explicit.is_some();
    let path = explicit.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

    match std::fs::read_to_string(&path) {
        Ok(text) => {
            let config = ShellConfig::from_toml(&text)?;
            log::info!("loaded config from {}", path.display());
            Ok(config)
        },
        Err(e) if e.kind() == io::ErrorKind::NotFound && !required => {
            log::debug!("no {}, using defaults", path.display());
            Ok(ShellConfig::default())
        },
        Err(e) => Err(e).with_context(|| format!("failed to read {}", path.display())),
    }
}
