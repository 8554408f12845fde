//! Sample commands registered by the binary.

use std::io::{Read, Write};
use std::net::{Shutdown, TcpStream};
use std::thread;

use futures::StreamExt;
use futures::channel::mpsc;

use termshell_core::{Args, CommandResult, FnCommand, Shell, SubShell};
use termshell_types::error::{Result, ShellError};

use crate::fetch::{self, Url};
use crate::utf8::drain_utf8;

/// Address `connect` uses when none is given.
const DEFAULT_ADDR: &str = "localhost:8080";

/// Ctrl-] ends a `connect` session.
const ESCAPE: char = '\x1d';

pub fn register(shell: &Shell) {
    shell
        .register(Box::new(
            FnCommand::new("help", |sh, _| CommandResult::single(help(sh)))
                .with_description("List available commands"),
        ))
        .register(Box::new(
            FnCommand::new("echo", |sh, args| CommandResult::single(echo(sh, args)))
                .with_description("Print arguments, then echo lines until an empty one")
                .with_usage("echo [text...]"),
        ))
        .register(Box::new(
            FnCommand::new("confirm", |sh, _| CommandResult::single(confirm(sh)))
                .with_description("Read a single character"),
        ))
        .register(Box::new(
            FnCommand::new("fetch", fetch_command)
                .with_description("Download a URL over plain HTTP")
                .with_usage("fetch <url>")
                .with_completer(|index, _| match index {
                    0 => vec!["http://".to_string()],
                    _ => Vec::new(),
                }),
        ))
        .register(Box::new(
            FnCommand::new("connect", |sh, args| CommandResult::single(connect(sh, args)))
                .with_description("Pipe raw input to a TCP service (Ctrl-] to quit)")
                .with_usage("connect [host:port]")
                .with_completer(|index, _| match index {
                    0 => vec![DEFAULT_ADDR.to_string()],
                    _ => Vec::new(),
                }),
        ));
}

async fn help(sh: SubShell) -> Result<()> {
    sh.print_line("Try running one of these commands:")?;
    sh.print_list(&sh.commands()?)?;
    sh.print_line("")
}

async fn echo(sh: SubShell, args: Args) -> Result<()> {
    if !args.is_empty() {
        sh.print_line(&args.join(" "))?;
    }
    loop {
        let line = sh.read_line("").await?;
        if line.is_empty() {
            return Ok(());
        }
        sh.print_line(&line)?;
    }
}

async fn confirm(sh: SubShell) -> Result<()> {
    let ch = sh.read_char("Y/n? ").await?;
    sh.print_line(&ch.to_string())
}

fn fetch_command(_sh: SubShell, args: Args) -> CommandResult {
    let Some(target) = args.first() else {
        return CommandResult::single(async {
            Err(ShellError::Command("usage: fetch <url>".to_string()))
        });
    };
    match Url::parse(target) {
        Ok(url) => CommandResult::streamed(fetch::spawn_get(url)),
        Err(e) => CommandResult::single(async move { Err(e) }),
    }
}

/// Forward socket reads to a channel until the peer closes.
fn spawn_socket_reader(mut socket: TcpStream) -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded();
    thread::spawn(move || {
        let mut buf = [0u8; 4096];
        let mut pending = Vec::new();
        loop {
            match socket.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => {
                    pending.extend_from_slice(&buf[..n]);
                    let text = drain_utf8(&mut pending);
                    if !text.is_empty() && tx.unbounded_send(text).is_err() {
                        break;
                    }
                },
                Err(e) => {
                    log::debug!("socket read ended: {e}");
                    break;
                },
            }
        }
    });
    rx
}

async fn connect(sh: SubShell, args: Args) -> Result<()> {
    let addr = args
        .named("url")
        .or_else(|| args.first().map(String::as_str))
        .unwrap_or(DEFAULT_ADDR)
        .to_string();
    let (host, port) = addr
        .rsplit_once(':')
        .and_then(|(host, port)| Some((host, port.parse::<u16>().ok()?)))
        .ok_or_else(|| ShellError::Command(format!("expected host:port, got {addr}")))?;

    let mut socket = fetch::tcp_connect(host, port)?;
    socket.set_read_timeout(None)?;
    let mut from_peer = spawn_socket_reader(socket.try_clone()?);
    log::info!("connected to {addr}");
    sh.print_line(&format!("Connected to {addr}. Press Ctrl-] to quit."))?;

    let mut input = sh.open_raw_stream()?;
    loop {
        futures::select! {
            chunk = input.next() => match chunk {
                Some(Ok(data)) => {
                    if let Some(end) = data.find(ESCAPE) {
                        socket.write_all(data[..end].as_bytes())?;
                        break;
                    }
                    socket.write_all(data.as_bytes())?;
                },
                Some(Err(e)) => return Err(e),
                None => break,
            },
            received = from_peer.next() => match received {
                Some(text) => sh.print(&text)?,
                None => {
                    sh.print_line(&format!("Connection to {addr} closed"))?;
                    break;
                },
            },
        }
    }

    drop(input);
    if let Err(e) = socket.shutdown(Shutdown::Both) {
        log::debug!("socket shutdown: {e}");
    }
    Ok(())
}
