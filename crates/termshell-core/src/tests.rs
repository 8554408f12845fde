//! End-to-end runs of the shell over the local-echo editor and an
//! in-memory terminal.

use std::cell::RefCell;
use std::rc::Rc;

use futures::StreamExt;
use futures::executor::LocalPool;
use futures::task::LocalSpawnExt;

use termshell_echo::LocalEcho;
use termshell_types::config::ShellConfig;
use termshell_types::error::Result;
use termshell_types::terminal::{MemoryTerminal, Terminal};

use crate::{CommandResult, Shell};

struct Harness {
    pool: LocalPool,
    terminal: Rc<MemoryTerminal>,
    echo: Rc<LocalEcho>,
    shell: Shell,
    done: Rc<RefCell<Option<Result<()>>>>,
}

impl Harness {
    fn new() -> Self {
        let terminal = Rc::new(MemoryTerminal::new());
        let config = ShellConfig::default();
        let echo = LocalEcho::new(Rc::clone(&terminal) as Rc<dyn Terminal>, &config);
        let t: Rc<MemoryTerminal> = Rc::clone(&terminal);
        let e: Rc<LocalEcho> = Rc::clone(&echo);
        let shell = Shell::with_config(t, e, config);
        register_samples(&shell);
        Self {
            pool: LocalPool::new(),
            terminal,
            echo,
            shell,
            done: Rc::new(RefCell::new(None)),
        }
    }

    fn start(&mut self) {
        let shell = self.shell.clone();
        let slot = Rc::clone(&self.done);
        self.pool
            .spawner()
            .spawn_local(async move {
                let result = shell.repl().await;
                *slot.borrow_mut() = Some(result);
            })
            .unwrap();
        self.pool.run_until_stalled();
    }

    fn type_keys(&mut self, keys: &str) {
        self.terminal.emit(keys);
        self.pool.run_until_stalled();
    }
}

fn register_samples(shell: &Shell) {
    shell
        .command("echo", |sh, args| {
            CommandResult::single(async move {
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
            })
        })
        .command("raw", |sh, _| {
            CommandResult::single(async move {
                let mut stream = sh.open_raw_stream()?;
                while let Some(chunk) = stream.next().await {
                    let chunk = chunk?;
                    if chunk == "\x1d" {
                        break;
                    }
                    sh.print(&format!("[{chunk}]"))?;
                }
                Ok(())
            })
        });
}

#[test]
fn echo_prints_args_then_returns_to_prompt() {
    let mut h = Harness::new();
    h.start();
    assert_eq!(h.terminal.take_output(), "> ");

    h.type_keys("echo hi\r");
    assert_eq!(h.terminal.take_output(), "echo hi\r\nhi\r\n");

    h.type_keys("again\r");
    assert_eq!(h.terminal.take_output(), "again\r\nagain\r\n");

    h.type_keys("\r");
    assert_eq!(h.terminal.take_output(), "\r\n> ");
    assert_eq!(h.terminal.listener_count(), 1);
    assert!(h.echo.is_attached());
    assert!(h.done.borrow().is_none());
}

#[test]
fn unknown_command_reports_and_prompts_again() {
    let mut h = Harness::new();
    h.start();
    h.terminal.take_output();

    h.type_keys("nope\r");
    assert_eq!(
        h.terminal.take_output(),
        "nope\r\nCommand Not Found: nope\r\n> "
    );
}

#[test]
fn tab_completes_command_names() {
    let mut h = Harness::new();
    h.start();
    h.terminal.take_output();

    h.type_keys("ec\t");
    assert!(h.terminal.take_output().ends_with("> echo "));
    h.type_keys("x\r");
    assert_eq!(h.terminal.take_output(), "x\r\nx\r\n");
}

#[test]
fn raw_stream_takes_input_from_editor() {
    let mut h = Harness::new();
    h.start();
    h.type_keys("raw\r");
    h.terminal.take_output();

    assert!(!h.echo.is_attached());
    assert_eq!(h.terminal.listener_count(), 1);

    h.type_keys("a");
    h.type_keys("\r");
    assert_eq!(h.terminal.take_output(), "[a][\r]");

    h.type_keys("\x1d");
    assert_eq!(h.terminal.take_output(), "> ");
    assert!(h.echo.is_attached());
    assert_eq!(h.terminal.listener_count(), 1);

    h.type_keys("echo back\r");
    assert!(h.terminal.output().contains("back\r\n"));
}

#[test]
fn ctrl_d_ends_repl() {
    let mut h = Harness::new();
    h.start();
    h.type_keys("\x04");
    assert!(matches!(*h.done.borrow(), Some(Ok(()))));
    assert_eq!(h.terminal.listener_count(), 0);
}
