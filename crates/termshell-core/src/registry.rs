//! Command registry and autocomplete composition.

use std::collections::HashMap;
use std::rc::Rc;

use crate::command::Command;

/// Insertion-ordered registry of commands.
///
/// Names are unique and case-sensitive. Registering a name twice replaces
/// the earlier command in place, so listing order stays the order in which
/// names were first seen.
#[derive(Default)]
pub struct CommandRegistry {
    commands: Vec<Rc<dyn Command>>,
    index: HashMap<String, usize>,
}

impl CommandRegistry {
    /// Create an empty command registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a command, returning the one it replaced.
    ///
    /// A duplicate name is not an error: it logs a warning and the new
    /// command wins.
    pub fn register(&mut self, cmd: Box<dyn Command>) -> Option<Rc<dyn Command>> {
        let name = cmd.name().to_string();
        let cmd: Rc<dyn Command> = Rc::from(cmd);
        match self.index.get(&name) {
            Some(&slot) => {
                log::warn!("Command Already Registered: {name}");
                Some(std::mem::replace(&mut self.commands[slot], cmd))
            },
            None => {
                self.index.insert(name, self.commands.len());
                self.commands.push(cmd);
                None
            },
        }
    }

    /// Find a command by exact name.
    pub fn lookup(&self, name: &str) -> Option<Rc<dyn Command>> {
        self.index
            .get(name)
            .map(|&slot| Rc::clone(&self.commands[slot]))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Command names in registration order.
    pub fn names(&self) -> Vec<String> {
        self.commands.iter().map(|c| c.name().to_string()).collect()
    }

    /// `(name, description)` pairs in registration order.
    pub fn list(&self) -> Vec<(&str, &str)> {
        self.commands
            .iter()
            .map(|c| (c.name(), c.description()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Completion candidates for token `index` of `tokens`.
    ///
    /// Token 0 completes against command names. Later tokens are delegated
    /// to the command named by token 0 with the index and tokens shifted
    /// past the name; unknown commands complete to nothing.
    pub fn complete(&self, index: usize, tokens: &[String]) -> Vec<String> {
        if index == 0 {
            return self.names();
        }
        let Some(name) = tokens.first() else {
            return Vec::new();
        };
        match self.lookup(name) {
            Some(cmd) => cmd.complete(index - 1, &tokens[1..]),
            None => Vec::new(),
        }
    }
}
