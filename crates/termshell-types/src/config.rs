//! Shell configuration.

use serde::Deserialize;

use crate::error::{Result, ShellError};

/// Runtime configuration for a shell and its line editor.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    /// Prompt shown before each top-level read.
    pub prompt: String,
    /// Number of entered lines kept for up/down recall.
    pub history_size: usize,
    /// Display width used when laying out lists in columns.
    pub columns: usize,
    /// Whether tab triggers autocomplete.
    pub tab_complete: bool,
    /// Whether typed characters are echoed back. Off when the host
    /// terminal already echoes (cooked mode).
    pub echo_input: bool,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            prompt: "> ".to_string(),
            history_size: 100,
            columns: 80,
            tab_complete: true,
            echo_input: true,
        }
    }
}

impl ShellConfig {
    /// Parse a configuration from TOML. Missing keys take their defaults.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: Self = toml::from_str(toml_str)
            .map_err(|e| ShellError::Config(format!("termshell.toml: {e}")))?;
        if config.columns == 0 {
            return Err(ShellError::Config(
                "termshell.toml: columns must be greater than zero".to_string(),
            ));
        }
        Ok(config)
    }
}
