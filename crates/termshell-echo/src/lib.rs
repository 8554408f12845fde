//! Local-echo line editor.
//!
//! [`LocalEcho`] subscribes to a terminal's raw input, echoes keystrokes
//! back, and resolves line and character reads. It implements the
//! [`LineEditor`](termshell_types::editor::LineEditor) trait the shell
//! consumes.

mod buffer;
mod echo;
mod history;

/// Editable line with a character-indexed cursor.
pub use buffer::LineBuffer;
/// Local-echo line editor bound to a terminal.
pub use echo::LocalEcho;
/// Bounded list of entered lines with up/down navigation.
pub use history::History;
