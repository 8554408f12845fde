//! Foundation types and traits for termshell.
//!
//! This crate holds the pieces shared by every termshell crate: the
//! [`Terminal`](terminal::Terminal) and [`LineEditor`](editor::LineEditor)
//! collaborator traits, raw key decoding, configuration, and error types.

pub mod config;
pub mod editor;
pub mod error;
pub mod input;
pub mod terminal;
