//! `treasury-yields` library crate.
//!
//! The binary (`ty`) is a thin wrapper around this library so that:
//!
//! - the reshaping core is testable without network or terminal
//! - the FRED client, TUI and agent stay swappable collaborators
//! - code stays easy to navigate as the project grows

pub mod agent;
pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod io;
pub mod plot;
pub mod report;
pub mod reshape;
pub mod tui;
