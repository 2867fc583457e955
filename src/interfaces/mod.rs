//! Outer adapters: command line, catalog files, and caller authentication.

pub mod cli;
pub mod csv;
pub mod telegram;
