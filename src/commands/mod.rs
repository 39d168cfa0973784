//! Command implementations behind the CLI

pub mod build;
pub mod clean;
pub mod list;
