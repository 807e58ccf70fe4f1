//! Command-line front end for the seatbelt executor.

pub mod cli;

pub use cli::{Cli, run};
