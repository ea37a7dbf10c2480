//! Console output for the CLI
//!
//! Program output goes to stdout; progress indicators and logs go to stderr.

pub mod console;

pub use console::{print_tools, server_spinner};
