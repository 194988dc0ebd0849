//! Command-line interface for nearest-word search over a dictionary.
//!
//! The CLI offers a `search` command that indexes a newline-delimited
//! dictionary under the Levenshtein metric and answers interactive queries
//! with the nearest words.

mod commands;

pub use commands::{Cli, CliError, Command, SearchCommand, run_cli};
