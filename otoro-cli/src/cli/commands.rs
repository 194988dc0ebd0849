//! Command implementations and argument parsing for the otoro CLI.

use std::collections::HashSet;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Args, Parser, Subcommand};
use otoro_core::{DEFAULT_MIN_NODE_CAPACITY, MTree, MTreeBuilder, MTreeError, RandomPromotion, levenshtein};
use thiserror::Error;
use tracing::{info, instrument};

const DEFAULT_RESULT_COUNT: usize = 10;

type WordMetric = fn(&String, &String) -> f64;

fn word_distance(a: &String, b: &String) -> f64 {
    levenshtein(a, b)
}

/// Top-level CLI options parsed by [`clap`].
#[derive(Debug, Parser, Clone)]
#[command(name = "otoro", about = "Search a dictionary by edit distance.")]
pub struct Cli {
    /// Command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Supported CLI commands.
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Index a dictionary and answer nearest-word queries interactively.
    Search(SearchCommand),
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Command::Search(_) => "search",
        }
    }
}

/// Options accepted by the `search` command.
#[derive(Debug, Args, Clone)]
pub struct SearchCommand {
    /// Path to a newline-delimited dictionary; `%`-prefixed lines are
    /// comments.
    pub path: PathBuf,

    /// Number of nearest words reported per query.
    #[arg(long, default_value_t = DEFAULT_RESULT_COUNT)]
    pub count: usize,

    /// Index at most this many dictionary words.
    #[arg(long = "word-limit")]
    pub word_limit: Option<usize>,

    /// Minimum node occupancy of the index.
    #[arg(long = "min-capacity", default_value_t = DEFAULT_MIN_NODE_CAPACITY)]
    pub min_capacity: usize,

    /// Maximum node occupancy of the index; derived from the minimum when
    /// omitted.
    #[arg(long = "max-capacity")]
    pub max_capacity: Option<usize>,
}

/// Errors surfaced while executing CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// File I/O failed while loading the dictionary.
    #[error("failed to read `{path}`: {source}")]
    Io {
        /// Path that triggered the failure.
        path: PathBuf,
        /// Underlying operating system error.
        #[source]
        source: io::Error,
    },
    /// Writing results to the output stream failed.
    #[error("failed to write results: {source}")]
    Output {
        /// Underlying operating system error.
        #[source]
        source: io::Error,
    },
    /// Index construction failed.
    #[error(transparent)]
    Core(#[from] MTreeError),
}

/// Executes the CLI command represented by `cli`, reading queries from
/// `input` and writing results to `output`.
///
/// # Errors
/// Returns [`CliError`] when loading, indexing, or writing fails.
#[instrument(name = "cli.run", err, skip(cli, input, output), fields(command = %cli.command.name()))]
pub fn run_cli(cli: Cli, input: impl BufRead, output: impl Write) -> Result<(), CliError> {
    match cli.command {
        Command::Search(search) => run_search(search, input, output),
    }
}

#[instrument(
    name = "cli.search",
    err,
    skip(command, input, output),
    fields(
        path = %path_label(&command.path),
        count = command.count,
        min_capacity = command.min_capacity,
    ),
)]
pub(super) fn run_search(
    command: SearchCommand,
    input: impl BufRead,
    mut output: impl Write,
) -> Result<(), CliError> {
    let words = load_dictionary(&command.path, command.word_limit)?;

    let indexing = Instant::now();
    let tree = build_index(&command, words)?;
    let elapsed = indexing.elapsed();
    info!(
        words = tree.len(),
        elapsed_ms = elapsed.as_millis() as u64,
        "dictionary indexed"
    );
    writeln!(output, "{} words indexed in {:.2}s", tree.len(), elapsed.as_secs_f64())
        .map_err(|source| CliError::Output { source })?;

    serve_queries(&tree, command.count, input, output)
}

/// Loads the dictionary, skipping blank lines, `%`-prefixed comments, and
/// repeated words. The index requires distinct items.
pub(super) fn load_dictionary(
    path: &Path,
    word_limit: Option<usize>,
) -> Result<Vec<String>, CliError> {
    let file = File::open(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let limit = word_limit.unwrap_or(usize::MAX);

    let mut seen = HashSet::new();
    let mut words = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line.map_err(|source| CliError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let word = line.trim();
        if word.is_empty() || word.starts_with('%') || !seen.insert(word.to_owned()) {
            continue;
        }
        words.push(word.to_owned());
        if words.len() >= limit {
            break;
        }
    }
    info!(words = words.len(), "dictionary loaded");
    Ok(words)
}

pub(super) fn build_index(
    command: &SearchCommand,
    words: Vec<String>,
) -> Result<MTree<String, WordMetric, RandomPromotion>, CliError> {
    let mut builder = MTreeBuilder::new(word_distance as WordMetric)
        .with_min_node_capacity(command.min_capacity);
    if let Some(max) = command.max_capacity {
        builder = builder.with_max_node_capacity(max);
    }
    let mut tree = builder.build()?;
    for word in words {
        tree.add(word);
    }
    Ok(tree)
}

/// Answers queries line by line until end of input or a blank line.
pub(super) fn serve_queries(
    tree: &MTree<String, WordMetric, RandomPromotion>,
    count: usize,
    input: impl BufRead,
    mut output: impl Write,
) -> Result<(), CliError> {
    let write_err = |source| CliError::Output { source };

    write!(output, "Type a word: ").map_err(write_err)?;
    output.flush().map_err(write_err)?;
    for line in input.lines() {
        let line = line.map_err(write_err)?;
        let word = line.trim();
        if word.is_empty() {
            break;
        }

        let query = Instant::now();
        for neighbour in tree.nearest_by_limit(word.to_owned(), count) {
            writeln!(output, "\t{} {}", neighbour.distance, neighbour.item).map_err(write_err)?;
        }
        writeln!(output, "query took {:.3}s", query.elapsed().as_secs_f64()).map_err(write_err)?;

        write!(output, "Type a word: ").map_err(write_err)?;
        output.flush().map_err(write_err)?;
    }
    writeln!(output).map_err(write_err)?;
    Ok(())
}

/// Produce a redacted label for a path that avoids leaking absolute
/// directories.
fn path_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "<unknown>".to_owned())
}
