use std::path::PathBuf;

use thiserror::Error;

/// Failures of the line source, the counting itself never fails
#[derive(Debug, Error)]
pub enum InputError {
    #[error("failed to read input file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read standard input: {0}")]
    Stdin(#[source] std::io::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("the number of map tasks must be at least 1")]
    NoMapTasks,
    #[error("the number of reduce tasks must be at least 1")]
    NoReduceTasks,
    #[error("the number of worker threads must be at least 1")]
    NoThreads,
    #[error("invalid word pattern `{pattern}`: {source}")]
    WordPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}
