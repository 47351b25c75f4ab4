use std::path::PathBuf;

use clap::{ArgAction, Parser};

use crate::error::ConfigError;
use crate::mr::{
    function::Tokenizer,
    input::InputSource,
    output::{OutputFormat, SortOrder},
};

#[derive(Parser, Debug)]
#[command(
    name = "mrwordcount",
    version,
    about = "Count whitespace-delimited words across lines of text"
)]
pub struct Cli {
    /// Input files, `-` reads standard input; standard input is used when none are given
    pub inputs: Vec<PathBuf>,

    /// Number of map tasks the input lines are split into
    #[arg(short, long, default_value_t = 1, env = "MRWC_MAP_TASKS")]
    pub map_tasks: usize,

    /// Number of reduce tasks, which is also the number of output partitions
    #[arg(short, long, default_value_t = 1, env = "MRWC_REDUCE_TASKS")]
    pub reduce_tasks: usize,

    /// Worker threads for the map and reduce phases (defaults to one per core)
    #[arg(long, env = "MRWC_THREADS")]
    pub threads: Option<usize>,

    /// Count with a single streaming pass instead of map and reduce tasks
    #[arg(long)]
    pub sequential: bool,

    /// Skip summing pairs on the map side before the shuffle
    #[arg(long)]
    pub no_combine: bool,

    /// Treat every match of this regex as a word instead of splitting on whitespace
    #[arg(long, value_name = "REGEX")]
    pub word_pattern: Option<String>,

    #[arg(short, long, value_enum, default_value_t = OutputFormat::Tsv)]
    pub format: OutputFormat,

    #[arg(short, long, value_enum, default_value_t = SortOrder::Word)]
    pub sort: SortOrder,

    /// Write all counts to this file instead of standard output
    #[arg(short, long, conflicts_with = "output_dir")]
    pub output: Option<PathBuf>,

    /// Write one part file per reduce task into this directory
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    Sequential,
    Parallel {
        map_n: usize,
        reduce_n: usize,
        threads: Option<usize>,
        combine: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    Stdout,
    File(PathBuf),
    Directory(PathBuf),
}

/// A validated job description
#[derive(Debug, Clone)]
pub struct JobConfig {
    pub inputs: Vec<InputSource>,
    pub mode: ExecutionMode,
    pub tokenizer: Tokenizer,
    pub format: OutputFormat,
    pub sort: SortOrder,
    pub destination: Destination,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            inputs: vec![InputSource::Stdin],
            mode: ExecutionMode::Parallel {
                map_n: 1,
                reduce_n: 1,
                threads: None,
                combine: true,
            },
            tokenizer: Tokenizer::default(),
            format: OutputFormat::default(),
            sort: SortOrder::default(),
            destination: Destination::Stdout,
        }
    }
}

impl TryFrom<&Cli> for JobConfig {
    type Error = ConfigError;

    fn try_from(cli: &Cli) -> Result<Self, Self::Error> {
        if cli.map_tasks == 0 {
            return Err(ConfigError::NoMapTasks);
        }
        if cli.reduce_tasks == 0 {
            return Err(ConfigError::NoReduceTasks);
        }
        if cli.threads == Some(0) {
            return Err(ConfigError::NoThreads);
        }

        let tokenizer = match &cli.word_pattern {
            Some(pattern) => {
                Tokenizer::pattern(pattern).map_err(|source| ConfigError::WordPattern {
                    pattern: pattern.clone(),
                    source,
                })?
            }
            None => Tokenizer::Whitespace,
        };

        let mode = if cli.sequential {
            ExecutionMode::Sequential
        } else {
            ExecutionMode::Parallel {
                map_n: cli.map_tasks,
                reduce_n: cli.reduce_tasks,
                threads: cli.threads,
                combine: !cli.no_combine,
            }
        };

        let destination = match (&cli.output, &cli.output_dir) {
            (Some(file), _) => Destination::File(file.clone()),
            (None, Some(dir)) => Destination::Directory(dir.clone()),
            (None, None) => Destination::Stdout,
        };

        Ok(Self {
            inputs: InputSource::from_args(&cli.inputs),
            mode,
            tokenizer,
            format: cli.format,
            sort: cli.sort,
            destination,
        })
    }
}
