use clap::Parser;
use tracing::debug;
use word_count_rs::{
    config::{Cli, JobConfig},
    logging,
    mr::job,
};

/// Reads lines from the given files (or standard input), counts every word, and writes
/// one `word<TAB>count` record per distinct word
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    debug!("Command line: {:?}", cli);

    let config = JobConfig::try_from(&cli)?;
    job::run(&config).await
}
