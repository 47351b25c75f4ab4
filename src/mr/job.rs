//! Runs a configured word count job from input to output

use anyhow::Context;
use tokio::io::stdout;
use tracing::info;

use crate::config::{Destination, ExecutionMode, JobConfig};
use crate::mr::{
    coordinator::{Coordinator, JobOutput},
    counter::{WordCounter, WordCounts},
    input::{for_each_line, read_lines},
    output::{write_counts, write_file, write_partitions},
};

/// Counts the configured inputs without writing anything
pub async fn execute(config: &JobConfig) -> anyhow::Result<JobOutput> {
    match config.mode {
        ExecutionMode::Sequential => {
            let counter = WordCounter::with_tokenizer(config.tokenizer.clone());
            let mut counts = WordCounts::new();
            for_each_line(&config.inputs, |line| counter.count_line(&mut counts, line)).await?;
            info!("[Sequential] Counted {} distinct word(s)", counts.len());
            Ok(JobOutput::single(counts))
        }
        ExecutionMode::Parallel {
            map_n,
            reduce_n,
            threads,
            combine,
        } => {
            let lines = read_lines(&config.inputs).await?;
            info!(
                "[Coordinator Configuration] {} line(s) | #{} Map Tasks | #{} Reduce Tasks",
                lines.len(),
                map_n,
                reduce_n
            );
            let coordinator = Coordinator::new(map_n, reduce_n)
                .with_threads(threads)
                .with_combiner(combine)
                .with_tokenizer(config.tokenizer.clone());
            tokio::task::spawn_blocking(move || coordinator.run(&lines))
                .await
                .context("the map reduce job panicked")?
        }
    }
}

/// Counts the configured inputs and writes the result to the configured destination
pub async fn run(config: &JobConfig) -> anyhow::Result<()> {
    let output = execute(config).await?;
    match &config.destination {
        Destination::Stdout => {
            let counts = output.into_merged();
            write_counts(&mut stdout(), &counts, config.format, config.sort)
                .await
                .context("failed to write to standard output")?;
        }
        Destination::File(path) => {
            write_file(path, &output.into_merged(), config.format, config.sort).await?;
        }
        Destination::Directory(dir) => {
            let written = write_partitions(dir, output.partitions(), config.format, config.sort).await?;
            info!(
                "The MapReduce process has finished, {} part file(s) written to {}",
                written.len(),
                dir.display()
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mr::{function::Tokenizer, input::InputSource};
    use std::path::PathBuf;

    fn write_input(dir: &tempfile::TempDir, name: &str, contents: &str) -> InputSource {
        let path = dir.path().join(name);
        std::fs::write(&path, contents).unwrap();
        InputSource::File(path)
    }

    fn parallel(map_n: usize, reduce_n: usize) -> ExecutionMode {
        ExecutionMode::Parallel {
            map_n,
            reduce_n,
            threads: Some(2),
            combine: true,
        }
    }

    #[tokio::test]
    async fn sequential_and_parallel_agree() {
        let dir = tempfile::tempdir().unwrap();
        let inputs = vec![
            write_input(&dir, "pg-0.txt", "hello world\nhello\n"),
            write_input(&dir, "pg-1.txt", "  \nworld wide web\n"),
        ];
        let sequential = JobConfig {
            inputs: inputs.clone(),
            mode: ExecutionMode::Sequential,
            ..JobConfig::default()
        };
        let parallel = JobConfig {
            inputs,
            mode: parallel(3, 2),
            ..JobConfig::default()
        };

        let expected = execute(&sequential).await.unwrap().into_merged();
        let actual = execute(&parallel).await.unwrap();

        assert_eq!(actual.partitions().len(), 2);
        assert_eq!(actual.into_merged(), expected);
        assert_eq!(expected.get("hello"), Some(2));
        assert_eq!(expected.get("world"), Some(2));
        assert_eq!(expected.total(), 6);
    }

    #[tokio::test]
    async fn tokenizer_reaches_the_sequential_fold() {
        let dir = tempfile::tempdir().unwrap();
        let config = JobConfig {
            inputs: vec![write_input(&dir, "in.txt", "Hi, hi! HI")],
            mode: ExecutionMode::Sequential,
            tokenizer: Tokenizer::pattern("[a-z]+").unwrap(),
            ..JobConfig::default()
        };
        let counts = execute(&config).await.unwrap().into_merged();
        assert_eq!(counts.get("hi"), Some(1));
        assert_eq!(counts.get("i"), Some(1));
        assert_eq!(counts.len(), 2);
    }

    #[tokio::test]
    async fn run_writes_part_files() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let config = JobConfig {
            inputs: vec![write_input(&dir, "in.txt", "a b c d e f g a")],
            mode: parallel(2, 3),
            destination: Destination::Directory(out.clone()),
            ..JobConfig::default()
        };

        run(&config).await.unwrap();

        let mut total = 0;
        for index in 0..3 {
            let part = std::fs::read_to_string(out.join(format!("part-0000{index}"))).unwrap();
            total += part.lines().count();
        }
        assert_eq!(total, 7);
    }

    #[tokio::test]
    async fn run_writes_a_single_file() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("counts.tsv");
        let config = JobConfig {
            inputs: vec![write_input(&dir, "in.txt", "b a b")],
            destination: Destination::File(out.clone()),
            ..JobConfig::default()
        };

        run(&config).await.unwrap();

        assert_eq!(std::fs::read_to_string(out).unwrap(), "a\t1\nb\t2\n");
    }

    #[tokio::test]
    async fn missing_input_fails_the_job() {
        let config = JobConfig {
            inputs: vec![InputSource::File(PathBuf::from("/no/such/input.txt"))],
            ..JobConfig::default()
        };
        let err = execute(&config).await.unwrap_err();
        assert!(format!("{err:#}").contains("/no/such/input.txt"));
    }
}
