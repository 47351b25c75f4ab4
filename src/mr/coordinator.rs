use anyhow::Context;
use rayon::prelude::*;
use tracing::info;

use crate::mr::{
    counter::WordCounts,
    function::Tokenizer,
    worker::{Buckets, KeyValue, Worker},
};

/// The result of a job, partition `i` holds exactly the words whose key hashes to reduce task `i`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobOutput {
    partitions: Vec<WordCounts>,
}

impl JobOutput {
    pub fn new(partitions: Vec<WordCounts>) -> Self {
        Self { partitions }
    }

    /// A single-partition output, as produced by the sequential fold
    pub fn single(counts: WordCounts) -> Self {
        Self::new(vec![counts])
    }

    pub fn partitions(&self) -> &[WordCounts] {
        &self.partitions
    }

    /// The full word count mapping
    pub fn merged(&self) -> WordCounts {
        self.clone().into_merged()
    }

    pub fn into_merged(self) -> WordCounts {
        let mut partitions = self.partitions.into_iter();
        let mut merged = partitions.next().unwrap_or_default();
        for partition in partitions {
            merged.merge(partition);
        }
        merged
    }
}

/// Drives a whole job inside this process: map tasks, shuffle, reduce tasks
#[derive(Debug, Clone)]
pub struct Coordinator {
    /// Upper bound on the number of input shards
    map_n: usize,
    /// The number of reduce tasks, which is also the number of output partitions
    reduce_n: usize,
    /// `None` runs on rayon's global pool
    threads: Option<usize>,
    combine: bool,
    tokenizer: Tokenizer,
}

impl Coordinator {
    /// Create a new coordinator, task counts below 1 are raised to 1
    pub fn new(map_n: usize, reduce_n: usize) -> Self {
        Self {
            map_n: map_n.max(1),
            reduce_n: reduce_n.max(1),
            threads: None,
            combine: true,
            tokenizer: Tokenizer::default(),
        }
    }

    pub fn with_threads(mut self, threads: Option<usize>) -> Self {
        self.threads = threads;
        self
    }

    pub fn with_combiner(mut self, combine: bool) -> Self {
        self.combine = combine;
        self
    }

    pub fn with_tokenizer(mut self, tokenizer: Tokenizer) -> Self {
        self.tokenizer = tokenizer;
        self
    }

    pub fn run<S>(&self, lines: &[S]) -> anyhow::Result<JobOutput>
    where
        S: AsRef<str> + Sync,
    {
        match self.threads {
            Some(threads) => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .build()
                    .context("failed to build the worker thread pool")?;
                Ok(pool.install(|| self.run_phases(lines)))
            }
            None => Ok(self.run_phases(lines)),
        }
    }

    fn run_phases<S>(&self, lines: &[S]) -> JobOutput
    where
        S: AsRef<str> + Sync,
    {
        let worker = Worker::new(self.reduce_n, &self.tokenizer).with_combiner(self.combine);
        // Contiguous shards, so each map task sees its lines in input order
        let shard_len = lines.len().div_ceil(self.map_n).max(1);

        let map_outputs: Vec<Buckets> = lines
            .par_chunks(shard_len)
            .enumerate()
            .map(|(map_task_id, shard)| worker.map(map_task_id, shard))
            .collect();
        info!(
            "[Map] All {} map task(s) have been finished, the reduce phase will then begin",
            map_outputs.len()
        );

        let reduce_inputs = self.shuffle(map_outputs);
        let partitions: Vec<WordCounts> = reduce_inputs
            .into_par_iter()
            .enumerate()
            .map(|(reduce_task_id, buckets)| worker.reduce(reduce_task_id, buckets))
            .collect();
        info!(
            "[Reduce] All {} reduce task(s) have been finished, {} distinct word(s) counted",
            partitions.len(),
            partitions.iter().map(WordCounts::len).sum::<usize>()
        );

        JobOutput::new(partitions)
    }

    /// Hand bucket `i` of every map output to reduce task `i`
    fn shuffle(&self, map_outputs: Vec<Buckets>) -> Vec<Vec<Vec<KeyValue>>> {
        let mut reduce_inputs: Vec<Vec<Vec<KeyValue>>> = (0..self.reduce_n)
            .map(|_| Vec::with_capacity(map_outputs.len()))
            .collect();
        for buckets in map_outputs {
            for (reduce_task_id, bucket) in buckets.into_iter().enumerate() {
                reduce_inputs[reduce_task_id].push(bucket);
            }
        }
        reduce_inputs
    }
}
