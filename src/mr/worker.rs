use std::{collections::hash_map::DefaultHasher, hash::{Hash, Hasher}};

use tracing::debug;

use crate::mr::{counter::WordCounts, function::{wc, Tokenizer}};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct KeyValue {
    pub key: String,
    pub value: u64,
}

impl KeyValue {
    pub fn new(key: String, value: u64) -> Self {
        Self { key, value }
    }
}

/// The output of one map task, bucket `i` belongs to reduce task `i`
pub type Buckets = Vec<Vec<KeyValue>>;

/// Which reduce task owns `key`
///
/// `DefaultHasher::new` is unkeyed, so the same key always lands in the same partition
pub fn partition_for_key(key: &str, reduce_n: usize) -> usize {
    let mut s = DefaultHasher::new();
    key.hash(&mut s);
    (s.finish() % reduce_n as u64) as usize
}

/// Runs map and reduce tasks; holds no per-task state, so one worker is shared by every task of a job
#[derive(Debug, Clone, Copy)]
pub struct Worker<'a> {
    /// The total reduce tasks, i.e. how many buckets each map task produces
    reduce_n: usize,
    /// Pre-sum each bucket on the map side before the shuffle
    combine: bool,
    tokenizer: &'a Tokenizer,
}

impl<'a> Worker<'a> {
    /// A `reduce_n` below 1 is raised to 1
    pub fn new(reduce_n: usize, tokenizer: &'a Tokenizer) -> Self {
        Self {
            reduce_n: reduce_n.max(1),
            combine: true,
            tokenizer,
        }
    }

    pub fn with_combiner(mut self, combine: bool) -> Self {
        self.combine = combine;
        self
    }

    /// Do one map task over a shard of input lines
    pub fn map<S: AsRef<str>>(&self, map_task_id: usize, lines: &[S]) -> Buckets {
        let mut buckets: Buckets = vec![Vec::new(); self.reduce_n];
        for line in lines {
            for kv in wc::map(self.tokenizer, line.as_ref()) {
                let index = partition_for_key(&kv.key, self.reduce_n);
                buckets[index].push(kv);
            }
        }
        if self.combine {
            for bucket in &mut buckets {
                *bucket = reduce_sorted(std::mem::take(bucket)).collect();
            }
        }
        debug!(
            "[Map] Map task #{} mapped {} line(s) into {} pair(s)",
            map_task_id,
            lines.len(),
            buckets.iter().map(Vec::len).sum::<usize>()
        );
        buckets
    }

    /// Do one reduce task over the buckets every map task produced for it
    pub fn reduce(&self, reduce_task_id: usize, buckets: Vec<Vec<KeyValue>>) -> WordCounts {
        let pairs: Vec<KeyValue> = buckets.into_iter().flatten().collect();
        let input_n = pairs.len();
        let counts: WordCounts = reduce_sorted(pairs).map(|kv| (kv.key, kv.value)).collect();
        debug!(
            "[Reduce] Reduce task #{} reduced {} pair(s) into {} word(s)",
            reduce_task_id,
            input_n,
            counts.len()
        );
        counts
    }
}

/// Sorts the pairs by key, then applies the reduce function to each run of equal keys
fn reduce_sorted(mut pairs: Vec<KeyValue>) -> impl Iterator<Item = KeyValue> {
    pairs.sort_by(|lhs, rhs| lhs.key.cmp(&rhs.key));
    let mut out = Vec::new();
    let mut values = Vec::new();
    let mut iter = pairs.into_iter().peekable();
    while let Some(kv) = iter.next() {
        values.push(kv.value);
        if iter.peek().map_or(true, |next| next.key != kv.key) {
            let total = wc::reduce(&kv.key, &values);
            out.push(KeyValue::new(kv.key, total));
            values.clear();
        }
    }
    out.into_iter()
}
