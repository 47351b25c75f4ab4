//! Serializing word counts to a sink

use std::{
    io,
    path::{Path, PathBuf},
};

use anyhow::Context;
use clap::ValueEnum;
use serde::{ser::Error as _, Serialize};
use serde_json::ser::Formatter;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::info;

use crate::mr::counter::WordCounts;

/// How one `(word, count)` record is written
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// `word<TAB>count`
    #[default]
    Tsv,
    /// Key and value each JSON-encoded, separated by a tab: `"word"<TAB>count`,
    /// with everything outside printable ASCII escaped as `\uXXXX`
    Json,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum SortOrder {
    /// Ascending by word, compared byte-wise
    #[default]
    Word,
    /// Descending by count, ties ascending by word
    Count,
    /// Whatever order the mapping iterates in
    Unsorted,
}

pub fn sorted(counts: &WordCounts, order: SortOrder) -> Vec<(&str, u64)> {
    let mut records: Vec<(&str, u64)> = counts.iter().collect();
    match order {
        SortOrder::Word => records.sort_unstable_by(|lhs, rhs| lhs.0.cmp(rhs.0)),
        SortOrder::Count => {
            records.sort_unstable_by(|lhs, rhs| rhs.1.cmp(&lhs.1).then_with(|| lhs.0.cmp(rhs.0)))
        }
        SortOrder::Unsorted => {}
    }
    records
}

/// Escapes every character outside printable ASCII, astral characters as a surrogate pair
struct AsciiFormatter;

impl Formatter for AsciiFormatter {
    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        let mut start = 0;
        for (index, c) in fragment.char_indices() {
            if (' '..='~').contains(&c) {
                continue;
            }
            writer.write_all(fragment[start..index].as_bytes())?;
            let mut units = [0u16; 2];
            for unit in c.encode_utf16(&mut units) {
                write!(writer, "\\u{:04x}", unit)?;
            }
            start = index + c.len_utf8();
        }
        writer.write_all(fragment[start..].as_bytes())
    }
}

/// Encodes `word` as an ASCII-only JSON string
pub fn json_key(word: &str) -> serde_json::Result<String> {
    let mut ser = serde_json::Serializer::with_formatter(Vec::new(), AsciiFormatter);
    word.serialize(&mut ser)?;
    String::from_utf8(ser.into_inner()).map_err(serde_json::Error::custom)
}

pub fn format_record(word: &str, count: u64, format: OutputFormat) -> serde_json::Result<String> {
    Ok(match format {
        OutputFormat::Tsv => format!("{}\t{}\n", word, count),
        OutputFormat::Json => format!("{}\t{}\n", json_key(word)?, count),
    })
}

/// Renders every record, one per line
pub fn render(counts: &WordCounts, format: OutputFormat, order: SortOrder) -> serde_json::Result<String> {
    let mut out = String::new();
    for (word, count) in sorted(counts, order) {
        out.push_str(&format_record(word, count, format)?);
    }
    Ok(out)
}

pub async fn write_counts<W>(
    writer: &mut W,
    counts: &WordCounts,
    format: OutputFormat,
    order: SortOrder,
) -> anyhow::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let rendered = render(counts, format, order)?;
    writer.write_all(rendered.as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}

pub async fn write_file(
    path: &Path,
    counts: &WordCounts,
    format: OutputFormat,
    order: SortOrder,
) -> anyhow::Result<()> {
    let mut file = tokio::fs::File::create(path)
        .await
        .with_context(|| format!("failed to create output file {}", path.display()))?;
    write_counts(&mut file, counts, format, order)
        .await
        .with_context(|| format!("failed to write output file {}", path.display()))?;
    info!("The output has been written to {}", path.display());
    Ok(())
}

/// The name of the output file for one reduce partition
pub fn part_file_name(reduce_task_id: usize) -> String {
    format!("part-{:05}", reduce_task_id)
}

/// Writes one `part-NNNNN` file per partition into `dir`, creating it if missing
pub async fn write_partitions(
    dir: &Path,
    partitions: &[WordCounts],
    format: OutputFormat,
    order: SortOrder,
) -> anyhow::Result<Vec<PathBuf>> {
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("failed to create output directory {}", dir.display()))?;
    let mut written = Vec::with_capacity(partitions.len());
    for (reduce_task_id, counts) in partitions.iter().enumerate() {
        let path = dir.join(part_file_name(reduce_task_id));
        write_file(&path, counts, format, order).await?;
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> WordCounts {
        [("hello", 2), ("world", 1), ("apple", 2), ("Zebra", 1)]
            .into_iter()
            .collect()
    }

    #[test]
    fn sorts_by_word_bytewise() {
        let counts = sample();
        let words: Vec<&str> = sorted(&counts, SortOrder::Word)
            .into_iter()
            .map(|(w, _)| w)
            .collect();
        assert_eq!(words, vec!["Zebra", "apple", "hello", "world"]);
    }

    #[test]
    fn sorts_by_count_then_word() {
        let counts = sample();
        let records = sorted(&counts, SortOrder::Count);
        assert_eq!(
            records,
            vec![("apple", 2), ("hello", 2), ("Zebra", 1), ("world", 1)]
        );
    }

    #[test]
    fn unsorted_keeps_every_record() {
        assert_eq!(sorted(&sample(), SortOrder::Unsorted).len(), 4);
    }

    #[test]
    fn renders_tab_separated_records() {
        let counts: WordCounts = [("hello", 2), ("world", 1)].into_iter().collect();
        assert_eq!(
            render(&counts, OutputFormat::Tsv, SortOrder::Word).unwrap(),
            "hello\t2\nworld\t1\n"
        );
    }

    #[test]
    fn json_format_encodes_the_key() {
        assert_eq!(
            format_record("say \"hi\"", 3, OutputFormat::Json).unwrap(),
            "\"say \\\"hi\\\"\"\t3\n"
        );
        assert_eq!(
            format_record("plain", 1, OutputFormat::Json).unwrap(),
            "\"plain\"\t1\n"
        );
    }

    #[test]
    fn json_format_escapes_non_ascii() {
        assert_eq!(
            format_record("café", 1, OutputFormat::Json).unwrap(),
            "\"caf\\u00e9\"\t1\n"
        );
        assert_eq!(json_key("日本").unwrap(), "\"\\u65e5\\u672c\"");
        assert_eq!(json_key("a😀b").unwrap(), "\"a\\ud83d\\ude00b\"");
        assert_eq!(json_key("del\u{7f}").unwrap(), "\"del\\u007f\"");
    }

    #[test]
    fn json_format_keeps_short_escapes() {
        assert_eq!(json_key("a\\b\tc\u{1f}").unwrap(), "\"a\\\\b\\tc\\u001f\"");
    }

    #[test]
    fn tsv_format_writes_the_raw_word() {
        assert_eq!(
            format_record("café", 2, OutputFormat::Tsv).unwrap(),
            "café\t2\n"
        );
    }

    #[test]
    fn empty_mapping_renders_nothing() {
        assert_eq!(
            render(&WordCounts::new(), OutputFormat::Json, SortOrder::Count).unwrap(),
            ""
        );
    }

    #[test]
    fn part_files_are_zero_padded() {
        assert_eq!(part_file_name(0), "part-00000");
        assert_eq!(part_file_name(12), "part-00012");
    }

    #[tokio::test]
    async fn writes_one_file_per_partition() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested").join("out");
        let partitions = vec![
            [("a", 1)].into_iter().collect::<WordCounts>(),
            WordCounts::new(),
        ];

        let written = write_partitions(&out, &partitions, OutputFormat::Tsv, SortOrder::Word)
            .await
            .unwrap();

        assert_eq!(written, vec![out.join("part-00000"), out.join("part-00001")]);
        assert_eq!(std::fs::read_to_string(&written[0]).unwrap(), "a\t1\n");
        assert_eq!(std::fs::read_to_string(&written[1]).unwrap(), "");
    }

    #[tokio::test]
    async fn write_counts_into_a_buffer() {
        let mut buf: Vec<u8> = Vec::new();
        let counts: WordCounts = [("x", 4)].into_iter().collect();
        write_counts(&mut buf, &counts, OutputFormat::Json, SortOrder::Word)
            .await
            .unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "\"x\"\t4\n");
    }
}
