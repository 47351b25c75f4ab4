use std::{
    borrow::Cow,
    path::{Path, PathBuf},
};

use futures::future::try_join_all;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};
use tracing::debug;

use crate::error::InputError;

/// Where input lines come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    Stdin,
    File(PathBuf),
}

impl InputSource {
    /// `-` names standard input, anything else is a file path
    pub fn from_arg(arg: &Path) -> Self {
        if arg == Path::new("-") {
            Self::Stdin
        } else {
            Self::File(arg.to_path_buf())
        }
    }

    /// Maps command line arguments to sources, no arguments means standard input
    ///
    /// Standard input can only be drained once, so repeated `-` arguments after the first are dropped
    pub fn from_args(args: &[PathBuf]) -> Vec<Self> {
        if args.is_empty() {
            return vec![Self::Stdin];
        }
        let mut seen_stdin = false;
        args.iter()
            .map(|arg| Self::from_arg(arg))
            .filter(|source| match source {
                Self::Stdin => !std::mem::replace(&mut seen_stdin, true),
                Self::File(_) => true,
            })
            .collect()
    }
}

/// Decodes one line as UTF-8, falling back to latin-1 so undecodable bytes are still counted
pub fn decode_line(bytes: &[u8]) -> Cow<'_, str> {
    match std::str::from_utf8(bytes) {
        Ok(line) => Cow::Borrowed(line),
        Err(_) => Cow::Owned(bytes.iter().map(|&b| char::from(b)).collect()),
    }
}

/// Splits raw input on `\n`, dropping a trailing `\r` from each line
fn split_lines(bytes: &[u8]) -> impl Iterator<Item = &[u8]> {
    let has_lines = !bytes.is_empty();
    let body = bytes.strip_suffix(b"\n").unwrap_or(bytes);
    body.split(|&b| b == b'\n')
        .filter(move |_| has_lines)
        .map(trim_line_end)
}

fn trim_line_end(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

/// Reads every source concurrently and returns all lines in argument order
pub async fn read_lines(sources: &[InputSource]) -> Result<Vec<String>, InputError> {
    let contents = try_join_all(sources.iter().map(read_source)).await?;
    let lines: Vec<String> = contents
        .iter()
        .flat_map(|content| split_lines(content))
        .map(|line| decode_line(line).into_owned())
        .collect();
    debug!("Read {} line(s) from {} source(s)", lines.len(), sources.len());
    Ok(lines)
}

/// Streams the lines of every source, one source after another, without keeping them
pub async fn for_each_line<F>(sources: &[InputSource], mut f: F) -> Result<(), InputError>
where
    F: FnMut(&str),
{
    for source in sources {
        match source {
            InputSource::Stdin => stream_lines(tokio::io::stdin(), &mut f)
                .await
                .map_err(InputError::Stdin)?,
            InputSource::File(path) => stream_file(path, &mut f)
                .await
                .map_err(|source| InputError::Read {
                    path: path.clone(),
                    source,
                })?,
        };
        debug!("Finished reading {:?}", source);
    }
    Ok(())
}

async fn read_source(source: &InputSource) -> Result<Vec<u8>, InputError> {
    match source {
        InputSource::Stdin => {
            let mut contents = Vec::new();
            tokio::io::stdin()
                .read_to_end(&mut contents)
                .await
                .map_err(InputError::Stdin)?;
            Ok(contents)
        }
        InputSource::File(path) => tokio::fs::read(path)
            .await
            .map_err(|source| InputError::Read {
                path: path.clone(),
                source,
            }),
    }
}

async fn stream_file<F>(path: &Path, f: &mut F) -> std::io::Result<usize>
where
    F: FnMut(&str),
{
    let file = tokio::fs::File::open(path).await?;
    stream_lines(file, f).await
}

async fn stream_lines<R, F>(reader: R, f: &mut F) -> std::io::Result<usize>
where
    R: AsyncRead + Unpin,
    F: FnMut(&str),
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    let mut n = 0;
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }
        let line = decode_line(trim_line_end(&buf));
        f(&*line);
        n += 1;
    }
    Ok(n)
}
