//! Per-vertex arrival log.
//!
//! Each worker appends one line per event to `<output_root>/<n>/<label>.txt`
//! and flushes after every line:
//!
//! ```text
//! seed: 1
//! first received: 2
//! token: 7, elapsed_us: 1532
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use tesseract_topology::VertexId;
use thiserror::Error;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};

use crate::error::Result;
use crate::token::Token;

/// One line of an arrival log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrivalEntry {
    /// Vertex 0 created the token.
    Seed { token: Token },
    /// First token ever seen by a non-seed vertex; no latency yet.
    FirstReceived { token: Token },
    /// A later arrival, with the time since the previous one.
    Forwarded { token: Token, elapsed_us: u64 },
}

impl ArrivalEntry {
    /// The token value recorded on this line.
    pub fn token(&self) -> Token {
        match *self {
            Self::Seed { token } | Self::FirstReceived { token } | Self::Forwarded { token, .. } => {
                token
            }
        }
    }

    /// Latency in microseconds, if this line carries one.
    pub fn elapsed_us(&self) -> Option<u64> {
        match *self {
            Self::Forwarded { elapsed_us, .. } => Some(elapsed_us),
            _ => None,
        }
    }
}

impl fmt::Display for ArrivalEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Seed { token } => write!(f, "seed: {token}"),
            Self::FirstReceived { token } => write!(f, "first received: {token}"),
            Self::Forwarded { token, elapsed_us } => {
                write!(f, "token: {token}, elapsed_us: {elapsed_us}")
            }
        }
    }
}

/// A log line that is not one of the three entry forms.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed arrival log line: {0:?}")]
pub struct ParseEntryError(pub String);

impl FromStr for ArrivalEntry {
    type Err = ParseEntryError;

    fn from_str(line: &str) -> std::result::Result<Self, Self::Err> {
        let malformed = || ParseEntryError(line.to_string());
        let number = |s: &str| s.trim().parse::<u64>().map_err(|_| malformed());

        if let Some(rest) = line.strip_prefix("seed: ") {
            return Ok(Self::Seed {
                token: Token(number(rest)?),
            });
        }
        if let Some(rest) = line.strip_prefix("first received: ") {
            return Ok(Self::FirstReceived {
                token: Token(number(rest)?),
            });
        }
        if let Some(rest) = line.strip_prefix("token: ") {
            let (token, elapsed) = rest.split_once(", elapsed_us: ").ok_or_else(malformed)?;
            return Ok(Self::Forwarded {
                token: Token(number(token)?),
                elapsed_us: number(elapsed)?,
            });
        }
        Err(malformed())
    }
}

/// Parse a whole log, skipping blank lines.
pub fn parse_log(contents: &str) -> std::result::Result<Vec<ArrivalEntry>, ParseEntryError> {
    contents
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(str::parse)
        .collect()
}

/// Path of `vertex`'s artifact inside `dir` for a cube of dimension `n`.
pub fn artifact_path(dir: &Path, vertex: VertexId, dimension: u32) -> PathBuf {
    dir.join(format!("{}.txt", vertex.label(dimension)))
}

/// Append-only writer for one vertex's artifact.
#[derive(Debug)]
pub struct ArrivalLog {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl ArrivalLog {
    /// Create (or truncate) the artifact for `vertex` inside `dir`.
    pub async fn create(dir: &Path, vertex: VertexId, dimension: u32) -> Result<Self> {
        let path = artifact_path(dir, vertex, dimension);
        let file = File::create(&path).await?;
        Ok(Self {
            path,
            writer: BufWriter::new(file),
        })
    }

    /// Where this log is written.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one entry and flush it.
    pub async fn record(&mut self, entry: &ArrivalEntry) -> Result<()> {
        let line = format!("{entry}\n");
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.flush().await?;
        Ok(())
    }

    /// Flush and close the file.
    pub async fn close(mut self) -> Result<()> {
        self.writer.shutdown().await?;
        Ok(())
    }
}
