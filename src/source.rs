use crate::config::READ_BUFFER_SIZE;
use anyhow::{Context, Result};
use bzip2::read::BzDecoder;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

/// One line of a dump with its 1-based line number. Line terminator removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLine {
    pub number: u64,
    pub bytes: Vec<u8>,
}

impl RawLine {
    /// Lossy text form for log context
    pub fn preview(&self, max_chars: usize) -> String {
        String::from_utf8_lossy(&self.bytes)
            .chars()
            .take(max_chars)
            .collect()
    }
}

/// Streams a dump file one line at a time. `.bz2` files are decompressed on the fly.
pub struct DumpReader {
    reader: Box<dyn BufRead>,
    path: PathBuf,
    line_number: u64,
    done: bool,
}

impl DumpReader {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to open dump file: {}", path.display()))?;

        let reader: Box<dyn BufRead> = if is_bz2(path) {
            Box::new(BufReader::with_capacity(
                READ_BUFFER_SIZE,
                BzDecoder::new(file),
            ))
        } else {
            Box::new(BufReader::with_capacity(READ_BUFFER_SIZE, file))
        };

        Ok(Self::from_reader(reader, path))
    }

    pub fn from_reader(reader: Box<dyn BufRead>, path: impl Into<PathBuf>) -> Self {
        Self {
            reader,
            path: path.into(),
            line_number: 0,
            done: false,
        }
    }
}

fn is_bz2(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("bz2"))
        .unwrap_or(false)
}

impl Iterator for DumpReader {
    type Item = Result<RawLine>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let mut buf = Vec::new();
        match self.reader.read_until(b'\n', &mut buf) {
            Ok(0) => {
                self.done = true;
                None
            }
            Ok(_) => {
                self.line_number += 1;
                if buf.last() == Some(&b'\n') {
                    buf.pop();
                    if buf.last() == Some(&b'\r') {
                        buf.pop();
                    }
                }
                Some(Ok(RawLine {
                    number: self.line_number,
                    bytes: buf,
                }))
            }
            Err(e) => {
                // A read error mid-stream is not recoverable; stop after reporting it.
                self.done = true;
                Some(Err(e).with_context(|| {
                    format!(
                        "Failed to read {} after line {}",
                        self.path.display(),
                        self.line_number
                    )
                }))
            }
        }
    }
}
