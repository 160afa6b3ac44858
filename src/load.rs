//! Decoding of the user and action inputs.
//!
//! Users are a single JSON array. Actions are either a JSON array or JSON
//! Lines (one action object per line), which is what an append-only action
//! log looks like on disk. Either input may be zstd-compressed on disk.

use crate::error::LoadError;
use crate::record::{Action, User};
use std::fs;
use std::io::{self, BufRead, Read};
use std::path::Path;

/// Decode a JSON array of users.
///
/// # Errors
///
/// Returns [`LoadError::Malformed`] if the bytes are not a JSON array of
/// user objects.
pub fn load_users(bytes: &[u8]) -> Result<Vec<User>, LoadError> {
    serde_json::from_slice(bytes).map_err(|source| LoadError::Malformed {
        what: "users",
        source,
    })
}

/// Decode the action log, preserving its order.
///
/// Input starting with `[` is parsed as a JSON array; anything else is read
/// as JSON Lines, skipping blank lines.
///
/// # Errors
///
/// Returns [`LoadError::Malformed`] for a bad array (or empty input) and
/// [`LoadError::MalformedLine`] with the 1-based line number for a bad
/// JSON Lines entry.
///
/// # Examples
///
/// ```
/// use actionfold::load_actions;
///
/// let jsonl = b"{\"id\":1,\"type\":\"A\",\"userId\":1}\n\n{\"id\":2,\"type\":\"B\",\"userId\":1}\n";
/// let actions = load_actions(jsonl).unwrap();
/// assert_eq!(actions.len(), 2);
/// assert_eq!(actions[1].action_type, "B");
/// ```
pub fn load_actions(bytes: &[u8]) -> Result<Vec<Action>, LoadError> {
    match bytes.iter().copied().find(|b| !b.is_ascii_whitespace()) {
        Some(b'[') | None => {
            serde_json::from_slice(bytes).map_err(|source| LoadError::Malformed {
                what: "actions",
                source,
            })
        }
        Some(_) => JsonLines::new(bytes).collect(),
    }
}

/// Read an input file into memory.
///
/// Paths ending in `.zst` are decompressed; archived action logs are
/// stored as concatenated zstd frames and come back as one byte stream.
///
/// # Errors
///
/// [`LoadError::Io`] if the file can't be read, [`LoadError::Decompress`]
/// if a `.zst` file is not valid zstd.
pub fn read_input(path: &Path) -> Result<Vec<u8>, LoadError> {
    let raw = fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    if path.extension().is_some_and(|ext| ext == "zst") {
        decompress(&raw).map_err(|source| LoadError::Decompress {
            path: path.to_path_buf(),
            source,
        })
    } else {
        Ok(raw)
    }
}

fn decompress(raw: &[u8]) -> io::Result<Vec<u8>> {
    let mut decoder = zstd::Decoder::new(raw)?;
    let mut out = Vec::new();
    decoder.read_to_end(&mut out)?;
    Ok(out)
}

struct JsonLines<R> {
    lines: io::Lines<R>,
    line_no: usize,
}

impl<R: BufRead> JsonLines<R> {
    fn new(reader: R) -> Self {
        JsonLines {
            lines: reader.lines(),
            line_no: 0,
        }
    }
}

impl<R: BufRead> Iterator for JsonLines<R> {
    type Item = Result<Action, LoadError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = self.lines.next()?;
            self.line_no += 1;

            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    return Some(Err(LoadError::MalformedLine {
                        line: self.line_no,
                        source: serde_json::Error::io(e),
                    }));
                }
            };

            if line.trim().is_empty() {
                continue;
            }

            return Some(serde_json::from_str(&line).map_err(|source| {
                LoadError::MalformedLine {
                    line: self.line_no,
                    source,
                }
            }));
        }
    }
}
