//! Reads hand-written LS-8 programs.
//!
//! A program is plain text with one byte per line, written as a binary
//! literal. `#` starts a comment, which may take up a whole line or trail a
//! value:
//!
//! ```text
//! # print8
//! 10000010 # LDI R0,8
//! 00000000
//! 00001000
//! ```
//!
//! Lines that are not a valid byte are skipped rather than rejected.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::region::Chunk;

/// Directory searched when a program name is not a path on its own.
pub const PROGRAMS_DIR: &str = "programs";

#[derive(thiserror::Error, Debug)]
pub enum LoadError {
  #[error("couldn't find program `{}`", .0.display())]
  NotFound(PathBuf),

  #[error("couldn't read `{}`", .path.display())]
  Io {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
}

/// Parses program text into the bytes it describes.
pub fn parse(source: &str) -> Chunk {
  source
    .lines()
    .enumerate()
    .filter_map(|(index, line)| {
      let byte = parse_line(line);
      if byte.is_none() && !is_blank(line) {
        log::debug!("skipping line {}: {:?}", index + 1, line);
      }
      byte
    })
    .collect()
}

/// A single byte from one line, ignoring any comment.
fn parse_line(line: &str) -> Option<u8> {
  let code = strip_comment(line).trim();
  let digits = code
    .strip_prefix("0b")
    .or_else(|| code.strip_prefix("0B"))
    .unwrap_or(code);
  u8::from_str_radix(digits, 2).ok()
}

fn strip_comment(line: &str) -> &str {
  line.split_once('#').map_or(line, |(code, _)| code)
}

fn is_blank(line: &str) -> bool {
  strip_comment(line).trim().is_empty()
}

/// Finds the file behind a program name: the name itself if it exists,
/// otherwise the same name inside [`PROGRAMS_DIR`].
pub fn resolve(name: impl AsRef<Path>) -> Result<PathBuf, LoadError> {
  resolve_in(name, PROGRAMS_DIR)
}

fn resolve_in(name: impl AsRef<Path>, dir: impl AsRef<Path>) -> Result<PathBuf, LoadError> {
  let name = name.as_ref();
  if name.is_file() {
    return Ok(name.to_path_buf());
  }
  let candidate = dir.as_ref().join(name);
  if candidate.is_file() {
    return Ok(candidate);
  }
  Err(LoadError::NotFound(name.to_path_buf()))
}

/// Reads and parses the program at `path`.
///
/// Bytes that are not UTF-8 only spoil the line they are on.
pub fn load_file(path: impl AsRef<Path>) -> Result<Chunk, LoadError> {
  let path = path.as_ref();
  let source = fs::read(path).map_err(|source| match source.kind() {
    io::ErrorKind::NotFound => LoadError::NotFound(path.to_path_buf()),
    _ => LoadError::Io {
      path: path.to_path_buf(),
      source,
    },
  })?;
  let chunk = parse(&String::from_utf8_lossy(&source));
  log::info!("read {} bytes from {}", chunk.len(), path.display());
  Ok(chunk)
}
