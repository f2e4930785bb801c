//! Companion metadata file (.meta)
//!
//! One record per line:
//!
//! ```text
//! COMMAND <space> '"' VALUE '"' '\n'
//! ```
//!
//! Any malformed line fails the whole file. Mesh data is never affected by a
//! metadata failure.

use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use crate::MetadataError;

/// Longest command the reader accepts
pub const MAX_COMMAND_LEN: usize = 31;

/// Longest value the reader accepts
pub const MAX_VALUE_LEN: usize = 255;

/// One `COMMAND "VALUE"` record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaEntry {
    pub command: String,
    pub value: String,
}

/// Ordered records of one `.meta` file
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ModelMetadata {
    entries: Vec<MetaEntry>,
}

impl ModelMetadata {
    pub fn parse(text: &str) -> Result<Self, MetadataError> {
        let mut entries = Vec::new();
        for (i, line) in text.split_inclusive('\n').enumerate() {
            entries.push(parse_line(line, i + 1)?);
        }
        Ok(Self { entries })
    }

    pub fn read_from<R: Read>(mut reader: R) -> Result<Self, MetadataError> {
        let mut text = String::new();
        reader.read_to_string(&mut text)?;
        Self::parse(&text)
    }

    pub fn load(path: &Path) -> Result<Self, MetadataError> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }

    pub fn entries(&self) -> &[MetaEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Value of the first record with this command
    pub fn get(&self, command: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.command == command)
            .map(|e| e.value.as_str())
    }

    /// Values of every record with this command, in file order
    pub fn get_all<'a>(&'a self, command: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.entries
            .iter()
            .filter(move |e| e.command == command)
            .map(|e| e.value.as_str())
    }
}

impl FromStr for ModelMetadata {
    type Err = MetadataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn parse_line(line: &str, n: usize) -> Result<MetaEntry, MetadataError> {
    let (command, rest) = line
        .split_once(' ')
        .ok_or(MetadataError::MissingSeparator { line: n })?;

    if command.len() > MAX_COMMAND_LEN {
        return Err(MetadataError::CommandTooLong {
            line: n,
            len: command.len(),
            max: MAX_COMMAND_LEN,
        });
    }

    let rest = rest
        .strip_prefix('"')
        .ok_or(MetadataError::MissingOpenQuote { line: n })?;
    let (value, tail) = rest
        .split_once('"')
        .ok_or(MetadataError::MissingCloseQuote { line: n })?;

    if value.len() > MAX_VALUE_LEN {
        return Err(MetadataError::ValueTooLong {
            line: n,
            len: value.len(),
            max: MAX_VALUE_LEN,
        });
    }
    if tail != "\n" {
        return Err(MetadataError::MissingNewline { line: n });
    }

    Ok(MetaEntry {
        command: command.to_string(),
        value: value.to_string(),
    })
}
