//! Error types for the `.mesh` codec, `.meta` reader and asset loader.

use std::io;
use std::path::PathBuf;

/// Structural failure while encoding or decoding a `.mesh` stream.
///
/// Every variant is fatal to the whole asset.
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("not a skeletal mesh stream (magic byte {found}, expected {expected})")]
    BadMagic { found: u8, expected: u8 },

    #[error("stream ended while reading {what}")]
    Truncated { what: &'static str },

    #[error("mesh '{mesh}' has no vertices")]
    NoVertices { mesh: String },

    #[error("mesh '{mesh}' has no faces")]
    NoFaces { mesh: String },

    #[error("{what} '{name}' is {len} bytes, maximum is 255")]
    NameTooLong {
        what: &'static str,
        name: String,
        len: usize,
    },

    #[error("{what} is not valid UTF-8")]
    InvalidUtf8 { what: &'static str },

    #[error("mesh '{mesh}': bone {bone} has parent {parent}, outside [0, {bone_count})")]
    InvalidParentIndex {
        mesh: String,
        bone: u32,
        parent: i32,
        bone_count: u32,
    },

    #[error("mesh '{mesh}': parent chain of bone {bone} does not terminate")]
    CyclicBoneHierarchy { mesh: String, bone: u32 },

    #[error("mesh '{mesh}': vertex {vertex} references bone {bone}, outside [0, {bone_count})")]
    InvalidInfluence {
        mesh: String,
        vertex: u32,
        bone: i32,
        bone_count: u32,
    },

    #[error("mesh '{mesh}': face {face} references vertex {index}, but there are {vertex_count}")]
    FaceIndexOutOfRange {
        mesh: String,
        face: u32,
        index: u32,
        vertex_count: u32,
    },

    #[error("{what} needs {requested} bytes, exceeding the remaining budget of {remaining}")]
    BudgetExceeded {
        what: &'static str,
        requested: u64,
        remaining: u64,
    },

    #[error("allocation of {count} {what} rejected")]
    AllocationRejected { what: &'static str, count: u64 },

    #[error("decoder is {state}, cannot {action}")]
    InvalidState {
        state: &'static str,
        action: &'static str,
    },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl FormatError {
    /// Map a failed fixed-size read, turning EOF into [`FormatError::Truncated`].
    pub(crate) fn from_read(err: io::Error, what: &'static str) -> Self {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            Self::Truncated { what }
        } else {
            Self::Io(err)
        }
    }
}

/// Failure while parsing a `.meta` companion file.
///
/// Only the metadata is lost; mesh data is unaffected.
#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    #[error("line {line}: missing space after command")]
    MissingSeparator { line: usize },

    #[error("line {line}: value must start with '\"'")]
    MissingOpenQuote { line: usize },

    #[error("line {line}: value is missing its closing '\"'")]
    MissingCloseQuote { line: usize },

    #[error("line {line}: expected newline after closing quote")]
    MissingNewline { line: usize },

    #[error("line {line}: command is {len} bytes, maximum is {max}")]
    CommandTooLong { line: usize, len: usize, max: usize },

    #[error("line {line}: value is {len} bytes, maximum is {max}")]
    ValueTooLong { line: usize, len: usize, max: usize },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Failure of a top-level asset load.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("couldn't open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{} is {size} bytes, over the {limit} byte limit", path.display())]
    TooLarge { path: PathBuf, size: u64, limit: u64 },

    #[error("failed to decode {}: {source}", path.display())]
    Format {
        path: PathBuf,
        #[source]
        source: FormatError,
    },

    #[error("invalid loader config: {0}")]
    Config(#[from] toml::de::Error),
}
