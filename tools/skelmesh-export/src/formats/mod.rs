//! Binary format helpers for the export tool
//!
//! Re-exports the `.mesh` grammar from skelmesh-common and adds the
//! file-writing conveniences the CLI needs.

pub use skelmesh_common::formats::*;

use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Encode `asset` and write it to `w` in one piece
///
/// Nothing reaches `w` unless the whole asset encodes.
pub fn write_mesh_stream<W: Write>(w: &mut W, asset: &ModelAsset) -> Result<usize> {
    let bytes = encode_model_asset(asset).context("Failed to encode model asset")?;
    w.write_all(&bytes)?;
    w.flush()?;
    Ok(bytes.len())
}

/// Encode `asset` into a `.mesh` file
pub fn write_mesh_file(path: &Path, asset: &ModelAsset) -> Result<usize> {
    // Encode before creating the file so a bad asset leaves no output behind
    let bytes = encode_model_asset(asset).context("Failed to encode model asset")?;
    let file =
        File::create(path).with_context(|| format!("Failed to create output: {:?}", path))?;
    let mut writer = BufWriter::new(file);
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(bytes.len())
}
