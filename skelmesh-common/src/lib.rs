//! Shared types for the skeletal mesh exchange format
//!
//! This crate is used by both sides of the `.mesh` pipeline:
//! - `skelmesh-export` (encoder tool) writes assets with [`formats::encode_model_asset`]
//! - renderers load them through [`loader::ModelLoader`]
//!
//! # Modules
//!
//! - [`formats`] - Binary grammar, record types, encoder and decoder
//! - [`metadata`] - Companion `.meta` line records
//! - [`config`] - Loader configuration (TOML)
//! - [`collaborators`] - Material and GPU capabilities injected into the loader
//! - [`loader`] - Top-level asset load with degraded-material handling

pub mod collaborators;
pub mod config;
pub mod error;
pub mod formats;
pub mod loader;
pub mod metadata;

pub use collaborators::{GpuUploader, Headless, MaterialRequest, MaterialResolver};
pub use config::LoaderConfig;
pub use error::{FormatError, LoadError, MetadataError};
pub use loader::{LoadedMesh, LoadedModel, MeshMaterial, ModelLoader};
pub use metadata::{MetaEntry, ModelMetadata};

// Re-export commonly used format items
pub use formats::{
    // Constants
    DEFAULT_SHADER,
    MAGIC_NUMBER,
    MAX_INFLUENCES,
    MAX_NAME_LEN,
    MESH_EXT,
    META_EXT,
    MIN_SKIN_WEIGHT,
    NO_PARENT,
    UNUSED_SLOT,
    VERTEX_RECORD_SIZE,
    // Records
    AssetHeader,
    BinarySerializable,
    BoneRecord,
    DecodeState,
    MeshRecord,
    ModelAsset,
    ModelDecoder,
    Skeleton,
    VertexRecord,
    // Codec entry points
    decode_model_asset,
    encode_model_asset,
    write_model_asset,
};
