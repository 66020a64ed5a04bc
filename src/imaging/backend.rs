//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait is the external image capability the checker
//! relies on: read metadata, and transcode to a target format in memory.
//! Any error is opaque to callers; it is recorded, never retried.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), pure Rust and
//! statically linked.

use super::params::TranscodeParams;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Basic image metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageInfo {
    /// Lowercase format name (`png`, `jpg`, `gif`, `webp`, `avif`, ...).
    pub format: String,
    pub width: u32,
    pub height: u32,
}

/// Trait for image processing backends.
///
/// `Sync` so probes can fan out over rayon.
pub trait ImageBackend: Sync {
    /// Read format and dimensions.
    fn read_metadata(&self, path: &Path) -> Result<ImageInfo, BackendError>;

    /// Decode, resize, and encode; returns the encoded bytes.
    fn transcode(&self, params: &TranscodeParams) -> Result<Vec<u8>, BackendError>;
}
