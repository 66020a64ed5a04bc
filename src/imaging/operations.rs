//! High-level image operations.
//!
//! These functions combine calculations with backend execution. They take
//! configuration, compute parameters, and call the backend.

use super::backend::{BackendError, ImageBackend, ImageInfo};
use super::calculations::probe_dimensions;
use super::params::{OutputFormat, Quality, TranscodeParams};
use std::path::Path;

/// How compatibility probes are run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeConfig {
    /// Maximum width of probe transcodes.
    pub width: u32,
    pub quality: Quality,
    /// Lowercase format names that are only identified, never transcoded.
    pub skip_transform: Vec<String>,
}

impl ProbeConfig {
    pub fn skips(&self, info: &ImageInfo) -> bool {
        self.skip_transform
            .iter()
            .any(|f| f.eq_ignore_ascii_case(&info.format))
    }
}

/// One failed probe step.
#[derive(Debug)]
pub enum ProbeFailure {
    Metadata(BackendError),
    Transcode {
        format: OutputFormat,
        error: BackendError,
    },
}

/// Probe one image: read its metadata, then (unless its format is in the
/// skip list) transcode a downsized copy to every [`OutputFormat`].
///
/// A metadata failure ends the probe; transcode failures are all collected.
pub fn probe_image(
    backend: &impl ImageBackend,
    path: &Path,
    config: &ProbeConfig,
) -> Vec<ProbeFailure> {
    let info = match backend.read_metadata(path) {
        Ok(info) => info,
        Err(e) => return vec![ProbeFailure::Metadata(e)],
    };
    if config.skips(&info) {
        return Vec::new();
    }

    let (width, height) = probe_dimensions((info.width, info.height), config.width);
    OutputFormat::ALL
        .into_iter()
        .filter_map(|format| {
            backend
                .transcode(&TranscodeParams {
                    source: path.to_path_buf(),
                    format,
                    width,
                    height,
                    quality: config.quality,
                })
                .err()
                .map(|error| ProbeFailure::Transcode { format, error })
        })
        .collect()
}
