//! Pure Rust image backend, statically linked.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Metadata (JPEG, PNG, GIF, TIFF, WebP) | `image::ImageReader` header read, no full decode |
//! | Metadata (AVIF) | `avif-parse` container metadata |
//! | Decode | `image` crate (pure Rust decoders) |
//! | Resize | `image::DynamicImage::resize_exact` with `Lanczos3` |
//! | Encode → WebP | `image::codecs::webp::WebPEncoder` (lossless) |
//! | Encode → AVIF | `image::codecs::avif::AvifEncoder` (rav1e, speed 10) |
//!
//! AVIF sources can be identified but not decoded: the `image` crate's
//! `"avif"` feature only enables the encoder. AVIF is pre-optimized, so the
//! checker never asks to transcode it.

use super::backend::{BackendError, ImageBackend, ImageInfo};
use super::params::{OutputFormat, Quality, TranscodeParams};
use image::codecs::avif::AvifEncoder;
use image::codecs::webp::WebPEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader};
use std::path::Path;

/// rav1e speed for probe encodes; the output is discarded.
const AVIF_PROBE_SPEED: u8 = 10;

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn is_avif(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("avif"))
}

/// Canonical lowercase name of a format (`jpg` for JPEG).
fn format_name(format: ImageFormat) -> String {
    format
        .extensions_str()
        .first()
        .copied()
        .unwrap_or("unknown")
        .to_string()
}

/// Extract dimensions from an AVIF file's container metadata (no decode needed).
fn identify_avif(path: &Path) -> Result<ImageInfo, BackendError> {
    let file_data = std::fs::read(path)?;
    let avif = avif_parse::read_avif(&mut std::io::Cursor::new(&file_data)).map_err(|e| {
        BackendError::ProcessingFailed(format!("Failed to parse AVIF {}: {e:?}", path.display()))
    })?;
    let meta = avif.primary_item_metadata().map_err(|e| {
        BackendError::ProcessingFailed(format!(
            "Failed to read AVIF metadata {}: {e:?}",
            path.display()
        ))
    })?;
    Ok(ImageInfo {
        format: "avif".to_string(),
        width: meta.max_frame_width.get(),
        height: meta.max_frame_height.get(),
    })
}

/// Load and decode an image from disk.
fn load_image(path: &Path) -> Result<DynamicImage, BackendError> {
    if is_avif(path) {
        return Err(BackendError::ProcessingFailed(format!(
            "AVIF decoding is not supported: {}",
            path.display()
        )));
    }
    ImageReader::open(path)?
        .with_guessed_format()?
        .decode()
        .map_err(|e| {
            BackendError::ProcessingFailed(format!("Failed to decode {}: {}", path.display(), e))
        })
}

/// Encode into an in-memory buffer.
fn encode(
    img: &DynamicImage,
    format: OutputFormat,
    quality: Quality,
) -> Result<Vec<u8>, BackendError> {
    let mut buf = Vec::new();
    let result = match format {
        // The WebP encoder only takes 8-bit RGB(A) input.
        OutputFormat::WebP => DynamicImage::ImageRgba8(img.to_rgba8())
            .write_with_encoder(WebPEncoder::new_lossless(&mut buf)),
        OutputFormat::Avif => img.write_with_encoder(AvifEncoder::new_with_speed_quality(
            &mut buf,
            AVIF_PROBE_SPEED,
            quality.value() as u8,
        )),
    };
    result.map_err(|e| BackendError::ProcessingFailed(format!("{format} encode failed: {e}")))?;
    Ok(buf)
}

impl ImageBackend for RustBackend {
    fn read_metadata(&self, path: &Path) -> Result<ImageInfo, BackendError> {
        if is_avif(path) {
            return identify_avif(path);
        }
        let reader = ImageReader::open(path)?.with_guessed_format()?;
        let format = reader.format().ok_or_else(|| {
            BackendError::ProcessingFailed(format!(
                "Unrecognized image format: {}",
                path.display()
            ))
        })?;
        let (width, height) = reader.into_dimensions().map_err(|e| {
            BackendError::ProcessingFailed(format!("Failed to read dimensions: {}", e))
        })?;
        Ok(ImageInfo {
            format: format_name(format),
            width,
            height,
        })
    }

    fn transcode(&self, params: &TranscodeParams) -> Result<Vec<u8>, BackendError> {
        let img = load_image(&params.source)?;
        let resized = img.resize_exact(params.width, params.height, FilterType::Lanczos3);
        encode(&resized, params.format, params.quality)
    }
}
