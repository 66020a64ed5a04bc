//! Image compatibility probing, pure Rust.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Metadata** | `image::ImageReader` header read, `avif-parse` for AVIF |
//! | **Transcode → WebP** | Lanczos3 resize + lossless WebP encoder |
//! | **Transcode → AVIF** | Lanczos3 resize + rav1e encoder |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: High-level functions combining calculations + backend

pub mod backend;
mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, ImageBackend, ImageInfo};
pub use operations::{ProbeConfig, ProbeFailure, probe_image};
pub use params::{OutputFormat, Quality, TranscodeParams};
pub use rust_backend::RustBackend;
