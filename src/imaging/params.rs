//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between [`operations`](super::operations), which decides which
//! probes to run, and the [`backend`](super::backend), which does the pixel
//! work. A mock backend can be swapped in without changing operation logic.
//!
//! - [`Quality`]: lossy encoding quality (1–100), clamped on construction.
//! - [`OutputFormat`]: target format of a transcode.
//! - [`TranscodeParams`]: source, target format, output size, quality.

use std::fmt;
use std::path::PathBuf;

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(50)
    }
}

/// Modern web formats every referenced image must convert to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputFormat {
    WebP,
    Avif,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 2] = [OutputFormat::WebP, OutputFormat::Avif];

    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::WebP => "webp",
            OutputFormat::Avif => "avif",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Parameters for an in-memory transcode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscodeParams {
    pub source: PathBuf,
    pub format: OutputFormat,
    pub width: u32,
    pub height: u32,
    pub quality: Quality,
}
