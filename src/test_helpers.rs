//! Shared test utilities.
//!
//! [`ContentTree`] builds a synthetic project in a temp directory laid out
//! like the default `[paths]` section, so tests exercise the real scanning
//! and resolution code against a disposable filesystem.
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tree = ContentTree::new();
//! tree.post("hooks.md", &doc("Hooks", "2024-01-01", "published: true"));
//! tree.lesson("react", "README.md", &doc("React", "2024-01-01", ""));
//!
//! let outcome = generate_writing_manifest(&tree.paths).unwrap();
//! let manifest: WritingManifest = read_json(&outcome.path);
//! ```

use crate::config::PathsConfig;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// =========================================================================
// Fixture setup
// =========================================================================

/// A project root in a temp directory with default paths resolved under it.
///
/// Nothing is created up front; every writer creates parent directories.
pub struct ContentTree {
    pub tmp: TempDir,
    pub paths: PathsConfig,
}

impl ContentTree {
    pub fn new() -> Self {
        let tmp = TempDir::new().unwrap();
        let paths = PathsConfig::under(tmp.path());
        Self { tmp, paths }
    }

    pub fn root(&self) -> &Path {
        self.tmp.path()
    }

    /// Write a file relative to the project root.
    pub fn write(&self, rel: &str, content: &str) -> PathBuf {
        self.write_bytes(rel, content.as_bytes())
    }

    pub fn write_bytes(&self, rel: &str, bytes: &[u8]) -> PathBuf {
        let path = self.root().join(rel);
        write_file(&path, bytes);
        path
    }

    /// Write a file under the writing root.
    pub fn post(&self, rel: &str, content: &str) -> PathBuf {
        let path = self.paths.writing.join(rel);
        write_file(&path, content.as_bytes());
        path
    }

    /// Write a file inside a course directory.
    pub fn lesson(&self, course: &str, rel: &str, content: &str) -> PathBuf {
        let path = self.paths.courses.join(course).join(rel);
        write_file(&path, content.as_bytes());
        path
    }

    /// Create an empty course directory.
    pub fn course_dir(&self, course: &str) -> PathBuf {
        let dir = self.paths.courses.join(course);
        fs::create_dir_all(&dir).unwrap();
        dir
    }
}

fn write_file(path: &Path, bytes: &[u8]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, bytes).unwrap();
}

/// A document with complete lesson frontmatter, `extra` YAML lines, and a
/// one-word body (`Body`) that tests can `replace`.
pub fn doc(title: &str, date: &str, extra: &str) -> String {
    format!(
        "---\ntitle: {title}\ndescription: About {title}\ndate: {date}\n\
         modified: {date}\n{extra}\n---\n\nBody\n"
    )
}

/// Encode a solid-color PNG of the given size.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb([200, 120, 40]));
    let mut buf = std::io::Cursor::new(Vec::new());
    img.write_to(&mut buf, image::ImageFormat::Png).unwrap();
    buf.into_inner()
}

// =========================================================================
// Readers
// =========================================================================

pub fn read_json<T: DeserializeOwned>(path: &Path) -> T {
    let bytes = fs::read(path)
        .unwrap_or_else(|e| panic!("cannot read {}: {e}", path.display()));
    serde_json::from_slice(&bytes)
        .unwrap_or_else(|e| panic!("invalid JSON in {}: {e}", path.display()))
}

/// File names of `paths`, in order.
pub fn file_names(paths: &[PathBuf]) -> Vec<String> {
    paths
        .iter()
        .map(|p| {
            p.file_name()
                .unwrap_or_else(|| panic!("no file name in {}", p.display()))
                .to_string_lossy()
                .into_owned()
        })
        .collect()
}
