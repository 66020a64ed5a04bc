//! Pipeline configuration.
//!
//! Handles loading, validating, and merging `pipeline.toml`. Stock defaults
//! are overridden by a sparse user file at the project root, then resolved
//! into absolute paths ([`PathsConfig`]) that are handed to every component
//! explicitly. Nothing in the pipeline reads paths relative to the process
//! or to the binary's location.
//!
//! ## Config File Location
//!
//! ```text
//! project/
//! ├── pipeline.toml            # optional, overrides stock defaults
//! ├── content/writing/         # writing posts (*.md)
//! ├── courses/                 # one directory per course
//! │   └── react/
//! │       ├── README.md        # course overview (frontmatter = course block)
//! │       └── hooks.md         # lesson
//! └── static/                  # site-relative assets (/images/x.png)
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! [paths]
//! writing = "content/writing"
//! courses = "courses"
//! static_dir = "static"
//! content_index = "src/lib/generated/content-index.json"
//! manifest_name = "manifest.json"
//!
//! [markdown]
//! escape = "comparators"    # or "all"
//!
//! [routes]
//! allowed = ["/", "/writing", "/courses"]
//! allowed_prefixes = ["/_app/"]
//!
//! [images]
//! extensions = ["png", "jpg", "jpeg", "gif", "webp", "avif"]
//! skip_transform = ["gif", "avif"]
//! probe_width = 64
//! probe_quality = 50
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::markdown::EscapePolicy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the config file looked up in the project root.
pub const CONFIG_FILENAME: &str = "pipeline.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Pipeline configuration loaded from `pipeline.toml`.
///
/// All fields have defaults matching the standard project layout.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Content, asset and output locations, relative to the project root.
    pub paths: PathsSection,
    /// Markdown transform settings.
    pub markdown: MarkdownConfig,
    /// Site routes that are valid without a backing content file.
    pub routes: RoutesConfig,
    /// Image compatibility probe settings.
    pub images: ImagesConfig,
}

impl PipelineConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.paths.manifest_name.is_empty() || self.paths.manifest_name.contains('/') {
            return Err(ConfigError::Validation(
                "paths.manifest_name must be a plain file name".into(),
            ));
        }
        if self.images.probe_width == 0 {
            return Err(ConfigError::Validation(
                "images.probe_width must be non-zero".into(),
            ));
        }
        if self.images.probe_quality == 0 || self.images.probe_quality > 100 {
            return Err(ConfigError::Validation(
                "images.probe_quality must be 1-100".into(),
            ));
        }
        if self.images.extensions.is_empty() {
            return Err(ConfigError::Validation(
                "images.extensions must not be empty".into(),
            ));
        }
        if let Some(bad) = self.routes.allowed.iter().find(|r| !r.starts_with('/')) {
            return Err(ConfigError::Validation(format!(
                "routes.allowed entries must start with '/': {bad}"
            )));
        }
        Ok(())
    }
}

/// Raw path settings, relative to the project root.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsSection {
    /// Writing collection root.
    pub writing: String,
    /// Courses root; each immediate subdirectory is a course.
    pub courses: String,
    /// Static asset root that site-rooted URLs resolve against.
    pub static_dir: String,
    /// Combined index consumed by the site application.
    pub content_index: String,
    /// File name of the per-collection manifest.
    pub manifest_name: String,
}

impl Default for PathsSection {
    fn default() -> Self {
        Self {
            writing: "content/writing".to_string(),
            courses: "courses".to_string(),
            static_dir: "static".to_string(),
            content_index: "src/lib/generated/content-index.json".to_string(),
            manifest_name: "manifest.json".to_string(),
        }
    }
}

/// Markdown transform settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MarkdownConfig {
    /// Which `<` characters in text nodes get escaped.
    pub escape: EscapePolicy,
}

/// Site routes accepted by the link validator without further checks.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RoutesConfig {
    /// Exact routes (after trailing-slash normalization).
    pub allowed: Vec<String>,
    /// Route prefixes owned by the site framework.
    pub allowed_prefixes: Vec<String>,
}

impl Default for RoutesConfig {
    fn default() -> Self {
        Self {
            allowed: vec!["/".into(), "/writing".into(), "/courses".into()],
            allowed_prefixes: vec!["/_app/".into()],
        }
    }
}

/// Image compatibility probe settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImagesConfig {
    /// Raster extensions that are checked; other references are ignored.
    pub extensions: Vec<String>,
    /// Detected formats that are already optimized and skip the transcode probe.
    pub skip_transform: Vec<String>,
    /// Maximum width of the probe transcodes.
    pub probe_width: u32,
    /// Lossy quality of the probe transcodes (1-100).
    pub probe_quality: u32,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            extensions: ["png", "jpg", "jpeg", "gif", "webp", "avif"]
                .map(String::from)
                .to_vec(),
            skip_transform: vec!["gif".into(), "avif".into()],
            probe_width: 64,
            probe_quality: 50,
        }
    }
}

/// Absolute locations every component works against.
///
/// Built once from the project root and the `[paths]` section; tests build
/// one directly over a `TempDir`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathsConfig {
    pub root: PathBuf,
    pub writing: PathBuf,
    pub courses: PathBuf,
    pub static_dir: PathBuf,
    pub content_index: PathBuf,
    pub manifest_name: String,
}

impl PathsConfig {
    /// Resolve the `[paths]` section against a project root.
    pub fn resolve(root: &Path, section: &PathsSection) -> Self {
        Self {
            root: root.to_path_buf(),
            writing: root.join(&section.writing),
            courses: root.join(&section.courses),
            static_dir: root.join(&section.static_dir),
            content_index: root.join(&section.content_index),
            manifest_name: section.manifest_name.clone(),
        }
    }

    /// Default layout under `root`.
    pub fn under(root: &Path) -> Self {
        Self::resolve(root, &PathsSection::default())
    }

    /// Manifest location for the writing collection.
    pub fn writing_manifest(&self) -> PathBuf {
        self.writing.join(&self.manifest_name)
    }

    /// Manifest location for one course directory.
    pub fn course_manifest(&self, course_dir: &Path) -> PathBuf {
        course_dir.join(&self.manifest_name)
    }

    /// Display a path relative to the project root when possible.
    pub fn display(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .to_string_lossy()
            .into_owned()
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(PipelineConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `pipeline.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(root: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = root.join(CONFIG_FILENAME);
    let content = match fs::read_to_string(&config_path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<PipelineConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: PipelineConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `pipeline.toml` in the project root.
pub fn load_config(root: &Path) -> Result<PipelineConfig, ConfigError> {
    let base = stock_defaults_value();
    let overlay = load_raw_config(root)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `pipeline.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Content Pipeline Configuration
# ==============================
# All settings are optional. Values shown below are the defaults.
# Paths are relative to the project root (the directory holding this file).
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Locations
# ---------------------------------------------------------------------------
[paths]
# Writing posts (*.md, searched recursively).
writing = "content/writing"

# Courses root. Every immediate subdirectory is a course; its README.md
# frontmatter describes the course and every other *.md file is a lesson.
courses = "courses"

# Static assets. Site-rooted URLs such as /images/a.png resolve here.
static_dir = "static"

# Combined index consumed by the site application.
content_index = "src/lib/generated/content-index.json"

# File name of each collection manifest.
manifest_name = "manifest.json"

# ---------------------------------------------------------------------------
# Markdown transforms
# ---------------------------------------------------------------------------
[markdown]
# "comparators" escapes `<` only before whitespace or a digit (x < 5).
# "all" escapes every `<` in text nodes.
escape = "comparators"

# ---------------------------------------------------------------------------
# Link validation
# ---------------------------------------------------------------------------
[routes]
# Routes that are always valid.
allowed = ["/", "/writing", "/courses"]

# Route prefixes served by the site framework itself.
allowed_prefixes = ["/_app/"]

# ---------------------------------------------------------------------------
# Image compatibility probe
# ---------------------------------------------------------------------------
[images]
# Referenced files with these extensions are checked.
extensions = ["png", "jpg", "jpeg", "gif", "webp", "avif"]

# Formats already optimized; only their metadata is read.
skip_transform = ["gif", "avif"]

# Width and quality of the WebP/AVIF probe transcodes.
probe_width = 64
probe_quality = 50
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_is_valid() {
        PipelineConfig::default().validate().unwrap();
    }

    #[test]
    fn stock_toml_matches_defaults() {
        let parsed: PipelineConfig = toml::from_str(stock_config_toml()).unwrap();
        let defaults = PipelineConfig::default();
        assert_eq!(parsed.paths.writing, defaults.paths.writing);
        assert_eq!(parsed.paths.content_index, defaults.paths.content_index);
        assert_eq!(parsed.routes.allowed, defaults.routes.allowed);
        assert_eq!(parsed.images.extensions, defaults.images.extensions);
        assert_eq!(parsed.images.skip_transform, defaults.images.skip_transform);
        assert_eq!(parsed.markdown.escape, EscapePolicy::Comparators);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.paths.courses, "courses");
        assert_eq!(config.images.probe_width, 64);
    }

    #[test]
    fn sparse_override_keeps_other_defaults() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join(CONFIG_FILENAME),
            "[paths]\nwriting = \"posts\"\n\n[markdown]\nescape = \"all\"\n",
        )
        .unwrap();

        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.paths.writing, "posts");
        assert_eq!(config.paths.courses, "courses");
        assert_eq!(config.markdown.escape, EscapePolicy::All);
    }

    #[test]
    fn unknown_keys_rejected() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(CONFIG_FILENAME), "[paths]\nwritng = \"x\"\n").unwrap();
        assert!(matches!(load_config(tmp.path()), Err(ConfigError::Toml(_))));
    }

    #[test]
    fn invalid_probe_quality_rejected() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(CONFIG_FILENAME), "[images]\nprobe_quality = 0\n").unwrap();
        assert!(matches!(
            load_config(tmp.path()),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn relative_allowed_route_rejected() {
        let mut config = PipelineConfig::default();
        config.routes.allowed.push("writing".into());
        assert!(config.validate().is_err());
    }

    #[test]
    fn merge_toml_overlays_nested_tables() {
        let base: toml::Value = toml::from_str("[a]\nx = 1\ny = 2\n").unwrap();
        let overlay: toml::Value = toml::from_str("[a]\ny = 3\n").unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged["a"]["x"].as_integer(), Some(1));
        assert_eq!(merged["a"]["y"].as_integer(), Some(3));
    }

    #[test]
    fn paths_resolve_against_root() {
        let root = Path::new("/site");
        let paths = PathsConfig::under(root);
        assert_eq!(paths.writing, Path::new("/site/content/writing"));
        assert_eq!(
            paths.writing_manifest(),
            Path::new("/site/content/writing/manifest.json")
        );
        assert_eq!(paths.static_dir, Path::new("/site/static"));
        assert_eq!(
            paths.display(Path::new("/site/courses/react/a.md")),
            "courses/react/a.md"
        );
    }
}
