//! Image compatibility check.
//!
//! Finds every image referenced from writing posts and lessons, both
//! markdown images (`![alt](src)`) and raw `<img src="...">` tags, and makes
//! sure the image pipeline can handle each one:
//!
//! 1. Skip external URLs, drop `?query`/`#fragment`, keep only configured
//!    raster extensions.
//! 2. Resolve: `/…` against the static root, anything else against the
//!    referencing file's directory.
//! 3. De-duplicate by resolved path; the first referencing file is the one
//!    issues are reported against.
//! 4. For each image: it must exist (otherwise nothing else is tried), its
//!    metadata must be readable, and unless its format is pre-optimized it
//!    must transcode to WebP and AVIF.
//!
//! Probes run in parallel; every failure becomes an [`Issue`].

use crate::config::{ImagesConfig, PathsConfig};
use crate::frontmatter;
use crate::imaging::{ImageBackend, ProbeConfig, ProbeFailure, Quality, probe_image};
use crate::markdown::{self, Node, NodeType};
use crate::scan;
use crate::validate::links::{self, is_external, strip_query_and_fragment};
use crate::validate::{Issue, ValidateError, load_documents};
use rayon::prelude::*;
use regex::Regex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static IMG_SRC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<img\b[^>]*?\bsrc\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#).unwrap()
});

/// A unique image and the first document that referenced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSource {
    pub markdown_file: PathBuf,
    /// URL as written in the document.
    pub url: String,
    pub resolved: PathBuf,
}

#[derive(Debug, Clone, Default)]
pub struct ImageReport {
    /// Unique images examined.
    pub checked: usize,
    pub issues: Vec<Issue>,
}

/// `src` values of `<img>` tags in an HTML fragment.
pub fn html_img_sources(html: &str) -> Vec<String> {
    IMG_SRC
        .captures_iter(html)
        .filter_map(|caps| caps.get(1).or(caps.get(2)).or(caps.get(3)))
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Image URLs in a markdown tree, in document order.
pub fn image_urls(tree: &Node) -> Vec<String> {
    markdown::walk(tree, None)
        .flat_map(|node| match node.node_type() {
            NodeType::Image => node.url().map(String::from).into_iter().collect::<Vec<_>>(),
            NodeType::Html => node.value().map(html_img_sources).unwrap_or_default(),
            _ => Vec::new(),
        })
        .collect()
}

fn has_image_extension(path: &str, extensions: &[String]) -> bool {
    Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| extensions.iter().any(|x| x.eq_ignore_ascii_case(ext)))
}

/// Resolve an image URL to a file path, or `None` if it is not checked.
pub fn resolve_image(
    url: &str,
    source_file: &Path,
    paths: &PathsConfig,
    extensions: &[String],
) -> Option<PathBuf> {
    let url = url.trim();
    if url.is_empty() || is_external(url) {
        return None;
    }
    let path = strip_query_and_fragment(url);
    if !has_image_extension(path, extensions) {
        return None;
    }
    Some(match path.strip_prefix('/') {
        Some(site_path) => links::normalize_path(&paths.static_dir.join(site_path)),
        None => links::resolve_relative(source_file, path),
    })
}

/// Every unique image referenced from writing posts and lessons.
pub fn discover(
    paths: &PathsConfig,
    config: &ImagesConfig,
) -> Result<Vec<ImageSource>, ValidateError> {
    let writing = scan::writing_files(&paths.writing)?;
    let courses = scan::courses(&paths.courses)?;
    let docs = load_documents(&writing, &courses)?;

    let mut unique: BTreeMap<PathBuf, ImageSource> = BTreeMap::new();
    for doc in &docs {
        let (_, body) = frontmatter::split(&doc.raw);
        let tree = markdown::parse(body);
        for url in image_urls(&tree) {
            let Some(resolved) = resolve_image(&url, &doc.path, paths, &config.extensions) else {
                continue;
            };
            unique.entry(resolved.clone()).or_insert_with(|| ImageSource {
                markdown_file: doc.path.clone(),
                url,
                resolved,
            });
        }
    }
    Ok(unique.into_values().collect())
}

fn probe_config(config: &ImagesConfig) -> ProbeConfig {
    ProbeConfig {
        width: config.probe_width,
        quality: Quality::new(config.probe_quality),
        skip_transform: config.skip_transform.clone(),
    }
}

/// Issues for one image.
pub fn check_source<B: ImageBackend>(
    backend: &B,
    source: &ImageSource,
    probe: &ProbeConfig,
) -> Vec<Issue> {
    if !source.resolved.is_file() {
        return vec![Issue::new(
            &source.markdown_file,
            format!(
                "missing image {} (resolved to {})",
                source.url,
                source.resolved.display()
            ),
        )];
    }
    probe_image(backend, &source.resolved, probe)
        .into_iter()
        .map(|failure| {
            let message = match failure {
                ProbeFailure::Metadata(e) => {
                    format!("cannot read image metadata for {}: {e}", source.url)
                }
                ProbeFailure::Transcode { format, error } => {
                    format!("{format} transform probe failed for {}: {error}", source.url)
                }
            };
            Issue::new(&source.markdown_file, message)
        })
        .collect()
}

/// Discover and probe every referenced image.
pub fn check_images<B: ImageBackend>(
    backend: &B,
    paths: &PathsConfig,
    config: &ImagesConfig,
) -> Result<ImageReport, ValidateError> {
    let sources = discover(paths, config)?;
    let probe = probe_config(config);
    let issues = sources
        .par_iter()
        .flat_map_iter(|source| check_source(backend, source, &probe))
        .collect();
    Ok(ImageReport {
        checked: sources.len(),
        issues,
    })
}
