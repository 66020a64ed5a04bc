//! # Content Pipeline
//!
//! Build-time tooling for a markdown-driven site with two collections:
//! standalone **writing** posts and multi-lesson **courses**. It runs before
//! the site's own bundler and produces the JSON the site reads at build time,
//! then checks that the content is internally consistent.
//!
//! # Architecture: Manifests Feeding an Index
//!
//! ```text
//! 1. writing-manifest   content/writing/*.md   →  content/writing/manifest.json
//! 2. course-manifests   courses/<c>/**/*.md    →  courses/<c>/manifest.json
//! 3. content-index      all manifests          →  src/lib/generated/content-index.json
//!
//!    validate           frontmatter + every internal link       → issue list
//!    check-images       every referenced raster image           → issue list
//! ```
//!
//! Each generator fingerprints its inputs (path, size, mtime) and rewrites
//! its artifact only when the fingerprint changed, so repeated builds are
//! no-ops. The two checkers never stop at the first finding: every issue in
//! every file is collected, printed, and the run fails if there was any.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`markdown`] | mdast-shaped tree from `pulldown-cmark`, pre-order walker, `<` escaping |
//! | [`frontmatter`] | `---` YAML block parsing and normalization with defaults |
//! | [`cache`] | content fingerprint over file metadata, artifact freshness |
//! | [`scan`] | collection discovery: writing files, course directories and lessons |
//! | [`naming`] | filename conventions: slugs, `README.md`, `_` section files |
//! | [`types`] | manifest and index JSON shapes, newest-first ordering |
//! | [`manifest`] | writing and per-course manifest generation |
//! | [`index`] | site-wide content index from the manifests |
//! | [`validate`] | frontmatter and link validation |
//! | [`images`] | referenced-image discovery and compatibility probing |
//! | [`imaging`] | image backend: metadata, in-memory WebP/AVIF transcodes |
//! | [`config`] | `pipeline.toml` loading, validation, merging |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Explicit Paths
//!
//! Every component receives a resolved [`config::PathsConfig`]. Nothing reads
//! the working directory or locates files relative to the binary, so tests
//! point the whole pipeline at a `TempDir`.
//!
//! ## Metadata Fingerprints
//!
//! The fingerprint hashes `path:size:mtime` per file rather than file bodies.
//! It is cheap enough to run on every build, and any edit that touches a file
//! changes it.
//!
//! ## Pure-Rust Imaging
//!
//! Image probes use the `image` crate and `avif-parse`, so checking images
//! needs no system libraries. The probe output is discarded; only "could the
//! site's image pipeline convert this?" matters.

pub mod cache;
pub mod config;
pub mod frontmatter;
pub mod images;
pub mod imaging;
pub mod index;
pub mod manifest;
pub mod markdown;
pub mod naming;
pub mod output;
pub mod scan;
pub mod types;
pub mod validate;

#[cfg(test)]
pub(crate) mod test_helpers;
