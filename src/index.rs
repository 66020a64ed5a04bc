//! Site content index.
//!
//! Composes the writing manifest and every course manifest into the single
//! `content-index.json` the site application loads:
//!
//! ```json
//! {
//!   "meta": { "generatedAt": "...", "hash": "..." },
//!   "posts": [ { "slug": "...", "title": "...", ... } ],
//!   "courses": [ { "title": "...", "description": "...", "date": "...", "modified": "...", "slug": "..." } ]
//! }
//! ```
//!
//! The index hash is computed over the signatures of the manifest files, not
//! the markdown underneath them, so the index only changes after a manifest
//! does. Course manifests must exist before the index can be built; running
//! this step first is an ordering mistake and fails with
//! [`IndexError::NoCourseManifests`].

use crate::cache;
use crate::config::PathsConfig;
use crate::manifest::{self, Outcome, Status};
use crate::scan::{self, ScanError};
use crate::types::{
    ContentIndex, CourseManifest, CourseSummary, IndexPost, ManifestMeta, WritingManifest,
    sort_newest_first,
};
use serde::de::DeserializeOwned;
use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Invalid manifest {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Scan error: {0}")]
    Scan(#[from] ScanError),
    #[error(
        "no course manifests found under {0}; run `content-pipeline course-manifests` first"
    )]
    NoCourseManifests(PathBuf),
    #[error("writing manifest not found at {0}; run `content-pipeline writing-manifest` first")]
    MissingWritingManifest(PathBuf),
}

/// Manifest files present in course directories, sorted.
pub fn course_manifest_files(paths: &PathsConfig) -> Result<Vec<PathBuf>, IndexError> {
    Ok(scan::course_dirs(&paths.courses)?
        .iter()
        .map(|dir| paths.course_manifest(dir))
        .filter(|p| p.is_file())
        .collect())
}

fn read_manifest<T: DeserializeOwned>(path: &Path) -> Result<T, IndexError> {
    let bytes = std::fs::read(path)?;
    serde_json::from_slice(&bytes).map_err(|source| IndexError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Keep the first item for each key.
fn dedupe_by<T>(items: &mut Vec<T>, key: impl Fn(&T) -> String) {
    let mut seen = HashSet::new();
    items.retain(|item| seen.insert(key(item)));
}

/// Combine already-loaded manifests into an index body.
pub fn compose(
    writing: WritingManifest,
    courses: Vec<CourseManifest>,
    meta: ManifestMeta,
) -> ContentIndex {
    let mut posts: Vec<IndexPost> = writing.posts.into_iter().map(IndexPost::from).collect();
    sort_newest_first(&mut posts);
    dedupe_by(&mut posts, |p| p.slug.clone());

    let mut courses: Vec<CourseSummary> = courses.into_iter().map(|m| m.course).collect();
    sort_newest_first(&mut courses);
    dedupe_by(&mut courses, |c| c.slug.clone());

    ContentIndex {
        meta,
        posts,
        courses,
    }
}

/// Generate the content index from the manifests on disk.
pub fn generate_content_index(paths: &PathsConfig) -> Result<Outcome, IndexError> {
    let course_files = course_manifest_files(paths)?;
    if course_files.is_empty() {
        return Err(IndexError::NoCourseManifests(paths.courses.clone()));
    }
    let writing_file = paths.writing_manifest();
    if !writing_file.is_file() {
        return Err(IndexError::MissingWritingManifest(writing_file));
    }

    let mut inputs = course_files.clone();
    inputs.push(writing_file.clone());
    let hash = cache::content_hash(&inputs)?;

    let target = paths.content_index.clone();
    let label = "content index".to_string();
    if !cache::freshness(&target, &hash)?.needs_write() {
        return Ok(Outcome {
            label,
            path: target,
            status: Status::UpToDate,
        });
    }

    let writing: WritingManifest = read_manifest(&writing_file)?;
    let courses = course_files
        .iter()
        .map(|p| read_manifest::<CourseManifest>(p))
        .collect::<Result<Vec<_>, _>>()?;

    let index = compose(
        writing,
        courses,
        ManifestMeta {
            generated_at: manifest::generated_at(),
            hash,
        },
    );
    let entries = index.posts.len() + index.courses.len();
    manifest::write_json(&target, &index)?;
    Ok(Outcome {
        label,
        path: target,
        status: Status::Written { entries },
    })
}
