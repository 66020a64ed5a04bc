//! Collection manifests.
//!
//! One `manifest.json` per collection: the writing root, and every course
//! directory. Each generator follows the same hash-gated flow:
//!
//! ```text
//! scan files → content_hash → freshness(prior manifest)
//!     UpToDate        → report "already up to date", write nothing
//!     Missing | Stale → extract frontmatter → sort → write JSON
//! ```
//!
//! Entries are fully rebuilt on every write; a manifest is never patched.
//! Frontmatter extraction is lenient here (see [`frontmatter`]); the
//! validator is the strict gate.

use crate::cache;
use crate::config::PathsConfig;
use crate::frontmatter::{self, Frontmatter};
use crate::naming;
use crate::scan::{self, CourseDir, ScanError};
use crate::types::{
    CourseManifest, CourseSummary, ManifestEntry, ManifestMeta, WritingManifest,
    sort_newest_first,
};
use chrono::Utc;
use rayon::prelude::*;
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Scan error: {0}")]
    Scan(#[from] ScanError),
}

/// What a generator did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Written { entries: usize },
    UpToDate,
}

/// Result of one generator run, for status output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub label: String,
    pub path: PathBuf,
    pub status: Status,
}

/// Timestamp for `meta.generatedAt`.
pub fn generated_at() -> String {
    frontmatter::iso(&Utc::now())
}

/// Write `value` as 2-space-indented JSON with a trailing newline.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut json = serde_json::to_string_pretty(value)?;
    json.push('\n');
    fs::write(path, json)
}

fn read_frontmatter(path: &Path) -> io::Result<Frontmatter> {
    Ok(frontmatter::extract(&fs::read_to_string(path)?))
}

/// Manifest entry for one document. `published` is carried for writing only.
pub fn entry_for(
    file: &Path,
    collection_root: &Path,
    with_published: bool,
) -> io::Result<ManifestEntry> {
    let fm = read_frontmatter(file)?;
    let relative = file.strip_prefix(collection_root).unwrap_or(file);
    Ok(ManifestEntry {
        slug: naming::slug_for(file).unwrap_or_default(),
        path: relative.to_string_lossy().replace('\\', "/"),
        title: fm.title,
        description: fm.description,
        date: frontmatter::iso(&fm.date),
        modified: frontmatter::iso(&fm.modified),
        published: with_published.then_some(fm.published),
        tags: fm.tags,
    })
}

/// Entries for `files`, sorted newest first.
pub fn build_entries(
    files: &[PathBuf],
    collection_root: &Path,
    with_published: bool,
) -> io::Result<Vec<ManifestEntry>> {
    let mut entries: Vec<ManifestEntry> = files
        .par_iter()
        .map(|f| entry_for(f, collection_root, with_published))
        .collect::<io::Result<_>>()?;
    sort_newest_first(&mut entries);
    Ok(entries)
}

/// Generate `<writing>/manifest.json`.
pub fn generate_writing_manifest(paths: &PathsConfig) -> Result<Outcome, ManifestError> {
    let files = scan::writing_files(&paths.writing)?;
    let target = paths.writing_manifest();
    let hash = cache::content_hash(&files)?;

    let label = "writing".to_string();
    if !cache::freshness(&target, &hash)?.needs_write() {
        return Ok(Outcome {
            label,
            path: target,
            status: Status::UpToDate,
        });
    }

    let posts = build_entries(&files, &paths.writing, true)?;
    let entries = posts.len();
    let manifest = WritingManifest {
        meta: ManifestMeta {
            generated_at: generated_at(),
            hash,
        },
        posts,
    };
    write_json(&target, &manifest)?;
    Ok(Outcome {
        label,
        path: target,
        status: Status::Written { entries },
    })
}

/// Course block from the course's `README.md`; the title falls back to the
/// directory name when the README is missing or untitled.
pub fn course_summary(course: &CourseDir) -> io::Result<CourseSummary> {
    let fm = match read_frontmatter(&course.readme()) {
        Ok(fm) => fm,
        Err(e) if e.kind() == io::ErrorKind::NotFound => Frontmatter::default(),
        Err(e) => return Err(e),
    };
    Ok(CourseSummary {
        title: if fm.title.is_empty() {
            course.slug.clone()
        } else {
            fm.title
        },
        description: fm.description,
        date: frontmatter::iso(&fm.date),
        modified: frontmatter::iso(&fm.modified),
        slug: course.slug.clone(),
    })
}

/// Lesson files listed in a course manifest: section files are left out.
pub fn manifest_lessons(course: &CourseDir) -> Vec<PathBuf> {
    course
        .lessons
        .iter()
        .filter(|p| !naming::is_section_file(p))
        .cloned()
        .collect()
}

/// Generate `<course>/manifest.json` for one course.
pub fn generate_course_manifest(
    paths: &PathsConfig,
    course: &CourseDir,
) -> Result<Outcome, ManifestError> {
    let target = paths.course_manifest(&course.dir);
    let lessons = manifest_lessons(course);

    let mut inputs = lessons.clone();
    let readme = course.readme();
    if readme.is_file() {
        inputs.push(readme);
    }
    let hash = cache::content_hash(&inputs)?;

    let label = format!("course {}", course.slug);
    if !cache::freshness(&target, &hash)?.needs_write() {
        return Ok(Outcome {
            label,
            path: target,
            status: Status::UpToDate,
        });
    }

    let posts = build_entries(&lessons, &course.dir, false)?;
    let entries = posts.len();
    let manifest = CourseManifest {
        meta: ManifestMeta {
            generated_at: generated_at(),
            hash,
        },
        course: course_summary(course)?,
        posts,
    };
    write_json(&target, &manifest)?;
    Ok(Outcome {
        label,
        path: target,
        status: Status::Written { entries },
    })
}

/// Generate a manifest for every course directory.
pub fn generate_course_manifests(paths: &PathsConfig) -> Result<Vec<Outcome>, ManifestError> {
    scan::courses(&paths.courses)?
        .iter()
        .map(|course| generate_course_manifest(paths, course))
        .collect()
}
