//! Content discovery.
//!
//! Walks the writing root and the courses root to find the markdown files
//! every later stage works from. Discovery is purely structural; nothing
//! here reads file contents.
//!
//! ## Directory Structure
//!
//! ```text
//! content/writing/                 # writing root
//! ├── typed-hooks.md               # post (slug = typed-hooks)
//! ├── 2023/
//! │   └── retro.md                 # nested posts are allowed
//! └── manifest.json                # generated
//! courses/                         # courses root
//! ├── react/                       # course (slug = react)
//! │   ├── README.md                # course overview
//! │   ├── _index.md                # section page
//! │   ├── hooks.md                 # lesson
//! │   └── manifest.json            # generated
//! └── langchain/
//!     └── README.md                # course with no lessons yet
//! ```
//!
//! All returned lists are sorted so every consumer (hashing, manifests,
//! issue reports) sees a stable order.

use crate::naming;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to walk {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

/// A course directory and its lesson files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseDir {
    /// Directory name, used as the course slug.
    pub slug: String,
    pub dir: PathBuf,
    /// Every markdown file under `dir` except `README.md`, sorted.
    pub lessons: Vec<PathBuf>,
}

impl CourseDir {
    pub fn readme(&self) -> PathBuf {
        self.dir.join(naming::COURSE_README)
    }
}

/// All markdown files under `root`, recursively, sorted.
///
/// A missing root yields an empty list.
pub fn markdown_files(root: &Path) -> Result<Vec<PathBuf>, ScanError> {
    if !root.is_dir() {
        return Ok(Vec::new());
    }
    let mut files = Vec::new();
    let walker = WalkDir::new(root)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !naming::is_hidden(&e.file_name().to_string_lossy()));
    for entry in walker {
        let entry = entry.map_err(|source| ScanError::Walk {
            path: root.to_path_buf(),
            source,
        })?;
        if entry.file_type().is_file() && naming::is_markdown(entry.path()) {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

/// Writing posts under the writing root.
pub fn writing_files(writing_root: &Path) -> Result<Vec<PathBuf>, ScanError> {
    markdown_files(writing_root)
}

/// Immediate subdirectories of the courses root, sorted by name.
pub fn course_dirs(courses_root: &Path) -> Result<Vec<PathBuf>, ScanError> {
    if !courses_root.is_dir() {
        return Ok(Vec::new());
    }
    let mut dirs: Vec<PathBuf> = fs::read_dir(courses_root)?
        .filter_map(|e| e.ok())
        .filter(|e| !naming::is_hidden(&e.file_name().to_string_lossy()))
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .collect();
    dirs.sort();
    Ok(dirs)
}

/// Every course with its lesson files.
pub fn courses(courses_root: &Path) -> Result<Vec<CourseDir>, ScanError> {
    course_dirs(courses_root)?
        .into_iter()
        .map(|dir| {
            let slug = dir
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let lessons = markdown_files(&dir)?
                .into_iter()
                .filter(|p| !(p.parent() == Some(dir.as_path()) && naming::is_course_readme(p)))
                .collect();
            Ok(CourseDir { slug, dir, lessons })
        })
        .collect()
}
