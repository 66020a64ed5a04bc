//! Filename conventions shared by scanning, manifests, and validation.
//!
//! A document's slug is its file stem; the slug is what routes use
//! (`/writing/<slug>`, `/courses/<course>/<slug>`), so it must be unique per
//! collection:
//!
//! - `content/writing/typed-hooks.md` → `typed-hooks`
//! - `courses/react/01-intro.md` → `01-intro`
//!
//! Inside a course directory two names are special:
//!
//! - `README.md` describes the course itself and is not a lesson.
//! - Files starting with `_` (e.g. `_index.md`) are section pages and are
//!   kept out of lesson listings.

use std::path::Path;

/// Course overview file inside each course directory.
pub const COURSE_README: &str = "README.md";

/// Section index file name inside course directories.
pub const SECTION_INDEX: &str = "_index.md";

/// Slug for a content file: the file stem.
pub fn slug_for(path: &Path) -> Option<String> {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
}

/// Whether `path` names a markdown file (by extension, case-insensitive).
pub fn is_markdown(path: &Path) -> bool {
    path.extension()
        .is_some_and(|e| e.eq_ignore_ascii_case("md"))
}

/// Whether `path` is a course's `README.md`.
pub fn is_course_readme(path: &Path) -> bool {
    path.file_name().is_some_and(|n| n == COURSE_README)
}

/// Whether `path` is an underscore-prefixed section file.
pub fn is_section_file(path: &Path) -> bool {
    path.file_name()
        .is_some_and(|n| n.to_string_lossy().starts_with('_'))
}

/// Whether a directory entry name should be skipped while scanning.
pub fn is_hidden(name: &str) -> bool {
    name.starts_with('.') || name == "node_modules"
}
