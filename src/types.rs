//! JSON shapes written by the generators and read by the site application.
//!
//! ```text
//! content/writing/manifest.json   WritingManifest  {meta, posts}
//! courses/<course>/manifest.json  CourseManifest   {meta, course, posts}
//! content-index.json              ContentIndex     {meta, posts, courses}
//! ```
//!
//! Keys are camelCase. Dates are ISO-8601 strings with millisecond precision
//! (see [`frontmatter::iso`](crate::frontmatter::iso)).

use crate::frontmatter::parse_date;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Provenance stamped on every generated artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestMeta {
    pub generated_at: String,
    /// Content hash of the inputs the artifact was built from.
    pub hash: String,
}

/// One document in a collection manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestEntry {
    pub slug: String,
    /// Source file relative to the collection root.
    pub path: String,
    pub title: String,
    pub description: String,
    pub date: String,
    pub modified: String,
    /// Writing posts only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published: Option<bool>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WritingManifest {
    pub meta: ManifestMeta,
    pub posts: Vec<ManifestEntry>,
}

/// Course overview taken from the course's `README.md`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseSummary {
    pub title: String,
    pub description: String,
    pub date: String,
    pub modified: String,
    pub slug: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseManifest {
    pub meta: ManifestMeta,
    pub course: CourseSummary,
    pub posts: Vec<ManifestEntry>,
}

/// A writing entry as exposed in the content index (no source path).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexPost {
    pub slug: String,
    pub title: String,
    pub description: String,
    pub date: String,
    pub modified: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published: Option<bool>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl From<ManifestEntry> for IndexPost {
    fn from(entry: ManifestEntry) -> Self {
        Self {
            slug: entry.slug,
            title: entry.title,
            description: entry.description,
            date: entry.date,
            modified: entry.modified,
            published: entry.published,
            tags: entry.tags,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentIndex {
    pub meta: ManifestMeta,
    pub posts: Vec<IndexPost>,
    pub courses: Vec<CourseSummary>,
}

/// Anything listed newest-first.
pub trait Dated {
    fn date(&self) -> &str;
    fn slug(&self) -> &str;
}

macro_rules! impl_dated {
    ($($ty:ty),*) => {
        $(impl Dated for $ty {
            fn date(&self) -> &str {
                &self.date
            }
            fn slug(&self) -> &str {
                &self.slug
            }
        })*
    };
}

impl_dated!(ManifestEntry, IndexPost, CourseSummary);

/// Descending date, then ascending slug. Unparseable dates sort last.
pub fn newest_first<T: Dated>(a: &T, b: &T) -> Ordering {
    let (da, db) = (parse_date(a.date()), parse_date(b.date()));
    db.cmp(&da).then_with(|| a.slug().cmp(b.slug()))
}

pub fn sort_newest_first<T: Dated>(items: &mut [T]) {
    items.sort_by(newest_first);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(slug: &str, date: &str) -> ManifestEntry {
        ManifestEntry {
            slug: slug.into(),
            path: format!("{slug}.md"),
            title: slug.into(),
            description: String::new(),
            date: date.into(),
            modified: date.into(),
            published: Some(true),
            tags: vec![],
        }
    }

    #[test]
    fn sorts_newest_first_with_slug_tiebreak() {
        let mut items = vec![
            entry("old", "2022-05-01T00:00:00.000Z"),
            entry("b", "2024-01-01T00:00:00.000Z"),
            entry("a", "2024-01-01T00:00:00.000Z"),
            entry("bad", "whenever"),
        ];
        sort_newest_first(&mut items);
        let slugs: Vec<&str> = items.iter().map(|e| e.slug.as_str()).collect();
        assert_eq!(slugs, vec!["a", "b", "old", "bad"]);
    }

    #[test]
    fn meta_uses_camel_case() {
        let meta = ManifestMeta {
            generated_at: "2024-01-01T00:00:00.000Z".into(),
            hash: "abc".into(),
        };
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["generatedAt"], "2024-01-01T00:00:00.000Z");
        assert_eq!(json["hash"], "abc");
    }

    #[test]
    fn lesson_entries_omit_published() {
        let mut lesson = entry("intro", "2024-01-01T00:00:00.000Z");
        lesson.published = None;
        let json = serde_json::to_value(&lesson).unwrap();
        assert!(json.get("published").is_none());
        assert_eq!(json["path"], "intro.md");
    }

    #[test]
    fn index_post_drops_path() {
        let post: IndexPost = entry("intro", "2024-01-01T00:00:00.000Z").into();
        let json = serde_json::to_value(&post).unwrap();
        assert!(json.get("path").is_none());
        assert_eq!(json["slug"], "intro");
        assert_eq!(json["published"], true);
    }
}
