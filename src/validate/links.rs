//! Link classification and path resolution.
//!
//! Every URL found in content lands in exactly one [`LinkTarget`] class:
//!
//! | URL | Class |
//! |---|---|
//! | `https://x.dev`, `mailto:a@b.c`, `#intro`, `//cdn.x/a.js` | [`LinkTarget::External`] |
//! | `/writing/hooks`, `/images/a.png?v=2` | [`LinkTarget::SiteRooted`] |
//! | `../other.md#part`, `img/a.png` | [`LinkTarget::Relative`] |
//!
//! Query strings and fragments are dropped from site-rooted and relative
//! URLs before they are checked.

use regex::Regex;
use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;

static SCHEME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*:").unwrap());

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkTarget {
    External,
    /// Route with trailing slash normalized away (except `/` itself).
    SiteRooted(String),
    Relative(String),
}

/// `url` without its `?query` or `#fragment`.
pub fn strip_query_and_fragment(url: &str) -> &str {
    match url.find(['?', '#']) {
        Some(i) => &url[..i],
        None => url,
    }
}

pub fn is_external(url: &str) -> bool {
    url.starts_with('#') || url.starts_with("//") || SCHEME.is_match(url)
}

/// Classify a URL as it appears in markdown.
pub fn classify(url: &str) -> LinkTarget {
    let url = url.trim();
    if is_external(url) {
        return LinkTarget::External;
    }
    let path = strip_query_and_fragment(url);
    if path.starts_with('/') {
        LinkTarget::SiteRooted(normalize_route(path).to_string())
    } else {
        LinkTarget::Relative(path.to_string())
    }
}

/// Trim trailing slashes from a route, keeping the bare root.
pub fn normalize_route(route: &str) -> &str {
    let trimmed = route.trim_end_matches('/');
    if trimmed.is_empty() { "/" } else { trimmed }
}

/// Non-empty route segments: `/courses/react/hooks` → `["courses", "react", "hooks"]`.
pub fn segments(route: &str) -> Vec<&str> {
    route.split('/').filter(|s| !s.is_empty()).collect()
}

/// Resolve `.` and `..` without touching the filesystem.
///
/// Leading `..` components that cannot be popped are kept, so a path that
/// climbs past its start still compares as outside of it.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out: Vec<Component<'_>> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.last().copied() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(component),
            },
            other => out.push(other),
        }
    }
    out.iter().map(|c| c.as_os_str()).collect()
}

/// Resolve a relative link against the directory of the file containing it.
pub fn resolve_relative(source_file: &Path, link: &str) -> PathBuf {
    let base = source_file.parent().unwrap_or(Path::new(""));
    normalize_path(&base.join(link))
}

/// Whether `path` lies under any of `roots` (all compared lexically).
pub fn is_within(path: &Path, roots: &[&Path]) -> bool {
    let path = normalize_path(path);
    roots
        .iter()
        .any(|root| path.starts_with(normalize_path(root)))
}
