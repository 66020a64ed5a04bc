//! Content validation.
//!
//! Two independent passes append to one issue list; nothing stops early.
//! The caller fails the run if and only if the list is non-empty.
//!
//! ## Pass A: frontmatter completeness
//!
//! | Collection | Required |
//! |---|---|
//! | writing | `title`, `description` (non-empty strings), `date`, `modified` (valid dates), `published` (boolean) |
//! | course lessons | same minus `published`; `_index.md` and `layout: contents` pages are exempt |
//!
//! ## Pass B: slugs and links
//!
//! First the universe of valid targets is built: writing slugs, and for each
//! course directory its lesson slugs and whether it has a `README.md`. A slug
//! seen twice in a collection is reported once, against the collection
//! directory. Then every `link`, `image`, and `definition` URL in every
//! writing post and lesson is classified (see [`links`]) and checked:
//!
//! | Target | Rule |
//! |---|---|
//! | allowed route or prefix (`[routes]`) | always valid |
//! | `/writing/<slug>` | slug must exist |
//! | `/courses/<course>` | course must exist and have a `README.md` |
//! | `/courses/<course>/<lesson>` | course must exist and contain the lesson |
//! | other `/…` | file must exist under the static root |
//! | relative | must stay inside the writing or courses root, and exist |

pub mod links;

use crate::config::{PathsConfig, RoutesConfig};
use crate::frontmatter;
use crate::markdown::{self, Node, NodeType};
use crate::naming;
use crate::scan::{self, CourseDir, ScanError};
use links::LinkTarget;
use rayon::prelude::*;
use serde_yaml::{Mapping, Value};
use std::collections::{BTreeMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ValidateError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Scan error: {0}")]
    Scan(#[from] ScanError),
}

/// One finding, attributed to a file (or to a collection directory).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    pub file: PathBuf,
    pub message: String,
}

impl Issue {
    pub fn new(file: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Writing,
    Lesson,
}

/// A content file loaded for validation.
#[derive(Debug, Clone)]
pub struct Document {
    pub path: PathBuf,
    pub collection: Collection,
    pub raw: String,
}

/// Read every writing post and lesson.
pub fn load_documents(
    writing: &[PathBuf],
    courses: &[CourseDir],
) -> io::Result<Vec<Document>> {
    let sources: Vec<(&PathBuf, Collection)> = writing
        .iter()
        .map(|p| (p, Collection::Writing))
        .chain(
            courses
                .iter()
                .flat_map(|c| c.lessons.iter().map(|p| (p, Collection::Lesson))),
        )
        .collect();

    sources
        .par_iter()
        .map(|(path, collection)| {
            Ok(Document {
                path: (*path).clone(),
                collection: *collection,
                raw: std::fs::read_to_string(path)?,
            })
        })
        .collect()
}

// ============================================================================
// Pass A: frontmatter
// ============================================================================

const TEXT_FIELDS: [&str; 2] = ["title", "description"];
const DATE_FIELDS: [&str; 2] = ["date", "modified"];

fn is_missing(value: Option<&Value>) -> bool {
    matches!(value, None | Some(Value::Null))
}

/// Field problems in a parsed frontmatter mapping.
pub fn frontmatter_problems(fields: &Mapping, collection: Collection) -> Vec<String> {
    let mut problems = Vec::new();

    for key in TEXT_FIELDS {
        let value = fields.get(key);
        if is_missing(value) {
            problems.push(format!("missing required frontmatter field `{key}`"));
        } else if !matches!(value, Some(Value::String(s)) if !s.trim().is_empty()) {
            problems.push(format!("frontmatter field `{key}` must be a non-empty string"));
        }
    }

    for key in DATE_FIELDS {
        let value = fields.get(key);
        if is_missing(value) {
            problems.push(format!("missing required frontmatter field `{key}`"));
        } else if value.and_then(frontmatter::date_value).is_none() {
            problems.push(format!("frontmatter field `{key}` is not a valid date"));
        }
    }

    if collection == Collection::Writing {
        let value = fields.get("published");
        if is_missing(value) {
            problems.push("missing required frontmatter field `published`".to_string());
        } else if !matches!(value, Some(Value::Bool(_))) {
            problems.push("frontmatter field `published` must be a boolean".to_string());
        }
    }

    problems
}

fn is_contents_page(fields: &Mapping) -> bool {
    fields.get("layout").and_then(Value::as_str) == Some("contents")
}

/// Pass A for one document.
pub fn check_frontmatter(doc: &Document) -> Vec<Issue> {
    let is_section_index = doc
        .path
        .file_name()
        .is_some_and(|n| n == naming::SECTION_INDEX);
    if doc.collection == Collection::Lesson && is_section_index {
        return Vec::new();
    }

    let fields = match frontmatter::parse_fields(&doc.raw) {
        Ok(Some(fields)) => fields,
        Ok(None) => return vec![Issue::new(&doc.path, "missing frontmatter block")],
        Err(e) => return vec![Issue::new(&doc.path, format!("invalid frontmatter: {e}"))],
    };
    if doc.collection == Collection::Lesson && is_contents_page(&fields) {
        return Vec::new();
    }

    frontmatter_problems(&fields, doc.collection)
        .into_iter()
        .map(|message| Issue::new(&doc.path, message))
        .collect()
}

// ============================================================================
// Pass B: universe
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CourseSlugs {
    pub lessons: HashSet<String>,
    pub has_readme: bool,
}

/// Every valid link target known from the content tree.
#[derive(Debug, Clone, Default)]
pub struct Universe {
    pub writing_slugs: HashSet<String>,
    pub courses: BTreeMap<String, CourseSlugs>,
}

/// Slugs of `files` plus the ones seen more than once, sorted.
fn slugs_with_duplicates(files: &[PathBuf]) -> (HashSet<String>, Vec<String>) {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for slug in files.iter().filter_map(|f| naming::slug_for(f)) {
        *counts.entry(slug).or_default() += 1;
    }
    let duplicates = counts
        .iter()
        .filter(|(_, n)| **n > 1)
        .map(|(slug, _)| slug.clone())
        .collect();
    (counts.into_keys().collect(), duplicates)
}

impl Universe {
    /// Build the universe, reporting duplicate slugs into `issues`.
    pub fn build(
        paths: &PathsConfig,
        writing: &[PathBuf],
        courses: &[CourseDir],
        issues: &mut Vec<Issue>,
    ) -> Self {
        let (writing_slugs, duplicates) = slugs_with_duplicates(writing);
        for slug in duplicates {
            issues.push(Issue::new(
                &paths.writing,
                format!("duplicate writing slug `{slug}`"),
            ));
        }

        let mut course_map = BTreeMap::new();
        for course in courses {
            let (lessons, duplicates) = slugs_with_duplicates(&course.lessons);
            for slug in duplicates {
                issues.push(Issue::new(
                    &course.dir,
                    format!("duplicate lesson slug `{slug}` in course `{}`", course.slug),
                ));
            }
            course_map.insert(
                course.slug.clone(),
                CourseSlugs {
                    lessons,
                    has_readme: course.readme().is_file(),
                },
            );
        }

        Self {
            writing_slugs,
            courses: course_map,
        }
    }
}

// ============================================================================
// Pass B: links
// ============================================================================

/// Checks URLs against a [`Universe`] and the filesystem.
pub struct LinkChecker<'a> {
    pub paths: &'a PathsConfig,
    pub routes: &'a RoutesConfig,
    pub universe: &'a Universe,
}

impl LinkChecker<'_> {
    fn is_allowed_route(&self, route: &str) -> bool {
        self.routes.allowed.iter().any(|r| r == route)
            || self
                .routes
                .allowed_prefixes
                .iter()
                .any(|p| route.starts_with(p.as_str()))
    }

    /// Problem with a site-rooted route, if any.
    pub fn check_route(&self, route: &str) -> Option<String> {
        if self.is_allowed_route(route) {
            return None;
        }
        match links::segments(route).as_slice() {
            ["writing", slug] => (!self.universe.writing_slugs.contains(*slug))
                .then(|| format!("missing writing slug `{slug}`")),
            ["courses", course, rest @ ..] if rest.len() <= 1 => {
                let Some(known) = self.universe.courses.get(*course) else {
                    return Some(format!("unknown course `{course}`"));
                };
                match rest {
                    [lesson] => (!known.lessons.contains(*lesson))
                        .then(|| format!("missing lesson slug `{lesson}` in course `{course}`")),
                    _ => (!known.has_readme)
                        .then(|| format!("course `{course}` has no {}", naming::COURSE_README)),
                }
            }
            _ => {
                let asset = self.paths.static_dir.join(route.trim_start_matches('/'));
                (!asset.exists()).then(|| "missing static asset".to_string())
            }
        }
    }

    /// Problem with a relative link from `source`, if any.
    pub fn check_relative(&self, source: &Path, link: &str) -> Option<String> {
        let resolved = links::resolve_relative(source, link);
        let roots = [self.paths.writing.as_path(), self.paths.courses.as_path()];
        if !links::is_within(&resolved, &roots) {
            return Some("relative link escapes content roots".to_string());
        }
        (!resolved.exists()).then(|| "broken relative link".to_string())
    }

    pub fn check_url(&self, source: &Path, url: &str) -> Option<String> {
        let problem = match links::classify(url) {
            LinkTarget::External => None,
            LinkTarget::SiteRooted(route) => self.check_route(&route),
            LinkTarget::Relative(link) => self.check_relative(source, &link),
        };
        problem.map(|p| format!("{p} (link: {url})"))
    }

    /// Check every link, image, and definition URL in a document.
    pub fn check_document(&self, doc: &Document) -> Vec<Issue> {
        let (_, body) = frontmatter::split(&doc.raw);
        let tree = markdown::parse(body);
        markdown::walk(&tree, None)
            .filter(|n| {
                matches!(
                    n.node_type(),
                    NodeType::Link | NodeType::Image | NodeType::Definition
                )
            })
            .filter_map(Node::url)
            .filter_map(|url| self.check_url(&doc.path, url))
            .map(|message| Issue::new(&doc.path, message))
            .collect()
    }
}

// ============================================================================
// Driver
// ============================================================================

/// Outcome of a validation run.
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    /// Writing posts and lessons examined.
    pub documents: usize,
    pub issues: Vec<Issue>,
}

impl ValidationReport {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Run both passes over the content tree and collect every issue found.
pub fn validate(
    paths: &PathsConfig,
    routes: &RoutesConfig,
) -> Result<ValidationReport, ValidateError> {
    let writing = scan::writing_files(&paths.writing)?;
    let courses = scan::courses(&paths.courses)?;
    let docs = load_documents(&writing, &courses)?;

    let mut issues: Vec<Issue> = docs.par_iter().flat_map_iter(check_frontmatter).collect();

    let universe = Universe::build(paths, &writing, &courses, &mut issues);
    let checker = LinkChecker {
        paths,
        routes,
        universe: &universe,
    };
    issues.par_extend(docs.par_iter().flat_map_iter(|d| checker.check_document(d)));

    Ok(ValidationReport {
        documents: docs.len(),
        issues,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{ContentTree, doc};

    fn run(tree: &ContentTree) -> Vec<Issue> {
        validate(&tree.paths, &RoutesConfig::default()).unwrap().issues
    }

    fn messages(issues: &[Issue]) -> Vec<&str> {
        issues.iter().map(|i| i.message.as_str()).collect()
    }

    #[test]
    fn clean_tree_has_no_issues() {
        let tree = ContentTree::new();
        tree.post("a.md", &doc("A", "2024-01-01", "published: true"));
        tree.lesson("react", "README.md", &doc("React", "2024-01-01", ""));
        tree.lesson("react", "hooks.md", &doc("Hooks", "2024-01-01", ""));
        assert!(run(&tree).is_empty(), "{:?}", run(&tree));
    }

    #[test]
    fn writing_requires_published() {
        let tree = ContentTree::new();
        tree.post("a.md", &doc("A", "2024-01-01", ""));
        let issues = run(&tree);
        assert_eq!(
            messages(&issues),
            vec!["missing required frontmatter field `published`"]
        );
        assert_eq!(issues[0].file, tree.paths.writing.join("a.md"));
    }

    #[test]
    fn lessons_do_not_require_published() {
        let tree = ContentTree::new();
        tree.lesson("react", "hooks.md", &doc("Hooks", "2024-01-01", ""));
        assert!(run(&tree).is_empty());
    }

    #[test]
    fn field_type_problems() {
        let fields: Mapping = serde_yaml::from_str(
            "title: ''\ndescription: [a]\ndate: soon\nmodified: 2024-01-01\npublished: 'yes'\n",
        )
        .unwrap();
        assert_eq!(
            frontmatter_problems(&fields, Collection::Writing),
            vec![
                "frontmatter field `title` must be a non-empty string",
                "frontmatter field `description` must be a non-empty string",
                "frontmatter field `date` is not a valid date",
                "frontmatter field `published` must be a boolean",
            ]
        );
    }

    #[test]
    fn missing_and_invalid_blocks() {
        let tree = ContentTree::new();
        tree.post("bare.md", "# No frontmatter\n");
        tree.post("broken.md", "---\ntitle: [oops\n---\n");
        let issues = run(&tree);
        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].message, "missing frontmatter block");
        assert!(issues[1].message.starts_with("invalid frontmatter"));
    }

    #[test]
    fn section_and_contents_pages_are_exempt() {
        let tree = ContentTree::new();
        tree.lesson("react", "_index.md", "# Sections\n");
        tree.lesson("react", "toc.md", "---\nlayout: contents\n---\n");
        assert!(run(&tree).is_empty());
    }

    #[test]
    fn duplicate_lesson_slug_reported_once_per_course() {
        let tree = ContentTree::new();
        let lesson = doc("A", "2024-01-01", "");
        tree.lesson("react", "a.md", &lesson);
        tree.lesson("react", "part-2/a.md", &lesson);
        tree.lesson("react", "part-3/a.md", &lesson);
        tree.lesson("svelte", "a.md", &lesson);

        let issues = run(&tree);
        assert_eq!(
            messages(&issues),
            vec!["duplicate lesson slug `a` in course `react`"]
        );
        assert_eq!(issues[0].file, tree.paths.courses.join("react"));
    }

    #[test]
    fn duplicate_writing_slug_reported_against_collection() {
        let tree = ContentTree::new();
        let post = doc("A", "2024-01-01", "published: true");
        tree.post("a.md", &post);
        tree.post("2023/a.md", &post);
        let issues = run(&tree);
        assert_eq!(messages(&issues), vec!["duplicate writing slug `a`"]);
        assert_eq!(issues[0].file, tree.paths.writing);
    }

    #[test]
    fn missing_writing_slug() {
        let tree = ContentTree::new();
        tree.post(
            "a.md",
            &doc("A", "2024-01-01", "published: true").replace(
                "Body",
                "See [this](/writing/nonexistent-slug) and [that](/writing/a/).",
            ),
        );
        let issues = run(&tree);
        assert_eq!(
            messages(&issues),
            vec!["missing writing slug `nonexistent-slug` (link: /writing/nonexistent-slug)"]
        );
        assert_eq!(issues[0].file, tree.paths.writing.join("a.md"));
    }

    #[test]
    fn course_routes() {
        let tree = ContentTree::new();
        tree.lesson("react", "README.md", &doc("React", "2024-01-01", ""));
        tree.lesson("react", "hooks.md", &doc("Hooks", "2024-01-01", ""));
        tree.lesson("draft", "intro.md", &doc("Intro", "2024-01-01", ""));
        tree.course_dir("empty");

        let universe = Universe::build(
            &tree.paths,
            &[],
            &scan::courses(&tree.paths.courses).unwrap(),
            &mut Vec::new(),
        );
        let routes = RoutesConfig::default();
        let checker = LinkChecker {
            paths: &tree.paths,
            routes: &routes,
            universe: &universe,
        };

        assert_eq!(checker.check_route("/courses/react"), None);
        assert_eq!(checker.check_route("/courses/react/hooks"), None);
        assert_eq!(
            checker.check_route("/courses/react/nope"),
            Some("missing lesson slug `nope` in course `react`".into())
        );
        assert_eq!(
            checker.check_route("/courses/draft"),
            Some("course `draft` has no README.md".into())
        );
        assert_eq!(
            checker.check_route("/courses/empty/x"),
            Some("missing lesson slug `x` in course `empty`".into())
        );
        assert_eq!(
            checker.check_route("/courses/ghost"),
            Some("unknown course `ghost`".into())
        );
        assert_eq!(checker.check_route("/courses"), None);
        assert_eq!(checker.check_route("/_app/immutable/x.js"), None);
    }

    #[test]
    fn static_assets() {
        let tree = ContentTree::new();
        tree.write("static/images/logo.png", "png");
        let universe = Universe::default();
        let routes = RoutesConfig::default();
        let checker = LinkChecker {
            paths: &tree.paths,
            routes: &routes,
            universe: &universe,
        };
        assert_eq!(checker.check_route("/images/logo.png"), None);
        assert_eq!(
            checker.check_route("/images/missing.png"),
            Some("missing static asset".into())
        );
    }

    #[test]
    fn relative_links() {
        let tree = ContentTree::new();
        let body = "[ok](./b.md#top) [lesson](../../courses/react/hooks.md) \
                    [gone](missing.md) [out](../../../etc/passwd) [ext](https://x.dev)";
        tree.post(
            "a.md",
            &doc("A", "2024-01-01", "published: true").replace("Body", body),
        );
        tree.post("b.md", &doc("B", "2024-01-01", "published: true"));
        tree.lesson("react", "hooks.md", &doc("Hooks", "2024-01-01", ""));

        let issues = run(&tree);
        assert_eq!(
            messages(&issues),
            vec![
                "broken relative link (link: missing.md)",
                "relative link escapes content roots (link: ../../../etc/passwd)",
            ]
        );
    }

    #[test]
    fn images_and_definitions_are_checked() {
        let tree = ContentTree::new();
        let body = "![pic](/img/none.png)\n\nSee [guide][g].\n\n[g]: /writing/guide\n";
        tree.post(
            "a.md",
            &doc("A", "2024-01-01", "published: true").replace("Body", body),
        );
        let issues = run(&tree);
        assert_eq!(
            messages(&issues),
            vec![
                "missing static asset (link: /img/none.png)",
                "missing writing slug `guide` (link: /writing/guide)",
            ]
        );
    }

    #[test]
    fn later_definition_with_repeated_label_is_checked() {
        let tree = ContentTree::new();
        tree.post("exists.md", &doc("Exists", "2024-01-01", "published: true"));
        let body = "See [a][x].\n\n[x]: /writing/exists\n[x]: /writing/broken-target\n";
        tree.post(
            "a.md",
            &doc("A", "2024-01-01", "published: true").replace("Body", body),
        );
        assert_eq!(
            messages(&run(&tree)),
            vec!["missing writing slug `broken-target` (link: /writing/broken-target)"]
        );
    }

    #[test]
    fn link_syntax_in_frontmatter_is_not_checked() {
        let tree = ContentTree::new();
        tree.post(
            "a.md",
            "---\n\ntitle: A\ndescription: see [x](/writing/nope)\ndate: 2024-01-01\n\
             modified: 2024-01-01\npublished: true\n---\n\nBody\n",
        );
        assert!(run(&tree).is_empty(), "{:?}", run(&tree));
    }

    #[test]
    fn all_issues_in_one_file_are_collected() {
        let tree = ContentTree::new();
        tree.post(
            "a.md",
            "---\ntitle: A\n---\n[x](/writing/nope) [y](nope.md)\n",
        );
        let issues = run(&tree);
        assert_eq!(issues.len(), 6);
        assert!(issues.iter().all(|i| i.file == tree.paths.writing.join("a.md")));
    }
}
