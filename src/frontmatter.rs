//! Frontmatter extraction and normalization.
//!
//! Content documents open with a YAML block fenced by `---` lines:
//!
//! ```text
//! ---
//! title: Typed hooks
//! description: Generic helpers for React hooks
//! date: 2024-01-01
//! modified: 2024-02-10
//! published: true
//! tags: [react, typescript]
//! ---
//! ```
//!
//! ## Normalization rules
//!
//! Manifest generation is lenient; missing or unusable fields fall back
//! instead of failing (the validator is what enforces completeness):
//!
//! | Field | Fallback |
//! |---|---|
//! | `title`, `description` | empty string |
//! | `date` | Unix epoch |
//! | `modified` | the resolved `date` |
//! | `published` | `false` |
//! | `tags` | empty list |
//!
//! An unparseable date string counts as missing. Dates without a zone are
//! read as UTC and always written as `YYYY-MM-DDTHH:MM:SS.mmmZ`.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde_yaml::{Mapping, Value};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FrontmatterError {
    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("frontmatter is not a key/value mapping")]
    NotAMapping,
}

/// Normalized document metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Frontmatter {
    pub title: String,
    pub description: String,
    pub date: DateTime<Utc>,
    pub modified: DateTime<Utc>,
    pub published: bool,
    pub tags: Vec<String>,
    /// Page layout hint (`contents` marks a table-of-contents page).
    pub layout: Option<String>,
}

impl Default for Frontmatter {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            date: DateTime::<Utc>::UNIX_EPOCH,
            modified: DateTime::<Utc>::UNIX_EPOCH,
            published: false,
            tags: Vec::new(),
            layout: None,
        }
    }
}

/// Split a document into its YAML block (if any) and body.
///
/// A leading UTF-8 byte order mark is ignored.
pub fn split(raw: &str) -> (Option<&str>, &str) {
    let text = raw.strip_prefix('\u{feff}').unwrap_or(raw);
    let Some(rest) = text
        .strip_prefix("---\n")
        .or_else(|| text.strip_prefix("---\r\n"))
    else {
        return (None, raw);
    };

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        let trimmed = line.trim_end_matches(['\r', '\n']);
        if trimmed == "---" || trimmed == "..." {
            let yaml = &rest[..offset];
            let body = &rest[offset + line.len()..];
            return (Some(yaml), body);
        }
        offset += line.len();
    }
    // Unterminated block: treat the whole file as body.
    (None, raw)
}

/// Parse the YAML block into a mapping.
///
/// `Ok(None)` means the document has no frontmatter block at all.
pub fn parse_fields(raw: &str) -> Result<Option<Mapping>, FrontmatterError> {
    let Some(yaml) = split(raw).0 else {
        return Ok(None);
    };
    if yaml.trim().is_empty() {
        return Ok(Some(Mapping::new()));
    }
    match serde_yaml::from_str::<Value>(yaml)? {
        Value::Mapping(map) => Ok(Some(map)),
        Value::Null => Ok(Some(Mapping::new())),
        _ => Err(FrontmatterError::NotAMapping),
    }
}

/// Extract normalized frontmatter, never failing.
pub fn extract(raw: &str) -> Frontmatter {
    match parse_fields(raw) {
        Ok(Some(fields)) => normalize(&fields),
        Ok(None) | Err(_) => Frontmatter::default(),
    }
}

/// Apply the fallback rules to a parsed mapping.
pub fn normalize(fields: &Mapping) -> Frontmatter {
    let date = fields
        .get("date")
        .and_then(date_value)
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
    let modified = fields.get("modified").and_then(date_value).unwrap_or(date);

    Frontmatter {
        title: fields.get("title").and_then(scalar_string).unwrap_or_default(),
        description: fields
            .get("description")
            .and_then(scalar_string)
            .unwrap_or_default(),
        date,
        modified,
        published: fields
            .get("published")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        tags: fields.get("tags").map(tags_value).unwrap_or_default(),
        layout: fields.get("layout").and_then(scalar_string),
    }
}

/// Scalar YAML value rendered as a string (`title: 2024` is still a title).
fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn tags_value(value: &Value) -> Vec<String> {
    match value {
        Value::Sequence(items) => items.iter().filter_map(scalar_string).collect(),
        Value::String(s) => s
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(String::from)
            .collect(),
        _ => Vec::new(),
    }
}

/// Date from a YAML value; only strings are accepted.
pub fn date_value(value: &Value) -> Option<DateTime<Utc>> {
    value.as_str().and_then(parse_date)
}

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parse a frontmatter date string.
///
/// Accepts RFC 3339, `YYYY-MM-DD`, and `YYYY-MM-DD[T ]HH:MM[:SS[.fff]]`.
pub fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// ISO-8601 with millisecond precision and a `Z` suffix.
pub fn iso(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_separates_yaml_and_body() {
        let (yaml, body) = split("---\ntitle: A\n---\n# Body\n");
        assert_eq!(yaml, Some("title: A\n"));
        assert_eq!(body, "# Body\n");
    }

    #[test]
    fn split_without_block_returns_body() {
        let raw = "# Just a heading\n";
        assert_eq!(split(raw), (None, raw));
    }

    #[test]
    fn split_unterminated_block_is_body() {
        let raw = "---\ntitle: A\nno end";
        assert_eq!(split(raw), (None, raw));
    }

    #[test]
    fn split_handles_crlf() {
        let (yaml, body) = split("---\r\ntitle: A\r\n---\r\nbody");
        assert_eq!(yaml, Some("title: A\r\n"));
        assert_eq!(body, "body");
    }

    #[test]
    fn split_skips_byte_order_mark() {
        let (yaml, body) = split("\u{feff}---\ntitle: B\n---\nbody");
        assert_eq!(yaml, Some("title: B\n"));
        assert_eq!(body, "body");
        assert_eq!(extract("\u{feff}---\ntitle: B\n---\nbody").title, "B");
    }

    #[test]
    fn modified_defaults_to_date() {
        let fm = extract("---\ntitle: Foo\ndate: 2024-01-01\n---\n");
        assert_eq!(iso(&fm.date), "2024-01-01T00:00:00.000Z");
        assert_eq!(iso(&fm.modified), "2024-01-01T00:00:00.000Z");
    }

    #[test]
    fn missing_date_defaults_to_epoch() {
        let fm = extract("---\ntitle: Foo\n---\n");
        assert_eq!(iso(&fm.date), "1970-01-01T00:00:00.000Z");
        assert_eq!(fm.modified, fm.date);
    }

    #[test]
    fn invalid_date_falls_back() {
        let fm = extract("---\ndate: 2024-01-01\nmodified: next tuesday\n---\n");
        assert_eq!(fm.modified, fm.date);

        let fm = extract("---\ndate: not-a-date\n---\n");
        assert_eq!(fm.date, DateTime::<Utc>::UNIX_EPOCH);
    }

    #[test]
    fn full_frontmatter_is_normalized() {
        let fm = extract(
            "---\ntitle: '  Hooks '\ndescription: Typed hooks\ndate: 2024-03-05T10:30:00Z\n\
             modified: 2024-04-01 08:00\npublished: true\ntags: [react, ts]\n---\nbody",
        );
        assert_eq!(fm.title, "Hooks");
        assert_eq!(fm.description, "Typed hooks");
        assert_eq!(iso(&fm.date), "2024-03-05T10:30:00.000Z");
        assert_eq!(iso(&fm.modified), "2024-04-01T08:00:00.000Z");
        assert!(fm.published);
        assert_eq!(fm.tags, vec!["react", "ts"]);
    }

    #[test]
    fn comma_separated_tags_accepted() {
        let fm = extract("---\ntags: react, ts ,\n---\n");
        assert_eq!(fm.tags, vec!["react", "ts"]);
    }

    #[test]
    fn missing_block_yields_defaults() {
        assert_eq!(extract("no frontmatter"), Frontmatter::default());
    }

    #[test]
    fn malformed_yaml_yields_defaults_but_parse_fields_errors() {
        let raw = "---\ntitle: [unclosed\n---\n";
        assert_eq!(extract(raw), Frontmatter::default());
        assert!(parse_fields(raw).is_err());
    }

    #[test]
    fn scalar_list_is_not_a_mapping() {
        assert!(matches!(
            parse_fields("---\n- a\n- b\n---\n"),
            Err(FrontmatterError::NotAMapping)
        ));
    }

    #[test]
    fn empty_block_is_empty_mapping() {
        let fields = parse_fields("---\n---\nbody").unwrap().unwrap();
        assert!(fields.is_empty());
    }

    #[test]
    fn parse_date_with_offset_converts_to_utc() {
        let dt = parse_date("2024-01-01T02:00:00+02:00").unwrap();
        assert_eq!(iso(&dt), "2024-01-01T00:00:00.000Z");
    }

    #[test]
    fn iso_roundtrips_through_parse_date() {
        for raw in ["2024-01-01", "2023-12-31T23:59:59.250Z", "2020-02-29 12:00"] {
            let dt = parse_date(raw).unwrap();
            assert_eq!(parse_date(&iso(&dt)), Some(dt), "roundtrip of {raw}");
        }
    }

    #[test]
    fn layout_is_captured() {
        let fm = extract("---\nlayout: contents\n---\n");
        assert_eq!(fm.layout.as_deref(), Some("contents"));
    }
}
