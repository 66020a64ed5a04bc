//! Escape literal `<` in text nodes.
//!
//! The site renders markdown through a component-aware renderer that treats
//! any `<` in prose as the start of a tag, so `x < 5` breaks the page. The
//! transform rewrites matching `<` characters in `text` nodes to `&lt;`.
//! Inline code and code blocks are separate node types and are never touched.
//!
//! Two policies exist:
//!
//! | Policy | Escapes |
//! |---|---|
//! | [`EscapePolicy::Comparators`] | `<` followed by whitespace or a digit |
//! | [`EscapePolicy::All`] | every `<` |

use super::ast::{Node, NodeType};
use super::walk::visit_mut;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

/// Which `<` characters [`escape_text`] rewrites.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EscapePolicy {
    /// Only comparator-like usage: `<` before whitespace or an ASCII digit.
    #[default]
    Comparators,
    /// Every `<`.
    All,
}

impl FromStr for EscapePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "comparators" => Ok(Self::Comparators),
            "all" => Ok(Self::All),
            other => Err(format!(
                "unknown escape policy `{other}` (expected `comparators` or `all`)"
            )),
        }
    }
}

impl fmt::Display for EscapePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Comparators => f.write_str("comparators"),
            Self::All => f.write_str("all"),
        }
    }
}

const LT_ENTITY: &str = "&lt;";

/// Escape a single string under `policy`. Borrows when nothing changes.
pub fn escape_str(text: &str, policy: EscapePolicy) -> Cow<'_, str> {
    if !text.contains('<') {
        return Cow::Borrowed(text);
    }
    match policy {
        EscapePolicy::All => Cow::Owned(text.replace('<', LT_ENTITY)),
        EscapePolicy::Comparators => {
            let mut out = String::with_capacity(text.len() + 8);
            let mut changed = false;
            let mut chars = text.chars().peekable();
            while let Some(c) = chars.next() {
                let comparator = c == '<'
                    && chars
                        .peek()
                        .is_some_and(|next| next.is_whitespace() || next.is_ascii_digit());
                if comparator {
                    out.push_str(LT_ENTITY);
                    changed = true;
                } else {
                    out.push(c);
                }
            }
            if changed {
                Cow::Owned(out)
            } else {
                Cow::Borrowed(text)
            }
        }
    }
}

/// Rewrite every `text` node under `tree` in place.
///
/// Returns the number of text nodes that changed.
pub fn escape_text(tree: &mut Node, policy: EscapePolicy) -> usize {
    let mut rewritten = 0;
    visit_mut(tree, NodeType::Text, &mut |node| {
        if let Node::Text { value } = node {
            let escaped = match escape_str(value, policy) {
                Cow::Owned(s) => Some(s),
                Cow::Borrowed(_) => None,
            };
            if let Some(escaped) = escaped {
                *value = escaped;
                rewritten += 1;
            }
        }
    });
    rewritten
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markdown::{parse, walk};

    fn texts(tree: &Node) -> Vec<String> {
        walk(tree, Some(NodeType::Text))
            .filter_map(Node::value)
            .map(String::from)
            .collect()
    }

    #[test]
    fn comparators_escape_before_space_and_digit() {
        assert_eq!(
            escape_str("x < 5 and y <3", EscapePolicy::Comparators),
            "x &lt; 5 and y &lt;3"
        );
    }

    #[test]
    fn comparators_leave_tag_like_text() {
        let s = "Array<string> and <T>";
        assert!(matches!(
            escape_str(s, EscapePolicy::Comparators),
            Cow::Borrowed(_)
        ));
    }

    #[test]
    fn comparators_ignore_trailing_lt() {
        assert_eq!(escape_str("ends with <", EscapePolicy::Comparators), "ends with <");
    }

    #[test]
    fn all_escapes_everything() {
        assert_eq!(
            escape_str("Array<string> < 5", EscapePolicy::All),
            "Array&lt;string> &lt; 5"
        );
    }

    #[test]
    fn no_lt_borrows() {
        assert!(matches!(
            escape_str("plain", EscapePolicy::All),
            Cow::Borrowed(_)
        ));
    }

    #[test]
    fn tree_transform_skips_code() {
        let mut tree = parse("if `a < b` then x < 5\n\n```\nc < 1\n```\n");
        let changed = escape_text(&mut tree, EscapePolicy::Comparators);
        assert_eq!(changed, 1);
        assert_eq!(texts(&tree), vec!["if ", " then x &lt; 5"]);

        let code: Vec<&str> = walk(&tree, None)
            .filter(|n| matches!(n.node_type(), NodeType::Code | NodeType::InlineCode))
            .filter_map(Node::value)
            .collect();
        assert_eq!(code, vec!["a < b", "c < 1\n"]);
    }

    #[test]
    fn tree_without_lt_is_untouched() {
        let mut tree = parse("# Plain\n\nNothing to see.");
        let before = tree.clone();
        assert_eq!(escape_text(&mut tree, EscapePolicy::All), 0);
        assert_eq!(tree, before);
    }

    #[test]
    fn policy_parses_from_str() {
        assert_eq!("all".parse::<EscapePolicy>().unwrap(), EscapePolicy::All);
        assert_eq!(
            "comparators".parse::<EscapePolicy>().unwrap(),
            EscapePolicy::Comparators
        );
        assert!("some".parse::<EscapePolicy>().is_err());
    }
}
