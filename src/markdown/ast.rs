//! Markdown syntax tree.
//!
//! `pulldown-cmark` produces a flat event stream; every content scan in this
//! crate wants a tree it can walk and rewrite. [`parse`] folds the events into
//! an mdast-shaped tagged union ([`Node`]) so that link, image and text passes
//! all look at the same structure, and so the tree can be exported as JSON
//! for the site renderer.
//!
//! Shape notes:
//!
//! - Adjacent text events (including soft breaks) collapse into one `text` node.
//! - Image alt text is flattened into the image's `alt` string.
//! - Reference-style links and images become `linkReference` /
//!   `imageReference`; the URL lives on the matching `definition` node.
//!   Definitions are appended to the root in source order, including later
//!   ones that repeat a label.
//! - A leading `---` YAML block becomes a `yaml` node.

use pulldown_cmark::{CodeBlockKind, Event, LinkType, Options, Parser, Tag};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::ops::Range;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AstError {
    #[error("not a valid tree node: {0}")]
    InvalidNode(String),
}

/// A markdown syntax tree node.
///
/// Serializes as mdast JSON: `{"type": "link", "url": "...", "children": [...]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Node {
    Root {
        #[serde(default)]
        children: Vec<Node>,
    },
    Paragraph {
        #[serde(default)]
        children: Vec<Node>,
    },
    Heading {
        depth: u8,
        #[serde(default)]
        children: Vec<Node>,
    },
    Blockquote {
        #[serde(default)]
        children: Vec<Node>,
    },
    List {
        #[serde(default)]
        ordered: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        start: Option<u64>,
        #[serde(default)]
        children: Vec<Node>,
    },
    ListItem {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        checked: Option<bool>,
        #[serde(default)]
        children: Vec<Node>,
    },
    Table {
        #[serde(default)]
        children: Vec<Node>,
    },
    TableRow {
        #[serde(default)]
        children: Vec<Node>,
    },
    TableCell {
        #[serde(default)]
        children: Vec<Node>,
    },
    Emphasis {
        #[serde(default)]
        children: Vec<Node>,
    },
    Strong {
        #[serde(default)]
        children: Vec<Node>,
    },
    Delete {
        #[serde(default)]
        children: Vec<Node>,
    },
    Link {
        url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<String>,
        #[serde(default)]
        children: Vec<Node>,
    },
    LinkReference {
        identifier: String,
        #[serde(default)]
        children: Vec<Node>,
    },
    Image {
        url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<String>,
        #[serde(default)]
        alt: String,
    },
    ImageReference {
        identifier: String,
        #[serde(default)]
        alt: String,
    },
    Definition {
        identifier: String,
        url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<String>,
    },
    FootnoteReference {
        identifier: String,
    },
    FootnoteDefinition {
        identifier: String,
        #[serde(default)]
        children: Vec<Node>,
    },
    Text {
        value: String,
    },
    InlineCode {
        value: String,
    },
    Code {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        lang: Option<String>,
        value: String,
    },
    Html {
        value: String,
    },
    InlineMath {
        value: String,
    },
    Math {
        value: String,
    },
    Yaml {
        value: String,
    },
    ThematicBreak,
    Break,
}

/// Discriminant of [`Node`], used to filter walks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    Root,
    Paragraph,
    Heading,
    Blockquote,
    List,
    ListItem,
    Table,
    TableRow,
    TableCell,
    Emphasis,
    Strong,
    Delete,
    Link,
    LinkReference,
    Image,
    ImageReference,
    Definition,
    FootnoteReference,
    FootnoteDefinition,
    Text,
    InlineCode,
    Code,
    Html,
    InlineMath,
    Math,
    Yaml,
    ThematicBreak,
    Break,
}

const NODE_TYPE_NAMES: &[(NodeType, &str)] = &[
    (NodeType::Root, "root"),
    (NodeType::Paragraph, "paragraph"),
    (NodeType::Heading, "heading"),
    (NodeType::Blockquote, "blockquote"),
    (NodeType::List, "list"),
    (NodeType::ListItem, "listItem"),
    (NodeType::Table, "table"),
    (NodeType::TableRow, "tableRow"),
    (NodeType::TableCell, "tableCell"),
    (NodeType::Emphasis, "emphasis"),
    (NodeType::Strong, "strong"),
    (NodeType::Delete, "delete"),
    (NodeType::Link, "link"),
    (NodeType::LinkReference, "linkReference"),
    (NodeType::Image, "image"),
    (NodeType::ImageReference, "imageReference"),
    (NodeType::Definition, "definition"),
    (NodeType::FootnoteReference, "footnoteReference"),
    (NodeType::FootnoteDefinition, "footnoteDefinition"),
    (NodeType::Text, "text"),
    (NodeType::InlineCode, "inlineCode"),
    (NodeType::Code, "code"),
    (NodeType::Html, "html"),
    (NodeType::InlineMath, "inlineMath"),
    (NodeType::Math, "math"),
    (NodeType::Yaml, "yaml"),
    (NodeType::ThematicBreak, "thematicBreak"),
    (NodeType::Break, "break"),
];

impl NodeType {
    /// The mdast `type` string.
    pub fn as_str(self) -> &'static str {
        NODE_TYPE_NAMES
            .iter()
            .find(|(t, _)| *t == self)
            .map(|(_, name)| *name)
            .unwrap_or("unknown")
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NodeType {
    type Err = AstError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NODE_TYPE_NAMES
            .iter()
            .find(|(_, name)| *name == s)
            .map(|(t, _)| *t)
            .ok_or_else(|| AstError::InvalidNode(format!("unknown node type `{s}`")))
    }
}

impl Node {
    pub fn node_type(&self) -> NodeType {
        match self {
            Node::Root { .. } => NodeType::Root,
            Node::Paragraph { .. } => NodeType::Paragraph,
            Node::Heading { .. } => NodeType::Heading,
            Node::Blockquote { .. } => NodeType::Blockquote,
            Node::List { .. } => NodeType::List,
            Node::ListItem { .. } => NodeType::ListItem,
            Node::Table { .. } => NodeType::Table,
            Node::TableRow { .. } => NodeType::TableRow,
            Node::TableCell { .. } => NodeType::TableCell,
            Node::Emphasis { .. } => NodeType::Emphasis,
            Node::Strong { .. } => NodeType::Strong,
            Node::Delete { .. } => NodeType::Delete,
            Node::Link { .. } => NodeType::Link,
            Node::LinkReference { .. } => NodeType::LinkReference,
            Node::Image { .. } => NodeType::Image,
            Node::ImageReference { .. } => NodeType::ImageReference,
            Node::Definition { .. } => NodeType::Definition,
            Node::FootnoteReference { .. } => NodeType::FootnoteReference,
            Node::FootnoteDefinition { .. } => NodeType::FootnoteDefinition,
            Node::Text { .. } => NodeType::Text,
            Node::InlineCode { .. } => NodeType::InlineCode,
            Node::Code { .. } => NodeType::Code,
            Node::Html { .. } => NodeType::Html,
            Node::InlineMath { .. } => NodeType::InlineMath,
            Node::Math { .. } => NodeType::Math,
            Node::Yaml { .. } => NodeType::Yaml,
            Node::ThematicBreak => NodeType::ThematicBreak,
            Node::Break => NodeType::Break,
        }
    }

    /// Child nodes, or `None` for leaves.
    pub fn children(&self) -> Option<&[Node]> {
        match self {
            Node::Root { children }
            | Node::Paragraph { children }
            | Node::Heading { children, .. }
            | Node::Blockquote { children }
            | Node::List { children, .. }
            | Node::ListItem { children, .. }
            | Node::Table { children }
            | Node::TableRow { children }
            | Node::TableCell { children }
            | Node::Emphasis { children }
            | Node::Strong { children }
            | Node::Delete { children }
            | Node::Link { children, .. }
            | Node::LinkReference { children, .. }
            | Node::FootnoteDefinition { children, .. } => Some(children),
            _ => None,
        }
    }

    pub fn children_mut(&mut self) -> Option<&mut Vec<Node>> {
        match self {
            Node::Root { children }
            | Node::Paragraph { children }
            | Node::Heading { children, .. }
            | Node::Blockquote { children }
            | Node::List { children, .. }
            | Node::ListItem { children, .. }
            | Node::Table { children }
            | Node::TableRow { children }
            | Node::TableCell { children }
            | Node::Emphasis { children }
            | Node::Strong { children }
            | Node::Delete { children }
            | Node::Link { children, .. }
            | Node::LinkReference { children, .. }
            | Node::FootnoteDefinition { children, .. } => Some(children),
            _ => None,
        }
    }

    /// Target URL of `link`, `image` and `definition` nodes.
    pub fn url(&self) -> Option<&str> {
        match self {
            Node::Link { url, .. } | Node::Image { url, .. } | Node::Definition { url, .. } => {
                Some(url)
            }
            _ => None,
        }
    }

    /// Literal value of leaf nodes that carry one.
    pub fn value(&self) -> Option<&str> {
        match self {
            Node::Text { value }
            | Node::InlineCode { value }
            | Node::Code { value, .. }
            | Node::Html { value }
            | Node::InlineMath { value }
            | Node::Math { value }
            | Node::Yaml { value } => Some(value),
            _ => None,
        }
    }

    /// Build a tree from mdast-shaped JSON.
    ///
    /// Fails when any object lacks a `type`, names an unknown type, or is
    /// missing a required field for its type.
    pub fn from_json(value: serde_json::Value) -> Result<Node, AstError> {
        serde_json::from_value(value).map_err(|e| AstError::InvalidNode(e.to_string()))
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

fn parser_options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_YAML_STYLE_METADATA_BLOCKS
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

fn is_reference(link_type: LinkType) -> bool {
    matches!(
        link_type,
        LinkType::Reference | LinkType::Collapsed | LinkType::Shortcut
    )
}

/// Open node for a start tag.
fn open(tag: Tag<'_>) -> Node {
    match tag {
        Tag::Paragraph => Node::Paragraph { children: vec![] },
        Tag::Heading { level, .. } => Node::Heading {
            depth: level as u8,
            children: vec![],
        },
        Tag::BlockQuote(_) => Node::Blockquote { children: vec![] },
        Tag::CodeBlock(kind) => Node::Code {
            lang: match kind {
                CodeBlockKind::Fenced(info) => info.split_whitespace().next().and_then(non_empty),
                CodeBlockKind::Indented => None,
            },
            value: String::new(),
        },
        Tag::HtmlBlock => Node::Html {
            value: String::new(),
        },
        Tag::List(start) => Node::List {
            ordered: start.is_some(),
            start,
            children: vec![],
        },
        Tag::Item => Node::ListItem {
            checked: None,
            children: vec![],
        },
        Tag::FootnoteDefinition(label) => Node::FootnoteDefinition {
            identifier: label.to_string(),
            children: vec![],
        },
        Tag::Table(_) => Node::Table { children: vec![] },
        // pulldown-cmark puts header cells directly under the head
        Tag::TableHead | Tag::TableRow => Node::TableRow { children: vec![] },
        Tag::TableCell => Node::TableCell { children: vec![] },
        Tag::Emphasis => Node::Emphasis { children: vec![] },
        Tag::Strong => Node::Strong { children: vec![] },
        Tag::Strikethrough => Node::Delete { children: vec![] },
        Tag::Link {
            link_type,
            dest_url,
            title,
            id,
        } => {
            if is_reference(link_type) {
                Node::LinkReference {
                    identifier: id.to_string(),
                    children: vec![],
                }
            } else {
                let url = if link_type == LinkType::Email && !dest_url.starts_with("mailto:") {
                    format!("mailto:{dest_url}")
                } else {
                    dest_url.to_string()
                };
                Node::Link {
                    url,
                    title: non_empty(&title),
                    children: vec![],
                }
            }
        }
        Tag::Image {
            link_type,
            dest_url,
            title,
            id,
        } => {
            if is_reference(link_type) {
                Node::ImageReference {
                    identifier: id.to_string(),
                    alt: String::new(),
                }
            } else {
                Node::Image {
                    url: dest_url.to_string(),
                    title: non_empty(&title),
                    alt: String::new(),
                }
            }
        }
        Tag::MetadataBlock(_) => Node::Yaml {
            value: String::new(),
        },
        // Extensions that are not enabled in `parser_options`.
        _ => Node::Paragraph { children: vec![] },
    }
}

/// Tree under construction. The bottom of `stack` is always the root.
struct Builder {
    stack: Vec<Node>,
    /// Start tags seen inside an image; their text belongs to the alt.
    nested_in_image: usize,
}

impl Builder {
    fn new() -> Self {
        Self {
            stack: vec![Node::Root { children: vec![] }],
            nested_in_image: 0,
        }
    }

    fn top(&mut self) -> &mut Node {
        let last = self.stack.len() - 1;
        &mut self.stack[last]
    }

    fn in_image(&self) -> bool {
        matches!(
            self.stack.last(),
            Some(Node::Image { .. } | Node::ImageReference { .. })
        )
    }

    fn start(&mut self, tag: Tag<'_>) {
        if self.in_image() {
            self.nested_in_image += 1;
            return;
        }
        self.stack.push(open(tag));
    }

    fn end(&mut self) {
        if self.nested_in_image > 0 {
            self.nested_in_image -= 1;
            return;
        }
        if self.stack.len() > 1
            && let Some(node) = self.stack.pop()
        {
            self.append(node);
        }
    }

    fn append(&mut self, node: Node) {
        if let Some(children) = self.top().children_mut() {
            children.push(node);
        }
    }

    /// Literal text: goes into a leaf under construction, image alt, or a
    /// (merged) text node.
    fn text(&mut self, text: &str) {
        match self.top() {
            Node::Code { value, .. } | Node::Html { value } | Node::Yaml { value } => {
                value.push_str(text)
            }
            Node::Image { alt, .. } | Node::ImageReference { alt, .. } => alt.push_str(text),
            node => {
                if let Some(children) = node.children_mut() {
                    match children.last_mut() {
                        Some(Node::Text { value }) => value.push_str(text),
                        _ => children.push(Node::Text {
                            value: text.to_string(),
                        }),
                    }
                }
            }
        }
    }

    fn html(&mut self, html: &str) {
        if let Node::Html { value } = self.top() {
            value.push_str(html);
            return;
        }
        self.append(Node::Html {
            value: html.to_string(),
        });
    }

    fn leaf(&mut self, node: Node) {
        if self.in_image() {
            if let Some(value) = node.value() {
                let value = value.to_string();
                self.text(&value);
            }
            return;
        }
        self.append(node);
    }

    fn finish(mut self) -> Node {
        while self.stack.len() > 1 {
            self.end();
        }
        self.stack.pop().unwrap_or(Node::Root { children: vec![] })
    }
}

/// Overwrite `span` with spaces, keeping line breaks and byte offsets.
fn blank_out(source: &mut String, span: Range<usize>) {
    let Some(original) = source.get(span.clone()) else {
        return;
    };
    let blank: String = original
        .chars()
        .map(|c| match c {
            '\n' | '\r' => c.to_string(),
            _ => " ".repeat(c.len_utf8()),
        })
        .collect();
    source.replace_range(span, &blank);
}

/// Every link reference definition in `text`, in source order.
///
/// `pulldown-cmark` only reports the first definition of a label. Found
/// definitions are blanked out and the text rescanned until no new ones
/// appear, so later definitions sharing a label are kept as well.
fn definitions(text: &str) -> Vec<Node> {
    let mut source = text.to_string();
    let mut seen: HashSet<usize> = HashSet::new();
    let mut found: Vec<(usize, Node)> = Vec::new();

    loop {
        let round: Vec<(Range<usize>, Node)> = Parser::new_ext(&source, parser_options())
            .reference_definitions()
            .iter()
            .filter(|(_, def)| !seen.contains(&def.span.start))
            .map(|(label, def)| {
                (
                    def.span.clone(),
                    Node::Definition {
                        identifier: label.to_string(),
                        url: def.dest.to_string(),
                        title: def.title.as_deref().and_then(non_empty),
                    },
                )
            })
            .collect();
        if round.is_empty() {
            break;
        }
        for (span, node) in round {
            seen.insert(span.start);
            found.push((span.start, node));
            blank_out(&mut source, span);
        }
    }

    found.sort_by_key(|(start, _)| *start);
    found.into_iter().map(|(_, node)| node).collect()
}

/// Parse markdown text into a tree rooted at [`Node::Root`].
pub fn parse(text: &str) -> Node {
    let parser = Parser::new_ext(text, parser_options());

    let mut builder = Builder::new();
    for event in parser {
        match event {
            Event::Start(tag) => builder.start(tag),
            Event::End(_) => builder.end(),
            Event::Text(text) => builder.text(&text),
            Event::SoftBreak => builder.text("\n"),
            Event::Code(code) => builder.leaf(Node::InlineCode {
                value: code.to_string(),
            }),
            Event::InlineMath(math) => builder.leaf(Node::InlineMath {
                value: math.to_string(),
            }),
            Event::DisplayMath(math) => builder.leaf(Node::Math {
                value: math.to_string(),
            }),
            Event::Html(html) | Event::InlineHtml(html) => {
                if builder.in_image() {
                    builder.text(&html);
                } else {
                    builder.html(&html);
                }
            }
            Event::FootnoteReference(label) => builder.leaf(Node::FootnoteReference {
                identifier: label.to_string(),
            }),
            Event::HardBreak => builder.leaf(Node::Break),
            Event::Rule => builder.leaf(Node::ThematicBreak),
            Event::TaskListMarker(done) => {
                if let Node::ListItem { checked, .. } = builder.top() {
                    *checked = Some(done);
                }
            }
        }
    }

    let mut root = builder.finish();
    if let Some(children) = root.children_mut() {
        children.extend(definitions(text));
    }
    root
}
