//! Depth-first traversal over [`Node`] trees.
//!
//! [`walk`] is the read-only primitive every content scan builds on: a lazy,
//! pre-order iterator that can be narrowed to one node type. The filter only
//! decides what is yielded; descent always continues into every child, so a
//! link nested in a table cell inside a list item is still found.
//!
//! [`visit_mut`] is the in-place counterpart used by the tree transforms.

use super::ast::{Node, NodeType};

/// Lazy pre-order traversal. Created by [`walk`]; not restartable.
pub struct Walk<'a> {
    stack: Vec<&'a Node>,
    filter: Option<NodeType>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<&'a Node> {
        loop {
            let node = self.stack.pop()?;
            if let Some(children) = node.children() {
                self.stack.extend(children.iter().rev());
            }
            if self.filter.is_none_or(|t| node.node_type() == t) {
                return Some(node);
            }
        }
    }
}

/// Walk `node` and all of its descendants in pre-order.
///
/// With `filter = None` every node is yielded (including `node` itself);
/// otherwise only nodes of that type.
pub fn walk(node: &Node, filter: Option<NodeType>) -> Walk<'_> {
    Walk {
        stack: vec![node],
        filter,
    }
}

/// Call `f` on every node of type `filter`, pre-order, allowing mutation.
///
/// Children are visited after `f` runs on their parent, so `f` may rewrite
/// a node's children before they are visited.
pub fn visit_mut<F>(node: &mut Node, filter: NodeType, f: &mut F)
where
    F: FnMut(&mut Node),
{
    if node.node_type() == filter {
        f(node);
    }
    if let Some(children) = node.children_mut() {
        for child in children {
            visit_mut(child, filter, f);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markdown::parse;

    fn types<'a>(nodes: impl Iterator<Item = &'a Node>) -> Vec<NodeType> {
        nodes.map(|n| n.node_type()).collect()
    }

    #[test]
    fn unfiltered_walk_is_preorder() {
        let tree = parse("# Title\n\nSome *emphasis*.");
        assert_eq!(
            types(walk(&tree, None)),
            vec![
                NodeType::Root,
                NodeType::Heading,
                NodeType::Text,
                NodeType::Paragraph,
                NodeType::Text,
                NodeType::Emphasis,
                NodeType::Text,
                NodeType::Text,
            ]
        );
    }

    #[test]
    fn filter_still_descends_through_non_matching_nodes() {
        let tree = parse("- item with [a](/a)\n  - nested [b](/b)\n\n| h |\n|---|\n| [c](/c) |\n");
        let urls: Vec<&str> = walk(&tree, Some(NodeType::Link))
            .filter_map(Node::url)
            .collect();
        assert_eq!(urls, vec!["/a", "/b", "/c"]);
    }

    #[test]
    fn filter_can_match_the_starting_node() {
        let tree = parse("text");
        let roots: Vec<&Node> = walk(&tree, Some(NodeType::Root)).collect();
        assert_eq!(roots.len(), 1);
    }

    #[test]
    fn leaf_walk_yields_only_itself() {
        let leaf = Node::Text {
            value: "x".into(),
        };
        assert_eq!(walk(&leaf, None).count(), 1);
        assert_eq!(walk(&leaf, Some(NodeType::Link)).count(), 0);
    }

    #[test]
    fn walk_is_lazy() {
        let tree = parse("[a](/a) [b](/b) [c](/c)");
        let mut links = walk(&tree, Some(NodeType::Link));
        assert_eq!(links.next().and_then(Node::url), Some("/a"));
        // Remaining items are still available after a partial read.
        assert_eq!(links.count(), 2);
    }

    #[test]
    fn visit_mut_rewrites_matching_nodes() {
        let mut tree = parse("one **two** three");
        let mut seen = 0;
        visit_mut(&mut tree, NodeType::Text, &mut |node| {
            if let Node::Text { value } = node {
                value.make_ascii_uppercase();
                seen += 1;
            }
        });
        assert_eq!(seen, 3);
        let texts: Vec<&str> = walk(&tree, Some(NodeType::Text))
            .filter_map(Node::value)
            .collect();
        assert_eq!(texts, vec!["ONE ", "TWO", " THREE"]);
    }
}
