//! Markdown tree, traversal, and text transforms.
//!
//! | Piece | Role |
//! |---|---|
//! | [`parse`] | `pulldown-cmark` events → mdast-shaped [`Node`] tree |
//! | [`walk`] | lazy pre-order iterator, optionally filtered by [`NodeType`] |
//! | [`visit_mut`] | in-place pre-order visitor for transforms |
//! | [`escape_text`] | escape literal `<` in text nodes per [`EscapePolicy`] |

mod ast;
mod escape;
mod walk;

pub use ast::{AstError, Node, NodeType, parse};
pub use escape::{EscapePolicy, escape_str, escape_text};
pub use walk::{Walk, visit_mut, walk};
