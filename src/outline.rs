//! The outline renders a template tree as indented text with box-drawing characters.
//!
//! It is the terminal stand-in for the hex viewer's side panel: one line per node in document
//! order, sections flagged, leaves showing their value and every node its claimed byte ranges.

use crate::node::TemplateNode;
use crate::range::ByteRange;
use crate::tree::TemplateTree;

#[derive(Clone, Copy, Debug)]
/// Presentation switches for [`render_outline`].
pub struct OutlineOptions {
    /// Print offsets in hexadecimal rather than decimal.
    pub hex_offsets: bool,
    /// Print each node's ranges after its label.
    pub show_ranges: bool,
}

impl Default for OutlineOptions {
    fn default() -> Self {
        Self {
            hex_offsets: true,
            show_ranges: true,
        }
    }
}

/// Generate box-drawing prefix for tree structure.
///
/// `open_levels[i]` is true when the ancestor at depth `i + 1` still has siblings below it, so
/// its vertical rule continues past this line.
fn tree_prefix(depth: usize, is_last: bool, open_levels: &[bool]) -> String {
    if depth == 0 {
        return String::new();
    }

    let mut prefix = String::new();

    for open in open_levels.iter().take(depth - 1) {
        if *open {
            prefix.push_str("│   ");
        } else {
            prefix.push_str("    ");
        }
    }

    if is_last {
        prefix.push_str("└── ");
    } else {
        prefix.push_str("├── ");
    }

    prefix
}

fn format_range(range: &ByteRange, hex: bool) -> String {
    if hex {
        format!("[{:#x}..{:#x})", range.location(), range.end())
    } else {
        format!("[{}..{})", range.location(), range.end())
    }
}

fn format_node(node: &TemplateNode, options: OutlineOptions) -> String {
    let mut line = String::new();
    if node.is_section() {
        line.push_str("§ ");
    }
    line.push_str(node.label().unwrap_or("(unlabelled)"));
    if let Some(value) = node.value() {
        line.push_str(" = ");
        line.push_str(value);
    }
    if options.show_ranges && !node.ranges().is_empty() {
        let ranges: Vec<String> = node
            .ranges()
            .iter()
            .map(|r| format_range(r, options.hex_offsets))
            .collect();
        line.push(' ');
        line.push_str(&ranges.join(" "));
    }
    line
}

#[must_use]
/// Render every node of `tree` as one outline line, in document order.
///
/// Top-level nodes carry no prefix; nested nodes hang off their parent with `├──`/`└──`.
pub fn render_outline(tree: &TemplateTree, options: OutlineOptions) -> Vec<String> {
    let mut lines = Vec::with_capacity(tree.len());
    let mut open_levels: Vec<bool> = Vec::new();

    for (id, depth) in tree.walk() {
        let Some(node) = tree.get(id) else {
            continue;
        };
        let is_last = match node.parent() {
            Some(parent) => tree.children(parent).last() == Some(&id),
            None => tree.roots().last() == Some(&id),
        };

        open_levels.truncate(depth);
        let prefix = tree_prefix(depth, is_last, &open_levels);
        if depth > 0 {
            open_levels.resize(depth - 1, false);
            open_levels.push(!is_last);
        }

        lines.push(format!("{prefix}{}", format_node(node, options)));
    }

    lines
}

#[cfg(test)]
#[path = "tests/outline.rs"]
mod tests;
