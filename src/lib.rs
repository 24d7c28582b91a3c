//! hexnode: template annotation trees for hex viewers.
//!
//! A binary template labels the fields of a file. Running one produces a tree of
//! [`TemplateNode`]s: groups nest other nodes, leaves carry a decoded value, and every node
//! claims byte ranges of the underlying blob. This crate holds that tree in a
//! [`TemplateTree`] arena and normalises each node's ranges with a sorted-interval merge so a
//! viewer can highlight them directly.
//!
//! ```
//! use hexnode::TemplateTree;
//!
//! let mut tree = TemplateTree::new();
//! let header = tree.new_section(Some("Header".into()), None)?;
//! let magic = tree.new_leaf(Some("Magic".into()), Some("PK".into()), Some(header))?;
//! tree.add_range(magic, 0, 2)?;
//! tree.add_range(magic, 2, 2)?;
//! tree.merge_ranges(magic)?;
//! assert_eq!(tree.get(magic).map(|n| n.ranges().len()), Some(1));
//! # Ok::<(), hexnode::TreeError>(())
//! ```

pub mod config;
pub mod error;
pub mod manifest;
pub mod node;
pub mod outline;
pub mod range;
pub mod tree;

pub use error::{ManifestError, TreeError};
pub use node::{NodeId, NodeKind, TemplateNode};
pub use range::ByteRange;
pub use tree::TemplateTree;
