//! # radixmap
//!
//! A persistent (copy-on-write) byte-keyed radix tree: an in-memory
//! ordered key/value index with cheap snapshots.
//!
//! Every mutation produces a new logical tree that shares all unchanged
//! subtrees with its predecessor, so committed snapshots are deeply
//! immutable and any number of readers can traverse them without
//! coordination.
//!
//! ## Design
//!
//! - [`Tree`] is an immutable snapshot: a size plus a shared root node.
//! - [`Tree::copy`] spawns a detached [`View`] where `put`/`del` rebuild
//!   only the nodes on the affected root-to-leaf path.
//! - [`View::tree`] freezes the view back into a new snapshot; earlier
//!   snapshots keep observing their own state.
//! - [`View::cursor`] opens a stateful bidirectional [`Cursor`] with
//!   `first`/`last`/`next`/`prev`/`seek` and delete-at-cursor.
//! - [`Node`] exposes ordered reads directly: [`Node::min`], [`Node::max`]
//!   and the three traversals [`Node::walk`], [`Node::subs`],
//!   [`Node::path`].
//!
//! Keys are arbitrary byte sequences (the empty key is legal); values are
//! opaque and returned behind `Arc`, so `V: Clone` is never required.
//!
//! ## Example
//!
//! ```rust
//! use radixmap::Tree;
//!
//! let mut view = Tree::new().copy();
//! view.put(b"/zoo", "big");
//! view.put(b"/some", "thing");
//! view.put(b"/some/path", "deep");
//!
//! assert_eq!(view.get(b"/some").as_deref(), Some(&"thing"));
//!
//! // Ordered iteration over a prefix.
//! let mut found = Vec::new();
//! view.root().walk(b"/some", |key, _| {
//!     found.push(key.to_vec());
//!     false
//! });
//! assert_eq!(found, vec![b"/some".to_vec(), b"/some/path".to_vec()]);
//!
//! // Snapshots are unaffected by later mutations.
//! let snapshot = view.tree();
//! view.del(b"/zoo");
//! assert_eq!(snapshot.size(), 3);
//! assert_eq!(view.size(), 2);
//! ```
//!
//! A single [`View`] is not safe for concurrent use, but distinct views
//! spawned from the same [`Tree`] may evolve in parallel: they share only
//! immutable nodes.

pub mod cursor;
pub mod node;
pub mod tree;

mod leaf;
mod scan;
mod trace;

pub use cursor::Cursor;
pub use node::Node;
pub use tree::{Tree, View};
