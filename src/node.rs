//! Filepath: src/node.rs
//!
//! Immutable radix-tree nodes and their structural primitives.
//!
//! A [`Node`] carries an optional leaf record, a compressed edge prefix,
//! and a label-sorted edge array. Nodes are shared between trees through
//! `Arc` and are never mutated once published; mutation paths duplicate a
//! node with [`Clone`] and edit the private duplicate before re-wrapping
//! it.

use std::fmt;
use std::sync::Arc;

use crate::leaf::Leaf;

/// An entry in a node's sorted edge array.
///
/// `label` duplicates the first byte of `node.prefix` so the binary search
/// never chases the child pointer.
pub(crate) struct Edge<V> {
    /// First byte of the child's prefix.
    pub(crate) label: u8,

    /// The shared child node.
    pub(crate) node: Arc<Node<V>>,
}

impl<V> Clone for Edge<V> {
    fn clone(&self) -> Self {
        Self {
            label: self.label,
            node: Arc::clone(&self.node),
        }
    }
}

impl<V> fmt::Debug for Edge<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Edge").field("label", &self.label).finish()
    }
}

/// An immutable node in the radix tree.
///
/// Invariants (for every node reachable from a committed root):
///
/// - edges are sorted strictly ascending by label, labels unique
/// - `edges[i].label == edges[i].node.prefix[0]`
/// - a non-root node without a leaf has at least two edges
/// - the root's prefix is empty
pub struct Node<V> {
    /// The record stored here, when a key terminates at this node.
    pub(crate) leaf: Option<Leaf<V>>,

    /// Bytes consumed between the parent and this node. Empty on the root.
    pub(crate) prefix: Vec<u8>,

    /// Label-sorted child edges.
    pub(crate) edges: Vec<Edge<V>>,
}

// ============================================================================
//  Construction and duplication
// ============================================================================

impl<V> Node<V> {
    /// The empty node used as the root of an empty tree.
    #[must_use]
    pub(crate) fn empty() -> Self {
        Self {
            leaf: None,
            prefix: Vec::new(),
            edges: Vec::new(),
        }
    }

    /// A terminal node: the given prefix, the given leaf, no edges.
    #[must_use]
    pub(crate) fn terminal(prefix: &[u8], leaf: Leaf<V>) -> Self {
        Self {
            leaf: Some(leaf),
            prefix: prefix.to_vec(),
            edges: Vec::new(),
        }
    }

    /// Whether a key terminates at this node.
    #[inline]
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.leaf.is_some()
    }
}

// The "duplicate" primitive: a fresh leaf record, a fresh prefix buffer and
// a fresh edge array, with child nodes shared by reference. Hand-written so
// `V: Clone` is not required.
impl<V> Clone for Node<V> {
    fn clone(&self) -> Self {
        Self {
            leaf: self.leaf.clone(),
            prefix: self.prefix.clone(),
            edges: self.edges.clone(),
        }
    }
}

// ============================================================================
//  Edge array primitives
// ============================================================================

impl<V> Node<V> {
    /// Locate the edge whose label matches `label`.
    ///
    /// Returns the edge index and the child node, or `None` when no edge
    /// starts with that byte.
    #[inline]
    pub(crate) fn get_edge(&self, label: u8) -> Option<(usize, &Arc<Node<V>>)> {
        match self.edges.binary_search_by_key(&label, |e| e.label) {
            Ok(idx) => Some((idx, &self.edges[idx].node)),
            Err(_) => None,
        }
    }

    /// Insert an edge, preserving label order.
    ///
    /// The caller guarantees the label is not already present.
    pub(crate) fn add_edge(&mut self, edge: Edge<V>) {
        debug_assert!(
            self.edges
                .binary_search_by_key(&edge.label, |e| e.label)
                .is_err(),
            "add_edge: label {:#04x} already present",
            edge.label
        );

        let idx = self.edges.partition_point(|e| e.label < edge.label);
        self.edges.insert(idx, edge);
    }

    /// Replace the child behind an existing label.
    ///
    /// # Panics
    ///
    /// Panics if no edge carries `label`; replacing a missing edge is a bug
    /// in the mutation path, not a recoverable condition.
    pub(crate) fn replace_edge(&mut self, label: u8, node: Arc<Node<V>>) {
        match self.edges.binary_search_by_key(&label, |e| e.label) {
            Ok(idx) => self.edges[idx].node = node,

            Err(_) => panic!("replace_edge: no edge for label {label:#04x}"),
        }
    }

    /// Remove the edge carrying `label`, if present.
    pub(crate) fn del_edge(&mut self, label: u8) {
        if let Ok(idx) = self.edges.binary_search_by_key(&label, |e| e.label) {
            self.edges.remove(idx);
        }
    }

    /// Collapse this node into its sole child.
    ///
    /// The node's prefix is extended by the child's prefix, and the child's
    /// leaf and edges are adopted. Used after deletions to restore minimal
    /// form; the root is never merged.
    ///
    /// # Panics
    ///
    /// Panics unless the node has no leaf and exactly one edge.
    pub(crate) fn merge_child(&mut self) {
        assert!(
            self.leaf.is_none() && self.edges.len() == 1,
            "merge_child: node must be leafless with exactly one edge"
        );

        // INVARIANT: checked above, pop cannot fail.
        let Some(edge) = self.edges.pop() else {
            unreachable!()
        };

        self.prefix.extend_from_slice(&edge.node.prefix);
        self.leaf = edge.node.leaf.clone();
        self.edges = edge.node.edges.clone();
    }
}

// ============================================================================
//  Point reads
// ============================================================================

impl<V> Node<V> {
    /// Descend to the leaf stored under `key`, if any.
    ///
    /// O(key length): each step consumes the matched child prefix.
    pub(crate) fn get_leaf(&self, key: &[u8]) -> Option<&Leaf<V>> {
        let mut n = self;
        let mut s = key;

        loop {
            if s.is_empty() {
                return n.leaf.as_ref();
            }

            let (_, child) = n.get_edge(s[0])?;
            if !s.starts_with(child.prefix.as_slice()) {
                return None;
            }

            s = &s[child.prefix.len()..];
            n = child.as_ref();
        }
    }

    /// The smallest key/value in this node's subtree, or `None` on an
    /// empty tree.
    ///
    /// A node's own leaf precedes everything below it, so the descent stops
    /// at the first leaf-bearing node on the leftmost path.
    #[must_use]
    pub fn min(&self) -> Option<(Arc<[u8]>, Arc<V>)> {
        let mut n = self;

        loop {
            if let Some(leaf) = &n.leaf {
                return Some((Arc::clone(&leaf.key), Arc::clone(&leaf.value)));
            }

            n = n.edges.first()?.node.as_ref();
        }
    }

    /// The largest key/value in this node's subtree, or `None` on an
    /// empty tree.
    #[must_use]
    pub fn max(&self) -> Option<(Arc<[u8]>, Arc<V>)> {
        let mut n = self;

        loop {
            if let Some(edge) = n.edges.last() {
                n = edge.node.as_ref();
                continue;
            }

            let leaf = n.leaf.as_ref()?;
            return Some((Arc::clone(&leaf.key), Arc::clone(&leaf.value)));
        }
    }
}

impl<V> fmt::Debug for Node<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("prefix", &self.prefix)
            .field("leaf", &self.leaf)
            .field(
                "labels",
                &self.edges.iter().map(|e| e.label).collect::<Vec<_>>(),
            )
            .finish()
    }
}

// ============================================================================
//  Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::leaf::Leaf;

    use super::{Edge, Node};

    fn terminal(prefix: &[u8]) -> Arc<Node<u64>> {
        Arc::new(Node::terminal(prefix, Leaf::new(prefix, Arc::new(0))))
    }

    fn edge(prefix: &[u8]) -> Edge<u64> {
        Edge {
            label: prefix[0],
            node: terminal(prefix),
        }
    }

    #[test]
    fn test_add_edge_keeps_labels_sorted() {
        let mut node: Node<u64> = Node::empty();
        for prefix in [b"m".as_slice(), b"a", b"z", b"q"] {
            node.add_edge(edge(prefix));
        }

        let labels: Vec<u8> = node.edges.iter().map(|e| e.label).collect();
        assert_eq!(labels, vec![b'a', b'm', b'q', b'z']);
    }

    #[test]
    fn test_get_edge_hit_and_miss() {
        let mut node: Node<u64> = Node::empty();
        node.add_edge(edge(b"apple"));
        node.add_edge(edge(b"zebra"));

        let (idx, child) = node.get_edge(b'z').expect("edge present");
        assert_eq!(idx, 1);
        assert_eq!(child.prefix, b"zebra");

        assert!(node.get_edge(b'q').is_none());
    }

    #[test]
    fn test_replace_edge_swaps_child() {
        let mut node: Node<u64> = Node::empty();
        node.add_edge(edge(b"old"));

        node.replace_edge(b'o', terminal(b"other"));
        let (_, child) = node.get_edge(b'o').expect("edge present");
        assert_eq!(child.prefix, b"other");
    }

    #[test]
    #[should_panic(expected = "replace_edge")]
    fn test_replace_missing_edge_panics() {
        let mut node: Node<u64> = Node::empty();
        node.replace_edge(b'x', terminal(b"x"));
    }

    #[test]
    fn test_del_edge_shrinks_array() {
        let mut node: Node<u64> = Node::empty();
        node.add_edge(edge(b"a"));
        node.add_edge(edge(b"b"));

        node.del_edge(b'a');
        assert_eq!(node.edges.len(), 1);
        assert!(node.get_edge(b'a').is_none());

        // Deleting a missing label is a no-op.
        node.del_edge(b'a');
        assert_eq!(node.edges.len(), 1);
    }

    #[test]
    fn test_merge_child_concatenates_prefixes() {
        let mut node: Node<u64> = Node {
            leaf: None,
            prefix: b"foo".to_vec(),
            edges: Vec::new(),
        };
        node.add_edge(edge(b"bar"));

        node.merge_child();
        assert_eq!(node.prefix, b"foobar");
        assert!(node.is_leaf());
        assert!(node.edges.is_empty());
    }

    #[test]
    #[should_panic(expected = "merge_child")]
    fn test_merge_child_requires_single_edge() {
        let mut node: Node<u64> = Node::empty();
        node.add_edge(edge(b"a"));
        node.add_edge(edge(b"b"));
        node.merge_child();
    }

    #[test]
    fn test_clone_shares_children() {
        let mut node: Node<u64> = Node::empty();
        node.add_edge(edge(b"shared"));

        let dup = node.clone();
        assert!(Arc::ptr_eq(&node.edges[0].node, &dup.edges[0].node));
    }

    #[test]
    fn test_min_max_on_empty_node() {
        let node: Node<u64> = Node::empty();
        assert!(node.min().is_none());
        assert!(node.max().is_none());
    }
}
