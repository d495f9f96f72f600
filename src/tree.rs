//! Filepath: src/tree.rs
//!
//! The immutable tree handle and the detached working view.
//!
//! A [`Tree`] is a committed snapshot: a size and a shared root. It is
//! deeply immutable, so any number of readers may traverse it without
//! coordination. Mutation happens on a [`View`] spawned with
//! [`Tree::copy`]: every `put`/`del` rebuilds only the nodes along the
//! affected root-to-leaf path and shares everything off that path by
//! reference. [`View::tree`] freezes the accumulated changes into a new
//! handle; earlier handles keep observing their own snapshot.

use std::fmt;
use std::sync::Arc;

use crate::cursor::Cursor;
use crate::leaf::Leaf;
use crate::node::{Edge, Node};
use crate::trace::{debug_log, trace_log};

// ============================================================================
//  Tree handle
// ============================================================================

/// An immutable snapshot of the radix tree.
///
/// Cloning a handle is two reference-count bumps; the nodes themselves are
/// never copied.
///
/// # Example
///
/// ```rust
/// use radixmap::Tree;
///
/// let empty: Tree<&str> = Tree::new();
/// let mut view = empty.copy();
/// view.put(b"/foo", "FOO");
///
/// let snapshot = view.tree();
/// assert_eq!(snapshot.size(), 1);
/// assert_eq!(empty.size(), 0); // earlier handles are untouched
/// ```
pub struct Tree<V> {
    pub(crate) size: usize,
    pub(crate) root: Arc<Node<V>>,
}

impl<V> Tree<V> {
    /// Create an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self {
            size: 0,
            root: Arc::new(Node::empty()),
        }
    }

    /// Number of keys stored in this snapshot.
    #[inline]
    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Whether the snapshot holds no keys.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Spawn a detached working view sharing this snapshot's root.
    ///
    /// The view accumulates mutations privately; commit them with
    /// [`View::tree`]. Multiple views spawned from the same handle may
    /// evolve independently.
    #[must_use]
    pub fn copy(&self) -> View<V> {
        View {
            size: self.size,
            root: Arc::clone(&self.root),
        }
    }
}

impl<V> Default for Tree<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> Clone for Tree<V> {
    fn clone(&self) -> Self {
        Self {
            size: self.size,
            root: Arc::clone(&self.root),
        }
    }
}

impl<V> fmt::Debug for Tree<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tree").field("size", &self.size).finish()
    }
}

// ============================================================================
//  Working view
// ============================================================================

/// A detached, single-writer view used to accumulate mutations.
///
/// Not safe for concurrent use: one logical writer at a time. Views spawned
/// from the same [`Tree`] share only immutable nodes, so independent views
/// may be mutated in parallel.
pub struct View<V> {
    pub(crate) size: usize,
    pub(crate) root: Arc<Node<V>>,
}

impl<V> View<V> {
    /// Number of keys currently stored.
    #[inline]
    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Whether the view holds no keys.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Read-only handle on the current root, for [`Node::walk`],
    /// [`Node::subs`], [`Node::path`], [`Node::min`] and [`Node::max`].
    #[inline]
    #[must_use]
    pub fn root(&self) -> &Node<V> {
        &self.root
    }

    /// Look up `key`, returning a shared handle on its value.
    #[must_use]
    pub fn get(&self, key: &[u8]) -> Option<Arc<V>> {
        self.root
            .get_leaf(key)
            .map(|leaf| Arc::clone(&leaf.value))
    }

    /// Insert or overwrite `key`, returning the previous value if the key
    /// was already present.
    pub fn put(&mut self, key: &[u8], value: V) -> Option<Arc<V>> {
        self.put_arc(key, Arc::new(value))
    }

    /// [`View::put`] with a caller-shared value handle.
    pub fn put_arc(&mut self, key: &[u8], value: Arc<V>) -> Option<Arc<V>> {
        trace_log!(key_len = key.len(), "put");

        let (root, prev) = put_at(&self.root, key, key, value);
        self.root = Arc::new(root);

        match prev {
            Some(leaf) => Some(leaf.value),

            None => {
                self.size += 1;
                None
            }
        }
    }

    /// Delete `key`, returning its value if it was present.
    pub fn del(&mut self, key: &[u8]) -> Option<Arc<V>> {
        trace_log!(key_len = key.len(), "del");

        let (root, leaf) = del_at(&self.root, key, true)?;
        self.root = Arc::new(root);
        self.size -= 1;
        Some(leaf.value)
    }

    /// A stateful bidirectional cursor over this view.
    ///
    /// The cursor borrows the view mutably for its lifetime, so mutation
    /// during iteration is only possible through the cursor itself.
    #[must_use]
    pub fn cursor(&mut self) -> Cursor<'_, V> {
        Cursor::new(self)
    }

    /// Freeze the accumulated changes into a new immutable [`Tree`].
    ///
    /// The view remains usable afterwards; further mutations will not leak
    /// into the committed handle.
    #[must_use]
    pub fn tree(&self) -> Tree<V> {
        Tree {
            size: self.size,
            root: Arc::clone(&self.root),
        }
    }
}

impl<V> fmt::Debug for View<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("View").field("size", &self.size).finish()
    }
}

// ============================================================================
//  Copy-on-write mutation
// ============================================================================

/// Length of the longest common prefix of `a` and `b`.
pub(crate) fn common_prefix(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

/// Recursive insert below `n`.
///
/// `s` is the remaining search suffix, `key` the full key. Returns the
/// replacement node for `n` and the previous leaf when the key was already
/// present. Only nodes along the descent are rebuilt; siblings are shared.
fn put_at<V>(n: &Node<V>, s: &[u8], key: &[u8], value: Arc<V>) -> (Node<V>, Option<Leaf<V>>) {
    // Suffix exhausted: the key terminates here.
    if s.is_empty() {
        let mut d = n.clone();
        let prev = d.leaf.take();
        d.leaf = Some(match &prev {
            Some(old) => Leaf {
                key: Arc::clone(&old.key),
                value,
            },

            None => Leaf::new(key, value),
        });
        return (d, prev);
    }

    // No edge starts with the suffix: attach a fresh terminal child.
    let Some((idx, child)) = n.get_edge(s[0]) else {
        let mut d = n.clone();
        d.add_edge(Edge {
            label: s[0],
            node: Arc::new(Node::terminal(s, Leaf::new(key, value))),
        });
        return (d, None);
    };

    let cl = common_prefix(s, &child.prefix);

    // The edge matches fully: consume it and recurse.
    if cl == child.prefix.len() {
        let (node, prev) = put_at(child, &s[cl..], key, value);
        let mut d = n.clone();
        d.edges[idx].node = Arc::new(node);
        return (d, prev);
    }

    // Partial match: split the edge on the common-prefix boundary.
    debug_log!(split_at = cl, "splitting edge");

    let mut split = Node {
        leaf: None,
        prefix: s[..cl].to_vec(),
        edges: Vec::with_capacity(2),
    };

    // Re-attach the existing child with its prefix trimmed past the split;
    // its own subtrees stay shared.
    let mut trimmed = (**child).clone();
    trimmed.prefix = child.prefix[cl..].to_vec();
    split.add_edge(Edge {
        label: trimmed.prefix[0],
        node: Arc::new(trimmed),
    });

    let rest = &s[cl..];
    if rest.is_empty() {
        // The new key ends exactly at the split point.
        split.leaf = Some(Leaf::new(key, value));
    } else {
        split.add_edge(Edge {
            label: rest[0],
            node: Arc::new(Node::terminal(rest, Leaf::new(key, value))),
        });
    }

    let mut d = n.clone();
    d.replace_edge(s[0], Arc::new(split));
    (d, None)
}

/// Recursive delete below `n`.
///
/// Returns the replacement node and the removed leaf, or `None` when the
/// key is absent. A non-root node left leafless with a single edge is
/// merged with that edge to restore minimal form; the root never merges.
fn del_at<V>(n: &Node<V>, s: &[u8], is_root: bool) -> Option<(Node<V>, Leaf<V>)> {
    if s.is_empty() {
        n.leaf.as_ref()?;

        let mut d = n.clone();
        let leaf = d.leaf.take()?;

        if !is_root && d.edges.len() == 1 {
            debug_log!("merging after leaf removal");
            d.merge_child();
        }

        return Some((d, leaf));
    }

    let (idx, child) = n.get_edge(s[0])?;
    if !s.starts_with(child.prefix.as_slice()) {
        return None;
    }

    let (node, leaf) = del_at(child, &s[child.prefix.len()..], false)?;

    let mut d = n.clone();
    if node.leaf.is_none() && node.edges.is_empty() {
        // The child emptied out: prune its edge entirely.
        d.del_edge(s[0]);
        if !is_root && d.edges.len() == 1 && !d.is_leaf() {
            debug_log!("merging after child prune");
            d.merge_child();
        }
    } else {
        d.edges[idx].node = Arc::new(node);
    }

    Some((d, leaf))
}

// ============================================================================
//  Tests
// ============================================================================
