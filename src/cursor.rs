//! Filepath: src/cursor.rs
//!
//! A stateful bidirectional cursor over a working view.
//!
//! The cursor keeps an explicit stack of `(node, child index)` frames from
//! the root down to the node carrying the current key. Stepping reuses the
//! stack instead of re-descending from the root, so a full scan touches
//! each node once.
//!
//! Position invariant between calls: the top frame's node carries the
//! current leaf and has index 0; every other frame's index names the edge
//! its successor frame was entered through.
//!
//! Deleting through the cursor ([`Cursor::del`]) rewrites the tree, which
//! may merge nodes along the old path. The stale stack is discarded and the
//! next step re-seeks around the removed key: `next` seeks its successor,
//! `prev` seeks and steps back (falling back to the maximum when no
//! successor exists).

use std::sync::Arc;

use crate::node::Node;
use crate::trace::trace_log;
use crate::tree::{common_prefix, View};

/// One step of the descent: a visited node and the index of the edge the
/// descent continues through.
struct Frame<V> {
    node: Arc<Node<V>>,
    pos: usize,
}

impl<V> Clone for Frame<V> {
    fn clone(&self) -> Self {
        Self {
            node: Arc::clone(&self.node),
            pos: self.pos,
        }
    }
}

/// A bidirectional iterator bound to a [`View`].
///
/// Borrows the view mutably for its lifetime: the borrow checker rules out
/// mutating the view underneath a live cursor, and [`Cursor::del`] is the
/// one mutation that goes through the cursor itself.
///
/// Before the first `first`/`last`/`seek`, the cursor is unpositioned and
/// `next`/`prev` return `None`.
pub struct Cursor<'a, V> {
    view: &'a mut View<V>,
    path: Vec<Frame<V>>,
    /// Key removed by [`Cursor::del`], still owed a re-seek.
    pending: Option<Arc<[u8]>>,
}

impl<'a, V> Cursor<'a, V> {
    pub(crate) fn new(view: &'a mut View<V>) -> Self {
        Self {
            view,
            path: Vec::new(),
            pending: None,
        }
    }

    // ------------------------------------------------------------------
    //  Positioning
    // ------------------------------------------------------------------

    /// Move to the smallest key. `None` on an empty tree.
    pub fn first(&mut self) -> Option<(Arc<[u8]>, Arc<V>)> {
        self.pending = None;
        self.rewind_to_root();

        if self.descend_first() {
            self.current()
        } else {
            self.path.clear();
            None
        }
    }

    /// Move to the largest key. `None` on an empty tree.
    pub fn last(&mut self) -> Option<(Arc<[u8]>, Arc<V>)> {
        self.pending = None;
        self.rewind_to_root();

        if self.descend_last() {
            self.current()
        } else {
            self.path.clear();
            None
        }
    }

    /// Advance to the next key in ascending order.
    ///
    /// Returns `None` when the cursor is unpositioned or exhausted; an
    /// exhausted cursor keeps its position.
    pub fn next(&mut self) -> Option<(Arc<[u8]>, Arc<V>)> {
        if let Some(key) = self.pending.take() {
            // Re-seat after delete-at-cursor: the removed key is absent,
            // so the seek parks on its successor.
            return self.seek(&key);
        }

        if self.path.is_empty() {
            return None;
        }
        let saved = self.path.clone();

        loop {
            let (node, pos) = {
                // INVARIANT: the loop never empties the path without
                // returning, so the top frame exists.
                let top = self.path.last()?;
                (Arc::clone(&top.node), top.pos)
            };

            if pos < node.edges.len() {
                // Unvisited children remain: the next key is the first
                // leaf under the child at `pos`.
                self.path.push(Frame {
                    node: Arc::clone(&node.edges[pos].node),
                    pos: 0,
                });
                self.descend_first();
                return self.current();
            }

            self.path.pop();
            if self.path.is_empty() {
                self.path = saved;
                return None;
            }
            if let Some(parent) = self.path.last_mut() {
                parent.pos += 1;
            }
        }
    }

    /// Step back to the previous key in descending order.
    ///
    /// Returns `None` when the cursor is unpositioned or already on the
    /// smallest key; in the latter case the position is kept.
    pub fn prev(&mut self) -> Option<(Arc<[u8]>, Arc<V>)> {
        if let Some(key) = self.pending.take() {
            // Re-seat after delete-at-cursor: park past the removed key,
            // then step back to its predecessor.
            return match self.seek(&key) {
                Some(_) => self.prev(),
                None => self.last(),
            };
        }

        if self.path.is_empty() {
            return None;
        }
        let saved = self.path.clone();

        loop {
            self.path.pop();
            if self.path.is_empty() {
                self.path = saved;
                return None;
            }

            let last = self.path.len() - 1;
            let parent = &mut self.path[last];

            if parent.pos > 0 {
                // The previous key is the rightmost leaf under the
                // preceding sibling.
                parent.pos -= 1;
                let child = Arc::clone(&parent.node.edges[parent.pos].node);
                self.path.push(Frame { node: child, pos: 0 });
                self.descend_last();
                return self.current();
            }

            if parent.node.is_leaf() {
                // The parent's own leaf precedes all its children.
                return self.current();
            }

            // A pass-through node: keep popping.
        }
    }

    /// Reposition on the smallest stored key `>=` `key`.
    ///
    /// Returns `None` (leaving the cursor unpositioned) when every stored
    /// key ranks below `key`.
    pub fn seek(&mut self, key: &[u8]) -> Option<(Arc<[u8]>, Arc<V>)> {
        trace_log!(key_len = key.len(), "seek");

        self.pending = None;
        self.rewind_to_root();
        let mut s = key;

        loop {
            let node = Arc::clone(&self.path.last()?.node);

            // Search key exhausted: this node's subtree holds nothing
            // smaller than the key.
            if s.is_empty() {
                if self.descend_first() {
                    return self.current();
                }
                self.path.clear();
                return None;
            }

            match node.edges.binary_search_by_key(&s[0], |e| e.label) {
                Ok(idx) => {
                    let child = &node.edges[idx].node;
                    let cl = common_prefix(s, &child.prefix);

                    if cl == child.prefix.len() {
                        // Edge fully matched: consume it and keep going.
                        self.set_top_pos(idx);
                        self.path.push(Frame {
                            node: Arc::clone(child),
                            pos: 0,
                        });
                        s = &s[cl..];
                        continue;
                    }

                    if cl == s.len() || s[cl] < child.prefix[cl] {
                        // The key ends inside the edge, or diverges below
                        // it: everything in this subtree ranks after the
                        // key, so park on its first leaf.
                        return self.park_at_or_after(idx);
                    }

                    // Diverges above the edge: the subtree ranks before
                    // the key, move on to the next sibling.
                    return self.park_at_or_after(idx + 1);
                }

                // No edge carries the first byte: the insertion point
                // names the first sibling ranking after the key.
                Err(idx) => return self.park_at_or_after(idx),
            }
        }
    }

    // ------------------------------------------------------------------
    //  Delete at cursor
    // ------------------------------------------------------------------

    /// Remove the key the cursor is positioned on, returning its value.
    ///
    /// The tree is rewritten through the view's copy-on-write delete; the
    /// following `next`/`prev` resume at the removed key's neighbor even
    /// though merges may have reshaped the tree.
    ///
    /// # Panics
    ///
    /// Panics when the cursor is not positioned on a key; deleting through
    /// an unpositioned cursor is a caller bug.
    pub fn del(&mut self) -> Option<Arc<V>> {
        let Some(key) = self
            .path
            .last()
            .and_then(|frame| frame.node.leaf.as_ref())
            .map(|leaf| Arc::clone(&leaf.key))
        else {
            panic!("del: cursor is not positioned on a key");
        };

        let prev = self.view.del(&key);
        self.path.clear();
        self.pending = Some(key);
        prev
    }

    // ------------------------------------------------------------------
    //  Stack plumbing
    // ------------------------------------------------------------------

    /// Reset the stack to a single frame on the view's current root.
    fn rewind_to_root(&mut self) {
        self.path.clear();
        self.path.push(Frame {
            node: Arc::clone(&self.view.root),
            pos: 0,
        });
    }

    /// The key/value on the top frame's node.
    fn current(&self) -> Option<(Arc<[u8]>, Arc<V>)> {
        let leaf = self.path.last()?.node.leaf.as_ref()?;
        Some((Arc::clone(&leaf.key), Arc::clone(&leaf.value)))
    }

    fn set_top_pos(&mut self, pos: usize) {
        if let Some(top) = self.path.last_mut() {
            top.pos = pos;
        }
    }

    /// Descend from the top frame to the first (leftmost) leaf of its
    /// subtree. A node without a leaf always has edges (minimal form), so
    /// this only fails on an empty root.
    fn descend_first(&mut self) -> bool {
        loop {
            let node = match self.path.last() {
                Some(frame) => Arc::clone(&frame.node),
                None => return false,
            };

            if node.is_leaf() {
                return true;
            }

            match node.edges.first() {
                Some(edge) => self.path.push(Frame {
                    node: Arc::clone(&edge.node),
                    pos: 0,
                }),

                None => return false,
            }
        }
    }

    /// Descend from the top frame to the last (rightmost) leaf of its
    /// subtree, recording the taken edge index in each frame.
    fn descend_last(&mut self) -> bool {
        loop {
            let node = match self.path.last() {
                Some(frame) => Arc::clone(&frame.node),
                None => return false,
            };

            match node.edges.last() {
                Some(edge) => {
                    self.set_top_pos(node.edges.len() - 1);
                    self.path.push(Frame {
                        node: Arc::clone(&edge.node),
                        pos: 0,
                    });
                }

                None => return node.is_leaf(),
            }
        }
    }

    /// Park on the first leaf at or after child `from` of the top node,
    /// popping to ancestors (and their next siblings) when the node is
    /// exhausted. Clears the stack and returns `None` when no stored key
    /// remains to the right.
    fn park_at_or_after(&mut self, mut from: usize) -> Option<(Arc<[u8]>, Arc<V>)> {
        loop {
            let node = Arc::clone(&self.path.last()?.node);

            if from < node.edges.len() {
                self.set_top_pos(from);
                self.path.push(Frame {
                    node: Arc::clone(&node.edges[from].node),
                    pos: 0,
                });
                self.descend_first();
                return self.current();
            }

            self.path.pop();
            match self.path.last() {
                Some(parent) => from = parent.pos + 1,

                None => return None,
            }
        }
    }
}

// ============================================================================
//  Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use crate::tree::{Tree, View};

    fn sample() -> View<u32> {
        let mut view = Tree::new().copy();
        for (i, key) in ["ab", "abc", "abx", "b", "ba", "c"].iter().enumerate() {
            view.put(key.as_bytes(), i as u32);
        }
        view
    }

    #[test]
    fn test_empty_tree_cursor() {
        let mut view: View<u32> = Tree::new().copy();
        let mut cursor = view.cursor();

        assert!(cursor.first().is_none());
        assert!(cursor.last().is_none());
        assert!(cursor.seek(b"").is_none());
        assert!(cursor.seek(b"anything").is_none());
    }

    #[test]
    fn test_next_prev_before_positioning() {
        let mut view = sample();
        let mut cursor = view.cursor();

        assert!(cursor.next().is_none());
        assert!(cursor.prev().is_none());
    }

    #[test]
    fn test_forward_scan_is_sorted_and_complete() {
        let mut view = sample();
        let mut cursor = view.cursor();

        let mut keys = Vec::new();
        let mut entry = cursor.first();
        while let Some((k, _)) = entry {
            keys.push(k.to_vec());
            entry = cursor.next();
        }

        assert_eq!(
            keys,
            vec![
                b"ab".to_vec(),
                b"abc".to_vec(),
                b"abx".to_vec(),
                b"b".to_vec(),
                b"ba".to_vec(),
                b"c".to_vec(),
            ]
        );
    }

    #[test]
    fn test_backward_scan_mirrors_forward() {
        let mut view = sample();
        let mut cursor = view.cursor();

        let mut keys = Vec::new();
        let mut entry = cursor.last();
        while let Some((k, _)) = entry {
            keys.push(k.to_vec());
            entry = cursor.prev();
        }

        let mut expected: Vec<Vec<u8>> =
            ["ab", "abc", "abx", "b", "ba", "c"].iter().map(|s| s.as_bytes().to_vec()).collect();
        expected.reverse();
        assert_eq!(keys, expected);
    }

    #[test]
    fn test_exhausted_next_keeps_position() {
        let mut view = sample();
        let mut cursor = view.cursor();

        cursor.last();
        assert!(cursor.next().is_none());

        // Still parked on the maximum: prev steps to its neighbor.
        let (k, _) = cursor.prev().expect("predecessor");
        assert_eq!(&*k, b"ba");
    }

    #[test]
    fn test_exhausted_prev_keeps_position() {
        let mut view = sample();
        let mut cursor = view.cursor();

        cursor.first();
        assert!(cursor.prev().is_none());

        let (k, _) = cursor.next().expect("successor");
        assert_eq!(&*k, b"abc");
    }

    #[test]
    fn test_seek_exact_and_between() {
        let mut view = sample();
        let mut cursor = view.cursor();

        let (k, _) = cursor.seek(b"abc").expect("exact hit");
        assert_eq!(&*k, b"abc");

        let (k, _) = cursor.seek(b"abd").expect("successor");
        assert_eq!(&*k, b"abx");

        let (k, _) = cursor.seek(b"").expect("minimum");
        assert_eq!(&*k, b"ab");

        assert!(cursor.seek(b"cz").is_none());
    }

    #[test]
    fn test_seek_then_step_both_ways() {
        let mut view = sample();
        let mut cursor = view.cursor();

        cursor.seek(b"abx");
        let (k, _) = cursor.next().expect("next");
        assert_eq!(&*k, b"b");

        cursor.seek(b"abx");
        let (k, _) = cursor.prev().expect("prev");
        assert_eq!(&*k, b"abc");
    }

    #[test]
    fn test_del_then_next_resumes_at_successor() {
        let mut view = sample();
        let mut cursor = view.cursor();

        cursor.seek(b"abc");
        assert_eq!(cursor.del().as_deref(), Some(&1));

        let (k, _) = cursor.next().expect("successor of the removed key");
        assert_eq!(&*k, b"abx");
    }

    #[test]
    fn test_del_then_prev_resumes_at_predecessor() {
        let mut view = sample();
        let mut cursor = view.cursor();

        cursor.seek(b"abc");
        cursor.del();

        let (k, _) = cursor.prev().expect("predecessor of the removed key");
        assert_eq!(&*k, b"ab");
    }

    #[test]
    fn test_del_of_first_key_then_next() {
        let mut view = sample();
        let mut cursor = view.cursor();

        cursor.first();
        cursor.del();

        let (k, _) = cursor.next().expect("new minimum");
        assert_eq!(&*k, b"abc");
        assert!(cursor.prev().is_none());
    }

    #[test]
    fn test_del_of_last_key_then_prev() {
        let mut view = sample();
        let mut cursor = view.cursor();

        cursor.last();
        cursor.del();

        let (k, _) = cursor.prev().expect("new maximum");
        assert_eq!(&*k, b"ba");
        assert!(cursor.next().is_none());
    }

    #[test]
    fn test_drain_forward_with_del() {
        let mut view = sample();
        let mut cursor = view.cursor();

        let mut removed = Vec::new();
        let mut entry = cursor.first();
        while let Some((k, _)) = entry {
            removed.push(k.to_vec());
            cursor.del();
            entry = cursor.next();
        }
        drop(cursor);

        assert_eq!(removed.len(), 6);
        assert_eq!(view.size(), 0);
        assert!(view.get(b"ab").is_none());
    }

    #[test]
    #[should_panic(expected = "not positioned")]
    fn test_del_unpositioned_panics() {
        let mut view = sample();
        let mut cursor = view.cursor();
        cursor.del();
    }

    #[test]
    fn test_cursor_sees_empty_key() {
        let mut view: View<u32> = Tree::new().copy();
        view.put(b"", 0);
        view.put(b"a", 1);

        let mut cursor = view.cursor();
        let (k, _) = cursor.first().expect("empty key first");
        assert_eq!(&*k, b"");

        let (k, _) = cursor.next().expect("then the rest");
        assert_eq!(&*k, b"a");

        let (k, _) = cursor.prev().expect("back to the root leaf");
        assert_eq!(&*k, b"");
    }
}
