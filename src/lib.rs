//! # lexitree-rs
//!
//! A linked binary search tree over words, ordered by a fractional numeric
//! fingerprint of each word rather than by the strings themselves.
//!
//! Every stored item is lowercased and mapped to an [`OrderKey`]: the first
//! character dominates the key and each following character acts as a
//! tie-breaker weighted down by a factor of 1000 per position. The result
//! approximates lexicographic order for short, similar-length words. The tree
//! never balances itself on mutation; callers invoke [`LexiTree::rebalance`]
//! explicitly when they want a height-minimal shape.
//!
//! ## Example
//!
//! ```rust
//! use lexitree_rs::LexiTree;
//!
//! let mut tree = LexiTree::new();
//! tree.add("dog");
//! tree.add("cat");
//! tree.add("bird");
//!
//! assert_eq!(tree.find("cat"), Some("cat"));
//! assert_eq!(tree.len(), 3);
//!
//! tree.rebalance();
//! assert!(tree.is_balanced());
//! ```

use std::cmp::Ordering;
use std::collections::VecDeque;
use std::fmt;
use std::mem;

use thiserror::Error;

// =============================================================================
// Errors
// =============================================================================

/// Errors returned by mutating operations.
///
/// Plain absence during a lookup (`find`, `replace`, `successor`,
/// `predecessor`) is an expected outcome and surfaces as `None`; this type is
/// reserved for call-site precondition violations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    /// Removal was requested for an item the tree does not hold. Carries the
    /// normalized form of the missing item.
    #[error("item not in tree: {0}")]
    MissingItem(String),
}

// =============================================================================
// OrderKey
// =============================================================================

/// Numeric fingerprint of a word, used for every ordering comparison in the
/// tree.
///
/// The input is lowercased, then each character contributes
/// `(code_point - 96) * weight` where the weight starts at 1.0 and shrinks by
/// a factor of 1000 per position. `'a'` ranks 1 through `'z'` at 26;
/// characters outside that range (digits, punctuation) still rank by code
/// point and may be negative, matching the derivation's origin.
///
/// The key approximates lexicographic order but is not exact for all inputs:
/// once the positional weight underflows `f64` precision (roughly position
/// six onward), distinct suffixes stop being distinguishable and long words
/// can collide or invert lexicographic order. That is an intrinsic property
/// of the fingerprint, not something the tree compensates for.
#[derive(Clone, Copy, Debug)]
pub struct OrderKey(f64);

impl OrderKey {
    /// Derives the fingerprint of `item`. Deterministic, pure, and
    /// case-insensitive. The tree computes this once per item at node
    /// creation and caches it.
    pub fn derive(item: &str) -> Self {
        let mut num = 0.0f64;
        let mut weight = 1.0f64;
        for ch in item.to_lowercase().chars() {
            num += (ch as u32 as f64 - 96.0) * weight;
            weight /= 1000.0;
        }
        OrderKey(num)
    }

    /// The raw fingerprint value.
    #[inline]
    pub fn value(self) -> f64 {
        self.0
    }
}

// Derived keys are finite sums, but total_cmp keeps the order total without
// hand-picking through float corner cases.
impl PartialEq for OrderKey {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.0.total_cmp(&other.0) == Ordering::Equal
    }
}

impl Eq for OrderKey {}

impl PartialOrd for OrderKey {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OrderKey {
    #[inline]
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

// =============================================================================
// Node
// =============================================================================

/// One stored item with its cached key and exclusively owned subtrees.
struct Node {
    /// The stored word, case-normalized.
    item: String,
    key: OrderKey,
    left: Option<Box<Node>>,
    right: Option<Box<Node>>,
}

impl Node {
    fn new(item: &str) -> Self {
        let item = item.to_lowercase();
        let key = OrderKey::derive(&item);
        Node {
            item,
            key,
            left: None,
            right: None,
        }
    }

    /// Deep-copies a subtree without recursing on its depth.
    ///
    /// Postorder over the source with an explicit stack: by the time a node
    /// is revisited, the clones of its subtrees sit on top of `built` (right
    /// above left) and get popped into place.
    fn clone_subtree(src: Option<&Node>) -> Option<Box<Node>> {
        let mut work: Vec<(&Node, bool)> = Vec::new();
        let mut built: Vec<Box<Node>> = Vec::new();
        if let Some(node) = src {
            work.push((node, false));
        }
        while let Some((node, expanded)) = work.pop() {
            if expanded {
                let right = node.right.is_some().then(|| built.pop().unwrap());
                let left = node.left.is_some().then(|| built.pop().unwrap());
                built.push(Box::new(Node {
                    item: node.item.clone(),
                    key: node.key,
                    left,
                    right,
                }));
            } else {
                work.push((node, true));
                if let Some(right) = node.right.as_deref() {
                    work.push((right, false));
                }
                if let Some(left) = node.left.as_deref() {
                    work.push((left, false));
                }
            }
        }
        built.pop()
    }
}

// =============================================================================
// LexiTree
// =============================================================================

/// A linked binary search tree keyed by [`OrderKey`] fingerprints.
///
/// Ordering invariant: for every node, all keys in its left subtree compare
/// `<=` the node's key and all keys in its right subtree compare `>=` it.
/// Insertion routes duplicates to the right, so the tree is a multiset at the
/// structural level; `find` only ever returns the first match on the descent
/// path.
///
/// All traversal is iterative (explicit stacks and queues), so degenerate
/// chains never risk call-stack exhaustion. Single-threaded: mutation takes
/// `&mut self`, and no internal sharing exists to protect.
pub struct LexiTree {
    root: Option<Box<Node>>,
    size: usize,
}

impl LexiTree {
    /// Creates an empty tree.
    pub fn new() -> Self {
        LexiTree {
            root: None,
            size: 0,
        }
    }

    /// Number of stored items, counting duplicates.
    #[inline]
    pub fn len(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Removes every item.
    pub fn clear(&mut self) {
        // Box's drop glue recurses one frame per tree level; a worklist keeps
        // teardown of degenerate chains off the call stack.
        let mut pending = Vec::new();
        if let Some(root) = self.root.take() {
            pending.push(root);
        }
        while let Some(mut node) = pending.pop() {
            if let Some(left) = node.left.take() {
                pending.push(left);
            }
            if let Some(right) = node.right.take() {
                pending.push(right);
            }
        }
        self.size = 0;
    }

    // -------------------------------------------------------------------------
    // Search
    // -------------------------------------------------------------------------

    /// Returns the stored (normalized) item matching `item`'s key, or `None`.
    ///
    /// Descends from the root until a match or an absent child, comparing the
    /// derived key at every level.
    pub fn find(&self, item: &str) -> Option<&str> {
        self.find_node(OrderKey::derive(item))
            .map(|node| node.item.as_str())
    }

    /// Membership is defined as "`find` succeeds".
    #[inline]
    pub fn contains(&self, item: &str) -> bool {
        self.find(item).is_some()
    }

    fn find_node(&self, key: OrderKey) -> Option<&Node> {
        let mut cur = self.root.as_deref();
        while let Some(node) = cur {
            match key.cmp(&node.key) {
                Ordering::Equal => return Some(node),
                Ordering::Less => cur = node.left.as_deref(),
                Ordering::Greater => cur = node.right.as_deref(),
            }
        }
        None
    }

    // -------------------------------------------------------------------------
    // Mutation
    // -------------------------------------------------------------------------

    /// Inserts `item`, case-normalized. Strictly smaller keys go left,
    /// everything else (ties included) goes right. Size always grows by one;
    /// `add` enforces no uniqueness.
    pub fn add(&mut self, item: &str) {
        let node = Box::new(Node::new(item));
        let mut link = &mut self.root;
        while let Some(cur) = link {
            link = if node.key < cur.key {
                &mut cur.left
            } else {
                &mut cur.right
            };
        }
        *link = Some(node);
        self.size += 1;
    }

    /// Removes the first node matching `item`'s key and returns its stored
    /// item.
    ///
    /// Removing an absent item is a precondition violation and returns
    /// [`TreeError::MissingItem`] with the tree untouched; the target link is
    /// located before any splicing begins.
    pub fn remove(&mut self, item: &str) -> Result<String, TreeError> {
        let key = OrderKey::derive(item);

        // The root link is the uniform handle here: descending over owning
        // links means removing the root needs no special casing.
        let mut link = &mut self.root;
        while link.as_ref().map_or(false, |node| key != node.key) {
            let node = link.as_mut().unwrap();
            link = if key < node.key {
                &mut node.left
            } else {
                &mut node.right
            };
        }
        if link.is_none() {
            return Err(TreeError::MissingItem(item.to_lowercase()));
        }

        self.size -= 1;
        let node = link.as_mut().unwrap();
        if node.left.is_some() && node.right.is_some() {
            // Two children: lift the maximum of the left subtree into this
            // slot (item and key, not the node itself), then splice the max
            // node's left child into the spot it vacated.
            let mut max = Self::detach_max(&mut node.left);
            node.key = max.key;
            Ok(mem::replace(&mut node.item, mem::take(&mut max.item)))
        } else {
            // At most one child: reattach it (or nothing) to the target's
            // link.
            let node = link.take().unwrap();
            let Node {
                item, left, right, ..
            } = *node;
            *link = left.or(right);
            Ok(item)
        }
    }

    /// Detaches the maximum node of a non-empty subtree. A maximum has no
    /// right child, so its left child takes over the vacated link.
    fn detach_max(subtree: &mut Option<Box<Node>>) -> Box<Node> {
        let mut link = subtree;
        while link.as_ref().map_or(false, |node| node.right.is_some()) {
            link = &mut link.as_mut().unwrap().right;
        }
        let mut max = link.take().unwrap();
        *link = max.left.take();
        max
    }

    /// Replaces the first node matching `item`'s key with `new_item` in
    /// place, returning the previous item, or `None` if absent.
    ///
    /// The node keeps its position: no re-validation of local ordering
    /// happens even when `new_item`'s key disagrees with the surrounding
    /// structure. Keeping the ordering invariant intact is the caller's
    /// contract.
    pub fn replace(&mut self, item: &str, new_item: &str) -> Option<String> {
        let key = OrderKey::derive(item);
        let mut cur = self.root.as_deref_mut();
        while let Some(node) = cur {
            match key.cmp(&node.key) {
                Ordering::Equal => {
                    node.key = OrderKey::derive(new_item);
                    return Some(mem::replace(&mut node.item, new_item.to_lowercase()));
                }
                Ordering::Less => cur = node.left.as_deref_mut(),
                Ordering::Greater => cur = node.right.as_deref_mut(),
            }
        }
        None
    }

    // -------------------------------------------------------------------------
    // Traversal
    // -------------------------------------------------------------------------

    /// Preorder traversal (node, left, right). The default iteration order.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            stack: self.root.as_deref().into_iter().collect(),
        }
    }

    /// Inorder traversal (left, node, right): items ascend by key. The
    /// canonical sorted-contents accessor.
    pub fn inorder(&self) -> Inorder<'_> {
        Inorder(self.inorder_nodes())
    }

    /// Postorder traversal (left, right, node).
    pub fn postorder(&self) -> Postorder<'_> {
        Postorder {
            stack: self
                .root
                .as_deref()
                .map(|root| (root, false))
                .into_iter()
                .collect(),
        }
    }

    /// Level-order traversal: breadth-first, shallower nodes first, left to
    /// right within a depth.
    pub fn levelorder(&self) -> LevelOrder<'_> {
        LevelOrder {
            queue: self.root.as_deref().into_iter().collect(),
        }
    }

    fn inorder_nodes(&self) -> InorderNodes<'_> {
        InorderNodes {
            stack: Vec::new(),
            descend: self.root.as_deref(),
        }
    }

    // -------------------------------------------------------------------------
    // Ordered queries
    // -------------------------------------------------------------------------

    /// All stored items whose key lies in `[key(low), key(high)]`, each
    /// exactly once, in ascending key order.
    ///
    /// A full traversal plus filter: O(n) regardless of tree shape.
    pub fn range_find(&self, low: &str, high: &str) -> Vec<&str> {
        let low = OrderKey::derive(low);
        let high = OrderKey::derive(high);
        self.inorder_nodes()
            .filter(|node| low <= node.key && node.key <= high)
            .map(|node| node.item.as_str())
            .collect()
    }

    /// The stored item with the smallest key strictly greater than
    /// `key(item)`, or `None`. The query item need not be stored.
    pub fn successor(&self, item: &str) -> Option<&str> {
        let key = OrderKey::derive(item);
        self.inorder_nodes()
            .find(|node| node.key > key)
            .map(|node| node.item.as_str())
    }

    /// The stored item with the largest key strictly smaller than
    /// `key(item)`, or `None`.
    pub fn predecessor(&self, item: &str) -> Option<&str> {
        let key = OrderKey::derive(item);
        self.inorder_nodes()
            .take_while(|node| node.key < key)
            .last()
            .map(|node| node.item.as_str())
    }

    // -------------------------------------------------------------------------
    // Shape
    // -------------------------------------------------------------------------

    /// Maximum depth of any node below the root. A root-only tree (and an
    /// empty one) has height 0.
    ///
    /// Consistent with the [`Display`](fmt::Display) rendering: the height
    /// equals the maximum number of `"| "` markers on any rendered line.
    pub fn height(&self) -> usize {
        let mut max_depth = 0;
        let mut stack = Vec::new();
        if let Some(root) = self.root.as_deref() {
            stack.push((root, 0usize));
        }
        while let Some((node, depth)) = stack.pop() {
            max_depth = max_depth.max(depth);
            if let Some(left) = node.left.as_deref() {
                stack.push((left, depth + 1));
            }
            if let Some(right) = node.right.as_deref() {
                stack.push((right, depth + 1));
            }
        }
        max_depth
    }

    /// Whether `height() < 2 * log2(len + 1) - 1`.
    ///
    /// An admissibility check, never an enforcement mechanism; the tree does
    /// not balance itself on mutation. An empty tree fails the formula
    /// (`0 < -1`) and reports unbalanced.
    pub fn is_balanced(&self) -> bool {
        (self.height() as f64) < 2.0 * ((self.size + 1) as f64).log2() - 1.0
    }

    /// Rebuilds the tree into a height-minimal shape.
    ///
    /// Captures the contents in ascending key order, clears, then reinserts
    /// by recursive median split. The resulting height is within one of the
    /// theoretical minimum for the item count.
    pub fn rebalance(&mut self) {
        let items: Vec<String> = self.inorder().map(str::to_owned).collect();
        self.clear();
        self.add_median(&items);
    }

    /// Inserts the middle element of `items`, then recurses on both halves.
    /// A half of length 1 is inserted directly; an empty half is skipped.
    fn add_median(&mut self, items: &[String]) {
        match items {
            [] => {}
            [only] => self.add(only),
            _ => {
                let mid = items.len() / 2;
                let (lower, upper) = (&items[..mid], &items[mid + 1..]);
                self.add(&items[mid]);
                self.add_median(lower);
                self.add_median(upper);
            }
        }
    }
}

impl Default for LexiTree {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for LexiTree {
    // Derived Clone would recurse once per level and overflow on long chains,
    // so the copy runs over the same kind of worklist the traversals use.
    fn clone(&self) -> Self {
        LexiTree {
            root: Node::clone_subtree(self.root.as_deref()),
            size: self.size,
        }
    }
}

impl Drop for LexiTree {
    fn drop(&mut self) {
        self.clear();
    }
}

impl<S: AsRef<str>> Extend<S> for LexiTree {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        for item in iter {
            self.add(item.as_ref());
        }
    }
}

impl<S: AsRef<str>> FromIterator<S> for LexiTree {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut tree = LexiTree::new();
        tree.extend(iter);
        tree
    }
}

impl<'a> IntoIterator for &'a LexiTree {
    type Item = &'a str;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Iter<'a> {
        self.iter()
    }
}

impl fmt::Debug for LexiTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.inorder()).finish()
    }
}

/// Renders the tree rotated 90 degrees counterclockwise: the right subtree
/// prints first (deeper lines higher up), each line carries one `"| "` marker
/// per depth level, then the item. [`LexiTree::height`] counts the same
/// levels, so the deepest line's marker count equals the height.
impl fmt::Display for LexiTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Reverse-inorder with an explicit stack; the bool marks re-visits
        // that emit the node's own line.
        let mut stack = Vec::new();
        if let Some(root) = self.root.as_deref() {
            stack.push((root, 0usize, false));
        }
        while let Some((node, depth, emit)) = stack.pop() {
            if emit {
                writeln!(f, "{}{}", "| ".repeat(depth), node.item)?;
                continue;
            }
            if let Some(left) = node.left.as_deref() {
                stack.push((left, depth + 1, false));
            }
            stack.push((node, depth, true));
            if let Some(right) = node.right.as_deref() {
                stack.push((right, depth + 1, false));
            }
        }
        Ok(())
    }
}

// =============================================================================
// Traversal iterators
// =============================================================================
//
// All four traversals are lazy views over live structure: each call to the
// accessor re-walks from the root, yielding a fresh, restartable sequence.

/// Preorder iterator. Pushes the right child before the left so the left
/// subtree is processed first.
pub struct Iter<'a> {
    stack: Vec<&'a Node>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        let node = self.stack.pop()?;
        if let Some(right) = node.right.as_deref() {
            self.stack.push(right);
        }
        if let Some(left) = node.left.as_deref() {
            self.stack.push(left);
        }
        Some(node.item.as_str())
    }
}

/// Inorder node iterator: the left spine is stacked on the way down, and each
/// popped node hands descent over to its right subtree.
struct InorderNodes<'a> {
    stack: Vec<&'a Node>,
    descend: Option<&'a Node>,
}

impl<'a> Iterator for InorderNodes<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<&'a Node> {
        while let Some(node) = self.descend {
            self.stack.push(node);
            self.descend = node.left.as_deref();
        }
        let node = self.stack.pop()?;
        self.descend = node.right.as_deref();
        Some(node)
    }
}

/// Inorder iterator: items in ascending key order.
pub struct Inorder<'a>(InorderNodes<'a>);

impl<'a> Iterator for Inorder<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        self.0.next().map(|node| node.item.as_str())
    }
}

/// Postorder iterator. Each node is stacked twice: once to expand its
/// children, once (marked) to emit it after both subtrees.
pub struct Postorder<'a> {
    stack: Vec<(&'a Node, bool)>,
}

impl<'a> Iterator for Postorder<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        loop {
            let (node, expanded) = self.stack.pop()?;
            if expanded {
                return Some(node.item.as_str());
            }
            self.stack.push((node, true));
            if let Some(right) = node.right.as_deref() {
                self.stack.push((right, false));
            }
            if let Some(left) = node.left.as_deref() {
                self.stack.push((left, false));
            }
        }
    }
}

/// Level-order iterator: breadth-first over a queue.
pub struct LevelOrder<'a> {
    queue: VecDeque<&'a Node>,
}

impl<'a> Iterator for LevelOrder<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        let node = self.queue.pop_front()?;
        if let Some(left) = node.left.as_deref() {
            self.queue.push_back(left);
        }
        if let Some(right) = node.right.as_deref() {
            self.queue.push_back(right);
        }
        Some(node.item.as_str())
    }
}

// =============================================================================
// Tests
// =============================================================================


#[cfg(test)]
mod proptests;
