//! Counting trie holding every corpus statistic
//!
//! Each node counts the insertions that passed through it, so
//! `count(child) <= count(parent)` holds everywhere and the mass that stops
//! exactly at a node is `count(node) - Σ count(child)` (the effective end count).
//!
//! Removal is the inverse of weighted insertion: occurrences are taken off
//! every node on the path and nodes left with a zero count are pruned.
//!
//! Nodes live in an arena (`Vec<Node>`) and reference children by [`NodeId`].
//! The trie is the sole owner of every node; removed nodes go to a free list
//! and are reused by later insertions. A `NodeId` is a stable identity only
//! while the trie is not mutated.
//!
//! The root is counted like every other node (it is passed through by every
//! insertion), which keeps the count invariant uniform and gives the root a
//! well-defined branching entropy.

use std::collections::BTreeMap;

/// Identity of a node inside one [`StatTrie`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// The root node, never removed
    pub const ROOT: NodeId = NodeId(0);

    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Default)]
struct Node {
    /// Ordered by character so traversal order is reproducible
    children: BTreeMap<char, NodeId>,
    count: u64,
    is_end: bool,
}

impl Node {
    fn reset(&mut self) {
        self.children.clear();
        self.count = 0;
        self.is_end = false;
    }
}

/// Prefix tree augmented with occurrence counts
#[derive(Debug, Clone)]
pub struct StatTrie {
    nodes: Vec<Node>,
    free_list: Vec<usize>,
    /// Live nodes, root included
    count_nodes: usize,
    count_unique_word_chars: u64,
    count_unique_words: u64,
    /// Including duplicates
    count_inserted_words: u64,
}

/// Read-only view of one node
#[derive(Debug, Clone, Copy)]
pub struct NodeRef<'a> {
    trie: &'a StatTrie,
    id: NodeId,
}

impl<'a> NodeRef<'a> {
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Number of insertions that passed through this node
    pub fn count(&self) -> u64 {
        self.node().count
    }

    pub fn is_end(&self) -> bool {
        self.node().is_end
    }

    pub fn is_leaf(&self) -> bool {
        self.node().children.is_empty()
    }

    /// Children in ascending character order
    pub fn children(&self) -> impl Iterator<Item = (char, NodeRef<'a>)> + 'a {
        let trie = self.trie;
        trie.nodes[self.id.0]
            .children
            .iter()
            .map(move |(&c, &id)| (c, NodeRef { trie, id }))
    }

    pub fn child(&self, c: char) -> Option<NodeRef<'a>> {
        let id = *self.node().children.get(&c)?;
        Some(NodeRef {
            trie: self.trie,
            id,
        })
    }

    /// Sum of the children's counts
    pub fn children_count(&self) -> u64 {
        self.children().map(|(_, child)| child.count()).sum()
    }

    /// Insertions that terminate exactly here
    pub fn effective_end_count(&self) -> u64 {
        self.count().saturating_sub(self.children_count())
    }

    fn node(&self) -> &'a Node {
        &self.trie.nodes[self.id.0]
    }
}

impl StatTrie {
    /// Create an empty trie holding only the root
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::default()],
            free_list: Vec::new(),
            count_nodes: 1,
            count_unique_word_chars: 0,
            count_unique_words: 0,
            count_inserted_words: 0,
        }
    }

    /// Insert one occurrence of `word`
    pub fn insert(&mut self, word: &str) {
        self.insert_weighted(word, 1);
    }

    /// Insert `weight` occurrences of `word` at once
    ///
    /// Empty words and a zero weight are no-ops.
    pub fn insert_weighted(&mut self, word: &str, weight: u64) {
        if word.is_empty() || weight == 0 {
            return;
        }

        let mut current = NodeId::ROOT;
        self.nodes[current.0].count += weight;
        let mut len = 0u64;

        for c in word.chars() {
            let next = match self.nodes[current.0].children.get(&c) {
                Some(&id) => id,
                None => {
                    let id = self.allocate_node();
                    self.nodes[current.0].children.insert(c, id);
                    id
                }
            };
            self.nodes[next.0].count += weight;
            current = next;
            len += 1;
        }

        let last = &mut self.nodes[current.0];
        if !last.is_end {
            last.is_end = true;
            self.count_unique_words += 1;
            self.count_unique_word_chars += len;
        }
        self.count_inserted_words += weight;
    }

    /// `true` if `word` was inserted and not removed since
    pub fn contains(&self, word: &str) -> bool {
        self.find(word)
            .is_some_and(|id| self.nodes[id.0].is_end)
    }

    /// `true` if some stored word starts with `prefix`
    pub fn starts_with(&self, prefix: &str) -> bool {
        self.find(prefix).is_some()
    }

    /// Node reached by following `path` from the root
    pub fn find(&self, path: &str) -> Option<NodeId> {
        let mut current = NodeId::ROOT;
        for c in path.chars() {
            current = *self.nodes[current.0].children.get(&c)?;
        }
        Some(current)
    }

    /// Remove one occurrence of `word`
    ///
    /// Returns `false` (and leaves the trie untouched) when `word` is not
    /// stored.
    pub fn remove(&mut self, word: &str) -> bool {
        self.remove_weighted(word, 1)
    }

    /// Remove every occurrence of `word` that ends exactly at its node
    ///
    /// Subtracts the node's effective end count from each node on the path,
    /// so words continuing past `word` keep their counts.
    pub fn remove_all(&mut self, word: &str) -> bool {
        self.remove_weighted(word, u64::MAX)
    }

    /// Remove up to `weight` occurrences of `word`
    ///
    /// The amount removed is capped at the effective end count. Nodes whose
    /// count drops to zero are pruned bottom-up; the root is only
    /// decremented. Once no occurrence is left the node stops being terminal.
    pub fn remove_weighted(&mut self, word: &str, weight: u64) -> bool {
        if word.is_empty() || weight == 0 {
            return false;
        }

        let mut path: Vec<(NodeId, char, NodeId)> = Vec::new();
        let mut current = NodeId::ROOT;
        for c in word.chars() {
            let Some(&next) = self.nodes[current.0].children.get(&c) else {
                return false;
            };
            path.push((current, c, next));
            current = next;
        }

        if !self.nodes[current.0].is_end {
            return false;
        }

        let end_count = self.node(current).effective_end_count();
        let removed = weight.min(end_count);
        if removed == end_count {
            self.nodes[current.0].is_end = false;
            self.count_unique_words -= 1;
            self.count_unique_word_chars -= path.len() as u64;
        }

        while let Some((parent, c, child)) = path.pop() {
            let node = &mut self.nodes[child.0];
            node.count -= removed.min(node.count);
            if node.count == 0 {
                self.nodes[parent.0].children.remove(&c);
                self.release_subtree(child);
            }
        }
        let root = &mut self.nodes[NodeId::ROOT.0];
        root.count -= removed.min(root.count);

        self.count_inserted_words -= removed.min(self.count_inserted_words);
        true
    }

    /// Drop every node and reset all totals
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.nodes.push(Node::default());
        self.free_list.clear();
        self.count_nodes = 1;
        self.count_unique_word_chars = 0;
        self.count_unique_words = 0;
        self.count_inserted_words = 0;
    }

    pub fn root(&self) -> NodeRef<'_> {
        self.node(NodeId::ROOT)
    }

    /// View of a node by identity
    ///
    /// # Panics
    /// When `id` does not belong to this trie.
    pub fn node(&self, id: NodeId) -> NodeRef<'_> {
        debug_assert!(id.0 < self.nodes.len());
        NodeRef { trie: self, id }
    }

    /// Preorder depth-first walk over every node, root first with prefix `""`
    ///
    /// Children are visited in ascending character order. Implemented with
    /// an explicit stack so arbitrarily long words cannot overflow the call
    /// stack.
    pub fn traverse<F>(&self, mut callback: F)
    where
        F: FnMut(NodeRef<'_>, &str),
    {
        let mut prefix = String::new();
        // (node, prefix byte length before its edge, edge)
        let mut stack: Vec<(NodeId, usize, Option<char>)> = vec![(NodeId::ROOT, 0, None)];

        while let Some((id, len, edge)) = stack.pop() {
            prefix.truncate(len);
            if let Some(c) = edge {
                prefix.push(c);
            }
            callback(self.node(id), &prefix);

            let len = prefix.len();
            for (&c, &child) in self.nodes[id.0].children.iter().rev() {
                stack.push((child, len, Some(c)));
            }
        }
    }

    /// Walk only the path spelled by `prefix`
    ///
    /// Invokes `callback` for the root and once per consumed character.
    /// Stops quietly at the first missing character; returns whether the
    /// whole prefix was consumed.
    pub fn traverse_prefix<F>(&self, prefix: &str, mut callback: F) -> bool
    where
        F: FnMut(NodeRef<'_>, &str),
    {
        let mut current = NodeId::ROOT;
        callback(self.node(current), "");

        for (pos, c) in prefix.char_indices() {
            let Some(&next) = self.nodes[current.0].children.get(&c) else {
                return false;
            };
            current = next;
            callback(self.node(current), &prefix[..pos + c.len_utf8()]);
        }
        true
    }

    pub fn total_nodes(&self) -> usize {
        self.count_nodes
    }

    pub fn total_unique_word_characters(&self) -> u64 {
        self.count_unique_word_chars
    }

    pub fn total_inserted_words(&self) -> u64 {
        self.count_inserted_words
    }

    pub fn total_unique_words(&self) -> u64 {
        self.count_unique_words
    }

    pub fn is_empty(&self) -> bool {
        self.count_unique_words == 0
    }

    fn allocate_node(&mut self) -> NodeId {
        self.count_nodes += 1;
        if let Some(idx) = self.free_list.pop() {
            self.nodes[idx].reset();
            NodeId(idx)
        } else {
            self.nodes.push(Node::default());
            NodeId(self.nodes.len() - 1)
        }
    }

    /// Recycle a detached node and anything still hanging below it
    fn release_subtree(&mut self, id: NodeId) {
        let mut pending = vec![id];
        while let Some(id) = pending.pop() {
            let node = &mut self.nodes[id.0];
            pending.extend(node.children.values().copied());
            node.reset();
            self.free_list.push(id.0);
            self.count_nodes -= 1;
        }
    }
}

impl Default for StatTrie {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: AsRef<str>> FromIterator<S> for StatTrie {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut trie = StatTrie::new();
        trie.extend(iter);
        trie
    }
}

impl<S: AsRef<str>> Extend<S> for StatTrie {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        for word in iter {
            self.insert(word.as_ref());
        }
    }
}
