//! JSON export of the trie, full or trimmed to anomalous paths
//!
//! Node schema: `{id, isEnd, count, color, children: {char -> node}}`.
//! The root carries `label: "root"`. In the trimmed view every child subtree
//! without a marked node collapses into a single `"..."` placeholder with
//! empty children.
//!
//! Identifiers are handed out in preorder over the real trie, collapsed
//! subtrees included, so a retained node has the same `id` in the trimmed and
//! the full export.
//!
//! A word of n characters is a chain of n nodes. Building, serializing and
//! dropping exported trees therefore all run on explicit stacks.

use crate::analysis::{AnomalyAxis, Mode, NodeSet};
use crate::error::{Result, StatTrieError};
use crate::trie::{NodeRef, StatTrie};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// Label and edge key of a collapsed subtree
pub const COLLAPSED_LABEL: &str = "...";
pub const ROOT_LABEL: &str = "root";

pub const MARKED_COLOR: &str = "red";
pub const END_COLOR: &str = "blue";
pub const DEFAULT_COLOR: &str = "black";

/// One exported node
///
/// `None` fields are omitted from the JSON output.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeNode {
    pub label: Option<String>,
    pub id: Option<usize>,
    pub is_end: Option<bool>,
    pub count: Option<u64>,
    pub color: Option<String>,
    /// Set only by the full export
    pub is_anomaly: Option<bool>,
    pub children: BTreeMap<String, TreeNode>,
}

impl TreeNode {
    fn from_node(node: NodeRef<'_>, id: usize, marked: &NodeSet) -> Self {
        let color = if marked.contains(&node.id()) {
            MARKED_COLOR
        } else if node.is_end() {
            END_COLOR
        } else {
            DEFAULT_COLOR
        };
        Self {
            label: None,
            id: Some(id),
            is_end: Some(node.is_end()),
            count: Some(node.count()),
            color: Some(color.to_string()),
            is_anomaly: None,
            children: BTreeMap::new(),
        }
    }

    /// Placeholder standing in for every pruned sibling subtree
    pub fn collapsed() -> Self {
        Self {
            label: Some(COLLAPSED_LABEL.to_string()),
            id: None,
            is_end: None,
            count: None,
            color: None,
            is_anomaly: None,
            children: BTreeMap::new(),
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.label.as_deref() == Some(COLLAPSED_LABEL)
    }

    /// Number of nodes in this subtree, placeholders included
    pub fn node_count(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(node.children.values());
        }
        count
    }
}

impl Drop for TreeNode {
    fn drop(&mut self) {
        let mut pending: Vec<TreeNode> = std::mem::take(&mut self.children).into_values().collect();
        while let Some(mut node) = pending.pop() {
            pending.extend(std::mem::take(&mut node.children).into_values());
        }
    }
}

/// Exported document: corpus totals plus the root node
#[derive(Debug, Clone, PartialEq)]
pub struct TreeDocument {
    pub total_nodes: usize,
    pub total_unique_words: u64,
    pub total_inserted_words: u64,
    pub root: TreeNode,
}

impl TreeDocument {
    fn new(trie: &StatTrie, root: TreeNode) -> Self {
        Self {
            total_nodes: trie.total_nodes(),
            total_unique_words: trie.total_unique_words(),
            total_inserted_words: trie.total_inserted_words(),
            root,
        }
    }

    /// Compact JSON; indentation would grow with the depth of long words
    pub fn to_json(&self) -> Result<String> {
        let mut out = String::from("{");
        push_field(&mut out, "totalNodes", &self.total_nodes.to_string());
        push_field(&mut out, "totalUniqueWords", &self.total_unique_words.to_string());
        push_field(&mut out, "totalInsertedWords", &self.total_inserted_words.to_string());
        out.push_str("\"root\":");
        write_tree(&mut out, &self.root)?;
        out.push('}');
        Ok(out)
    }

    /// Write the document; nothing is created when serialization fails
    pub fn write_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let json = self.to_json()?;
        fs::write(path, json).map_err(|e| StatTrieError::io(path, e))?;
        tracing::info!(path = %path.display(), "tree exported");
        Ok(())
    }
}

enum Step<'a> {
    Open {
        key: Option<&'a str>,
        node: &'a TreeNode,
        first: bool,
    },
    Close,
}

fn push_field(out: &mut String, name: &str, value: &str) {
    out.push('"');
    out.push_str(name);
    out.push_str("\":");
    out.push_str(value);
    out.push(',');
}

/// Serialize `root` as a compact object appended to `out`
///
/// Strings go through `serde_json` for escaping; the nesting is driven by
/// an explicit stack of open and close steps.
fn write_tree(out: &mut String, root: &TreeNode) -> Result<()> {
    let mut stack = vec![Step::Open {
        key: None,
        node: root,
        first: true,
    }];

    while let Some(step) = stack.pop() {
        match step {
            Step::Open { key, node, first } => {
                if let Some(key) = key {
                    if !first {
                        out.push(',');
                    }
                    out.push_str(&serde_json::to_string(key)?);
                    out.push(':');
                }
                out.push('{');
                if let Some(label) = &node.label {
                    push_field(out, "label", &serde_json::to_string(label)?);
                }
                if let Some(id) = node.id {
                    push_field(out, "id", &id.to_string());
                }
                if let Some(is_end) = node.is_end {
                    push_field(out, "isEnd", &is_end.to_string());
                }
                if let Some(count) = node.count {
                    push_field(out, "count", &count.to_string());
                }
                if let Some(color) = &node.color {
                    push_field(out, "color", &serde_json::to_string(color)?);
                }
                if let Some(is_anomaly) = node.is_anomaly {
                    push_field(out, "isAnomaly", &is_anomaly.to_string());
                }
                out.push_str("\"children\":{");

                if node.children.is_empty() {
                    out.push_str("}}");
                } else {
                    stack.push(Step::Close);
                    for (i, (key, child)) in node.children.iter().enumerate().rev() {
                        stack.push(Step::Open {
                            key: Some(key.as_str()),
                            node: child,
                            first: i == 0,
                        });
                    }
                }
            }
            Step::Close => out.push_str("}}"),
        }
    }
    Ok(())
}

/// Which tree view to export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TreeSelection {
    /// Every node, with anomaly flags
    Complete,
    /// Trimmed to the nodes marked under a mode
    Partial(Mode),
}

impl TreeSelection {
    /// Default file name inside the output directory
    pub fn file_name(self) -> &'static str {
        match self {
            TreeSelection::Complete => "complete_trie.json",
            TreeSelection::Partial(Mode::All) => "partial_trie.json",
            TreeSelection::Partial(Mode::Axis(axis)) => match axis {
                AnomalyAxis::Frequency => "frequency_anomalies_trie.json",
                AnomalyAxis::Length => "length_anomalies_trie.json",
                AnomalyAxis::Entropy => "entropy_anomalies_trie.json",
            },
        }
    }

    /// Mode whose marked nodes drive this view
    pub fn mode(self) -> Mode {
        match self {
            TreeSelection::Complete => Mode::All,
            TreeSelection::Partial(mode) => mode,
        }
    }
}

impl FromStr for TreeSelection {
    type Err = StatTrieError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "complete" | "full" => Ok(TreeSelection::Complete),
            "partial" => Ok(TreeSelection::Partial(Mode::All)),
            other => other.parse::<Mode>().map(TreeSelection::Partial),
        }
    }
}

/// Trimmed view keeping only root-to-marked-node paths
pub fn trim_tree(trie: &StatTrie, marked: &NodeSet) -> TreeNode {
    build_tree(trie, marked, View::Trimmed)
}

/// Full view; every node flagged by identity lookup in `marked`
pub fn full_tree(trie: &StatTrie, marked: &NodeSet) -> TreeNode {
    build_tree(trie, marked, View::Full)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum View {
    Trimmed,
    Full,
}

/// Every node in preorder, paired with its parent's position and edge
fn preorder(trie: &StatTrie) -> Vec<(NodeRef<'_>, Option<(usize, char)>)> {
    let mut order = Vec::with_capacity(trie.total_nodes());
    let mut stack = vec![(trie.root(), None)];

    while let Some((node, link)) = stack.pop() {
        let position = order.len();
        order.push((node, link));
        let children: Vec<_> = node.children().collect();
        for (c, child) in children.into_iter().rev() {
            stack.push((child, Some((position, c))));
        }
    }
    order
}

/// Assemble the exported tree bottom-up
///
/// The preorder position doubles as the node id. Walking the order
/// backwards finishes every child before its parent, so no recursion is
/// needed however deep the trie is.
fn build_tree(trie: &StatTrie, marked: &NodeSet, view: View) -> TreeNode {
    let order = preorder(trie);
    let mut children: Vec<BTreeMap<String, TreeNode>> = Vec::new();
    children.resize_with(order.len(), BTreeMap::new);
    let mut holds_marked = vec![false; order.len()];

    for id in (1..order.len()).rev() {
        let (node, link) = order[id];
        let Some((parent, edge)) = link else {
            continue;
        };
        holds_marked[id] |= marked.contains(&node.id());

        if view == View::Trimmed && !holds_marked[id] {
            // only placeholders below
            children[id].clear();
            children[parent]
                .entry(COLLAPSED_LABEL.to_string())
                .or_insert_with(TreeNode::collapsed);
            continue;
        }

        holds_marked[parent] |= holds_marked[id];
        let exported = export_node(node, id, marked, view, std::mem::take(&mut children[id]));
        children[parent].insert(edge.to_string(), exported);
    }

    let mut root = export_node(
        trie.root(),
        0,
        marked,
        view,
        children.first_mut().map(std::mem::take).unwrap_or_default(),
    );
    root.label = Some(ROOT_LABEL.to_string());
    root
}

fn export_node(
    node: NodeRef<'_>,
    id: usize,
    marked: &NodeSet,
    view: View,
    children: BTreeMap<String, TreeNode>,
) -> TreeNode {
    let mut exported = TreeNode::from_node(node, id, marked);
    if view == View::Full {
        exported.is_anomaly = Some(marked.contains(&node.id()));
    }
    exported.children = children;
    exported
}

/// Write the trimmed tree to `path`
pub fn export_partial_json<P: AsRef<Path>>(
    trie: &StatTrie,
    marked: &NodeSet,
    path: P,
) -> Result<()> {
    TreeDocument::new(trie, trim_tree(trie, marked)).write_to(path)
}

/// Write the full tree to `path`
pub fn export_full_json<P: AsRef<Path>>(trie: &StatTrie, marked: &NodeSet, path: P) -> Result<()> {
    TreeDocument::new(trie, full_tree(trie, marked)).write_to(path)
}

/// Build the document for a selection without writing it
pub fn build_document(trie: &StatTrie, marked: &NodeSet, selection: TreeSelection) -> TreeDocument {
    let root = match selection {
        TreeSelection::Complete => full_tree(trie, marked),
        TreeSelection::Partial(_) => trim_tree(trie, marked),
    };
    TreeDocument::new(trie, root)
}
