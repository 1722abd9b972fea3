//! Navigation tree and its deterministic pre-order flattening.

use super::Document;

/// A node in the navigation tree (hierarchical, order-significant).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NavigationNode {
    /// The document this node points at, if any. Grouping nodes have none.
    pub document: Option<Document>,
    pub items: Vec<NavigationNode>,
}

/// One element of a flattened navigation tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlattenedEntry {
    pub document: Document,
    /// Index in traversal order among document-bearing nodes.
    pub position: usize,
    /// Depth of the originating node (root = 0).
    pub depth: usize,
    /// Position one past the last entry inside this node's subtree.
    pub subtree_end: usize,
}

enum Visit<'a> {
    Enter(&'a NavigationNode, usize),
    Exit(usize),
}

impl NavigationNode {
    /// Create a node pointing at a document.
    pub fn new(document: impl Into<Document>) -> Self {
        Self {
            document: Some(document.into()),
            items: Vec::new(),
        }
    }

    /// Create a grouping node with no document of its own.
    pub fn group() -> Self {
        Self::default()
    }

    pub fn with_child(mut self, child: NavigationNode) -> Self {
        self.items.push(child);
        self
    }

    /// Flatten the tree into pre-order: each node before its children, children
    /// in authored order. Nodes without a document are traversed but produce no
    /// entry. Uses an explicit stack so arbitrarily deep trees cannot overflow.
    pub fn flatten(&self) -> Vec<FlattenedEntry> {
        let mut entries: Vec<FlattenedEntry> = Vec::new();
        let mut stack = vec![Visit::Enter(self, 0)];

        while let Some(visit) = stack.pop() {
            match visit {
                Visit::Enter(node, depth) => {
                    if let Some(document) = &node.document {
                        let position = entries.len();
                        entries.push(FlattenedEntry {
                            document: document.clone(),
                            position,
                            depth,
                            subtree_end: position + 1,
                        });
                        stack.push(Visit::Exit(position));
                    }
                    // Reverse so the first child is popped first
                    stack.extend(
                        node.items
                            .iter()
                            .rev()
                            .map(|child| Visit::Enter(child, depth + 1)),
                    );
                }
                Visit::Exit(position) => entries[position].subtree_end = entries.len(),
            }
        }

        entries
    }
}
