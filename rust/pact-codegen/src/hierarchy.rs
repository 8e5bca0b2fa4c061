//! Base/descendant relationships among generated message types.
//!
//! Built in two passes. Generators [`register`](HierarchyBuilder::register)
//! each node with the id of its static base as they produce it; nothing is
//! linked yet, so a node may name a base that is registered later.
//! [`build`](HierarchyBuilder::build) then resolves every edge by id, rejects
//! unknown bases and cycles, and yields an immutable [`Hierarchy`].
//!
//! Serializer binders call [`Hierarchy::walk`] once per back end to derive
//! union declarations. Children are ordered by `(rank, id)`, so the result
//! never depends on the order nodes were registered in.

use std::collections::BTreeMap;

use crate::HierarchyError;
use crate::schema::NodeId;

#[derive(Debug, Clone, Copy)]
struct Entry {
    base: Option<NodeId>,
    rank: u64,
}

/// Collects `(node, base)` edges before they are resolved.
#[derive(Debug, Clone, Default)]
pub struct HierarchyBuilder {
    entries: BTreeMap<NodeId, Entry>,
    duplicates: Vec<NodeId>,
}

impl HierarchyBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `node` as a direct descendant of `base` (or as a root).
    ///
    /// `rank` orders siblings; ties fall back to the node id.
    pub fn register(&mut self, node: NodeId, base: Option<NodeId>, rank: u64) {
        if self.entries.insert(node, Entry { base, rank }).is_some() {
            self.duplicates.push(node);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolve every registered edge.
    pub fn build(self) -> Result<Hierarchy, HierarchyError> {
        if let Some(&node) = self.duplicates.first() {
            return Err(HierarchyError::DuplicateNode { node });
        }

        for (&node, entry) in &self.entries {
            if let Some(base) = entry.base
                && !self.entries.contains_key(&base)
            {
                return Err(HierarchyError::UnknownBase { node, base });
            }
        }

        // Every chain is at most `len` edges long unless it loops.
        let limit = self.entries.len();
        for &node in self.entries.keys() {
            let mut current = node;
            let mut steps = 0;
            while let Some(base) = self.entries.get(&current).and_then(|e| e.base) {
                steps += 1;
                if base == node || steps > limit {
                    return Err(HierarchyError::Cycle { node });
                }
                current = base;
            }
        }

        let mut children: BTreeMap<NodeId, Vec<NodeId>> = BTreeMap::new();
        let mut roots = Vec::new();
        for (&node, entry) in &self.entries {
            children.entry(node).or_default();
            match entry.base {
                Some(base) => children.entry(base).or_default().push(node),
                None => roots.push(node),
            }
        }

        let rank_of = |id: &NodeId| self.entries.get(id).map_or(0, |e| e.rank);
        for siblings in children.values_mut() {
            siblings.sort_by_key(|id| (rank_of(id), *id));
        }
        roots.sort_by_key(|id| (rank_of(id), *id));

        let bases = self
            .entries
            .iter()
            .map(|(&node, entry)| (node, entry.base))
            .collect();

        tracing::debug!(
            nodes = self.entries.len(),
            roots = roots.len(),
            "hierarchy resolved"
        );
        Ok(Hierarchy {
            bases,
            children,
            roots,
        })
    }
}

/// A resolved forest of message types. Read-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hierarchy {
    bases: BTreeMap<NodeId, Option<NodeId>>,
    children: BTreeMap<NodeId, Vec<NodeId>>,
    roots: Vec<NodeId>,
}

impl Hierarchy {
    /// Every descendant of `root` in pre-order, `root` itself excluded.
    ///
    /// Calling this any number of times returns the same sequence.
    pub fn walk(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(root).iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(self.children(node).iter().rev().copied());
        }
        out
    }

    /// Nodes with no base, ordered by rank.
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Immediate descendants of `node`.
    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.children.get(&node).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn base_of(&self, node: NodeId) -> Option<NodeId> {
        self.bases.get(&node).copied().flatten()
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.bases.contains_key(&node)
    }

    /// The root `node` ultimately descends from.
    pub fn root_of(&self, node: NodeId) -> Option<NodeId> {
        if !self.contains(node) {
            return None;
        }
        let mut current = node;
        while let Some(base) = self.base_of(current) {
            current = base;
        }
        Some(current)
    }

    pub fn len(&self) -> usize {
        self.bases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bases.is_empty()
    }
}
