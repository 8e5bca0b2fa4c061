use std::collections::BTreeMap;

use crate::HierarchyError;
use crate::faults::FaultAdapterSet;
use crate::hierarchy::{Hierarchy, HierarchyBuilder};
use crate::keys::SystemMessage;

use super::{MessageBuilder, MessageNode, NodeId};

/// Message types generated for one operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationMessages {
    OneWay {
        message: NodeId,
    },
    RequestResponse {
        request: NodeId,
        response: NodeId,
        fault: NodeId,
        input_page: Option<NodeId>,
        output_page: Option<NodeId>,
        /// Fault data union, when the operation declares custom faults.
        fault_data: Option<NodeId>,
    },
}

impl OperationMessages {
    /// The node a caller sends.
    pub fn outbound(&self) -> NodeId {
        match *self {
            OperationMessages::OneWay { message } => message,
            OperationMessages::RequestResponse { request, .. } => request,
        }
    }

    /// Page types, input before output.
    pub fn pages(&self) -> Vec<NodeId> {
        match *self {
            OperationMessages::OneWay { .. } => Vec::new(),
            OperationMessages::RequestResponse {
                input_page,
                output_page,
                ..
            } => input_page.into_iter().chain(output_page).collect(),
        }
    }
}

/// The closed set of types generated for a contract.
///
/// An arena: nodes are addressed by [`NodeId`] and never change after
/// insertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageCatalog {
    nodes: Vec<MessageNode>,
    by_name: BTreeMap<String, NodeId>,
    message_base: NodeId,
    /// Indexed by system key minus one.
    system: [NodeId; 8],
    operations: Vec<Option<OperationMessages>>,
    fault_sets: Vec<FaultAdapterSet>,
}

impl MessageCatalog {
    pub fn node(&self, id: NodeId) -> &MessageNode {
        &self.nodes[id.index()]
    }

    pub fn get(&self, id: NodeId) -> Option<&MessageNode> {
        self.nodes.get(id.index())
    }

    pub fn by_name(&self, name: &str) -> Option<&MessageNode> {
        self.by_name.get(name).map(|&id| self.node(id))
    }

    /// Every node in insertion order.
    pub fn nodes(&self) -> &[MessageNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes that travel on the wire (everything but markers and fault carriers).
    pub fn messages(&self) -> impl Iterator<Item = &MessageNode> {
        self.nodes.iter().filter(|n| n.key().is_some())
    }

    /// The `{Contract}MessageBase` marker.
    pub fn message_base(&self) -> NodeId {
        self.message_base
    }

    pub fn system(&self, message: SystemMessage) -> NodeId {
        self.system[message.key().get() as usize - 1]
    }

    /// Messages of the operation at `index`, or `None` if it was skipped.
    pub fn operation(&self, index: usize) -> Option<&OperationMessages> {
        self.operations.get(index).and_then(Option::as_ref)
    }

    /// Generated operations as `(index, messages)` in declaration order.
    pub fn operations(&self) -> impl Iterator<Item = (usize, &OperationMessages)> {
        self.operations
            .iter()
            .enumerate()
            .filter_map(|(index, messages)| messages.as_ref().map(|m| (index, m)))
    }

    pub fn fault_set(&self, operation: usize) -> Option<&FaultAdapterSet> {
        self.fault_sets.iter().find(|s| s.operation == operation)
    }

    pub fn fault_sets(&self) -> &[FaultAdapterSet] {
        &self.fault_sets
    }
}

/// Mutable side of the catalog, used while generators run.
#[derive(Debug)]
pub(crate) struct CatalogBuilder {
    prefix: String,
    nodes: Vec<MessageNode>,
    by_name: BTreeMap<String, NodeId>,
    hierarchy: HierarchyBuilder,
}

impl CatalogBuilder {
    pub(crate) fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            nodes: Vec::new(),
            by_name: BTreeMap::new(),
            hierarchy: HierarchyBuilder::new(),
        }
    }

    pub(crate) fn is_taken(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Id the next pushed node will get.
    pub(crate) fn next_id(&self) -> NodeId {
        NodeId::new(self.nodes.len() as u32)
    }

    /// Finalize `builder` and register it with the hierarchy.
    ///
    /// Callers check names with [`is_taken`](Self::is_taken) first; a
    /// repeated name keeps pointing at its first node.
    pub(crate) fn push(&mut self, builder: MessageBuilder) -> NodeId {
        let id = self.next_id();
        let node = builder.finalize(id, &self.prefix);
        tracing::trace!(
            node = %id,
            name = node.qualified_name(),
            key = ?node.key(),
            "finalized message node"
        );
        self.hierarchy.register(id, node.base(), node.rank());
        self.by_name.entry(node.name().to_string()).or_insert(id);
        self.nodes.push(node);
        id
    }

    pub(crate) fn finish(
        self,
        message_base: NodeId,
        system: [NodeId; 8],
        operations: Vec<Option<OperationMessages>>,
        fault_sets: Vec<FaultAdapterSet>,
    ) -> Result<(MessageCatalog, Hierarchy), HierarchyError> {
        let hierarchy = self.hierarchy.build()?;
        let catalog = MessageCatalog {
            nodes: self.nodes,
            by_name: self.by_name,
            message_base,
            system,
            operations,
            fault_sets,
        };
        Ok((catalog, hierarchy))
    }
}
