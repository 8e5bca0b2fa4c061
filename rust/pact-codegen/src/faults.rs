//! Typed fault carriers.
//!
//! An operation declaring custom faults gets a `{Op}FaultData` union marker and,
//! per `(fault key, payload)` pair, a `{Op}{Payload}Fault` carrier descending
//! from it. A carrier stores the payload, hands it out generically, and rebuilds
//! the typed fault it stands for. The operation's fault message binds the union
//! through a [`FieldType::FaultData`] field.

use pact_contract::{ContractDeclaration, OperationDeclaration, TypeRef};

use crate::schema::{CatalogBuilder, FieldType, MessageBuilder, MessageRole, MethodKind, NodeId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaultAdapter {
    pub node: NodeId,
    pub fault_key: u32,
    pub payload: TypeRef,
    /// Length of the payload's `extends` chain in the fault registry.
    pub specificity: usize,
}

/// Carriers of one operation, in catch order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaultAdapterSet {
    pub operation: usize,
    pub marker: NodeId,
    /// Most specific payload first; declaration order breaks ties.
    pub adapters: Vec<FaultAdapter>,
}

impl FaultAdapterSet {
    pub fn adapter(&self, fault_key: u32) -> Option<&FaultAdapter> {
        self.adapters.iter().find(|a| a.fault_key == fault_key)
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}

pub(crate) fn marker_name(operation_type: &str) -> String {
    format!("{operation_type}{}", MessageRole::FaultData.suffix())
}

pub(crate) fn adapter_name(operation_type: &str, payload: &TypeRef) -> String {
    format!(
        "{operation_type}{}{}",
        payload.name_fragment(),
        MessageRole::FaultAdapter.suffix()
    )
}

/// Depth of `ty` in the fault registry: 0 for a payload extending nothing.
///
/// The registry is checked for cycles before generation; the walk is still
/// bounded by the registry size.
pub fn specificity(contract: &ContractDeclaration, ty: &TypeRef) -> usize {
    let mut depth = 0;
    let mut current = contract.fault_type(ty);
    while let Some(base) = current.and_then(|f| f.extends.as_ref()) {
        depth += 1;
        if depth > contract.fault_types().len() {
            break;
        }
        current = contract.fault_type(base);
    }
    depth
}

/// Emit the union marker and carriers for `operation`.
pub(crate) fn generate(
    catalog: &mut CatalogBuilder,
    contract: &ContractDeclaration,
    index: usize,
    operation: &OperationDeclaration,
    operation_type: &str,
) -> FaultAdapterSet {
    let marker_id = catalog.next_id();
    let first_adapter = marker_id.index() as u32 + 1;

    let mut marker = MessageBuilder::new(marker_name(operation_type), MessageRole::FaultData)
        .operation(index)
        .display_name(format!("{} fault data", operation.name()))
        .doc(format!(
            "Typed fault payloads `{}` can carry.",
            operation.name()
        ));
    for offset in 0..operation.faults().len() as u32 {
        marker = marker.nested(NodeId::new(first_adapter + offset));
    }
    let marker = catalog.push(marker);

    let mut adapters = Vec::with_capacity(operation.faults().len());
    for fault in operation.faults() {
        let builder =
            MessageBuilder::new(adapter_name(operation_type, &fault.payload), MessageRole::FaultAdapter)
                .operation(index)
                .base(marker)
                .fault_key(fault.key)
                .field("Payload", FieldType::Declared(fault.payload.clone()))
                .method("payload", MethodKind::FaultPayload)
                .method("into_fault", MethodKind::IntoFault)
                .display_name(format!(
                    "{} fault {} ({})",
                    operation.name(),
                    fault.key,
                    fault.payload
                ));
        let node = catalog.push(builder);
        adapters.push(FaultAdapter {
            node,
            fault_key: fault.key,
            payload: fault.payload.clone(),
            specificity: specificity(contract, &fault.payload),
        });
    }

    // Stable: equal specificity keeps declaration order.
    adapters.sort_by(|a, b| b.specificity.cmp(&a.specificity));

    tracing::debug!(
        operation = operation.name(),
        adapters = adapters.len(),
        "generated fault adapters"
    );
    FaultAdapterSet {
        operation: index,
        marker,
        adapters,
    }
}
