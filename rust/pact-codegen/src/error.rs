use pact_contract::{SerializerKind, SourceLocation, TypeRef};

use crate::schema::NodeId;

/// A problem that aborts compilation of the whole contract.
///
/// Problems local to one operation are reported as
/// [`Diagnostic`](crate::Diagnostic)s instead, and only that operation is skipped.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompileError {
    #[error(
        "{}operation `{operation}` raises `{ty}`, which is not in the contract's fault registry",
        located(.location)
    )]
    UnresolvedFaultType {
        operation: String,
        ty: TypeRef,
        location: Option<SourceLocation>,
    },

    #[error(
        "{}operation `{operation}` streams `{ty}`, which is not in the contract's stream item registry",
        located(.location)
    )]
    UnresolvedStreamItem {
        operation: String,
        ty: TypeRef,
        location: Option<SourceLocation>,
    },

    #[error("fault type `{ty}` extends `{base}`, which is not in the contract's fault registry")]
    UnresolvedFaultBase { ty: TypeRef, base: TypeRef },

    #[error("fault type `{ty}` extends itself through its `extends` chain")]
    CyclicFaultHierarchy { ty: TypeRef },

    #[error("key space exhausted: operation `{operation}` needs key {needed}, limit is {limit}")]
    KeySpaceExhausted {
        operation: String,
        needed: u64,
        limit: u32,
    },

    #[error(
        "serializer `{requested}` is not configured for contract `{contract}` (configured: {})",
        list(.configured)
    )]
    SerializerNotConfigured {
        requested: SerializerKind,
        contract: String,
        configured: Vec<SerializerKind>,
    },

    #[error(transparent)]
    Hierarchy(#[from] HierarchyError),
}

/// A broken base/descendant relationship among generated message types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HierarchyError {
    #[error("node {node} was registered twice")]
    DuplicateNode { node: NodeId },

    #[error("node {node} names base {base}, which was never registered")]
    UnknownBase { node: NodeId, base: NodeId },

    #[error("node {node} is its own ancestor")]
    Cycle { node: NodeId },
}

fn located(location: &Option<SourceLocation>) -> String {
    match location {
        Some(location) => format!("{location}: "),
        None => String::new(),
    }
}

fn list(kinds: &[SerializerKind]) -> String {
    if kinds.is_empty() {
        return "none".to_string();
    }
    kinds
        .iter()
        .map(|k| k.identity())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_location() {
        let err = CompileError::UnresolvedFaultType {
            operation: "Upload".into(),
            ty: TypeRef::named("QuotaExceeded"),
            location: Some(SourceLocation::new("chat.rs", 12, 5)),
        };
        assert_eq!(
            err.to_string(),
            "chat.rs:12:5: operation `Upload` raises `QuotaExceeded`, which is not in the contract's fault registry"
        );
    }

    #[test]
    fn serializer_message_lists_configured() {
        let err = CompileError::SerializerNotConfigured {
            requested: SerializerKind::Json,
            contract: "acme.Chat".into(),
            configured: vec![SerializerKind::Postcard, SerializerKind::MessagePack],
        };
        assert_eq!(
            err.to_string(),
            "serializer `json` is not configured for contract `acme.Chat` (configured: postcard, msgpack)"
        );
    }
}
