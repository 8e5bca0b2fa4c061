//! The message catalog: every type that travels on the wire for a contract.
//!
//! Generation is split the same way for every node: a [`MessageBuilder`]
//! collects fields and methods, receives its display name, and is frozen by
//! [`MessageBuilder::finalize`] into a [`MessageNode`]. Frozen nodes live in the
//! [`MessageCatalog`] arena and are registered with the hierarchy as they are
//! pushed.

mod catalog;
pub(crate) mod generate;
mod node;

pub use catalog::{MessageCatalog, OperationMessages};
pub(crate) use catalog::CatalogBuilder;
pub use node::{
    FieldSchema, FieldType, MessageBuilder, MessageNode, MessageRole, MethodKind, MethodSchema,
    NodeId,
};
