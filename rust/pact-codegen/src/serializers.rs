//! Serializer back-end bindings.
//!
//! One adapter per configured [`SerializerKind`]. Each adapter declares the
//! message-base union and every fault data union by walking the hierarchy, so
//! adapters never depend on the order types were generated in.

use heck::ToUpperCamelCase;
use pact_contract::{ContractDeclaration, SerializerKind};

use crate::hierarchy::Hierarchy;
use crate::schema::{MessageCatalog, NodeId};
use crate::{CodegenOptions, CompileError, Diagnostics};

/// A member of a discriminated union, tagged by its wire key or fault key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnionMember {
    pub node: NodeId,
    pub name: String,
    pub tag: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnionDeclaration {
    pub root: NodeId,
    pub name: String,
    pub members: Vec<UnionMember>,
}

impl UnionDeclaration {
    fn from_walk(catalog: &MessageCatalog, hierarchy: &Hierarchy, root: NodeId) -> Self {
        let members = hierarchy
            .walk(root)
            .into_iter()
            .filter_map(|id| {
                let node = catalog.node(id);
                if node.role().is_marker() {
                    return None;
                }
                let tag = node.key().map(|k| k.get()).or(node.fault_key())?;
                Some(UnionMember {
                    node: id,
                    name: node.name().to_string(),
                    tag,
                })
            })
            .collect();
        Self {
            root,
            name: catalog.node(root).name().to_string(),
            members,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerializerAdapter {
    pub serializer: SerializerKind,
    pub name: String,
    pub message_union: UnionDeclaration,
    pub fault_unions: Vec<UnionDeclaration>,
}

/// Resolves a serializer identity to a configured adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerializerChooser {
    pub name: String,
    contract: String,
    configured: Vec<SerializerKind>,
    default: SerializerKind,
}

impl SerializerChooser {
    /// The serializer a stub constructed with `requested` would use.
    ///
    /// `None` picks the contract default. A kind that was not configured is an
    /// error, reported when the stub is built rather than at first use.
    pub fn resolve(&self, requested: Option<SerializerKind>) -> Result<SerializerKind, CompileError> {
        let kind = requested.unwrap_or(self.default);
        if self.configured.contains(&kind) {
            Ok(kind)
        } else {
            Err(CompileError::SerializerNotConfigured {
                requested: kind,
                contract: self.contract.clone(),
                configured: self.configured.clone(),
            })
        }
    }

    pub fn configured(&self) -> &[SerializerKind] {
        &self.configured
    }

    pub fn default_kind(&self) -> SerializerKind {
        self.default
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerializerBinding {
    pub adapters: Vec<SerializerAdapter>,
    pub chooser: SerializerChooser,
}

impl SerializerBinding {
    pub fn adapter(&self, kind: SerializerKind) -> Option<&SerializerAdapter> {
        self.adapters.iter().find(|a| a.serializer == kind)
    }
}

/// Configured serializers and the default, with fallbacks applied.
pub(crate) fn configure(
    contract: &ContractDeclaration,
    options: &CodegenOptions,
    diagnostics: &mut Diagnostics,
) -> (Vec<SerializerKind>, SerializerKind) {
    let mut configured = contract.serializers().to_vec();
    if configured.is_empty() {
        diagnostics.warn(format!(
            "contract `{}` configures no serializer; falling back to `{}`",
            contract.qualified_name(),
            SerializerKind::Postcard
        ));
        configured.push(SerializerKind::Postcard);
    }

    let first = configured[0];
    let default = match options.default_serializer.or(contract.default_serializer()) {
        Some(kind) if configured.contains(&kind) => kind,
        Some(kind) => {
            diagnostics.warn(format!(
                "default serializer `{kind}` is not configured for `{}`; using `{first}`",
                contract.qualified_name()
            ));
            first
        }
        None => first,
    };
    (configured, default)
}

/// Bind every configured serializer to the finished catalog.
pub(crate) fn bind(
    contract: &ContractDeclaration,
    catalog: &MessageCatalog,
    hierarchy: &Hierarchy,
    configured: Vec<SerializerKind>,
    default: SerializerKind,
) -> SerializerBinding {
    let contract_type = contract.name().to_upper_camel_case();

    let adapters: Vec<SerializerAdapter> = configured
        .iter()
        .map(|&serializer| {
            let message_union = UnionDeclaration::from_walk(catalog, hierarchy, catalog.message_base());
            let fault_unions = catalog
                .fault_sets()
                .iter()
                .map(|set| UnionDeclaration::from_walk(catalog, hierarchy, set.marker))
                .collect();
            tracing::trace!(
                serializer = %serializer,
                members = message_union.members.len(),
                "bound serializer adapter"
            );
            SerializerAdapter {
                serializer,
                name: format!("{contract_type}{}Adapter", serializer.type_name()),
                message_union,
                fault_unions,
            }
        })
        .collect();

    tracing::debug!(
        adapters = adapters.len(),
        default = %default,
        "bound serializers"
    );
    SerializerBinding {
        adapters,
        chooser: SerializerChooser {
            name: format!("{contract_type}Serializers"),
            contract: contract.qualified_name(),
            configured,
            default,
        },
    }
}
