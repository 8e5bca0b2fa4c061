use pact_contract::{ContractDeclaration, OperationDeclaration, SerializerKind};

use crate::client::{self, ClientSurface, Side};
use crate::hierarchy::Hierarchy;
use crate::keys::{self, KeyTable};
use crate::schema::{self, MessageCatalog, MessageNode};
use crate::serializers::{self, SerializerBinding};
use crate::server::{self, DispatchPlan};
use crate::{CodegenOptions, CompileError, Diagnostics, validate};

/// Everything generated for one contract. Immutable.
#[derive(Debug, Clone)]
pub struct CompiledContract {
    contract: ContractDeclaration,
    generated: Vec<bool>,
    keys: KeyTable,
    catalog: MessageCatalog,
    hierarchy: Hierarchy,
    client: ClientSurface,
    callback_proxy: ClientSurface,
    server_dispatch: DispatchPlan,
    callback_dispatch: DispatchPlan,
    serializers: SerializerBinding,
    diagnostics: Diagnostics,
}

impl CompiledContract {
    pub fn contract(&self) -> &ContractDeclaration {
        &self.contract
    }

    /// Whether the operation at `index` made it into the catalog.
    pub fn is_generated(&self, index: usize) -> bool {
        self.generated.get(index).copied().unwrap_or(false)
    }

    /// Generated operations as `(index, declaration)`.
    pub fn generated_operations(&self) -> impl Iterator<Item = (usize, &OperationDeclaration)> {
        self.contract
            .operations()
            .iter()
            .enumerate()
            .filter(|(index, _)| self.is_generated(*index))
    }

    pub fn keys(&self) -> &KeyTable {
        &self.keys
    }

    pub fn catalog(&self) -> &MessageCatalog {
        &self.catalog
    }

    pub fn hierarchy(&self) -> &Hierarchy {
        &self.hierarchy
    }

    /// Immediate descendants of `node`, resolved through the hierarchy.
    pub fn descendants(&self, node: &MessageNode) -> Vec<&MessageNode> {
        self.hierarchy
            .children(node.id())
            .iter()
            .map(|&id| self.catalog.node(id))
            .collect()
    }

    /// Surface the client uses to call the server.
    pub fn client(&self) -> &ClientSurface {
        &self.client
    }

    /// Surface the server uses to call back into the client.
    pub fn callback_proxy(&self) -> &ClientSurface {
        &self.callback_proxy
    }

    pub fn surface(&self, side: Side) -> &ClientSurface {
        match side {
            Side::Client => &self.client,
            Side::Server => &self.callback_proxy,
        }
    }

    /// Dispatcher of the server.
    pub fn server_dispatch(&self) -> &DispatchPlan {
        &self.server_dispatch
    }

    /// Dispatcher the client runs for callbacks.
    pub fn callback_dispatch(&self) -> &DispatchPlan {
        &self.callback_dispatch
    }

    pub fn dispatch(&self, side: Side) -> &DispatchPlan {
        match side {
            Side::Server => &self.server_dispatch,
            Side::Client => &self.callback_dispatch,
        }
    }

    pub fn serializers(&self) -> &SerializerBinding {
        &self.serializers
    }

    pub fn default_serializer(&self) -> SerializerKind {
        self.serializers.chooser.default_kind()
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }
}

/// Compile `contract` into its message catalog, surfaces, dispatch plans
/// and serializer bindings.
///
/// Problems local to an operation are collected in
/// [`CompiledContract::diagnostics`] and only skip that operation.
pub fn compile(
    contract: &ContractDeclaration,
    options: &CodegenOptions,
) -> Result<CompiledContract, CompileError> {
    let _span = tracing::debug_span!("compile", contract = %contract.qualified_name()).entered();
    let mut diagnostics = Diagnostics::new();

    let mut generated = validate::validate(contract, &mut diagnostics)?;
    let keys = keys::allocate(contract, options)?;
    let (configured, default) = serializers::configure(contract, options, &mut diagnostics);

    let (catalog, hierarchy) =
        schema::generate::generate(contract, &keys, &mut generated, &mut diagnostics)?;

    let client = client::build(contract, &catalog, Side::Client, default);
    let callback_proxy = client::build(contract, &catalog, Side::Server, default);
    let server_dispatch = server::build(contract, &keys, &catalog, Side::Server);
    let callback_dispatch = server::build(contract, &keys, &catalog, Side::Client);

    let serializers = serializers::bind(contract, &catalog, &hierarchy, configured, default);

    tracing::debug!(
        operations = contract.operations().len(),
        generated = generated.iter().filter(|&&g| g).count(),
        diagnostics = diagnostics.len(),
        "compiled contract"
    );
    Ok(CompiledContract {
        contract: contract.clone(),
        generated,
        keys,
        catalog,
        hierarchy,
        client,
        callback_proxy,
        server_dispatch,
        callback_dispatch,
        serializers,
        diagnostics,
    })
}
