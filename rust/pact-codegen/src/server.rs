//! Callee-side dispatch plans.
//!
//! A plan is a closed table of inbound arms, one per operation the side
//! handles, looked up by wire key. Keys outside the table resolve to
//! [`Dispatch::Unknown`]. Rendering turns the table into an exhaustive `match`.
//!
//! Request arms carry everything the dispatcher needs to map a handler's
//! outcome onto exactly one of the three fault shapes: the ordered
//! [`FaultBranch`] chain ends with [`FaultBranch::Declared`] and
//! [`FaultBranch::Unexpected`], after any custom branches.

use heck::{ToSnakeCase, ToUpperCamelCase};
use pact_contract::{ContractDeclaration, ParamDeclaration, TypeRef};

use crate::client::Side;
use crate::keys::{KeyTable, MessageKey};
use crate::schema::{MessageCatalog, NodeId, OperationMessages};

/// Abstract handler method the service implementation provides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerMethod {
    pub name: String,
    pub operation: usize,
    pub params: Vec<ParamDeclaration>,
    pub result: Option<TypeRef>,
    pub one_way: bool,
    pub input_item: Option<TypeRef>,
    pub output_item: Option<TypeRef>,
    /// Overridable hook called with the result after the response is sent.
    pub post_send_hook: Option<String>,
    pub doc: Option<String>,
}

/// The call context a request handler runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextKind {
    Plain,
    /// Carries the negotiated window; closing it is awaited.
    Streaming {
        input_page: Option<NodeId>,
        output_page: Option<NodeId>,
    },
}

impl ContextKind {
    pub fn is_streaming(self) -> bool {
        matches!(self, ContextKind::Streaming { .. })
    }
}

/// One catch branch of a request arm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FaultBranch {
    /// A typed fault whose payload is bound through `adapter`.
    Custom {
        fault_key: u32,
        payload: TypeRef,
        adapter: NodeId,
    },
    /// Any other fault the handler raised on purpose.
    Declared,
    /// Anything else, including panics.
    Unexpected,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestArm {
    pub variant: String,
    pub key: MessageKey,
    pub operation: usize,
    pub handler: String,
    pub request: NodeId,
    pub response: NodeId,
    pub fault: NodeId,
    pub context: ContextKind,
    pub has_result: bool,
    pub post_send_hook: Option<String>,
    pub catch_chain: Vec<FaultBranch>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundArm {
    OneWay {
        variant: String,
        key: MessageKey,
        operation: usize,
        handler: String,
        message: NodeId,
    },
    Request(RequestArm),
}

impl InboundArm {
    pub fn key(&self) -> MessageKey {
        match self {
            InboundArm::OneWay { key, .. } => *key,
            InboundArm::Request(arm) => arm.key,
        }
    }

    pub fn variant(&self) -> &str {
        match self {
            InboundArm::OneWay { variant, .. } => variant,
            InboundArm::Request(arm) => &arm.variant,
        }
    }

    pub fn operation(&self) -> usize {
        match self {
            InboundArm::OneWay { operation, .. } => *operation,
            InboundArm::Request(arm) => arm.operation,
        }
    }

    pub fn handler(&self) -> &str {
        match self {
            InboundArm::OneWay { handler, .. } => handler,
            InboundArm::Request(arm) => &arm.handler,
        }
    }
}

/// Result of looking up an inbound key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch<'a> {
    Arm(&'a InboundArm),
    Unknown { key: MessageKey },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchPlan {
    pub side: Side,
    /// Trait the implementation provides.
    pub handler_trait: String,
    pub dispatcher: String,
    /// Closed enum of decoded inbound messages.
    pub inbound: String,
    pub handlers: Vec<HandlerMethod>,
    pub arms: Vec<InboundArm>,
}

impl DispatchPlan {
    pub fn dispatch(&self, key: MessageKey) -> Dispatch<'_> {
        match self.arms.iter().find(|arm| arm.key() == key) {
            Some(arm) => Dispatch::Arm(arm),
            None => Dispatch::Unknown { key },
        }
    }

    pub fn arm_for(&self, operation: usize) -> Option<&InboundArm> {
        self.arms.iter().find(|arm| arm.operation() == operation)
    }

    pub fn handler(&self, name: &str) -> Option<&HandlerMethod> {
        self.handlers.iter().find(|h| h.name == name)
    }

    pub fn is_empty(&self) -> bool {
        self.arms.is_empty()
    }
}

/// Plan the dispatcher of `side` for every operation it handles.
pub(crate) fn build(
    contract: &ContractDeclaration,
    keys: &KeyTable,
    catalog: &MessageCatalog,
    side: Side,
) -> DispatchPlan {
    let contract_type = contract.name().to_upper_camel_case();
    let (handler_trait, dispatcher, inbound) = match side {
        Side::Server => (
            contract_type.clone(),
            format!("{contract_type}Dispatcher"),
            format!("{contract_type}Inbound"),
        ),
        Side::Client => (
            format!("{contract_type}Callbacks"),
            format!("{contract_type}CallbackDispatcher"),
            format!("{contract_type}CallbackInbound"),
        ),
    };

    let mut handlers = Vec::new();
    let mut arms = Vec::new();

    for (index, messages) in catalog.operations() {
        let (Some(operation), Some(block)) =
            (contract.operations().get(index), keys.operation(index))
        else {
            continue;
        };
        if operation.kind().direction() != side.handles() {
            continue;
        }
        let key = block.keys.outbound();

        let handler = operation.name().to_snake_case();
        let variant = operation.name().to_upper_camel_case();
        let post_send_hook = operation
            .result()
            .filter(|_| operation.kind().is_request_response())
            .map(|_| format!("on_{handler}_sent"));

        handlers.push(HandlerMethod {
            name: handler.clone(),
            operation: index,
            params: operation.params().to_vec(),
            result: operation.result_type().cloned(),
            one_way: operation.kind().is_one_way(),
            input_item: operation.input_stream().cloned(),
            output_item: operation.output_stream().cloned(),
            post_send_hook: post_send_hook.clone(),
            doc: operation.doc().map(str::to_string),
        });

        let arm = match *messages {
            OperationMessages::OneWay { message } => InboundArm::OneWay {
                variant,
                key,
                operation: index,
                handler,
                message,
            },
            OperationMessages::RequestResponse {
                request,
                response,
                fault,
                input_page,
                output_page,
                ..
            } => {
                let context = if operation.is_streaming() {
                    ContextKind::Streaming {
                        input_page,
                        output_page,
                    }
                } else {
                    ContextKind::Plain
                };
                InboundArm::Request(RequestArm {
                    variant,
                    key,
                    operation: index,
                    handler,
                    request,
                    response,
                    fault,
                    context,
                    has_result: operation.result().is_some(),
                    post_send_hook,
                    catch_chain: catch_chain(catalog, index),
                })
            }
        };
        tracing::trace!(
            dispatcher = %dispatcher,
            variant = arm.variant(),
            key = %arm.key(),
            "planned inbound arm"
        );
        arms.push(arm);
    }

    tracing::debug!(
        dispatcher = %dispatcher,
        arms = arms.len(),
        "built dispatch plan"
    );
    DispatchPlan {
        side,
        handler_trait,
        dispatcher,
        inbound,
        handlers,
        arms,
    }
}

/// Custom branches in catch order, then the two generic ones.
fn catch_chain(catalog: &MessageCatalog, operation: usize) -> Vec<FaultBranch> {
    let mut chain: Vec<FaultBranch> = catalog
        .fault_set(operation)
        .map(|set| {
            set.adapters
                .iter()
                .map(|adapter| FaultBranch::Custom {
                    fault_key: adapter.fault_key,
                    payload: adapter.payload.clone(),
                    adapter: adapter.node,
                })
                .collect()
        })
        .unwrap_or_default();
    chain.push(FaultBranch::Declared);
    chain.push(FaultBranch::Unexpected);
    chain
}
