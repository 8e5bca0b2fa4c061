//! Caller-facing surfaces.
//!
//! Every operation a side can invoke on its peer gets one method per
//! [`CallStyle`], except streaming operations, which get a single `open_*`
//! method. The client holds the surface for `*ToServer` operations; the server
//! holds a callback proxy for `*ToClient` operations, built the same way.

use heck::{ToSnakeCase, ToUpperCamelCase};
use pact_contract::{
    ContractDeclaration, Direction, OperationDeclaration, ParamDeclaration, SerializerKind, TypeRef,
};

use crate::keys::SystemMessage;
use crate::schema::{MessageCatalog, NodeId, OperationMessages};

/// The peer a generated surface lives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Client,
    Server,
}

impl Side {
    /// Direction of the operations this side invokes.
    pub fn calls(self) -> Direction {
        match self {
            Side::Client => Direction::ToServer,
            Side::Server => Direction::ToClient,
        }
    }

    /// Direction of the operations this side handles.
    pub fn handles(self) -> Direction {
        match self {
            Side::Client => Direction::ToClient,
            Side::Server => Direction::ToServer,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallStyle {
    /// Blocks; remote faults surface as errors.
    Blocking,
    /// Awaitable; remote faults surface as errors.
    Async,
    /// Blocks; returns an outcome value instead of failing on remote faults.
    Try,
    /// Awaitable outcome value.
    TryAsync,
}

impl CallStyle {
    pub const ALL: [CallStyle; 4] = [
        CallStyle::Blocking,
        CallStyle::Async,
        CallStyle::Try,
        CallStyle::TryAsync,
    ];

    pub fn is_async(self) -> bool {
        matches!(self, CallStyle::Async | CallStyle::TryAsync)
    }

    pub fn is_try(self) -> bool {
        matches!(self, CallStyle::Try | CallStyle::TryAsync)
    }

    /// Method name for this style: `echo`, `echo_async`, `try_echo`, `try_echo_async`.
    pub fn method_name(self, base: &str) -> String {
        match self {
            CallStyle::Blocking => base.to_string(),
            CallStyle::Async => format!("{base}_async"),
            CallStyle::Try => format!("try_{base}"),
            CallStyle::TryAsync => format!("try_{base}_async"),
        }
    }

    /// Suffix of the facade that fixes this style, if the style has one.
    pub fn facade(self) -> Option<&'static str> {
        match self {
            CallStyle::Blocking => None,
            CallStyle::Async => Some("Async"),
            CallStyle::Try => Some("Try"),
            CallStyle::TryAsync => Some("TryAsync"),
        }
    }
}

/// What a stub method hands back to its caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReturnShape {
    Unit,
    Value(TypeRef),
    /// Success (with the typed result, if any) or a fault, as a value.
    Outcome(Option<TypeRef>),
    Awaitable(Box<ReturnShape>),
}

impl ReturnShape {
    fn of(style: CallStyle, result: Option<&TypeRef>) -> Self {
        let settled = if style.is_try() {
            ReturnShape::Outcome(result.cloned())
        } else {
            match result {
                Some(ty) => ReturnShape::Value(ty.clone()),
                None => ReturnShape::Unit,
            }
        };
        if style.is_async() {
            ReturnShape::Awaitable(Box::new(settled))
        } else {
            settled
        }
    }

    pub fn is_awaitable(&self) -> bool {
        matches!(self, ReturnShape::Awaitable(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StubMethod {
    pub name: String,
    /// Name with the style affixes removed, as re-exposed by facades.
    pub base_name: String,
    pub operation: usize,
    pub style: CallStyle,
    pub params: Vec<ParamDeclaration>,
    pub returns: ReturnShape,
    /// Message the method sends.
    pub message: NodeId,
    /// Takes an already-serialized message instead of arguments.
    pub prebuilt: bool,
    pub one_way: bool,
    pub doc: Option<String>,
}

/// Shared stream-control messages wired into every stream handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamControl {
    pub page_ack: NodeId,
    pub cancel: NodeId,
    pub close: NodeId,
    pub close_ack: NodeId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamOpener {
    pub name: String,
    pub operation: usize,
    pub request: NodeId,
    pub response: NodeId,
    pub fault: NodeId,
    pub params: Vec<ParamDeclaration>,
    pub input_item: Option<TypeRef>,
    pub output_item: Option<TypeRef>,
    pub result: Option<TypeRef>,
    pub input_page: Option<NodeId>,
    pub output_page: Option<NodeId>,
    pub control: StreamControl,
    pub doc: Option<String>,
}

/// Serializes a one-way message ahead of time with one fixed serializer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrebuildHelper {
    pub name: String,
    pub operation: usize,
    pub message: NodeId,
    pub params: Vec<ParamDeclaration>,
    pub serializer: SerializerKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FacadeMethod {
    /// Name on the facade.
    pub name: String,
    /// Stub method it forwards to.
    pub target: String,
}

/// Re-exposes the methods of one call style without their affixes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Facade {
    pub style: CallStyle,
    pub name: String,
    pub methods: Vec<FacadeMethod>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSurface {
    pub side: Side,
    pub name: String,
    pub methods: Vec<StubMethod>,
    pub streams: Vec<StreamOpener>,
    pub prebuild: Vec<PrebuildHelper>,
    pub facades: Vec<Facade>,
}

impl ClientSurface {
    pub fn method(&self, name: &str) -> Option<&StubMethod> {
        self.methods.iter().find(|m| m.name == name)
    }

    /// Style methods generated for the operation at `index`.
    pub fn methods_for(&self, index: usize) -> impl Iterator<Item = &StubMethod> {
        self.methods.iter().filter(move |m| m.operation == index)
    }

    pub fn stream(&self, index: usize) -> Option<&StreamOpener> {
        self.streams.iter().find(|s| s.operation == index)
    }

    pub fn facade(&self, style: CallStyle) -> Option<&Facade> {
        self.facades.iter().find(|f| f.style == style)
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty() && self.streams.is_empty()
    }
}

/// Name of the surface generated for `side`.
pub(crate) fn surface_name(contract: &ContractDeclaration, side: Side) -> String {
    let contract_type = contract.name().to_upper_camel_case();
    match side {
        Side::Client => format!("{contract_type}Client"),
        Side::Server => format!("{contract_type}CallbackProxy"),
    }
}

/// Build the surface `side` uses to call its peer.
pub(crate) fn build(
    contract: &ContractDeclaration,
    catalog: &MessageCatalog,
    side: Side,
    prebuild_serializer: SerializerKind,
) -> ClientSurface {
    let name = surface_name(contract, side);
    let mut methods = Vec::new();
    let mut streams = Vec::new();
    let mut prebuild = Vec::new();

    let control = StreamControl {
        page_ack: catalog.system(SystemMessage::PageAck),
        cancel: catalog.system(SystemMessage::StreamCancel),
        close: catalog.system(SystemMessage::StreamClose),
        close_ack: catalog.system(SystemMessage::StreamCloseAck),
    };

    for (index, messages) in catalog.operations() {
        let Some(operation) = contract.operations().get(index) else {
            continue;
        };
        if operation.kind().direction() != side.calls() {
            continue;
        }
        let base = operation.name().to_snake_case();

        match *messages {
            OperationMessages::RequestResponse {
                request,
                response,
                fault,
                input_page,
                output_page,
                ..
            } if operation.is_streaming() => {
                streams.push(StreamOpener {
                    name: format!("open_{base}"),
                    operation: index,
                    request,
                    response,
                    fault,
                    params: operation.params().to_vec(),
                    input_item: operation.input_stream().cloned(),
                    output_item: operation.output_stream().cloned(),
                    result: operation.result_type().cloned(),
                    input_page,
                    output_page,
                    control,
                    doc: operation.doc().map(str::to_string),
                });
            }
            _ => {
                let message = messages.outbound();
                methods.extend(style_methods(operation, index, &base, message, false));
                if operation.kind().is_one_way() && operation.prebuild() {
                    let prebuilt = format!("{base}_prebuilt");
                    methods.extend(style_methods(operation, index, &prebuilt, message, true));
                    prebuild.push(PrebuildHelper {
                        name: format!("prebuild_{base}"),
                        operation: index,
                        message,
                        params: operation.params().to_vec(),
                        serializer: prebuild_serializer,
                    });
                }
            }
        }
    }

    let facades = CallStyle::ALL
        .iter()
        .filter_map(|&style| {
            let suffix = style.facade()?;
            Some(Facade {
                style,
                name: format!("{name}{suffix}"),
                methods: methods
                    .iter()
                    .filter(|m| m.style == style)
                    .map(|m| FacadeMethod {
                        name: m.base_name.clone(),
                        target: m.name.clone(),
                    })
                    .collect(),
            })
        })
        .collect();

    tracing::debug!(
        surface = %name,
        methods = methods.len(),
        streams = streams.len(),
        prebuild = prebuild.len(),
        "built client surface"
    );
    ClientSurface {
        side,
        name,
        methods,
        streams,
        prebuild,
        facades,
    }
}

fn style_methods(
    operation: &OperationDeclaration,
    index: usize,
    base: &str,
    message: NodeId,
    prebuilt: bool,
) -> Vec<StubMethod> {
    CallStyle::ALL
        .iter()
        .map(|&style| StubMethod {
            name: style.method_name(base),
            base_name: base.to_string(),
            operation: index,
            style,
            params: if prebuilt {
                Vec::new()
            } else {
                operation.params().to_vec()
            },
            returns: ReturnShape::of(style, operation.result_type()),
            message,
            prebuilt,
            one_way: operation.kind().is_one_way(),
            doc: operation.doc().map(str::to_string),
        })
        .collect()
}
