use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use crate::TypeRef;

/// A complete service contract: the compiler's only input.
///
/// Built once per compilation pass through [`ContractBuilder`](crate::ContractBuilder)
/// and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct ContractDeclaration {
    pub(crate) namespace: Cow<'static, str>,
    pub(crate) name: Cow<'static, str>,
    pub(crate) operations: Vec<OperationDeclaration>,
    pub(crate) serializers: Vec<SerializerKind>,
    pub(crate) default_serializer: Option<SerializerKind>,
    pub(crate) fault_types: Vec<FaultTypeDeclaration>,
    pub(crate) stream_item_types: Vec<TypeRef>,
    pub(crate) doc: Option<Cow<'static, str>>,
}

impl ContractDeclaration {
    /// Contract namespace (e.g. `acme.chat`).
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Contract name (e.g. `Chat`).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// `namespace.name`, or just the name when the namespace is empty.
    pub fn qualified_name(&self) -> String {
        if self.namespace.is_empty() {
            self.name.to_string()
        } else {
            format!("{}.{}", self.namespace, self.name)
        }
    }

    /// Operations in declaration order.
    pub fn operations(&self) -> &[OperationDeclaration] {
        &self.operations
    }

    /// Serializer back ends configured for this contract, deduplicated, in declaration order.
    pub fn serializers(&self) -> &[SerializerKind] {
        &self.serializers
    }

    pub fn default_serializer(&self) -> Option<SerializerKind> {
        self.default_serializer
    }

    /// Registry of fault payload types operations may raise.
    pub fn fault_types(&self) -> &[FaultTypeDeclaration] {
        &self.fault_types
    }

    pub fn fault_type(&self, ty: &TypeRef) -> Option<&FaultTypeDeclaration> {
        self.fault_types.iter().find(|f| &f.ty == ty)
    }

    /// Registry of types operations may stream.
    pub fn stream_item_types(&self) -> &[TypeRef] {
        &self.stream_item_types
    }

    pub fn doc(&self) -> Option<&str> {
        self.doc.as_deref()
    }
}

/// How an operation is called, and which peer handles it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CallKind {
    /// Fire-and-forget message from client to server.
    OneWayToServer,
    /// Fire-and-forget message from server to client (callback).
    OneWayToClient,
    /// Request/response call handled by the server.
    RequestResponseToServer,
    /// Request/response call handled by the client (callback).
    RequestResponseToClient,
}

impl CallKind {
    pub fn is_one_way(self) -> bool {
        matches!(self, CallKind::OneWayToServer | CallKind::OneWayToClient)
    }

    pub fn is_request_response(self) -> bool {
        !self.is_one_way()
    }

    /// True for operations the server invokes on the client.
    pub fn is_callback(self) -> bool {
        self.direction() == Direction::ToClient
    }

    pub fn direction(self) -> Direction {
        match self {
            CallKind::OneWayToServer | CallKind::RequestResponseToServer => Direction::ToServer,
            CallKind::OneWayToClient | CallKind::RequestResponseToClient => Direction::ToClient,
        }
    }
}

/// The peer that handles an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Direction {
    ToServer,
    ToClient,
}

/// A single operation of a contract.
#[derive(Debug, Clone)]
pub struct OperationDeclaration {
    pub(crate) name: Cow<'static, str>,
    pub(crate) kind: CallKind,
    pub(crate) params: Vec<ParamDeclaration>,
    pub(crate) result: Option<ParamDeclaration>,
    pub(crate) input_stream: Option<TypeRef>,
    pub(crate) output_stream: Option<TypeRef>,
    pub(crate) faults: Vec<FaultDeclaration>,
    pub(crate) prebuild: bool,
    pub(crate) location: Option<SourceLocation>,
    pub(crate) doc: Option<Cow<'static, str>>,
}

impl OperationDeclaration {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> CallKind {
        self.kind
    }

    /// Arguments in positional order (indices start at 1).
    pub fn params(&self) -> &[ParamDeclaration] {
        &self.params
    }

    /// The return parameter (index 0), if the operation returns data.
    pub fn result(&self) -> Option<&ParamDeclaration> {
        self.result.as_ref()
    }

    pub fn result_type(&self) -> Option<&TypeRef> {
        self.result.as_ref().map(ParamDeclaration::ty)
    }

    /// Items the caller streams to the handler.
    pub fn input_stream(&self) -> Option<&TypeRef> {
        self.input_stream.as_ref()
    }

    /// Items the handler streams back to the caller.
    pub fn output_stream(&self) -> Option<&TypeRef> {
        self.output_stream.as_ref()
    }

    pub fn is_streaming(&self) -> bool {
        self.input_stream.is_some() || self.output_stream.is_some()
    }

    /// Number of declared stream directions (0, 1 or 2).
    pub fn stream_directions(&self) -> usize {
        usize::from(self.input_stream.is_some()) + usize::from(self.output_stream.is_some())
    }

    /// Declared custom faults, in declaration order.
    pub fn faults(&self) -> &[FaultDeclaration] {
        &self.faults
    }

    /// Whether a pre-serialized send overload should be generated.
    pub fn prebuild(&self) -> bool {
        self.prebuild
    }

    pub fn location(&self) -> Option<&SourceLocation> {
        self.location.as_ref()
    }

    pub fn doc(&self) -> Option<&str> {
        self.doc.as_deref()
    }
}

/// A positional parameter.
///
/// The wire property name is derived once, at construction, and shared by every
/// generator that needs to agree on it (message fields, stubs, dispatchers).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamDeclaration {
    index: u32,
    ty: TypeRef,
    name: Option<Cow<'static, str>>,
    wire_name: String,
}

impl ParamDeclaration {
    /// Index reserved for the return parameter.
    pub const RESULT_INDEX: u32 = 0;

    /// An argument at a 1-based position.
    ///
    /// # Panics
    ///
    /// Panics if `index` is 0, which is reserved for the return parameter.
    pub fn argument(index: u32, ty: TypeRef, name: Option<Cow<'static, str>>) -> Self {
        assert!(
            index != Self::RESULT_INDEX,
            "argument indices are 1-based; 0 is the return parameter"
        );
        Self {
            index,
            ty,
            name,
            wire_name: format!("Arg{index}"),
        }
    }

    /// The return parameter.
    pub fn result(ty: TypeRef) -> Self {
        Self {
            index: Self::RESULT_INDEX,
            ty,
            name: None,
            wire_name: "Result".to_string(),
        }
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn ty(&self) -> &TypeRef {
        &self.ty
    }

    /// Declared name, if the contract author gave one.
    pub fn declared_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Wire property name: `Arg{index}` for arguments, `Result` for the return parameter.
    pub fn wire_name(&self) -> &str {
        &self.wire_name
    }

    pub fn is_result(&self) -> bool {
        self.index == Self::RESULT_INDEX
    }
}

/// One `(fault-key, payload type)` pair declared on an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaultDeclaration {
    pub key: u32,
    pub payload: TypeRef,
}

/// An entry of the contract's fault registry.
///
/// `extends` names another registered fault payload this one specializes;
/// dispatchers test more specialized payloads first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaultTypeDeclaration {
    pub ty: TypeRef,
    pub extends: Option<TypeRef>,
}

/// Where a declaration came from, for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceLocation {
    pub file: Cow<'static, str>,
    pub line: u32,
    pub column: u32,
}

impl SourceLocation {
    pub fn new(file: impl Into<Cow<'static, str>>, line: u32, column: u32) -> Self {
        Self {
            file: file.into(),
            line,
            column,
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

/// Binary serializer back ends a contract can bind its message catalog to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SerializerKind {
    Postcard,
    MessagePack,
    Bincode,
    Json,
}

impl SerializerKind {
    pub const ALL: [SerializerKind; 4] = [
        SerializerKind::Postcard,
        SerializerKind::MessagePack,
        SerializerKind::Bincode,
        SerializerKind::Json,
    ];

    /// Stable identity string, as accepted by [`FromStr`].
    pub fn identity(self) -> &'static str {
        match self {
            SerializerKind::Postcard => "postcard",
            SerializerKind::MessagePack => "msgpack",
            SerializerKind::Bincode => "bincode",
            SerializerKind::Json => "json",
        }
    }

    /// Upper camel name, used in generated adapter names.
    pub fn type_name(self) -> &'static str {
        match self {
            SerializerKind::Postcard => "Postcard",
            SerializerKind::MessagePack => "MessagePack",
            SerializerKind::Bincode => "Bincode",
            SerializerKind::Json => "Json",
        }
    }
}

impl fmt::Display for SerializerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.identity())
    }
}

/// A serializer identity that doesn't name any known back end.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown serializer `{0}` (expected one of: postcard, msgpack, bincode, json)")]
pub struct UnknownSerializer(pub String);

impl FromStr for SerializerKind {
    type Err = UnknownSerializer;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postcard" => Ok(SerializerKind::Postcard),
            "msgpack" | "messagepack" | "rmp" => Ok(SerializerKind::MessagePack),
            "bincode" => Ok(SerializerKind::Bincode),
            "json" => Ok(SerializerKind::Json),
            _ => Err(UnknownSerializer(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_names_are_positional() {
        let arg = ParamDeclaration::argument(2, TypeRef::String, Some("text".into()));
        assert_eq!(arg.wire_name(), "Arg2");
        assert_eq!(arg.declared_name(), Some("text"));

        let ret = ParamDeclaration::result(TypeRef::I32);
        assert_eq!(ret.wire_name(), "Result");
        assert!(ret.is_result());
    }

    #[test]
    #[should_panic(expected = "1-based")]
    fn argument_index_zero_is_reserved() {
        let _ = ParamDeclaration::argument(0, TypeRef::I32, None);
    }

    #[test]
    fn serializer_identities_round_trip() {
        for kind in SerializerKind::ALL {
            assert_eq!(kind.identity().parse::<SerializerKind>(), Ok(kind));
        }
        assert_eq!(
            "protobuf".parse::<SerializerKind>(),
            Err(UnknownSerializer("protobuf".into()))
        );
    }

    #[test]
    fn call_kinds() {
        assert!(CallKind::OneWayToClient.is_one_way());
        assert!(CallKind::OneWayToClient.is_callback());
        assert!(CallKind::RequestResponseToServer.is_request_response());
        assert_eq!(CallKind::RequestResponseToClient.direction(), Direction::ToClient);
    }
}
