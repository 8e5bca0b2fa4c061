use std::fmt;

use pact_contract::TypeRef;

use crate::keys::{MessageKey, SystemMessage};

/// Stable index of a node in the [`MessageCatalog`](super::MessageCatalog) arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What a generated type is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageRole {
    /// The contract-wide union every message descends from.
    MessageBase,
    System(SystemMessage),
    OneWay,
    Request,
    Response,
    Fault,
    InputPage,
    OutputPage,
    /// Per-operation union of typed fault payload carriers.
    FaultData,
    FaultAdapter,
}

impl MessageRole {
    /// Marker types exist only as union roots and never travel on their own.
    pub fn is_marker(self) -> bool {
        matches!(self, MessageRole::MessageBase | MessageRole::FaultData)
    }

    pub fn is_page(self) -> bool {
        matches!(self, MessageRole::InputPage | MessageRole::OutputPage)
    }

    /// Suffix appended to the operation name for per-operation roles.
    pub fn suffix(self) -> &'static str {
        match self {
            MessageRole::MessageBase => "MessageBase",
            MessageRole::System(_) => "",
            MessageRole::OneWay => "Message",
            MessageRole::Request => "Request",
            MessageRole::Response => "Response",
            MessageRole::Fault => "Fault",
            MessageRole::InputPage => "InputPage",
            MessageRole::OutputPage => "OutputPage",
            MessageRole::FaultData => "FaultData",
            MessageRole::FaultAdapter => "Fault",
        }
    }

    fn describe(self) -> &'static str {
        match self {
            MessageRole::MessageBase => "message base",
            MessageRole::System(_) => "system message",
            MessageRole::OneWay => "message",
            MessageRole::Request => "request",
            MessageRole::Response => "response",
            MessageRole::Fault => "fault",
            MessageRole::InputPage => "input page",
            MessageRole::OutputPage => "output page",
            MessageRole::FaultData => "fault data",
            MessageRole::FaultAdapter => "fault adapter",
        }
    }
}

/// Type of a message field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    /// A type declared by the contract author.
    Declared(TypeRef),
    /// Correlates requests, responses, faults and stream pages. Always `u64`.
    CallId,
    CallOptions,
    FaultCode,
    /// Negotiated count of unacknowledged pages a sender may have in flight.
    WindowSize,
    /// Pages consumed since the last acknowledgement.
    Consumed,
    Text,
    Credentials,
    /// Polymorphic binding to one of the carriers under this fault data union.
    FaultData(NodeId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSchema {
    pub name: String,
    pub ty: FieldType,
}

impl FieldSchema {
    pub fn new(name: impl Into<String>, ty: FieldType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodKind {
    /// Builds a page from a call id and a batch of items.
    PageFactory,
    /// Builds a stream-control message for a call.
    StreamControl,
    /// Borrows the typed payload of a fault carrier.
    FaultPayload,
    /// Rebuilds the typed fault from a carrier and the fault text.
    IntoFault,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSchema {
    pub name: String,
    pub kind: MethodKind,
}

impl MethodSchema {
    pub fn new(name: impl Into<String>, kind: MethodKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// A generated type. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageNode {
    id: NodeId,
    name: String,
    qualified_name: String,
    display_name: String,
    role: MessageRole,
    key: Option<MessageKey>,
    fault_key: Option<u32>,
    operation: Option<usize>,
    base: Option<NodeId>,
    fields: Vec<FieldSchema>,
    methods: Vec<MethodSchema>,
    nested: Vec<NodeId>,
    doc: Option<String>,
}

impl MessageNode {
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Generated type name, e.g. `EchoRequest`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// `namespace.Contract.Type`.
    pub fn qualified_name(&self) -> &str {
        &self.qualified_name
    }

    /// Human-readable label used in logs and generated docs.
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn role(&self) -> MessageRole {
        self.role
    }

    /// Wire key. Markers and fault carriers have none.
    pub fn key(&self) -> Option<MessageKey> {
        self.key
    }

    /// Declared fault key, for fault carriers.
    pub fn fault_key(&self) -> Option<u32> {
        self.fault_key
    }

    /// Index of the operation this node was generated for.
    pub fn operation(&self) -> Option<usize> {
        self.operation
    }

    /// Static base this node descends from.
    pub fn base(&self) -> Option<NodeId> {
        self.base
    }

    pub fn fields(&self) -> &[FieldSchema] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn methods(&self) -> &[MethodSchema] {
        &self.methods
    }

    /// Nodes declared inside this one.
    pub fn nested(&self) -> &[NodeId] {
        &self.nested
    }

    pub fn doc(&self) -> Option<&str> {
        self.doc.as_deref()
    }

    /// Sibling order inside the hierarchy: wire key, then fault key.
    pub(crate) fn rank(&self) -> u64 {
        match (self.key, self.fault_key) {
            (Some(key), _) => u64::from(key.get()),
            (None, Some(fault_key)) => u64::from(fault_key),
            (None, None) => 0,
        }
    }
}

/// Accumulates a node's shape until [`finalize`](MessageBuilder::finalize).
#[derive(Debug, Clone)]
pub struct MessageBuilder {
    name: String,
    role: MessageRole,
    display_name: Option<String>,
    key: Option<MessageKey>,
    fault_key: Option<u32>,
    operation: Option<usize>,
    base: Option<NodeId>,
    fields: Vec<FieldSchema>,
    methods: Vec<MethodSchema>,
    nested: Vec<NodeId>,
    doc: Option<String>,
}

impl MessageBuilder {
    pub fn new(name: impl Into<String>, role: MessageRole) -> Self {
        Self {
            name: name.into(),
            role,
            display_name: None,
            key: None,
            fault_key: None,
            operation: None,
            base: None,
            fields: Vec::new(),
            methods: Vec::new(),
            nested: Vec::new(),
            doc: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn role(&self) -> MessageRole {
        self.role
    }

    pub fn key(mut self, key: MessageKey) -> Self {
        self.key = Some(key);
        self
    }

    pub fn fault_key(mut self, fault_key: u32) -> Self {
        self.fault_key = Some(fault_key);
        self
    }

    pub fn operation(mut self, index: usize) -> Self {
        self.operation = Some(index);
        self
    }

    pub fn base(mut self, base: NodeId) -> Self {
        self.base = Some(base);
        self
    }

    pub fn field(mut self, name: impl Into<String>, ty: FieldType) -> Self {
        self.fields.push(FieldSchema::new(name, ty));
        self
    }

    pub fn method(mut self, name: impl Into<String>, kind: MethodKind) -> Self {
        self.methods.push(MethodSchema::new(name, kind));
        self
    }

    pub fn nested(mut self, node: NodeId) -> Self {
        self.nested.push(node);
        self
    }

    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    /// Inject the display name. Builders finalized without one use a label
    /// derived from the role and type name.
    pub fn display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    /// Freeze into an immutable node at `id`, qualified under `prefix`.
    pub fn finalize(self, id: NodeId, prefix: &str) -> MessageNode {
        let qualified_name = if prefix.is_empty() {
            self.name.clone()
        } else {
            format!("{prefix}.{}", self.name)
        };
        let display_name = self
            .display_name
            .unwrap_or_else(|| format!("{} {}", self.name, self.role.describe()));
        MessageNode {
            id,
            name: self.name,
            qualified_name,
            display_name,
            role: self.role,
            key: self.key,
            fault_key: self.fault_key,
            operation: self.operation,
            base: self.base,
            fields: self.fields,
            methods: self.methods,
            nested: self.nested,
            doc: self.doc,
        }
    }
}
