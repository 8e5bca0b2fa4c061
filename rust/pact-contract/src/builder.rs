//! Fluent construction of contracts.
//!
//! ```
//! use pact_contract::{ContractDeclaration, OperationDeclaration, SerializerKind, TypeRef};
//!
//! let contract = ContractDeclaration::builder("acme.chat", "Chat")
//!     .serializer(SerializerKind::Postcard)
//!     .operation(
//!         OperationDeclaration::one_way("Notify")
//!             .arg(TypeRef::I32)
//!             .named_arg("text", TypeRef::String),
//!     )
//!     .operation(
//!         OperationDeclaration::request("Echo")
//!             .arg(TypeRef::String)
//!             .returns(TypeRef::String),
//!     )
//!     .build();
//!
//! assert_eq!(contract.operations().len(), 2);
//! assert_eq!(contract.operations()[0].params()[1].wire_name(), "Arg2");
//! ```

use std::borrow::Cow;

use crate::{
    CallKind, ContractDeclaration, FaultDeclaration, FaultTypeDeclaration, OperationDeclaration,
    ParamDeclaration, SerializerKind, SourceLocation, TypeRef,
};

impl ContractDeclaration {
    pub fn builder(
        namespace: impl Into<Cow<'static, str>>,
        name: impl Into<Cow<'static, str>>,
    ) -> ContractBuilder {
        ContractBuilder {
            contract: ContractDeclaration {
                namespace: namespace.into(),
                name: name.into(),
                operations: Vec::new(),
                serializers: Vec::new(),
                default_serializer: None,
                fault_types: Vec::new(),
                stream_item_types: Vec::new(),
                doc: None,
            },
        }
    }
}

/// Collects operations, registries and serializer choices into a [`ContractDeclaration`].
#[derive(Debug, Clone)]
pub struct ContractBuilder {
    contract: ContractDeclaration,
}

impl ContractBuilder {
    pub fn operation(mut self, operation: impl Into<OperationDeclaration>) -> Self {
        self.contract.operations.push(operation.into());
        self
    }

    /// Configure a serializer back end. Repeats are ignored.
    pub fn serializer(mut self, kind: SerializerKind) -> Self {
        if !self.contract.serializers.contains(&kind) {
            self.contract.serializers.push(kind);
        }
        self
    }

    /// Serializer resolved by stubs constructed without an explicit choice.
    pub fn default_serializer(mut self, kind: SerializerKind) -> Self {
        self.contract.default_serializer = Some(kind);
        self
    }

    /// Register a fault payload type.
    pub fn fault_type(mut self, ty: TypeRef) -> Self {
        self.contract.fault_types.push(FaultTypeDeclaration { ty, extends: None });
        self
    }

    /// Register a fault payload type that specializes another registered one.
    pub fn fault_subtype(mut self, ty: TypeRef, extends: TypeRef) -> Self {
        self.contract.fault_types.push(FaultTypeDeclaration {
            ty,
            extends: Some(extends),
        });
        self
    }

    /// Register a type operations may stream.
    pub fn stream_item(mut self, ty: TypeRef) -> Self {
        if !self.contract.stream_item_types.contains(&ty) {
            self.contract.stream_item_types.push(ty);
        }
        self
    }

    pub fn doc(mut self, doc: impl Into<Cow<'static, str>>) -> Self {
        self.contract.doc = Some(doc.into());
        self
    }

    /// Finish operation collection. The declaration is immutable from here on.
    pub fn build(self) -> ContractDeclaration {
        self.contract
    }
}

impl OperationDeclaration {
    pub fn builder(name: impl Into<Cow<'static, str>>, kind: CallKind) -> OperationBuilder {
        OperationBuilder {
            operation: OperationDeclaration {
                name: name.into(),
                kind,
                params: Vec::new(),
                result: None,
                input_stream: None,
                output_stream: None,
                faults: Vec::new(),
                prebuild: false,
                location: None,
                doc: None,
            },
        }
    }

    /// Fire-and-forget message to the server.
    pub fn one_way(name: impl Into<Cow<'static, str>>) -> OperationBuilder {
        Self::builder(name, CallKind::OneWayToServer)
    }

    /// Request/response call handled by the server.
    pub fn request(name: impl Into<Cow<'static, str>>) -> OperationBuilder {
        Self::builder(name, CallKind::RequestResponseToServer)
    }

    /// Fire-and-forget message the server sends to the client.
    pub fn callback_one_way(name: impl Into<Cow<'static, str>>) -> OperationBuilder {
        Self::builder(name, CallKind::OneWayToClient)
    }

    /// Request/response call the server makes on the client.
    pub fn callback_request(name: impl Into<Cow<'static, str>>) -> OperationBuilder {
        Self::builder(name, CallKind::RequestResponseToClient)
    }
}

/// Builds one [`OperationDeclaration`]. Argument indices are assigned in call order.
#[derive(Debug, Clone)]
pub struct OperationBuilder {
    operation: OperationDeclaration,
}

impl OperationBuilder {
    fn next_index(&self) -> u32 {
        self.operation.params.len() as u32 + 1
    }

    pub fn arg(mut self, ty: TypeRef) -> Self {
        let param = ParamDeclaration::argument(self.next_index(), ty, None);
        self.operation.params.push(param);
        self
    }

    pub fn named_arg(mut self, name: impl Into<Cow<'static, str>>, ty: TypeRef) -> Self {
        let param = ParamDeclaration::argument(self.next_index(), ty, Some(name.into()));
        self.operation.params.push(param);
        self
    }

    /// Declare the return type. A unit type is the same as not returning anything.
    pub fn returns(mut self, ty: TypeRef) -> Self {
        self.operation.result = if ty.is_unit() {
            None
        } else {
            Some(ParamDeclaration::result(ty))
        };
        self
    }

    pub fn input_stream(mut self, item: TypeRef) -> Self {
        self.operation.input_stream = Some(item);
        self
    }

    pub fn output_stream(mut self, item: TypeRef) -> Self {
        self.operation.output_stream = Some(item);
        self
    }

    pub fn fault(mut self, key: u32, payload: TypeRef) -> Self {
        self.operation.faults.push(FaultDeclaration { key, payload });
        self
    }

    pub fn prebuild(mut self) -> Self {
        self.operation.prebuild = true;
        self
    }

    pub fn at(mut self, location: SourceLocation) -> Self {
        self.operation.location = Some(location);
        self
    }

    pub fn doc(mut self, doc: impl Into<Cow<'static, str>>) -> Self {
        self.operation.doc = Some(doc.into());
        self
    }

    pub fn build(self) -> OperationDeclaration {
        self.operation
    }
}

impl From<OperationBuilder> for OperationDeclaration {
    fn from(builder: OperationBuilder) -> Self {
        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indices_follow_declaration_order() {
        let op = OperationDeclaration::request("Sum")
            .arg(TypeRef::I32)
            .named_arg("b", TypeRef::I32)
            .returns(TypeRef::I64)
            .build();

        let indices: Vec<u32> = op.params().iter().map(ParamDeclaration::index).collect();
        assert_eq!(indices, vec![1, 2]);
        assert_eq!(op.result().map(ParamDeclaration::wire_name), Some("Result"));
    }

    #[test]
    fn unit_return_is_no_return() {
        let op = OperationDeclaration::request("Ping").returns(TypeRef::Unit).build();
        assert!(op.result().is_none());
    }

    #[test]
    fn serializers_are_deduplicated() {
        let contract = ContractDeclaration::builder("", "Svc")
            .serializer(SerializerKind::Json)
            .serializer(SerializerKind::Json)
            .serializer(SerializerKind::Postcard)
            .build();
        assert_eq!(
            contract.serializers(),
            &[SerializerKind::Json, SerializerKind::Postcard]
        );
        assert_eq!(contract.qualified_name(), "Svc");
    }
}
