use std::collections::BTreeSet;

use heck::ToUpperCamelCase;
use pact_contract::{ContractDeclaration, OperationDeclaration, TypeRef};

use crate::faults;
use crate::hierarchy::Hierarchy;
use crate::keys::{KeyTable, MessageKey, OperationKeys, SystemMessage};
use crate::names::MethodNames;
use crate::{CompileError, Diagnostics};

use super::{
    CatalogBuilder, FieldType, MessageBuilder, MessageCatalog, MessageRole, MethodKind, NodeId,
    OperationMessages,
};

/// Emit the message catalog for `contract` and resolve its hierarchy.
///
/// Operations with `accepted[i] == false` are not generated. An operation
/// whose generated type or method names collide with an earlier one is
/// skipped here and its flag cleared.
pub(crate) fn generate(
    contract: &ContractDeclaration,
    keys: &KeyTable,
    accepted: &mut [bool],
    diagnostics: &mut Diagnostics,
) -> Result<(MessageCatalog, Hierarchy), CompileError> {
    let contract_type = contract.name().to_upper_camel_case();
    let mut catalog = CatalogBuilder::new(contract.qualified_name());

    let base = catalog.push(
        MessageBuilder::new(
            format!("{contract_type}{}", MessageRole::MessageBase.suffix()),
            MessageRole::MessageBase,
        )
        .doc(format!("Every message of the `{contract_type}` contract.")),
    );

    let system = SystemMessage::ALL.map(|message| catalog.push(system_message(message, base)));

    let mut operations = Vec::with_capacity(contract.operations().len());
    let mut fault_sets = Vec::new();
    let mut methods = MethodNames::new();

    for (index, operation) in contract.operations().iter().enumerate() {
        if !accepted.get(index).copied().unwrap_or(false) {
            operations.push(None);
            continue;
        }
        let Some(block) = keys.operation(index) else {
            operations.push(None);
            continue;
        };

        let operation_type = operation.name().to_upper_camel_case();
        if let Some(name) = first_collision(&catalog, operation, &operation_type) {
            diagnostics.skip(
                operation,
                format!("generated type `{name}` collides with another generated type"),
            );
            accepted[index] = false;
            operations.push(None);
            continue;
        }
        if let Err(collision) = methods.claim(operation) {
            diagnostics.skip(
                operation,
                format!(
                    "generated method `{}` collides with another method of {}",
                    collision.name, collision.scope
                ),
            );
            accepted[index] = false;
            operations.push(None);
            continue;
        }

        let generated = match block.keys {
            OperationKeys::OneWay { message } => {
                let mut builder =
                    MessageBuilder::new(format!("{operation_type}Message"), MessageRole::OneWay)
                        .key(message)
                        .base(base)
                        .operation(index)
                        .display_name(format!("{contract_type}.{} message", operation.name()));
                builder = with_args(builder, operation);
                if let Some(doc) = operation.doc() {
                    builder = builder.doc(doc);
                }
                OperationMessages::OneWay {
                    message: catalog.push(builder),
                }
            }
            OperationKeys::RequestResponse {
                request,
                response,
                fault,
                input_page,
                output_page,
            } => {
                let label = format!("{contract_type}.{}", operation.name());

                let mut builder =
                    MessageBuilder::new(format!("{operation_type}Request"), MessageRole::Request)
                        .key(request)
                        .base(base)
                        .operation(index)
                        .field("CallId", FieldType::CallId)
                        .field("Options", FieldType::CallOptions)
                        .display_name(format!("{label} request"));
                builder = with_args(builder, operation);
                if operation.is_streaming() {
                    builder = builder.field("WindowSize", FieldType::WindowSize);
                }
                if let Some(doc) = operation.doc() {
                    builder = builder.doc(doc);
                }
                let request = catalog.push(builder);

                let mut builder =
                    MessageBuilder::new(format!("{operation_type}Response"), MessageRole::Response)
                        .key(response)
                        .base(base)
                        .operation(index)
                        .field("CallId", FieldType::CallId)
                        .display_name(format!("{label} response"));
                if let Some(result) = operation.result() {
                    builder =
                        builder.field(result.wire_name(), FieldType::Declared(result.ty().clone()));
                }
                let response = catalog.push(builder);

                let fault_set = (!operation.faults().is_empty()).then(|| {
                    faults::generate(&mut catalog, contract, index, operation, &operation_type)
                });

                let mut builder =
                    MessageBuilder::new(format!("{operation_type}Fault"), MessageRole::Fault)
                        .key(fault)
                        .base(base)
                        .operation(index)
                        .field("CallId", FieldType::CallId)
                        .field("Text", FieldType::Text)
                        .field("Code", FieldType::FaultCode)
                        .display_name(format!("{label} fault"));
                if let Some(set) = &fault_set {
                    builder = builder
                        .field("FaultData", FieldType::FaultData(set.marker))
                        .nested(set.marker);
                }
                let fault = catalog.push(builder);

                let mut page = |key: Option<MessageKey>,
                                item: Option<&TypeRef>,
                                role: MessageRole|
                 -> Option<NodeId> {
                    let (key, item) = (key?, item?);
                    let builder =
                        MessageBuilder::new(format!("{operation_type}{}", role.suffix()), role)
                            .key(key)
                            .base(base)
                            .operation(index)
                            .field("CallId", FieldType::CallId)
                            .field("Items", FieldType::Declared(TypeRef::list(item.clone())))
                            .method("page", MethodKind::PageFactory)
                            .display_name(format!("{label} {}", page_label(role)));
                    Some(catalog.push(builder))
                };
                let input_page = page(input_page, operation.input_stream(), MessageRole::InputPage);
                let output_page =
                    page(output_page, operation.output_stream(), MessageRole::OutputPage);

                let fault_data = fault_set.as_ref().map(|set| set.marker);
                fault_sets.extend(fault_set);

                OperationMessages::RequestResponse {
                    request,
                    response,
                    fault,
                    input_page,
                    output_page,
                    fault_data,
                }
            }
        };
        operations.push(Some(generated));
    }

    let (catalog, hierarchy) = catalog.finish(base, system, operations, fault_sets)?;
    tracing::debug!(
        contract = %contract.qualified_name(),
        nodes = catalog.len(),
        messages = catalog.messages().count(),
        "generated message catalog"
    );
    Ok((catalog, hierarchy))
}

fn page_label(role: MessageRole) -> &'static str {
    if role == MessageRole::InputPage {
        "input page"
    } else {
        "output page"
    }
}

fn with_args(mut builder: MessageBuilder, operation: &OperationDeclaration) -> MessageBuilder {
    for param in operation.params() {
        builder = builder.field(param.wire_name(), FieldType::Declared(param.ty().clone()));
    }
    builder
}

fn system_message(message: SystemMessage, base: NodeId) -> MessageBuilder {
    let builder = MessageBuilder::new(message.name(), MessageRole::System(message))
        .key(message.key())
        .base(base);
    match message {
        SystemMessage::Login => builder
            .field("Credentials", FieldType::Credentials)
            .field("Accepted", FieldType::Declared(TypeRef::Bool))
            .doc("Opens a session. The peer answers with `Accepted` set."),
        SystemMessage::Logout => builder.doc("Ends the session."),
        SystemMessage::Heartbeat => builder.doc("Keeps an idle connection alive."),
        SystemMessage::CancelRequest => builder
            .field("CallId", FieldType::CallId)
            .doc("Asks the callee to abandon an outstanding call."),
        SystemMessage::PageAck => builder
            .field("CallId", FieldType::CallId)
            .field("Consumed", FieldType::Consumed)
            .method("ack", MethodKind::StreamControl)
            .doc("Slides the sender's window forward by `Consumed` pages."),
        SystemMessage::StreamCancel => builder
            .field("CallId", FieldType::CallId)
            .field("Reason", FieldType::Declared(TypeRef::option(TypeRef::String)))
            .method("cancel", MethodKind::StreamControl)
            .doc("Tears a stream down without the close handshake."),
        SystemMessage::StreamClose => builder
            .field("CallId", FieldType::CallId)
            .method("close", MethodKind::StreamControl)
            .doc("Starts the two-phase stream teardown."),
        SystemMessage::StreamCloseAck => builder
            .field("CallId", FieldType::CallId)
            .method("close_ack", MethodKind::StreamControl)
            .doc("Completes the two-phase stream teardown."),
    }
}

/// Names `operation` would generate, in generation order.
fn planned_names(operation: &OperationDeclaration, operation_type: &str) -> Vec<String> {
    if operation.kind().is_one_way() {
        return vec![format!("{operation_type}Message")];
    }

    let mut names = vec![
        format!("{operation_type}Request"),
        format!("{operation_type}Response"),
    ];
    if !operation.faults().is_empty() {
        names.push(faults::marker_name(operation_type));
        names.extend(
            operation
                .faults()
                .iter()
                .map(|f| faults::adapter_name(operation_type, &f.payload)),
        );
    }
    names.push(format!("{operation_type}Fault"));
    if operation.input_stream().is_some() {
        names.push(format!("{operation_type}InputPage"));
    }
    if operation.output_stream().is_some() {
        names.push(format!("{operation_type}OutputPage"));
    }
    names
}

fn first_collision(
    catalog: &CatalogBuilder,
    operation: &OperationDeclaration,
    operation_type: &str,
) -> Option<String> {
    let mut own = BTreeSet::new();
    planned_names(operation, operation_type)
        .into_iter()
        .find(|name| catalog.is_taken(name) || !own.insert(name.clone()))
}

#[cfg(test)]
mod tests {
    use pact_contract::{ContractDeclaration, OperationDeclaration, TypeRef};

    use super::*;
    use crate::CodegenOptions;
    use crate::keys::allocate;

    fn build(contract: &ContractDeclaration) -> (MessageCatalog, Hierarchy, Vec<bool>, Diagnostics) {
        let keys = allocate(contract, &CodegenOptions::default()).unwrap();
        let mut accepted = vec![true; contract.operations().len()];
        let mut diagnostics = Diagnostics::new();
        let (catalog, hierarchy) =
            generate(contract, &keys, &mut accepted, &mut diagnostics).unwrap();
        (catalog, hierarchy, accepted, diagnostics)
    }

    #[test]
    fn request_response_triple() {
        let contract = ContractDeclaration::builder("acme", "Chat")
            .operation(
                OperationDeclaration::request("Echo")
                    .arg(TypeRef::String)
                    .returns(TypeRef::String),
            )
            .build();
        let (catalog, _, _, _) = build(&contract);

        let response = catalog.by_name("EchoResponse").unwrap();
        let names: Vec<&str> = response.fields().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["CallId", "Result"]);
        assert_eq!(response.qualified_name(), "acme.Chat.EchoResponse");

        let fault = catalog.by_name("EchoFault").unwrap();
        assert!(fault.field("FaultData").is_none());
        assert_eq!(fault.field("Code").map(|f| &f.ty), Some(&FieldType::FaultCode));
    }

    #[test]
    fn colliding_names_skip_the_operation() {
        // `Cancel` + `Request` is the system `CancelRequest`.
        let contract = ContractDeclaration::builder("", "Svc")
            .operation(OperationDeclaration::request("Cancel"))
            .operation(OperationDeclaration::one_way("Ping"))
            .build();
        let (catalog, _, accepted, diagnostics) = build(&contract);

        assert_eq!(accepted, vec![false, true]);
        assert!(catalog.operation(0).is_none());
        assert!(catalog.by_name("PingMessage").is_some());
        assert_eq!(diagnostics.for_operation("Cancel").count(), 1);
    }

    #[test]
    fn system_messages_descend_from_base() {
        let contract = ContractDeclaration::builder("", "Svc").build();
        let (catalog, hierarchy, _, _) = build(&contract);

        let walked = hierarchy.walk(catalog.message_base());
        let names: Vec<&str> = walked.iter().map(|&id| catalog.node(id).name()).collect();
        assert_eq!(
            names,
            vec![
                "Login",
                "Logout",
                "Heartbeat",
                "CancelRequest",
                "PageAck",
                "StreamCancel",
                "StreamClose",
                "StreamCloseAck"
            ]
        );
    }
}
