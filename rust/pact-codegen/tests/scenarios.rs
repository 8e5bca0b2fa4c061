use pact_codegen::client::{CallStyle, ReturnShape};
use pact_codegen::schema::{FieldType, MessageNode, MessageRole, MethodKind, OperationMessages};
use pact_codegen::server::{FaultBranch, InboundArm};
use pact_codegen::targets::rust::{RustCodegenOptions, generate};
use pact_codegen::{CodegenOptions, CompiledContract, compile};
use pact_contract::{ContractDeclaration, OperationDeclaration, TypeRef};

fn compiled(contract: &ContractDeclaration) -> CompiledContract {
    compile(contract, &CodegenOptions::default()).expect("contract compiles")
}

/// Nodes generated for declared operations, in generation order.
fn user_nodes(compiled: &CompiledContract) -> Vec<&MessageNode> {
    compiled
        .catalog()
        .nodes()
        .iter()
        .filter(|node| node.operation().is_some())
        .collect()
}

fn field_names(node: &MessageNode) -> Vec<&str> {
    node.fields().iter().map(|f| f.name.as_str()).collect()
}

#[test]
fn one_way_notify() {
    let contract = ContractDeclaration::builder("acme", "Chat")
        .operation(
            OperationDeclaration::one_way("Notify")
                .arg(TypeRef::I32)
                .arg(TypeRef::String),
        )
        .build();
    let compiled = compiled(&contract);

    let user = user_nodes(&compiled);
    assert_eq!(user.len(), 1);
    let message = user[0];
    assert_eq!(message.name(), "NotifyMessage");
    assert_eq!(message.role(), MessageRole::OneWay);
    assert_eq!(field_names(message), vec!["Arg1", "Arg2"]);
    assert_eq!(
        message.field("Arg1").map(|f| &f.ty),
        Some(&FieldType::Declared(TypeRef::I32))
    );
    assert_eq!(
        message.field("Arg2").map(|f| &f.ty),
        Some(&FieldType::Declared(TypeRef::String))
    );

    let names: Vec<&str> = compiled
        .client()
        .methods_for(0)
        .map(|m| m.name.as_str())
        .collect();
    assert_eq!(
        names,
        vec!["notify", "notify_async", "try_notify", "try_notify_async"]
    );
}

#[test]
fn request_response_echo() {
    let contract = ContractDeclaration::builder("acme", "Chat")
        .operation(
            OperationDeclaration::request("Echo")
                .arg(TypeRef::String)
                .returns(TypeRef::String),
        )
        .build();
    let compiled = compiled(&contract);

    let names: Vec<&str> = user_nodes(&compiled).iter().map(|n| n.name()).collect();
    assert_eq!(names, vec!["EchoRequest", "EchoResponse", "EchoFault"]);

    let response = compiled.catalog().by_name("EchoResponse").unwrap();
    assert_eq!(
        response.field("Result").map(|f| &f.ty),
        Some(&FieldType::Declared(TypeRef::String))
    );

    let shapes: Vec<(CallStyle, ReturnShape)> = compiled
        .client()
        .methods_for(0)
        .map(|m| (m.style, m.returns.clone()))
        .collect();
    let value = ReturnShape::Value(TypeRef::String);
    let outcome = ReturnShape::Outcome(Some(TypeRef::String));
    assert_eq!(
        shapes,
        vec![
            (CallStyle::Blocking, value.clone()),
            (CallStyle::Async, ReturnShape::Awaitable(Box::new(value))),
            (CallStyle::Try, outcome.clone()),
            (CallStyle::TryAsync, ReturnShape::Awaitable(Box::new(outcome))),
        ]
    );
}

#[test]
fn output_stream_adds_one_page() {
    let contract = ContractDeclaration::builder("acme", "Metrics")
        .stream_item(TypeRef::I32)
        .operation(
            OperationDeclaration::request("Count")
                .arg(TypeRef::U32)
                .output_stream(TypeRef::I32),
        )
        .build();
    let compiled = compiled(&contract);

    let pages: Vec<&MessageNode> = compiled
        .catalog()
        .nodes()
        .iter()
        .filter(|n| n.role().is_page())
        .collect();
    assert_eq!(pages.len(), 1);
    let page = pages[0];
    assert_eq!(page.name(), "CountOutputPage");
    assert_eq!(field_names(page), vec!["CallId", "Items"]);
    assert_eq!(
        page.field("Items").map(|f| &f.ty),
        Some(&FieldType::Declared(TypeRef::list(TypeRef::I32)))
    );
    assert!(
        page.methods()
            .iter()
            .any(|m| m.name == "page" && m.kind == MethodKind::PageFactory)
    );

    // Streaming requests negotiate a window.
    let request = compiled.catalog().by_name("CountRequest").unwrap();
    assert_eq!(
        field_names(request),
        vec!["CallId", "Options", "Arg1", "WindowSize"]
    );
}

#[test]
fn stream_control_messages_are_shared() {
    let contract = ContractDeclaration::builder("acme", "Metrics")
        .stream_item(TypeRef::I32)
        .stream_item(TypeRef::String)
        .operation(OperationDeclaration::request("Count").output_stream(TypeRef::I32))
        .operation(
            OperationDeclaration::request("Tail")
                .input_stream(TypeRef::String)
                .output_stream(TypeRef::String),
        )
        .build();
    let compiled = compiled(&contract);

    for name in ["PageAck", "StreamCancel", "StreamClose", "StreamCloseAck"] {
        let count = compiled
            .catalog()
            .nodes()
            .iter()
            .filter(|n| n.name() == name)
            .count();
        assert_eq!(count, 1, "{name}");
    }

    let client = compiled.client();
    let count = client.stream(0).unwrap();
    let tail = client.stream(1).unwrap();
    assert_eq!(count.control, tail.control);
    assert_eq!(count.name, "open_count");
    assert!(count.input_page.is_none());
    assert!(tail.input_page.is_some() && tail.output_page.is_some());
}

#[test]
fn two_custom_faults() {
    let contract = ContractDeclaration::builder("acme", "Storage")
        .fault_type(TypeRef::named("QuotaExceeded"))
        .fault_type(TypeRef::named("Forbidden"))
        .operation(
            OperationDeclaration::request("Upload")
                .arg(TypeRef::Bytes)
                .fault(100, TypeRef::named("QuotaExceeded"))
                .fault(101, TypeRef::named("Forbidden")),
        )
        .build();
    let compiled = compiled(&contract);

    let set = compiled.catalog().fault_set(0).unwrap();
    assert_eq!(set.len(), 2);

    let mut payloads = Vec::new();
    for adapter in &set.adapters {
        let node = compiled.catalog().node(adapter.node);
        assert_eq!(node.role(), MessageRole::FaultAdapter);
        assert_eq!(node.fault_key(), Some(adapter.fault_key));
        let methods: Vec<MethodKind> = node.methods().iter().map(|m| m.kind).collect();
        assert_eq!(methods, vec![MethodKind::FaultPayload, MethodKind::IntoFault]);
        payloads.push(node.field("Payload").map(|f| f.ty.clone()).unwrap());
    }
    assert_eq!(
        payloads,
        vec![
            FieldType::Declared(TypeRef::named("QuotaExceeded")),
            FieldType::Declared(TypeRef::named("Forbidden")),
        ]
    );

    let fault = compiled.catalog().by_name("UploadFault").unwrap();
    assert_eq!(
        fault.field("FaultData").map(|f| &f.ty),
        Some(&FieldType::FaultData(set.marker))
    );
    let Some(OperationMessages::RequestResponse { fault_data, .. }) =
        compiled.catalog().operation(0)
    else {
        panic!("Upload is a request/response operation");
    };
    assert_eq!(*fault_data, Some(set.marker));

    let Some(InboundArm::Request(arm)) = compiled.server_dispatch().arm_for(0) else {
        panic!("Upload has a request arm");
    };
    let keys: Vec<Option<u32>> = arm
        .catch_chain
        .iter()
        .map(|branch| match branch {
            FaultBranch::Custom { fault_key, .. } => Some(*fault_key),
            _ => None,
        })
        .collect();
    assert_eq!(keys, vec![Some(100), Some(101), None, None]);
    assert_eq!(arm.catch_chain[2], FaultBranch::Declared);
    assert_eq!(arm.catch_chain[3], FaultBranch::Unexpected);

    let code = generate(&compiled, &RustCodegenOptions::default()).unwrap();
    let quota = code.find("into_custom::<super::QuotaExceeded>").unwrap();
    let forbidden = code.find("into_custom::<super::Forbidden>").unwrap();
    let declared = code.find("FaultCode::Declared").unwrap();
    assert!(quota < declared && forbidden < declared);
    assert!(code.contains("QuotaExceeded(UploadQuotaExceededFault) = 100,"));
    assert!(code.contains("Forbidden(UploadForbiddenFault) = 101,"));
}
