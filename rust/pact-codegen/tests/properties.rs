use std::collections::BTreeSet;

use pact_codegen::client::Side;
use pact_codegen::hierarchy::HierarchyBuilder;
use pact_codegen::keys::MessageKey;
use pact_codegen::schema::{FieldType, MessageRole, NodeId};
use pact_codegen::server::{Dispatch, FaultBranch, InboundArm};
use pact_codegen::targets::rust::{RustCodegenOptions, generate};
use pact_codegen::{CodegenOptions, CompileError, CompiledContract, compile};
use pact_contract::{
    ContractDeclaration, OperationDeclaration, SerializerKind, SourceLocation, TypeRef,
};

fn compiled(contract: &ContractDeclaration) -> CompiledContract {
    compile(contract, &CodegenOptions::default()).expect("contract compiles")
}

/// A contract touching every kind of operation.
fn mixed() -> ContractDeclaration {
    ContractDeclaration::builder("acme", "Mixed")
        .stream_item(TypeRef::I32)
        .stream_item(TypeRef::String)
        .fault_type(TypeRef::named("Denied"))
        .operation(OperationDeclaration::one_way("Notify").arg(TypeRef::String))
        .operation(
            OperationDeclaration::request("Echo")
                .arg(TypeRef::String)
                .returns(TypeRef::String)
                .fault(1, TypeRef::named("Denied")),
        )
        .operation(OperationDeclaration::request("Count").output_stream(TypeRef::I32))
        .operation(
            OperationDeclaration::request("Upload")
                .input_stream(TypeRef::String)
                .returns(TypeRef::U64),
        )
        .operation(
            OperationDeclaration::request("Relay")
                .input_stream(TypeRef::String)
                .output_stream(TypeRef::I32),
        )
        .operation(OperationDeclaration::callback_one_way("Pushed").arg(TypeRef::I32))
        .operation(
            OperationDeclaration::callback_request("Confirm")
                .arg(TypeRef::String)
                .returns(TypeRef::Bool),
        )
        .build()
}

#[test]
fn keys_are_deterministic() {
    let first = compiled(&mixed());
    let second = compiled(&mixed());
    assert_eq!(first.keys(), second.keys());
    assert_eq!(first.catalog(), second.catalog());
}

#[test]
fn keys_are_unique() {
    let compiled = compiled(&mixed());
    let all = compiled.keys().all();
    let unique: BTreeSet<MessageKey> = all.iter().copied().collect();
    assert_eq!(unique.len(), all.len());

    let node_keys: Vec<MessageKey> = compiled.catalog().messages().filter_map(|n| n.key()).collect();
    let unique: BTreeSet<MessageKey> = node_keys.iter().copied().collect();
    assert_eq!(unique.len(), node_keys.len());
}

#[test]
fn call_id_has_one_type_everywhere() {
    let compiled = compiled(&mixed());
    let types: BTreeSet<String> = compiled
        .catalog()
        .nodes()
        .iter()
        .filter_map(|n| n.field("CallId"))
        .map(|f| format!("{:?}", f.ty))
        .collect();
    assert_eq!(types.len(), 1);
    assert!(types.contains(&format!("{:?}", FieldType::CallId)));
}

#[test]
fn one_page_per_stream_direction() {
    let contract = mixed();
    let compiled = compiled(&contract);
    let expected: usize = contract
        .operations()
        .iter()
        .map(|op| op.stream_directions())
        .sum();
    let pages = compiled
        .catalog()
        .nodes()
        .iter()
        .filter(|n| n.role().is_page())
        .count();
    assert_eq!(pages, expected);
}

#[test]
fn system_messages_exactly_once() {
    let compiled = compiled(&mixed());
    let system: Vec<&str> = compiled
        .catalog()
        .nodes()
        .iter()
        .filter(|n| matches!(n.role(), MessageRole::System(_)))
        .map(|n| n.name())
        .collect();
    assert_eq!(
        system,
        vec![
            "Login",
            "Logout",
            "Heartbeat",
            "CancelRequest",
            "PageAck",
            "StreamCancel",
            "StreamClose",
            "StreamCloseAck",
        ]
    );
}

#[test]
fn hierarchy_ignores_registration_order() {
    let root = NodeId::new(0);
    let a = NodeId::new(1);
    let b = NodeId::new(2);
    let a1 = NodeId::new(3);
    let a2 = NodeId::new(4);

    let mut forward = HierarchyBuilder::new();
    forward.register(root, None, 0);
    forward.register(a, Some(root), 1);
    forward.register(b, Some(root), 2);
    forward.register(a1, Some(a), 3);
    forward.register(a2, Some(a), 4);

    let mut backward = HierarchyBuilder::new();
    backward.register(a2, Some(a), 4);
    backward.register(a1, Some(a), 3);
    backward.register(b, Some(root), 2);
    backward.register(a, Some(root), 1);
    backward.register(root, None, 0);

    let forward = forward.build().unwrap();
    let backward = backward.build().unwrap();
    assert_eq!(forward.walk(root), backward.walk(root));
    assert_eq!(forward.walk(root), vec![a, a1, a2, b]);
}

#[test]
fn catch_chain_has_custom_faults_then_two_fallbacks() {
    let contract = ContractDeclaration::builder("acme", "Files")
        .fault_type(TypeRef::named("IoFault"))
        .fault_subtype(TypeRef::named("NotFound"), TypeRef::named("IoFault"))
        .fault_type(TypeRef::named("Busy"))
        .operation(
            OperationDeclaration::request("Open")
                .arg(TypeRef::String)
                .fault(1, TypeRef::named("IoFault"))
                .fault(2, TypeRef::named("NotFound"))
                .fault(3, TypeRef::named("Busy")),
        )
        .build();
    let compiled = compiled(&contract);

    let Some(InboundArm::Request(arm)) = compiled.server_dispatch().arm_for(0) else {
        panic!("Open has a request arm");
    };
    assert_eq!(arm.catch_chain.len(), 3 + 2);
    let payloads: Vec<&TypeRef> = arm
        .catch_chain
        .iter()
        .filter_map(|branch| match branch {
            FaultBranch::Custom { payload, .. } => Some(payload),
            _ => None,
        })
        .collect();
    // NotFound extends IoFault, so it is tried first.
    let not_found = payloads
        .iter()
        .position(|p| **p == TypeRef::named("NotFound"))
        .unwrap();
    let io = payloads
        .iter()
        .position(|p| **p == TypeRef::named("IoFault"))
        .unwrap();
    assert!(not_found < io);
    assert_eq!(arm.catch_chain[3], FaultBranch::Declared);
    assert_eq!(arm.catch_chain[4], FaultBranch::Unexpected);
}

#[test]
fn skipped_operation_keeps_sibling_keys() {
    let valid = ContractDeclaration::builder("acme", "Chat")
        .operation(OperationDeclaration::request("First").arg(TypeRef::I32))
        .operation(OperationDeclaration::one_way("Broken").arg(TypeRef::I32))
        .operation(OperationDeclaration::request("Last").returns(TypeRef::String))
        .build();
    let broken = ContractDeclaration::builder("acme", "Chat")
        .operation(OperationDeclaration::request("First").arg(TypeRef::I32))
        .operation(
            OperationDeclaration::one_way("Broken")
                .arg(TypeRef::I32)
                .returns(TypeRef::I32),
        )
        .operation(OperationDeclaration::request("Last").returns(TypeRef::String))
        .build();

    let valid = compiled(&valid);
    let broken = compiled(&broken);

    assert!(!broken.is_generated(1));
    assert_eq!(broken.diagnostics().for_operation("Broken").count(), 1);
    assert!(broken.catalog().by_name("BrokenMessage").is_none());

    for name in ["FirstRequest", "LastRequest", "LastResponse", "LastFault"] {
        let expected = valid.catalog().by_name(name).and_then(|n| n.key());
        let actual = broken.catalog().by_name(name).and_then(|n| n.key());
        assert_eq!(actual, expected, "{name}");
    }
}

#[test]
fn unregistered_fault_type_is_fatal() {
    let contract = ContractDeclaration::builder("acme", "Storage")
        .operation(
            OperationDeclaration::request("Upload")
                .fault(1, TypeRef::named("QuotaExceeded"))
                .at(SourceLocation::new("storage.rs", 7, 9)),
        )
        .build();
    let err = compile(&contract, &CodegenOptions::default()).unwrap_err();
    assert!(matches!(err, CompileError::UnresolvedFaultType { .. }));
    assert!(err.to_string().starts_with("storage.rs:7:9: "));
}

#[test]
fn cyclic_fault_registry_is_fatal() {
    let contract = ContractDeclaration::builder("acme", "Storage")
        .fault_subtype(TypeRef::named("A"), TypeRef::named("B"))
        .fault_subtype(TypeRef::named("B"), TypeRef::named("A"))
        .build();
    let err = compile(&contract, &CodegenOptions::default()).unwrap_err();
    assert!(matches!(err, CompileError::CyclicFaultHierarchy { .. }));
}

#[test]
fn key_space_overflow_is_fatal() {
    let contract = ContractDeclaration::builder("acme", "Big")
        .operation(OperationDeclaration::request("One"))
        .operation(OperationDeclaration::request("Two"))
        .build();
    let options = CodegenOptions {
        key_space_limit: 20,
        ..CodegenOptions::default()
    };
    let err = compile(&contract, &options).unwrap_err();
    assert_eq!(
        err,
        CompileError::KeySpaceExhausted {
            operation: "Two".to_string(),
            needed: 21,
            limit: 20,
        }
    );
}

#[test]
fn unconfigured_serializer_is_rejected() {
    let contract = ContractDeclaration::builder("acme", "Chat")
        .serializer(SerializerKind::Postcard)
        .serializer(SerializerKind::Json)
        .operation(OperationDeclaration::one_way("Notify"))
        .build();
    let compiled = compiled(&contract);
    let chooser = &compiled.serializers().chooser;

    assert_eq!(chooser.resolve(None), Ok(SerializerKind::Postcard));
    assert_eq!(
        chooser.resolve(Some(SerializerKind::Json)),
        Ok(SerializerKind::Json)
    );
    assert_eq!(
        chooser.resolve(Some(SerializerKind::Bincode)),
        Err(CompileError::SerializerNotConfigured {
            requested: SerializerKind::Bincode,
            contract: "acme.Chat".to_string(),
            configured: vec![SerializerKind::Postcard, SerializerKind::Json],
        })
    );
}

#[test]
fn unknown_key_is_reported() {
    let compiled = compiled(&mixed());
    let plan = compiled.server_dispatch();
    assert_eq!(
        plan.dispatch(MessageKey(9999)),
        Dispatch::Unknown {
            key: MessageKey(9999)
        }
    );

    let notify = compiled.keys().operation(0).unwrap().keys.outbound();
    match plan.dispatch(notify) {
        Dispatch::Arm(arm) => assert_eq!(arm.handler(), "notify"),
        other => panic!("expected an arm, got {other:?}"),
    }
}

#[test]
fn callbacks_route_to_the_other_side() {
    let compiled = compiled(&mixed());

    // Pushed and Confirm are callbacks: the server calls, the client handles.
    assert_eq!(compiled.client().methods_for(5).count(), 0);
    assert_eq!(compiled.callback_proxy().methods_for(5).count(), 4);
    assert_eq!(compiled.callback_proxy().methods_for(6).count(), 4);
    assert!(compiled.server_dispatch().arm_for(6).is_none());
    assert!(compiled.callback_dispatch().arm_for(6).is_some());
    assert!(compiled.callback_dispatch().arm_for(1).is_none());

    assert_eq!(
        compiled.surface(Side::Server).name,
        compiled.callback_proxy().name
    );
    assert_eq!(
        compiled.dispatch(Side::Client).dispatcher,
        compiled.callback_dispatch().dispatcher
    );
}

#[test]
fn diagnostics_carry_location_and_operation() {
    let contract = ContractDeclaration::builder("acme", "Chat")
        .operation(
            OperationDeclaration::one_way("Notify")
                .returns(TypeRef::I32)
                .at(SourceLocation::new("chat.rs", 3, 5)),
        )
        .build();
    let compiled = compiled(&contract);
    let error = compiled.diagnostics().errors().next().unwrap();
    assert_eq!(
        error.to_string(),
        "chat.rs:3:5: error in `Notify`: one-way operations cannot return a value (returns `i32`)"
    );
}

#[test]
fn colliding_method_names_skip_the_later_operation() {
    let contract = ContractDeclaration::builder("acme", "Chat")
        .operation(
            OperationDeclaration::request("Echo")
                .arg(TypeRef::String)
                .returns(TypeRef::String),
        )
        .operation(OperationDeclaration::request("EchoAsync").arg(TypeRef::String))
        .operation(OperationDeclaration::request("Channel"))
        .operation(OperationDeclaration::one_way("Message").arg(TypeRef::I32))
        .operation(OperationDeclaration::one_way("Ping"))
        .build();
    let compiled = compiled(&contract);

    assert!(compiled.is_generated(0));
    assert!(compiled.is_generated(4));
    for (index, name) in [(1, "EchoAsync"), (2, "Channel"), (3, "Message")] {
        assert!(!compiled.is_generated(index), "{name}");
        let diagnostic = compiled.diagnostics().for_operation(name).next().unwrap();
        assert!(diagnostic.is_error());
        assert!(diagnostic.message.contains("collides"), "{}", diagnostic.message);
    }

    let mut names: Vec<&str> = compiled
        .client()
        .methods
        .iter()
        .map(|m| m.name.as_str())
        .collect();
    let total = names.len();
    names.sort_unstable();
    names.dedup();
    assert_eq!(names.len(), total);
    assert!(compiled.server_dispatch().handler("message").is_none());

    let code = generate(&compiled, &RustCodegenOptions::default()).unwrap();
    assert_eq!(code.matches("pub fn channel(").count(), 1);
    assert_eq!(code.matches("fn dispatch_message").count(), 1);
}

#[test]
fn every_serializer_declares_the_same_unions() {
    let with = |serializers: &[SerializerKind]| {
        let mut builder = ContractDeclaration::builder("acme", "Files")
            .fault_type(TypeRef::named("IoFault"))
            .fault_subtype(TypeRef::named("NotFound"), TypeRef::named("IoFault"))
            .stream_item(TypeRef::Bytes)
            .operation(
                OperationDeclaration::request("Open")
                    .arg(TypeRef::String)
                    .returns(TypeRef::U64)
                    .fault(1, TypeRef::named("IoFault"))
                    .fault(2, TypeRef::named("NotFound")),
            )
            .operation(OperationDeclaration::one_way("Touch").arg(TypeRef::String))
            .operation(
                OperationDeclaration::request("Read")
                    .arg(TypeRef::U64)
                    .output_stream(TypeRef::Bytes),
            )
            .operation(OperationDeclaration::callback_one_way("Changed").arg(TypeRef::String));
        for kind in serializers {
            builder = builder.serializer(*kind);
        }
        compiled(&builder.build())
    };

    let forward = with(&[
        SerializerKind::Postcard,
        SerializerKind::MessagePack,
        SerializerKind::Json,
    ]);
    let adapters = &forward.serializers().adapters;
    assert_eq!(adapters.len(), 3);

    let first = &adapters[0];
    assert!(!first.message_union.members.is_empty());
    assert_eq!(first.fault_unions.len(), 1);
    assert_eq!(first.fault_unions[0].members.len(), 2);
    for adapter in &adapters[1..] {
        assert_eq!(adapter.message_union, first.message_union, "{}", adapter.name);
        assert_eq!(adapter.fault_unions, first.fault_unions, "{}", adapter.name);
    }

    // Configuration order changes which adapter comes first, not the unions.
    let reversed = with(&[
        SerializerKind::Json,
        SerializerKind::MessagePack,
        SerializerKind::Postcard,
    ]);
    let json = reversed.serializers().adapter(SerializerKind::Json).unwrap();
    assert_eq!(reversed.serializers().adapters[0].serializer, SerializerKind::Json);
    assert_eq!(json.message_union, first.message_union);
    assert_eq!(json.fault_unions, first.fault_unions);

    let tags: Vec<u32> = first.message_union.members.iter().map(|m| m.tag).collect();
    let unique: BTreeSet<u32> = tags.iter().copied().collect();
    assert_eq!(unique.len(), tags.len());
}
