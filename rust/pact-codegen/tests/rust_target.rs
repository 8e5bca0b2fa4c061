use facet::Facet;
use pact_codegen::targets::rust::{RustCodegenOptions, generate};
use pact_codegen::{CodegenOptions, compile};
use pact_contract::{ContractDeclaration, OperationDeclaration, SerializerKind, TypeRef};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

#[derive(Facet)]
struct ChatMessage {
    author: String,
    body: String,
}

#[derive(Facet)]
struct RoomFull {
    capacity: u32,
}

fn chat() -> ContractDeclaration {
    ContractDeclaration::builder("acme", "Chat")
        .doc("Rooms and messages.")
        .serializer(SerializerKind::Postcard)
        .fault_type(TypeRef::of::<RoomFull>())
        .stream_item(TypeRef::of::<ChatMessage>())
        .operation(
            OperationDeclaration::request("Send")
                .named_arg("message", TypeRef::of::<ChatMessage>())
                .returns(TypeRef::of::<u64>())
                .fault(1, TypeRef::of::<RoomFull>()),
        )
        .operation(
            OperationDeclaration::request("History")
                .arg(TypeRef::of::<String>())
                .output_stream(TypeRef::of::<ChatMessage>()),
        )
        .operation(OperationDeclaration::one_way("Typing").prebuild())
        .operation(OperationDeclaration::callback_one_way("Delivered").arg(TypeRef::U64))
        .build()
}

#[test]
fn facet_types_become_named_refs() {
    assert_eq!(TypeRef::of::<ChatMessage>(), TypeRef::named("ChatMessage"));
    assert_eq!(TypeRef::of::<Vec<u8>>(), TypeRef::Bytes);
    assert_eq!(
        TypeRef::of::<Option<Vec<ChatMessage>>>(),
        TypeRef::option(TypeRef::list(TypeRef::named("ChatMessage")))
    );
}

#[test]
fn renders_complete_module() {
    init_tracing();
    let compiled = compile(&chat(), &CodegenOptions::default()).unwrap();
    assert!(compiled.diagnostics().is_empty(), "{:?}", compiled.diagnostics());

    let code = generate(&compiled, &RustCodegenOptions::default()).unwrap();

    assert!(code.starts_with("// @generated by pact-codegen\n"));
    assert!(code.contains("pub mod chat {"));
    assert!(code.contains("//! Rooms and messages."));
    assert!(code.contains("pub const SEND_REQUEST: u32 = 0x0010;"));
    assert!(code.contains("pub struct SendRequest {"));
    assert!(code.contains("#[facet(rename = \"Arg1\")]"));
    assert!(code.contains("pub arg1: super::ChatMessage,"));
    assert!(code.contains("pub struct HistoryOutputPage {"));
    assert!(code.contains("pub items: ::std::vec::Vec<super::ChatMessage>,"));
    assert!(code.contains("pub enum SendFaultData {"));

    // Server side handles Send, History and Typing; the client handles Delivered.
    assert!(code.contains("pub trait Chat"));
    assert!(code.contains("pub enum ChatInbound {"));
    assert!(code.contains("pub struct ChatDispatcher<H>"));
    assert!(code.contains("pub trait ChatCallbacks"));
    assert!(code.contains("pub struct ChatCallbackDispatcher<H>"));

    assert!(code.contains("pub struct ChatClient<C>"));
    assert!(code.contains("pub struct ChatCallbackProxy<C>"));
    assert!(code.contains("pub struct HistoryStream;"));
    assert!(code.contains("pub fn prebuild_typing("));

    assert!(code.contains("pub struct ChatPostcardAdapter;"));
    assert!(code.contains("pub struct ChatSerializers;"));
    assert!(!code.contains("::tracing::debug!"));
    assert!(code.trim_end().ends_with('}'));
}

#[test]
fn tracing_and_runtime_path_are_configurable() {
    init_tracing();
    let compiled = compile(&chat(), &CodegenOptions::default()).unwrap();
    let options = RustCodegenOptions {
        tracing: true,
        runtime_path: "crate::rt".to_string(),
    };
    let code = generate(&compiled, &options).unwrap();

    assert!(code.contains("::tracing::debug!(contract = \"acme.Chat\", operation = \"Send\""));
    assert!(code.contains("pub use crate::rt::{CallError,"));
    assert!(!code.contains("::pact_runtime"));
}

#[test]
fn output_is_stable() {
    let compiled = compile(&chat(), &CodegenOptions::default()).unwrap();
    let options = RustCodegenOptions::default();
    assert_eq!(
        generate(&compiled, &options).unwrap(),
        generate(&compiled, &options).unwrap()
    );
}
