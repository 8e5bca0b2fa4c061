use std::fmt;

use heck::{ToShoutySnakeCase, ToSnakeCase};
use pact_contract::{ParamDeclaration, TypeRef};

use crate::code_writer::CodeWriter;
use crate::keys::MessageKey;

pub fn hex_key(key: MessageKey) -> String {
    format!("0x{:04x}", key.get())
}

/// `EchoRequest` → `ECHO_REQUEST`.
pub fn const_name(type_name: &str) -> String {
    type_name.to_shouty_snake_case()
}

/// Wire property name to Rust field name: `Arg1` → `arg1`, `CallId` → `call_id`.
pub fn field_name(wire_name: &str) -> String {
    wire_name.to_snake_case()
}

/// Rust spelling of a declared type, as seen from inside the generated module.
pub fn rust_type(ty: &TypeRef) -> String {
    match ty {
        TypeRef::Unit => "()".into(),
        TypeRef::Bool => "bool".into(),
        TypeRef::U8 => "u8".into(),
        TypeRef::U16 => "u16".into(),
        TypeRef::U32 => "u32".into(),
        TypeRef::U64 => "u64".into(),
        TypeRef::U128 => "u128".into(),
        TypeRef::I8 => "i8".into(),
        TypeRef::I16 => "i16".into(),
        TypeRef::I32 => "i32".into(),
        TypeRef::I64 => "i64".into(),
        TypeRef::I128 => "i128".into(),
        TypeRef::F32 => "f32".into(),
        TypeRef::F64 => "f64".into(),
        TypeRef::Char => "char".into(),
        TypeRef::String => "::std::string::String".into(),
        TypeRef::Bytes => "::std::vec::Vec<u8>".into(),
        TypeRef::List(element) => format!("::std::vec::Vec<{}>", rust_type(element)),
        TypeRef::Option(inner) => format!("::std::option::Option<{}>", rust_type(inner)),
        TypeRef::Map(key, value) => format!(
            "::std::collections::HashMap<{}, {}>",
            rust_type(key),
            rust_type(value)
        ),
        TypeRef::Set(element) => {
            format!("::std::collections::HashSet<{}>", rust_type(element))
        }
        TypeRef::Array(element, len) => format!("[{}; {len}]", rust_type(element)),
        TypeRef::Tuple(elements) => {
            let inner = elements.iter().map(rust_type).collect::<Vec<_>>().join(", ");
            if elements.len() == 1 {
                format!("({inner},)")
            } else {
                format!("({inner})")
            }
        }
        // User types live next to the generated module.
        TypeRef::Named(path) => format!("super::{path}"),
        TypeRef::Unsupported(what) => format!("/* unsupported: {what} */"),
    }
}

/// Render a section through a [`CodeWriter`] starting `indent` levels deep.
/// Locals and keywords a declared parameter name must not shadow.
const RESERVED_IDENTS: &[&str] = &[
    "self", "call", "call_id", "request", "replies", "message", "options", "window_size", "type",
    "fn", "match", "mod", "move", "ref", "impl", "loop", "async", "await",
];

/// Name of `param` in generated signatures: the declared name in snake case,
/// or the wire field name when none was declared or it is reserved.
pub fn param_ident(param: &ParamDeclaration) -> String {
    param
        .declared_name()
        .map(|name| name.to_snake_case())
        .filter(|name| !name.is_empty() && !RESERVED_IDENTS.contains(&name.as_str()))
        .unwrap_or_else(|| field_name(param.wire_name()))
}

pub fn section<F>(indent: usize, body: F) -> Result<String, fmt::Error>
where
    F: FnOnce(&mut CodeWriter<&mut String>) -> fmt::Result,
{
    let mut out = String::new();
    let mut w = CodeWriter::new(&mut out);
    let guards: Vec<_> = (0..indent).map(|_| w.indent()).collect();
    body(&mut w)?;
    drop(guards);
    Ok(out)
}
