//! Rust code generation for pact contracts.
//!
//! Renders one self-contained module per contract against the `pact_runtime`
//! crate: message types and their keys, the message-base union, handler traits
//! with their dispatchers, client surfaces and serializer adapters.
//! Intended for use in build.rs scripts.

mod client;
mod messages;
mod serializers;
mod server;

use std::fmt;

use codegen::Scope;
use heck::ToSnakeCase;
use pact_contract::ParamDeclaration;

use crate::CompiledContract;
use crate::client::Side;
use crate::code_writer::CodeWriter;
use crate::render::{field_name, param_ident, rust_type, section};
use crate::schema::{FieldType, MessageCatalog, NodeId};
use crate::serializers::SerializerAdapter;

type Writer<'w> = CodeWriter<&'w mut String>;

/// Options for Rust code generation.
#[derive(Debug, Clone)]
pub struct RustCodegenOptions {
    /// Emit a `tracing::debug!` event for every dispatched call.
    ///
    /// Requires the `tracing` crate in the consuming crate.
    pub tracing: bool,

    /// Path of the runtime crate the generated code links against.
    pub runtime_path: String,
}

impl Default for RustCodegenOptions {
    fn default() -> Self {
        Self {
            tracing: false,
            runtime_path: "::pact_runtime".to_string(),
        }
    }
}

/// Generate the module for `compiled`.
pub fn generate(
    compiled: &CompiledContract,
    options: &RustCodegenOptions,
) -> Result<String, fmt::Error> {
    RustGenerator::new(compiled, options).generate()
}

/// Generate only the `message_key` module, unindented.
pub fn generate_message_keys(compiled: &CompiledContract) -> Result<String, fmt::Error> {
    let options = RustCodegenOptions::default();
    let ctx = Ctx {
        compiled,
        options: &options,
    };
    section(0, |w| ctx.message_keys(w))
}

/// Read-only view shared by the renderers.
#[derive(Clone, Copy)]
struct Ctx<'a> {
    compiled: &'a CompiledContract,
    options: &'a RustCodegenOptions,
}

/// A parameter as it appears in generated signatures.
struct Param {
    /// Name in signatures.
    ident: String,
    /// Name of the message field carrying it.
    field: String,
    ty: String,
}

impl<'a> Ctx<'a> {
    fn rt(self) -> &'a str {
        &self.options.runtime_path
    }

    fn catalog(self) -> &'a MessageCatalog {
        self.compiled.catalog()
    }

    fn name(self, id: NodeId) -> &'a str {
        self.catalog().node(id).name()
    }

    fn message_base(self) -> &'a str {
        self.name(self.catalog().message_base())
    }

    /// Unions are identical across adapters; any adapter will do.
    fn unions(self) -> Option<&'a SerializerAdapter> {
        self.compiled.serializers().adapters.first()
    }

    fn field_type(self, ty: &FieldType) -> String {
        match ty {
            FieldType::Declared(ty) => rust_type(ty),
            FieldType::CallId => "u64".to_string(),
            FieldType::CallOptions => "CallOptions".to_string(),
            FieldType::FaultCode => "FaultCode".to_string(),
            FieldType::WindowSize | FieldType::Consumed => "u32".to_string(),
            FieldType::Text => "::std::string::String".to_string(),
            FieldType::Credentials => "Credentials".to_string(),
            FieldType::FaultData(marker) => {
                format!("::std::option::Option<{}>", self.name(*marker))
            }
        }
    }

    fn params(self, params: &[ParamDeclaration]) -> Vec<Param> {
        params
            .iter()
            .map(|param| Param {
                ident: param_ident(param),
                field: field_name(param.wire_name()),
                ty: rust_type(param.ty()),
            })
            .collect()
    }

    /// `{variant}` of the fault data enum wrapping `adapter`.
    fn fault_variant(self, adapter: NodeId) -> String {
        let node = self.catalog().node(adapter);
        let operation_type = node
            .base()
            .map(|marker| self.name(marker))
            .and_then(|marker| marker.strip_suffix("FaultData"))
            .unwrap_or_default();
        node.name()
            .strip_prefix(operation_type)
            .and_then(|rest| rest.strip_suffix("Fault"))
            .filter(|variant| !variant.is_empty())
            .unwrap_or(node.name())
            .to_string()
    }
}

/// `a: A, b: B`
fn signature(params: &[Param]) -> String {
    params
        .iter()
        .map(|p| format!("{}: {}", p.ident, p.ty))
        .collect::<Vec<_>>()
        .join(", ")
}

/// `a, b`
fn forward(params: &[Param]) -> String {
    params
        .iter()
        .map(|p| p.ident.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Struct literal fields, `arg1: a, arg2`.
fn inits(params: &[Param]) -> String {
    params
        .iter()
        .map(|p| {
            if p.ident == p.field {
                p.field.clone()
            } else {
                format!("{}: {}", p.field, p.ident)
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Prepend `head` to a comma list that may be empty.
fn join_args(head: &str, rest: &str) -> String {
    match (head.is_empty(), rest.is_empty()) {
        (true, _) => rest.to_string(),
        (_, true) => head.to_string(),
        _ => format!("{head}, {rest}"),
    }
}

/// Generator for Rust code from a compiled contract.
struct RustGenerator<'a> {
    ctx: Ctx<'a>,
    scope: Scope,
}

impl<'a> RustGenerator<'a> {
    fn new(compiled: &'a CompiledContract, options: &'a RustCodegenOptions) -> Self {
        Self {
            ctx: Ctx { compiled, options },
            scope: Scope::new(),
        }
    }

    fn generate(mut self) -> Result<String, fmt::Error> {
        let ctx = self.ctx;
        let contract = ctx.compiled.contract();
        let rt = ctx.rt();

        self.scope.raw("// @generated by pact-codegen");
        self.scope.raw("// DO NOT EDIT - regenerate with build.rs\n");

        let mod_name = contract.name().to_snake_case();
        let mut header = format!("#[allow(clippy::all, unused)]\npub mod {mod_name} {{");
        if let Some(doc) = contract.doc() {
            for line in doc.lines().map(str::trim_end) {
                if line.is_empty() {
                    header.push_str("\n    //!");
                } else {
                    header.push_str(&format!("\n    //! {line}"));
                }
            }
        }
        self.scope.raw(header);
        self.scope.raw(format!(
            "    pub use {rt}::{{CallError, CallOptions, Credentials, FaultCode, Outcome, SerializerKind}};"
        ));
        self.scope
            .raw(format!("    #[allow(unused_imports)]\n    use {rt}::__private::facet;"));

        self.raw(section(1, |w| ctx.message_keys(w))?);
        self.raw(section(1, |w| ctx.messages(w))?);
        self.raw(section(1, |w| ctx.fault_data(w))?);
        self.raw(section(1, |w| ctx.message_base_union(w))?);

        for side in [Side::Server, Side::Client] {
            let plan = ctx.compiled.dispatch(side);
            if side == Side::Server || !plan.is_empty() {
                self.generate_dispatch(plan)?;
            }
        }

        for side in [Side::Client, Side::Server] {
            let surface = ctx.compiled.surface(side);
            if side == Side::Client || !surface.is_empty() {
                self.raw(section(1, |w| ctx.surface(w, surface))?);
            }
        }
        self.raw(section(1, |w| ctx.prebuild_helpers(w))?);
        self.raw(section(1, |w| ctx.serializers(w))?);

        self.scope.raw("}");

        Ok(self.scope.to_string())
    }

    fn raw(&mut self, text: String) {
        let text = text.trim_end();
        if !text.is_empty() {
            self.scope.raw(text);
        }
    }
}
