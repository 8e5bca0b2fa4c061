#![deny(unsafe_code)]

//! Contract-to-stub compiler for pact services.
//!
//! Takes a [`ContractDeclaration`](pact_contract::ContractDeclaration) and
//! produces, deterministically:
//!
//! - the closed catalog of message types that carry every call on the wire,
//!   each with a stable integer key ([`keys`], [`schema`]);
//! - caller surfaces for every call style, on the client and on the server's
//!   callback proxy ([`client`]);
//! - callee dispatch plans mapping each inbound key to its handler, with the
//!   fault catch chain ([`server`], [`faults`]);
//! - one adapter per configured serializer back end, declared from the type
//!   hierarchy ([`hierarchy`], [`serializers`]).
//!
//! # Usage: In Your build.rs
//!
//! ```ignore
//! use pact_codegen::{CodegenOptions, compile, targets};
//!
//! fn main() {
//!     let contract = my_service::chat_contract();
//!     let compiled = compile(&contract, &CodegenOptions::default()).unwrap();
//!     for diagnostic in compiled.diagnostics() {
//!         println!("cargo:warning={diagnostic}");
//!     }
//!
//!     let code = targets::rust::generate(&compiled, &Default::default()).unwrap();
//!     let out = std::path::Path::new(&std::env::var("OUT_DIR").unwrap()).join("chat.rs");
//!     std::fs::write(out, code).unwrap();
//! }
//! ```
//!
//! # The Pipeline
//!
//! ```text
//! validate → allocate keys → message schema → hierarchy → surfaces + dispatch → serializers
//! ```
//!
//! Operation-local problems become [`Diagnostic`]s and skip only that
//! operation. Problems that would leave the catalog inconsistent (an
//! unresolvable type, a cyclic fault registry, running out of keys) abort with
//! a [`CompileError`].

pub mod client;
pub mod code_writer;
mod compile;
mod diagnostics;
mod error;
pub mod faults;
pub mod hierarchy;
pub mod keys;
mod names;
mod options;
mod render;
pub mod schema;
pub mod serializers;
pub mod server;
pub mod targets;
mod validate;

pub use compile::{CompiledContract, compile};
pub use diagnostics::{Diagnostic, Diagnostics, Severity};
pub use error::{CompileError, HierarchyError};
pub use options::CodegenOptions;
