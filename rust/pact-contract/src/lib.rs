#![deny(unsafe_code)]

//! Contract model for pact services.
//!
//! A contract is a declarative description of a service: its operations, how each
//! one is called ([`CallKind`]), the shapes of its parameters and results, any
//! streams it opens, the typed faults it may raise, and which serializer back ends
//! its messages are bound to.
//!
//! This crate only describes contracts. [`pact-codegen`] consumes them and produces
//! the message catalog, stubs, dispatchers and serializer adapters.
//!
//! ```text
//! ContractDeclaration    →    pact-codegen    →    message catalog, stubs, dispatchers
//!   (this crate)             (build script)           (generated code)
//! ```
//!
//! Declared types are [`TypeRef`] values. They can be spelled out directly or
//! derived from a Rust type through its `facet` shape with [`TypeRef::of`].
//!
//! [`pact-codegen`]: https://docs.rs/pact-codegen

mod builder;
mod declaration;
mod shape;
mod types;

pub use builder::*;
pub use declaration::*;
pub use types::*;
