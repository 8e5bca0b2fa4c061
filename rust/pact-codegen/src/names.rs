//! Method names an operation adds to the generated surfaces.
//!
//! Type names are checked against the catalog; methods live in their own
//! namespaces (a caller surface, a handler trait, a dispatcher impl, the
//! module itself) and are tracked here.

use std::collections::BTreeSet;

use heck::ToSnakeCase;
use pact_contract::{Direction, OperationDeclaration};

use crate::client::CallStyle;

/// Where a generated method is declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum MethodScope {
    /// Inherent impl of the surface that invokes operations of this direction.
    Caller(Direction),
    /// Trait implemented by the peer that handles operations of this direction.
    Handler(Direction),
    /// Inherent impl of that peer's dispatcher.
    Dispatcher(Direction),
    /// Free functions of the generated module.
    Module,
}

impl MethodScope {
    fn describe(self) -> &'static str {
        match self {
            MethodScope::Caller(Direction::ToServer) => "the client",
            MethodScope::Caller(Direction::ToClient) => "the callback proxy",
            MethodScope::Handler(Direction::ToServer) => "the service trait",
            MethodScope::Handler(Direction::ToClient) => "the callback trait",
            MethodScope::Dispatcher(Direction::ToServer) => "the dispatcher",
            MethodScope::Dispatcher(Direction::ToClient) => "the callback dispatcher",
            MethodScope::Module => "the generated module",
        }
    }
}

/// Accessors every caller surface declares itself.
const CALLER_RESERVED: &[&str] = &[
    "new",
    "with_serializer",
    "serializer",
    "channel",
    "as_async",
    "as_try",
    "as_try_async",
];

/// Methods every dispatcher declares itself.
const DISPATCHER_RESERVED: &[&str] = &["new", "handler", "dispatch", "dispatch_message"];

/// A method `operation` would generate that is already declared in its scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct MethodCollision {
    pub name: String,
    pub scope: &'static str,
}

/// Method names claimed so far, per scope.
#[derive(Debug)]
pub(crate) struct MethodNames {
    taken: BTreeSet<(MethodScope, String)>,
}

impl MethodNames {
    pub(crate) fn new() -> Self {
        let mut taken = BTreeSet::new();
        for direction in [Direction::ToServer, Direction::ToClient] {
            for name in CALLER_RESERVED {
                taken.insert((MethodScope::Caller(direction), name.to_string()));
            }
            for name in DISPATCHER_RESERVED {
                taken.insert((MethodScope::Dispatcher(direction), name.to_string()));
            }
        }
        Self { taken }
    }

    /// Claim every method of `operation`, or report the first that is taken.
    ///
    /// Nothing is claimed when a collision is reported.
    pub(crate) fn claim(&mut self, operation: &OperationDeclaration) -> Result<(), MethodCollision> {
        let planned = planned_methods(operation);
        let mut own = BTreeSet::new();
        for entry in &planned {
            if self.taken.contains(entry) || !own.insert(entry.clone()) {
                return Err(MethodCollision {
                    name: entry.1.clone(),
                    scope: entry.0.describe(),
                });
            }
        }
        self.taken.extend(planned);
        Ok(())
    }
}

/// Every method `operation` adds, with the scope it is declared in.
fn planned_methods(operation: &OperationDeclaration) -> Vec<(MethodScope, String)> {
    let direction = operation.kind().direction();
    let base = operation.name().to_snake_case();
    let caller = MethodScope::Caller(direction);
    let mut methods = Vec::new();

    if operation.kind().is_request_response() && operation.is_streaming() {
        methods.push((caller, format!("open_{base}")));
    } else {
        methods.extend(CallStyle::ALL.map(|style| (caller, style.method_name(&base))));
        if operation.kind().is_one_way() && operation.prebuild() {
            let prebuilt = format!("{base}_prebuilt");
            methods.extend(CallStyle::ALL.map(|style| (caller, style.method_name(&prebuilt))));
            methods.push((MethodScope::Module, format!("prebuild_{base}")));
        }
    }

    let handler = MethodScope::Handler(direction);
    methods.push((handler, base.clone()));
    if operation.kind().is_request_response() && operation.result().is_some() {
        methods.push((handler, format!("on_{base}_sent")));
    }
    methods.push((MethodScope::Dispatcher(direction), format!("dispatch_{base}")));
    methods
}
