//! Contract checks run before anything is generated.

use std::collections::BTreeSet;

use heck::ToUpperCamelCase;
use pact_contract::{ContractDeclaration, OperationDeclaration, TypeRef};

use crate::render::param_ident;
use crate::{CompileError, Diagnostics};

/// Check `contract`, returning for each operation whether it should be generated.
///
/// Unresolvable types and broken fault registries abort the whole contract;
/// everything else only skips the offending operation.
pub(crate) fn validate(
    contract: &ContractDeclaration,
    diagnostics: &mut Diagnostics,
) -> Result<Vec<bool>, CompileError> {
    check_fault_registry(contract)?;
    for operation in contract.operations() {
        check_symbols(contract, operation)?;
    }

    let mut seen = BTreeSet::new();
    let accepted: Vec<bool> = contract
        .operations()
        .iter()
        .map(|operation| {
            let ok = check_operation(operation, diagnostics);
            // A later operation with the same name is skipped even if the
            // first one was not generated.
            let unique = seen.insert(operation.name().to_upper_camel_case());
            if !unique {
                diagnostics.skip(
                    operation,
                    format!("duplicate operation name `{}`", operation.name()),
                );
            }
            ok && unique
        })
        .collect();

    tracing::debug!(
        operations = accepted.len(),
        accepted = accepted.iter().filter(|&&ok| ok).count(),
        "validated contract"
    );
    Ok(accepted)
}

fn check_fault_registry(contract: &ContractDeclaration) -> Result<(), CompileError> {
    for entry in contract.fault_types() {
        let Some(base) = &entry.extends else {
            continue;
        };
        if contract.fault_type(base).is_none() {
            return Err(CompileError::UnresolvedFaultBase {
                ty: entry.ty.clone(),
                base: base.clone(),
            });
        }

        let mut current = base;
        for _ in 0..contract.fault_types().len() {
            if current == &entry.ty {
                return Err(CompileError::CyclicFaultHierarchy {
                    ty: entry.ty.clone(),
                });
            }
            match contract.fault_type(current).and_then(|f| f.extends.as_ref()) {
                Some(next) => current = next,
                None => break,
            }
        }
    }
    Ok(())
}

fn check_symbols(
    contract: &ContractDeclaration,
    operation: &OperationDeclaration,
) -> Result<(), CompileError> {
    for fault in operation.faults() {
        if contract.fault_type(&fault.payload).is_none() {
            return Err(CompileError::UnresolvedFaultType {
                operation: operation.name().to_string(),
                ty: fault.payload.clone(),
                location: operation.location().cloned(),
            });
        }
    }
    for item in [operation.input_stream(), operation.output_stream()]
        .into_iter()
        .flatten()
    {
        if !contract.stream_item_types().contains(item) {
            return Err(CompileError::UnresolvedStreamItem {
                operation: operation.name().to_string(),
                ty: item.clone(),
                location: operation.location().cloned(),
            });
        }
    }
    Ok(())
}

/// Shape checks local to one operation. Reports every problem found.
fn check_operation(operation: &OperationDeclaration, diagnostics: &mut Diagnostics) -> bool {
    let mut ok = true;
    let mut skip = |diagnostics: &mut Diagnostics, message: String| {
        diagnostics.skip(operation, message);
        ok = false;
    };

    if !is_identifier(operation.name()) {
        skip(
            diagnostics,
            format!("`{}` is not a valid operation name", operation.name()),
        );
    }

    if operation.kind().is_one_way() {
        if let Some(result) = operation.result_type() {
            skip(
                diagnostics,
                format!("one-way operations cannot return a value (returns `{result}`)"),
            );
        }
        if operation.is_streaming() {
            skip(
                diagnostics,
                "one-way operations cannot declare streams".to_string(),
            );
        }
        if !operation.faults().is_empty() {
            skip(
                diagnostics,
                "one-way operations cannot declare faults".to_string(),
            );
        }
    } else if operation.prebuild() {
        diagnostics.warn_operation(
            operation,
            "pre-built sends only apply to one-way operations; flag ignored",
        );
    }

    let mut fault_keys = BTreeSet::new();
    for fault in operation.faults() {
        if !fault_keys.insert(fault.key) {
            skip(diagnostics, format!("duplicate fault key {}", fault.key));
        }
    }

    let mut idents = BTreeSet::new();
    for param in operation.params() {
        let ident = param_ident(param);
        if !idents.insert(ident.clone()) {
            skip(
                diagnostics,
                format!(
                    "argument {} would be named `{ident}`, like an earlier argument",
                    param.wire_name()
                ),
            );
        }
    }

    for (what, ty) in declared_types(operation) {
        if let Some(unsupported) = ty.find_unsupported() {
            skip(
                diagnostics,
                format!("{what} has type `{ty}`, which cannot be carried in a message ({unsupported})"),
            );
        }
    }

    ok
}

fn declared_types(operation: &OperationDeclaration) -> Vec<(String, &TypeRef)> {
    let mut out: Vec<(String, &TypeRef)> = operation
        .params()
        .iter()
        .map(|p| (format!("argument {}", p.wire_name()), p.ty()))
        .collect();
    if let Some(result) = operation.result_type() {
        out.push(("return value".to_string(), result));
    }
    if let Some(item) = operation.input_stream() {
        out.push(("input stream".to_string(), item));
    }
    if let Some(item) = operation.output_stream() {
        out.push(("output stream".to_string(), item));
    }
    for fault in operation.faults() {
        out.push((format!("fault {}", fault.key), &fault.payload));
    }
    out
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}
