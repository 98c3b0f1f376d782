//! Parameter reconciliation
//!
//! Turns a request's params into the argument list a handler receives.
//! Two passes run in order:
//!
//! 1. [`fill_defaults`]: when the caller sent fewer params than the service
//!    declares, declared defaults are added by name for the parameters not
//!    already covered.
//! 2. [`bind_arguments`]: params keyed by name (first key a string) are
//!    reordered into the callable's declaration order; other params are
//!    taken by index, falling back to a same-named entry.
//!
//! Optional parameters nobody supplied become `null` in the named case and
//! the callable's own default (or `null`) in the positional case. A missing
//! required parameter is an `Invalid params` fault. Surplus positional
//! params are dropped.

use crate::signature::MethodSignature;
use serde_json::Value;
use smdrpc_core::{Fault, Params, ServiceParam};

/// Add declared defaults for parameters the caller left out
///
/// Only runs when `params` holds fewer entries than `declared`. For
/// positional params the leading declarations already satisfied by index
/// are skipped. A default replaces nothing but a missing or `null` entry.
pub fn fill_defaults(params: &mut Params, declared: &[ServiceParam]) {
    if params.len() >= declared.len() {
        return;
    }

    let skip = if params.is_associative() { 0 } else { params.len() };
    for param in declared.iter().skip(skip) {
        let (Some(name), Some(default)) = (param.name(), param.default_value()) else {
            continue;
        };
        if params.get_named(name).is_some_and(|v| !v.is_null()) {
            continue;
        }
        params.insert(name, default.clone());
    }
}

/// Bind params to the callable's parameter list
///
/// # Errors
///
/// `Fault::invalid_params()` when a required parameter has no value.
pub fn bind_arguments(params: &Params, signature: &MethodSignature) -> Result<Vec<Value>, Fault> {
    if params.first_is_named() {
        return bind_named(params, signature);
    }

    let mut args = Vec::with_capacity(signature.params().len());
    for (index, param) in signature.params().iter().enumerate() {
        let value = params
            .get_index(index)
            .or_else(|| params.get_named(param.name()));
        match value {
            Some(value) => args.push(value.clone()),
            None if param.is_optional() => {
                args.push(param.default_value().cloned().unwrap_or(Value::Null))
            }
            None => return Err(Fault::invalid_params()),
        }
    }
    Ok(args)
}

fn bind_named(params: &Params, signature: &MethodSignature) -> Result<Vec<Value>, Fault> {
    signature
        .params()
        .iter()
        .map(|param| match params.get_named(param.name()) {
            Some(value) => Ok(value.clone()),
            None if param.is_optional() => Ok(Value::Null),
            None => Err(Fault::invalid_params()),
        })
        .collect()
}
