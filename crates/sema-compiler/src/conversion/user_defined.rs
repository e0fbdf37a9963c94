//! User-defined conversions.
//!
//! This module handles conversions through:
//! - Converting constructors: non-explicit constructors with parameters
//! - Conversion functions: `operator T()`, including those inherited from
//!   base classes that are not hidden by one with the same result type
//!
//! The best function is picked by a nested overload resolution.

use rustc_hash::FxHashSet;
use sema_core::{Type, TypeHash};

use super::standard::standard_conversion;
use super::{
    ConversionFailure, ConversionKind, ConversionSequence, StandardConversion,
    UserDefinedConversion,
};
use crate::context::CompilationContext;
use crate::expr_info::ExprInfo;
use crate::overload::{Candidate, OverloadRequest, Resolution, Seed, resolve_seeded};
use crate::template::complete_instance;

/// Conversion functions visible in `record`: its own, then those of its
/// bases. A function is hidden by an earlier one with the same result type.
/// Explicit conversion functions are left out.
pub(crate) fn collect_conversion_functions(ctx: &CompilationContext, record: TypeHash) -> Vec<TypeHash> {
    let mut found = Vec::new();
    let mut visited = FxHashSet::default();
    collect_into(ctx, record, &mut found, &mut visited);
    found
}

fn collect_into(
    ctx: &CompilationContext,
    record: TypeHash,
    found: &mut Vec<TypeHash>,
    visited: &mut FxHashSet<TypeHash>,
) {
    if !visited.insert(record) {
        return;
    }
    for hash in ctx.registry.conversions_of(record) {
        let Some(func) = ctx.registry.get_function(hash) else {
            continue;
        };
        if func.is_explicit {
            continue;
        }
        let hidden = found.iter().any(|&other| {
            ctx.registry
                .get_function(other)
                .is_some_and(|f| f.return_type == func.return_type)
        });
        if !hidden {
            found.push(hash);
        }
    }
    for base in ctx.registry.direct_bases(record) {
        collect_into(ctx, base, found, visited);
    }
}

/// Converting constructors of `record`: non-explicit, with parameters.
pub(crate) fn converting_constructors(ctx: &CompilationContext, record: TypeHash) -> Vec<TypeHash> {
    ctx.registry
        .constructors_of(record)
        .into_iter()
        .filter(|&hash| {
            ctx.registry
                .get_function(hash)
                .is_some_and(|f| !f.is_explicit && !f.params.is_empty())
        })
        .collect()
}

/// Rendered functions for an ambiguity report.
pub(crate) fn describe_candidates(candidates: &[Candidate]) -> Vec<String> {
    candidates.iter().map(|c| c.function.to_string()).collect()
}

/// Copy-initialize an object of type `target` from `source` where at least
/// one side is a class.
pub(crate) fn user_defined_conversion(
    ctx: &mut CompilationContext,
    target: &Type,
    source: &ExprInfo,
) -> Result<ConversionSequence, ConversionFailure> {
    let param = target.unqualified().clone();
    let arg = source.value_type().unqualified().clone();

    let source_class = arg.record_type().map(|r| r.hash);
    let target_class = param.record_type().map(|r| r.hash);
    for class in [source_class, target_class].into_iter().flatten() {
        complete_instance(ctx, class);
    }

    match (target_class, source_class) {
        (Some(to), Some(from)) if to == from => Ok(ConversionSequence::Standard(
            StandardConversion::single(ConversionKind::Identity, arg, param),
        )),
        (Some(to), Some(from)) if ctx.registry.is_base_of(to, from) => {
            derived_to_base_class(ctx, to, &param, &arg, source)
        }
        (Some(to), _) => to_class(ctx, to, &param, &arg, source_class, source),
        (None, Some(from)) => to_non_class(ctx, from, &param, &arg, source),
        (None, None) => standard_conversion(ctx, target, source).map(ConversionSequence::Standard),
    }
}

/// Initialization of a class from an object of a derived class: one of the
/// target's converting constructors.
fn derived_to_base_class(
    ctx: &mut CompilationContext,
    target_class: TypeHash,
    param: &Type,
    arg: &Type,
    source: &ExprInfo,
) -> Result<ConversionSequence, ConversionFailure> {
    let seeds: Vec<Seed> = converting_constructors(ctx, target_class)
        .into_iter()
        .map(Seed::new)
        .collect();
    if seeds.is_empty() {
        // Implicitly declared copy constructor
        return Ok(ConversionSequence::Standard(StandardConversion::single(
            ConversionKind::DerivedToBase,
            arg.clone(),
            param.clone(),
        )));
    }

    let request = OverloadRequest::new("constructor", Vec::new(), vec![source.clone()]);
    let ctor = pick(ctx, &request, seeds)?;
    Ok(ConversionSequence::UserDefined(UserDefinedConversion {
        first: StandardConversion::single(ConversionKind::DerivedToBase, arg.clone(), param.clone()),
        function: ctor.function.func_hash,
        via_constructor: true,
        second: StandardConversion::single(ConversionKind::Identity, param.clone(), param.clone()),
        reference_binding: false,
    }))
}

/// Initialization of a class from an unrelated type: the target's
/// converting constructors compete with the source's conversion functions
/// yielding the target class or a class derived from it.
fn to_class(
    ctx: &mut CompilationContext,
    target_class: TypeHash,
    param: &Type,
    arg: &Type,
    source_class: Option<TypeHash>,
    source: &ExprInfo,
) -> Result<ConversionSequence, ConversionFailure> {
    let mut seeds = Vec::new();
    if let Some(from) = source_class {
        for hash in collect_conversion_functions(ctx, from) {
            let Some(func) = ctx.registry.get_function(hash) else {
                continue;
            };
            let yields = func.return_type.strip_reference().unqualified();
            if yields == param || (yields.is_record() && ctx.is_base_of(param, yields)) {
                seeds.push(Seed::new(hash));
            }
        }
    }
    seeds.extend(converting_constructors(ctx, target_class).into_iter().map(Seed::new));
    if seeds.is_empty() {
        return Err(ConversionFailure::NoConversion);
    }

    let mut request =
        OverloadRequest::new("conversion", Vec::new(), vec![source.clone()]).without_user_defined();
    if source_class.is_some() {
        request = request.with_object(source.clone());
    }
    let winner = pick(ctx, &request, seeds)?;

    let via_constructor = winner.function.is_constructor();
    let produced = if via_constructor {
        param.clone()
    } else {
        winner.function.return_type.strip_reference().unqualified().clone()
    };
    let second_kind = if !via_constructor && ctx.is_base_of(param, &produced) {
        ConversionKind::DerivedToBase
    } else {
        ConversionKind::Identity
    };
    Ok(ConversionSequence::UserDefined(UserDefinedConversion {
        first: StandardConversion::single(ConversionKind::Identity, arg.clone(), arg.clone()),
        function: winner.function.func_hash,
        via_constructor,
        second: StandardConversion::single(second_kind, produced, param.clone()),
        reference_binding: false,
    }))
}

/// Initialization of a non-class type from a class: conversion functions
/// whose result standard-converts to the target.
fn to_non_class(
    ctx: &mut CompilationContext,
    source_class: TypeHash,
    param: &Type,
    arg: &Type,
    source: &ExprInfo,
) -> Result<ConversionSequence, ConversionFailure> {
    let mut seeds = Vec::new();
    for hash in collect_conversion_functions(ctx, source_class) {
        let Some(func) = ctx.registry.get_function(hash) else {
            continue;
        };
        let result = ExprInfo::rvalue(func.return_type.clone());
        if let Ok(second) = standard_conversion(ctx, param, &result) {
            seeds.push(Seed::with_second(hash, ConversionSequence::Standard(second)));
        }
    }
    if seeds.is_empty() {
        return Err(ConversionFailure::NoConversion);
    }

    let request = OverloadRequest::new("conversion", Vec::new(), vec![source.clone()])
        .with_object(source.clone())
        .without_user_defined();
    let winner = pick(ctx, &request, seeds)?;

    let second = match winner.second_conversion {
        Some(ConversionSequence::Standard(seq)) => seq,
        _ => {
            let result = ExprInfo::rvalue(winner.function.return_type.clone());
            standard_conversion(ctx, param, &result)?
        }
    };
    Ok(ConversionSequence::UserDefined(UserDefinedConversion {
        first: StandardConversion::single(ConversionKind::Identity, arg.clone(), arg.clone()),
        function: winner.function.func_hash,
        via_constructor: false,
        second,
        reference_binding: false,
    }))
}

/// Run the nested resolution and map its outcome onto a conversion result.
fn pick(
    ctx: &mut CompilationContext,
    request: &OverloadRequest,
    seeds: Vec<Seed>,
) -> Result<Candidate, ConversionFailure> {
    match resolve_seeded(ctx, request, seeds) {
        Resolution::Unique(candidate) => Ok(candidate),
        Resolution::Ambiguous(candidates) => {
            tracing::debug!(count = candidates.len(), "ambiguous user-defined conversion");
            Err(ConversionFailure::Ambiguous {
                candidates: describe_candidates(&candidates),
            })
        }
        Resolution::NoMatch => Err(ConversionFailure::NoConversion),
    }
}
