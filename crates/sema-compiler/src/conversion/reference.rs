//! Reference binding.

use sema_core::{Type, TypeHash};

use super::relations::{equal_or_more_qualified, reference_compatible, reference_related};
use super::user_defined::{collect_conversion_functions, describe_candidates};
use super::{
    ConversionFailure, ConversionKind, ConversionSequence, StandardConversion,
    UserDefinedConversion, implicit_conversion,
};
use crate::context::CompilationContext;
use crate::expr_info::ExprInfo;
use crate::overload::{OverloadRequest, Resolution, Seed, resolve_seeded};
use crate::template::complete_instance;

/// Bind a reference of type `target` to `source`.
///
/// Tries, in order: direct binding to an lvalue, binding to the reference
/// returned by a conversion function, and for `const` references a
/// temporary initialized by an implicit conversion.
pub(crate) fn reference_binding(
    ctx: &mut CompilationContext,
    target: &Type,
    source: &ExprInfo,
    allow_user_defined: bool,
) -> Result<ConversionSequence, ConversionFailure> {
    let param = target.strip_reference().clone();
    let arg = source.value_type().clone();
    let mut ambiguity = None;

    if source.is_lvalue() && !source.is_bitfield && reference_compatible(ctx, &param, &arg) {
        return Ok(ConversionSequence::Standard(direct_binding(ctx, &param, &arg)));
    }

    if allow_user_defined && arg.is_record() {
        match bind_conversion_result(ctx, &param, source) {
            Ok(seq) => return Ok(seq),
            Err(ConversionFailure::Ambiguous { candidates }) => ambiguity = Some(candidates),
            Err(_) => {}
        }
    }

    if param.is_const() && !param.is_volatile() {
        if !source.is_lvalue() && arg.is_record() && reference_compatible(ctx, &param, &arg) {
            return Ok(ConversionSequence::Standard(direct_binding(ctx, &param, &arg)));
        }
        // A temporary of the referenced type, unless the reference would
        // drop qualifiers of a related type.
        if !(reference_related(ctx, &param, &arg) && !equal_or_more_qualified(&param, &arg)) {
            match implicit_conversion(ctx, &param, source, allow_user_defined) {
                Ok(mut seq) => {
                    seq.set_reference_binding();
                    if let ConversionSequence::Standard(standard) = &mut seq {
                        standard.target = param;
                    }
                    return Ok(seq);
                }
                Err(ConversionFailure::Ambiguous { candidates }) => ambiguity = Some(candidates),
                Err(_) => {}
            }
        }
    }

    match ambiguity {
        Some(candidates) => Err(ConversionFailure::Ambiguous { candidates }),
        None => Err(ConversionFailure::NoConversion),
    }
}

/// One-step sequence binding `cv T&` directly to an object of type `arg`.
fn direct_binding(ctx: &CompilationContext, param: &Type, arg: &Type) -> StandardConversion {
    let kind = if param.is_record() && arg.is_record() && ctx.is_base_of(param, arg) {
        ConversionKind::DerivedToBase
    } else if param.qualifiers().cv() != arg.qualifiers().cv() {
        ConversionKind::Qualification
    } else {
        ConversionKind::Identity
    };
    let mut seq = StandardConversion::single(kind, arg.clone(), param.clone());
    seq.reference_binding = true;
    seq
}

/// Whether conversion function `hash` returns a reference that `param`
/// can bind to.
fn yields_compatible_reference(ctx: &CompilationContext, hash: TypeHash, param: &Type) -> bool {
    ctx.registry.get_function(hash).is_some_and(|f| {
        f.return_type.is_reference() && reference_compatible(ctx, param, f.return_type.strip_reference())
    })
}

/// Bind to the lvalue returned by the best conversion function of the
/// source class.
fn bind_conversion_result(
    ctx: &mut CompilationContext,
    param: &Type,
    source: &ExprInfo,
) -> Result<ConversionSequence, ConversionFailure> {
    let arg = source.value_type().unqualified().clone();
    let Some(record) = arg.record_type() else {
        return Err(ConversionFailure::NoConversion);
    };
    complete_instance(ctx, record.hash);

    let seeds: Vec<Seed> = collect_conversion_functions(ctx, record.hash)
        .into_iter()
        .filter(|&hash| yields_compatible_reference(ctx, hash, param))
        .map(Seed::new)
        .collect();
    if seeds.is_empty() {
        return Err(ConversionFailure::NoConversion);
    }

    let request = OverloadRequest::new("conversion", Vec::new(), vec![source.clone()])
        .with_object(source.clone());
    let winner = match resolve_seeded(ctx, &request, seeds) {
        Resolution::Unique(candidate) => candidate,
        Resolution::Ambiguous(candidates) => {
            return Err(ConversionFailure::Ambiguous {
                candidates: describe_candidates(&candidates),
            });
        }
        Resolution::NoMatch => return Err(ConversionFailure::NoConversion),
    };

    let produced = winner.function.return_type.strip_reference().clone();
    let kind = if param.is_record() && produced.is_record() && ctx.is_base_of(param, &produced) {
        ConversionKind::DerivedToBase
    } else {
        ConversionKind::Identity
    };
    let mut second = StandardConversion::single(kind, produced, param.clone());
    second.reference_binding = true;

    Ok(ConversionSequence::UserDefined(UserDefinedConversion {
        first: StandardConversion::single(ConversionKind::Identity, arg.clone(), arg),
        function: winner.function.func_hash,
        via_constructor: false,
        second,
        reference_binding: true,
    }))
}
