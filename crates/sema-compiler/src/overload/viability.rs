//! Viability checks for overload candidates.
//!
//! A candidate is viable if the argument count fits its parameter list and
//! every argument (and the implicit object, for members) has an implicit
//! conversion sequence to the corresponding parameter.

use sema_core::{FunctionEntry, Type};
use tracing::trace;

use super::{Candidate, OverloadRequest, Seed};
use crate::context::CompilationContext;
use crate::conversion::{ConversionKind, ConversionSequence, StandardConversion, convert};
use crate::expr_info::ExprInfo;
use crate::template::instantiate_candidate;

/// Build the viable candidates for `seeds`, in seed order.
pub(super) fn viable_candidates(ctx: &mut CompilationContext, req: &OverloadRequest, seeds: Vec<Seed>) -> Vec<Candidate> {
    let mut viable: Vec<Candidate> = seeds
        .into_iter()
        .rev()
        .filter_map(|seed| viable_candidate(ctx, req, seed))
        .collect();
    viable.reverse();
    viable
}

/// Check one candidate.
///
/// # Returns
///
/// The candidate with its conversion sequences, or `None` if it is not
/// viable.
fn viable_candidate(ctx: &mut CompilationContext, req: &OverloadRequest, seed: Seed) -> Option<Candidate> {
    let declared = ctx.registry.get_function(seed.function)?.clone();

    // Operator members take their left operand as the implicit object.
    let (object, args): (Option<&ExprInfo>, &[ExprInfo]) = if req.is_operator && declared.has_implicit_object() {
        let (first, rest) = req.args.split_first()?;
        (Some(first), rest)
    } else {
        (req.object.as_ref(), &req.args)
    };

    let template = declared.template;
    let (function, delayed) = match template {
        Some(template) => {
            let instance = instantiate_candidate(ctx, template, &req.explicit_args, args, req.span)?;
            let function = ctx.registry.get_function(instance.hash)?.clone();
            (function, instance.delayed)
        }
        None => (declared, false),
    };

    let mut conversions = Vec::with_capacity(args.len() + 1);
    let has_object = match object {
        Some(object) if function.owner.is_some() && !function.is_constructor() => {
            conversions.push(object_conversion(ctx, &function, object)?);
            true
        }
        _ => false,
    };

    if function.is_conversion() {
        return Some(Candidate {
            function,
            conversions,
            has_object,
            second_conversion: seed.second_conversion,
            delayed_problem: false,
        });
    }

    if !count_fits(&function, args.len(), req.is_operator) {
        trace!(candidate = %function, args = args.len(), "argument count does not fit");
        return None;
    }

    let params: Vec<Type> = function.param_types().cloned().collect();
    for (i, arg) in args.iter().enumerate() {
        let Some(param) = params.get(i) else {
            conversions.push(ConversionSequence::Ellipsis);
            continue;
        };
        match convert(ctx, param, arg, req.allow_user_defined) {
            Ok(seq) => conversions.push(seq),
            Err(failure) => {
                trace!(candidate = %function, index = i, %failure, "argument does not convert");
                return None;
            }
        }
    }

    let delayed_problem = delayed && args.len() < params.len();
    Some(Candidate {
        function,
        conversions,
        has_object,
        second_conversion: seed.second_conversion,
        delayed_problem,
    })
}

/// Whether `args` arguments can be passed to `function`.
fn count_fits(function: &FunctionEntry, args: usize, is_operator: bool) -> bool {
    let params = function.params.len();
    if is_operator {
        return params == args;
    }
    params == args || (params < args && function.variadic) || (params > args && function.required_params() <= args)
}

/// Sequence binding the implicit object argument to `cv X&`.
///
/// Static members accept any object; the sequence is an identity
/// placeholder the ranking ignores. Members inherited from a base bind
/// through a derived-to-base step.
fn object_conversion(ctx: &CompilationContext, function: &FunctionEntry, object: &ExprInfo) -> Option<ConversionSequence> {
    let owner = function.owner.as_ref()?;
    let source = object.value_type().clone();
    let target = Type::Record(owner.clone()).qualified(function.cv);
    if function.is_static {
        let seq = StandardConversion::single(ConversionKind::Identity, source, target);
        return Some(ConversionSequence::Standard(seq));
    }

    let object_cv = source.qualifiers().cv();
    if !function.cv.is_equal_or_more_than(object_cv) {
        trace!(candidate = %function, "object is more qualified than the member function");
        return None;
    }
    let owner_type = Type::Record(owner.clone());
    let kind = if source.record_type().is_some_and(|r| r.hash != owner.hash) {
        if !ctx.is_unambiguous_base_of(&owner_type, &source) {
            trace!(candidate = %function, "object is not derived from the member's class");
            return None;
        }
        ConversionKind::DerivedToBase
    } else if function.cv.cv() == object_cv {
        ConversionKind::Identity
    } else {
        ConversionKind::Qualification
    };
    let mut seq = StandardConversion::single(kind, source, target);
    seq.reference_binding = true;
    Some(ConversionSequence::Standard(seq))
}
