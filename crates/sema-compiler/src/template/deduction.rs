//! Template argument deduction.
//!
//! Explicit arguments are bound first, then a function template's
//! parameters are deduced from the call arguments, and whatever is left
//! comes from default arguments.

use std::rc::Rc;

use sema_core::{
    CompilationError, DeducedArgument, DeductionOrigin, DefaultArg, FunctionEntry, Span,
    TemplateArg, TemplateEntry, TemplateParam, TemplateParamId, Type, TypeHash,
};
use thiserror::Error;
use tracing::debug;

use super::ParseOutcome;
use super::matching::{MatchMode, MatchOutcome, Matcher};
use super::substitution::{SubstitutionMap, substitute_arg};
use crate::context::CompilationContext;
use crate::conversion::Comparison;
use crate::expr_info::ExprInfo;

/// Why deduction did not produce an argument list.
///
/// Parameter indices are 1-based.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DeductionError {
    #[error("not a template")]
    NotATemplate,
    #[error("too many template arguments: expected at most {expected}, got {got}")]
    TooManyArguments { expected: usize, got: usize },
    #[error("template argument {index} has the wrong kind")]
    KindMismatch { index: usize },
    #[error("no default argument for parameter {index}")]
    MissingDefault { index: usize },
    #[error("could not deduce parameter {index}")]
    CouldNotDeduce { index: usize },
    #[error("conflicting deductions for '{param}'")]
    AmbiguousBinding { param: Rc<str> },
    #[error("argument types do not match the parameter types")]
    Mismatch,
    #[error("expected {expected} call arguments, got {got}")]
    WrongArgumentCount { expected: usize, got: usize },
    /// A default argument fragment cannot be parsed yet.
    #[error("default argument could not be parsed yet")]
    Delayed,
    #[error("default argument failed: {0}")]
    DefaultFailed(String),
}

impl DeductionError {
    /// The error reported when the deduction failure is final.
    pub fn into_error(self, template: &str, span: Span) -> CompilationError {
        let template = template.to_string();
        match self {
            DeductionError::NotATemplate => CompilationError::NotATemplate { name: template, span },
            DeductionError::TooManyArguments { expected, got } => {
                CompilationError::TooManyTemplateArguments { template, expected, got, span }
            }
            DeductionError::KindMismatch { index } => {
                CompilationError::TemplateArgumentKindMismatch { template, index, span }
            }
            DeductionError::MissingDefault { index } => {
                CompilationError::MissingDefaultArgument { template, index, span }
            }
            DeductionError::CouldNotDeduce { index } => CompilationError::CouldNotDeduce { template, index, span },
            DeductionError::AmbiguousBinding { param } => CompilationError::AmbiguousTemplateBinding {
                template,
                param: param.to_string(),
                span,
            },
            DeductionError::Mismatch => CompilationError::DeductionMismatch { template, span },
            DeductionError::WrongArgumentCount { expected, got } => CompilationError::WrongArgumentCount {
                name: template,
                expected,
                got,
                span,
            },
            DeductionError::Delayed => CompilationError::DelayedParseProblem { name: template, span },
            DeductionError::DefaultFailed(reason) => CompilationError::InstantiationFailed {
                name: template,
                reason,
                span,
            },
        }
    }
}

/// Deduce the argument list of `template`.
///
/// # Arguments
///
/// * `explicit` - arguments written at the point of use, in parameter order
/// * `call_args` - call arguments for function templates
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn deduce(
    ctx: &mut CompilationContext,
    template: TypeHash,
    explicit: &[TemplateArg],
    call_args: Option<&[ExprInfo]>,
    span: Span,
) -> Result<Vec<DeducedArgument>, DeductionError> {
    let tpl = ctx
        .registry
        .get_template(template)
        .cloned()
        .ok_or(DeductionError::NotATemplate)?;
    let params = &tpl.params;

    if explicit.len() > params.len() {
        return Err(DeductionError::TooManyArguments {
            expected: params.len(),
            got: explicit.len(),
        });
    }

    let mut map = SubstitutionMap::new();
    let mut origins: Vec<Option<DeductionOrigin>> = vec![None; params.len()];

    // 1. Explicit arguments
    for (i, (param, arg)) in params.iter().zip(explicit).enumerate() {
        if !param.accepts(arg) {
            return Err(DeductionError::KindMismatch { index: i + 1 });
        }
        map.bind(param.id, arg.clone());
        origins[i] = Some(DeductionOrigin::Direct);
    }

    // 2. Deduction from the call
    if tpl.is_function() {
        if let Some(args) = call_args {
            let generic = generic_function(ctx, &tpl).ok_or(DeductionError::NotATemplate)?;
            deduce_from_call(ctx, params, &generic, args, &mut map)?;
            for (i, param) in params.iter().enumerate() {
                if origins[i].is_none() && map.is_bound(param.id) {
                    origins[i] = Some(DeductionOrigin::Deduced);
                }
            }
        }
    }

    // 3. Default arguments, in order, so later defaults may use earlier parameters
    for (i, param) in params.iter().enumerate() {
        if origins[i].is_some() {
            continue;
        }
        let arg = match &param.default {
            Some(DefaultArg::Arg(arg)) => substitute_arg(arg, &map),
            Some(DefaultArg::Fragment(fragment)) => {
                let parser = ctx.parser();
                match parser.parse_default(ctx, *fragment, &map) {
                    ParseOutcome::Parsed(arg) => arg,
                    ParseOutcome::Failed(reason) => return Err(DeductionError::DefaultFailed(reason)),
                    ParseOutcome::Delayed => {
                        debug!(template = %tpl.name, index = i + 1, %span, "default argument delayed");
                        return Err(DeductionError::Delayed);
                    }
                }
            }
            None if tpl.is_class() => return Err(DeductionError::MissingDefault { index: i + 1 }),
            None => return Err(DeductionError::CouldNotDeduce { index: i + 1 }),
        };
        map.bind(param.id, arg);
        origins[i] = Some(DeductionOrigin::Default);
    }

    let mut deduced = Vec::with_capacity(params.len());
    for (i, (param, origin)) in params.iter().zip(origins).enumerate() {
        match (map.get(param.id), origin) {
            (Some(arg), Some(origin)) => deduced.push(DeducedArgument::new(param.id, arg.clone(), origin)),
            _ => return Err(DeductionError::CouldNotDeduce { index: i + 1 }),
        }
    }
    Ok(deduced)
}

/// The generic signature of a function template.
pub(crate) fn generic_function(ctx: &CompilationContext, tpl: &TemplateEntry) -> Option<FunctionEntry> {
    tpl.function.and_then(|hash| ctx.registry.get_function(hash)).cloned()
}

/// Deduce from call arguments into `map`.
fn deduce_from_call(
    ctx: &CompilationContext,
    params: &[TemplateParam],
    generic: &FunctionEntry,
    args: &[ExprInfo],
    map: &mut SubstitutionMap,
) -> Result<(), DeductionError> {
    let declared = generic.params.len();
    if args.len() > declared && !generic.variadic {
        return Err(DeductionError::WrongArgumentCount {
            expected: declared,
            got: args.len(),
        });
    }
    if args.len() < generic.required_params() {
        return Err(DeductionError::WrongArgumentCount {
            expected: generic.required_params(),
            got: args.len(),
        });
    }

    let matcher = Matcher::new(ctx, params, MatchMode::Call);
    for (param, arg) in generic.params.iter().zip(args) {
        if !param.ty.is_dependent() {
            continue;
        }
        let (p, a) = if param.ty.is_reference() {
            (param.ty.strip_reference().clone(), arg.value_type().clone())
        } else {
            (param.ty.unqualified().clone(), decayed(arg.value_type()))
        };
        match matcher.match_types(&p, &a, map) {
            MatchOutcome::Matched => {}
            MatchOutcome::AmbiguousBinding(id) => {
                return Err(DeductionError::AmbiguousBinding {
                    param: param_name(params, id),
                });
            }
            MatchOutcome::Mismatch => return Err(DeductionError::Mismatch),
        }
    }
    Ok(())
}

/// Argument type as seen by a by-value parameter.
fn decayed(ty: &Type) -> Type {
    match ty.unqualified() {
        Type::Array(elem, _) => Type::pointer_to((**elem).clone()),
        f @ Type::Function(_) => Type::pointer_to(f.clone()),
        other => other.clone(),
    }
}

fn param_name(params: &[TemplateParam], id: TemplateParamId) -> Rc<str> {
    params
        .iter()
        .find(|p| p.id == id)
        .map(|p| p.name.clone())
        .unwrap_or_else(|| "?".into())
}

/// Partial ordering of two function templates (or instances of them).
///
/// `a` is better when the parameters of `b` can be deduced from the
/// parameter types of `a`, and not the other way round.
pub fn more_specialized(ctx: &CompilationContext, a: TypeHash, b: TypeHash) -> Comparison {
    let (Some((ta, fa)), Some((tb, fb))) = (generic_of(ctx, a), generic_of(ctx, b)) else {
        return Comparison::Indistinguishable;
    };
    if ta.template_hash == tb.template_hash {
        return Comparison::Indistinguishable;
    }

    let b_from_a = deducible_from(ctx, &tb.params, &fb, &fa);
    let a_from_b = deducible_from(ctx, &ta.params, &fa, &fb);
    match (b_from_a, a_from_b) {
        (true, false) => Comparison::Better,
        (false, true) => Comparison::Worse,
        _ => Comparison::Indistinguishable,
    }
}

/// The template and generic signature behind a function template or instance.
fn generic_of(ctx: &CompilationContext, hash: TypeHash) -> Option<(TemplateEntry, FunctionEntry)> {
    let function = ctx.registry.get_function(hash)?;
    let template = function
        .template
        .or_else(|| function.instance_of.as_ref().map(|inst| inst.template))?;
    let tpl = ctx.registry.get_template(template)?;
    let generic = generic_function(ctx, tpl)?;
    Some((tpl.clone(), generic))
}

/// Whether `params` (the parameters of `target`) can be deduced from the
/// parameter types of `source`.
fn deducible_from(
    ctx: &CompilationContext,
    params: &[TemplateParam],
    target: &FunctionEntry,
    source: &FunctionEntry,
) -> bool {
    let matcher = Matcher::new(ctx, params, MatchMode::PartialOrdering);
    let mut map = SubstitutionMap::new();
    target
        .param_types()
        .zip(source.param_types())
        .all(|(p, a)| {
            let p = p.strip_reference().unqualified();
            let a = a.strip_reference().unqualified();
            matcher.match_types(p, a, &mut map).is_matched()
        })
}
