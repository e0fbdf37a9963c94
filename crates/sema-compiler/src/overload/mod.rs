//! Overload resolution for function calls.
//!
//! This module selects the best viable function from a set of candidates
//! by comparing the implicit conversion sequences of their arguments.
//!
//! ## Algorithm
//!
//! 1. Deduplicate the candidates
//! 2. Instantiate function template candidates as pseudo-instances
//! 3. Filter candidates by argument count and implicit object qualification
//! 4. Compute an implicit conversion sequence per argument; drop the
//!    candidate if any argument does not convert
//! 5. Run a tournament over the viable candidates and check that the
//!    champion beats every other survivor

mod ranking;
mod viability;

pub use ranking::compare_candidates;

use sema_core::{CompilationError, FunctionEntry, Span, TemplateArg, Type, TypeHash};
use tracing::debug;

use crate::context::CompilationContext;
use crate::conversion::ConversionSequence;
use crate::expr_info::ExprInfo;
use crate::template::complete_function_instance;

/// A call to resolve.
#[derive(Debug, Clone, PartialEq)]
pub struct OverloadRequest {
    /// Name used in diagnostics.
    pub name: String,
    /// Function hashes to consider.
    pub candidates: Vec<TypeHash>,
    pub args: Vec<ExprInfo>,
    /// Implicit object argument of a member call.
    pub object: Option<ExprInfo>,
    /// Template arguments written at the call site.
    pub explicit_args: Vec<TemplateArg>,
    /// Operator call: member candidates take the first argument as object,
    /// and neither default arguments nor ellipsis apply.
    pub is_operator: bool,
    /// Whether arguments may use constructors and conversion functions.
    pub allow_user_defined: bool,
    pub span: Span,
}

impl OverloadRequest {
    pub fn new(name: impl Into<String>, candidates: Vec<TypeHash>, args: Vec<ExprInfo>) -> Self {
        Self {
            name: name.into(),
            candidates,
            args,
            object: None,
            explicit_args: Vec::new(),
            is_operator: false,
            allow_user_defined: true,
            span: Span::UNKNOWN,
        }
    }

    pub fn with_object(mut self, object: ExprInfo) -> Self {
        self.object = Some(object);
        self
    }

    pub fn with_explicit_args(mut self, args: Vec<TemplateArg>) -> Self {
        self.explicit_args = args;
        self
    }

    pub fn operator(mut self) -> Self {
        self.is_operator = true;
        self
    }

    pub fn without_user_defined(mut self) -> Self {
        self.allow_user_defined = false;
        self
    }

    pub fn at(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    fn rendered_args(&self) -> String {
        self.args
            .iter()
            .map(|a| a.ty.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// A candidate entering resolution, optionally with a precomputed second
/// standard conversion (user-defined conversion context).
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Seed {
    pub function: TypeHash,
    pub second_conversion: Option<ConversionSequence>,
}

impl Seed {
    pub(crate) fn new(function: TypeHash) -> Self {
        Self {
            function,
            second_conversion: None,
        }
    }

    pub(crate) fn with_second(function: TypeHash, second: ConversionSequence) -> Self {
        Self {
            function,
            second_conversion: Some(second),
        }
    }
}

/// A viable function with its conversion sequences.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    /// The function; for templates the pseudo-instance.
    pub function: FunctionEntry,
    /// One sequence per argument. When `has_object` is set the first one
    /// converts the implicit object argument.
    pub conversions: Vec<ConversionSequence>,
    pub has_object: bool,
    /// Result conversion in a user-defined conversion context.
    pub second_conversion: Option<ConversionSequence>,
    /// The call relies on a default argument that could not be parsed yet.
    pub delayed_problem: bool,
}

impl Candidate {
    pub fn object_conversion(&self) -> Option<&ConversionSequence> {
        if self.has_object { self.conversions.first() } else { None }
    }

    pub fn argument_conversions(&self) -> &[ConversionSequence] {
        if self.has_object { &self.conversions[1..] } else { &self.conversions }
    }
}

/// Outcome of overload resolution.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Unique(Candidate),
    NoMatch,
    /// The remaining candidates, none better than the others.
    Ambiguous(Vec<Candidate>),
}

/// Result of a successful call resolution: the call as applied.
#[derive(Debug, Clone, PartialEq)]
pub struct OverloadMatch {
    /// The selected function hash.
    pub func_hash: TypeHash,
    /// Conversion of each argument.
    pub arg_conversions: Vec<ConversionSequence>,
    pub object_conversion: Option<ConversionSequence>,
    /// The parameter types the arguments convert to.
    pub param_types: Vec<Type>,
    pub return_type: Type,
}

impl From<Candidate> for OverloadMatch {
    fn from(candidate: Candidate) -> Self {
        Self {
            func_hash: candidate.function.func_hash,
            arg_conversions: candidate.argument_conversions().to_vec(),
            object_conversion: candidate.object_conversion().cloned(),
            param_types: candidate.function.param_types().cloned().collect(),
            return_type: candidate.function.return_type.clone(),
        }
    }
}

/// Resolve an overloaded call.
///
/// # Arguments
///
/// * `ctx` - Compilation context
/// * `req` - Candidates, arguments and call options
///
/// # Returns
///
/// The unique best viable function, no match, or the ambiguous survivors.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn resolve(ctx: &mut CompilationContext, req: &OverloadRequest) -> Resolution {
    let seeds = deduplicate(ctx, &req.candidates).into_iter().map(Seed::new).collect();
    resolve_seeded(ctx, req, seeds)
}

/// Resolve over explicit seeds, bypassing `req.candidates`.
pub(crate) fn resolve_seeded(ctx: &mut CompilationContext, req: &OverloadRequest, seeds: Vec<Seed>) -> Resolution {
    let viable = viability::viable_candidates(ctx, req, seeds);
    let resolution = ranking::best_viable(ctx, viable);
    match &resolution {
        Resolution::Unique(c) => debug!(name = %req.name, chosen = %c.function, "overload resolved"),
        Resolution::NoMatch => debug!(name = %req.name, args = %req.rendered_args(), "no viable function"),
        Resolution::Ambiguous(cs) => debug!(name = %req.name, count = cs.len(), "ambiguous overload"),
    }
    resolution
}

/// Drop repeated candidates. Of two non-template declarations of the same
/// function, the defined one is kept.
fn deduplicate(ctx: &CompilationContext, candidates: &[TypeHash]) -> Vec<TypeHash> {
    let mut kept: Vec<TypeHash> = Vec::with_capacity(candidates.len());
    for &hash in candidates {
        if kept.contains(&hash) {
            continue;
        }
        let Some(func) = ctx.registry.get_function(hash) else {
            continue;
        };
        let duplicate = kept.iter().position(|&other| {
            ctx.registry.get_function(other).is_some_and(|o| {
                !o.is_template()
                    && !func.is_template()
                    && o.name == func.name
                    && o.owner == func.owner
                    && o.same_params(func)
            })
        });
        match duplicate {
            Some(i) => {
                let replace = func.defined && ctx.registry.get_function(kept[i]).is_some_and(|o| !o.defined);
                if replace {
                    kept[i] = hash;
                }
            }
            None => kept.push(hash),
        }
    }
    kept
}

/// Resolve a call and apply the winner.
///
/// A winning function template instance gets its definition built.
pub fn resolve_call(ctx: &mut CompilationContext, req: &OverloadRequest) -> Result<OverloadMatch, CompilationError> {
    match resolve(ctx, req) {
        Resolution::Unique(candidate) => {
            if candidate.delayed_problem {
                return Err(CompilationError::DelayedParseProblem {
                    name: candidate.function.name.clone(),
                    span: req.span,
                });
            }
            if candidate.function.is_template_instance() {
                complete_function_instance(ctx, candidate.function.func_hash, req.span)?;
            }
            Ok(candidate.into())
        }
        Resolution::NoMatch => Err(CompilationError::NoViableFunction {
            name: req.name.clone(),
            args: req.rendered_args(),
            span: req.span,
        }),
        Resolution::Ambiguous(candidates) => Err(CompilationError::AmbiguousOverload {
            name: req.name.clone(),
            candidates: candidates
                .iter()
                .map(|c| c.function.to_string())
                .collect::<Vec<_>>()
                .join(", "),
            span: req.span,
        }),
    }
}

/// Like [`resolve_call`], but failures go to the diagnostic sink, with one
/// note per ambiguous candidate.
pub fn resolve_call_reported(ctx: &mut CompilationContext, req: &OverloadRequest) -> Option<OverloadMatch> {
    match resolve_call(ctx, req) {
        Ok(found) => Some(found),
        Err(err) => {
            let notes: Vec<String> = match &err {
                CompilationError::AmbiguousOverload { candidates, .. } => candidates
                    .split(", ")
                    .map(|c| format!("candidate: {c}"))
                    .collect(),
                _ => Vec::new(),
            };
            ctx.report(&err, &notes);
            None
        }
    }
}
