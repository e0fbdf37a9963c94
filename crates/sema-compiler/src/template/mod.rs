//! Template argument deduction, specialization choice and instantiation.
//!
//! ## Components
//!
//! - [`deduce`]: Bind a template's parameters from explicit, call and default arguments
//! - [`match_types`]: Structural matching of parameter patterns
//! - [`more_specialized`]: Partial ordering of function templates
//! - [`instantiate`]: Create or reuse an instance, building its definition
//! - [`TemplateInstanceCache`]: Cache for template instances
//! - [`SubstitutionMap`]: Maps template parameters to arguments
//! - [`FragmentParser`]: Builds instance definitions from stored fragments

mod cache;
mod deduction;
mod instantiation;
mod matching;
mod specialization;
mod substitution;

use sema_core::{FragmentId, Span, TemplateArg, TypeHash};

use crate::context::CompilationContext;

pub use cache::{InstanceRef, InstanceState, TemplateInstanceCache};
pub use deduction::{DeductionError, deduce, more_specialized};
pub use instantiation::{InstantiationRequest, instantiate};
pub use matching::{MatchMode, MatchOutcome, match_args, match_types};
pub use substitution::{
    SubstitutionMap, build_substitution_map, substitute_arg, substitute_function, substitute_params,
    substitute_record, substitute_type,
};

pub(crate) use instantiation::{complete_function_instance, complete_instance, instantiate_candidate};

/// Result of handing a stored fragment to the [`FragmentParser`].
#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome<T> {
    Parsed(T),
    /// The fragment is ill-formed under this substitution.
    Failed(String),
    /// The fragment cannot be parsed at this point; try again later.
    Delayed,
}

/// What the parser needs to build the definition of an instance.
#[derive(Debug, Clone)]
pub struct DefinitionRequest {
    pub template: TypeHash,
    /// The primary template or the chosen partial specialization.
    pub entity: TypeHash,
    /// Hash of the registered instance record or function.
    pub instance: TypeHash,
    pub args: Vec<TemplateArg>,
    /// Bindings of the entity's own parameters.
    pub substitution: SubstitutionMap,
    pub fragment: Option<FragmentId>,
    /// Whether function bodies should be resolved too.
    pub resolve_bodies: bool,
    pub point_of_use: Span,
}

/// Re-parses stored template fragments under a substitution.
///
/// The parser receives the context mutably so it can resolve and
/// instantiate while building a definition.
pub trait FragmentParser {
    fn parse_definition(&self, ctx: &mut CompilationContext, req: &DefinitionRequest) -> ParseOutcome<()>;

    fn parse_default(
        &self,
        ctx: &mut CompilationContext,
        fragment: FragmentId,
        subst: &SubstitutionMap,
    ) -> ParseOutcome<TemplateArg>;
}

/// Parser used when no front end is attached.
///
/// Every definition succeeds immediately. Default argument fragments have
/// nothing to evaluate them and stay delayed.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullFragmentParser;

impl FragmentParser for NullFragmentParser {
    fn parse_definition(&self, _ctx: &mut CompilationContext, _req: &DefinitionRequest) -> ParseOutcome<()> {
        ParseOutcome::Parsed(())
    }

    fn parse_default(
        &self,
        _ctx: &mut CompilationContext,
        _fragment: FragmentId,
        _subst: &SubstitutionMap,
    ) -> ParseOutcome<TemplateArg> {
        ParseOutcome::Delayed
    }
}
