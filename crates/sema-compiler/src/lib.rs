//! Overload resolution and template instantiation engine.
//!
//! ## Architecture
//!
//! Every entry point takes an exclusively borrowed [`CompilationContext`]
//! holding the symbol registry, the template instance cache, the
//! instantiation depth counters and the diagnostic sink.
//!
//! ## Modules
//!
//! - [`context`]: Compilation context shared by all entry points
//! - [`conversion`]: Implicit conversion sequences and their ranking
//! - [`overload`]: Candidate viability and best viable function selection
//! - [`operators`]: Built-in operator candidates and operator resolution
//! - [`template`]: Argument deduction, specialization choice and instantiation

pub mod context;
pub mod conversion;
mod expr_info;
pub mod operators;
pub mod overload;
pub mod template;

pub use context::CompilationContext;
pub use conversion::{
    Comparison, ConversionFailure, ConversionKind, ConversionSequence, ConversionStep, Rank,
    StandardConversion, UserDefinedConversion, compare, convert, convert_reported,
};
pub use expr_info::{ExprInfo, StringLiteral};
pub use operators::{OperatorKind, builtin_candidates, resolve_operator};
pub use overload::{
    Candidate, OverloadMatch, OverloadRequest, Resolution, compare_candidates, resolve, resolve_call,
    resolve_call_reported,
};
pub use template::{
    DefinitionRequest, DeductionError, FragmentParser, InstanceRef, InstanceState,
    InstantiationRequest, MatchMode, MatchOutcome, NullFragmentParser, ParseOutcome,
    SubstitutionMap, TemplateInstanceCache, deduce, instantiate, more_specialized,
};

// Re-export CompilationError from core for convenience
pub use sema_core::CompilationError;
