//! Overload resolution and template instantiation for a C++-like type
//! system.
//!
//! The engine is split across the workspace crates; this crate re-exports
//! them and adds [`Sema`], a session type for the common queries.
//!
//! - [`sema_core`]: types, registry entries, errors, configuration
//! - [`sema_registry`]: the symbol table
//! - [`sema_compiler`]: conversions, overload resolution, operators and
//!   templates

mod context;

pub use context::{Sema, SemaError};

pub use sema_compiler::{
    Candidate, Comparison, CompilationContext, ConversionFailure, ConversionKind, ConversionSequence,
    DefinitionRequest, DeductionError, ExprInfo, FragmentParser, InstanceRef, InstanceState, InstantiationRequest,
    NullFragmentParser, OperatorKind, OverloadMatch, OverloadRequest, ParseOutcome, Rank, Resolution,
    StandardConversion, StringLiteral, SubstitutionMap, TemplateInstanceCache, compare, convert, deduce, instantiate,
    more_specialized, resolve, resolve_call, resolve_operator,
};
pub use sema_core::{
    CompilationError, Config, DeducedArgument, Diagnostics, EnumEntry, FunctionEntry, InstantiationMode,
    PartialSpecialization, PrimitiveKind, Qualifiers, RecordEntry, Span, TemplateArg, TemplateEntry, TemplateParam,
    Type, TypeHash, Value,
};
pub use sema_registry::SymbolRegistry;

pub use sema_compiler;
pub use sema_core;
pub use sema_registry;
