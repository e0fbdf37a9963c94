//! Error types.
//!
//! ## Error Hierarchy
//!
//! ```text
//! RegistrationError  - symbol table population (duplicates, unknown bases)
//! CompilationError   - failures that affect a chosen call or instantiation
//! ConfigError        - malformed configuration options
//! ```
//!
//! Substitution failures during candidate filtering and deduction are not
//! errors at all. They surface as plain results inside the engine and only
//! turn into a `CompilationError` when the final choice is affected.

use thiserror::Error;

use crate::Span;

// ============================================================================
// Registration Errors
// ============================================================================

/// Errors raised while populating the symbol table.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegistrationError {
    /// An entity with the same identity already exists.
    #[error("duplicate {kind} '{name}'")]
    Duplicate {
        /// What kind of entity (record, function, template, ...).
        kind: &'static str,
        /// Its name.
        name: String,
    },

    /// A base class was named that is not registered.
    #[error("unknown base class of '{record}'")]
    UnknownBase {
        /// The record declaring the base.
        record: String,
    },

    /// A member function names an owner that is not registered.
    #[error("unknown owner for member '{name}'")]
    UnknownOwner {
        /// The member function name.
        name: String,
    },

    /// A base-class edge would make the hierarchy cyclic.
    #[error("circular inheritance for '{name}'")]
    CircularInheritance {
        /// The record involved in the cycle.
        name: String,
    },
}

// ============================================================================
// Compilation Errors
// ============================================================================

/// Failures reported for a chosen call, conversion or instantiation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompilationError {
    /// No candidate survived viability checking.
    #[error("at {span}: no matching function for call to '{name}({args})'")]
    NoViableFunction {
        /// Name of the called function or operator.
        name: String,
        /// Rendered argument types.
        args: String,
        /// Point of use.
        span: Span,
    },

    /// More than one candidate is equally good.
    #[error("at {span}: call to '{name}' is ambiguous: could be {candidates}")]
    AmbiguousOverload {
        /// Name of the called function or operator.
        name: String,
        /// Rendered remaining candidates.
        candidates: String,
        /// Point of use.
        span: Span,
    },

    /// Two user-defined conversions are equally good.
    #[error("at {span}: conversion from '{from}' to '{to}' is ambiguous: could be {candidates}")]
    AmbiguousConversion {
        /// Source type.
        from: String,
        /// Target type.
        to: String,
        /// Rendered conversion functions.
        candidates: String,
        /// Point of use.
        span: Span,
    },

    /// No implicit conversion exists.
    #[error("at {span}: cannot convert '{from}' to '{to}'")]
    NoConversion {
        /// Source type.
        from: String,
        /// Target type.
        to: String,
        /// Point of use.
        span: Span,
    },

    /// One template parameter was deduced to two different values.
    #[error("at {span}: conflicting deductions for template parameter '{param}' of '{template}'")]
    AmbiguousTemplateBinding {
        /// The template.
        template: String,
        /// The parameter.
        param: String,
        /// Point of use.
        span: Span,
    },

    /// Several partial specializations match and none is more specialized.
    #[error("at {span}: instantiation of '{name}' is ambiguous: could be {candidates}")]
    AmbiguousSpecialization {
        /// Rendered template-id.
        name: String,
        /// Rendered matching specializations.
        candidates: String,
        /// Point of use.
        span: Span,
    },

    /// A class template argument was omitted and has no default.
    #[error("at {span}: missing default argument for parameter {index} of '{template}'")]
    MissingDefaultArgument {
        /// The template.
        template: String,
        /// 1-based parameter position.
        index: usize,
        /// Point of use.
        span: Span,
    },

    /// Call argument count is incompatible with a template's parameters.
    #[error("at {span}: wrong number of arguments for '{name}': expected {expected}, got {got}")]
    WrongArgumentCount {
        /// The function template.
        name: String,
        /// Parameter count.
        expected: usize,
        /// Argument count.
        got: usize,
        /// Point of use.
        span: Span,
    },

    /// More explicit template arguments than parameters.
    #[error("at {span}: too many template arguments for '{template}': expected at most {expected}, got {got}")]
    TooManyTemplateArguments {
        /// The template.
        template: String,
        /// Parameter count.
        expected: usize,
        /// Explicit argument count.
        got: usize,
        /// Point of use.
        span: Span,
    },

    /// An explicit argument has the wrong kind for its parameter.
    #[error("at {span}: template argument {index} of '{template}' has the wrong kind")]
    TemplateArgumentKindMismatch {
        /// The template.
        template: String,
        /// 1-based parameter position.
        index: usize,
        /// Point of use.
        span: Span,
    },

    /// A parameter could not be deduced from the call.
    #[error("at {span}: could not deduce template argument for parameter {index} of '{template}'")]
    CouldNotDeduce {
        /// The template.
        template: String,
        /// 1-based parameter position.
        index: usize,
        /// Point of use.
        span: Span,
    },

    /// Deduction failed structurally for the sole template considered.
    #[error("at {span}: no instance of '{template}' matches the argument list")]
    DeductionMismatch {
        /// The template.
        template: String,
        /// Point of use.
        span: Span,
    },

    /// Nested instantiation exceeded the configured bound.
    #[error("at {span}: maximum instantiation depth ({max_depth}) reached while instantiating '{template}'")]
    MaxInstantiationDepthExceeded {
        /// The template being instantiated.
        template: String,
        /// The configured bound.
        max_depth: u32,
        /// Point of use.
        span: Span,
    },

    /// The chosen candidate depends on a fragment that could not be parsed yet.
    #[error("at {span}: '{name}' depends on a default argument that could not be parsed")]
    DelayedParseProblem {
        /// The chosen function.
        name: String,
        /// Point of use.
        span: Span,
    },

    /// The definition of an instance failed to build.
    #[error("at {span}: instantiation of '{name}' failed: {reason}")]
    InstantiationFailed {
        /// Rendered instance name.
        name: String,
        /// Parser-provided reason.
        reason: String,
        /// Point of use.
        span: Span,
    },

    /// A non-template was used as a template.
    #[error("at {span}: '{name}' is not a template")]
    NotATemplate {
        /// The name that was used.
        name: String,
        /// Point of use.
        span: Span,
    },

    /// A referenced function is not registered.
    #[error("at {span}: unknown function '{name}'")]
    UnknownFunction {
        /// Name or hash of the function.
        name: String,
        /// Point of use.
        span: Span,
    },

    /// A referenced type is not registered.
    #[error("at {span}: unknown type '{name}'")]
    UnknownType {
        /// Name or hash of the type.
        name: String,
        /// Point of use.
        span: Span,
    },

    /// Inconsistent engine state.
    #[error("internal error: {message}")]
    Internal {
        /// Description.
        message: String,
    },
}

impl CompilationError {
    /// Get the span where this error occurred.
    pub fn span(&self) -> Span {
        match self {
            CompilationError::NoViableFunction { span, .. }
            | CompilationError::AmbiguousOverload { span, .. }
            | CompilationError::AmbiguousConversion { span, .. }
            | CompilationError::NoConversion { span, .. }
            | CompilationError::AmbiguousTemplateBinding { span, .. }
            | CompilationError::AmbiguousSpecialization { span, .. }
            | CompilationError::MissingDefaultArgument { span, .. }
            | CompilationError::WrongArgumentCount { span, .. }
            | CompilationError::TooManyTemplateArguments { span, .. }
            | CompilationError::TemplateArgumentKindMismatch { span, .. }
            | CompilationError::CouldNotDeduce { span, .. }
            | CompilationError::DeductionMismatch { span, .. }
            | CompilationError::MaxInstantiationDepthExceeded { span, .. }
            | CompilationError::DelayedParseProblem { span, .. }
            | CompilationError::InstantiationFailed { span, .. }
            | CompilationError::NotATemplate { span, .. }
            | CompilationError::UnknownFunction { span, .. }
            | CompilationError::UnknownType { span, .. } => *span,
            CompilationError::Internal { .. } => Span::default(),
        }
    }

    /// Whether this error reports an ambiguity rather than an absence.
    pub fn is_ambiguity(&self) -> bool {
        matches!(
            self,
            CompilationError::AmbiguousOverload { .. }
                | CompilationError::AmbiguousConversion { .. }
                | CompilationError::AmbiguousTemplateBinding { .. }
                | CompilationError::AmbiguousSpecialization { .. }
        )
    }
}

// ============================================================================
// Configuration Errors
// ============================================================================

/// Malformed configuration options.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// An option is not recognised.
    #[error("unknown option '{0}'")]
    UnknownOption(String),

    /// An option requires a value that was not supplied.
    #[error("option '{0}' requires a value")]
    MissingValue(String),

    /// An option value could not be parsed.
    #[error("invalid value '{value}' for option '{option}'")]
    InvalidValue {
        /// The option.
        option: String,
        /// The rejected value.
        value: String,
    },
}
