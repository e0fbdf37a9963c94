//! Core types for the sema overload resolution and template engine.
//!
//! This crate is the leaf of the workspace. It provides:
//!
//! - [`Type`], [`Qualifiers`], [`PrimitiveKind`] and [`Value`], the semantic
//!   type and constant model
//! - [`TypeHash`] identities for records, enums, functions and templates
//! - registry entry types ([`RecordEntry`], [`FunctionEntry`], [`TemplateEntry`], ...)
//! - [`TemplateParam`], [`TemplateArg`] and [`DeducedArgument`]
//! - error types, [`Config`] and the [`Diagnostics`] sink

pub mod config;
pub mod deduced;
pub mod diagnostics;
pub mod entries;
pub mod error;
pub mod primitive;
pub mod qualifiers;
pub mod span;
pub mod template_param;
pub mod type_hash;
pub mod types;
pub mod value;

pub use config::{Config, DEFAULT_MAX_INSTANTIATION_DEPTH, InstantiationMode};
pub use deduced::{DeducedArgument, DeductionOrigin, arguments_of};
pub use diagnostics::{Diagnostic, Diagnostics, Severity};
pub use entries::{
    EnumEntry, FunctionEntry, FunctionInstance, FunctionKind, Param, ParamDefault,
    PartialSpecialization, RecordEntry, RecordKind, TemplateEntry, TemplateKind,
};
pub use error::{CompilationError, ConfigError, RegistrationError};
pub use primitive::PrimitiveKind;
pub use qualifiers::Qualifiers;
pub use span::Span;
pub use template_param::{
    DefaultArg, FragmentId, TemplateArg, TemplateParam, TemplateParamKind, format_args,
};
pub use type_hash::TypeHash;
pub use types::{
    ArrayDim, EnumType, FunctionType, InstanceOf, MemberOwner, ParamType, RecordType,
    TemplateParamId, Type,
};
pub use value::Value;
