//! Symbol table entry types.
//!
//! - [`RecordEntry`] - classes, structs and unions, including template instances
//! - [`EnumEntry`] - enumerations and their underlying type
//! - [`FunctionEntry`] - free functions, members, constructors, conversion
//!   functions and synthesized built-in operators
//! - [`TemplateEntry`] - class and function templates with their partial
//!   specializations

mod enum_entry;
mod function;
mod record;
mod template;

pub use enum_entry::EnumEntry;
pub use function::{FunctionEntry, FunctionInstance, FunctionKind, Param, ParamDefault};
pub use record::{RecordEntry, RecordKind};
pub use template::{PartialSpecialization, TemplateEntry, TemplateKind};
