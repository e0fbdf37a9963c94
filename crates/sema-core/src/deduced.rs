//! Deduced template arguments.

use std::fmt;

use crate::TemplateArg;
use crate::types::TemplateParamId;

/// How a template argument came to be bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeductionOrigin {
    /// Taken from the parameter's default argument.
    Default,
    /// Written explicitly at the point of use.
    Direct,
    /// Deduced from call argument types.
    Deduced,
}

/// One template parameter bound to a type or value.
///
/// Equality ignores the origin: `Box<int>` named explicitly and `Box<int>`
/// reached through a default argument are the same instance.
#[derive(Debug, Clone)]
pub struct DeducedArgument {
    pub param: TemplateParamId,
    pub arg: TemplateArg,
    pub origin: DeductionOrigin,
}

impl DeducedArgument {
    pub fn new(param: TemplateParamId, arg: TemplateArg, origin: DeductionOrigin) -> Self {
        Self { param, arg, origin }
    }

    pub fn is_default(&self) -> bool {
        self.origin == DeductionOrigin::Default
    }

    pub fn is_direct(&self) -> bool {
        self.origin == DeductionOrigin::Direct
    }
}

impl PartialEq for DeducedArgument {
    fn eq(&self, other: &Self) -> bool {
        self.arg == other.arg
    }
}

impl Eq for DeducedArgument {}

impl fmt::Display for DeducedArgument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.arg)
    }
}

/// The bare arguments of a deduced list, in parameter order.
pub fn arguments_of(deduced: &[DeducedArgument]) -> Vec<TemplateArg> {
    deduced.iter().map(|d| d.arg.clone()).collect()
}
