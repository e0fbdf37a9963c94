//! Implicit conversion sequences.
//!
//! This module decides whether an argument expression can be converted to a
//! parameter type, and how good that conversion is. It is used for:
//!
//! - Candidate viability (can argument X be passed to parameter Y?)
//! - Overload ranking (which candidate converts its arguments better?)
//! - Reference binding and user-defined conversions
//!
//! ## Conversion Order
//!
//! For a target type the engine tries, in this order:
//! 1. Reference binding, if the target is a reference
//! 2. User-defined conversion, if either side is a class and user-defined
//!    conversions are allowed
//! 3. Standard conversion: lvalue transformation, then at most one real
//!    conversion, then an optional qualification adjustment
//!
//! Failure is an ordinary result ([`ConversionFailure`]), never a
//! diagnostic. [`convert_reported`] turns it into one.

use sema_core::{CompilationError, Type, TypeHash};
use thiserror::Error;

use crate::context::CompilationContext;
use crate::expr_info::ExprInfo;

mod compare;
mod primitive;
mod reference;
mod relations;
mod standard;
mod user_defined;

pub use compare::compare;
pub use primitive::{arithmetic_promotion, integral_promotion, usual_arithmetic_conversion};
pub use relations::{equal_or_more_qualified, reference_compatible, reference_related, similar_types};

pub(crate) use standard::standard_conversion;
pub(crate) use user_defined::{collect_conversion_functions, converting_constructors};

/// Kind of one elementary conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConversionKind {
    /// No conversion.
    Identity,
    /// Reading the value of an lvalue.
    LvalueToRvalue,
    /// Array decays to a pointer to its first element.
    ArrayToPointer,
    /// Function designator decays to a function pointer.
    FunctionToPointer,
    /// Scalar to `bool`.
    Boolean,
    Integral,
    /// Small integer or enumeration to `int` (or the underlying type).
    IntegralPromotion,
    Floating,
    /// `float` to `double`.
    FloatingPromotion,
    FloatingIntegral,
    /// Null pointer constant, `T*` to `void*`, or `Derived*` to `Base*`.
    Pointer,
    /// Null member pointer constant or `T Base::*` to `T Derived::*`.
    PointerToMember,
    /// Class object (or reference) to one of its base classes.
    DerivedToBase,
    /// Adding cv-qualifiers.
    Qualification,
    /// Call of a constructor or conversion function.
    UserDefined,
}

impl ConversionKind {
    /// Lvalue-to-rvalue, array-to-pointer and function-to-pointer.
    pub fn is_lvalue_transformation(self) -> bool {
        matches!(
            self,
            ConversionKind::LvalueToRvalue
                | ConversionKind::ArrayToPointer
                | ConversionKind::FunctionToPointer
        )
    }

    /// Rank contributed by this step alone.
    pub fn rank(self) -> Rank {
        match self {
            ConversionKind::IntegralPromotion | ConversionKind::FloatingPromotion => Rank::Promotion,
            ConversionKind::Integral
            | ConversionKind::Floating
            | ConversionKind::FloatingIntegral
            | ConversionKind::Pointer
            | ConversionKind::PointerToMember
            | ConversionKind::Boolean
            | ConversionKind::DerivedToBase => Rank::Conversion,
            _ => Rank::Exact,
        }
    }
}

/// Rank of a standard conversion sequence. Better ranks compare greater.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Rank {
    Conversion,
    Promotion,
    Exact,
}

/// One elementary conversion.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionStep {
    pub kind: ConversionKind,
    /// Type before the step.
    pub from: Type,
    /// Type after the step.
    pub to: Type,
}

impl ConversionStep {
    pub fn new(kind: ConversionKind, from: Type, to: Type) -> Self {
        Self { kind, from, to }
    }
}

/// A standard conversion sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct StandardConversion {
    pub steps: Vec<ConversionStep>,
    /// Set when the sequence binds a reference.
    pub reference_binding: bool,
    /// The type converted to; for reference bindings the referenced type.
    pub target: Type,
}

impl StandardConversion {
    pub(crate) fn new(target: Type) -> Self {
        Self {
            steps: Vec::new(),
            reference_binding: false,
            target,
        }
    }

    /// A one-step sequence.
    pub(crate) fn single(kind: ConversionKind, from: Type, to: Type) -> Self {
        let mut seq = Self::new(to.clone());
        seq.push(kind, from, to);
        seq
    }

    pub(crate) fn push(&mut self, kind: ConversionKind, from: Type, to: Type) {
        self.steps.push(ConversionStep::new(kind, from, to));
    }

    /// The worst rank of any step.
    pub fn rank(&self) -> Rank {
        self.steps
            .iter()
            .map(|s| s.kind.rank())
            .min()
            .unwrap_or(Rank::Exact)
    }

    /// The first step that is not an lvalue transformation, or the last step.
    pub fn first_real_step(&self) -> Option<&ConversionStep> {
        self.steps
            .iter()
            .find(|s| !s.kind.is_lvalue_transformation())
            .or_else(|| self.steps.last())
    }

    /// Whether any step has the given kind.
    pub fn contains(&self, kind: ConversionKind) -> bool {
        self.steps.iter().any(|s| s.kind == kind)
    }

    /// Only identity and lvalue transformations.
    pub fn is_identity(&self) -> bool {
        self.steps
            .iter()
            .all(|s| s.kind == ConversionKind::Identity || s.kind.is_lvalue_transformation())
    }
}

/// A user-defined conversion sequence: a standard sequence, one call of a
/// constructor or conversion function, and a second standard sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct UserDefinedConversion {
    pub first: StandardConversion,
    /// The constructor or conversion function called.
    pub function: TypeHash,
    pub via_constructor: bool,
    pub second: StandardConversion,
    pub reference_binding: bool,
}

/// An implicit conversion sequence.
#[derive(Debug, Clone, PartialEq)]
pub enum ConversionSequence {
    Standard(StandardConversion),
    UserDefined(UserDefinedConversion),
    /// The argument matches a `...` parameter.
    Ellipsis,
}

impl ConversionSequence {
    pub fn is_standard(&self) -> bool {
        matches!(self, ConversionSequence::Standard(_))
    }

    pub fn is_user_defined(&self) -> bool {
        matches!(self, ConversionSequence::UserDefined(_))
    }

    pub fn is_ellipsis(&self) -> bool {
        matches!(self, ConversionSequence::Ellipsis)
    }

    /// Rank of a standard sequence; `None` for the other categories.
    pub fn rank(&self) -> Option<Rank> {
        match self {
            ConversionSequence::Standard(seq) => Some(seq.rank()),
            _ => None,
        }
    }

    pub fn is_reference_binding(&self) -> bool {
        match self {
            ConversionSequence::Standard(seq) => seq.reference_binding,
            ConversionSequence::UserDefined(seq) => seq.reference_binding,
            ConversionSequence::Ellipsis => false,
        }
    }

    pub(crate) fn set_reference_binding(&mut self) {
        match self {
            ConversionSequence::Standard(seq) => seq.reference_binding = true,
            ConversionSequence::UserDefined(seq) => seq.reference_binding = true,
            ConversionSequence::Ellipsis => {}
        }
    }

    /// Exact-rank identity sequence.
    pub fn is_exact_identity(&self) -> bool {
        match self {
            ConversionSequence::Standard(seq) => seq.is_identity(),
            _ => false,
        }
    }

    /// The user-defined function called, if any.
    pub fn function(&self) -> Option<TypeHash> {
        match self {
            ConversionSequence::UserDefined(seq) => Some(seq.function),
            _ => None,
        }
    }

    /// Kinds of all elementary conversions, in application order.
    pub fn kinds(&self) -> Vec<ConversionKind> {
        match self {
            ConversionSequence::Standard(seq) => seq.steps.iter().map(|s| s.kind).collect(),
            ConversionSequence::UserDefined(seq) => seq
                .first
                .steps
                .iter()
                .map(|s| s.kind)
                .chain(std::iter::once(ConversionKind::UserDefined))
                .chain(seq.second.steps.iter().map(|s| s.kind))
                .collect(),
            ConversionSequence::Ellipsis => Vec::new(),
        }
    }
}

/// Result of comparing two conversion sequences or candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparison {
    Better,
    Worse,
    Indistinguishable,
}

impl Comparison {
    /// The same comparison seen from the other side.
    pub fn reverse(self) -> Self {
        match self {
            Comparison::Better => Comparison::Worse,
            Comparison::Worse => Comparison::Better,
            Comparison::Indistinguishable => Comparison::Indistinguishable,
        }
    }
}

/// Why no conversion sequence exists.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversionFailure {
    /// No implicit conversion path.
    #[error("no implicit conversion")]
    NoConversion,

    /// Several user-defined conversions are equally good.
    #[error("ambiguous user-defined conversion")]
    Ambiguous {
        /// Rendered constructors and conversion functions.
        candidates: Vec<String>,
    },

    /// One of the types still mentions template parameters.
    #[error("conversion involves a dependent type")]
    Dependent,
}

/// Compute the implicit conversion sequence from `source` to `target`.
///
/// # Arguments
///
/// * `ctx` - Compilation context
/// * `target` - Parameter (or other destination) type
/// * `source` - The argument expression
/// * `allow_user_defined` - Whether constructors and conversion functions
///   may take part
///
/// # Returns
///
/// The conversion sequence, or why none exists.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn convert(
    ctx: &mut CompilationContext,
    target: &Type,
    source: &ExprInfo,
    allow_user_defined: bool,
) -> Result<ConversionSequence, ConversionFailure> {
    if target.is_dependent() || source.value_type().is_dependent() {
        return Err(ConversionFailure::Dependent);
    }
    implicit_conversion(ctx, target, source, allow_user_defined)
}

/// Like [`convert`], but a failure is reported to the diagnostic sink.
pub fn convert_reported(
    ctx: &mut CompilationContext,
    target: &Type,
    source: &ExprInfo,
) -> Option<ConversionSequence> {
    match convert(ctx, target, source, true) {
        Ok(seq) => Some(seq),
        Err(ConversionFailure::Dependent) => None,
        Err(ConversionFailure::NoConversion) => {
            let error = CompilationError::NoConversion {
                from: source.ty.to_string(),
                to: target.to_string(),
                span: source.span,
            };
            ctx.report(&error, &[]);
            None
        }
        Err(ConversionFailure::Ambiguous { candidates }) => {
            let error = CompilationError::AmbiguousConversion {
                from: source.ty.to_string(),
                to: target.to_string(),
                candidates: candidates.join(", "),
                span: source.span,
            };
            let notes: Vec<String> = candidates.iter().map(|c| format!("candidate: {c}")).collect();
            ctx.report(&error, &notes);
            None
        }
    }
}

/// Dispatch on the shape of the target. Argument passing is a
/// copy-initialization.
pub(crate) fn implicit_conversion(
    ctx: &mut CompilationContext,
    target: &Type,
    source: &ExprInfo,
    allow_user_defined: bool,
) -> Result<ConversionSequence, ConversionFailure> {
    if target.is_reference() {
        return reference::reference_binding(ctx, target, source, allow_user_defined);
    }
    if allow_user_defined && (target.unqualified().is_record() || source.value_type().is_record()) {
        return user_defined::user_defined_conversion(ctx, target, source);
    }
    standard_conversion(ctx, target, source).map(ConversionSequence::Standard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sema_core::{PrimitiveKind, Qualifiers};

    fn ctx() -> CompilationContext {
        CompilationContext::default()
    }

    #[test]
    fn identity_law_for_lvalues() {
        let mut ctx = ctx();
        for ty in [
            Type::int(),
            Type::double(),
            Type::pointer_to(Type::int().with_const()),
            Type::prim(PrimitiveKind::Char),
        ] {
            let seq = convert(&mut ctx, &ty, &ExprInfo::lvalue(ty.clone()), true).unwrap();
            assert_eq!(seq.rank(), Some(Rank::Exact), "{ty}");
            assert!(seq.is_exact_identity(), "{ty}");
        }
    }

    #[test]
    fn dependent_types_do_not_convert() {
        let mut ctx = ctx();
        let t = Type::param(
            sema_core::TemplateParamId::new(TypeHash::from_template("Box"), 0),
            "T",
        );
        let result = convert(&mut ctx, &t, &ExprInfo::rvalue(Type::int()), true);
        assert_eq!(result, Err(ConversionFailure::Dependent));
    }

    #[test]
    fn reported_failure_reaches_the_sink() {
        let mut ctx = ctx();
        let target = Type::pointer_to(Type::int());
        assert!(convert_reported(&mut ctx, &target, &ExprInfo::rvalue(Type::double())).is_none());
        assert_eq!(ctx.diagnostics.error_count(), 1);
    }

    #[test]
    fn rank_is_the_worst_step() {
        let mut seq = StandardConversion::new(Type::int());
        seq.push(ConversionKind::LvalueToRvalue, Type::int(), Type::int());
        assert_eq!(seq.rank(), Rank::Exact);
        seq.push(ConversionKind::IntegralPromotion, Type::int(), Type::int());
        assert_eq!(seq.rank(), Rank::Promotion);
        seq.push(ConversionKind::Qualification, Type::int(), Type::int().qualified(Qualifiers::CONST));
        assert_eq!(seq.rank(), Rank::Promotion);
        assert!(Rank::Exact > Rank::Conversion);
    }

    #[test]
    fn user_defined_kinds_have_three_parts() {
        let seq = ConversionSequence::UserDefined(UserDefinedConversion {
            first: StandardConversion::single(ConversionKind::Identity, Type::int(), Type::int()),
            function: TypeHash::from_name("ctor"),
            via_constructor: true,
            second: StandardConversion::single(ConversionKind::Identity, Type::int(), Type::int()),
            reference_binding: false,
        });
        assert_eq!(
            seq.kinds(),
            vec![
                ConversionKind::Identity,
                ConversionKind::UserDefined,
                ConversionKind::Identity
            ]
        );
        assert_eq!(seq.rank(), None);
    }
}
