//! Ranking of implicit conversion sequences.

use sema_core::{MemberOwner, Type, TypeHash};

use super::relations::{equal_or_more_qualified, similar_types};
use super::{Comparison, ConversionKind, ConversionSequence, ConversionStep, StandardConversion};
use crate::context::CompilationContext;

/// Compare two conversion sequences for the same argument.
///
/// Standard sequences beat user-defined ones, which beat ellipsis. Within
/// one category the finer rules apply; two user-defined sequences are only
/// comparable when they call the same function, or both call constructors.
pub fn compare(ctx: &CompilationContext, a: &ConversionSequence, b: &ConversionSequence) -> Comparison {
    use ConversionSequence::*;
    match (a, b) {
        (Standard(x), Standard(y)) => compare_standard(ctx, x, y),
        (Standard(_), _) => Comparison::Better,
        (_, Standard(_)) => Comparison::Worse,
        (UserDefined(x), UserDefined(y)) => {
            if x.function == y.function || (x.via_constructor && y.via_constructor) {
                compare_standard(ctx, &x.second, &y.second)
            } else {
                Comparison::Indistinguishable
            }
        }
        (UserDefined(_), Ellipsis) => Comparison::Better,
        (Ellipsis, UserDefined(_)) => Comparison::Worse,
        (Ellipsis, Ellipsis) => Comparison::Indistinguishable,
    }
}

pub(crate) fn compare_standard(ctx: &CompilationContext, a: &StandardConversion, b: &StandardConversion) -> Comparison {
    if proper_subsequence(a, b) {
        return Comparison::Better;
    }
    if proper_subsequence(b, a) {
        return Comparison::Worse;
    }

    match a.rank().cmp(&b.rank()) {
        std::cmp::Ordering::Greater => return Comparison::Better,
        std::cmp::Ordering::Less => return Comparison::Worse,
        std::cmp::Ordering::Equal => {}
    }

    let same_rank = compare_same_rank(ctx, a, b);
    if same_rank != Comparison::Indistinguishable {
        return same_rank;
    }

    let qualification = compare_qualification(ctx, a, b);
    if qualification != Comparison::Indistinguishable {
        return qualification;
    }

    // Binding to the less qualified of two otherwise equal references
    if a.reference_binding && b.reference_binding && a.target.unqualified() == b.target.unqualified() {
        let a_more = equal_or_more_qualified(&a.target, &b.target);
        let b_more = equal_or_more_qualified(&b.target, &a.target);
        if b_more && !a_more {
            return Comparison::Better;
        }
        if a_more && !b_more {
            return Comparison::Worse;
        }
    }

    Comparison::Indistinguishable
}

/// Kinds of the steps that are not lvalue transformations.
fn canonical_kinds(seq: &StandardConversion) -> Vec<ConversionKind> {
    seq.steps
        .iter()
        .map(|s| s.kind)
        .filter(|k| !k.is_lvalue_transformation())
        .collect()
}

/// Whether `a` is a proper trailing subsequence of `b`, ignoring lvalue
/// transformations. The identity sequence is a subsequence of every
/// non-identity sequence.
fn proper_subsequence(a: &StandardConversion, b: &StandardConversion) -> bool {
    let ka = canonical_kinds(a);
    let kb = canonical_kinds(b);
    if a.is_identity() {
        return !b.is_identity();
    }
    if ka.is_empty() || ka.len() >= kb.len() {
        return false;
    }
    kb.ends_with(&ka)
}

fn is_pointer_to_bool(step: &ConversionStep) -> bool {
    step.kind == ConversionKind::Boolean && (step.from.is_pointer() || step.from.is_member_pointer())
}

fn points_to_void(ty: &Type) -> bool {
    ty.pointee().is_some_and(Type::is_void)
}

/// The class a step converts from or to: the owner of a pointer-to-member,
/// the pointee of a pointer, or the class itself. Reference bindings only
/// look at the class itself.
fn extract_class(ty: &Type, reference_binding: bool) -> Option<TypeHash> {
    let ty = ty.unqualified();
    if !reference_binding {
        match ty {
            Type::MemberPointer {
                owner: MemberOwner::Record(owner),
                ..
            } => return Some(owner.hash),
            Type::Pointer(pointee) => return pointee.record_type().map(|r| r.hash),
            _ => {}
        }
    }
    ty.record_type().map(|r| r.hash)
}

/// Same-rank rules: conversions from pointers to `bool` lose, then
/// conversions to nearer classes in a hierarchy win.
fn compare_same_rank(ctx: &CompilationContext, a: &StandardConversion, b: &StandardConversion) -> Comparison {
    let (Some(c1), Some(c2)) = (a.first_real_step(), b.first_real_step()) else {
        return Comparison::Indistinguishable;
    };

    let (bool1, bool2) = (is_pointer_to_bool(c1), is_pointer_to_bool(c2));
    if bool2 && !bool1 {
        return Comparison::Better;
    }
    if bool1 && !bool2 {
        return Comparison::Worse;
    }

    let param1 = c1.to.unqualified();
    let param2 = c2.to.unqualified();
    let f1 = extract_class(&c1.from, a.reference_binding);
    let f2 = extract_class(&c2.from, b.reference_binding);
    let t1 = extract_class(param1, a.reference_binding);
    let t2 = extract_class(param2, b.reference_binding);

    let base = |x: Option<TypeHash>, y: Option<TypeHash>| match (x, y) {
        (Some(x), Some(y)) => ctx.registry.is_base_of(x, y),
        _ => false,
    };

    // B is derived from A and C from B
    if c1.kind == ConversionKind::Pointer && c2.kind == ConversionKind::Pointer {
        // B* to A* beats B* to void*
        if f1.is_some() && f1 == f2 {
            if t2.is_none() && points_to_void(param2) && base(t1, f1) {
                return Comparison::Better;
            }
            if t1.is_none() && points_to_void(param1) && base(t2, f2) {
                return Comparison::Worse;
            }
        }
        // A* to void* beats B* to void*
        if t1.is_none() && points_to_void(param1) && t2.is_none() && points_to_void(param2) {
            if base(f1, f2) {
                return Comparison::Better;
            }
            if base(f2, f1) {
                return Comparison::Worse;
            }
        }
    }

    if f1.is_none() || f2.is_none() || t1.is_none() || t2.is_none() {
        return Comparison::Indistinguishable;
    }

    if c1.kind == ConversionKind::PointerToMember && c2.kind == ConversionKind::PointerToMember {
        // A::* to B::* beats A::* to C::*
        if f1 == f2 {
            if base(f1, t1) && base(t1, t2) {
                return Comparison::Better;
            }
            if base(f2, t2) && base(t2, t1) {
                return Comparison::Worse;
            }
        }
        // B::* to C::* beats A::* to C::*
        if t1 == t2 {
            if base(f1, t1) && base(f2, f1) {
                return Comparison::Better;
            }
            if base(f2, t2) && base(f1, f2) {
                return Comparison::Worse;
            }
        }
    } else {
        // C* to B* beats C* to A*, likewise for references and objects
        if f1 == f2 {
            if base(t1, f1) && base(t2, t1) {
                return Comparison::Better;
            }
            if base(t2, f2) && base(t1, t2) {
                return Comparison::Worse;
            }
        }
        // B* to A* beats C* to A*
        if t1 == t2 {
            if base(t1, f1) && base(f1, f2) {
                return Comparison::Better;
            }
            if base(t2, f2) && base(f2, f1) {
                return Comparison::Worse;
            }
        }
    }

    Comparison::Indistinguishable
}

/// Of two sequences ending in similar pointer types, the one whose result
/// is less qualified wins; otherwise a trailing qualification step loses.
fn compare_qualification(ctx: &CompilationContext, a: &StandardConversion, b: &StandardConversion) -> Comparison {
    let (Some(l1), Some(l2)) = (a.steps.last(), b.steps.last()) else {
        return Comparison::Indistinguishable;
    };
    let q1 = l1.kind == ConversionKind::Qualification;
    let q2 = l2.kind == ConversionKind::Qualification;
    if !q1 && !q2 {
        return Comparison::Indistinguishable;
    }

    let a_converts_to_b = similar_types(ctx, &l2.to, &l1.to);
    let b_converts_to_a = similar_types(ctx, &l1.to, &l2.to);
    if a_converts_to_b && !b_converts_to_a {
        return Comparison::Better;
    }
    if b_converts_to_a && !a_converts_to_b {
        return Comparison::Worse;
    }
    match (q1, q2) {
        (true, false) => Comparison::Worse,
        (false, true) => Comparison::Better,
        _ => Comparison::Indistinguishable,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversion::{UserDefinedConversion, convert};
    use crate::expr_info::ExprInfo;
    use sema_core::{Config, PrimitiveKind, RecordEntry};
    use sema_registry::SymbolRegistry;

    /// A <- B <- C
    fn chain() -> (CompilationContext, Type, Type, Type) {
        let mut registry = SymbolRegistry::new();
        let a = RecordEntry::class("A");
        let b = RecordEntry::class("B").with_base(a.type_hash);
        let c = RecordEntry::class("C").with_base(b.type_hash);
        let types = (a.as_type(), b.as_type(), c.as_type());
        registry.register_record(a).unwrap();
        registry.register_record(b).unwrap();
        registry.register_record(c).unwrap();
        (CompilationContext::new(registry, Config::default()), types.0, types.1, types.2)
    }

    fn seq(ctx: &mut CompilationContext, target: Type, source: ExprInfo) -> ConversionSequence {
        convert(ctx, &target, &source, true).unwrap()
    }

    #[test]
    fn exact_beats_conversion() {
        let mut ctx = CompilationContext::default();
        let to_int = seq(&mut ctx, Type::int(), ExprInfo::lvalue(Type::int()));
        let to_double = seq(&mut ctx, Type::double(), ExprInfo::lvalue(Type::int()));
        assert_eq!(compare(&ctx, &to_int, &to_double), Comparison::Better);
        assert_eq!(compare(&ctx, &to_double, &to_int), Comparison::Worse);
    }

    #[test]
    fn promotion_beats_conversion() {
        let mut ctx = CompilationContext::default();
        let short = ExprInfo::rvalue(Type::prim(PrimitiveKind::Short));
        let to_int = seq(&mut ctx, Type::int(), short.clone());
        let to_long = seq(&mut ctx, Type::prim(PrimitiveKind::Long), short);
        assert_eq!(compare(&ctx, &to_int, &to_long), Comparison::Better);
    }

    #[test]
    fn comparison_is_reflexive_and_antisymmetric() {
        let (mut ctx, a, b, c) = chain();
        let sequences = vec![
            seq(&mut ctx, Type::double(), ExprInfo::lvalue(Type::int())),
            seq(&mut ctx, Type::int(), ExprInfo::rvalue(Type::prim(PrimitiveKind::Char))),
            seq(&mut ctx, Type::pointer_to(a.clone()), ExprInfo::rvalue(Type::pointer_to(c.clone()))),
            seq(&mut ctx, Type::pointer_to(b.clone()), ExprInfo::rvalue(Type::pointer_to(c.clone()))),
            seq(&mut ctx, Type::reference_to(b), ExprInfo::lvalue(c)),
            seq(&mut ctx, Type::bool(), ExprInfo::rvalue(Type::pointer_to(a))),
            ConversionSequence::Ellipsis,
        ];
        for x in &sequences {
            assert_eq!(compare(&ctx, x, x), Comparison::Indistinguishable);
            for y in &sequences {
                assert_eq!(compare(&ctx, x, y), compare(&ctx, y, x).reverse());
            }
        }
    }

    #[test]
    fn nearer_base_pointer_wins() {
        let (mut ctx, a, b, c) = chain();
        let c_ptr = ExprInfo::rvalue(Type::pointer_to(c));
        let to_b = seq(&mut ctx, Type::pointer_to(b.clone()), c_ptr.clone());
        let to_a = seq(&mut ctx, Type::pointer_to(a.clone()), c_ptr.clone());
        assert_eq!(compare(&ctx, &to_b, &to_a), Comparison::Better);

        // B* to A* beats B* to void*
        let b_ptr = ExprInfo::rvalue(Type::pointer_to(b));
        let b_to_a = seq(&mut ctx, Type::pointer_to(a.clone()), b_ptr.clone());
        let b_to_void = seq(&mut ctx, Type::pointer_to(Type::void()), b_ptr);
        assert_eq!(compare(&ctx, &b_to_a, &b_to_void), Comparison::Better);

        // A* to void* beats C* to void*
        let a_to_void = seq(&mut ctx, Type::pointer_to(Type::void()), ExprInfo::rvalue(Type::pointer_to(a)));
        let c_to_void = seq(&mut ctx, Type::pointer_to(Type::void()), c_ptr);
        assert_eq!(compare(&ctx, &a_to_void, &c_to_void), Comparison::Better);
    }

    #[test]
    fn leading_subsequence_does_not_decide() {
        // [Pointer] is not a trailing part of [Pointer, Qualification], so
        // the nearer base decides
        let (mut ctx, a, b, c) = chain();
        let c_ptr = ExprInfo::rvalue(Type::pointer_to(c));
        let to_a = seq(&mut ctx, Type::pointer_to(a), c_ptr.clone());
        let to_const_b = seq(&mut ctx, Type::pointer_to(b.with_const()), c_ptr);
        assert_eq!(compare(&ctx, &to_const_b, &to_a), Comparison::Better);
        assert_eq!(compare(&ctx, &to_a, &to_const_b), Comparison::Worse);
    }

    #[test]
    fn nearer_source_wins_for_same_target() {
        let (mut ctx, a, b, c) = chain();
        let from_b = seq(&mut ctx, Type::reference_to(a.clone()), ExprInfo::lvalue(b));
        let from_c = seq(&mut ctx, Type::reference_to(a), ExprInfo::lvalue(c));
        assert_eq!(compare(&ctx, &from_b, &from_c), Comparison::Better);
    }

    #[test]
    fn pointer_to_bool_loses() {
        let mut ctx = CompilationContext::default();
        let ptr = ExprInfo::rvalue(Type::pointer_to(Type::int()));
        let to_bool = seq(&mut ctx, Type::bool(), ptr.clone());
        let to_void = seq(&mut ctx, Type::pointer_to(Type::void()), ptr);
        assert_eq!(compare(&ctx, &to_void, &to_bool), Comparison::Better);
    }

    #[test]
    fn less_qualified_pointer_wins() {
        let mut ctx = CompilationContext::default();
        let ptr = ExprInfo::lvalue(Type::pointer_to(Type::int()));
        let plain = seq(&mut ctx, Type::pointer_to(Type::int()), ptr.clone());
        let constant = seq(&mut ctx, Type::pointer_to(Type::int().with_const()), ptr);
        assert_eq!(compare(&ctx, &plain, &constant), Comparison::Better);
    }

    #[test]
    fn less_qualified_reference_wins() {
        let mut ctx = CompilationContext::default();
        let lvalue = ExprInfo::lvalue(Type::int());
        let plain = seq(&mut ctx, Type::reference_to(Type::int()), lvalue.clone());
        let constant = seq(&mut ctx, Type::reference_to(Type::int().with_const()), lvalue);
        assert_eq!(compare(&ctx, &plain, &constant), Comparison::Better);
    }

    #[test]
    fn categories_are_ordered() {
        let ctx = CompilationContext::default();
        let standard = ConversionSequence::Standard(StandardConversion::single(
            ConversionKind::Integral,
            Type::int(),
            Type::prim(PrimitiveKind::Long),
        ));
        let user = ConversionSequence::UserDefined(UserDefinedConversion {
            first: StandardConversion::single(ConversionKind::Identity, Type::int(), Type::int()),
            function: TypeHash::from_name("ctor"),
            via_constructor: true,
            second: StandardConversion::single(ConversionKind::Identity, Type::int(), Type::int()),
            reference_binding: false,
        });
        assert_eq!(compare(&ctx, &standard, &user), Comparison::Better);
        assert_eq!(compare(&ctx, &user, &ConversionSequence::Ellipsis), Comparison::Better);
        assert_eq!(
            compare(&ctx, &ConversionSequence::Ellipsis, &ConversionSequence::Ellipsis),
            Comparison::Indistinguishable
        );
    }

    #[test]
    fn different_conversion_functions_are_indistinguishable() {
        let ctx = CompilationContext::default();
        let make = |name: &str, kind| {
            ConversionSequence::UserDefined(UserDefinedConversion {
                first: StandardConversion::single(ConversionKind::Identity, Type::int(), Type::int()),
                function: TypeHash::from_name(name),
                via_constructor: false,
                second: StandardConversion::single(kind, Type::int(), Type::double()),
                reference_binding: false,
            })
        };
        let exact = make("to_double", ConversionKind::Identity);
        let conv = make("to_int", ConversionKind::FloatingIntegral);
        assert_eq!(compare(&ctx, &exact, &conv), Comparison::Indistinguishable);
        let same = make("to_double", ConversionKind::FloatingIntegral);
        assert_eq!(compare(&ctx, &exact, &same), Comparison::Better);
    }
}
