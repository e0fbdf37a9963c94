//! Type relations used by reference binding and qualification conversions.

use sema_core::{MemberOwner, Qualifiers, Type};

use crate::context::CompilationContext;

/// `t1` is the same type as `t2` ignoring top-level cv, or a base class of it.
pub fn reference_related(ctx: &CompilationContext, t1: &Type, t2: &Type) -> bool {
    let (u1, u2) = (t1.unqualified(), t2.unqualified());
    u1 == u2 || (u1.is_record() && u2.is_record() && ctx.is_unambiguous_base_of(u1, u2))
}

/// Reference-related and at least as qualified.
pub fn reference_compatible(ctx: &CompilationContext, t1: &Type, t2: &Type) -> bool {
    reference_related(ctx, t1, t2) && equal_or_more_qualified(t1, t2)
}

/// Whether `t1` carries every cv-qualifier of `t2`. Array types are compared
/// by their element qualification.
pub fn equal_or_more_qualified(t1: &Type, t2: &Type) -> bool {
    let q2 = t2.qualifiers_through_arrays().cv();
    if q2.is_empty() {
        return true;
    }
    t1.qualifiers_through_arrays().is_equal_or_more_than(q2)
}

/// Pointee of a pointer or pointer-to-member.
fn pointer_like(ty: &Type) -> Option<&Type> {
    match ty.unqualified() {
        Type::Pointer(inner) => Some(&**inner),
        Type::MemberPointer { pointee, .. } => Some(&**pointee),
        _ => None,
    }
}

fn record_owner(ty: &Type) -> Option<&MemberOwner> {
    match ty.unqualified() {
        Type::MemberPointer { owner, .. } => Some(owner),
        _ => None,
    }
}

/// Whether `source` converts to `target` by a qualification conversion.
///
/// Both must have the same pointer / pointer-to-member shape. Going down the
/// chain, `target` must be at least as qualified as `source` at every level,
/// and every level above one that adds qualifiers must be `const`.
pub fn similar_types(ctx: &CompilationContext, target: &Type, source: &Type) -> bool {
    if pointer_like(target).is_none() || pointer_like(source).is_none() {
        return false;
    }

    let mut src = source.unqualified();
    let mut dst = target.unqualified();
    let mut all_const = true;
    loop {
        if src.is_member_pointer() != dst.is_member_pointer() {
            return false;
        }
        if let (Some(MemberOwner::Record(a)), Some(MemberOwner::Record(b))) =
            (record_owner(src), record_owner(dst))
        {
            if a != b {
                return false;
            }
        }

        let (Some(next_src), Some(next_dst)) = (pointer_like(src), pointer_like(dst)) else {
            return false;
        };
        let src_is_ptr = pointer_like(next_src).is_some();
        let dst_is_ptr = pointer_like(next_dst).is_some();
        if src_is_ptr != dst_is_ptr {
            return false;
        }

        let qs = next_src.qualifiers().cv();
        let qd = next_dst.qualifiers().cv();
        if !qs.is_empty() {
            if qd.is_empty() || !qd.is_equal_or_more_than(qs) {
                return false;
            }
            if qs != qd && !all_const {
                return false;
            }
        } else if !qd.is_empty() && !all_const {
            return false;
        }
        if !qd.contains(Qualifiers::CONST) {
            all_const = false;
        }

        if !src_is_ptr {
            let (a, b) = (next_src.unqualified(), next_dst.unqualified());
            return a == b || (a.is_record() && b.is_record() && ctx.is_base_of(b, a));
        }
        src = next_src.unqualified();
        dst = next_dst.unqualified();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sema_core::{Config, RecordEntry};
    use sema_registry::SymbolRegistry;

    fn cptr(t: Type) -> Type {
        Type::pointer_to(t.with_const())
    }

    #[test]
    fn adding_const_to_pointee_is_similar() {
        let ctx = CompilationContext::default();
        let src = Type::pointer_to(Type::int());
        assert!(similar_types(&ctx, &cptr(Type::int()), &src));
        assert!(!similar_types(&ctx, &src, &cptr(Type::int())));
    }

    #[test]
    fn multi_level_requires_const_above() {
        let ctx = CompilationContext::default();
        // int** -> const int** is not allowed, int** -> const int* const* is
        let src = Type::pointer_to(Type::pointer_to(Type::int()));
        let bad = Type::pointer_to(cptr(Type::int()));
        let good = Type::pointer_to(cptr(Type::int()).with_const());
        assert!(!similar_types(&ctx, &bad, &src));
        assert!(similar_types(&ctx, &good, &src));
    }

    #[test]
    fn different_shapes_are_not_similar() {
        let ctx = CompilationContext::default();
        let src = Type::pointer_to(Type::pointer_to(Type::int()));
        assert!(!similar_types(&ctx, &Type::pointer_to(Type::int()), &src));
        assert!(!similar_types(&ctx, &Type::int(), &Type::int()));
    }

    #[test]
    fn reference_relations() {
        let mut registry = SymbolRegistry::new();
        let base = RecordEntry::class("Base");
        let derived = RecordEntry::class("Derived").with_base(base.type_hash);
        let (b, d) = (base.as_type(), derived.as_type());
        registry.register_record(base).unwrap();
        registry.register_record(derived).unwrap();
        let ctx = CompilationContext::new(registry, Config::default());

        assert!(reference_related(&ctx, &b, &d));
        assert!(!reference_related(&ctx, &d, &b));
        assert!(reference_compatible(&ctx, &b.clone().with_const(), &d));
        assert!(!reference_compatible(&ctx, &b, &d.clone().with_const()));
    }

    #[test]
    fn qualification_ordering() {
        let cv = Qualifiers::CONST | Qualifiers::VOLATILE;
        assert!(equal_or_more_qualified(&Type::int().qualified(cv), &Type::int().with_const()));
        assert!(!equal_or_more_qualified(&Type::int().with_const(), &Type::int().qualified(Qualifiers::VOLATILE)));
        assert!(equal_or_more_qualified(&Type::int(), &Type::int()));
    }
}
