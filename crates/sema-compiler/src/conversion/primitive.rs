//! Arithmetic promotions and the usual arithmetic conversions.
//!
//! These compute the operand and result types of built-in arithmetic
//! operators. Enumerations count as integral and promote to their
//! underlying type.

use sema_core::{PrimitiveKind, Type};

use crate::context::CompilationContext;

/// Integral or enumeration type.
pub(crate) fn is_integer(ty: &Type) -> bool {
    ty.is_integral() || ty.is_enum()
}

/// Integral promotion of `ty`, or `None` if it is not an integral type.
///
/// The small character and short types, `wchar_t` and `bool` become `int`;
/// an enumeration becomes its underlying type; anything else is unchanged.
pub fn integral_promotion(ctx: &CompilationContext, ty: &Type) -> Option<Type> {
    if ty.is_enum() {
        return Some(Type::prim(ctx.enum_underlying(ty)));
    }
    let kind = ty.primitive().filter(|k| k.is_integral())?;
    if kind.rank() < PrimitiveKind::Int.rank() {
        Some(Type::int())
    } else {
        Some(Type::prim(kind))
    }
}

/// Integral promotion, plus `float` to `double`.
pub fn arithmetic_promotion(ctx: &CompilationContext, ty: &Type) -> Option<Type> {
    match ty.primitive() {
        Some(PrimitiveKind::Float) => Some(Type::double()),
        Some(k) if k.is_floating() => Some(Type::prim(k)),
        _ => integral_promotion(ctx, ty),
    }
}

/// Common type of a binary arithmetic operation on `t1` and `t2`.
pub fn usual_arithmetic_conversion(ctx: &CompilationContext, t1: &Type, t2: &Type) -> Option<Type> {
    let a = arithmetic_kind(ctx, t1)?;
    let b = arithmetic_kind(ctx, t2)?;
    if a == b {
        return Some(Type::prim(a));
    }

    use PrimitiveKind::*;
    for floating in [LongDouble, Double, Float] {
        if a == floating || b == floating {
            return Some(Type::prim(floating));
        }
    }

    let a = promote_kind(a);
    let b = promote_kind(b);
    if a == b {
        return Some(Type::prim(a));
    }
    let (hi, lo) = if a.rank() > b.rank() { (a, b) } else { (b, a) };
    // A signed type that cannot hold every value of the unsigned one
    // becomes unsigned.
    if lo.is_unsigned() && !hi.is_unsigned() && lo.size() >= hi.size() {
        return Some(Type::prim(hi.to_unsigned()));
    }
    Some(Type::prim(hi))
}

fn arithmetic_kind(ctx: &CompilationContext, ty: &Type) -> Option<PrimitiveKind> {
    if ty.is_enum() {
        return Some(ctx.enum_underlying(ty));
    }
    ty.primitive().filter(|k| k.is_arithmetic())
}

fn promote_kind(kind: PrimitiveKind) -> PrimitiveKind {
    if kind.rank() < PrimitiveKind::Int.rank() {
        PrimitiveKind::Int
    } else {
        kind
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sema_core::{Config, EnumEntry};
    use sema_registry::SymbolRegistry;

    fn prim(k: PrimitiveKind) -> Type {
        Type::prim(k)
    }

    #[test]
    fn small_integers_promote_to_int() {
        let ctx = CompilationContext::default();
        for k in [
            PrimitiveKind::Bool,
            PrimitiveKind::Char,
            PrimitiveKind::UnsignedChar,
            PrimitiveKind::WChar,
            PrimitiveKind::UShort,
        ] {
            assert_eq!(integral_promotion(&ctx, &prim(k)), Some(Type::int()), "{k}");
        }
        assert_eq!(integral_promotion(&ctx, &prim(PrimitiveKind::Long)), Some(prim(PrimitiveKind::Long)));
        assert_eq!(integral_promotion(&ctx, &Type::double()), None);
    }

    #[test]
    fn enums_promote_to_underlying() {
        let mut registry = SymbolRegistry::new();
        let e = EnumEntry::new("Flags").with_underlying(PrimitiveKind::ULong);
        let ty = e.as_type();
        registry.register_enum(e).unwrap();
        let ctx = CompilationContext::new(registry, Config::default());
        assert_eq!(integral_promotion(&ctx, &ty), Some(prim(PrimitiveKind::ULong)));
    }

    #[test]
    fn float_promotes_to_double() {
        let ctx = CompilationContext::default();
        assert_eq!(arithmetic_promotion(&ctx, &prim(PrimitiveKind::Float)), Some(Type::double()));
        assert_eq!(arithmetic_promotion(&ctx, &prim(PrimitiveKind::LongDouble)), Some(prim(PrimitiveKind::LongDouble)));
        assert_eq!(arithmetic_promotion(&ctx, &Type::pointer_to(Type::int())), None);
    }

    #[test]
    fn usual_arithmetic_conversions() {
        let ctx = CompilationContext::default();
        let uac = |a: PrimitiveKind, b: PrimitiveKind| usual_arithmetic_conversion(&ctx, &prim(a), &prim(b));
        assert_eq!(uac(PrimitiveKind::Int, PrimitiveKind::Double), Some(Type::double()));
        assert_eq!(uac(PrimitiveKind::Float, PrimitiveKind::Long), Some(prim(PrimitiveKind::Float)));
        assert_eq!(uac(PrimitiveKind::Char, PrimitiveKind::Short), Some(Type::int()));
        assert_eq!(uac(PrimitiveKind::Int, PrimitiveKind::UInt), Some(prim(PrimitiveKind::UInt)));
        assert_eq!(uac(PrimitiveKind::Long, PrimitiveKind::UInt), Some(prim(PrimitiveKind::Long)));
        assert_eq!(uac(PrimitiveKind::LongLong, PrimitiveKind::ULong), Some(prim(PrimitiveKind::ULongLong)));
        assert_eq!(uac(PrimitiveKind::Int, PrimitiveKind::Void), None);
    }
}
