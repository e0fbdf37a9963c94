//! Standard conversion sequences.

use sema_core::{MemberOwner, PrimitiveKind, Type};

use super::primitive::is_integer;
use super::relations::similar_types;
use super::{ConversionFailure, ConversionKind, StandardConversion};
use crate::context::CompilationContext;
use crate::expr_info::{ExprInfo, StringLiteral};

/// Build the standard conversion sequence from `source` to `target`.
///
/// The sequence is an lvalue transformation, then either identity /
/// derived-to-base or at most one real conversion, then an optional
/// qualification adjustment. Bit-fields convert by their declared type.
pub(crate) fn standard_conversion(
    ctx: &CompilationContext,
    target: &Type,
    source: &ExprInfo,
) -> Result<StandardConversion, ConversionFailure> {
    let param = target.unqualified().clone();
    let is_lvalue = source.is_lvalue();
    let mut current = source.value_type().unqualified().clone();
    let mut seq = StandardConversion::new(param.clone());

    // Lvalue transformation
    match current.clone() {
        Type::Array(elem, _) => match source.string_literal {
            Some(kind) => {
                if literal_decays_to(&param, kind) {
                    let decayed = Type::pointer_to((*elem).clone());
                    let stripped = Type::pointer_to(elem.unqualified().clone());
                    seq.push(ConversionKind::ArrayToPointer, current.clone(), decayed.clone());
                    seq.push(ConversionKind::Qualification, decayed, stripped.clone());
                    current = stripped;
                }
            }
            None => {
                let decayed = Type::pointer_to(*elem);
                seq.push(ConversionKind::ArrayToPointer, current.clone(), decayed.clone());
                current = decayed;
            }
        },
        Type::Function(_) if is_lvalue => {
            let decayed = Type::pointer_to(current.clone());
            seq.push(ConversionKind::FunctionToPointer, current.clone(), decayed.clone());
            current = decayed;
        }
        Type::Function(_) => {}
        _ if is_lvalue => {
            seq.push(ConversionKind::LvalueToRvalue, current.clone(), current.clone());
        }
        _ => {}
    }

    // Same type ignoring top-level cv, or a class and one of its bases
    if current == param {
        seq.push(ConversionKind::Identity, current, param);
        return Ok(seq);
    }
    if param.is_record() && current.is_record() && ctx.is_unambiguous_base_of(&param, &current) {
        seq.push(ConversionKind::DerivedToBase, current, param);
        return Ok(seq);
    }

    let null_pointer = source.is_null_pointer_constant();
    let mut converted = false;
    let mut null_pointer_conversion = false;

    if param.is_bool() && current.is_scalar() {
        seq.push(ConversionKind::Boolean, current.clone(), param.clone());
        converted = true;
    } else if is_integer(&current) && is_integer(&param) {
        let rank = integer_rank(ctx, &current);
        if param.is_primitive(PrimitiveKind::Int) && rank <= PrimitiveKind::WChar.rank() {
            seq.push(ConversionKind::IntegralPromotion, current.clone(), Type::int());
            current = Type::int();
            converted = true;
        } else if current.is_enum() && param.primitive() == Some(ctx.enum_underlying(&current)) {
            seq.push(ConversionKind::IntegralPromotion, current.clone(), param.clone());
            current = param.clone();
            converted = true;
        } else if !param.is_enum() {
            seq.push(ConversionKind::Integral, current.clone(), param.clone());
            converted = true;
        }
    } else if current.is_floating() && param.is_floating() {
        if current.is_primitive(PrimitiveKind::Float) {
            seq.push(ConversionKind::FloatingPromotion, current.clone(), Type::double());
            current = Type::double();
        } else {
            seq.push(ConversionKind::Floating, current.clone(), param.clone());
        }
        converted = true;
    } else if (current.is_floating() && is_integer(&param)) || (is_integer(&current) && param.is_floating()) {
        if !param.is_enum() {
            seq.push(ConversionKind::FloatingIntegral, current.clone(), param.clone());
            converted = true;
        }
    } else if param.is_pointer() && (null_pointer || current.is_pointer()) {
        let target_pointee = param.pointee().cloned().unwrap_or_default();
        if null_pointer && (!current.is_pointer() || similar_types(ctx, &param, &current)) {
            seq.push(ConversionKind::Pointer, current.clone(), param.clone());
            null_pointer_conversion = true;
            converted = true;
        } else if target_pointee.unqualified().is_void() {
            let quals = if null_pointer {
                Default::default()
            } else {
                target_pointee.qualifiers()
            };
            let void_ptr = Type::pointer_to(Type::void().qualified(quals));
            seq.push(ConversionKind::Pointer, current.clone(), void_ptr.clone());
            current = void_ptr;
            converted = true;
        } else if let Some(source_pointee) = current.pointee().cloned() {
            let (to_class, from_class) = (target_pointee.unqualified(), source_pointee.unqualified());
            if to_class.is_record()
                && from_class.is_record()
                && ctx.is_unambiguous_base_of(to_class, from_class)
            {
                let base_ptr = Type::pointer_to(to_class.clone().qualified(source_pointee.qualifiers()));
                seq.push(ConversionKind::Pointer, current.clone(), base_ptr.clone());
                current = base_ptr;
                converted = true;
            }
        }
    } else if param.is_member_pointer() && (null_pointer || current.is_member_pointer()) {
        if null_pointer {
            seq.push(ConversionKind::PointerToMember, current.clone(), param.clone());
            current = param.clone();
            converted = true;
        } else if let (
            Type::MemberPointer {
                owner: MemberOwner::Record(to_owner),
                pointee: to_pointee,
            },
            Type::MemberPointer {
                owner: MemberOwner::Record(from_owner),
                pointee: from_pointee,
            },
        ) = (&param, &current)
        {
            // Base::* converts to Derived::*
            if ctx.registry.is_unambiguous_base_of(from_owner.hash, to_owner.hash) && to_pointee == from_pointee {
                seq.push(ConversionKind::PointerToMember, current.clone(), param.clone());
                current = param.clone();
                converted = true;
            }
        }
    }

    // Qualification adjustment
    if !null_pointer_conversion && current != param && similar_types(ctx, &param, &current) {
        seq.push(ConversionKind::Qualification, current, param);
        converted = true;
    }

    if converted {
        Ok(seq)
    } else {
        Err(ConversionFailure::NoConversion)
    }
}

/// String literals only decay where a suitable pointer target exists.
fn literal_decays_to(param: &Type, kind: StringLiteral) -> bool {
    let Some(pointee) = param.pointee() else {
        return false;
    };
    match pointee.primitive() {
        Some(PrimitiveKind::Void) => true,
        Some(PrimitiveKind::Char) => kind == StringLiteral::Narrow,
        Some(PrimitiveKind::WChar) => kind == StringLiteral::Wide,
        _ => false,
    }
}

/// Conversion rank of an integral type; enumerations rank as their
/// underlying type.
fn integer_rank(ctx: &CompilationContext, ty: &Type) -> u8 {
    if ty.is_enum() {
        ctx.enum_underlying(ty).rank()
    } else {
        ty.primitive().map(PrimitiveKind::rank).unwrap_or(u8::MAX)
    }
}
