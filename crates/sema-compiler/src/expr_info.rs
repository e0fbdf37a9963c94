//! Expression facts consumed by the engine.
//!
//! `ExprInfo` is what the surrounding semantic pass knows about an
//! argument expression: its type, value category, constant value and
//! position. The engine never looks at syntax trees.

use sema_core::{Span, Type, Value};

/// String literal flavour, which restricts array-to-pointer decay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringLiteral {
    Narrow,
    Wide,
}

/// Facts about one argument expression.
#[derive(Debug, Clone, PartialEq)]
pub struct ExprInfo {
    /// The type of the expression. A reference type designates an lvalue.
    pub ty: Type,
    /// Whether this is an lvalue.
    pub is_lvalue: bool,
    /// Whether the expression designates a bit-field.
    pub is_bitfield: bool,
    /// Constant value, if the expression is a constant expression.
    pub constant: Option<Value>,
    /// Set for string literal expressions.
    pub string_literal: Option<StringLiteral>,
    pub span: Span,
}

impl ExprInfo {
    fn new(ty: Type, is_lvalue: bool) -> Self {
        Self {
            ty,
            is_lvalue,
            is_bitfield: false,
            constant: None,
            string_literal: None,
            span: Span::UNKNOWN,
        }
    }

    /// A temporary value.
    ///
    /// # Example
    /// ```ignore
    /// // The result of `1.0 + x` is an rvalue
    /// let info = ExprInfo::rvalue(Type::double());
    /// assert!(!info.is_lvalue);
    /// ```
    pub fn rvalue(ty: Type) -> Self {
        Self::new(ty, false)
    }

    /// An lvalue, such as a named variable.
    pub fn lvalue(ty: Type) -> Self {
        Self::new(ty, true)
    }

    /// A constant rvalue, such as the literal `0`.
    pub fn constant(ty: Type, value: Value) -> Self {
        Self {
            constant: Some(value),
            ..Self::new(ty, false)
        }
    }

    /// The literal `0`, the canonical null pointer constant.
    pub fn null_pointer() -> Self {
        Self::constant(Type::int(), Value::Signed(0))
    }

    /// A string literal of type `const char[len]` (or `const wchar_t[len]`).
    pub fn string_literal(kind: StringLiteral, len: u64) -> Self {
        let elem = match kind {
            StringLiteral::Narrow => Type::prim(sema_core::PrimitiveKind::Char),
            StringLiteral::Wide => Type::prim(sema_core::PrimitiveKind::WChar),
        };
        Self {
            string_literal: Some(kind),
            ..Self::new(Type::array_of(elem.with_const(), len), true)
        }
    }

    /// A bit-field member access of the given type.
    pub fn bitfield(ty: Type) -> Self {
        Self {
            is_bitfield: true,
            ..Self::new(ty, true)
        }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// The expression type without its reference.
    pub fn value_type(&self) -> &Type {
        self.ty.strip_reference()
    }

    /// Whether the expression designates an lvalue, either by category or
    /// because its type is a reference.
    pub fn is_lvalue(&self) -> bool {
        self.is_lvalue || self.ty.is_reference()
    }

    /// Integral rvalue constant of value zero.
    pub fn is_null_pointer_constant(&self) -> bool {
        !self.is_lvalue()
            && self.value_type().is_integral()
            && self.constant.is_some_and(|v| v.is_integral_zero())
    }
}
