//! Fundamental arithmetic types.

use std::fmt;

use num_enum::{IntoPrimitive, TryFromPrimitive};

/// A fundamental (built-in) type.
///
/// Variants are declared in integer conversion rank order; the discriminant
/// doubles as the rank used by integral promotion and the usual arithmetic
/// conversions.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, IntoPrimitive, TryFromPrimitive,
)]
#[repr(u8)]
pub enum PrimitiveKind {
    Bool = 0,
    Char = 1,
    SignedChar = 2,
    UnsignedChar = 3,
    WChar = 4,
    Short = 5,
    UShort = 6,
    Int = 7,
    UInt = 8,
    Long = 9,
    ULong = 10,
    LongLong = 11,
    ULongLong = 12,
    Float = 13,
    Double = 14,
    LongDouble = 15,
    Void = 16,
}

impl PrimitiveKind {
    /// The type `ptrdiff_t` maps to.
    pub const PTRDIFF: PrimitiveKind = PrimitiveKind::Long;

    /// Source spelling of this type.
    pub const fn name(self) -> &'static str {
        match self {
            PrimitiveKind::Bool => "bool",
            PrimitiveKind::Char => "char",
            PrimitiveKind::SignedChar => "signed char",
            PrimitiveKind::UnsignedChar => "unsigned char",
            PrimitiveKind::WChar => "wchar_t",
            PrimitiveKind::Short => "short",
            PrimitiveKind::UShort => "unsigned short",
            PrimitiveKind::Int => "int",
            PrimitiveKind::UInt => "unsigned int",
            PrimitiveKind::Long => "long",
            PrimitiveKind::ULong => "unsigned long",
            PrimitiveKind::LongLong => "long long",
            PrimitiveKind::ULongLong => "unsigned long long",
            PrimitiveKind::Float => "float",
            PrimitiveKind::Double => "double",
            PrimitiveKind::LongDouble => "long double",
            PrimitiveKind::Void => "void",
        }
    }

    /// Integer conversion rank.
    #[inline]
    pub fn rank(self) -> u8 {
        self.into()
    }

    /// Integral types, including `bool` and the character types.
    pub fn is_integral(self) -> bool {
        self <= PrimitiveKind::ULongLong
    }

    pub fn is_floating(self) -> bool {
        matches!(
            self,
            PrimitiveKind::Float | PrimitiveKind::Double | PrimitiveKind::LongDouble
        )
    }

    pub fn is_arithmetic(self) -> bool {
        self.is_integral() || self.is_floating()
    }

    pub fn is_void(self) -> bool {
        self == PrimitiveKind::Void
    }

    pub fn is_unsigned(self) -> bool {
        matches!(
            self,
            PrimitiveKind::Bool
                | PrimitiveKind::UnsignedChar
                | PrimitiveKind::UShort
                | PrimitiveKind::UInt
                | PrimitiveKind::ULong
                | PrimitiveKind::ULongLong
        )
    }

    /// Width in bytes on the modelled target (LP64).
    pub const fn size(self) -> u8 {
        match self {
            PrimitiveKind::Bool
            | PrimitiveKind::Char
            | PrimitiveKind::SignedChar
            | PrimitiveKind::UnsignedChar => 1,
            PrimitiveKind::Short | PrimitiveKind::UShort => 2,
            PrimitiveKind::WChar
            | PrimitiveKind::Int
            | PrimitiveKind::UInt
            | PrimitiveKind::Float => 4,
            PrimitiveKind::Long
            | PrimitiveKind::ULong
            | PrimitiveKind::LongLong
            | PrimitiveKind::ULongLong
            | PrimitiveKind::Double => 8,
            PrimitiveKind::LongDouble => 16,
            PrimitiveKind::Void => 0,
        }
    }

    /// The unsigned type of the same rank.
    pub fn to_unsigned(self) -> PrimitiveKind {
        match self {
            PrimitiveKind::Char | PrimitiveKind::SignedChar => PrimitiveKind::UnsignedChar,
            PrimitiveKind::Short => PrimitiveKind::UShort,
            PrimitiveKind::Int => PrimitiveKind::UInt,
            PrimitiveKind::Long => PrimitiveKind::ULong,
            PrimitiveKind::LongLong => PrimitiveKind::ULongLong,
            other => other,
        }
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
