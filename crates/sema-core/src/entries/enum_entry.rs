//! Enumeration entry.

use crate::{PrimitiveKind, Type, TypeHash};

/// Symbol table entry for an enumeration.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumEntry {
    pub name: String,
    pub type_hash: TypeHash,
    /// Underlying integral type, the target of enum integral promotion.
    pub underlying: PrimitiveKind,
}

impl EnumEntry {
    /// Create an enumeration with underlying type `int`.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            type_hash: TypeHash::from_name(&name),
            name,
            underlying: PrimitiveKind::Int,
        }
    }

    pub fn with_underlying(mut self, underlying: PrimitiveKind) -> Self {
        self.underlying = underlying;
        self
    }

    pub fn as_type(&self) -> Type {
        Type::enumeration(self.type_hash, self.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enum_entry() {
        let e = EnumEntry::new("Color").with_underlying(PrimitiveKind::UShort);
        assert_eq!(e.underlying, PrimitiveKind::UShort);
        assert!(e.as_type().is_enum());
        assert_eq!(e.as_type().to_string(), "Color");
    }
}
