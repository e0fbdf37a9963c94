//! cv-qualifiers.

use std::fmt;

use bitflags::bitflags;

bitflags! {
    /// Qualifiers attached to a type.
    ///
    /// `RESTRICT` is carried along for fidelity but never takes part in
    /// qualification ranking.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
    pub struct Qualifiers: u8 {
        const CONST = 0b001;
        const VOLATILE = 0b010;
        const RESTRICT = 0b100;
    }
}

impl Qualifiers {
    /// The cv part only.
    #[inline]
    pub fn cv(self) -> Qualifiers {
        self & (Qualifiers::CONST | Qualifiers::VOLATILE)
    }

    /// Whether `self` carries at least every cv-qualifier of `other`.
    #[inline]
    pub fn is_equal_or_more_than(self, other: Qualifiers) -> bool {
        self.cv().contains(other.cv())
    }

    /// Ranking used by qualification comparisons: const counts 2, volatile 1.
    pub fn weight(self) -> u8 {
        let mut w = 0;
        if self.contains(Qualifiers::CONST) {
            w += 2;
        }
        if self.contains(Qualifiers::VOLATILE) {
            w += 1;
        }
        w
    }

    /// Compact encoding used when hashing member functions.
    #[inline]
    pub fn cv_bits(self) -> u8 {
        self.cv().bits()
    }
}

impl fmt::Display for Qualifiers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if self.contains(Qualifiers::CONST) {
            parts.push("const");
        }
        if self.contains(Qualifiers::VOLATILE) {
            parts.push("volatile");
        }
        if self.contains(Qualifiers::RESTRICT) {
            parts.push("restrict");
        }
        f.write_str(&parts.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn more_qualified() {
        let cv = Qualifiers::CONST | Qualifiers::VOLATILE;
        assert!(cv.is_equal_or_more_than(Qualifiers::CONST));
        assert!(Qualifiers::CONST.is_equal_or_more_than(Qualifiers::empty()));
        assert!(!Qualifiers::CONST.is_equal_or_more_than(Qualifiers::VOLATILE));
    }

    #[test]
    fn restrict_is_ignored_for_ranking() {
        assert!(Qualifiers::empty().is_equal_or_more_than(Qualifiers::RESTRICT));
        assert_eq!(Qualifiers::RESTRICT.weight(), 0);
        assert_eq!((Qualifiers::CONST | Qualifiers::VOLATILE).weight(), 3);
    }

    #[test]
    fn display() {
        assert_eq!(
            (Qualifiers::CONST | Qualifiers::VOLATILE).to_string(),
            "const volatile"
        );
    }
}
