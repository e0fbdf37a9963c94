//! Deterministic hash-based identity for records, enums, functions and templates.
//!
//! [`TypeHash`] is a 64-bit hash computed from names and signatures, so the
//! same declaration always gets the same identity regardless of registration
//! order. Template instances hash their template together with the hashes of
//! their arguments, which makes element-wise equal argument lists collide on
//! purpose.
//!
//! # Hash Computation
//!
//! Uses XXHash64 with domain-specific mixing constants so that, for example,
//! a function `f` and a record `f` never share an identity.
//!
//! # Examples
//!
//! ```
//! use sema_core::TypeHash;
//!
//! let a = TypeHash::from_name("Box");
//! assert_eq!(a, TypeHash::from_name("Box"));
//!
//! let int_hash = TypeHash::from_name("int");
//! let f1 = TypeHash::from_function("f", &[int_hash]);
//! let f2 = TypeHash::from_function("f", &[TypeHash::from_name("double")]);
//! assert_ne!(f1, f2);
//! ```

use std::fmt;
use xxhash_rust::xxh64::xxh64;

/// Domain-specific mixing constants for hash computation.
pub mod hash_constants {
    /// Separator constant for sequence components.
    pub const SEP: u64 = 0x4bc94d6bd06053ad;

    /// Domain marker for type hashes.
    pub const TYPE: u64 = 0x2fac10b63a6cc57c;

    /// Domain marker for free function hashes.
    pub const FUNCTION: u64 = 0x5ea77ffbcdf5f302;

    /// Domain marker for member function hashes.
    pub const METHOD: u64 = 0x7d3c8b4a92e15f6d;

    /// Domain marker for constructor hashes.
    pub const CONSTRUCTOR: u64 = 0x9a7f3d5e2b8c4601;

    /// Domain marker for conversion function hashes.
    pub const CONVERSION: u64 = 0x61c8864680b583eb;

    /// Domain marker for synthesized built-in operator hashes.
    pub const BUILTIN: u64 = 0x3e9f5d2a8c7b1403;

    /// Domain marker for template entity hashes.
    pub const TEMPLATE: u64 = 0x1a095090689d4647;

    /// Position mixing constants, so that `(int, double)` and `(double, int)` differ.
    pub const PARAM_MARKERS: [u64; 8] = [
        0x9e3779b97f4a7c15,
        0xbf58476d1ce4e5b9,
        0x94d049bb133111eb,
        0xd6e8feb86659fd93,
        0xe7037ed1a0b428db,
        0xc6a4a7935bd1e995,
        0x8648dbbc94d49b8d,
        0xa2b48b2c69e0d657,
    ];
}

/// A deterministic 64-bit identity for a record, enum, function or template.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[repr(transparent)]
pub struct TypeHash(pub u64);

impl TypeHash {
    /// Empty/invalid hash constant.
    pub const EMPTY: TypeHash = TypeHash(0);

    /// Create a hash from a qualified record or enum name.
    #[inline]
    pub fn from_name(name: &str) -> Self {
        TypeHash(hash_constants::TYPE ^ xxh64(name.as_bytes(), 0))
    }

    /// Create a template entity hash from its qualified name.
    #[inline]
    pub fn from_template(name: &str) -> Self {
        TypeHash(hash_constants::TEMPLATE ^ xxh64(name.as_bytes(), 0))
    }

    /// Create a free function hash from name and parameter type hashes.
    #[inline]
    pub fn from_function(name: &str, param_hashes: &[TypeHash]) -> Self {
        mix_sequence(
            hash_constants::FUNCTION ^ xxh64(name.as_bytes(), 0),
            param_hashes,
        )
    }

    /// Create a member function hash.
    ///
    /// The method's cv-qualification participates, so `f()` and `f() const`
    /// are distinct overloads.
    #[inline]
    pub fn from_method(owner: TypeHash, name: &str, param_hashes: &[TypeHash], cv_bits: u8) -> Self {
        let seed = hash_constants::METHOD ^ owner.0 ^ xxh64(name.as_bytes(), 0) ^ cv_bits as u64;
        mix_sequence(seed, param_hashes)
    }

    /// Create a constructor hash from owner and parameter type hashes.
    #[inline]
    pub fn from_constructor(owner: TypeHash, param_hashes: &[TypeHash]) -> Self {
        mix_sequence(hash_constants::CONSTRUCTOR ^ owner.0, param_hashes)
    }

    /// Create a conversion function hash from owner and target type.
    #[inline]
    pub fn from_conversion(owner: TypeHash, target: TypeHash, cv_bits: u8) -> Self {
        mix_sequence(
            hash_constants::CONVERSION ^ owner.0 ^ cv_bits as u64,
            &[target],
        )
    }

    /// Create a hash for a synthesized built-in operator candidate.
    #[inline]
    pub fn from_builtin(operator: &str, param_hashes: &[TypeHash]) -> Self {
        mix_sequence(
            hash_constants::BUILTIN ^ xxh64(operator.as_bytes(), 0),
            param_hashes,
        )
    }

    /// Create a template instance hash from the template and its argument hashes.
    ///
    /// Argument order matters.
    #[inline]
    pub fn from_template_instance(template: TypeHash, args: &[TypeHash]) -> Self {
        mix_sequence(template.0, args)
    }

    /// Check if this is an empty/invalid hash.
    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

fn mix_sequence(seed: u64, items: &[TypeHash]) -> TypeHash {
    let mut hash = seed;
    for (i, item) in items.iter().enumerate() {
        let marker = hash_constants::PARAM_MARKERS
            .get(i)
            .copied()
            .unwrap_or_else(|| hash_constants::PARAM_MARKERS[0].wrapping_add(i as u64));
        hash = hash
            .wrapping_mul(hash_constants::SEP)
            .wrapping_add(marker ^ item.0);
    }
    TypeHash(hash)
}

impl fmt::Debug for TypeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeHash({:#018x})", self.0)
    }
}

impl fmt::Display for TypeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#018x}", self.0)
    }
}
