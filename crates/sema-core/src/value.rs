//! Constant values.
//!
//! Used for non-type template arguments, dependent array dimensions, and
//! null-pointer-constant detection.

use std::fmt;
use std::hash::{Hash, Hasher};

use ordered_float::OrderedFloat;

/// A compile-time constant.
///
/// Integral values compare by numeric value regardless of signedness, so an
/// array dimension `3u` deduces the same argument as a literal `3`.
#[derive(Debug, Clone, Copy)]
pub enum Value {
    Signed(i64),
    Unsigned(u64),
    Float(OrderedFloat<f64>),
}

impl Value {
    pub fn float(v: f64) -> Self {
        Value::Float(OrderedFloat(v))
    }

    /// Integral view of the value, if it has one.
    pub fn as_integer(&self) -> Option<i128> {
        match *self {
            Value::Signed(v) => Some(v as i128),
            Value::Unsigned(v) => Some(v as i128),
            Value::Float(_) => None,
        }
    }

    /// A zero-valued integral constant, as required for a null pointer constant.
    pub fn is_integral_zero(&self) -> bool {
        self.as_integer() == Some(0)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self.as_integer(), other.as_integer()) {
            (Some(a), Some(b)) => a == b,
            (None, None) => match (self, other) {
                (Value::Float(a), Value::Float(b)) => a == b,
                _ => false,
            },
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self.as_integer() {
            Some(v) => {
                0u8.hash(state);
                v.hash(state);
            }
            None => {
                1u8.hash(state);
                if let Value::Float(f) = self {
                    f.hash(state);
                }
            }
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Signed(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::Unsigned(v)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Signed(v) => write!(f, "{v}"),
            Value::Unsigned(v) => write!(f, "{v}u"),
            Value::Float(v) => write!(f, "{}", v.0),
        }
    }
}
