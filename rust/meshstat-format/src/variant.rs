//! A self-typed scalar value.
//!
//! `Variant` carries its element type alongside the payload, so a stream reader can
//! reconstruct the exact value without out-of-band schema information. Variants
//! are totally ordered (first by element type, then by value; floating point
//! values use IEEE total ordering) which lets them live in ordered sets.

use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

use crate::types::ElementType;

#[derive(Debug, Clone)]
pub enum Variant {
    Int8(i8),
    UInt8(u8),
    Int16(i16),
    UInt16(u16),
    Int32(i32),
    UInt32(u32),
    Int64(i64),
    UInt64(u64),
    Float32(f32),
    Float64(f64),
    IdType(i64),
    String(String),
}

impl Variant {
    pub fn element_type(&self) -> ElementType {
        match self {
            Variant::Int8(_) => ElementType::Int8,
            Variant::UInt8(_) => ElementType::UInt8,
            Variant::Int16(_) => ElementType::Int16,
            Variant::UInt16(_) => ElementType::UInt16,
            Variant::Int32(_) => ElementType::Int32,
            Variant::UInt32(_) => ElementType::UInt32,
            Variant::Int64(_) => ElementType::Int64,
            Variant::UInt64(_) => ElementType::UInt64,
            Variant::Float32(_) => ElementType::Float32,
            Variant::Float64(_) => ElementType::Float64,
            Variant::IdType(_) => ElementType::IdType,
            Variant::String(_) => ElementType::String,
        }
    }

    /// Numeric value of the variant, `None` for strings.
    pub fn as_f64(&self) -> Option<f64> {
        let value = match self {
            Variant::Int8(v) => *v as f64,
            Variant::UInt8(v) => *v as f64,
            Variant::Int16(v) => *v as f64,
            Variant::UInt16(v) => *v as f64,
            Variant::Int32(v) => *v as f64,
            Variant::UInt32(v) => *v as f64,
            Variant::Int64(v) | Variant::IdType(v) => *v as f64,
            Variant::UInt64(v) => *v as f64,
            Variant::Float32(v) => *v as f64,
            Variant::Float64(v) => *v,
            Variant::String(_) => return None,
        };
        Some(value)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Variant::String(s) => Some(s),
            _ => None,
        }
    }

    fn rank(&self) -> i32 {
        self.element_type().tag()
    }
}

impl Ord for Variant {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Variant::Int8(l), Variant::Int8(r)) => l.cmp(r),
            (Variant::UInt8(l), Variant::UInt8(r)) => l.cmp(r),
            (Variant::Int16(l), Variant::Int16(r)) => l.cmp(r),
            (Variant::UInt16(l), Variant::UInt16(r)) => l.cmp(r),
            (Variant::Int32(l), Variant::Int32(r)) => l.cmp(r),
            (Variant::UInt32(l), Variant::UInt32(r)) => l.cmp(r),
            (Variant::Int64(l), Variant::Int64(r)) => l.cmp(r),
            (Variant::UInt64(l), Variant::UInt64(r)) => l.cmp(r),
            (Variant::Float32(l), Variant::Float32(r)) => l.total_cmp(r),
            (Variant::Float64(l), Variant::Float64(r)) => l.total_cmp(r),
            (Variant::IdType(l), Variant::IdType(r)) => l.cmp(r),
            (Variant::String(l), Variant::String(r)) => l.cmp(r),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for Variant {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Variant {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Variant {}

impl Hash for Variant {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rank().hash(state);
        match self {
            Variant::Int8(v) => v.hash(state),
            Variant::UInt8(v) => v.hash(state),
            Variant::Int16(v) => v.hash(state),
            Variant::UInt16(v) => v.hash(state),
            Variant::Int32(v) => v.hash(state),
            Variant::UInt32(v) => v.hash(state),
            Variant::Int64(v) | Variant::IdType(v) => v.hash(state),
            Variant::UInt64(v) => v.hash(state),
            Variant::Float32(v) => v.to_bits().hash(state),
            Variant::Float64(v) => v.to_bits().hash(state),
            Variant::String(v) => v.hash(state),
        }
    }
}

impl std::fmt::Display for Variant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Variant::Int8(v) => write!(f, "{v}"),
            Variant::UInt8(v) => write!(f, "{v}"),
            Variant::Int16(v) => write!(f, "{v}"),
            Variant::UInt16(v) => write!(f, "{v}"),
            Variant::Int32(v) => write!(f, "{v}"),
            Variant::UInt32(v) => write!(f, "{v}"),
            Variant::Int64(v) | Variant::IdType(v) => write!(f, "{v}"),
            Variant::UInt64(v) => write!(f, "{v}"),
            Variant::Float32(v) => write!(f, "{v}"),
            Variant::Float64(v) => write!(f, "{v}"),
            Variant::String(v) => f.write_str(v),
        }
    }
}

macro_rules! impl_from_native {
    ($($native:ty => $kind:ident),* $(,)?) => {
        $(
            impl From<$native> for Variant {
                fn from(value: $native) -> Self {
                    Variant::$kind(value)
                }
            }
        )*
    };
}

impl_from_native!(
    i8 => Int8,
    u8 => UInt8,
    i16 => Int16,
    u16 => UInt16,
    i32 => Int32,
    u32 => UInt32,
    i64 => Int64,
    u64 => UInt64,
    f32 => Float32,
    f64 => Float64,
    String => String,
);

impl From<&str> for Variant {
    fn from(value: &str) -> Self {
        Variant::String(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;

    #[test]
    fn test_variant_ordering_within_type() {
        assert!(Variant::Int32(-5) < Variant::Int32(3));
        assert!(Variant::Float64(f64::NEG_INFINITY) < Variant::Float64(0.0));
        assert!(Variant::from("apple") < Variant::from("banana"));
    }

    #[test]
    fn test_variant_nan_is_a_single_set_member() {
        let mut set = BTreeSet::new();
        set.insert(Variant::Float64(f64::NAN));
        set.insert(Variant::Float64(f64::NAN));
        set.insert(Variant::Float64(1.0));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_variant_distinguishes_id_type_from_int64() {
        assert_ne!(Variant::IdType(7), Variant::Int64(7));
        assert_eq!(Variant::IdType(7).element_type(), ElementType::IdType);
        assert_eq!(Variant::IdType(7).as_f64(), Some(7.0));
        assert_eq!(Variant::from("x").as_f64(), None);
    }
}
