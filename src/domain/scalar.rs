//! Scalar payload held by value nodes.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// A single terminal value in a configuration tree.
///
/// No range or type checking happens here; coercion into typed
/// objects is the job of whoever consumes the tree.
#[derive(Clone)]
pub enum Scalar {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    /// Arbitrary host object, carried as an immutable shared handle.
    Opaque(Arc<dyn Any + Send + Sync>),
}

impl Scalar {
    /// Wrap an arbitrary object as an opaque scalar.
    pub fn opaque<T: Any + Send + Sync>(value: T) -> Self {
        Scalar::Opaque(Arc::new(value))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Scalar::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Scalar::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Borrow the opaque payload as `T`, if this is an opaque scalar of that type.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match self {
            Scalar::Opaque(obj) => obj.downcast_ref::<T>(),
            _ => None,
        }
    }

    /// Short type name used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Scalar::String(_) => "string",
            Scalar::Integer(_) => "integer",
            Scalar::Float(_) => "float",
            Scalar::Boolean(_) => "boolean",
            Scalar::Opaque(_) => "opaque",
        }
    }
}

// Opaque handles compare by identity: two scalars are equal only if they
// share the same allocation. NaN equals NaN so that structural equality
// stays reflexive.
impl PartialEq for Scalar {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Scalar::String(a), Scalar::String(b)) => a == b,
            (Scalar::Integer(a), Scalar::Integer(b)) => a == b,
            (Scalar::Float(a), Scalar::Float(b)) => a == b || (a.is_nan() && b.is_nan()),
            (Scalar::Boolean(a), Scalar::Boolean(b)) => a == b,
            (Scalar::Opaque(a), Scalar::Opaque(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::String(s) => f.debug_tuple("String").field(s).finish(),
            Scalar::Integer(i) => f.debug_tuple("Integer").field(i).finish(),
            Scalar::Float(x) => f.debug_tuple("Float").field(x).finish(),
            Scalar::Boolean(b) => f.debug_tuple("Boolean").field(b).finish(),
            Scalar::Opaque(_) => f.write_str("Opaque(..)"),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::String(s) => write!(f, "{}", s),
            Scalar::Integer(i) => write!(f, "{}", i),
            Scalar::Float(x) => write!(f, "{}", x),
            Scalar::Boolean(b) => write!(f, "{}", b),
            Scalar::Opaque(_) => f.write_str("<opaque>"),
        }
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::String(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::String(value)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Integer(value)
    }
}

impl From<i32> for Scalar {
    fn from(value: i32) -> Self {
        Scalar::Integer(value.into())
    }
}

impl From<u32> for Scalar {
    fn from(value: u32) -> Self {
        Scalar::Integer(value.into())
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Scalar::Float(value)
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Scalar::Boolean(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Endpoint {
        port: u16,
    }

    #[test]
    fn given_two_handles_to_same_object_when_comparing_then_equal() {
        let a = Scalar::opaque(Endpoint { port: 80 });
        let b = a.clone();
        assert_eq!(a, b);
    }

    #[test]
    fn given_equal_but_distinct_objects_when_comparing_then_not_equal() {
        let a = Scalar::opaque(Endpoint { port: 80 });
        let b = Scalar::opaque(Endpoint { port: 80 });
        assert_ne!(a, b);
    }

    #[test]
    fn given_opaque_scalar_when_downcasting_then_returns_payload() {
        let s = Scalar::opaque(Endpoint { port: 8080 });
        assert_eq!(s.downcast_ref::<Endpoint>(), Some(&Endpoint { port: 8080 }));
        assert!(s.downcast_ref::<String>().is_none());
        assert_eq!(s.to_string(), "<opaque>");
    }

    #[test]
    fn given_mixed_variants_when_comparing_then_not_equal() {
        assert_ne!(Scalar::from(1), Scalar::from(1.0));
        assert_ne!(Scalar::from("true"), Scalar::from(true));
    }

    #[test]
    fn given_non_finite_floats_when_comparing_then_nan_equals_nan() {
        assert_eq!(Scalar::from(f64::NAN), Scalar::from(f64::NAN));
        assert_eq!(Scalar::from(f64::INFINITY), Scalar::from(f64::INFINITY));
        assert_eq!(Scalar::from(0.0), Scalar::from(-0.0));
        assert_ne!(Scalar::from(f64::NAN), Scalar::from(1.0));
        assert_ne!(Scalar::from(f64::INFINITY), Scalar::from(f64::NEG_INFINITY));
    }
}
