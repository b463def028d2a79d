//! Report values
//!
//! [`Value`] is the heterogeneous argument model embedded in narrations.
//! Primitive shapes are explicit variants; anything else travels as an
//! [`ObjectValue`] that strategies can downcast to its concrete type.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// A value embedded in a narration's argument list
#[derive(Debug, Clone)]
pub enum Value {
    /// Missing or null value
    Absent,

    /// Boolean
    Bool(bool),

    /// Signed integer
    Integer(i64),

    /// Floating point number
    Float(f64),

    /// Plain text
    Text(String),

    /// Error with its source chain, outermost first
    Error(Vec<String>),

    /// Ordered collection of values
    Sequence(Vec<Value>),

    /// Arbitrary domain object
    Object(ObjectValue),
}

impl Value {
    /// Wrap an arbitrary domain object
    #[inline]
    #[must_use]
    pub fn object<T>(value: T) -> Self
    where
        T: Any + fmt::Debug + Send + Sync,
    {
        Self::Object(ObjectValue::new(value))
    }

    /// Capture an error and every source below it
    #[must_use]
    pub fn error(err: &(dyn std::error::Error + 'static)) -> Self {
        let mut chain = vec![err.to_string()];
        let mut source = err.source();
        while let Some(cause) = source {
            chain.push(cause.to_string());
            source = cause.source();
        }
        Self::Error(chain)
    }

    /// Build a sequence from anything convertible into values
    #[must_use]
    pub fn sequence<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::Sequence(items.into_iter().map(Into::into).collect())
    }

    /// Check for the absent value
    #[inline]
    #[must_use]
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    /// Downcast an object value to `T`
    #[inline]
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match self {
            Self::Object(object) => object.downcast_ref(),
            _ => None,
        }
    }

    /// Short name of the value's shape, used in diagnostics
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Absent => "absent",
            Self::Bool(_) => "bool",
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::Text(_) => "text",
            Self::Error(_) => "error",
            Self::Sequence(_) => "sequence",
            Self::Object(object) => object.type_name(),
        }
    }
}

/// Default textual representation, used when no strategy applies
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absent => f.write_str(crate::ABSENT),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Text(s) => f.write_str(s),
            Self::Error(chain) => f.write_str(chain.first().map_or("", String::as_str)),
            Self::Sequence(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Self::Object(object) => f.write_str(object.debug_repr()),
        }
    }
}

/// Type-erased domain object
///
/// The `Debug` rendering is captured at construction so the default
/// representation never has to call back into user code.
#[derive(Clone)]
pub struct ObjectValue {
    inner: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
    debug_repr: String,
}

impl ObjectValue {
    /// Wrap a value
    #[must_use]
    pub fn new<T>(value: T) -> Self
    where
        T: Any + fmt::Debug + Send + Sync,
    {
        let debug_repr = format!("{value:?}");
        Self {
            inner: Arc::new(value),
            type_name: std::any::type_name::<T>(),
            debug_repr,
        }
    }

    /// Downcast to the concrete type
    #[inline]
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref()
    }

    /// Check the concrete type
    #[inline]
    #[must_use]
    pub fn is<T: Any>(&self) -> bool {
        self.inner.is::<T>()
    }

    /// Full Rust type name of the wrapped value
    #[inline]
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Captured `Debug` output
    #[inline]
    #[must_use]
    pub fn debug_repr(&self) -> &str {
        &self.debug_repr
    }
}

impl fmt::Debug for ObjectValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectValue")
            .field("type_name", &self.type_name)
            .field("repr", &self.debug_repr)
            .finish()
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

macro_rules! from_integer {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(i: $t) -> Self {
                    Self::Integer(i64::from(i))
                }
            }
        )*
    };
}

from_integer!(i8, i16, i32, i64, u8, u16, u32);

macro_rules! from_wide_integer {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(i: $t) -> Self {
                    i64::try_from(i).map_or_else(|_| Self::Text(i.to_string()), Self::Integer)
                }
            }
        )*
    };
}

from_wide_integer!(u64, usize);

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Self::Float(x)
    }
}

impl From<f32> for Value {
    fn from(x: f32) -> Self {
        Self::Float(f64::from(x))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Self::Absent, Into::into)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Self::sequence(items)
    }
}
