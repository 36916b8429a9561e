//! Value cells: the storage that decoders fill and encoders read.

use std::{collections::HashMap, fmt};

use fxhash::FxBuildHasher;

use crate::ty::Type;

/// The storage of a JSON object decoded into a map type.
///
/// Iteration order is the hash map's native order and carries no meaning.
pub type MapValue = HashMap<MapKey, Value, FxBuildHasher>;

/// A map key, decoded from the textual form of a JSON object key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MapKey {
    /// Key of a string kind.
    String(String),
    /// Key of a signed integer kind.
    Int(i64),
    /// Key of an unsigned integer kind.
    Uint(u64),
}

impl fmt::Display for MapKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => f.write_str(s),
            Self::Int(n) => write!(f, "{n}"),
            Self::Uint(n) => write!(f, "{n}"),
        }
    }
}

impl From<&str> for MapKey {
    fn from(value: &str) -> Self { Self::String(value.to_owned()) }
}

/// The storage cell of one value.
///
/// The variant in use is determined by the cell's [`Type`]; see
/// [`Type::zero_value`]. Pointer cells own their pointee in a `Box`, so the
/// pointee's address stays fixed while the cell is decoded into in place.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// A value with no JSON representation.
    Null,
    /// `bool`
    Bool(bool),
    /// Every signed integer width.
    Int(i64),
    /// Every unsigned integer width.
    Uint(u64),
    /// `float32` and `float64`.
    Float(f64),
    /// `string`
    String(String),
    /// `json.Number`: the exact text of a JSON number.
    Number(String),
    /// `[]uint8` and the raw JSON message types.
    Bytes(Vec<u8>),
    /// `Any`: a JSON node inspected at runtime.
    Any(serde_json::Value),
    /// A fixed-size array.
    Array(Vec<Self>),
    /// A slice; `None` is the nil slice.
    Slice(Option<Vec<Self>>),
    /// A map; `None` is the nil map.
    Map(Option<MapValue>),
    /// A pointer; `None` is the nil pointer.
    Pointer(Option<Box<Self>>),
    /// An interface holding a dynamically typed value; `None` is nil.
    Interface(Option<Box<Dynamic>>),
    /// A record's fields in declaration order.
    Record(Vec<Self>),
}

impl Value {
    /// Returns `true` for the nil states of pointers, slices, maps and
    /// interfaces, and for [`Value::Null`].
    #[must_use]
    pub const fn is_nil(&self) -> bool {
        matches!(
            self,
            Self::Null
                | Self::Slice(None)
                | Self::Map(None)
                | Self::Pointer(None)
                | Self::Interface(None)
        )
    }

    /// A non-nil pointer owning `pointee`.
    #[must_use]
    pub fn pointer(pointee: Self) -> Self {
        Self::Pointer(Some(Box::new(pointee)))
    }

    /// A non-nil slice.
    #[must_use]
    pub const fn slice(elems: Vec<Self>) -> Self { Self::Slice(Some(elems)) }

    /// A non-nil map built from `(key, value)` pairs.
    #[must_use]
    pub fn map<K: Into<MapKey>>(
        entries: impl IntoIterator<Item = (K, Self)>,
    ) -> Self {
        Self::Map(Some(
            entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        ))
    }

    /// An interface holding `value`.
    #[must_use]
    pub fn interface(value: Dynamic) -> Self {
        Self::Interface(Some(Box::new(value)))
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self { Self::String(value.to_owned()) }
}

impl From<String> for Value {
    fn from(value: String) -> Self { Self::String(value) }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self { Self::Bool(value) }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self { Self::Int(value) }
}

impl From<u64> for Value {
    fn from(value: u64) -> Self { Self::Uint(value) }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self { Self::Float(value) }
}

/// A value paired with its concrete type: the dynamically typed value of
/// untyped call sites.
#[derive(Debug, Clone, PartialEq)]
pub struct Dynamic {
    ty: Type,
    value: Value,
}

impl Dynamic {
    /// Pairs a value with its type. The caller guarantees the value's
    /// variant matches the type.
    #[must_use]
    pub const fn new(ty: Type, value: Value) -> Self { Self { ty, value } }

    /// The zero value of `ty`.
    #[must_use]
    pub fn zero(ty: Type) -> Self { Self { ty, value: ty.zero_value() } }

    /// Allocates the zero value of `pointee` and returns a `*pointee`
    /// referring to it, the usual destination for decoding.
    #[must_use]
    pub fn new_pointer(pointee: Type) -> Self {
        Self {
            ty: Type::pointer_to(pointee),
            value: Value::pointer(pointee.zero_value()),
        }
    }

    /// The concrete type.
    #[must_use]
    pub const fn ty(&self) -> Type { self.ty }

    /// The stored value.
    #[must_use]
    pub const fn value(&self) -> &Value { &self.value }

    /// The stored value, mutably.
    pub const fn value_mut(&mut self) -> &mut Value { &mut self.value }

    /// Unwraps the stored value.
    #[must_use]
    pub fn into_value(self) -> Value { self.value }

    /// Whether the stored value is nil.
    #[must_use]
    pub const fn is_nil(&self) -> bool { self.value.is_nil() }

    /// The pointee of a non-nil pointer value.
    #[must_use]
    pub fn pointee(&self) -> Option<&Value> {
        match &self.value {
            Value::Pointer(Some(pointee)) => Some(pointee),
            _ => None,
        }
    }

    /// The pointee of a non-nil pointer value, mutably.
    pub fn pointee_mut(&mut self) -> Option<&mut Value> {
        match &mut self.value {
            Value::Pointer(Some(pointee)) => Some(pointee),
            _ => None,
        }
    }
}
