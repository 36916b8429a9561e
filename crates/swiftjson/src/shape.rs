//! Classification of types into the closed set of codec shapes.

use swiftjson_reflect::{Kind, Marker, Type};

use crate::codec::scalar;

/// How a type is encoded and decoded, decided once per type.
///
/// Markers and conversion hooks take priority over the structural kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shape {
    /// The unnamed `[]uint8`, as base64 text.
    Bytes,
    /// A raw JSON message type, copied verbatim.
    RawJson,
    /// `json.Number`, kept as literal text.
    Number,
    /// The type carries its own conversion hooks. A direction without a
    /// hook uses `fallback`.
    Custom {
        /// The shape used by a direction the type has no hook for.
        fallback: Box<Self>,
    },
    /// `Any`, inspected at runtime.
    Any,
    /// A scalar kind with a fixed codec.
    Scalar(Kind),
    /// `interface {}`.
    Dynamic,
    /// An interface with required methods.
    ConstrainedDynamic,
    /// A record.
    Record,
    /// A fixed-size array.
    Array,
    /// A slice.
    Slice,
    /// A map.
    Map,
    /// A pointer.
    Optional,
    /// A kind with no JSON form.
    Unsupported,
}

impl Shape {
    /// Classifies `ty`.
    #[must_use]
    pub fn of(ty: Type) -> Self {
        if ty == Type::bytes() {
            return Self::Bytes;
        }
        match ty.marker() {
            Some(Marker::JsonRawMessage | Marker::RawMessage) => {
                return Self::RawJson;
            }
            Some(Marker::Number) => return Self::Number,
            Some(Marker::Any) | None => {}
        }

        let fallback = if ty.marker() == Some(Marker::Any) {
            Self::Any
        } else {
            Self::structural(ty)
        };
        if ty.marshaler().is_some() || ty.unmarshaler().is_some() {
            return Self::Custom { fallback: Box::new(fallback) };
        }
        fallback
    }

    fn structural(ty: Type) -> Self {
        match ty.kind() {
            kind if scalar::is_scalar(kind) => Self::Scalar(kind),
            Kind::Interface if ty.num_method() == 0 => Self::Dynamic,
            Kind::Interface => Self::ConstrainedDynamic,
            Kind::Struct => Self::Record,
            Kind::Array => Self::Array,
            Kind::Slice => Self::Slice,
            Kind::Map => Self::Map,
            Kind::Pointer => Self::Optional,
            _ => Self::Unsupported,
        }
    }
}
