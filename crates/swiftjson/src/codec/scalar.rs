//! Fixed codecs for the scalar kinds.

use std::sync::Arc;

use swiftjson_reflect::{Kind, Value};
use swiftjson_stream::{Reader, Writer};

use crate::codec::{Decoder, DecoderRef, Encoder, EncoderRef, mismatch};

/// `bool`
#[derive(Debug, Clone, Copy, Default)]
pub struct BoolCodec;

impl Decoder for BoolCodec {
    fn decode(&self, value: &mut Value, reader: &mut Reader<'_>) {
        let b = reader.read_bool();
        if reader.error.is_none() {
            *value = Value::Bool(b);
        }
    }
}

impl Encoder for BoolCodec {
    fn is_empty(&self, value: &Value) -> bool {
        matches!(value, Value::Bool(false))
    }

    fn encode(&self, value: &Value, writer: &mut Writer) {
        match value {
            Value::Bool(b) => writer.write_bool(*b),
            other => mismatch(writer, "bool", other),
        }
    }
}

/// `string`
#[derive(Debug, Clone, Copy, Default)]
pub struct StringCodec;

impl Decoder for StringCodec {
    fn decode(&self, value: &mut Value, reader: &mut Reader<'_>) {
        let s = reader.read_string();
        if reader.error.is_none() {
            *value = Value::String(s);
        }
    }
}

impl Encoder for StringCodec {
    fn is_empty(&self, value: &Value) -> bool {
        matches!(value, Value::String(s) if s.is_empty())
    }

    fn encode(&self, value: &Value, writer: &mut Writer) {
        match value {
            Value::String(s) => writer.write_string(s),
            other => mismatch(writer, "string", other),
        }
    }
}

macro_rules! signed_codecs {
    ($($(#[$doc:meta])* $codec:ident => $repr:ty, $name:literal;)*) => {$(
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, Default)]
        pub struct $codec;

        impl Decoder for $codec {
            fn decode(&self, value: &mut Value, reader: &mut Reader<'_>) {
                let n = reader.read_i64();
                if reader.error.is_some() {
                    return;
                }
                if <$repr>::try_from(n).is_err() {
                    reader.report_error(
                        "ReadInt",
                        format!("{n} overflows {}", $name),
                    );
                    return;
                }
                *value = Value::Int(n);
            }
        }

        impl Encoder for $codec {
            fn is_empty(&self, value: &Value) -> bool {
                matches!(value, Value::Int(0))
            }

            fn encode(&self, value: &Value, writer: &mut Writer) {
                match value {
                    Value::Int(n) => writer.write_i64(*n),
                    other => mismatch(writer, $name, other),
                }
            }
        }
    )*};
}

macro_rules! unsigned_codecs {
    ($($(#[$doc:meta])* $codec:ident => $repr:ty, $name:literal;)*) => {$(
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, Default)]
        pub struct $codec;

        impl Decoder for $codec {
            fn decode(&self, value: &mut Value, reader: &mut Reader<'_>) {
                let n = reader.read_u64();
                if reader.error.is_some() {
                    return;
                }
                if <$repr>::try_from(n).is_err() {
                    reader.report_error(
                        "ReadUint",
                        format!("{n} overflows {}", $name),
                    );
                    return;
                }
                *value = Value::Uint(n);
            }
        }

        impl Encoder for $codec {
            fn is_empty(&self, value: &Value) -> bool {
                matches!(value, Value::Uint(0))
            }

            fn encode(&self, value: &Value, writer: &mut Writer) {
                match value {
                    Value::Uint(n) => writer.write_u64(*n),
                    other => mismatch(writer, $name, other),
                }
            }
        }
    )*};
}

signed_codecs! {
    /// `int`
    IntCodec => i64, "int";
    /// `int8`
    Int8Codec => i8, "int8";
    /// `int16`
    Int16Codec => i16, "int16";
    /// `int32`
    Int32Codec => i32, "int32";
    /// `int64`
    Int64Codec => i64, "int64";
}

unsigned_codecs! {
    /// `uint`
    UintCodec => u64, "uint";
    /// `uint8`
    Uint8Codec => u8, "uint8";
    /// `uint16`
    Uint16Codec => u16, "uint16";
    /// `uint32`
    Uint32Codec => u32, "uint32";
    /// `uint64`
    Uint64Codec => u64, "uint64";
}

/// `float32`. Decoded values are rounded to single precision.
#[derive(Debug, Clone, Copy, Default)]
pub struct Float32Codec;

impl Decoder for Float32Codec {
    #[allow(clippy::cast_possible_truncation)]
    fn decode(&self, value: &mut Value, reader: &mut Reader<'_>) {
        let n = reader.read_f64();
        if reader.error.is_some() {
            return;
        }
        let single = n as f32;
        if single.is_infinite() {
            reader.report_error(
                "ReadFloat32",
                format!("{n} overflows float32"),
            );
            return;
        }
        *value = Value::Float(f64::from(single));
    }
}

impl Encoder for Float32Codec {
    fn is_empty(&self, value: &Value) -> bool {
        matches!(value, Value::Float(n) if *n == 0.0)
    }

    #[allow(clippy::cast_possible_truncation)]
    fn encode(&self, value: &Value, writer: &mut Writer) {
        match value {
            Value::Float(n) => writer.write_f32(*n as f32),
            other => mismatch(writer, "float32", other),
        }
    }
}

/// `float64`
#[derive(Debug, Clone, Copy, Default)]
pub struct Float64Codec;

impl Decoder for Float64Codec {
    fn decode(&self, value: &mut Value, reader: &mut Reader<'_>) {
        let n = reader.read_f64();
        if reader.error.is_none() {
            *value = Value::Float(n);
        }
    }
}

impl Encoder for Float64Codec {
    fn is_empty(&self, value: &Value) -> bool {
        matches!(value, Value::Float(n) if *n == 0.0)
    }

    fn encode(&self, value: &Value, writer: &mut Writer) {
        match value {
            Value::Float(n) => writer.write_f64(*n),
            other => mismatch(writer, "float64", other),
        }
    }
}

macro_rules! by_kind {
    ($kind:expr, $ref:ty) => {{
        let codec: $ref = match $kind {
            Kind::Bool => Arc::new(BoolCodec),
            Kind::String => Arc::new(StringCodec),
            Kind::Int => Arc::new(IntCodec),
            Kind::Int8 => Arc::new(Int8Codec),
            Kind::Int16 => Arc::new(Int16Codec),
            Kind::Int32 => Arc::new(Int32Codec),
            Kind::Int64 => Arc::new(Int64Codec),
            Kind::Uint => Arc::new(UintCodec),
            Kind::Uint8 => Arc::new(Uint8Codec),
            Kind::Uint16 => Arc::new(Uint16Codec),
            Kind::Uint32 => Arc::new(Uint32Codec),
            Kind::Uint64 => Arc::new(Uint64Codec),
            Kind::Float32 => Arc::new(Float32Codec),
            Kind::Float64 => Arc::new(Float64Codec),
            _ => return None,
        };
        Some(codec)
    }};
}

/// The decoder of a scalar kind; `None` for every other kind.
#[must_use]
pub fn decoder(kind: Kind) -> Option<DecoderRef> { by_kind!(kind, DecoderRef) }

/// The encoder of a scalar kind; `None` for every other kind.
#[must_use]
pub fn encoder(kind: Kind) -> Option<EncoderRef> { by_kind!(kind, EncoderRef) }

/// Whether `kind` has a fixed scalar codec.
#[must_use]
pub const fn is_scalar(kind: Kind) -> bool {
    matches!(
        kind,
        Kind::Bool
            | Kind::String
            | Kind::Int
            | Kind::Int8
            | Kind::Int16
            | Kind::Int32
            | Kind::Int64
            | Kind::Uint
            | Kind::Uint8
            | Kind::Uint16
            | Kind::Uint32
            | Kind::Uint64
            | Kind::Float32
            | Kind::Float64
    )
}

#[cfg(test)]
mod test {
    use swiftjson_reflect::{Kind, Value};
    use swiftjson_stream::{Error, Reader, Writer};

    use super::{decoder, encoder};

    fn decode(kind: Kind, input: &str) -> Result<Value, Error> {
        let mut value = Value::Null;
        let mut reader = Reader::new(input.as_bytes());
        decoder(kind).unwrap().decode(&mut value, &mut reader);
        reader.error.map_or(Ok(value), Err)
    }

    fn encode(kind: Kind, value: &Value) -> String {
        let mut writer = Writer::new(true);
        encoder(kind).unwrap().encode(value, &mut writer);
        assert_eq!(writer.error, None);
        String::from_utf8(writer.into_bytes()).unwrap()
    }

    #[test]
    fn integer_widths_are_checked() {
        assert_eq!(decode(Kind::Int8, "-128"), Ok(Value::Int(-128)));
        assert!(decode(Kind::Int8, "128").is_err());
        assert_eq!(decode(Kind::Uint16, "65535"), Ok(Value::Uint(65535)));
        assert!(decode(Kind::Uint16, "65536").is_err());
        assert!(decode(Kind::Uint, "-1").is_err());
        assert!(decode(Kind::Int, "1.5").is_err());
    }

    #[test]
    fn scalars_encode() {
        assert_eq!(encode(Kind::Int32, &Value::Int(-7)), "-7");
        assert_eq!(encode(Kind::Bool, &Value::Bool(true)), "true");
        assert_eq!(encode(Kind::String, &Value::from("a<b")), r#""a\u003cb""#);
        assert_eq!(encode(Kind::Float64, &Value::Float(2.5)), "2.5");
        assert_eq!(encode(Kind::Float32, &Value::Float(0.1)), "0.1");
    }

    #[test]
    fn wrong_variant_is_reported() {
        let mut writer = Writer::new(true);
        encoder(Kind::Bool).unwrap().encode(&Value::Int(1), &mut writer);

        assert!(matches!(
            writer.error,
            Some(Error::Mismatch { operation: "Encode", .. })
        ));
    }

    #[test]
    fn emptiness() {
        let int = encoder(Kind::Int).unwrap();
        assert!(int.is_empty(&Value::Int(0)));
        assert!(!int.is_empty(&Value::Int(3)));

        let string = encoder(Kind::String).unwrap();
        assert!(string.is_empty(&Value::from("")));
        assert!(decoder(Kind::Struct).is_none());
    }
}
