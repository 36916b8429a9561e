//! Map codecs. Object keys are decoded from their text according to the
//! map's key kind.

use std::fmt;

use swiftjson_reflect::{Kind, MapKey, MapValue, Type, Value};
use swiftjson_stream::{Error, Reader, Writer};

use crate::codec::{Decoder, DecoderRef, Encoder, EncoderRef, mismatch};

/// How keys of one map type convert to and from object key text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum KeyKind {
    String,
    Signed { min: i64, max: i64 },
    Unsigned { max: u64 },
}

impl KeyKind {
    /// The key conversion for `map_ty`, or an error for key kinds that have
    /// no textual form.
    pub(crate) fn of(map_ty: Type) -> Result<Self, Error> {
        let unsupported = || Error::UnsupportedType(map_ty.name().to_owned());
        let key = map_ty.key().ok_or_else(unsupported)?;

        Ok(match key.kind() {
            Kind::String => Self::String,
            Kind::Int | Kind::Int64 => {
                Self::Signed { min: i64::MIN, max: i64::MAX }
            }
            Kind::Int8 => {
                Self::Signed { min: i8::MIN.into(), max: i8::MAX.into() }
            }
            Kind::Int16 => {
                Self::Signed { min: i16::MIN.into(), max: i16::MAX.into() }
            }
            Kind::Int32 => {
                Self::Signed { min: i32::MIN.into(), max: i32::MAX.into() }
            }
            Kind::Uint | Kind::Uint64 => Self::Unsigned { max: u64::MAX },
            Kind::Uint8 => Self::Unsigned { max: u8::MAX.into() },
            Kind::Uint16 => Self::Unsigned { max: u16::MAX.into() },
            Kind::Uint32 => Self::Unsigned { max: u32::MAX.into() },
            _ => return Err(unsupported()),
        })
    }

    fn decode(self, text: String, reader: &mut Reader<'_>) -> Option<MapKey> {
        let key = match self {
            Self::String => return Some(MapKey::String(text)),
            Self::Signed { min, max } => text
                .parse::<i64>()
                .ok()
                .filter(|n| (min..=max).contains(n))
                .map(MapKey::Int),
            Self::Unsigned { max } => text
                .parse::<u64>()
                .ok()
                .filter(|n| *n <= max)
                .map(MapKey::Uint),
        };
        if key.is_none() {
            reader.report_error(
                "ReadMapKey",
                format!("{text:?} is not a valid key"),
            );
        }
        key
    }
}

/// Decodes a JSON object into a map, inserting into the existing map when
/// there is one.
pub struct MapDecoder {
    key: KeyKind,
    elem: Type,
    decoder: DecoderRef,
}

impl MapDecoder {
    pub(crate) fn new(key: KeyKind, elem: Type, decoder: DecoderRef) -> Self {
        Self { key, elem, decoder }
    }
}

impl fmt::Debug for MapDecoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapDecoder")
            .field("key", &self.key)
            .field("elem", &self.elem)
            .finish_non_exhaustive()
    }
}

impl Decoder for MapDecoder {
    fn decode(&self, value: &mut Value, reader: &mut Reader<'_>) {
        if reader.read_null() {
            *value = Value::Map(None);
            return;
        }
        if reader.error.is_some() {
            return;
        }

        if !matches!(value, Value::Map(Some(_))) {
            *value = Value::Map(Some(MapValue::default()));
        }
        let Value::Map(Some(map)) = value else { return };

        reader.read_object(|reader, text| {
            let Some(key) = self.key.decode(text, reader) else {
                return false;
            };
            let mut elem = self.elem.zero_value();
            self.decoder.decode(&mut elem, reader);
            map.insert(key, elem);
            true
        });
    }
}

/// Encodes a map as a JSON object, optionally ordered by key text.
pub struct MapEncoder {
    encoder: EncoderRef,
    sort_keys: bool,
}

impl MapEncoder {
    pub(crate) fn new(encoder: EncoderRef, sort_keys: bool) -> Self {
        Self { encoder, sort_keys }
    }

    fn write_entry(
        &self,
        first: &mut bool,
        key: &str,
        elem: &Value,
        writer: &mut Writer,
    ) {
        if !std::mem::take(first) {
            writer.write_more();
        }
        writer.write_object_field(key);
        self.encoder.encode(elem, writer);
    }
}

impl fmt::Debug for MapEncoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapEncoder")
            .field("sort_keys", &self.sort_keys)
            .finish_non_exhaustive()
    }
}

impl Encoder for MapEncoder {
    fn is_empty(&self, value: &Value) -> bool {
        match value {
            Value::Map(Some(map)) => map.is_empty(),
            _ => true,
        }
    }

    fn encode(&self, value: &Value, writer: &mut Writer) {
        let map = match value {
            Value::Map(Some(map)) => map,
            Value::Map(None) => return writer.write_null(),
            other => return mismatch(writer, "map", other),
        };

        let mut first = true;
        writer.write_object_start();
        if self.sort_keys {
            let mut entries = map
                .iter()
                .map(|(key, elem)| (key.to_string(), elem))
                .collect::<Vec<_>>();
            entries.sort_unstable_by(|a, b| a.0.cmp(&b.0));
            for (key, elem) in entries {
                self.write_entry(&mut first, &key, elem, writer);
            }
        } else {
            for (key, elem) in map {
                self.write_entry(&mut first, &key.to_string(), elem, writer);
            }
        }
        writer.write_object_end();
    }
}
