//! Interface codecs. Both defer to the configuration's bridge for the
//! concrete type held at runtime.

use std::sync::Weak;

use swiftjson_reflect::{Dynamic, MapKey, MapValue, Type, Value};
use swiftjson_stream::{Error, Reader, Token, Writer};

use crate::{
    codec::{Decoder, Encoder, mismatch},
    json::Inner,
};

fn dropped(operation: &'static str) -> Error {
    Error::Mismatch {
        operation,
        message: "the configuration owning this codec was dropped".to_owned(),
    }
}

fn encode_interface(json: &Weak<Inner>, value: &Value, writer: &mut Writer) {
    match value {
        Value::Interface(None) => writer.write_null(),
        Value::Interface(Some(held)) => match json.upgrade() {
            Some(json) => json.encode_from(writer, Some(held)),
            None => writer.set_error(dropped("WriteInterface")),
        },
        other => mismatch(writer, "interface", other),
    }
}

fn decode_held(
    json: &Weak<Inner>,
    held: &mut Dynamic,
    reader: &mut Reader<'_>,
) {
    match json.upgrade() {
        Some(json) => json.decode_into(reader, held),
        None => reader.set_error(dropped("ReadInterface")),
    }
}

/// Reads the next value as its natural dynamic form: `bool`, `float64` (or
/// `json.Number`), `string`, `[]interface {}` or `map[string]interface {}`.
/// `null` reads as `None`.
pub(crate) fn read_natural(
    reader: &mut Reader<'_>,
    use_number: bool,
) -> Option<Dynamic> {
    let natural = match reader.what_is_next() {
        Token::Null | Token::Invalid => {
            // an invalid token is reported by `skip`
            reader.skip();
            return None;
        }
        Token::Bool => {
            Dynamic::new(Type::bool(), Value::Bool(reader.read_bool()))
        }
        Token::Number if use_number => Dynamic::new(
            Type::json_number(),
            Value::Number(reader.read_number_text().to_owned()),
        ),
        Token::Number => {
            Dynamic::new(Type::float64(), Value::Float(reader.read_f64()))
        }
        Token::String => {
            Dynamic::new(Type::string(), Value::String(reader.read_string()))
        }
        Token::Array => {
            let mut elems = Vec::new();
            reader.read_array(|reader| {
                let elem = read_natural(reader, use_number);
                elems.push(Value::Interface(elem.map(Box::new)));
                true
            });
            Dynamic::new(
                Type::slice_of(Type::empty_interface()),
                Value::slice(elems),
            )
        }
        Token::Object => {
            let mut map = MapValue::default();
            reader.read_object(|reader, key| {
                let elem = read_natural(reader, use_number);
                map.insert(
                    MapKey::String(key),
                    Value::Interface(elem.map(Box::new)),
                );
                true
            });
            Dynamic::new(
                Type::map_of(Type::string(), Type::empty_interface()),
                Value::Map(Some(map)),
            )
        }
    };
    Some(natural)
}

/// `interface {}`.
///
/// Decoding into an interface already holding a non-nil pointer decodes
/// through that pointer; otherwise the natural dynamic form replaces the
/// held value.
#[derive(Debug)]
pub struct DynamicCodec {
    json: Weak<Inner>,
    use_number: bool,
}

impl DynamicCodec {
    pub(crate) const fn new(json: Weak<Inner>, use_number: bool) -> Self {
        Self { json, use_number }
    }
}

impl Decoder for DynamicCodec {
    fn decode(&self, value: &mut Value, reader: &mut Reader<'_>) {
        if let Value::Interface(Some(held)) = value
            && held.pointee().is_some()
        {
            decode_held(&self.json, held, reader);
            return;
        }

        let natural = read_natural(reader, self.use_number);
        if reader.error.is_none() {
            *value = Value::Interface(natural.map(Box::new));
        }
    }
}

impl Encoder for DynamicCodec {
    fn is_empty(&self, value: &Value) -> bool { value.is_nil() }

    fn encode(&self, value: &Value, writer: &mut Writer) {
        encode_interface(&self.json, value, writer);
    }
}

/// An interface with required methods. Decoding needs a concrete value to
/// already be held, since the JSON alone cannot name a type satisfying the
/// interface.
#[derive(Debug)]
pub struct ConstrainedDynamicCodec {
    json: Weak<Inner>,
}

impl ConstrainedDynamicCodec {
    pub(crate) const fn new(json: Weak<Inner>) -> Self { Self { json } }
}

impl Decoder for ConstrainedDynamicCodec {
    fn decode(&self, value: &mut Value, reader: &mut Reader<'_>) {
        match value {
            Value::Interface(Some(held)) => {
                decode_held(&self.json, held, reader);
            }
            _ => reader.report_error(
                "ReadInterface",
                "do not know which concrete type to decode to",
            ),
        }
    }
}

impl Encoder for ConstrainedDynamicCodec {
    fn is_empty(&self, value: &Value) -> bool { value.is_nil() }

    fn encode(&self, value: &Value, writer: &mut Writer) {
        encode_interface(&self.json, value, writer);
    }
}
