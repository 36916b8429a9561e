//! Codecs selected by marker ahead of the structural kind.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use swiftjson_reflect::Value;
use swiftjson_stream::{Reader, Token, Writer};

use crate::codec::{Decoder, Encoder, mismatch};

/// `[]uint8` as standard base64 text.
///
/// `null` decodes to an empty buffer: a byte cell has no nil state.
#[derive(Debug, Clone, Copy, Default)]
pub struct Base64Codec;

impl Decoder for Base64Codec {
    fn decode(&self, value: &mut Value, reader: &mut Reader<'_>) {
        if reader.read_null() {
            *value = Value::Bytes(Vec::new());
            return;
        }
        let text = reader.read_string();
        if reader.error.is_some() {
            return;
        }
        match STANDARD.decode(text) {
            Ok(bytes) => *value = Value::Bytes(bytes),
            Err(error) => reader.report_error("ReadBase64", error.to_string()),
        }
    }
}

impl Encoder for Base64Codec {
    fn is_empty(&self, value: &Value) -> bool {
        matches!(value, Value::Bytes(bytes) if bytes.is_empty())
    }

    fn encode(&self, value: &Value, writer: &mut Writer) {
        match value {
            Value::Bytes(bytes) => writer.write_string(&STANDARD.encode(bytes)),
            other => mismatch(writer, "[]uint8", other),
        }
    }
}

/// Both raw JSON message types: the exact input text is kept and written
/// back verbatim.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawMessageCodec;

impl Decoder for RawMessageCodec {
    fn decode(&self, value: &mut Value, reader: &mut Reader<'_>) {
        let raw = reader.read_raw();
        if reader.error.is_none() {
            *value = Value::Bytes(raw.to_vec());
        }
    }
}

impl Encoder for RawMessageCodec {
    fn is_empty(&self, value: &Value) -> bool {
        matches!(value, Value::Bytes(raw) if raw.is_empty())
    }

    fn encode(&self, value: &Value, writer: &mut Writer) {
        match value {
            Value::Bytes(raw) if raw.is_empty() => writer.write_null(),
            Value::Bytes(raw) => writer.write_raw(raw),
            other => mismatch(writer, "raw message", other),
        }
    }
}

/// `json.Number`: the literal text of a number, never parsed.
#[derive(Debug, Clone, Copy, Default)]
pub struct NumberCodec;

impl Decoder for NumberCodec {
    fn decode(&self, value: &mut Value, reader: &mut Reader<'_>) {
        let text = match reader.what_is_next() {
            Token::Null => {
                reader.read_null();
                String::new()
            }
            Token::String => reader.read_string(),
            _ => reader.read_number_text().to_owned(),
        };
        if reader.error.is_none() {
            *value = Value::Number(text);
        }
    }
}

impl Encoder for NumberCodec {
    fn is_empty(&self, value: &Value) -> bool {
        matches!(value, Value::Number(text) if text.is_empty())
    }

    fn encode(&self, value: &Value, writer: &mut Writer) {
        match value {
            Value::Number(text) if text.is_empty() => writer.write_raw(b"0"),
            Value::Number(text) => writer.write_raw(text.as_bytes()),
            other => mismatch(writer, "json.Number", other),
        }
    }
}

/// `Any`: the JSON node is parsed whole and inspected at runtime.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnyCodec;

impl Decoder for AnyCodec {
    fn decode(&self, value: &mut Value, reader: &mut Reader<'_>) {
        let raw = reader.read_raw();
        if reader.error.is_some() {
            return;
        }
        match serde_json::from_slice(raw) {
            Ok(node) => *value = Value::Any(node),
            Err(error) => reader.report_error("ReadAny", error.to_string()),
        }
    }
}

impl Encoder for AnyCodec {
    fn is_empty(&self, value: &Value) -> bool {
        matches!(value, Value::Any(serde_json::Value::Null))
    }

    fn encode(&self, value: &Value, writer: &mut Writer) {
        match value {
            Value::Any(node) => match serde_json::to_vec(node) {
                Ok(json) => writer.write_raw(&json),
                Err(error) => {
                    writer.report_error("WriteAny", error.to_string());
                }
            },
            other => mismatch(writer, "Any", other),
        }
    }
}
