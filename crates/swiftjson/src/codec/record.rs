//! Record codecs: one JSON object member per field, in declaration order.

use std::fmt;

use swiftjson_reflect::{Type, Value};
use swiftjson_stream::{Reader, Writer};

use crate::codec::{Decoder, DecoderRef, Encoder, EncoderRef, mismatch};

/// Decodes a JSON object into a record.
///
/// Keys match a field name exactly, or failing that ASCII
/// case-insensitively; unknown keys are skipped. `null` leaves the record
/// untouched.
pub struct RecordDecoder {
    ty: Type,
    fields: Box<[(&'static str, DecoderRef)]>,
}

impl RecordDecoder {
    pub(crate) fn new(
        ty: Type,
        fields: impl IntoIterator<Item = (&'static str, DecoderRef)>,
    ) -> Self {
        Self { ty, fields: fields.into_iter().collect() }
    }

    fn field_index(&self, key: &str) -> Option<usize> {
        self.fields.iter().position(|(name, _)| *name == key).or_else(|| {
            self.fields
                .iter()
                .position(|(name, _)| name.eq_ignore_ascii_case(key))
        })
    }
}

impl fmt::Debug for RecordDecoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordDecoder")
            .field("ty", &self.ty)
            .field(
                "fields",
                &self.fields.iter().map(|(name, _)| name).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl Decoder for RecordDecoder {
    fn decode(&self, value: &mut Value, reader: &mut Reader<'_>) {
        if reader.read_null() || reader.error.is_some() {
            return;
        }

        if !matches!(value, Value::Record(v) if v.len() == self.fields.len()) {
            *value = self.ty.zero_value();
        }
        let Value::Record(values) = value else { return };

        reader.read_object(|reader, key| {
            match self.field_index(&key) {
                Some(index) => {
                    self.fields[index].1.decode(&mut values[index], reader);
                }
                None => reader.skip(),
            }
            true
        });
    }
}

struct FieldEncoder {
    name: &'static str,
    omit_empty: bool,
    encoder: EncoderRef,
}

/// Encodes a record as a JSON object, dropping empty omit-empty fields.
pub struct RecordEncoder {
    ty: Type,
    fields: Box<[FieldEncoder]>,
}

impl RecordEncoder {
    pub(crate) fn new(
        ty: Type,
        fields: impl IntoIterator<Item = (&'static str, bool, EncoderRef)>,
    ) -> Self {
        let fields = fields
            .into_iter()
            .map(|(name, omit_empty, encoder)| FieldEncoder {
                name,
                omit_empty,
                encoder,
            })
            .collect();
        Self { ty, fields }
    }
}

impl fmt::Debug for RecordEncoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordEncoder")
            .field("ty", &self.ty)
            .field(
                "fields",
                &self.fields.iter().map(|field| field.name).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl Encoder for RecordEncoder {
    fn is_empty(&self, _: &Value) -> bool { false }

    fn encode(&self, value: &Value, writer: &mut Writer) {
        let Value::Record(values) = value else {
            return mismatch(writer, self.ty.name(), value);
        };

        writer.write_object_start();
        let mut first = true;
        for (field, value) in self.fields.iter().zip(values) {
            if field.omit_empty && field.encoder.is_empty(value) {
                continue;
            }
            if !std::mem::take(&mut first) {
                writer.write_more();
            }
            writer.write_object_field(field.name);
            field.encoder.encode(value, writer);
        }
        writer.write_object_end();
    }
}
