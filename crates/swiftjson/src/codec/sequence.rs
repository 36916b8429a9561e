//! Slice and fixed-size array codecs.

use std::fmt;

use swiftjson_reflect::{Type, Value};
use swiftjson_stream::{Reader, Writer};

use crate::codec::{Decoder, DecoderRef, Encoder, EncoderRef, mismatch};

fn write_elems(encoder: &dyn Encoder, elems: &[Value], writer: &mut Writer) {
    writer.write_array_start();
    for (i, elem) in elems.iter().enumerate() {
        if i > 0 {
            writer.write_more();
        }
        encoder.encode(elem, writer);
    }
    writer.write_array_end();
}

/// Decodes a JSON array into a slice, reusing existing elements in place.
pub struct SliceDecoder {
    elem: Type,
    decoder: DecoderRef,
}

impl SliceDecoder {
    pub(crate) fn new(elem: Type, decoder: DecoderRef) -> Self {
        Self { elem, decoder }
    }
}

impl fmt::Debug for SliceDecoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SliceDecoder")
            .field("elem", &self.elem)
            .finish_non_exhaustive()
    }
}

impl Decoder for SliceDecoder {
    fn decode(&self, value: &mut Value, reader: &mut Reader<'_>) {
        if reader.read_null() {
            *value = Value::Slice(None);
            return;
        }
        if reader.error.is_some() {
            return;
        }

        let mut elems = match std::mem::replace(value, Value::Slice(None)) {
            Value::Slice(Some(elems)) => elems,
            _ => Vec::new(),
        };
        let mut len = 0;
        reader.read_array(|reader| {
            if let Some(existing) = elems.get_mut(len) {
                self.decoder.decode(existing, reader);
            } else {
                let mut elem = self.elem.zero_value();
                self.decoder.decode(&mut elem, reader);
                elems.push(elem);
            }
            len += 1;
            true
        });
        elems.truncate(len);
        *value = Value::Slice(Some(elems));
    }
}

/// Encodes a slice as a JSON array; the nil slice is `null`.
pub struct SliceEncoder {
    encoder: EncoderRef,
}

impl SliceEncoder {
    pub(crate) fn new(encoder: EncoderRef) -> Self { Self { encoder } }
}

impl fmt::Debug for SliceEncoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SliceEncoder").finish_non_exhaustive()
    }
}

impl Encoder for SliceEncoder {
    fn is_empty(&self, value: &Value) -> bool {
        match value {
            Value::Slice(Some(elems)) => elems.is_empty(),
            _ => true,
        }
    }

    fn encode(&self, value: &Value, writer: &mut Writer) {
        match value {
            Value::Slice(Some(elems)) => {
                write_elems(self.encoder.as_ref(), elems, writer);
            }
            Value::Slice(None) => writer.write_null(),
            other => mismatch(writer, "slice", other),
        }
    }
}

/// Decodes a JSON array into a fixed-size array: surplus elements are
/// skipped and missing ones reset to zero.
pub struct ArrayDecoder {
    ty: Type,
    elem: Type,
    decoder: DecoderRef,
}

impl ArrayDecoder {
    pub(crate) fn new(ty: Type, elem: Type, decoder: DecoderRef) -> Self {
        Self { ty, elem, decoder }
    }
}

impl fmt::Debug for ArrayDecoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArrayDecoder")
            .field("ty", &self.ty)
            .finish_non_exhaustive()
    }
}

impl Decoder for ArrayDecoder {
    fn decode(&self, value: &mut Value, reader: &mut Reader<'_>) {
        if reader.read_null() || reader.error.is_some() {
            return;
        }

        if !matches!(value, Value::Array(elems) if elems.len() == self.ty.len())
        {
            *value = self.ty.zero_value();
        }
        let Value::Array(elems) = value else { return };

        let mut len = 0;
        reader.read_array(|reader| {
            match elems.get_mut(len) {
                Some(elem) => self.decoder.decode(elem, reader),
                None => reader.skip(),
            }
            len += 1;
            true
        });
        for elem in elems.iter_mut().skip(len) {
            *elem = self.elem.zero_value();
        }
    }
}

/// Encodes a fixed-size array as a JSON array.
pub struct ArrayEncoder {
    encoder: EncoderRef,
}

impl ArrayEncoder {
    pub(crate) fn new(encoder: EncoderRef) -> Self { Self { encoder } }
}

impl fmt::Debug for ArrayEncoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArrayEncoder").finish_non_exhaustive()
    }
}

impl Encoder for ArrayEncoder {
    fn is_empty(&self, value: &Value) -> bool {
        matches!(value, Value::Array(elems) if elems.is_empty())
    }

    fn encode(&self, value: &Value, writer: &mut Writer) {
        match value {
            Value::Array(elems) => {
                write_elems(self.encoder.as_ref(), elems, writer);
            }
            other => mismatch(writer, "array", other),
        }
    }
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use swiftjson_reflect::{Type, Value};
    use swiftjson_stream::{Reader, Writer};

    use super::{ArrayDecoder, SliceDecoder, SliceEncoder};
    use crate::codec::{Decoder, Encoder, scalar::IntCodec};

    fn decode(decoder: &dyn Decoder, value: &mut Value, input: &str) {
        let mut reader = Reader::new(input.as_bytes());
        decoder.decode(value, &mut reader);
        assert_eq!(reader.error, None);
    }

    #[test]
    fn slices_shrink_and_grow() {
        let decoder = SliceDecoder::new(Type::int(), Arc::new(IntCodec));
        let mut value = Value::slice(vec![Value::Int(9); 4]);

        decode(&decoder, &mut value, "[1, 2]");
        assert_eq!(value, Value::slice(vec![Value::Int(1), Value::Int(2)]));

        decode(&decoder, &mut value, "[1, 2, 3]");
        assert_eq!(value, Value::slice((1..=3).map(Value::Int).collect()));

        decode(&decoder, &mut value, "[]");
        assert_eq!(value, Value::slice(Vec::new()));

        decode(&decoder, &mut value, "null");
        assert_eq!(value, Value::Slice(None));
    }

    #[test]
    fn arrays_have_fixed_length() {
        let ty = Type::array_of(Type::int(), 3);
        let decoder = ArrayDecoder::new(ty, Type::int(), Arc::new(IntCodec));
        let mut value = Value::Array(vec![Value::Int(7); 3]);

        decode(&decoder, &mut value, "[1, 2, 3, 4]");
        assert_eq!(value, Value::Array((1..=3).map(Value::Int).collect()));

        decode(&decoder, &mut value, "[5]");
        assert_eq!(
            value,
            Value::Array(vec![Value::Int(5), Value::Int(0), Value::Int(0)])
        );

        decode(&decoder, &mut value, "null");
        assert_eq!(
            value,
            Value::Array(vec![Value::Int(5), Value::Int(0), Value::Int(0)])
        );
    }

    #[test]
    fn slice_encoding() {
        let encoder = SliceEncoder::new(Arc::new(IntCodec));
        let mut writer = Writer::new(true);
        let ints = Value::slice(vec![Value::Int(1), Value::Int(2)]);
        encoder.encode(&ints, &mut writer);
        writer.write_more();
        encoder.encode(&Value::Slice(None), &mut writer);

        assert_eq!(writer.buffer(), b"[1,2],null");
        assert!(encoder.is_empty(&Value::slice(Vec::new())));
    }
}
