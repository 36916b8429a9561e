//! Codecs for values that may be nil.
//!
//! Pointer mode handles `*T` cells, which own their pointee in a box. In
//! place mode guards a cell that is itself nullable, like a slice-backed
//! type with its own conversion hooks: nil maps to `null` without reaching
//! the inner codec.

use swiftjson_reflect::{Type, Value};
use swiftjson_stream::{Reader, Writer};

use crate::codec::{Decoder, DecoderRef, Encoder, EncoderRef, mismatch};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Pointer,
    InPlace,
}

/// Decodes `null` to nil and everything else through the inner decoder.
pub struct OptionalDecoder {
    mode: Mode,
    /// The pointee type in pointer mode, the cell type in place.
    ty: Type,
    decoder: DecoderRef,
}

impl OptionalDecoder {
    /// Decodes through a `*elem` cell.
    pub(crate) fn pointer(elem: Type, decoder: DecoderRef) -> Self {
        Self { mode: Mode::Pointer, ty: elem, decoder }
    }

    /// Decodes directly into a nullable cell of type `ty`.
    pub(crate) fn in_place(ty: Type, decoder: DecoderRef) -> Self {
        Self { mode: Mode::InPlace, ty, decoder }
    }
}

impl std::fmt::Debug for OptionalDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OptionalDecoder")
            .field("mode", &self.mode)
            .field("ty", &self.ty)
            .finish_non_exhaustive()
    }
}

impl Decoder for OptionalDecoder {
    fn decode(&self, value: &mut Value, reader: &mut Reader<'_>) {
        if reader.read_null() {
            *value = match self.mode {
                Mode::Pointer => Value::Pointer(None),
                Mode::InPlace => self.ty.zero_value(),
            };
            return;
        }
        if reader.error.is_some() {
            return;
        }

        match (self.mode, value) {
            (Mode::InPlace, value) => self.decoder.decode(value, reader),

            // reuse the existing pointee so its address survives
            (Mode::Pointer, Value::Pointer(Some(pointee))) => {
                self.decoder.decode(pointee, reader);
            }

            (Mode::Pointer, value) => {
                let mut pointee = Box::new(self.ty.zero_value());
                self.decoder.decode(&mut pointee, reader);
                *value = Value::Pointer(Some(pointee));
            }
        }
    }
}

/// Encodes nil as `null` and everything else through the inner encoder.
pub struct OptionalEncoder {
    mode: Mode,
    encoder: EncoderRef,
}

impl OptionalEncoder {
    /// Encodes the pointee of a `*T` cell.
    pub(crate) fn pointer(encoder: EncoderRef) -> Self {
        Self { mode: Mode::Pointer, encoder }
    }

    /// Encodes a nullable cell directly.
    pub(crate) fn in_place(encoder: EncoderRef) -> Self {
        Self { mode: Mode::InPlace, encoder }
    }
}

impl std::fmt::Debug for OptionalEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OptionalEncoder")
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

impl Encoder for OptionalEncoder {
    fn is_empty(&self, value: &Value) -> bool {
        match (self.mode, value) {
            (Mode::Pointer, Value::Pointer(Some(pointee))) => {
                self.encoder.is_empty(pointee)
            }
            (_, value) if value.is_nil() => true,
            (Mode::Pointer, _) => false,
            (Mode::InPlace, value) => self.encoder.is_empty(value),
        }
    }

    fn encode(&self, value: &Value, writer: &mut Writer) {
        match (self.mode, value) {
            (_, value) if value.is_nil() => writer.write_null(),
            (Mode::Pointer, Value::Pointer(Some(pointee))) => {
                self.encoder.encode(pointee, writer);
            }
            (Mode::Pointer, other) => mismatch(writer, "pointer", other),
            (Mode::InPlace, value) => self.encoder.encode(value, writer),
        }
    }
}
