//! The decoder and encoder contracts and the codecs built on them.
//!
//! Codecs are stateless: everything a call mutates lives in the [`Value`]
//! cell and the [`Reader`] or [`Writer`]. One codec instance is shared by
//! every thread that resolves its type.

use std::{fmt, sync::Arc};

use swiftjson_reflect::{Dynamic, Value};
use swiftjson_stream::{Reader, Writer};

pub mod dynamic;
pub mod map;
pub mod marshal;
pub mod optional;
pub mod record;
pub mod scalar;
pub mod sequence;
pub mod special;

/// Populates a value cell from JSON input.
pub trait Decoder: Send + Sync {
    /// Decodes the next value of `reader` into `value`.
    ///
    /// Failures are recorded on `reader.error`; the cell may be partially
    /// populated afterwards.
    fn decode(&self, value: &mut Value, reader: &mut Reader<'_>);
}

impl fmt::Debug for dyn Decoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Decoder")
    }
}

/// Writes the JSON form of a value cell.
pub trait Encoder: Send + Sync {
    /// Whether `value` counts as empty for fields marked omit-empty.
    fn is_empty(&self, value: &Value) -> bool;

    /// Encodes `value` onto `writer`. Failures are recorded on
    /// `writer.error`.
    fn encode(&self, value: &Value, writer: &mut Writer);

    /// Encodes a dynamically typed value whose type resolved to this
    /// encoder.
    fn encode_dynamic(&self, value: &Dynamic, writer: &mut Writer) {
        write_dynamic(value, writer, self);
    }
}

impl fmt::Debug for dyn Encoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Encoder")
    }
}

/// Writes `null` for a nil dynamic value and otherwise encodes its cell with
/// `encoder`.
///
/// Every encoder's dynamic entry point goes through here, so a pointer-typed
/// value encodes exactly like its pointee.
pub fn write_dynamic<E: Encoder + ?Sized>(
    value: &Dynamic,
    writer: &mut Writer,
    encoder: &E,
) {
    if value.is_nil() {
        writer.write_null();
    } else {
        encoder.encode(value.value(), writer);
    }
}

/// Records that a cell does not hold the variant its encoder expects.
pub(crate) fn mismatch(writer: &mut Writer, expected: &str, found: &Value) {
    writer.report_error(
        "Encode",
        format!("expect a {expected} value, but found {found:?}"),
    );
}

type DecodeFn = dyn Fn(&mut Value, &mut Reader<'_>) + Send + Sync;
type EncodeFn = dyn Fn(&Value, &mut Writer) + Send + Sync;
type IsEmptyFn = dyn Fn(&Value) -> bool + Send + Sync;

/// A [`Decoder`] backed by a closure.
pub struct DecoderFn(Box<DecodeFn>);

impl DecoderFn {
    /// Wraps `decode`.
    pub fn new(
        decode: impl Fn(&mut Value, &mut Reader<'_>) + Send + Sync + 'static,
    ) -> Self {
        Self(Box::new(decode))
    }
}

impl fmt::Debug for DecoderFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecoderFn").finish_non_exhaustive()
    }
}

impl Decoder for DecoderFn {
    fn decode(&self, value: &mut Value, reader: &mut Reader<'_>) {
        (self.0)(value, reader);
    }
}

/// An [`Encoder`] backed by closures. Values are never empty unless an
/// emptiness check is attached.
pub struct EncoderFn {
    encode: Box<EncodeFn>,
    is_empty: Option<Box<IsEmptyFn>>,
}

impl EncoderFn {
    /// Wraps `encode`.
    pub fn new(
        encode: impl Fn(&Value, &mut Writer) + Send + Sync + 'static,
    ) -> Self {
        Self { encode: Box::new(encode), is_empty: None }
    }

    /// Attaches the omit-empty check.
    #[must_use]
    pub fn with_is_empty(
        mut self,
        is_empty: impl Fn(&Value) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.is_empty = Some(Box::new(is_empty));
        self
    }
}

impl fmt::Debug for EncoderFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncoderFn")
            .field("has_is_empty", &self.is_empty.is_some())
            .finish_non_exhaustive()
    }
}

impl Encoder for EncoderFn {
    fn is_empty(&self, value: &Value) -> bool {
        self.is_empty.as_ref().is_some_and(|is_empty| is_empty(value))
    }

    fn encode(&self, value: &Value, writer: &mut Writer) {
        (self.encode)(value, writer);
    }
}

/// Shared decoder handle as stored in the cache.
pub type DecoderRef = Arc<dyn Decoder>;

/// Shared encoder handle as stored in the cache.
pub type EncoderRef = Arc<dyn Encoder>;
