//! Pluggable resolution behavior.
//!
//! Extensions are registered on a [`Config`](crate::Config) and consulted in
//! registration order. During resolution of a type:
//!
//! 1. The first extension returning `Some` from
//!    [`direct_decoder`](Extension::direct_decoder) /
//!    [`direct_encoder`](Extension::direct_encoder) supplies the codec
//!    outright; structural dispatch is skipped.
//! 2. Otherwise the codec is built from the type's shape and every
//!    extension's `decorate_*` hook is applied to it, in order.
//!
//! Codecs supplied directly are not decorated.

use std::{fmt, sync::Arc};

use fxhash::FxHashMap;
use swiftjson_reflect::{Type, Value};
use swiftjson_stream::{Reader, Writer};

use crate::codec::{DecoderFn, DecoderRef, EncoderFn, EncoderRef};

/// A hook into codec resolution. Every method defaults to passing through.
pub trait Extension: Send + Sync + 'static {
    /// Supplies the decoder for `ty`, bypassing structural dispatch.
    fn direct_decoder(&self, ty: Type) -> Option<DecoderRef> {
        let _ = ty;
        None
    }

    /// Supplies the encoder for `ty`, bypassing structural dispatch.
    fn direct_encoder(&self, ty: Type) -> Option<EncoderRef> {
        let _ = ty;
        None
    }

    /// Wraps or replaces a freshly built decoder for `ty`.
    fn decorate_decoder(&self, ty: Type, decoder: DecoderRef) -> DecoderRef {
        let _ = ty;
        decoder
    }

    /// Wraps or replaces a freshly built encoder for `ty`.
    fn decorate_encoder(&self, ty: Type, encoder: EncoderRef) -> EncoderRef {
        let _ = ty;
        encoder
    }
}

/// Per-type codecs supplied through the extension contract.
///
/// ```ignore
/// let codecs = TypeCodecs::new()
///     .decode_with(Type::string(), |value, reader| {
///         *value = Value::String(reader.read_string().to_uppercase());
///     });
/// let json = Config::default().with_extension(codecs).build();
/// ```
#[derive(Default)]
pub struct TypeCodecs {
    decoders: FxHashMap<Type, DecoderRef>,
    encoders: FxHashMap<Type, EncoderRef>,
}

impl TypeCodecs {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Uses `decoder` for `ty`.
    #[must_use]
    pub fn decoder(mut self, ty: Type, decoder: DecoderRef) -> Self {
        self.decoders.insert(ty, decoder);
        self
    }

    /// Uses `encoder` for `ty`.
    #[must_use]
    pub fn encoder(mut self, ty: Type, encoder: EncoderRef) -> Self {
        self.encoders.insert(ty, encoder);
        self
    }

    /// Decodes `ty` with a closure.
    #[must_use]
    pub fn decode_with(
        self,
        ty: Type,
        decode: impl Fn(&mut Value, &mut Reader<'_>) + Send + Sync + 'static,
    ) -> Self {
        self.decoder(ty, Arc::new(DecoderFn::new(decode)))
    }

    /// Encodes `ty` with a closure.
    #[must_use]
    pub fn encode_with(
        self,
        ty: Type,
        encode: impl Fn(&Value, &mut Writer) + Send + Sync + 'static,
    ) -> Self {
        self.encoder(ty, Arc::new(EncoderFn::new(encode)))
    }
}

impl fmt::Debug for TypeCodecs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeCodecs")
            .field("decoders", &self.decoders.keys().collect::<Vec<_>>())
            .field("encoders", &self.encoders.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Extension for TypeCodecs {
    fn direct_decoder(&self, ty: Type) -> Option<DecoderRef> {
        self.decoders.get(&ty).cloned()
    }

    fn direct_encoder(&self, ty: Type) -> Option<EncoderRef> {
        self.encoders.get(&ty).cloned()
    }
}
