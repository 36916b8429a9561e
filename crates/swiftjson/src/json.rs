//! The [`Json`] handle: one configuration and the codecs resolved under it.

use std::{
    fmt,
    sync::{Arc, Weak},
};

use dashmap::DashMap;
use fxhash::FxBuildHasher;
use swiftjson_reflect::{Dynamic, Type};
use swiftjson_stream::{Error, Reader, Writer};

use crate::{
    cache::{CodecCache, Decoding, Encoding},
    codec::{DecoderRef, EncoderRef},
    config::Config,
    shape::Shape,
};

pub(crate) struct Inner {
    pub(crate) config: Config,
    pub(crate) decoders: CodecCache<Decoding>,
    pub(crate) encoders: CodecCache<Encoding>,
    shapes: DashMap<Type, Shape, FxBuildHasher>,

    /// Handed to codecs that call back into resolution at decode or encode
    /// time. Weak so the caches do not keep themselves alive.
    pub(crate) this: Weak<Self>,
}

impl Inner {
    pub(crate) fn shape_of(&self, ty: Type) -> Shape {
        if let Some(shape) = self.shapes.get(&ty) {
            return shape.clone();
        }
        self.shapes.entry(ty).or_insert_with(|| Shape::of(ty)).clone()
    }
}

/// A frozen configuration together with its codec caches.
///
/// `Json` is cheap to clone; clones share the caches. Every type resolves
/// to at most one decoder and one encoder per instance, and repeated
/// resolution returns the same `Arc`.
///
/// # Example
///
/// ```ignore
/// use swiftjson::{Dynamic, Json, Type, Value};
///
/// let json = Json::default();
/// let mut target = Dynamic::new_pointer(Type::slice_of(Type::int()));
/// json.unmarshal("[1, 2, 3]", &mut target)?;
///
/// assert_eq!(json.marshal(&target)?, "[1,2,3]");
/// ```
#[derive(Clone)]
pub struct Json {
    inner: Arc<Inner>,
}

impl Default for Json {
    fn default() -> Self { Self::new(Config::default()) }
}

impl fmt::Debug for Json {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Json")
            .field("config", &self.inner.config)
            .field("decoders", &self.inner.decoders)
            .field("encoders", &self.inner.encoders)
            .finish_non_exhaustive()
    }
}

impl Json {
    /// Freezes `config` into a new instance with empty caches.
    #[must_use]
    pub fn new(config: Config) -> Self {
        let inner = Arc::new_cyclic(|this| Inner {
            config,
            decoders: CodecCache::new(),
            encoders: CodecCache::new(),
            shapes: DashMap::default(),
            this: this.clone(),
        });
        Self { inner }
    }

    /// The configuration this instance was built from.
    #[must_use]
    pub fn config(&self) -> &Config { &self.inner.config }

    /// The cached decoder for `ty` without resolving. May return a
    /// placeholder while the decoder is under construction.
    #[must_use]
    pub fn cached_decoder(&self, ty: Type) -> Option<DecoderRef> {
        self.inner.decoders.get(ty)
    }

    /// Installs `decoder` for `ty`, replacing any cached decoder.
    pub fn insert_decoder(&self, ty: Type, decoder: DecoderRef) {
        self.inner.decoders.insert(ty, decoder);
    }

    /// Resolves the decoder for `ty`, building and caching it on first use.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedType`] if `ty`, or a type it contains,
    /// has no JSON form. Errors from nested types carry their path. A
    /// failed resolution caches nothing.
    pub fn decoder_of(&self, ty: Type) -> Result<DecoderRef, Error> {
        self.inner.decoder_of(ty)
    }

    /// The cached encoder for `ty` without resolving. May return a
    /// placeholder while the encoder is under construction.
    #[must_use]
    pub fn cached_encoder(&self, ty: Type) -> Option<EncoderRef> {
        self.inner.encoders.get(ty)
    }

    /// Installs `encoder` for `ty`, replacing any cached encoder.
    pub fn insert_encoder(&self, ty: Type, encoder: EncoderRef) {
        self.inner.encoders.insert(ty, encoder);
    }

    /// Resolves the encoder for `ty`, building and caching it on first use.
    ///
    /// # Errors
    ///
    /// See [`decoder_of`](Self::decoder_of).
    pub fn encoder_of(&self, ty: Type) -> Result<EncoderRef, Error> {
        self.inner.encoder_of(ty)
    }

    /// The shape `ty` dispatches on.
    #[must_use]
    pub fn shape_of(&self, ty: Type) -> Shape { self.inner.shape_of(ty) }

    /// A reader over `input` honoring this configuration.
    #[must_use]
    pub fn reader<'a>(&self, input: &'a str) -> Reader<'a> {
        Reader::new(input.as_bytes())
            .with_max_depth(self.inner.config.max_depth())
    }

    /// An empty writer honoring this configuration.
    #[must_use]
    pub fn writer(&self) -> Writer {
        Writer::new(self.inner.config.escape_html())
    }

    /// Decodes the next value of `reader` into the pointee of `target`,
    /// which must hold a non-nil pointer. Failures are recorded on
    /// `reader.error`.
    pub fn decode_into(&self, reader: &mut Reader<'_>, target: &mut Dynamic) {
        self.inner.decode_into(reader, target);
    }

    /// Encodes `value` onto `writer`; `None` and nil values encode as
    /// `null`. Failures are recorded on `writer.error`.
    pub fn encode_from(&self, writer: &mut Writer, value: Option<&Dynamic>) {
        self.inner.encode_from(writer, value);
    }

    /// Encodes `value` to a JSON string.
    ///
    /// # Errors
    ///
    /// Returns the first error recorded while encoding.
    pub fn marshal(&self, value: &Dynamic) -> Result<String, Error> {
        let mut writer = self.writer();
        self.encode_from(&mut writer, Some(value));
        if let Some(error) = writer.error.take() {
            return Err(error);
        }

        String::from_utf8(writer.into_bytes()).map_err(|error| Error::Mismatch {
            operation: "Marshal",
            message: error.to_string(),
        })
    }

    /// Decodes the complete document `input` into the pointee of `target`.
    ///
    /// # Errors
    ///
    /// Returns the first error recorded while decoding, including trailing
    /// data after the document.
    pub fn unmarshal(
        &self,
        input: &str,
        target: &mut Dynamic,
    ) -> Result<(), Error> {
        let mut reader = self.reader(input);
        self.decode_into(&mut reader, target);
        reader.expect_end();
        reader.error.map_or(Ok(()), Err)
    }
}
