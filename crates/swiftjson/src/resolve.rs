//! Codec resolution: cache lookup, extension short-circuit, placeholder
//! installation, shape dispatch and decoration.

use std::sync::Arc;

use swiftjson_reflect::{Kind, Type};
use swiftjson_stream::Error;
use tracing::debug;

use crate::{
    cache::{Attempt, Claim, CodecKind, Decoding, Encoding},
    codec::{
        DecoderRef, EncoderRef,
        dynamic::{ConstrainedDynamicCodec, DynamicCodec},
        map::{KeyKind, MapDecoder, MapEncoder},
        marshal::{MarshalerEncoder, UnmarshalerDecoder},
        optional::{OptionalDecoder, OptionalEncoder},
        record::{RecordDecoder, RecordEncoder},
        scalar,
        sequence::{ArrayDecoder, ArrayEncoder, SliceDecoder, SliceEncoder},
        special::{AnyCodec, Base64Codec, NumberCodec, RawMessageCodec},
    },
    json::Inner,
    shape::Shape,
};

fn unsupported(ty: Type) -> Error {
    Error::UnsupportedType(ty.name().to_owned())
}

fn elem_of(ty: Type) -> Result<Type, Error> {
    ty.elem().ok_or_else(|| unsupported(ty))
}

impl Inner {
    pub(crate) fn decoder_of(&self, ty: Type) -> Result<DecoderRef, Error> {
        self.resolve::<Decoding>(ty)
    }

    pub(crate) fn encoder_of(&self, ty: Type) -> Result<EncoderRef, Error> {
        self.resolve::<Encoding>(ty)
    }

    fn resolve<K: CodecKind>(&self, ty: Type) -> Result<Arc<K::Codec>, Error> {
        let mut attempt = Attempt::<K>::default();
        let result = self.resolve_within(ty, &mut attempt);
        if result.is_err() {
            let retracted = attempt.roll_back(K::cache(self));
            if retracted > 0 {
                debug!(%ty, kind = K::NAME, retracted, "dependents retracted");
            }
        }
        result
    }

    fn resolve_within<K: CodecKind>(
        &self,
        ty: Type,
        attempt: &mut Attempt<K>,
    ) -> Result<Arc<K::Codec>, Error> {
        let cache = K::cache(self);
        if let Some(codec) = cache.get(ty) {
            attempt.reference(ty);
            return Ok(codec);
        }

        let extensions = self.config.extensions();
        if let Some(codec) = extensions
            .iter()
            .find_map(|extension| K::direct(extension.as_ref(), ty))
        {
            debug!(%ty, kind = K::NAME, "codec supplied by extension");
            return Ok(cache.insert_if_absent(ty, codec));
        }

        let latch = match cache.claim(ty, self.config.placeholder_timeout()) {
            Claim::Taken(codec) => {
                attempt.reference(ty);
                return Ok(codec);
            }
            Claim::Build(latch) => latch,
        };

        attempt.enter(ty);
        let shape = self.shape_of(ty);
        let created = K::create(self, ty, &shape, attempt);
        let provisional = attempt.leave();

        match created {
            Ok(codec) => {
                let codec = extensions.iter().fold(codec, |codec, extension| {
                    K::decorate(extension.as_ref(), ty, codec)
                });
                cache.insert(ty, codec.clone());
                latch.finish();
                if provisional {
                    attempt.provisional(ty, codec.clone());
                }

                debug!(%ty, kind = K::NAME, ?shape, "codec built");
                Ok(codec)
            }
            Err(error) => {
                cache.abandon(ty, &latch);
                latch.fail(error.clone());

                debug!(
                    %ty,
                    kind = K::NAME,
                    %error,
                    "codec construction failed"
                );
                Err(error)
            }
        }
    }

    pub(crate) fn create_decoder(
        &self,
        ty: Type,
        shape: &Shape,
        attempt: &mut Attempt<Decoding>,
    ) -> Result<DecoderRef, Error> {
        let decoder: DecoderRef = match shape {
            Shape::Bytes => Arc::new(Base64Codec),
            Shape::RawJson => Arc::new(RawMessageCodec),
            Shape::Number => Arc::new(NumberCodec),
            Shape::Custom { fallback } => {
                let Some(unmarshaler) = ty.unmarshaler() else {
                    return self.create_decoder(ty, fallback, attempt);
                };
                let mut decoder: DecoderRef =
                    Arc::new(UnmarshalerDecoder::new(ty, unmarshaler.clone()));
                if ty.kind() != Kind::Struct {
                    decoder = Arc::new(OptionalDecoder::in_place(ty, decoder));
                }
                decoder
            }
            Shape::Any => Arc::new(AnyCodec),
            Shape::Scalar(kind) => {
                scalar::decoder(*kind).ok_or_else(|| unsupported(ty))?
            }
            Shape::Dynamic => Arc::new(DynamicCodec::new(
                self.this.clone(),
                self.config.use_number(),
            )),
            Shape::ConstrainedDynamic => {
                Arc::new(ConstrainedDynamicCodec::new(self.this.clone()))
            }
            Shape::Record => self
                .record_decoder(ty, attempt)
                .map_err(|error| error.nested(format!("[{ty}]")))?,
            Shape::Array => self
                .array_decoder(ty, attempt)
                .map_err(|error| error.nested("[array]"))?,
            Shape::Slice => self
                .slice_decoder(ty, attempt)
                .map_err(|error| error.nested("[slice]"))?,
            Shape::Map => self
                .map_decoder(ty, attempt)
                .map_err(|error| error.nested("[map]"))?,
            Shape::Optional => self
                .optional_decoder(ty, attempt)
                .map_err(|error| error.nested("[optional]"))?,
            Shape::Unsupported => return Err(unsupported(ty)),
        };
        Ok(decoder)
    }

    pub(crate) fn create_encoder(
        &self,
        ty: Type,
        shape: &Shape,
        attempt: &mut Attempt<Encoding>,
    ) -> Result<EncoderRef, Error> {
        let encoder: EncoderRef = match shape {
            Shape::Bytes => Arc::new(Base64Codec),
            Shape::RawJson => Arc::new(RawMessageCodec),
            Shape::Number => Arc::new(NumberCodec),
            Shape::Custom { fallback } => {
                let Some(marshaler) = ty.marshaler() else {
                    return self.create_encoder(ty, fallback, attempt);
                };
                let mut encoder: EncoderRef =
                    Arc::new(MarshalerEncoder::new(ty, marshaler.clone()));
                if ty.kind() != Kind::Struct {
                    encoder = Arc::new(OptionalEncoder::in_place(encoder));
                }
                encoder
            }
            Shape::Any => Arc::new(AnyCodec),
            Shape::Scalar(kind) => {
                scalar::encoder(*kind).ok_or_else(|| unsupported(ty))?
            }
            Shape::Dynamic => Arc::new(DynamicCodec::new(
                self.this.clone(),
                self.config.use_number(),
            )),
            Shape::ConstrainedDynamic => {
                Arc::new(ConstrainedDynamicCodec::new(self.this.clone()))
            }
            Shape::Record => self
                .record_encoder(ty, attempt)
                .map_err(|error| error.nested(format!("[{ty}]")))?,
            Shape::Array => self
                .array_encoder(ty, attempt)
                .map_err(|error| error.nested("[array]"))?,
            Shape::Slice => self
                .slice_encoder(ty, attempt)
                .map_err(|error| error.nested("[slice]"))?,
            Shape::Map => self
                .map_encoder(ty, attempt)
                .map_err(|error| error.nested("[map]"))?,
            Shape::Optional => self
                .optional_encoder(ty, attempt)
                .map_err(|error| error.nested("[optional]"))?,
            Shape::Unsupported => return Err(unsupported(ty)),
        };
        Ok(encoder)
    }

    fn record_decoder(
        &self,
        ty: Type,
        attempt: &mut Attempt<Decoding>,
    ) -> Result<DecoderRef, Error> {
        let fields = ty
            .fields()
            .iter()
            .map(|field| {
                self.resolve_within(field.ty(), attempt)
                    .map(|decoder| (field.name(), decoder))
                    .map_err(|error| error.nested(field.name()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Arc::new(RecordDecoder::new(ty, fields)))
    }

    fn record_encoder(
        &self,
        ty: Type,
        attempt: &mut Attempt<Encoding>,
    ) -> Result<EncoderRef, Error> {
        let fields = ty
            .fields()
            .iter()
            .map(|field| {
                self.resolve_within(field.ty(), attempt)
                    .map(|encoder| {
                        (field.name(), field.is_omit_empty(), encoder)
                    })
                    .map_err(|error| error.nested(field.name()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Arc::new(RecordEncoder::new(ty, fields)))
    }

    fn array_decoder(
        &self,
        ty: Type,
        attempt: &mut Attempt<Decoding>,
    ) -> Result<DecoderRef, Error> {
        let elem = elem_of(ty)?;
        let decoder = self.resolve_within(elem, attempt)?;
        Ok(Arc::new(ArrayDecoder::new(ty, elem, decoder)))
    }

    fn array_encoder(
        &self,
        ty: Type,
        attempt: &mut Attempt<Encoding>,
    ) -> Result<EncoderRef, Error> {
        let encoder = self.resolve_within(elem_of(ty)?, attempt)?;
        Ok(Arc::new(ArrayEncoder::new(encoder)))
    }

    fn slice_decoder(
        &self,
        ty: Type,
        attempt: &mut Attempt<Decoding>,
    ) -> Result<DecoderRef, Error> {
        let elem = elem_of(ty)?;
        let decoder = self.resolve_within(elem, attempt)?;
        Ok(Arc::new(SliceDecoder::new(elem, decoder)))
    }

    fn slice_encoder(
        &self,
        ty: Type,
        attempt: &mut Attempt<Encoding>,
    ) -> Result<EncoderRef, Error> {
        let encoder = self.resolve_within(elem_of(ty)?, attempt)?;
        Ok(Arc::new(SliceEncoder::new(encoder)))
    }

    fn map_decoder(
        &self,
        ty: Type,
        attempt: &mut Attempt<Decoding>,
    ) -> Result<DecoderRef, Error> {
        let key = KeyKind::of(ty)?;
        let elem = elem_of(ty)?;
        let decoder = self.resolve_within(elem, attempt)?;
        Ok(Arc::new(MapDecoder::new(key, elem, decoder)))
    }

    fn map_encoder(
        &self,
        ty: Type,
        attempt: &mut Attempt<Encoding>,
    ) -> Result<EncoderRef, Error> {
        KeyKind::of(ty)?;
        let encoder = self.resolve_within(elem_of(ty)?, attempt)?;
        Ok(Arc::new(MapEncoder::new(encoder, self.config.sort_map_keys())))
    }

    fn optional_decoder(
        &self,
        ty: Type,
        attempt: &mut Attempt<Decoding>,
    ) -> Result<DecoderRef, Error> {
        let elem = elem_of(ty)?;
        let decoder = self.resolve_within(elem, attempt)?;
        Ok(Arc::new(OptionalDecoder::pointer(elem, decoder)))
    }

    fn optional_encoder(
        &self,
        ty: Type,
        attempt: &mut Attempt<Encoding>,
    ) -> Result<EncoderRef, Error> {
        let elem = elem_of(ty)?;
        let mut encoder = self.resolve_within(elem, attempt)?;
        // pointers to maps keep the historical extra nil guard
        if elem.kind() == Kind::Map {
            encoder = Arc::new(OptionalEncoder::in_place(encoder));
        }
        Ok(Arc::new(OptionalEncoder::pointer(encoder)))
    }
}

#[cfg(test)]
mod test;
