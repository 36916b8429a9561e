//! # swiftjson
//!
//! Reflection-driven JSON codecs resolved once per type and cached per
//! configuration.
//!
//! Given a runtime [`Type`], a [`Json`] instance produces a stateless
//! [`Decoder`] and [`Encoder`] for it and caches both, so later calls skip
//! all type inspection. Resolution:
//!
//! - dispatches on the type's [`Shape`], recursing into element, key and
//!   field types;
//! - terminates on self-referential types by handing out a placeholder
//!   while a codec is under construction;
//! - is safe under concurrent first use: one codec is built per type and
//!   everyone else receives the same `Arc`;
//! - can be short-circuited or decorated by [`Extension`]s.
//!
//! Dynamically typed values enter through [`Json::decode_into`] and
//! [`Json::encode_from`], or the [`Json::unmarshal`] / [`Json::marshal`]
//! conveniences.
//!
//! ## Errors
//!
//! Decoders and encoders never return errors. The first failure is recorded
//! on the `error` field of the [`Reader`] or [`Writer`] in use; the caller
//! checks it once the top-level call returns. Codec construction failures
//! are returned from [`Json::decoder_of`] / [`Json::encoder_of`] and carry
//! the path to the offending type:
//!
//! ```text
//! [Outer]: children: [slice]: unsupported type: chan int
//! ```
//!
//! ## Logging
//!
//! Resolution emits `tracing` events at `debug` level when a codec is
//! built, supplied by an extension, or fails to build. Install a subscriber
//! to see them.

mod bridge;
mod cache;
pub mod codec;
pub mod config;
pub mod extension;
mod json;
mod resolve;
pub mod shape;

pub use codec::{
    Decoder, DecoderFn, DecoderRef, Encoder, EncoderFn, EncoderRef,
    write_dynamic,
};
pub use config::Config;
pub use extension::{Extension, TypeCodecs};
pub use json::Json;
pub use shape::Shape;
// re-export companion crates
pub use swiftjson_reflect as reflect;
pub use swiftjson_reflect::{
    BoxError, Dynamic, Field, Kind, MapKey, MapValue, Marker, Marshaler, Type,
    TypeBuilder, Unmarshaler, Value,
};
pub use swiftjson_stream as stream;
pub use swiftjson_stream::{DEFAULT_MAX_DEPTH, Error, Reader, Token, Writer};
