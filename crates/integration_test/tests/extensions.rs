//! Tests for extension short-circuit and decoration.

#![allow(missing_docs)]

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use swiftjson::{
    Config, Decoder, DecoderRef, Encoder, EncoderFn, EncoderRef, Extension,
    Reader, Type, TypeCodecs, Value, Writer,
};
use swiftjson_integration_test::{decode, encode, wire};

// ============================================================================
// Direct Codecs
// ============================================================================

#[test]
fn direct_codecs_bypass_structural_dispatch() {
    // `Wire` has a channel field and cannot be built structurally
    let codecs = TypeCodecs::new()
        .decode_with(wire(), |value, reader| {
            let id = reader.read_i64();
            *value = Value::Record(vec![Value::Int(id), Value::Null]);
        })
        .encode_with(wire(), |value, writer| match value {
            Value::Record(fields) => match fields.first() {
                Some(Value::Int(id)) => writer.write_i64(*id),
                _ => writer.write_null(),
            },
            _ => writer.write_null(),
        });
    let json = Config::default().with_extension(codecs).build();
    let wires = Type::slice_of(wire());

    let value = decode(&json, wires, "[3, 4]");
    assert_eq!(
        value,
        Value::slice(vec![
            Value::Record(vec![Value::Int(3), Value::Null]),
            Value::Record(vec![Value::Int(4), Value::Null]),
        ])
    );
    assert_eq!(encode(&json, wires, value), "[3,4]");
}

#[test]
fn direct_codecs_are_per_configuration() {
    let redacted = Config::default()
        .with_extension(TypeCodecs::new().encoder(
            Type::string(),
            Arc::new(EncoderFn::new(|_, writer| writer.write_string("***"))),
        ))
        .build();
    let plain = Config::default().build();
    let names = Type::slice_of(Type::string());
    let value = Value::slice(vec![Value::from("secret")]);

    assert_eq!(encode(&redacted, names, value.clone()), r#"["***"]"#);
    assert_eq!(encode(&plain, names, value), r#"["secret"]"#);
}

// ============================================================================
// Decoration
// ============================================================================

struct Counted<C: ?Sized> {
    calls: Arc<AtomicUsize>,
    inner: Arc<C>,
}

impl Decoder for Counted<dyn Decoder> {
    fn decode(&self, value: &mut Value, reader: &mut Reader<'_>) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.decode(value, reader);
    }
}

impl Encoder for Counted<dyn Encoder> {
    fn is_empty(&self, value: &Value) -> bool { self.inner.is_empty(value) }

    fn encode(&self, value: &Value, writer: &mut Writer) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.encode(value, writer);
    }
}

/// Counts every call to the codecs of one type.
struct CountCalls {
    ty: Type,
    calls: Arc<AtomicUsize>,
}

impl Extension for CountCalls {
    fn decorate_decoder(&self, ty: Type, decoder: DecoderRef) -> DecoderRef {
        if ty != self.ty {
            return decoder;
        }
        Arc::new(Counted { calls: self.calls.clone(), inner: decoder })
    }

    fn decorate_encoder(&self, ty: Type, encoder: EncoderRef) -> EncoderRef {
        if ty != self.ty {
            return encoder;
        }
        Arc::new(Counted { calls: self.calls.clone(), inner: encoder })
    }
}

#[test]
fn decorators_wrap_built_codecs() {
    let calls = Arc::new(AtomicUsize::new(0));
    let json = Config::default()
        .with_extension(CountCalls { ty: Type::int(), calls: calls.clone() })
        .build();
    let ints = Type::slice_of(Type::int());

    let value = decode(&json, ints, "[1,2,3]");
    assert_eq!(calls.load(Ordering::SeqCst), 3);

    encode(&json, ints, value);
    assert_eq!(calls.load(Ordering::SeqCst), 6);
}

#[test]
fn decorators_do_not_wrap_direct_codecs() {
    let calls = Arc::new(AtomicUsize::new(0));
    let json = Config::default()
        .with_extension(
            TypeCodecs::new()
                .encode_with(Type::int(), |_, writer| writer.write_i64(0)),
        )
        .with_extension(CountCalls { ty: Type::int(), calls: calls.clone() })
        .build();

    assert_eq!(encode(&json, Type::int(), Value::Int(9)), "0");
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn decorators_apply_in_registration_order() {
    struct Tag(&'static str);

    impl Extension for Tag {
        fn decorate_encoder(
            &self,
            ty: Type,
            encoder: EncoderRef,
        ) -> EncoderRef {
            if ty != Type::bool() {
                return encoder;
            }
            let tag = self.0;
            Arc::new(EncoderFn::new(move |value, writer| {
                writer.write_array_start();
                writer.write_string(tag);
                writer.write_more();
                encoder.encode(value, writer);
                writer.write_array_end();
            }))
        }
    }

    let json = Config::default()
        .with_extension(Tag("inner"))
        .with_extension(Tag("outer"))
        .build();

    assert_eq!(
        encode(&json, Type::bool(), Value::Bool(true)),
        r#"["outer",["inner",true]]"#
    );
}
