use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use swiftjson_reflect::{
    BoxError, Dynamic, Field, Marshaler, Type, TypeBuilder, Unmarshaler, Value,
};
use swiftjson_stream::{Error, Reader, Writer};

use crate::{
    Config, DecoderFn, DecoderRef, EncoderFn, EncoderRef, Extension, Json,
    Shape, TypeCodecs,
};

fn encode(json: &Json, ty: Type, value: &Value) -> String {
    let mut writer = json.writer();
    json.encoder_of(ty).unwrap().encode(value, &mut writer);
    assert_eq!(writer.error, None);
    String::from_utf8(writer.into_bytes()).unwrap()
}

fn decode(json: &Json, ty: Type, input: &str) -> Result<Value, Error> {
    let mut value = ty.zero_value();
    let mut reader = Reader::new(input.as_bytes());
    json.decoder_of(ty).unwrap().decode(&mut value, &mut reader);
    reader.error.map_or(Ok(value), Err)
}

#[test]
fn resolution_is_idempotent() {
    let json = Json::default();
    let ty = Type::map_of(Type::string(), Type::slice_of(Type::float64()));

    let first = json.decoder_of(ty).unwrap();
    let second = json.decoder_of(ty).unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert!(Arc::ptr_eq(&first, &json.cached_decoder(ty).unwrap()));

    let first = json.encoder_of(ty).unwrap();
    let second = json.encoder_of(ty).unwrap();
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn caches_are_per_instance() {
    let a = Json::default();
    let b = Json::default();

    let from_a = a.decoder_of(Type::string()).unwrap();
    assert!(b.cached_decoder(Type::string()).is_none());
    assert!(!Arc::ptr_eq(&from_a, &b.decoder_of(Type::string()).unwrap()));
}

#[test]
fn unsupported_types_name_their_path() {
    let json = Json::default();
    let tree = Type::record("resolve.test.Tree");
    tree.define_fields([
        Field::new("name", Type::string()),
        Field::new("children", Type::slice_of(Type::chan_of(Type::int()))),
    ]);

    let error = json.encoder_of(tree).unwrap_err();
    assert_eq!(
        error.to_string(),
        "[resolve.test.Tree]: children: [slice]: unsupported type: chan int"
    );
    assert!(json.cached_encoder(tree).is_none());
    assert!(json.cached_encoder(Type::chan_of(Type::int())).is_none());
    // sibling fields that did build stay cached
    assert!(json.cached_encoder(Type::string()).is_some());
}

#[test]
fn composite_errors_are_prefixed() {
    let json = Json::default();
    let bad = Type::complex64();

    let cases = [
        (Type::array_of(bad, 2), "[array]"),
        (Type::map_of(Type::string(), bad), "[map]"),
        (Type::pointer_to(bad), "[optional]"),
    ];
    for (ty, segment) in cases {
        let error = json.decoder_of(ty).unwrap_err();
        assert_eq!(error.path(), [segment]);
        assert_eq!(error.root(), &Error::UnsupportedType("complex64".into()));
    }

    let error = json.decoder_of(Type::map_of(Type::bool(), Type::int()));
    assert_eq!(
        error.unwrap_err().to_string(),
        "[map]: unsupported type: map[bool]int"
    );
}

#[test]
fn self_referential_records_terminate() {
    let json = Json::default();
    let node = Type::record("resolve.test.Node");
    node.define_fields([
        Field::new("value", Type::int()),
        Field::new("next", Type::pointer_to(node)),
    ]);

    let value = decode(&json, node, r#"{"value": 1, "next": {"value": 2}}"#);
    let expected = Value::Record(vec![
        Value::Int(1),
        Value::pointer(Value::Record(vec![
            Value::Int(2),
            Value::Pointer(None),
        ])),
    ]);
    assert_eq!(value, Ok(expected.clone()));
    assert_eq!(
        encode(&json, node, &expected),
        r#"{"value":1,"next":{"value":2,"next":null}}"#
    );
}

#[test]
fn shapes_are_cached() {
    let json = Json::default();
    let ty = Type::pointer_to(Type::bytes());

    assert_eq!(json.shape_of(ty), Shape::Optional);
    assert_eq!(json.shape_of(Type::bytes()), Shape::Bytes);
    assert_eq!(
        encode(&json, ty, &Value::pointer(Value::Bytes(b"hi".to_vec()))),
        r#""aGk=""#
    );
}

#[derive(Default)]
struct Counting {
    direct: AtomicUsize,
    decorated: AtomicUsize,
}

impl Extension for Arc<Counting> {
    fn direct_decoder(&self, ty: Type) -> Option<DecoderRef> {
        (ty == Type::bool()).then(|| {
            self.direct.fetch_add(1, Ordering::SeqCst);
            let decoder = DecoderFn::new(|value, reader| {
                reader.skip();
                *value = Value::Bool(true);
            });
            Arc::new(decoder) as DecoderRef
        })
    }

    fn decorate_encoder(&self, _: Type, encoder: EncoderRef) -> EncoderRef {
        self.decorated.fetch_add(1, Ordering::SeqCst);
        encoder
    }
}

#[test]
fn extensions_short_circuit_and_decorate() {
    let counting = Arc::new(Counting::default());
    let json = Config::default().with_extension(counting.clone()).build();

    assert_eq!(decode(&json, Type::bool(), "false"), Ok(Value::Bool(true)));
    assert_eq!(decode(&json, Type::bool(), "false"), Ok(Value::Bool(true)));
    assert_eq!(counting.direct.load(Ordering::SeqCst), 1);

    // `[]string` and `string`
    json.encoder_of(Type::slice_of(Type::string())).unwrap();
    assert_eq!(counting.decorated.load(Ordering::SeqCst), 2);
}

#[test]
fn first_direct_codec_wins() {
    let json = Config::default()
        .with_extension(
            TypeCodecs::new()
                .encode_with(Type::int(), |_, writer| writer.write_raw(b"1")),
        )
        .with_extension(
            TypeCodecs::new()
                .encode_with(Type::int(), |_, writer| writer.write_raw(b"2")),
        )
        .build();

    assert_eq!(encode(&json, Type::int(), &Value::Int(0)), "1");
}

#[test]
fn inserted_codecs_replace_cached_ones() {
    let json = Json::default();
    json.decoder_of(Type::string()).unwrap();

    let shout: DecoderRef = Arc::new(DecoderFn::new(|value, reader| {
        *value = Value::String(reader.read_string().to_uppercase());
    }));
    json.insert_decoder(Type::string(), shout.clone());

    assert!(Arc::ptr_eq(&json.decoder_of(Type::string()).unwrap(), &shout));
    assert_eq!(
        decode(&json, Type::slice_of(Type::string()), r#"["a"]"#),
        Ok(Value::slice(vec![Value::from("A")]))
    );
}

struct Celsius;

impl Marshaler for Celsius {
    fn marshal_json(&self, value: &Value) -> Result<Vec<u8>, BoxError> {
        match value {
            Value::Float(degrees) => Ok(format!("\"{degrees}C\"").into_bytes()),
            _ => Err("not a temperature".into()),
        }
    }
}

impl Unmarshaler for Celsius {
    fn unmarshal_json(
        &self,
        data: &[u8],
        value: &mut Value,
    ) -> Result<(), BoxError> {
        let text: String = serde_json::from_slice(data)?;
        let degrees = text.strip_suffix('C').ok_or("missing unit")?;
        *value = Value::Float(degrees.parse()?);
        Ok(())
    }
}

#[test]
fn conversion_hooks_take_over() {
    let json = Json::default();
    let celsius =
        TypeBuilder::from_underlying("resolve.test.Celsius", Type::float64())
            .marshaler(Arc::new(Celsius))
            .unmarshaler(Arc::new(Celsius))
            .build();

    assert_eq!(decode(&json, celsius, r#""21.5C""#), Ok(Value::Float(21.5)));
    assert_eq!(encode(&json, celsius, &Value::Float(-3.0)), r#""-3C""#);

    let error = decode(&json, celsius, r#""21.5F""#).unwrap_err();
    assert_eq!(
        error,
        Error::Marshal {
            type_name: "resolve.test.Celsius".to_owned(),
            message: "missing unit".to_owned(),
        }
    );
}

#[test]
fn one_sided_hooks_fall_back_to_structure() {
    let json = Json::default();
    let tag = TypeBuilder::from_underlying("resolve.test.Tag", Type::string())
        .marshaler(Arc::new(Celsius))
        .build();

    assert_eq!(decode(&json, tag, r#""plain""#), Ok(Value::from("plain")));

    let mut writer = json.writer();
    json.encoder_of(tag).unwrap().encode(&Value::from("x"), &mut writer);
    assert!(matches!(writer.error, Some(Error::Marshal { .. })));
}

#[test]
fn pointer_to_map_encodes_like_the_map() {
    let json = Config::default().with_sort_map_keys(true).build();
    let ty = Type::pointer_to(Type::map_of(Type::string(), Type::int()));

    let value = Value::pointer(Value::map([
        ("b", Value::Int(2)),
        ("a", Value::Int(1)),
    ]));
    assert_eq!(encode(&json, ty, &value), r#"{"a":1,"b":2}"#);
    assert_eq!(encode(&json, ty, &Value::pointer(Value::Map(None))), "null");
    assert_eq!(encode(&json, ty, &Value::Pointer(None)), "null");
}

#[test]
fn omit_empty_looks_through_pointers_to_maps() {
    let json = Json::default();
    let counts = Type::record("resolve.test.Counts");
    counts.define_fields([
        Field::new(
            "counts",
            Type::pointer_to(Type::map_of(Type::string(), Type::int())),
        )
        .omit_empty(),
        Field::new("total", Type::int()),
    ]);
    let record = |counts| Value::Record(vec![counts, Value::Int(0)]);

    let omitted = [
        Value::Pointer(None),
        Value::pointer(Value::Map(None)),
        Value::pointer(Value::map(Vec::<(&str, Value)>::new())),
    ];
    for field in omitted {
        assert_eq!(encode(&json, counts, &record(field)), r#"{"total":0}"#);
    }

    let full = record(Value::pointer(Value::map([("a", Value::Int(1))])));
    assert_eq!(encode(&json, counts, &full), r#"{"counts":{"a":1},"total":0}"#);
}

#[test]
fn supplied_encoders_may_define_emptiness() {
    let level =
        TypeBuilder::from_underlying("resolve.test.Level", Type::int()).build();
    let write_level = |value: &Value, writer: &mut Writer| match value {
        Value::Int(level) => {
            writer.write_raw(format!("\"L{level}\"").as_bytes());
        }
        _ => writer.write_null(),
    };
    let report = Type::record("resolve.test.Report");
    report.define_fields([Field::new("level", level).omit_empty()]);
    let quiet = Value::Record(vec![Value::Int(0)]);

    let plain = Config::default()
        .with_extension(
            TypeCodecs::new()
                .encoder(level, Arc::new(EncoderFn::new(write_level))),
        )
        .build();
    assert_eq!(encode(&plain, report, &quiet), r#"{"level":"L0"}"#);

    let encoder = EncoderFn::new(write_level)
        .with_is_empty(|value| matches!(value, Value::Int(0)));
    let checked = Config::default()
        .with_extension(TypeCodecs::new().encoder(level, Arc::new(encoder)))
        .build();
    assert_eq!(encode(&checked, report, &quiet), "{}");
    assert_eq!(
        encode(&checked, report, &Value::Record(vec![Value::Int(3)])),
        r#"{"level":"L3"}"#
    );
}

#[test]
fn bridge_requires_a_pointer() {
    let json = Json::default();
    let mut reader = json.reader("1");
    let mut target = Dynamic::zero(Type::int());
    json.decode_into(&mut reader, &mut target);

    assert!(matches!(
        reader.error,
        Some(Error::Mismatch { operation: "ReadVal", .. })
    ));

    let mut writer = Writer::default();
    json.encode_from(&mut writer, None);
    writer.write_more();
    let nil = Dynamic::zero(Type::pointer_to(Type::int()));
    json.encode_from(&mut writer, Some(&nil));
    assert_eq!(writer.buffer(), b"null,null");
}
