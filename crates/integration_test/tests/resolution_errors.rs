//! Tests for types that cannot be encoded or decoded.

#![allow(missing_docs)]

use swiftjson::{Dynamic, Error, Json, Type, Value};
use swiftjson_integration_test::wire;

#[test]
fn unsupported_fields_fail_with_their_path() {
    let json = Json::default();
    let wires = Type::slice_of(wire());

    let error = json.decoder_of(wires).unwrap_err();
    assert_eq!(
        error.to_string(),
        "[slice]: [fixture.Wire]: events: unsupported type: chan int"
    );
    assert_eq!(error.root(), &Error::UnsupportedType("chan int".to_owned()));

    // nothing is cached, so the failure repeats
    assert!(json.cached_decoder(wires).is_none());
    assert!(json.cached_decoder(wire()).is_none());
    assert_eq!(json.decoder_of(wires).unwrap_err(), error);
}

#[test]
fn unsupported_kinds() {
    let json = Json::default();

    for ty in [
        Type::chan_of(Type::string()),
        Type::func("()"),
        Type::complex128(),
        Type::map_of(Type::float64(), Type::int()),
    ] {
        let error = json.encoder_of(ty).unwrap_err();
        assert_eq!(error.root(), &Error::UnsupportedType(ty.name().to_owned()));
    }
}

#[test]
fn entry_points_report_resolution_failures() {
    let json = Json::default();

    let value = Dynamic::new(wire(), wire().zero_value());
    assert!(matches!(
        json.marshal(&value).unwrap_err().root(),
        Error::UnsupportedType(_)
    ));

    let mut target = Dynamic::new_pointer(wire());
    assert!(json.unmarshal("{}", &mut target).is_err());
}

#[test]
fn decoding_needs_a_non_nil_pointer() {
    let json = Json::default();

    let mut not_a_pointer = Dynamic::zero(Type::int());
    let error = json.unmarshal("1", &mut not_a_pointer).unwrap_err();
    assert!(matches!(error, Error::Mismatch { operation: "ReadVal", .. }));

    let mut nil =
        Dynamic::new(Type::pointer_to(Type::int()), Value::Pointer(None));
    assert!(json.unmarshal("1", &mut nil).is_err());
}
