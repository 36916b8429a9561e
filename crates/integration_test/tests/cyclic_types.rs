//! Tests for self-referential and mutually recursive types.

#![allow(missing_docs)]

use std::sync::Arc;

use swiftjson::{Config, Dynamic, Error, Json, Type, Value};
use swiftjson_integration_test::{
    decode, encode, linked_list, node, parent_and_child,
};

#[test]
fn linked_list_round_trip() {
    let json = Json::default();
    let list = Type::pointer_to(node());

    let value = decode(&json, list, r#"{"value":1,"next":{"value":2}}"#);
    assert_eq!(value, linked_list(&[1, 2]));
    assert_eq!(
        encode(&json, list, value),
        r#"{"value":1,"next":{"value":2,"next":null}}"#
    );
}

#[test]
fn deep_lists_reuse_one_codec() {
    let json = Json::default();
    let list = Type::pointer_to(node());
    let values: Vec<i64> = (0..64).collect();

    let text = encode(&json, list, linked_list(&values));
    assert_eq!(decode(&json, list, &text), linked_list(&values));

    let first = json.decoder_of(node()).unwrap();
    let second = json.decoder_of(node()).unwrap();
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn lists_deeper_than_the_limit_are_rejected() {
    let json = Config::default().with_max_depth(8).build();
    let list = Type::pointer_to(node());
    let values: Vec<i64> = (0..16).collect();
    let text = encode(&json, list, linked_list(&values));

    let mut target = Dynamic::new_pointer(list);
    let error = json.unmarshal(&text, &mut target).unwrap_err();
    assert!(matches!(error, Error::Syntax { operation: "ReadObject", .. }));

    let values: Vec<i64> = (0..8).collect();
    let text = encode(&json, list, linked_list(&values));
    assert_eq!(decode(&json, list, &text), linked_list(&values));
}

#[test]
fn mutually_recursive_records() {
    let json = Config::default().build();
    let (parent, _) = parent_and_child();

    let input = r#"{
        "name": "root",
        "children": [
            {"name": "leaf", "parent": {"name": "up", "children": []}}
        ]
    }"#;
    let up = Value::Record(vec![Value::from("up"), Value::slice(Vec::new())]);
    let leaf = Value::Record(vec![Value::from("leaf"), Value::pointer(up)]);
    let root =
        Value::Record(vec![Value::from("root"), Value::slice(vec![leaf])]);

    let value = decode(&json, parent, input);
    assert_eq!(value, root);
    assert_eq!(
        encode(&json, parent, value),
        r#"{"name":"root","children":[{"name":"leaf","parent":{"name":"up","children":[]}}]}"#
    );
}

#[test]
fn resolution_from_either_end() {
    let (parent, child) = parent_and_child();

    // the order in which a cycle is entered does not matter
    let from_child = Json::default();
    from_child.encoder_of(child).unwrap();
    let from_parent = Json::default();
    from_parent.encoder_of(parent).unwrap();

    let value = Value::Record(vec![Value::from("solo"), Value::Pointer(None)]);
    assert_eq!(
        from_child.marshal(&Dynamic::new(child, value.clone())).unwrap(),
        from_parent.marshal(&Dynamic::new(child, value)).unwrap(),
    );
}

#[test]
fn decoding_reuses_existing_pointees() {
    let json = Json::default();
    let mut target = Dynamic::new_pointer(Type::pointer_to(node()));

    json.unmarshal(r#"{"value":1}"#, &mut target).unwrap();
    let Some(Value::Pointer(Some(first))) = target.pointee() else {
        panic!("expected an allocated node");
    };
    let address: *const Value = &raw const **first;

    json.unmarshal(r#"{"value":2}"#, &mut target).unwrap();
    let Some(Value::Pointer(Some(second))) = target.pointee() else {
        panic!("expected an allocated node");
    };
    assert_eq!(&raw const **second, address);
    assert_eq!(
        **second,
        Value::Record(vec![Value::Int(2), Value::Pointer(None)])
    );

    json.unmarshal("null", &mut target).unwrap();
    assert_eq!(target.pointee(), Some(&Value::Pointer(None)));
}
