//! Tests for resolving and using codecs from many threads at once.

#![allow(missing_docs)]

use std::{
    sync::{Arc, Barrier},
    thread,
};

use swiftjson::{Json, Type, Value};
use swiftjson_integration_test::{
    decode, encode, linked_list, node, person, person_value,
};

const THREADS: usize = 8;

#[test]
fn concurrent_first_use_settles_on_one_codec() {
    let json = Json::default();
    let ty = Type::map_of(Type::string(), Type::slice_of(person()));
    let barrier = Barrier::new(THREADS);

    let values = thread::scope(|scope| {
        let handles = (0..THREADS)
            .map(|_| {
                scope.spawn(|| {
                    barrier.wait();
                    let value = decode(
                        &json,
                        ty,
                        r#"{"team":[{"name":"Ann","age":30}]}"#,
                    );
                    json.encoder_of(ty).unwrap();
                    value
                })
            })
            .collect::<Vec<_>>();

        handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect::<Vec<_>>()
    });

    let team = Value::slice(vec![person_value("Ann", 30, &[])]);
    let expected = Value::map([("team", team)]);
    assert!(values.iter().all(|value| *value == expected));

    let first = json.decoder_of(ty).unwrap();
    assert!(Arc::ptr_eq(&first, &json.decoder_of(ty).unwrap()));
    assert!(Arc::ptr_eq(&first, &json.cached_decoder(ty).unwrap()));
}

#[test]
fn concurrent_cyclic_resolution() {
    let json = Json::default();
    let list = Type::pointer_to(node());
    let barrier = Barrier::new(THREADS);

    thread::scope(|scope| {
        for i in 0..THREADS {
            let (json, barrier) = (&json, &barrier);
            scope.spawn(move || {
                barrier.wait();
                let len = i64::try_from(i).unwrap();
                let values: Vec<i64> = (0..=len).collect();

                let text = encode(json, list, linked_list(&values));
                assert_eq!(decode(json, list, &text), linked_list(&values));
            });
        }
    });
}

#[test]
fn clones_share_their_caches() {
    let json = Json::default();
    let clone = json.clone();

    let decoder = thread::scope(|scope| {
        scope
            .spawn(|| clone.decoder_of(Type::slice_of(node())).unwrap())
            .join()
            .unwrap()
    });

    let cached = json.cached_decoder(Type::slice_of(node())).unwrap();
    assert!(Arc::ptr_eq(&decoder, &cached));
}
