//! Shared record types and helpers for swiftjson integration tests.
//!
//! Type names are interned process-wide, so every fixture is declared once
//! here and reused by the test binaries.

#![allow(missing_docs)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_panics_doc)]

use std::sync::OnceLock;

use swiftjson::{Dynamic, Field, Json, Type, Value};

// ============================================================================
// Record Fixtures
// ============================================================================

/// `Person { name string; age int; tags []string ,omitempty; email *string
/// ,omitempty }`
pub fn person() -> Type {
    static CELL: OnceLock<Type> = OnceLock::new();
    *CELL.get_or_init(|| {
        let ty = Type::record("fixture.Person");
        ty.define_fields([
            Field::new("name", Type::string()),
            Field::new("age", Type::int()),
            Field::new("tags", Type::slice_of(Type::string())).omit_empty(),
            Field::new("email", Type::pointer_to(Type::string())).omit_empty(),
        ]);
        ty
    })
}

pub fn person_value(name: &str, age: i64, tags: &[&str]) -> Value {
    let tags = if tags.is_empty() {
        Value::Slice(None)
    } else {
        Value::slice(tags.iter().map(|tag| Value::from(*tag)).collect())
    };
    Value::Record(vec![
        Value::from(name),
        Value::Int(age),
        tags,
        Value::Pointer(None),
    ])
}

/// `Node { value int; next *Node }`
pub fn node() -> Type {
    static CELL: OnceLock<Type> = OnceLock::new();
    *CELL.get_or_init(|| {
        let ty = Type::record("fixture.Node");
        ty.define_fields([
            Field::new("value", Type::int()),
            Field::new("next", Type::pointer_to(ty)),
        ]);
        ty
    })
}

/// A linked list of [`node`] values holding `values` in order.
pub fn linked_list(values: &[i64]) -> Value {
    values.iter().rev().fold(Value::Pointer(None), |next, value| {
        Value::pointer(Value::Record(vec![Value::Int(*value), next]))
    })
}

/// `Parent { name string; children []Child }` and
/// `Child { name string; parent *Parent }`: mutually recursive records.
pub fn parent_and_child() -> (Type, Type) {
    static CELL: OnceLock<(Type, Type)> = OnceLock::new();
    *CELL.get_or_init(|| {
        let parent = Type::record("fixture.Parent");
        let child = Type::record("fixture.Child");
        parent.define_fields([
            Field::new("name", Type::string()),
            Field::new("children", Type::slice_of(child)),
        ]);
        child.define_fields([
            Field::new("name", Type::string()),
            Field::new("parent", Type::pointer_to(parent)),
        ]);
        (parent, child)
    })
}

/// `Wire { id int; events chan int }`: has no JSON form.
pub fn wire() -> Type {
    static CELL: OnceLock<Type> = OnceLock::new();
    *CELL.get_or_init(|| {
        let ty = Type::record("fixture.Wire");
        ty.define_fields([
            Field::new("id", Type::int()),
            Field::new("events", Type::chan_of(Type::int())),
        ]);
        ty
    })
}

// ============================================================================
// Helpers
// ============================================================================

/// Decodes the document `input` into a fresh `*ty` and returns the pointee.
pub fn decode(json: &Json, ty: Type, input: &str) -> Value {
    let mut target = Dynamic::new_pointer(ty);
    json.unmarshal(input, &mut target).unwrap();
    target.pointee().cloned().unwrap()
}

/// Encodes `value` as `ty`.
pub fn encode(json: &Json, ty: Type, value: Value) -> String {
    json.marshal(&Dynamic::new(ty, value)).unwrap()
}
