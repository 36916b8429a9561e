//! Runtime reflection for swiftjson.
//!
//! This crate is the reflection facility the codec engine builds on:
//!
//! - [`Type`]: an interned, comparable descriptor with a stable [`TypeID`],
//!   a structural [`Kind`], element/key/field access and marker
//!   capabilities.
//! - [`Value`]: the storage cell decoders fill and encoders read.
//! - [`Dynamic`]: a value paired with its concrete type.
//! - [`Marshaler`] / [`Unmarshaler`]: hooks that let a type own its JSON
//!   form.
//!
//! # Example
//!
//! ```ignore
//! use swiftjson_reflect::{Field, Type};
//!
//! let node = Type::record("Node");
//! node.define_fields([
//!     Field::new("value", Type::int()),
//!     Field::new("next", Type::pointer_to(node)),
//! ]);
//!
//! assert_eq!(node.fields()[1].ty().name(), "*Node");
//! ```

pub mod capability;
pub mod ty;
pub mod type_id;
pub mod value;

pub use capability::{BoxError, Marshaler, Unmarshaler};
pub use ty::{Field, Kind, Marker, Type, TypeBuilder, TypeInfo};
pub use type_id::TypeID;
pub use value::{Dynamic, MapKey, MapValue, Value};
