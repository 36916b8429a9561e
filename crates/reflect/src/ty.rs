//! Runtime type descriptors.
//!
//! A [`Type`] is a cheap, copyable handle to an interned [`TypeInfo`]. All
//! descriptors live in a process-wide universe keyed by [`TypeID`], the same
//! way a language runtime keeps one type table: the universe is read-only
//! reflection data, not codec state, so sharing it never couples two codec
//! configurations.

use std::{
    fmt,
    hash::{Hash, Hasher},
    sync::{Arc, LazyLock, OnceLock},
};

use dashmap::DashMap;
use fxhash::FxBuildHasher;

use crate::{
    capability::{Marshaler, Unmarshaler},
    type_id::TypeID,
    value::Value,
};

/// The structural classification of a type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[allow(missing_docs)]
pub enum Kind {
    Bool,
    Int,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Float32,
    Float64,
    Complex64,
    Complex128,
    String,
    Interface,
    Struct,
    Array,
    Slice,
    Map,
    Pointer,
    Chan,
    Func,
}

impl Kind {
    /// Returns `true` for the signed integer kinds.
    #[must_use]
    pub const fn is_signed(self) -> bool {
        matches!(
            self,
            Self::Int | Self::Int8 | Self::Int16 | Self::Int32 | Self::Int64
        )
    }

    /// Returns `true` for the unsigned integer kinds.
    #[must_use]
    pub const fn is_unsigned(self) -> bool {
        matches!(
            self,
            Self::Uint
                | Self::Uint8
                | Self::Uint16
                | Self::Uint32
                | Self::Uint64
        )
    }
}

/// Marker capabilities recognized ahead of the structural kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Marker {
    /// `json.RawMessage`: raw JSON bytes copied verbatim.
    JsonRawMessage,
    /// `RawMessage`: the library's own raw JSON byte type.
    RawMessage,
    /// `json.Number`: the exact textual form of a JSON number.
    Number,
    /// `Any`: a lazily inspected JSON node.
    Any,
}

/// One field of a record type.
#[derive(Debug, Clone)]
pub struct Field {
    name: Box<str>,
    ty: Type,
    omit_empty: bool,
}

impl Field {
    /// Creates a field serialized under `name`.
    #[must_use]
    pub fn new(name: impl Into<Box<str>>, ty: Type) -> Self {
        Self { name: name.into(), ty, omit_empty: false }
    }

    /// Skips the field on output when its encoder reports it empty.
    #[must_use]
    pub const fn omit_empty(mut self) -> Self {
        self.omit_empty = true;
        self
    }

    /// The JSON object key of the field.
    #[must_use]
    pub fn name(&self) -> &str { &self.name }

    /// The field's type.
    #[must_use]
    pub const fn ty(&self) -> Type { self.ty }

    /// Whether the field is dropped from output when empty.
    #[must_use]
    pub const fn is_omit_empty(&self) -> bool { self.omit_empty }
}

/// The interned description of a type. Obtain it through [`Type`].
pub struct TypeInfo {
    id: TypeID,
    name: Box<str>,
    kind: Kind,
    elem: Option<Type>,
    key: Option<Type>,
    len: usize,
    methods: Box<[Box<str>]>,
    fields: OnceLock<Box<[Field]>>,
    marker: Option<Marker>,
    marshaler: Option<Arc<dyn Marshaler>>,
    unmarshaler: Option<Arc<dyn Unmarshaler>>,
}

impl TypeInfo {
    const fn capabilities(&self) -> (Kind, Option<Marker>, bool, bool) {
        (
            self.kind,
            self.marker,
            self.marshaler.is_some(),
            self.unmarshaler.is_some(),
        )
    }

    fn unnamed(id: TypeID, name: String, kind: Kind) -> Self {
        Self {
            id,
            name: name.into_boxed_str(),
            kind,
            elem: None,
            key: None,
            len: 0,
            methods: Box::default(),
            fields: OnceLock::new(),
            marker: None,
            marshaler: None,
            unmarshaler: None,
        }
    }
}

impl fmt::Debug for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeInfo")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("marker", &self.marker)
            .finish_non_exhaustive()
    }
}

static UNIVERSE: LazyLock<DashMap<TypeID, Type, FxBuildHasher>> =
    LazyLock::new(DashMap::default);

fn intern(id: TypeID, build: impl FnOnce() -> TypeInfo) -> Type {
    if let Some(existing) = UNIVERSE.get(&id) {
        return *existing;
    }

    *UNIVERSE
        .entry(id)
        .or_insert_with(|| Type(Box::leak(Box::new(build()))))
}

/// A handle to a runtime type descriptor.
///
/// Equality and hashing go through the type's [`TypeID`], so a `Type` is a
/// valid map key. Descriptors are interned for the lifetime of the process.
#[derive(Clone, Copy)]
pub struct Type(&'static TypeInfo);

impl PartialEq for Type {
    fn eq(&self, other: &Self) -> bool { self.0.id == other.0.id }
}

impl Eq for Type {}

impl Hash for Type {
    fn hash<H: Hasher>(&self, state: &mut H) { self.0.id.hash(state); }
}

impl fmt::Debug for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Type({})", self.0.name)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.name)
    }
}

macro_rules! builtin {
    ($($(#[$doc:meta])* $fn_name:ident => $name:literal, $kind:expr;)*) => {
        $(
            $(#[$doc])*
            #[must_use]
            pub fn $fn_name() -> Self {
                static CELL: OnceLock<Type> = OnceLock::new();
                *CELL.get_or_init(|| TypeBuilder::new($name, $kind).build())
            }
        )*
    };
}

impl Type {
    builtin! {
        /// `bool`
        bool => "bool", Kind::Bool;
        /// `int`, a 64-bit signed integer.
        int => "int", Kind::Int;
        /// `int8`
        int8 => "int8", Kind::Int8;
        /// `int16`
        int16 => "int16", Kind::Int16;
        /// `int32`
        int32 => "int32", Kind::Int32;
        /// `int64`
        int64 => "int64", Kind::Int64;
        /// `uint`, a 64-bit unsigned integer.
        uint => "uint", Kind::Uint;
        /// `uint8`
        uint8 => "uint8", Kind::Uint8;
        /// `uint16`
        uint16 => "uint16", Kind::Uint16;
        /// `uint32`
        uint32 => "uint32", Kind::Uint32;
        /// `uint64`
        uint64 => "uint64", Kind::Uint64;
        /// `float32`
        float32 => "float32", Kind::Float32;
        /// `float64`
        float64 => "float64", Kind::Float64;
        /// `complex64`, which has no JSON form.
        complex64 => "complex64", Kind::Complex64;
        /// `complex128`, which has no JSON form.
        complex128 => "complex128", Kind::Complex128;
        /// `string`
        string => "string", Kind::String;
    }

    /// The fully dynamic `interface {}` type.
    #[must_use]
    pub fn empty_interface() -> Self { Self::interface("interface {}", &[]) }

    /// An interface type requiring the given methods.
    #[must_use]
    pub fn interface(name: &str, methods: &[&str]) -> Self {
        let mut builder = TypeBuilder::new(name, Kind::Interface);
        builder.info.methods = methods.iter().map(|m| (*m).into()).collect();
        builder.build()
    }

    /// `[]uint8`, encoded as base64 text.
    #[must_use]
    pub fn bytes() -> Self {
        static CELL: OnceLock<Type> = OnceLock::new();
        *CELL.get_or_init(|| Self::slice_of(Self::uint8()))
    }

    /// `json.RawMessage`
    #[must_use]
    pub fn json_raw_message() -> Self {
        static CELL: OnceLock<Type> = OnceLock::new();
        *CELL.get_or_init(|| {
            TypeBuilder::from_underlying("json.RawMessage", Self::bytes())
                .marker(Marker::JsonRawMessage)
                .build()
        })
    }

    /// `RawMessage`
    #[must_use]
    pub fn raw_message() -> Self {
        static CELL: OnceLock<Type> = OnceLock::new();
        *CELL.get_or_init(|| {
            TypeBuilder::from_underlying("RawMessage", Self::bytes())
                .marker(Marker::RawMessage)
                .build()
        })
    }

    /// `json.Number`
    #[must_use]
    pub fn json_number() -> Self {
        static CELL: OnceLock<Type> = OnceLock::new();
        *CELL.get_or_init(|| {
            TypeBuilder::new("json.Number", Kind::String)
                .marker(Marker::Number)
                .build()
        })
    }

    /// `Any`, the lazily inspected JSON node type.
    #[must_use]
    pub fn any() -> Self {
        static CELL: OnceLock<Type> = OnceLock::new();
        *CELL.get_or_init(|| {
            let mut builder = TypeBuilder::new("Any", Kind::Interface);
            builder.info.methods = Box::new(["ValueType".into()]);
            builder.marker(Marker::Any).build()
        })
    }

    /// `[]elem`
    #[must_use]
    pub fn slice_of(elem: Self) -> Self {
        let id = TypeID::from_name("[]").combine(elem.id());
        intern(id, || {
            let mut info =
                TypeInfo::unnamed(id, format!("[]{elem}"), Kind::Slice);
            info.elem = Some(elem);
            info
        })
    }

    /// `[len]elem`
    #[must_use]
    pub fn array_of(elem: Self, len: usize) -> Self {
        let id = TypeID::from_name(&format!("[{len}]")).combine(elem.id());
        intern(id, || {
            let mut info =
                TypeInfo::unnamed(id, format!("[{len}]{elem}"), Kind::Array);
            info.elem = Some(elem);
            info.len = len;
            info
        })
    }

    /// `map[key]elem`
    #[must_use]
    pub fn map_of(key: Self, elem: Self) -> Self {
        let id =
            TypeID::from_name("map").combine(key.id()).combine(elem.id());
        intern(id, || {
            let mut info =
                TypeInfo::unnamed(id, format!("map[{key}]{elem}"), Kind::Map);
            info.key = Some(key);
            info.elem = Some(elem);
            info
        })
    }

    /// `*elem`
    #[must_use]
    pub fn pointer_to(elem: Self) -> Self {
        let id = TypeID::from_name("*").combine(elem.id());
        intern(id, || {
            let mut info =
                TypeInfo::unnamed(id, format!("*{elem}"), Kind::Pointer);
            info.elem = Some(elem);
            info
        })
    }

    /// `chan elem`, which has no JSON form.
    #[must_use]
    pub fn chan_of(elem: Self) -> Self {
        let id = TypeID::from_name("chan").combine(elem.id());
        intern(id, || {
            let mut info =
                TypeInfo::unnamed(id, format!("chan {elem}"), Kind::Chan);
            info.elem = Some(elem);
            info
        })
    }

    /// A function type, which has no JSON form.
    #[must_use]
    pub fn func(signature: &str) -> Self {
        let name = format!("func{signature}");
        let id = TypeID::from_name(&name);
        intern(id, || TypeInfo::unnamed(id, name, Kind::Func))
    }

    /// Declares a named record type.
    ///
    /// The layout is attached separately through
    /// [`define_fields`](Self::define_fields) so a record can contain
    /// pointers to itself.
    #[must_use]
    pub fn record(name: &str) -> Self {
        TypeBuilder::new(name, Kind::Struct).build()
    }

    /// Attaches the field layout of a record declared with
    /// [`record`](Self::record) or a [`TypeBuilder`].
    ///
    /// The first definition wins; returns `false` if the layout was already
    /// defined.
    ///
    /// # Panics
    ///
    /// Panics if the type is not a record.
    pub fn define_fields(
        self,
        fields: impl IntoIterator<Item = Field>,
    ) -> bool {
        assert!(
            self.0.kind == Kind::Struct,
            "`{self}` is not a record type and has no fields"
        );
        self.0.fields.set(fields.into_iter().collect()).is_ok()
    }

    /// The stable identity of the type.
    #[must_use]
    pub const fn id(self) -> TypeID { self.0.id }

    /// The canonical name, e.g. `map[string]*Node`.
    #[must_use]
    pub fn name(self) -> &'static str { &self.0.name }

    /// The structural kind.
    #[must_use]
    pub const fn kind(self) -> Kind { self.0.kind }

    /// The element type of arrays, slices, maps, pointers and channels.
    #[must_use]
    pub const fn elem(self) -> Option<Self> { self.0.elem }

    /// The key type of maps.
    #[must_use]
    pub const fn key(self) -> Option<Self> { self.0.key }

    /// The length of array types; zero otherwise.
    #[must_use]
    pub const fn len(self) -> usize { self.0.len }

    /// The fields of a record, empty until defined.
    #[must_use]
    pub fn fields(self) -> &'static [Field] {
        match self.0.fields.get() {
            Some(fields) => fields.as_ref(),
            None => &[],
        }
    }

    /// The number of methods an interface type requires.
    #[must_use]
    pub fn num_method(self) -> usize { self.0.methods.len() }

    /// The marker capability of the type, if any.
    #[must_use]
    pub const fn marker(self) -> Option<Marker> { self.0.marker }

    /// The type's own JSON encoding capability.
    #[must_use]
    pub fn marshaler(self) -> Option<&'static Arc<dyn Marshaler>> {
        self.0.marshaler.as_ref()
    }

    /// The type's own JSON decoding capability.
    #[must_use]
    pub fn unmarshaler(self) -> Option<&'static Arc<dyn Unmarshaler>> {
        self.0.unmarshaler.as_ref()
    }

    /// Allocates the zero value of the type.
    #[must_use]
    pub fn zero_value(self) -> Value {
        match self.0.kind {
            Kind::Bool => Value::Bool(false),
            Kind::Int
            | Kind::Int8
            | Kind::Int16
            | Kind::Int32
            | Kind::Int64 => Value::Int(0),
            Kind::Uint
            | Kind::Uint8
            | Kind::Uint16
            | Kind::Uint32
            | Kind::Uint64 => Value::Uint(0),
            Kind::Float32 | Kind::Float64 => Value::Float(0.0),
            Kind::String if self.0.marker == Some(Marker::Number) => {
                Value::Number(String::new())
            }
            Kind::String => Value::String(String::new()),
            Kind::Interface if self.0.marker == Some(Marker::Any) => {
                Value::Any(serde_json::Value::Null)
            }
            Kind::Interface => Value::Interface(None),
            Kind::Struct => Value::Record(
                self.fields().iter().map(|f| f.ty.zero_value()).collect(),
            ),
            Kind::Array => {
                let elem = self.0.elem.map_or(Value::Null, Self::zero_value);
                Value::Array(vec![elem; self.0.len])
            }
            Kind::Slice if self.holds_bytes() => Value::Bytes(Vec::new()),
            Kind::Slice => Value::Slice(None),
            Kind::Map => Value::Map(None),
            Kind::Pointer => Value::Pointer(None),
            Kind::Complex64 | Kind::Complex128 | Kind::Chan | Kind::Func => {
                Value::Null
            }
        }
    }

    /// Whether values of this type are stored as a flat byte buffer.
    #[must_use]
    pub fn holds_bytes(self) -> bool {
        self == Self::bytes()
            || matches!(
                self.0.marker,
                Some(Marker::JsonRawMessage | Marker::RawMessage)
            )
    }
}

/// Builds named types, optionally carrying custom JSON capabilities.
///
/// Names are interned once per process. Building a name that already exists
/// returns the existing descriptor and discards everything attached to the
/// builder, so attach every capability on the first build. Debug builds
/// assert that a repeated build asks for the same kind and capabilities.
///
/// ```ignore
/// let celsius = TypeBuilder::from_underlying("Celsius", Type::float64())
///     .marshaler(Arc::new(CelsiusText))
///     .build();
/// ```
pub struct TypeBuilder {
    info: TypeInfo,
}

impl TypeBuilder {
    /// Starts a named type of the given kind with no element types.
    #[must_use]
    pub fn new(name: &str, kind: Kind) -> Self {
        Self {
            info: TypeInfo::unnamed(
                TypeID::from_name(name),
                name.to_owned(),
                kind,
            ),
        }
    }

    /// Starts a named type sharing the structure of `underlying`.
    ///
    /// Record layouts are not copied; define them on the new type.
    #[must_use]
    pub fn from_underlying(name: &str, underlying: Type) -> Self {
        let mut builder = Self::new(name, underlying.kind());
        builder.info.elem = underlying.0.elem;
        builder.info.key = underlying.0.key;
        builder.info.len = underlying.0.len;
        builder.info.methods = underlying.0.methods.clone();
        builder
    }

    /// Attaches a marker capability.
    #[must_use]
    pub const fn marker(mut self, marker: Marker) -> Self {
        self.info.marker = Some(marker);
        self
    }

    /// Attaches the type's own encoding capability.
    #[must_use]
    pub fn marshaler(mut self, marshaler: Arc<dyn Marshaler>) -> Self {
        self.info.marshaler = Some(marshaler);
        self
    }

    /// Attaches the type's own decoding capability.
    #[must_use]
    pub fn unmarshaler(mut self, unmarshaler: Arc<dyn Unmarshaler>) -> Self {
        self.info.unmarshaler = Some(unmarshaler);
        self
    }

    /// Interns the type. If a type with the same name already exists, the
    /// existing descriptor is returned and this builder is discarded.
    ///
    /// # Panics
    ///
    /// In debug builds, panics if the existing descriptor differs in kind,
    /// marker, or which conversion hooks it carries.
    #[must_use]
    pub fn build(self) -> Type {
        let id = self.info.id;
        let requested = self.info.capabilities();
        let ty = intern(id, || self.info);
        debug_assert_eq!(
            ty.0.capabilities(),
            requested,
            "type {ty} was already interned with other capabilities"
        );
        ty
    }
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use super::{Field, Kind, Type, TypeBuilder};
    use crate::{BoxError, Marshaler, Value};

    struct Upper;

    impl Marshaler for Upper {
        fn marshal_json(
            &self,
            value: &Value,
        ) -> Result<Vec<u8>, BoxError> {
            match value {
                Value::String(text) => {
                    Ok(format!("\"{}\"", text.to_uppercase()).into_bytes())
                }
                _ => Err("not a string".into()),
            }
        }
    }

    #[test]
    fn structural_types_are_interned() {
        let a = Type::map_of(Type::string(), Type::slice_of(Type::int()));
        let b = Type::map_of(Type::string(), Type::slice_of(Type::int()));

        assert_eq!(a, b);
        assert_eq!(a.name(), "map[string][]int");
        assert_eq!(a.key(), Some(Type::string()));
        assert_eq!(a.elem(), Some(Type::slice_of(Type::int())));
    }

    #[test]
    fn self_referential_record() {
        let list = Type::record("reflect.test.List");
        assert!(list.define_fields([
            Field::new("head", Type::int()),
            Field::new("tail", Type::pointer_to(list)),
        ]));
        assert!(!list.define_fields([]));

        assert_eq!(list.fields().len(), 2);
        assert_eq!(list.fields()[1].ty().elem(), Some(list));
        assert_eq!(
            list.zero_value(),
            Value::Record(vec![Value::Int(0), Value::Pointer(None)])
        );
    }

    #[test]
    fn zero_values_follow_kind() {
        assert_eq!(Type::bytes().zero_value(), Value::Bytes(Vec::new()));
        assert_eq!(
            Type::slice_of(Type::uint16()).zero_value(),
            Value::Slice(None)
        );
        assert_eq!(
            Type::array_of(Type::bool(), 2).zero_value(),
            Value::Array(vec![Value::Bool(false); 2])
        );
        assert_eq!(Type::json_number().kind(), Kind::String);
        assert_eq!(
            Type::json_number().zero_value(),
            Value::Number(String::new())
        );
    }

    #[test]
    fn rebuilding_a_name_returns_the_first_descriptor() {
        let first =
            TypeBuilder::from_underlying("reflect.test.Shout", Type::string())
                .marshaler(Arc::new(Upper))
                .build();
        let again =
            TypeBuilder::from_underlying("reflect.test.Shout", Type::string())
                .marshaler(Arc::new(Upper))
                .build();

        assert_eq!(first, again);
        assert!(again.marshaler().is_some());
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "already interned with other capabilities")]
    fn rebuilding_with_new_hooks_is_caught() {
        let _plain =
            TypeBuilder::from_underlying("reflect.test.Quiet", Type::string())
                .build();
        let _hooked =
            TypeBuilder::from_underlying("reflect.test.Quiet", Type::string())
                .marshaler(Arc::new(Upper))
                .build();
    }
}
