//! Adapters over a type's own conversion hooks.

use std::{fmt, sync::Arc};

use swiftjson_reflect::{Marshaler, Type, Unmarshaler, Value};
use swiftjson_stream::{Error, Reader, Writer};

use crate::codec::{Decoder, Encoder};

/// Hands the raw JSON text of the next value to the type's
/// [`Unmarshaler`].
pub struct UnmarshalerDecoder {
    ty: Type,
    unmarshaler: Arc<dyn Unmarshaler>,
}

impl UnmarshalerDecoder {
    pub(crate) fn new(ty: Type, unmarshaler: Arc<dyn Unmarshaler>) -> Self {
        Self { ty, unmarshaler }
    }
}

impl fmt::Debug for UnmarshalerDecoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnmarshalerDecoder").field("ty", &self.ty).finish()
    }
}

impl Decoder for UnmarshalerDecoder {
    fn decode(&self, value: &mut Value, reader: &mut Reader<'_>) {
        let raw = reader.read_raw();
        if reader.error.is_some() {
            return;
        }
        if let Err(error) = self.unmarshaler.unmarshal_json(raw, value) {
            reader.set_error(Error::Marshal {
                type_name: self.ty.name().to_owned(),
                message: error.to_string(),
            });
        }
    }
}

/// Writes whatever the type's [`Marshaler`] produces.
pub struct MarshalerEncoder {
    ty: Type,
    marshaler: Arc<dyn Marshaler>,
}

impl MarshalerEncoder {
    pub(crate) fn new(ty: Type, marshaler: Arc<dyn Marshaler>) -> Self {
        Self { ty, marshaler }
    }
}

impl fmt::Debug for MarshalerEncoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MarshalerEncoder").field("ty", &self.ty).finish()
    }
}

impl Encoder for MarshalerEncoder {
    fn is_empty(&self, value: &Value) -> bool { value.is_nil() }

    fn encode(&self, value: &Value, writer: &mut Writer) {
        match self.marshaler.marshal_json(value) {
            Ok(json) => writer.write_raw(&json),
            Err(error) => writer.set_error(Error::Marshal {
                type_name: self.ty.name().to_owned(),
                message: error.to_string(),
            }),
        }
    }
}
