//! Entry points for dynamically typed values.

use swiftjson_reflect::{Dynamic, Kind};
use swiftjson_stream::{Error, Reader, Writer};

use crate::json::Inner;

impl Inner {
    pub(crate) fn decode_into(
        &self,
        reader: &mut Reader<'_>,
        target: &mut Dynamic,
    ) {
        let ty = target.ty();
        let pointee_ty = ty.elem().filter(|_| ty.kind() == Kind::Pointer);
        let (Some(pointee_ty), Some(pointee)) =
            (pointee_ty, target.pointee_mut())
        else {
            reader.set_error(Error::Mismatch {
                operation: "ReadVal",
                message: format!(
                    "can only decode into a non-nil pointer, got {ty}"
                ),
            });
            return;
        };

        match self.decoder_of(pointee_ty) {
            Ok(decoder) => decoder.decode(pointee, reader),
            Err(error) => reader.set_error(error),
        }
    }

    pub(crate) fn encode_from(
        &self,
        writer: &mut Writer,
        value: Option<&Dynamic>,
    ) {
        let Some(value) = value.filter(|value| !value.is_nil()) else {
            writer.write_null();
            return;
        };

        match self.encoder_of(value.ty()) {
            Ok(encoder) => encoder.encode_dynamic(value, writer),
            Err(error) => writer.set_error(error),
        }
    }
}
