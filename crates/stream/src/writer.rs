//! The JSON output sink.

use crate::error::Error;

const HEX: &[u8; 16] = b"0123456789abcdef";

/// An append-only JSON writer.
///
/// Like the [`Reader`](crate::Reader), the writer records its first failure
/// in the public [`error`](Self::error) field rather than returning it, so
/// encoders can keep writing and the caller checks once at the end.
#[derive(Debug, Default)]
pub struct Writer {
    buf: Vec<u8>,
    escape_html: bool,

    /// The first error encountered, if any.
    pub error: Option<Error>,
}

impl Writer {
    /// Creates an empty writer.
    #[must_use]
    pub const fn new(escape_html: bool) -> Self {
        Self { buf: Vec::new(), escape_html, error: None }
    }

    /// Records a mismatch error unless an error is already recorded.
    pub fn report_error(
        &mut self,
        operation: &'static str,
        message: impl Into<String>,
    ) {
        self.set_error(Error::Mismatch { operation, message: message.into() });
    }

    /// Records `error` unless an error is already recorded.
    pub fn set_error(&mut self, error: Error) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }

    /// The bytes written so far.
    #[must_use]
    pub fn buffer(&self) -> &[u8] { &self.buf }

    /// Consumes the writer, returning its bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> { self.buf }

    /// Writes `null`.
    pub fn write_null(&mut self) { self.buf.extend_from_slice(b"null"); }

    /// Writes `true` or `false`.
    pub fn write_bool(&mut self, value: bool) {
        self.buf.extend_from_slice(if value { b"true" } else { b"false" });
    }

    /// Writes a signed integer.
    pub fn write_i64(&mut self, value: i64) {
        self.buf.extend_from_slice(value.to_string().as_bytes());
    }

    /// Writes an unsigned integer.
    pub fn write_u64(&mut self, value: u64) {
        self.buf.extend_from_slice(value.to_string().as_bytes());
    }

    /// Writes a `float32` using its shortest round-tripping form.
    pub fn write_f32(&mut self, value: f32) {
        if !value.is_finite() {
            self.report_error(
                "WriteFloat32",
                format!("unsupported value: {value}"),
            );
            return;
        }
        self.write_float_text(&value.to_string());
    }

    /// Writes a `float64` using its shortest round-tripping form.
    pub fn write_f64(&mut self, value: f64) {
        if !value.is_finite() {
            self.report_error(
                "WriteFloat64",
                format!("unsupported value: {value}"),
            );
            return;
        }
        self.write_float_text(&value.to_string());
    }

    fn write_float_text(&mut self, text: &str) {
        // `Display` never uses exponents; integral floats print without a
        // fraction, which is valid JSON as is.
        self.buf.extend_from_slice(text.as_bytes());
    }

    /// Writes a string literal, escaping as needed.
    pub fn write_string(&mut self, value: &str) {
        self.buf.push(b'"');
        let bytes = value.as_bytes();
        let mut start = 0;
        for (at, &byte) in bytes.iter().enumerate() {
            let escaped: &[u8] = match byte {
                b'"' => b"\\\"",
                b'\\' => b"\\\\",
                b'\n' => b"\\n",
                b'\r' => b"\\r",
                b'\t' => b"\\t",
                b'<' | b'>' | b'&' if self.escape_html => &[],
                0..0x20 => &[],
                _ => continue,
            };
            self.buf.extend_from_slice(&bytes[start..at]);
            if escaped.is_empty() {
                self.buf.extend_from_slice(b"\\u00");
                self.buf.push(HEX[usize::from(byte >> 4)]);
                self.buf.push(HEX[usize::from(byte & 0xF)]);
            } else {
                self.buf.extend_from_slice(escaped);
            }
            start = at + 1;
        }
        self.buf.extend_from_slice(&bytes[start..]);
        self.buf.push(b'"');
    }

    /// Appends already-encoded JSON verbatim.
    pub fn write_raw(&mut self, raw: &[u8]) { self.buf.extend_from_slice(raw); }

    /// Writes `[`.
    pub fn write_array_start(&mut self) { self.buf.push(b'['); }

    /// Writes the separator between two elements or entries.
    pub fn write_more(&mut self) { self.buf.push(b','); }

    /// Writes `]`.
    pub fn write_array_end(&mut self) { self.buf.push(b']'); }

    /// Writes `{`.
    pub fn write_object_start(&mut self) { self.buf.push(b'{'); }

    /// Writes an object key followed by `:`.
    pub fn write_object_field(&mut self, name: &str) {
        self.write_string(name);
        self.buf.push(b':');
    }

    /// Writes `}`.
    pub fn write_object_end(&mut self) { self.buf.push(b'}'); }
}

#[cfg(test)]
mod test {
    use super::Writer;
    use crate::Error;

    fn written(escape_html: bool, f: impl FnOnce(&mut Writer)) -> String {
        let mut writer = Writer::new(escape_html);
        f(&mut writer);
        assert_eq!(writer.error, None);
        String::from_utf8(writer.into_bytes()).unwrap()
    }

    #[test]
    fn strings_are_escaped() {
        assert_eq!(
            written(false, |w| w.write_string("a\"b\\c\n\u{1}<")),
            r#""a\"b\\c\n\u0001<""#
        );
        assert_eq!(
            written(true, |w| w.write_string("<a&b>")),
            r#""\u003ca\u0026b\u003e""#
        );
        assert_eq!(written(true, |w| w.write_string("héllo")), "\"héllo\"");
    }

    #[test]
    fn containers() {
        let json = written(true, |w| {
            w.write_object_start();
            w.write_object_field("a");
            w.write_array_start();
            w.write_i64(-1);
            w.write_more();
            w.write_u64(2);
            w.write_more();
            w.write_f64(0.5);
            w.write_array_end();
            w.write_more();
            w.write_object_field("b");
            w.write_null();
            w.write_object_end();
        });

        assert_eq!(json, r#"{"a":[-1,2,0.5],"b":null}"#);
    }

    #[test]
    fn non_finite_floats_are_errors() {
        let mut writer = Writer::new(true);
        writer.write_f64(f64::NAN);
        writer.write_f32(f32::INFINITY);

        assert!(matches!(
            writer.error,
            Some(Error::Mismatch { operation: "WriteFloat64", .. })
        ));
        assert!(writer.buffer().is_empty());
    }
}
