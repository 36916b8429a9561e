//! The JSON input source.

use crate::error::Error;

/// The type of the next JSON value in the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Token {
    /// `null`
    Null,
    /// `true` or `false`
    Bool,
    /// A number literal.
    Number,
    /// A string literal.
    String,
    /// `[`
    Array,
    /// `{`
    Object,
    /// Anything else, including the end of input.
    Invalid,
}

/// How deeply arrays and objects may nest unless
/// [`Reader::with_max_depth`] says otherwise.
pub const DEFAULT_MAX_DEPTH: usize = 512;

/// A pull reader over a complete JSON document.
///
/// Every primitive reports failures through the public [`error`] field
/// instead of returning them: the first error sticks, and once it is set all
/// further reads are no-ops that return default values. Codecs therefore
/// never unwind on bad input; the caller inspects `error` after the
/// top-level decode returns.
///
/// [`error`]: Self::error
#[derive(Debug)]
pub struct Reader<'a> {
    input: &'a [u8],
    head: usize,
    depth: usize,
    max_depth: usize,

    /// The first error encountered, if any.
    pub error: Option<Error>,
}

impl<'a> Reader<'a> {
    /// Creates a reader over `input`.
    #[must_use]
    pub const fn new(input: &'a [u8]) -> Self {
        Self {
            input,
            head: 0,
            depth: 0,
            max_depth: DEFAULT_MAX_DEPTH,
            error: None,
        }
    }

    /// Limits how deeply arrays and objects may nest. Deeper input is a
    /// syntax error rather than unbounded recursion in the codecs.
    #[must_use]
    pub const fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// The current byte offset.
    #[must_use]
    pub const fn offset(&self) -> usize { self.head }

    /// Records a syntax error at the current offset unless an error is
    /// already recorded.
    pub fn report_error(
        &mut self,
        operation: &'static str,
        message: impl Into<String>,
    ) {
        if self.error.is_none() {
            self.error = Some(Error::Syntax {
                operation,
                message: message.into(),
                offset: self.head,
            });
        }
    }

    /// Records `error` unless an error is already recorded.
    pub fn set_error(&mut self, error: Error) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }

    /// Reports an error if anything but whitespace remains.
    pub fn expect_end(&mut self) {
        if self.error.is_none() && self.peek_byte().is_some() {
            let found = self.found();
            self.report_error(
                "ReadEnd",
                format!("expect end of input, {found}"),
            );
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(b' ' | b'\n' | b'\t' | b'\r') = self.input.get(self.head)
        {
            self.head += 1;
        }
    }

    fn peek_byte(&mut self) -> Option<u8> {
        self.skip_whitespace();
        self.input.get(self.head).copied()
    }

    fn next_byte(&mut self) -> Option<u8> {
        let byte = self.peek_byte()?;
        self.head += 1;
        Some(byte)
    }

    fn found(&mut self) -> String {
        match self.peek_byte() {
            Some(byte) => format!("but found {:?}", char::from(byte)),
            None => "but reached end of input".to_owned(),
        }
    }

    /// Peeks at the type of the next value without consuming it.
    pub fn what_is_next(&mut self) -> Token {
        match self.peek_byte() {
            Some(b'n') => Token::Null,
            Some(b't' | b'f') => Token::Bool,
            Some(b'"') => Token::String,
            Some(b'-' | b'0'..=b'9') => Token::Number,
            Some(b'[') => Token::Array,
            Some(b'{') => Token::Object,
            _ => Token::Invalid,
        }
    }

    fn expect_literal(&mut self, operation: &'static str, literal: &[u8]) {
        if self.input[self.head..].starts_with(literal) {
            self.head += literal.len();
        } else {
            self.report_error(
                operation,
                format!("expect {}", String::from_utf8_lossy(literal)),
            );
        }
    }

    /// Consumes `null` if it is the next value.
    pub fn read_null(&mut self) -> bool {
        if self.error.is_some() || self.peek_byte() != Some(b'n') {
            return false;
        }
        self.expect_literal("ReadNull", b"null");
        self.error.is_none()
    }

    /// Reads `true` or `false`.
    pub fn read_bool(&mut self) -> bool {
        if self.error.is_some() {
            return false;
        }
        match self.peek_byte() {
            Some(b't') => {
                self.expect_literal("ReadBool", b"true");
                self.error.is_none()
            }
            Some(b'f') => {
                self.expect_literal("ReadBool", b"false");
                false
            }
            _ => {
                let found = self.found();
                self.report_error(
                    "ReadBool",
                    format!("expect true or false, {found}"),
                );
                false
            }
        }
    }

    /// Reads a number literal and returns its exact text.
    pub fn read_number_text(&mut self) -> &'a str {
        if self.error.is_some() {
            return "";
        }
        self.skip_whitespace();
        let start = self.head;
        let input = self.input;
        let digits = |mut at: usize| {
            while input.get(at).is_some_and(u8::is_ascii_digit) {
                at += 1;
            }
            at
        };

        let mut at = start;
        if input.get(at) == Some(&b'-') {
            at += 1;
        }
        match input.get(at) {
            Some(b'0') => at += 1,
            Some(b'1'..=b'9') => at = digits(at),
            _ => {
                let found = self.found();
                self.report_error(
                    "ReadNumber",
                    format!("expect a number, {found}"),
                );
                return "";
            }
        }
        if input.get(at) == Some(&b'.') {
            let end = digits(at + 1);
            if end == at + 1 {
                self.head = end;
                self.report_error("ReadNumber", "expect digits after '.'");
                return "";
            }
            at = end;
        }
        if let Some(b'e' | b'E') = input.get(at) {
            at += 1;
            if let Some(b'+' | b'-') = input.get(at) {
                at += 1;
            }
            let end = digits(at);
            if end == at {
                self.head = end;
                self.report_error("ReadNumber", "expect digits in exponent");
                return "";
            }
            at = end;
        }

        self.head = at;
        // the scanned range is ASCII only
        std::str::from_utf8(&input[start..at]).unwrap_or_default()
    }

    /// Reads a signed integer.
    pub fn read_i64(&mut self) -> i64 {
        let text = self.read_number_text();
        if self.error.is_some() {
            return 0;
        }
        text.parse().unwrap_or_else(|_| {
            self.report_error(
                "ReadInt64",
                format!("{text} is not a 64-bit signed integer"),
            );
            0
        })
    }

    /// Reads an unsigned integer.
    pub fn read_u64(&mut self) -> u64 {
        let text = self.read_number_text();
        if self.error.is_some() {
            return 0;
        }
        text.parse().unwrap_or_else(|_| {
            self.report_error(
                "ReadUint64",
                format!("{text} is not a 64-bit unsigned integer"),
            );
            0
        })
    }

    /// Reads a floating point number.
    pub fn read_f64(&mut self) -> f64 {
        let text = self.read_number_text();
        if self.error.is_some() {
            return 0.0;
        }
        text.parse().unwrap_or_else(|_| {
            self.report_error("ReadFloat64", format!("{text} is out of range"));
            0.0
        })
    }

    /// Reads a string literal, resolving escapes.
    pub fn read_string(&mut self) -> String {
        if self.error.is_some() {
            return String::new();
        }
        if self.peek_byte() != Some(b'"') {
            let found = self.found();
            self.report_error("ReadString", format!("expect \", {found}"));
            return String::new();
        }
        self.head += 1;

        let mut bytes = Vec::new();
        loop {
            let Some(&byte) = self.input.get(self.head) else {
                self.report_error("ReadString", "unterminated string");
                return String::new();
            };
            self.head += 1;
            match byte {
                b'"' => break,
                b'\\' => {
                    if !self.read_escape(&mut bytes) {
                        return String::new();
                    }
                }
                0..0x20 => {
                    self.head -= 1;
                    self.report_error(
                        "ReadString",
                        "control character in string",
                    );
                    return String::new();
                }
                _ => bytes.push(byte),
            }
        }

        String::from_utf8(bytes).unwrap_or_else(|invalid| {
            self.report_error(
                "ReadString",
                format!("invalid UTF-8 in string: {}", invalid.utf8_error()),
            );
            String::new()
        })
    }

    fn read_escape(&mut self, out: &mut Vec<u8>) -> bool {
        let Some(&escape) = self.input.get(self.head) else {
            self.report_error("ReadString", "unterminated escape");
            return false;
        };
        self.head += 1;
        let simple = match escape {
            b'"' => b'"',
            b'\\' => b'\\',
            b'/' => b'/',
            b'b' => 0x08,
            b'f' => 0x0c,
            b'n' => b'\n',
            b'r' => b'\r',
            b't' => b'\t',
            b'u' => {
                let Some(unit) = self.read_hex4() else { return false };
                let c = if (0xD800..0xDC00).contains(&unit) {
                    self.read_low_surrogate(unit)
                } else {
                    char::from_u32(u32::from(unit))
                };
                let c = c.unwrap_or(char::REPLACEMENT_CHARACTER);
                out.extend_from_slice(c.encode_utf8(&mut [0; 4]).as_bytes());
                return true;
            }
            other => {
                self.report_error(
                    "ReadString",
                    format!("invalid escape \\{}", char::from(other)),
                );
                return false;
            }
        };
        out.push(simple);
        true
    }

    fn read_low_surrogate(&mut self, high: u16) -> Option<char> {
        if !self.input[self.head..].starts_with(b"\\u") {
            return None;
        }
        let saved = self.head;
        self.head += 2;
        let low = self.read_hex4()?;
        if !(0xDC00..0xE000).contains(&low) {
            self.head = saved;
            return None;
        }
        let code = 0x10000
            + ((u32::from(high) - 0xD800) << 10)
            + (u32::from(low) - 0xDC00);
        char::from_u32(code)
    }

    fn read_hex4(&mut self) -> Option<u16> {
        let digits = self.input.get(self.head..self.head + 4);
        let unit = digits
            .and_then(|digits| std::str::from_utf8(digits).ok())
            .and_then(|digits| u16::from_str_radix(digits, 16).ok());
        if unit.is_some() {
            self.head += 4;
        } else {
            self.report_error("ReadString", "expect 4 hex digits after \\u");
        }
        unit
    }

    fn descend(&mut self, operation: &'static str) -> bool {
        if self.depth >= self.max_depth {
            self.report_error(
                operation,
                format!("nesting exceeds {} levels", self.max_depth),
            );
            return false;
        }
        self.depth += 1;
        true
    }

    /// Reads an array, calling `each` once per element with the reader
    /// positioned at the element. `each` must consume exactly one value and
    /// may return `false` to stop early.
    ///
    /// Returns `true` if the whole array was read without error.
    pub fn read_array(&mut self, each: impl FnMut(&mut Self) -> bool) -> bool {
        if self.error.is_some() {
            return false;
        }
        if self.peek_byte() != Some(b'[') {
            let found = self.found();
            self.report_error("ReadArray", format!("expect [ or n, {found}"));
            return false;
        }
        if !self.descend("ReadArray") {
            return false;
        }
        let complete = self.array_elements(each);
        self.depth -= 1;
        complete
    }

    fn array_elements(
        &mut self,
        mut each: impl FnMut(&mut Self) -> bool,
    ) -> bool {
        self.head += 1;
        if self.peek_byte() == Some(b']') {
            self.head += 1;
            return true;
        }

        loop {
            if !each(self) || self.error.is_some() {
                return false;
            }
            match self.next_byte() {
                Some(b',') => {}
                Some(b']') => return true,
                _ => {
                    self.head = self.head.saturating_sub(1);
                    let found = self.found();
                    self.report_error(
                        "ReadArray",
                        format!("expect , or ], {found}"),
                    );
                    return false;
                }
            }
        }
    }

    /// Reads an object, calling `each` once per entry with the decoded key
    /// and the reader positioned at the entry's value. `each` must consume
    /// exactly one value and may return `false` to stop early.
    ///
    /// Returns `true` if the whole object was read without error.
    pub fn read_object(
        &mut self,
        each: impl FnMut(&mut Self, String) -> bool,
    ) -> bool {
        if self.error.is_some() {
            return false;
        }
        if self.peek_byte() != Some(b'{') {
            let found = self.found();
            self.report_error("ReadObject", format!("expect {{ or n, {found}"));
            return false;
        }
        if !self.descend("ReadObject") {
            return false;
        }
        let complete = self.object_entries(each);
        self.depth -= 1;
        complete
    }

    fn object_entries(
        &mut self,
        mut each: impl FnMut(&mut Self, String) -> bool,
    ) -> bool {
        self.head += 1;
        if self.peek_byte() == Some(b'}') {
            self.head += 1;
            return true;
        }

        loop {
            let key = self.read_string();
            if self.error.is_some() {
                return false;
            }
            if self.next_byte() != Some(b':') {
                self.head = self.head.saturating_sub(1);
                let found = self.found();
                self.report_error("ReadObject", format!("expect :, {found}"));
                return false;
            }
            if !each(self, key) || self.error.is_some() {
                return false;
            }
            match self.next_byte() {
                Some(b',') => {}
                Some(b'}') => return true,
                _ => {
                    self.head = self.head.saturating_sub(1);
                    let found = self.found();
                    self.report_error(
                        "ReadObject",
                        format!("expect , or }}, {found}"),
                    );
                    return false;
                }
            }
        }
    }

    /// Skips the next value.
    pub fn skip(&mut self) {
        match self.what_is_next() {
            Token::Null => {
                self.read_null();
            }
            Token::Bool => {
                self.read_bool();
            }
            Token::Number => {
                self.read_number_text();
            }
            Token::String => {
                self.read_string();
            }
            Token::Array => {
                self.read_array(|reader| {
                    reader.skip();
                    true
                });
            }
            Token::Object => {
                self.read_object(|reader, _| {
                    reader.skip();
                    true
                });
            }
            Token::Invalid => {
                let found = self.found();
                self.report_error("Skip", format!("expect a value, {found}"));
            }
        }
    }

    /// Skips the next value and returns its raw text verbatim.
    pub fn read_raw(&mut self) -> &'a [u8] {
        self.skip_whitespace();
        let start = self.head;
        self.skip();
        if self.error.is_some() {
            return &[];
        }
        &self.input[start..self.head]
    }
}
