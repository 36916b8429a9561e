//! The error type shared by the reader, the writer and codec resolution.

/// An error recorded on a [`Reader`](crate::Reader) or
/// [`Writer`](crate::Writer), or returned from codec resolution.
///
/// Errors are `Clone` because one construction failure may be reported to
/// every caller that waited on it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The input is not well-formed JSON for the expected shape.
    #[error("{operation}: {message}, error found at byte {offset}")]
    Syntax {
        /// The primitive that failed, e.g. `ReadArray`.
        operation: &'static str,
        /// What was expected or found.
        message: String,
        /// Byte offset into the input.
        offset: usize,
    },

    /// A value does not fit the type it is encoded or decoded as.
    #[error("{operation}: {message}")]
    Mismatch {
        /// The codec operation that failed.
        operation: &'static str,
        /// What went wrong.
        message: String,
    },

    /// A type's own conversion hook failed.
    #[error("{type_name}: {message}")]
    Marshal {
        /// The type whose hook failed.
        type_name: String,
        /// The hook's error message.
        message: String,
    },

    /// No codec can be built for the type.
    #[error("unsupported type: {0}")]
    UnsupportedType(String),

    /// Codec construction failed inside a composite type.
    #[error("{segment}: {source}")]
    Nested {
        /// The path segment: a field name, `[Record]`, `[slice]`, `[map]`,
        /// `[optional]` or `[array]`.
        segment: String,
        /// The failure one level down.
        source: Box<Error>,
    },
}

impl Error {
    /// Prefixes the error with a path segment.
    #[must_use]
    pub fn nested(self, segment: impl Into<String>) -> Self {
        Self::Nested { segment: segment.into(), source: Box::new(self) }
    }

    /// The path segments leading to the innermost error, outermost first.
    #[must_use]
    pub fn path(&self) -> Vec<&str> {
        let mut path = Vec::new();
        let mut current = self;
        while let Self::Nested { segment, source } = current {
            path.push(segment.as_str());
            current = source;
        }
        path
    }

    /// The innermost error beneath all path segments.
    #[must_use]
    pub fn root(&self) -> &Self {
        let mut current = self;
        while let Self::Nested { source, .. } = current {
            current = source;
        }
        current
    }
}

#[cfg(test)]
mod test {
    use super::Error;

    #[test]
    fn nested_errors_compose_their_path() {
        let error = Error::UnsupportedType("chan int".to_owned())
            .nested("[slice]")
            .nested("children")
            .nested("[Tree]");

        assert_eq!(
            error.to_string(),
            "[Tree]: children: [slice]: unsupported type: chan int"
        );
        assert_eq!(error.path(), ["[Tree]", "children", "[slice]"]);
        assert_eq!(
            error.root(),
            &Error::UnsupportedType("chan int".to_owned())
        );
    }
}
