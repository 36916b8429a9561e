//! JSON input and output primitives.
//!
//! [`Reader`] pulls values out of a complete document and [`Writer`] appends
//! values to a byte buffer. Neither returns errors from its primitives: both
//! carry a public `error` field holding the first failure, which codecs set
//! and callers inspect once a top-level operation finishes.

pub mod error;
pub mod reader;
pub mod writer;

pub use error::Error;
pub use reader::{DEFAULT_MAX_DEPTH, Reader, Token};
pub use writer::Writer;
