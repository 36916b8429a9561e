//! Configuration of a [`Json`] instance.
//!
//! A [`Config`] is a plain builder. [`Config::build`] freezes it into a
//! [`Json`] handle that owns its own codec caches, so two instances built
//! from different configurations never share codecs.
//!
//! ```ignore
//! use std::time::Duration;
//!
//! let json = Config::default()
//!     .with_sort_map_keys(true)
//!     .with_placeholder_timeout(Duration::from_secs(5))
//!     .build();
//! ```

use std::{fmt, sync::Arc, time::Duration};

use swiftjson_stream::DEFAULT_MAX_DEPTH;

use crate::{Json, extension::Extension};

/// Settings frozen into a [`Json`] instance.
#[derive(Clone)]
pub struct Config {
    sort_map_keys: bool,
    escape_html: bool,
    use_number: bool,
    max_depth: usize,
    placeholder_timeout: Duration,
    extensions: Vec<Arc<dyn Extension>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sort_map_keys: false,
            escape_html: true,
            use_number: false,
            max_depth: DEFAULT_MAX_DEPTH,
            placeholder_timeout: Duration::from_secs(30),
            extensions: Vec::new(),
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("sort_map_keys", &self.sort_map_keys)
            .field("escape_html", &self.escape_html)
            .field("use_number", &self.use_number)
            .field("max_depth", &self.max_depth)
            .field("placeholder_timeout", &self.placeholder_timeout)
            .field("extensions", &self.extensions.len())
            .finish()
    }
}

impl Config {
    /// Writes map entries ordered by their key text.
    #[must_use]
    pub fn with_sort_map_keys(mut self, sort_map_keys: bool) -> Self {
        self.sort_map_keys = sort_map_keys;
        self
    }

    /// Escapes `<`, `>` and `&` inside strings.
    #[must_use]
    pub fn with_escape_html(mut self, escape_html: bool) -> Self {
        self.escape_html = escape_html;
        self
    }

    /// Decodes numbers into `interface {}` as `json.Number` instead of
    /// `float64`.
    #[must_use]
    pub fn with_use_number(mut self, use_number: bool) -> Self {
        self.use_number = use_number;
        self
    }

    /// How deeply arrays and objects may nest in decoded input.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// How long a placeholder codec waits for the construction it stands
    /// in for before giving up with a panic.
    #[must_use]
    pub fn with_placeholder_timeout(mut self, timeout: Duration) -> Self {
        self.placeholder_timeout = timeout;
        self
    }

    /// Appends an extension. Extensions run in registration order.
    #[must_use]
    pub fn with_extension(mut self, extension: impl Extension) -> Self {
        self.extensions.push(Arc::new(extension));
        self
    }

    /// Whether map entries are sorted by key text.
    #[must_use]
    pub const fn sort_map_keys(&self) -> bool { self.sort_map_keys }

    /// Whether HTML-significant characters are escaped.
    #[must_use]
    pub const fn escape_html(&self) -> bool { self.escape_html }

    /// Whether dynamic numbers decode as `json.Number`.
    #[must_use]
    pub const fn use_number(&self) -> bool { self.use_number }

    /// The nesting limit for decoded input.
    #[must_use]
    pub const fn max_depth(&self) -> usize { self.max_depth }

    /// The placeholder wait budget.
    #[must_use]
    pub const fn placeholder_timeout(&self) -> Duration {
        self.placeholder_timeout
    }

    /// The registered extensions, in order.
    #[must_use]
    pub fn extensions(&self) -> &[Arc<dyn Extension>] { &self.extensions }

    /// Freezes the configuration.
    #[must_use]
    pub fn build(self) -> Json { Json::new(self) }
}
