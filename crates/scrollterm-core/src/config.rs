//! Configuration for scrollterm consoles.
//!
//! All tunables are carried by a plain [`ConsoleConfig`] value passed into
//! [`Console::new`](crate::console::Console::new). There is no process-wide
//! configuration state; two consoles in the same process can run with
//! different settings.
//!
//! # Example
//!
//! ```
//! use scrollterm_core::config::ConsoleConfig;
//!
//! let config = ConsoleConfig::builder()
//!     .buffer_bytes(128 * 1024)
//!     .buffer_lines(4096)
//!     .rows(40)
//!     .cols(120)
//!     .build();
//! assert_eq!(config.rows, 40);
//! ```

/// Console configuration settings.
///
/// Bundles the storage ceilings, visible geometry, and editing limits of a
/// console. The storage fields are initial values: the arena can later be
/// grown with [`Console::grow`](crate::console::Console::grow).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleConfig {
    // === Storage ===
    /// Byte capacity of the line arena.
    pub buffer_bytes: usize,

    /// Maximum number of retained lines.
    pub buffer_lines: usize,

    /// Number of oldest lines evicted as one block when room is needed.
    /// Batching amortizes the retained-byte move across many lines.
    pub eviction_shift: usize,

    // === Geometry ===
    /// Visible rows.
    pub rows: usize,

    /// Visible columns.
    pub cols: usize,

    /// Horizontal scroll granularity in columns. Clamping rounds up to a
    /// multiple of this step so the view does not jitter one column at a
    /// time.
    pub hscroll_step: usize,

    // === Editing ===
    /// Tab stop width for output expansion.
    pub tab_width: usize,

    /// Maximum length of one edited input line, including the prompt.
    pub input_line_limit: usize,

    /// Capacity of the pending-keystroke queue.
    pub key_queue_capacity: usize,

    /// Maximum retained command-history entries.
    pub history_size: usize,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            // Storage
            buffer_bytes: 64 * 1024,
            buffer_lines: 1024,
            eviction_shift: 10,
            // Geometry
            rows: 25,
            cols: 80,
            hscroll_step: 5,
            // Editing
            tab_width: 8,
            input_line_limit: 1024,
            key_queue_capacity: 512,
            history_size: 512,
        }
    }
}

impl ConsoleConfig {
    /// Create a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a configuration builder for fluent construction.
    #[must_use]
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }
}

/// Builder for [`ConsoleConfig`] with a fluent API.
///
/// # Example
///
/// ```
/// use scrollterm_core::config::ConsoleConfig;
///
/// let config = ConsoleConfig::builder()
///     .eviction_shift(50)
///     .tab_width(4)
///     .build();
/// assert_eq!(config.eviction_shift, 50);
/// ```
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: ConsoleConfig,
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigBuilder {
    /// Create a builder seeded with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: ConsoleConfig::default(),
        }
    }

    /// Set the arena byte capacity.
    #[must_use]
    pub fn buffer_bytes(mut self, bytes: usize) -> Self {
        self.config.buffer_bytes = bytes;
        self
    }

    /// Set the maximum retained line count.
    #[must_use]
    pub fn buffer_lines(mut self, lines: usize) -> Self {
        self.config.buffer_lines = lines;
        self
    }

    /// Set the eviction block size in lines.
    #[must_use]
    pub fn eviction_shift(mut self, shift: usize) -> Self {
        self.config.eviction_shift = shift;
        self
    }

    /// Set the visible row count.
    #[must_use]
    pub fn rows(mut self, rows: usize) -> Self {
        self.config.rows = rows;
        self
    }

    /// Set the visible column count.
    #[must_use]
    pub fn cols(mut self, cols: usize) -> Self {
        self.config.cols = cols;
        self
    }

    /// Set the horizontal scroll step.
    #[must_use]
    pub fn hscroll_step(mut self, step: usize) -> Self {
        self.config.hscroll_step = step.max(1);
        self
    }

    /// Set the tab stop width.
    #[must_use]
    pub fn tab_width(mut self, width: usize) -> Self {
        self.config.tab_width = width.max(1);
        self
    }

    /// Set the input line length limit.
    #[must_use]
    pub fn input_line_limit(mut self, limit: usize) -> Self {
        self.config.input_line_limit = limit;
        self
    }

    /// Set the keystroke queue capacity.
    #[must_use]
    pub fn key_queue_capacity(mut self, capacity: usize) -> Self {
        self.config.key_queue_capacity = capacity;
        self
    }

    /// Set the history entry ceiling.
    #[must_use]
    pub fn history_size(mut self, size: usize) -> Self {
        self.config.history_size = size;
        self
    }

    /// Build the configuration.
    #[must_use]
    pub fn build(self) -> ConsoleConfig {
        self.config
    }
}
