//! Runtime configuration.

/// When queued re-renders are applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FlushMode {
    /// Event dispatch and [`Runtime::rerender_now`](crate::Runtime::rerender_now) flush before
    /// returning.
    #[default]
    Immediate,
    /// Requests only queue; the host calls [`Runtime::flush`](crate::Runtime::flush), e.g. on
    /// a microtask.
    Deferred,
}

/// Tunables of a [`Runtime`](crate::Runtime).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeConfig {
    flush_mode: FlushMode,
    max_flush_rounds: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            flush_mode: FlushMode::Immediate,
            max_flush_rounds: 32,
        }
    }
}

impl RuntimeConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the flush mode.
    #[must_use]
    pub const fn flush_mode(mut self, mode: FlushMode) -> Self {
        self.flush_mode = mode;
        self
    }

    /// Sets how many rounds a flush may run before giving up.
    ///
    /// A round renders every request queued so far; mount hooks and handlers may queue more
    /// for the next round.
    #[must_use]
    pub const fn max_flush_rounds(mut self, rounds: usize) -> Self {
        self.max_flush_rounds = rounds;
        self
    }

    /// Returns the flush mode.
    #[must_use]
    pub const fn mode(&self) -> FlushMode {
        self.flush_mode
    }

    /// Returns the round limit.
    #[must_use]
    pub const fn round_limit(&self) -> usize {
        self.max_flush_rounds
    }
}
