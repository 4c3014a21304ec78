use std::time::Duration;

use log::LevelFilter;

use crate::consistency::Consistency;

/// Log settings for the allocating round-trips into the driver runtime.
#[derive(Clone, Debug)]
#[non_exhaustive]
pub struct LogSettings {
    pub allocations_level: LevelFilter,
    pub slow_allocations_level: LevelFilter,
    pub slow_allocations_duration: Duration,
}

impl Default for LogSettings {
    fn default() -> Self {
        LogSettings {
            allocations_level: LevelFilter::Debug,
            slow_allocations_level: LevelFilter::Warn,
            slow_allocations_duration: Duration::from_secs(1),
        }
    }
}

impl LogSettings {
    pub fn log_allocations(&mut self, level: LevelFilter) {
        self.allocations_level = level;
    }

    pub fn log_slow_allocations(&mut self, level: LevelFilter, duration: Duration) {
        self.slow_allocations_level = level;
        self.slow_allocations_duration = duration;
    }
}

/// Options applied when a [`Statement`] is built from literal query text,
/// or when a [`PreparedQuery`] derives statements.
///
/// ```rust
/// # use cqlx_core::{Consistency, StatementOptions};
/// use log::LevelFilter;
///
/// let options = StatementOptions::new()
///     .consistency(Consistency::LocalQuorum)
///     .log_allocations(LevelFilter::Trace);
/// ```
///
/// [`Statement`]: crate::statement::Statement
/// [`PreparedQuery`]: crate::prepared::PreparedQuery
#[derive(Clone, Debug, Default)]
pub struct StatementOptions {
    pub(crate) consistency: Consistency,
    pub(crate) log_settings: LogSettings,
}

impl StatementOptions {
    /// Construct `Self` with default options.
    ///
    /// The default consistency level is [`Consistency::Quorum`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the consistency level applied to statements built from literal query text.
    ///
    /// Statements derived from a prepared query keep whatever policy is baked into the
    /// template and ignore this value.
    pub fn consistency(mut self, consistency: Consistency) -> Self {
        self.consistency = consistency;
        self
    }

    /// Log each allocation at the given level. Defaults to `Debug`.
    pub fn log_allocations(mut self, level: LevelFilter) -> Self {
        self.log_settings.log_allocations(level);
        self
    }

    /// Log allocations that take longer than `duration` at `level`.
    /// Defaults to `Warn` after one second.
    pub fn log_slow_allocations(mut self, level: LevelFilter, duration: Duration) -> Self {
        self.log_settings.log_slow_allocations(level, duration);
        self
    }

    /// Disable allocation logging entirely.
    pub fn disable_allocation_logging(self) -> Self {
        self.log_allocations(LevelFilter::Off)
            .log_slow_allocations(LevelFilter::Off, Duration::default())
    }

    pub fn get_consistency(&self) -> Consistency {
        self.consistency
    }

    pub fn get_log_settings(&self) -> &LogSettings {
        &self.log_settings
    }
}
