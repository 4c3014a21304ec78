use std::fmt::Display;
use std::time::Instant;

use crate::options::LogSettings;

const TARGET: &str = "cqlx::statement";

// `tracing` only accepts a level known at compile time, so every level gets its own arm.
macro_rules! dynamic_level_enabled {
    ($level:expr) => {{
        use ::tracing::Level;

        match $level {
            Level::ERROR => ::tracing::enabled!(target: TARGET, Level::ERROR),
            Level::WARN => ::tracing::enabled!(target: TARGET, Level::WARN),
            Level::INFO => ::tracing::enabled!(target: TARGET, Level::INFO),
            Level::DEBUG => ::tracing::enabled!(target: TARGET, Level::DEBUG),
            Level::TRACE => ::tracing::enabled!(target: TARGET, Level::TRACE),
        }
    }};
}

macro_rules! dynamic_level_event {
    ($level:expr, $($args:tt)*) => {{
        use ::tracing::Level;

        match $level {
            Level::ERROR => ::tracing::event!(target: TARGET, Level::ERROR, $($args)*),
            Level::WARN => ::tracing::event!(target: TARGET, Level::WARN, $($args)*),
            Level::INFO => ::tracing::event!(target: TARGET, Level::INFO, $($args)*),
            Level::DEBUG => ::tracing::event!(target: TARGET, Level::DEBUG, $($args)*),
            Level::TRACE => ::tracing::event!(target: TARGET, Level::TRACE, $($args)*),
        }
    }};
}

/// Splits a configured filter into the matching `tracing` and `log` levels; `None` when off.
pub(crate) fn levels_for(filter: log::LevelFilter) -> Option<(tracing::Level, log::Level)> {
    let level = filter.to_level()?;

    let tracing_level = match level {
        log::Level::Error => tracing::Level::ERROR,
        log::Level::Warn => tracing::Level::WARN,
        log::Level::Info => tracing::Level::INFO,
        log::Level::Debug => tracing::Level::DEBUG,
        log::Level::Trace => tracing::Level::TRACE,
    };

    Some((tracing_level, level))
}

/// Times one allocating round-trip into the driver runtime and logs it when dropped.
///
/// The event reports the arity of the new handle, or the driver's error if the
/// allocation was refused.
pub(crate) struct AllocationLogger<'q> {
    sql: &'q str,
    kind: &'static str,
    arity: Option<usize>,
    error: Option<String>,
    start: Instant,
    settings: LogSettings,
}

impl<'q> AllocationLogger<'q> {
    pub(crate) fn new(sql: &'q str, kind: &'static str, settings: LogSettings) -> Self {
        Self {
            sql,
            kind,
            arity: None,
            error: None,
            start: Instant::now(),
            settings,
        }
    }

    /// Records the parameter count once the runtime has produced the handle.
    pub(crate) fn set_arity(&mut self, arity: usize) {
        self.arity = Some(arity);
    }

    /// Records that the runtime refused the allocation.
    pub(crate) fn set_error(&mut self, error: &dyn Display) {
        self.error = Some(error.to_string());
    }

    fn outcome(&self) -> &'static str {
        if self.error.is_some() {
            "driver refused allocation"
        } else if self.start.elapsed() >= self.settings.slow_allocations_duration {
            "slow allocation: driver round-trip exceeded alert threshold"
        } else {
            "allocation"
        }
    }

    pub(crate) fn finish(&self) {
        let elapsed = self.start.elapsed();

        let was_slow = self.error.is_none() && elapsed >= self.settings.slow_allocations_duration;

        let lvl = if was_slow {
            self.settings.slow_allocations_level
        } else {
            self.settings.allocations_level
        };

        let Some((tracing_level, log_level)) = levels_for(lvl) else {
            return;
        };

        // either a `log` logger or a `tracing` subscriber may be listening
        let enabled =
            log::log_enabled!(target: TARGET, log_level) || dynamic_level_enabled!(tracing_level);
        if !enabled {
            return;
        }

        let mut summary = parse_query_summary(self.sql);

        let sql = if summary != self.sql {
            summary.push_str(" …");
            format!("\n\n{}\n", self.sql)
        } else {
            String::new()
        };

        let outcome = self.outcome();

        if let Some(error) = &self.error {
            dynamic_level_event!(
                tracing_level,
                summary,
                db.statement = sql,
                kind = self.kind,
                error = error.as_str(),
                ?elapsed,
                "{outcome}"
            );
        } else if was_slow {
            dynamic_level_event!(
                tracing_level,
                summary,
                db.statement = sql,
                kind = self.kind,
                arity = self.arity,
                ?elapsed,
                elapsed_secs = elapsed.as_secs_f64(),
                slow_threshold = ?self.settings.slow_allocations_duration,
                "{outcome}"
            );
        } else {
            dynamic_level_event!(
                tracing_level,
                summary,
                db.statement = sql,
                kind = self.kind,
                arity = self.arity,
                ?elapsed,
                elapsed_secs = elapsed.as_secs_f64(),
            );
        }
    }
}

impl Drop for AllocationLogger<'_> {
    fn drop(&mut self) {
        self.finish();
    }
}

pub fn parse_query_summary(sql: &str) -> String {
    // For now, just take the first 4 words
    sql.split_whitespace()
        .take(4)
        .collect::<Vec<&str>>()
        .join(" ")
}
