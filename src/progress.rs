//! Progress reporting during a fill.
//!
//! A reporter is handed a rendered snapshot of the grid before each slot selection, followed by a
//! one-line status naming the slot the search is about to work on. Reporting is
//! purely observational: a reporter error is logged and dropped, and never changes the outcome of
//! the search.

use std::error::Error;

use log::debug;

pub type ReportResult = Result<(), Box<dyn Error + Send + Sync>>;

pub trait ProgressReporter {
    /// Receive a grid snapshot (blocks as `#`, blanks as `.`, one row per line).
    fn update(&mut self, snapshot: &str) -> ReportResult;

    /// Receive a short status line, like "Analyzing 3 down (12 candidates)".
    fn status(&mut self, _message: &str) -> ReportResult {
        Ok(())
    }
}

/// Discards every update.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn update(&mut self, _snapshot: &str) -> ReportResult {
        Ok(())
    }
}

/// Forwards snapshots to the `log` facade at debug level.
#[derive(Debug, Clone, Default)]
pub struct LogProgress {
    updates: u64,
}

impl ProgressReporter for LogProgress {
    fn update(&mut self, snapshot: &str) -> ReportResult {
        self.updates += 1;
        debug!("Fill progress (update {}):\n{snapshot}", self.updates);
        Ok(())
    }

    fn status(&mut self, message: &str) -> ReportResult {
        debug!("{message}");
        Ok(())
    }
}

impl<F> ProgressReporter for F
where
    F: FnMut(&str),
{
    fn update(&mut self, snapshot: &str) -> ReportResult {
        self(snapshot);
        Ok(())
    }
}
