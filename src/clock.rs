//! Clock wrapper.
//!
//! # Responsibilities
//! - Provide the current instant to anything that needs time
//! - Offer a null variant frozen at a caller-chosen instant
//!
//! # Design Decisions
//! - Components receive a `Clock` at construction instead of reading
//!   ambient time, so the null variant substitutes cleanly
//! - Null time only moves when the caller advances it

use chrono::{DateTime, Duration, Utc};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Error type for clock operations.
#[derive(Debug, Error)]
pub enum ClockError {
    /// Only null clocks can be advanced by the caller.
    #[error("can't advance the clock because it isn't a null clock")]
    NotNull,
}

/// Time source with interchangeable production and null variants.
#[derive(Clone)]
pub struct Clock {
    source: Source,
}

#[derive(Clone)]
enum Source {
    System,
    Null(Arc<Mutex<DateTime<Utc>>>),
}

impl Clock {
    /// Clock backed by the real system clock.
    pub fn new() -> Self {
        Self {
            source: Source::System,
        }
    }

    /// Null clock frozen at the Unix epoch.
    pub fn create_null() -> Self {
        Self::create_null_at(DateTime::UNIX_EPOCH)
    }

    /// Null clock frozen at `now`.
    pub fn create_null_at(now: DateTime<Utc>) -> Self {
        Self {
            source: Source::Null(Arc::new(Mutex::new(now))),
        }
    }

    /// The current instant.
    pub fn now(&self) -> DateTime<Utc> {
        match &self.source {
            Source::System => Utc::now(),
            Source::Null(now) => *now.lock().unwrap(),
        }
    }

    /// Move a null clock forward. Fails on the system clock.
    pub fn advance(&self, delta: Duration) -> Result<(), ClockError> {
        match &self.source {
            Source::System => Err(ClockError::NotNull),
            Source::Null(now) => {
                let mut now = now.lock().unwrap();
                *now = *now + delta;
                Ok(())
            }
        }
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}
