// Adjustable clock
//
// Volunteers (and testers) can shift the portal's notion of "now" to see
// the schedule as it will be at another moment. The shift is a persisted
// millisecond offset from the system clock.

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, TimeDelta, Utc};
use tracing::{debug, warn};

use crate::error::CoreError;
use crate::notifier::Notifier;
use crate::storage::Storage;

/// Storage key holding the offset in milliseconds.
pub const TIME_OFFSET_KEY: &str = "portal-time-offset";

pub struct Clock {
    storage: Arc<dyn Storage>,
    offset_ms: AtomicI64,
    notifier: Arc<Notifier<DateTime<Utc>>>,
}

impl Clock {
    /// Restore the persisted offset, if any.
    pub fn new(storage: Arc<dyn Storage>, notifier: Arc<Notifier<DateTime<Utc>>>) -> Self {
        let offset_ms = match storage.get(TIME_OFFSET_KEY) {
            None => 0,
            Some(raw) => raw.trim().parse::<i64>().unwrap_or_else(|_| {
                warn!(value = %raw, "discarding invalid time offset");
                if let Err(e) = storage.remove(TIME_OFFSET_KEY) {
                    warn!(error = %e, "cannot clear invalid time offset");
                }
                0
            }),
        };
        if offset_ms != 0 {
            debug!(offset_ms, "time offset restored");
        }

        Self {
            storage,
            offset_ms: AtomicI64::new(offset_ms),
            notifier,
        }
    }

    /// The current time, including any offset.
    pub fn now(&self) -> DateTime<Utc> {
        Utc::now() + self.offset()
    }

    pub fn offset(&self) -> TimeDelta {
        TimeDelta::milliseconds(self.offset_ms.load(Ordering::SeqCst))
    }

    pub fn is_overridden(&self) -> bool {
        self.offset_ms.load(Ordering::SeqCst) != 0
    }

    /// Shift the clock by `offset` relative to system time.
    pub fn set_offset(&self, offset: TimeDelta) -> Result<(), CoreError> {
        let ms = offset.num_milliseconds();
        if ms == 0 {
            self.storage.remove(TIME_OFFSET_KEY)?;
        } else {
            self.storage.set(TIME_OFFSET_KEY, &ms.to_string())?;
        }
        self.offset_ms.store(ms, Ordering::SeqCst);
        debug!(offset_ms = ms, "time offset changed");

        self.notifier.notify(&self.now());
        Ok(())
    }

    /// Shift the clock so that it currently reads `time`.
    pub fn set_time(&self, time: DateTime<Utc>) -> Result<(), CoreError> {
        self.set_offset(time - Utc::now())
    }

    /// Return to system time.
    pub fn reset(&self) -> Result<(), CoreError> {
        self.set_offset(TimeDelta::zero())
    }
}
