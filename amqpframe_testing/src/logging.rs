//! Log capture for the warnings `amqpframe` emits while it drops frames,
//! abandons deliveries or swallows a best-effort failure.
//!
//! `logtest` installs a single process-wide logger, so tests that assert on
//! log output take turns through [`LoggerHandle`].

use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};

use log::Level;
use logtest::{Logger, Record};
use rstest::fixture;

static CAPTURE: OnceLock<Mutex<Logger>> = OnceLock::new();

/// Exclusive claim on the captured log records.
///
/// Records logged before the claim are discarded, and other tests block
/// until the handle is dropped.
pub struct LoggerHandle {
    records: MutexGuard<'static, Logger>,
}

impl LoggerHandle {
    /// Wait for the capture and start from an empty backlog.
    ///
    /// A test that panicked while holding the capture does not poison it for
    /// the rest of the suite.
    pub fn new() -> Self {
        let records = CAPTURE
            .get_or_init(|| Mutex::new(Logger::start()))
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let mut handle = Self { records };
        handle.clear();
        handle
    }

    /// Forget everything captured so far.
    pub fn clear(&mut self) { while self.records.pop().is_some() {} }

    /// Take the captured messages logged at exactly `level`, oldest first.
    /// Records at other levels are dropped.
    pub fn messages_at(&mut self, level: Level) -> Vec<String> {
        std::iter::from_fn(|| self.records.pop())
            .filter(|record: &Record| record.level() == level)
            .map(|record| record.args().to_owned())
            .collect()
    }
}

impl Default for LoggerHandle {
    fn default() -> Self { Self::new() }
}

#[allow(
    unused_braces,
    reason = "rustc false positive for single line rstest fixtures"
)]
#[fixture]
pub fn logger() -> LoggerHandle { LoggerHandle::new() }
