//! # Outbound Ports

use std::time::{SystemTime, UNIX_EPOCH};

/// Clock used to stamp retry-queue entries, in unix milliseconds.
pub trait TimeSource: Send + Sync {
    fn now(&self) -> u64;
}

/// Wall clock. A clock before the epoch reads as 0.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
            .unwrap_or(0)
    }
}

/// Frozen clock for queue tests.
#[cfg(test)]
#[derive(Debug, Clone, Copy)]
pub struct MockTimeSource(pub u64);

#[cfg(test)]
impl MockTimeSource {
    pub fn new(at: u64) -> Self {
        Self(at)
    }
}

#[cfg(test)]
impl TimeSource for MockTimeSource {
    fn now(&self) -> u64 {
        self.0
    }
}
