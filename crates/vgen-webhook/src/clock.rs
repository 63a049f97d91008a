//! Time source for timestamp tolerance and key-set expiry.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;

/// Source of the current unix time in seconds.
pub trait Clock: Send + Sync {
    fn now_seconds(&self) -> i64;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_seconds(&self) -> i64 {
        Utc::now().timestamp()
    }
}

/// Manually driven clock.
#[derive(Debug, Default)]
pub struct FixedClock {
    now: AtomicI64,
}

impl FixedClock {
    pub fn new(now_seconds: i64) -> Self {
        Self {
            now: AtomicI64::new(now_seconds),
        }
    }

    pub fn set(&self, now_seconds: i64) {
        self.now.store(now_seconds, Ordering::SeqCst);
    }

    pub fn advance(&self, seconds: i64) {
        self.now.fetch_add(seconds, Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn now_seconds(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}
