//! Typed schema shared by every screen service.
//!
//! # Responsibility
//! - Define the persisted records of the hosted schema and their enums.
//! - Define joined read models returned to presentation layers.
//!
//! # Invariants
//! - Every record is identified by a stable UUID v4.
//! - Every timestamp is Unix epoch milliseconds.
//! - Counters and coin balances are never negative.

pub mod badge;
pub mod banner;
pub mod engagement;
pub mod enums;
pub mod message;
pub mod notification;
pub mod post;
pub mod profile;
pub mod story;
pub mod tip;
pub mod validation;
pub mod views;

use std::time::{SystemTime, UNIX_EPOCH};

/// One hour in epoch milliseconds.
pub const HOUR_MS: i64 = 60 * 60 * 1000;
/// One day in epoch milliseconds.
pub const DAY_MS: i64 = 24 * HOUR_MS;

/// Returns the current wall-clock time in epoch milliseconds.
///
/// Falls back to `0` if the system clock is before the Unix epoch.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}
