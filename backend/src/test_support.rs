//! Test utilities for the string manager crate.
//!
//! Shared by unit tests in `src/` and integration tests in `tests/`. Only
//! compiled for tests or with the `test-support` feature.

use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Local, TimeDelta, TimeZone, Utc};
use mockable::Clock;

use crate::domain::{Caller, DisplayName, UserId};

/// Deterministic timestamp used across fixtures.
#[must_use]
pub fn fixture_timestamp() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 14, 9, 30, 0)
        .single()
        .unwrap_or_default()
}

/// Clock that stays put until advanced.
#[derive(Debug)]
pub struct FixtureClock(Mutex<DateTime<Utc>>);

impl FixtureClock {
    /// Start at `now`.
    #[must_use]
    pub fn at(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    /// Start at [`fixture_timestamp`], shared behind the clock trait.
    #[must_use]
    pub fn shared() -> Arc<dyn Clock> {
        Arc::new(Self::at(fixture_timestamp()))
    }

    /// Move the clock forward.
    pub fn advance(&self, seconds: i64) {
        let mut now = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        *now += TimeDelta::seconds(seconds);
    }
}

impl Clock for FixtureClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Caller fixture for a user id.
///
/// # Panics
///
/// Never in practice: the display name is a non-empty literal.
#[must_use]
pub fn caller(user: i64) -> Caller {
    Caller {
        user_id: UserId::new(user),
        display_name: DisplayName::new(format!("User {user}")).unwrap_or_else(|_| {
            unreachable!("fixture display names are never blank")
        }),
    }
}
