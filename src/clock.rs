//! Logical clock.
//!
//! Every place that would otherwise read wall-clock time goes through a
//! [`LogicalClock`], so a pinned clock makes timestamps part of the reproducible
//! input rather than noise.

use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalClock {
    /// Always returns the pinned instant.
    Fixed(DateTime<Utc>),
    /// Reads the system clock.
    System,
}

impl LogicalClock {
    pub fn fixed(at: DateTime<Utc>) -> Self {
        Self::Fixed(at)
    }

    #[inline]
    pub fn now(&self) -> DateTime<Utc> {
        match self {
            Self::Fixed(at) => *at,
            Self::System => Utc::now(),
        }
    }

    /// RFC 3339 rendering of [`now`](Self::now) with second precision.
    pub fn now_rfc3339(&self) -> String {
        self.now()
            .to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
    }

    pub fn is_fixed(&self) -> bool {
        matches!(self, Self::Fixed(_))
    }
}
