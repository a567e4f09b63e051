//! Age-based leaf strategies. These are the only strategies that mark stacks.

use chrono::{DateTime, FixedOffset, SecondsFormat, TimeDelta, Utc};

use crate::core::stack::{Mark, Stack};
use crate::core::strategy::Strategy;
use crate::core::timestamp::{format_delta, parse_timestamp};

/// Selects stacks whose expiry tag holds a timestamp at or before the compare time.
///
/// A missing or unparseable tag never selects: ambiguous data must not delete.
#[derive(Debug, Clone)]
pub struct ExpirationTag {
    tag_name: String,
    compare_time: DateTime<Utc>,
}

impl ExpirationTag {
    /// Compare against the current time.
    pub fn new(tag_name: impl Into<String>) -> Self {
        Self::with_compare_time(tag_name, Utc::now())
    }

    pub fn with_compare_time(tag_name: impl Into<String>, compare_time: DateTime<Utc>) -> Self {
        Self {
            tag_name: tag_name.into(),
            compare_time,
        }
    }

    pub fn tag_name(&self) -> &str {
        &self.tag_name
    }

    fn expiry(&self, stack: &Stack) -> Option<DateTime<FixedOffset>> {
        stack.tag(&self.tag_name).and_then(parse_timestamp)
    }

    fn reason(&self, expiry: DateTime<FixedOffset>) -> String {
        let days = (self.compare_time - expiry.with_timezone(&Utc)).num_days();
        format!(
            "expired {days} days ago (expiry: {})",
            expiry.to_rfc3339_opts(SecondsFormat::Secs, false)
        )
    }
}

impl Strategy for ExpirationTag {
    fn should_remove(&mut self, stack: &mut Stack) -> bool {
        let Some(expiry) = self.expiry(stack) else {
            return false;
        };
        if expiry.with_timezone(&Utc) > self.compare_time {
            return false;
        }
        stack.mark(Mark::new(self.describe(), self.reason(expiry)));
        true
    }

    fn describe(&self) -> String {
        format!("ExpirationTag({})", self.tag_name)
    }

    fn mark_reason(&self, stack: &Stack) -> Option<String> {
        self.expiry(stack).map(|expiry| self.reason(expiry))
    }
}

/// Selects stacks not updated within `allowed_delta` of the compare time.
#[derive(Debug, Clone)]
pub struct LastUpdatedAge {
    allowed_delta: TimeDelta,
    compare_time: DateTime<Utc>,
}

impl LastUpdatedAge {
    pub fn new(allowed_delta: TimeDelta) -> Self {
        Self::with_compare_time(allowed_delta, Utc::now())
    }

    pub fn with_compare_time(allowed_delta: TimeDelta, compare_time: DateTime<Utc>) -> Self {
        Self {
            allowed_delta,
            compare_time,
        }
    }

    pub fn allowed_delta(&self) -> TimeDelta {
        self.allowed_delta
    }
}

impl Strategy for LastUpdatedAge {
    fn should_remove(&mut self, stack: &mut Stack) -> bool {
        // A threshold past the end of the calendar is never reached.
        match stack.last_updated_at.checked_add_signed(self.allowed_delta) {
            Some(threshold) if threshold <= self.compare_time => {}
            _ => return false,
        }
        if let Some(reason) = self.mark_reason(stack) {
            stack.mark(Mark::new(self.describe(), reason));
        }
        true
    }

    fn describe(&self) -> String {
        format!("LastUpdatedAge({})", format_delta(self.allowed_delta))
    }

    fn mark_reason(&self, stack: &Stack) -> Option<String> {
        let age = self.compare_time - stack.last_updated_at;
        Some(format!(
            "last updated {} days ago (threshold: {}, last updated: {})",
            age.num_days(),
            format_delta(self.allowed_delta),
            stack.last_updated_at.format("%Y-%m-%d")
        ))
    }
}
