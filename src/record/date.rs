//! Validity timestamp in the `YYYYMMDDhhmmss±H` wire form

use chrono::{DateTime, FixedOffset, Offset, TimeZone};
use std::fmt;

/// Moment after which a payment code must be considered unusable.
///
/// The wall clock part is printed in the timestamp's own offset. The offset is
/// written in whole hours with no leading zero (`+0`, `+2`, `-1`, `+11`);
/// minutes of the offset are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidityDate(DateTime<FixedOffset>);

impl ValidityDate {
    /// Wrap a timestamp of any time zone, keeping its offset.
    pub fn new<Tz: TimeZone>(at: &DateTime<Tz>) -> Self {
        Self(at.with_timezone(&at.offset().fix()))
    }

    /// The wrapped timestamp
    pub fn as_datetime(&self) -> DateTime<FixedOffset> {
        self.0
    }
}

impl fmt::Display for ValidityDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let offset_minutes = self.0.offset().local_minus_utc() / 60;
        let sign = if offset_minutes < 0 { '-' } else { '+' };
        let hours = offset_minutes.abs() / 60;
        write!(f, "{}{}{}", self.0.format("%Y%m%d%H%M%S"), sign, hours)
    }
}
