//! Calendar source for display-date decisions.

use chrono::{FixedOffset, Local, NaiveDate, Utc};

/// Decides which calendar day "today" is.
///
/// Frames change picture at local midnight, so the clock follows the frame's
/// time zone rather than UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Clock {
    /// The host's local time zone.
    #[default]
    Local,
    /// A fixed UTC offset.
    Offset(FixedOffset),
    /// A pinned date, for tests and replays.
    Fixed(NaiveDate),
}

impl Clock {
    /// Creates a clock from a UTC offset in minutes.
    ///
    /// Returns `None` if the offset is not within ±24 hours.
    #[must_use]
    pub fn from_offset_minutes(minutes: i32) -> Option<Self> {
        FixedOffset::east_opt(minutes.checked_mul(60)?).map(Self::Offset)
    }

    /// The current calendar date.
    #[must_use]
    pub fn today(&self) -> NaiveDate {
        match self {
            Self::Local => Local::now().date_naive(),
            Self::Offset(offset) => Utc::now().with_timezone(offset).date_naive(),
            Self::Fixed(date) => *date,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock() {
        let date = NaiveDate::from_ymd_opt(2023, 5, 1).unwrap();
        assert_eq!(Clock::Fixed(date).today(), date);
    }

    #[test]
    fn test_offset_bounds() {
        assert!(Clock::from_offset_minutes(-300).is_some());
        assert!(Clock::from_offset_minutes(24 * 60).is_none());
        assert!(Clock::from_offset_minutes(i32::MAX).is_none());
    }

    #[test]
    fn test_offset_clock_within_a_day_of_utc() {
        let clock = Clock::from_offset_minutes(-300).unwrap();
        let utc = Utc::now().date_naive();
        let diff = (clock.today() - utc).num_days().abs();
        assert!(diff <= 1);
    }
}
