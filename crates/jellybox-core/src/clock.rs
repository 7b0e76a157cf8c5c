//! Tick accrual for box settlement.
//!
//! A tick is one elapsed hour since the box was last refreshed. Long
//! absences are throttled so a returning user's settlement stays bounded.
//! All functions here are pure.

use chrono::{DateTime, TimeDelta, Utc};

use crate::config::AccrualConfig;

/// Seconds in one tick.
pub const SECONDS_PER_TICK: i64 = 3600;

/// Result of an accrual check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Accrual {
    /// Whether at least one tick has elapsed.
    pub due: bool,
    /// Ticks to simulate, after throttling.
    pub ticks: u32,
}

impl Accrual {
    /// Nothing to settle.
    pub const NOT_DUE: Self = Self {
        due: false,
        ticks: 0,
    };
}

/// Whole hours between `from` and `to`. Negative spans count as zero.
pub fn elapsed_hours(from: DateTime<Utc>, to: DateTime<Utc>) -> i64 {
    to.signed_duration_since(from)
        .num_seconds()
        .checked_div(SECONDS_PER_TICK)
        .unwrap_or(0)
        .max(0)
}

/// Compute whether a settlement is due and how many ticks it covers.
///
/// Raw ticks above `long_absence_hours` clamp to `long_absence_ticks`;
/// above `absence_hours` they clamp to `absence_ticks`. The privileged
/// account is always due with `test_account_ticks`.
pub fn compute_ticks(
    last_refresh: DateTime<Utc>,
    now: DateTime<Utc>,
    privileged: bool,
    config: &AccrualConfig,
) -> Accrual {
    if privileged {
        return Accrual {
            due: true,
            ticks: config.test_account_ticks,
        };
    }

    let raw = elapsed_hours(last_refresh, now);
    if raw < 1 {
        return Accrual::NOT_DUE;
    }

    let ticks = if raw > i64::from(config.long_absence_hours) {
        config.long_absence_ticks
    } else if raw > i64::from(config.absence_hours) {
        config.absence_ticks
    } else {
        u32::try_from(raw).unwrap_or(config.absence_ticks)
    };

    Accrual { due: true, ticks }
}

/// Snap `at` down to the start of its UTC hour.
pub fn truncate_to_hour(at: DateTime<Utc>) -> DateTime<Utc> {
    let seconds = at.timestamp();
    let snapped = seconds.saturating_sub(seconds.rem_euclid(SECONDS_PER_TICK));
    DateTime::from_timestamp(snapped, 0).unwrap_or(at)
}

/// `now` moved back by `hours`, saturating at the earliest representable
/// instant.
pub fn backdate(now: DateTime<Utc>, hours: u32) -> DateTime<Utc> {
    TimeDelta::try_hours(i64::from(hours))
        .and_then(|delta| now.checked_sub_signed(delta))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, hour, minute, 0).unwrap()
    }

    fn hours_later(base: DateTime<Utc>, hours: i64) -> DateTime<Utc> {
        base.checked_add_signed(TimeDelta::try_hours(hours).unwrap())
            .unwrap()
    }

    #[test]
    fn under_an_hour_is_not_due() {
        let config = AccrualConfig::default();
        let accrual = compute_ticks(at(10, 0), at(10, 59), false, &config);
        assert_eq!(accrual, Accrual::NOT_DUE);
    }

    #[test]
    fn exactly_one_hour_is_one_tick() {
        let config = AccrualConfig::default();
        let accrual = compute_ticks(at(10, 0), at(11, 0), false, &config);
        assert_eq!(accrual, Accrual { due: true, ticks: 1 });
    }

    #[test]
    fn partial_hours_are_floored() {
        let config = AccrualConfig::default();
        let accrual = compute_ticks(at(10, 0), at(13, 59), false, &config);
        assert_eq!(accrual.ticks, 3);
    }

    #[test]
    fn clamping_tiers() {
        let config = AccrualConfig::default();
        let base = at(0, 0);
        assert_eq!(
            compute_ticks(base, hours_later(base, 200), false, &config).ticks,
            24
        );
        assert_eq!(
            compute_ticks(base, hours_later(base, 100), false, &config).ticks,
            12
        );
        assert_eq!(
            compute_ticks(base, hours_later(base, 50), false, &config).ticks,
            50
        );
        // Boundaries are exclusive.
        assert_eq!(
            compute_ticks(base, hours_later(base, 72), false, &config).ticks,
            72
        );
        assert_eq!(
            compute_ticks(base, hours_later(base, 168), false, &config).ticks,
            12
        );
    }

    #[test]
    fn privileged_is_always_due() {
        let config = AccrualConfig::default();
        let now = at(10, 0);
        let accrual = compute_ticks(now, now, true, &config);
        assert_eq!(accrual, Accrual { due: true, ticks: 10 });
        // Even with a refresh time in the future.
        let accrual = compute_ticks(hours_later(now, 5), now, true, &config);
        assert_eq!(accrual.ticks, 10);
    }

    #[test]
    fn future_refresh_is_not_due() {
        let config = AccrualConfig::default();
        let accrual = compute_ticks(at(12, 0), at(10, 0), false, &config);
        assert!(!accrual.due);
    }

    #[test]
    fn compute_ticks_is_pure() {
        let config = AccrualConfig::default();
        let first = compute_ticks(at(1, 0), at(9, 30), false, &config);
        let second = compute_ticks(at(1, 0), at(9, 30), false, &config);
        assert_eq!(first, second);
    }

    #[test]
    fn truncation_snaps_to_hour() {
        let snapped = truncate_to_hour(Utc.with_ymd_and_hms(2026, 3, 1, 14, 37, 12).unwrap());
        assert_eq!(snapped, at(14, 0));
        assert_eq!(truncate_to_hour(at(14, 0)), at(14, 0));
    }

    #[test]
    fn backdate_moves_back() {
        assert_eq!(backdate(at(10, 0), 2), at(8, 0));
    }
}
