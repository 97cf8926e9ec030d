//! Window boundary arithmetic for the two reset policies.

use chrono::{DateTime, Duration, NaiveTime, TimeZone, Utc};

use sara_domain::config::ResetPolicy;

/// The instant at which a window that began at `window_start` ends.
///
/// * Rolling: `window_start + window`.
/// * Daily UTC: the first `hour:minute` UTC strictly after `window_start`.
pub fn window_end(policy: &ResetPolicy, window_start: DateTime<Utc>) -> DateTime<Utc> {
    match *policy {
        ResetPolicy::Rolling { window_secs } => i64::try_from(window_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .and_then(|window| window_start.checked_add_signed(window))
            .unwrap_or(DateTime::<Utc>::MAX_UTC),
        ResetPolicy::DailyUtc { hour, minute } => {
            let at = NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or_default();
            let candidate = Utc.from_utc_datetime(&window_start.date_naive().and_time(at));
            if candidate > window_start {
                candidate
            } else {
                candidate + Duration::days(1)
            }
        }
    }
}

/// Whether the window that began at `window_start` has ended by `now`.
pub fn is_due(policy: &ResetPolicy, window_start: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    now >= window_end(policy, window_start)
}

/// Next reset instant as seen from `now`, without touching any state.
///
/// If the current window has already ended, the reset that would fire on the
/// next access starts a new window at `now`, so the answer is the end of
/// that window.
pub fn next_reset(
    policy: &ResetPolicy,
    window_start: DateTime<Utc>,
    now: DateTime<Utc>,
) -> DateTime<Utc> {
    if is_due(policy, window_start, now) {
        window_end(policy, now)
    } else {
        window_end(policy, window_start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    const DAY: ResetPolicy = ResetPolicy::Rolling { window_secs: 86_400 };
    const MIDNIGHT: ResetPolicy = ResetPolicy::DailyUtc { hour: 0, minute: 0 };

    #[test]
    fn rolling_window_ends_one_duration_later() {
        let start = at(2024, 3, 10, 15, 20);
        assert_eq!(window_end(&DAY, start), at(2024, 3, 11, 15, 20));
    }

    #[test]
    fn rolling_due_exactly_at_boundary() {
        let start = at(2024, 3, 10, 15, 20);
        assert!(!is_due(&DAY, start, start + Duration::seconds(86_399)));
        assert!(is_due(&DAY, start, start + Duration::seconds(86_400)));
    }

    #[test]
    fn daily_boundary_is_next_occurrence_after_start() {
        assert_eq!(window_end(&MIDNIGHT, at(2024, 3, 10, 23, 0)), at(2024, 3, 11, 0, 0));
        let half_seven = ResetPolicy::DailyUtc { hour: 7, minute: 30 };
        assert_eq!(window_end(&half_seven, at(2024, 3, 10, 6, 0)), at(2024, 3, 10, 7, 30));
        assert_eq!(window_end(&half_seven, at(2024, 3, 10, 8, 0)), at(2024, 3, 11, 7, 30));
    }

    #[test]
    fn daily_boundary_is_strictly_after_start() {
        let start = at(2024, 3, 10, 0, 0);
        assert_eq!(window_end(&MIDNIGHT, start), at(2024, 3, 11, 0, 0));
    }

    #[test]
    fn daily_and_rolling_differ_for_late_start() {
        let start = at(2024, 3, 10, 23, 0);
        let now = at(2024, 3, 11, 0, 30);
        assert!(is_due(&MIDNIGHT, start, now));
        assert!(!is_due(&DAY, start, now));
    }

    #[test]
    fn next_reset_rolls_forward_when_due() {
        let start = at(2024, 3, 10, 12, 0);
        let now = at(2024, 3, 12, 9, 0);
        assert_eq!(next_reset(&DAY, start, now), at(2024, 3, 13, 9, 0));
        assert_eq!(next_reset(&MIDNIGHT, start, now), at(2024, 3, 13, 0, 0));
    }

    #[test]
    fn huge_rolling_window_saturates() {
        let policy = ResetPolicy::Rolling { window_secs: u64::MAX };
        assert_eq!(window_end(&policy, at(2024, 1, 1, 0, 0)), DateTime::<Utc>::MAX_UTC);
    }
}
