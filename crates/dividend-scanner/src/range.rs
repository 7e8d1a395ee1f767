use chrono::{Datelike, Duration, NaiveDate};

/// Calendar days to scan ahead of "today", indexed by weekday (Monday = 0).
///
/// Weekends are not trading days, so Thursday through Sunday anchors widen
/// the window to keep at least four business days of ex-dividend dates in
/// range without missing a Monday or Friday.
pub const WEEKDAY_SCAN_DAYS: [i64; 7] = [4, 4, 4, 5, 5, 6, 5];

/// Resolve the inclusive [start, end] scan window for a given anchor date.
///
/// Pure and total: every calendar date maps to a window via the weekday
/// table, no errors.
pub fn calculate_scan_range(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let days_ahead = WEEKDAY_SCAN_DAYS[today.weekday().num_days_from_monday() as usize];
    (today, today + Duration::days(days_ahead))
}
