//! Project-specific utilities live here.

use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc};

/// Formats a shared log prefix for project logs.
pub fn log_prefix(module: &str) -> String {
    format!("project::{module}")
}

/// Midnight UTC at the start of `date`.
pub fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// Midnight UTC at the start of the day after `date`.
///
/// `None` when `date` is the last representable day.
pub fn end_of_day_exclusive(date: NaiveDate) -> Option<DateTime<Utc>> {
    date.checked_add_days(Days::new(1)).map(start_of_day)
}

/// Half-open `[from, to)` instant bounds for an inclusive day range.
pub fn day_bounds(
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
    (from.map(start_of_day), to.and_then(end_of_day_exclusive))
}

/// `LIKE` pattern matching `needle` as a literal substring.
///
/// Returns `None` for an empty needle, which means "no filter".
pub fn contains_pattern(needle: &str) -> Option<String> {
    if needle.is_empty() {
        return None;
    }

    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    Some(pattern)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn day_bounds_cover_single_day() {
        let day = date(2024, 1, 1);
        let (from, to) = day_bounds(Some(day), Some(day));

        assert_eq!(from.unwrap().to_rfc3339(), "2024-01-01T00:00:00+00:00");
        assert_eq!(to.unwrap().to_rfc3339(), "2024-01-02T00:00:00+00:00");
    }

    #[test]
    fn day_bounds_cross_month_and_leap_day() {
        assert_eq!(
            end_of_day_exclusive(date(2024, 2, 29)).unwrap(),
            start_of_day(date(2024, 3, 1))
        );
        assert_eq!(
            end_of_day_exclusive(date(2023, 12, 31)).unwrap(),
            start_of_day(date(2024, 1, 1))
        );
    }

    #[test]
    fn last_representable_day_has_no_upper_bound() {
        assert!(end_of_day_exclusive(NaiveDate::MAX).is_none());
    }

    #[test]
    fn open_bounds_stay_open() {
        assert_eq!(day_bounds(None, None), (None, None));
    }

    #[test]
    fn contains_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("dune").as_deref(), Some("%dune%"));
        assert_eq!(contains_pattern("100%").as_deref(), Some("%100\\%%"));
        assert_eq!(contains_pattern("a_b").as_deref(), Some("%a\\_b%"));
        assert_eq!(contains_pattern(""), None);
    }

    #[test]
    fn log_prefix_is_namespaced() {
        assert_eq!(log_prefix("books"), "project::books");
    }
}
