use chrono::{Datelike, NaiveDate, Weekday};

/// Whether a roster day-key falls on a weekend.
///
/// Day-keys are ISO `YYYY-MM-DD`; for anything else this falls back to a
/// substring match so that labels like `"Sat 14/12"` still register.
pub fn is_weekend(day: &str) -> bool {
    match NaiveDate::parse_from_str(day, "%Y-%m-%d") {
        Ok(date) => matches!(date.weekday(), Weekday::Sat | Weekday::Sun),
        Err(_) => day.contains("Sat") || day.contains("Sun"),
    }
}

/// Number of roster weeks covered by a horizon, rounding a partial week up.
pub fn horizon_weeks(day_count: usize) -> u32 {
    day_count.div_ceil(7) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iso_weekend_days() {
        // 2026-08-01 is a Saturday, 2026-08-02 a Sunday
        assert!(is_weekend("2026-08-01"));
        assert!(is_weekend("2026-08-02"));
        assert!(!is_weekend("2026-08-03"));
    }

    #[test]
    fn non_iso_falls_back_to_substring() {
        assert!(is_weekend("Sat 14/12"));
        assert!(is_weekend("Sunday"));
        assert!(!is_weekend("Mon 16/12"));
    }

    #[test]
    fn partial_weeks_round_up() {
        assert_eq!(horizon_weeks(0), 0);
        assert_eq!(horizon_weeks(1), 1);
        assert_eq!(horizon_weeks(7), 1);
        assert_eq!(horizon_weeks(8), 2);
        assert_eq!(horizon_weeks(14), 2);
    }
}
