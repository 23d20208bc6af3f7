use crate::models::{DayOfWeek, RecurrencePattern};
use chrono::{Datelike, NaiveDate};
use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum RecurrenceError {
    #[error("Malformed recurrence pattern: {0}")]
    InvalidPattern(String),

    #[error("Recurrence pattern has no weekdays")]
    EmptyDays,
}

/// Stored wire form: `{"days":["monday","wednesday"],"until":"2024-06-01"}`.
#[derive(Debug, Deserialize)]
struct StoredPattern {
    days: Vec<DayOfWeek>,
    until: NaiveDate,
}

/// Parse the stored pattern text. Called once at the persistence edge; the
/// rest of the engine only sees the validated structure.
pub fn parse_pattern(raw: &str) -> Result<RecurrencePattern, RecurrenceError> {
    let stored: StoredPattern =
        serde_json::from_str(raw).map_err(|e| RecurrenceError::InvalidPattern(e.to_string()))?;

    if stored.days.is_empty() {
        return Err(RecurrenceError::EmptyDays);
    }

    let mut days = stored.days;
    days.sort();
    days.dedup();

    Ok(RecurrencePattern {
        days,
        until: stored.until,
    })
}

/// Whether a recurring ride runs on `date`. Pure calendar arithmetic: no
/// ambient "now", so past dates still occur and callers filter future-only
/// themselves.
pub fn occurs_on(pattern: &RecurrencePattern, date: NaiveDate) -> bool {
    if date > pattern.until {
        return false;
    }

    let weekday = DayOfWeek::from(date.weekday());
    pattern.days.contains(&weekday)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wednesdays_until_june() -> RecurrencePattern {
        RecurrencePattern {
            days: vec![DayOfWeek::Wednesday],
            until: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
        }
    }

    #[test]
    fn test_occurs_on_matching_weekday() {
        // 2024-05-01 was a Wednesday.
        let pattern = wednesdays_until_june();
        assert!(occurs_on(
            &pattern,
            NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
        ));
        // The Thursday after is not covered.
        assert!(!occurs_on(
            &pattern,
            NaiveDate::from_ymd_opt(2024, 5, 2).unwrap()
        ));
    }

    #[test]
    fn test_never_occurs_after_until() {
        // 2024-06-05 is a Wednesday but past the end date.
        let pattern = wednesdays_until_june();
        assert!(!occurs_on(
            &pattern,
            NaiveDate::from_ymd_opt(2024, 6, 5).unwrap()
        ));
    }

    #[test]
    fn test_until_day_itself_occurs() {
        // 2024-06-01 is a Saturday.
        let pattern = RecurrencePattern {
            days: vec![DayOfWeek::Saturday],
            until: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
        };
        assert!(occurs_on(
            &pattern,
            NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
        ));
    }

    #[test]
    fn test_past_dates_still_occur() {
        let pattern = wednesdays_until_june();
        // A Wednesday years before the end date.
        assert!(occurs_on(
            &pattern,
            NaiveDate::from_ymd_opt(2020, 5, 6).unwrap()
        ));
    }

    #[test]
    fn test_parse_stored_form() {
        let pattern =
            parse_pattern(r#"{"days":["monday","wednesday","monday"],"until":"2024-06-01"}"#)
                .unwrap();
        assert_eq!(pattern.days, vec![DayOfWeek::Monday, DayOfWeek::Wednesday]);
        assert_eq!(pattern.until, NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            parse_pattern("not json"),
            Err(RecurrenceError::InvalidPattern(_))
        ));
        assert!(matches!(
            parse_pattern(r#"{"days":["moonday"],"until":"2024-06-01"}"#),
            Err(RecurrenceError::InvalidPattern(_))
        ));
    }

    #[test]
    fn test_parse_rejects_empty_days() {
        assert!(matches!(
            parse_pattern(r#"{"days":[],"until":"2024-06-01"}"#),
            Err(RecurrenceError::EmptyDays)
        ));
    }
}
