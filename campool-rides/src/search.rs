use crate::availability::{effective_status, remaining_seats};
use crate::models::{Ride, RideStatus, Schedule};
use crate::recurrence::occurs_on;
use chrono::NaiveDate;
use serde::Deserialize;
use std::cmp::Ordering;
use uuid::Uuid;

/// Optional search filters, AND-combined.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct RideFilters {
    pub origin_contains: Option<String>,
    pub destination_contains: Option<String>,
    pub on_date: Option<NaiveDate>,
}

/// A ride that matched a search, with its seats still open.
#[derive(Debug, Clone)]
pub struct RideMatch {
    pub ride: Ride,
    pub seats_remaining: u32,
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn runs_on(ride: &Ride, date: NaiveDate) -> bool {
    match &ride.schedule {
        Schedule::Once { date: departure } => *departure == date,
        Schedule::Recurring(pattern) => occurs_on(pattern, date),
    }
}

/// Match candidate rides (each paired with its accepted-seat total) against
/// the filters. Each call re-evaluates from scratch; the returned sequence
/// is finite and ordered soonest-first, with recurring rides listed last and
/// ties going to the freshest posting.
pub fn search(
    candidates: Vec<(Ride, u32)>,
    filters: &RideFilters,
    exclude_driver: Option<Uuid>,
) -> impl Iterator<Item = RideMatch> {
    let mut matches: Vec<RideMatch> = Vec::new();

    for (ride, accepted_seats) in candidates {
        let status = match effective_status(&ride, accepted_seats) {
            Ok(status) => status,
            Err(e) => {
                // Capacity breaches are an incident, never a search result.
                tracing::error!("Skipping ride {} in search: {}", ride.id, e);
                continue;
            }
        };
        if status != RideStatus::Active {
            continue;
        }

        if exclude_driver == Some(ride.driver_id) {
            continue;
        }

        if let Some(origin) = filters.origin_contains.as_deref() {
            if !contains_ci(&ride.origin, origin) {
                continue;
            }
        }
        if let Some(destination) = filters.destination_contains.as_deref() {
            if !contains_ci(&ride.destination, destination) {
                continue;
            }
        }
        if let Some(date) = filters.on_date {
            if !runs_on(&ride, date) {
                continue;
            }
        }

        // effective_status already proved the total is within capacity.
        let seats_remaining = remaining_seats(&ride, accepted_seats).unwrap_or(0);
        matches.push(RideMatch {
            ride,
            seats_remaining,
        });
    }

    matches.sort_by(|a, b| {
        let by_date = match (a.ride.departure_date(), b.ride.departure_date()) {
            (Some(x), Some(y)) => x.cmp(&y),
            // Recurring rides have no single date and sort last.
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };

        by_date
            .then_with(|| a.ride.departure_time.cmp(&b.ride.departure_time))
            .then_with(|| b.ride.created_at.cmp(&a.ride.created_at))
    });

    matches.into_iter()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DayOfWeek, RecurrencePattern, RideRole, TripKind};
    use chrono::{TimeZone, Utc};

    fn ride(origin: &str, destination: &str, schedule: Schedule, time: &str) -> Ride {
        Ride {
            id: Uuid::new_v4(),
            driver_id: Uuid::new_v4(),
            origin: origin.to_string(),
            destination: destination.to_string(),
            trip_kind: TripKind::OneWay,
            ride_role: RideRole::Driver,
            schedule,
            departure_time: time.to_string(),
            return_date: None,
            return_time: None,
            seat_capacity: 3,
            price_per_seat: None,
            notes: None,
            status: RideStatus::Active,
            created_at: Utc.with_ymd_and_hms(2024, 4, 20, 9, 0, 0).unwrap(),
        }
    }

    fn once(year: i32, month: u32, day: u32) -> Schedule {
        Schedule::Once {
            date: NaiveDate::from_ymd_opt(year, month, day).unwrap(),
        }
    }

    #[test]
    fn test_substring_filters_are_case_insensitive() {
        let candidates = vec![
            (ride("Plymouth Campus", "Boston", once(2024, 5, 3), "08:00"), 0),
            (ride("Concord", "Manchester", once(2024, 5, 3), "08:00"), 0),
        ];

        let filters = RideFilters {
            origin_contains: Some("plymouth".to_string()),
            ..Default::default()
        };
        let results: Vec<RideMatch> = search(candidates, &filters, None).collect();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].ride.origin, "Plymouth Campus");
    }

    #[test]
    fn test_date_filter_matches_once_and_recurring() {
        // 2024-05-01 is a Wednesday.
        let recurring = Schedule::Recurring(RecurrencePattern {
            days: vec![DayOfWeek::Wednesday],
            until: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
        });
        let candidates = vec![
            (ride("A", "B", once(2024, 5, 1), "08:00"), 0),
            (ride("A", "B", once(2024, 5, 2), "08:00"), 0),
            (ride("A", "B", recurring, "08:00"), 0),
        ];

        let filters = RideFilters {
            on_date: Some(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()),
            ..Default::default()
        };
        let results: Vec<RideMatch> = search(candidates, &filters, None).collect();
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn test_full_and_terminal_rides_are_excluded() {
        let open = ride("A", "B", once(2024, 5, 1), "08:00");
        let full = ride("A", "B", once(2024, 5, 1), "08:00");
        let mut cancelled = ride("A", "B", once(2024, 5, 1), "08:00");
        cancelled.status = RideStatus::Cancelled;

        let open_id = open.id;
        let candidates = vec![(open, 2), (full, 3), (cancelled, 0)];

        let results: Vec<RideMatch> = search(candidates, &RideFilters::default(), None).collect();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].ride.id, open_id);
        assert_eq!(results[0].seats_remaining, 1);
    }

    #[test]
    fn test_viewer_rides_are_hidden() {
        let mine = ride("A", "B", once(2024, 5, 1), "08:00");
        let viewer = mine.driver_id;
        let other = ride("A", "B", once(2024, 5, 1), "09:00");

        let results: Vec<RideMatch> =
            search(vec![(mine, 0), (other, 0)], &RideFilters::default(), Some(viewer)).collect();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].ride.departure_time, "09:00");
    }

    #[test]
    fn test_ordering_date_then_time_then_freshness() {
        let recurring = Schedule::Recurring(RecurrencePattern {
            days: vec![DayOfWeek::Friday],
            until: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
        });

        let later_day = ride("A", "B", once(2024, 5, 4), "07:00");
        let early = ride("A", "B", once(2024, 5, 3), "08:00");
        let mut fresh = ride("A", "B", once(2024, 5, 3), "08:00");
        fresh.created_at = Utc.with_ymd_and_hms(2024, 4, 25, 9, 0, 0).unwrap();
        let afternoon = ride("A", "B", once(2024, 5, 3), "14:00");
        let weekly = ride("A", "B", recurring, "06:00");

        let fresh_id = fresh.id;
        let early_id = early.id;
        let candidates = vec![
            (weekly, 0),
            (later_day, 0),
            (afternoon, 0),
            (early, 0),
            (fresh, 0),
        ];

        let results: Vec<RideMatch> = search(candidates, &RideFilters::default(), None).collect();
        let ids: Vec<String> = results
            .iter()
            .map(|m| format!("{}@{}", m.ride.departure_time, m.ride.departure_date().is_none()))
            .collect();

        assert_eq!(
            ids,
            vec!["08:00@false", "08:00@false", "14:00@false", "07:00@false", "06:00@true"]
        );
        // Same date and time: the most recent posting surfaces first.
        assert_eq!(results[0].ride.id, fresh_id);
        assert_eq!(results[1].ride.id, early_id);
    }
}
