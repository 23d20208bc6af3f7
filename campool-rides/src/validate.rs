use crate::models::{
    DayOfWeek, RecurrencePattern, Ride, RideRole, RideStatus, Schedule, TripKind,
};
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Recurring rides require days and end date")]
    RecurrenceRequiresDays,

    #[error("Recurring rides require an end date")]
    RecurrenceRequiresUntil,

    #[error("One-time rides require a departure date")]
    MissingDepartureDate,

    #[error("Cannot schedule a ride in the past")]
    DepartureInPast,

    #[error("Cannot schedule a ride for a time that has already passed")]
    DepartureTimePassed,

    #[error("Return date must be on or after departure date")]
    ReturnBeforeDeparture,

    #[error("Invalid time of day: {0}")]
    InvalidTimeOfDay(String),

    #[error("Seat capacity must be at least 1")]
    ZeroCapacity,

    #[error("Seat capacity must not exceed {0}")]
    TooManySeats(u32),

    #[error("Price per seat must not be negative")]
    NegativePrice,
}

/// Wire shape of a ride posting, as the board receives it.
#[derive(Debug, Clone, Deserialize)]
pub struct RidePosting {
    pub origin: String,
    pub destination: String,
    pub departure_date: Option<NaiveDate>,
    pub departure_time: String,
    pub seats_available: u32,
    pub price_per_seat: Option<f64>,
    pub notes: Option<String>,
    #[serde(default)]
    pub is_recurring: bool,
    #[serde(default)]
    pub recurring_days: Vec<DayOfWeek>,
    pub recurring_until: Option<NaiveDate>,
    pub ride_type: Option<TripKind>,
    pub ride_role: Option<RideRole>,
    pub return_date: Option<NaiveDate>,
    pub return_time: Option<String>,
    /// Client timezone offset in minutes, positive for timezones behind UTC
    /// (e.g. 300 for EST). Past-date checks run in the client's local day.
    #[serde(default)]
    pub timezone_offset: i32,
}

fn require_time_of_day(value: &str) -> Result<(), ValidationError> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .map(|_| ())
        .map_err(|_| ValidationError::InvalidTimeOfDay(value.to_string()))
}

/// Validate a posting against the clock-supplied `now` and build the ride.
/// All checks run before anything is constructed.
pub fn build_ride(
    driver_id: Uuid,
    posting: RidePosting,
    now: DateTime<Utc>,
) -> Result<Ride, ValidationError> {
    if posting.origin.trim().is_empty() {
        return Err(ValidationError::MissingField("origin"));
    }
    if posting.destination.trim().is_empty() {
        return Err(ValidationError::MissingField("destination"));
    }
    require_time_of_day(&posting.departure_time)?;
    if let Some(return_time) = posting.return_time.as_deref() {
        require_time_of_day(return_time)?;
    }

    if posting.seats_available < 1 {
        return Err(ValidationError::ZeroCapacity);
    }
    if posting.price_per_seat.is_some_and(|p| p < 0.0) {
        return Err(ValidationError::NegativePrice);
    }

    let schedule = if posting.is_recurring {
        if posting.recurring_days.is_empty() {
            return Err(ValidationError::RecurrenceRequiresDays);
        }
        let until = posting
            .recurring_until
            .ok_or(ValidationError::RecurrenceRequiresUntil)?;

        let mut days = posting.recurring_days.clone();
        days.sort();
        days.dedup();

        Schedule::Recurring(RecurrencePattern { days, until })
    } else {
        let date = posting
            .departure_date
            .ok_or(ValidationError::MissingDepartureDate)?;

        // The client's local wall clock: offset minutes are subtracted the
        // same way the browser reports them (positive = behind UTC).
        let local_now = now - Duration::minutes(posting.timezone_offset as i64);
        let local_today = local_now.date_naive();

        if date < local_today {
            return Err(ValidationError::DepartureInPast);
        }
        if date == local_today {
            let current_time = local_now.format("%H:%M").to_string();
            if posting.departure_time < current_time {
                return Err(ValidationError::DepartureTimePassed);
            }
        }

        Schedule::Once { date }
    };

    let trip_kind = posting.ride_type.unwrap_or(TripKind::OneWay);
    if trip_kind == TripKind::RoundTrip {
        if let (Some(return_date), Some(departure_date)) = (
            posting.return_date,
            match &schedule {
                Schedule::Once { date } => Some(*date),
                Schedule::Recurring(_) => None,
            },
        ) {
            if return_date < departure_date {
                return Err(ValidationError::ReturnBeforeDeparture);
            }
        }
    }

    Ok(Ride {
        id: Uuid::new_v4(),
        driver_id,
        origin: posting.origin.trim().to_string(),
        destination: posting.destination.trim().to_string(),
        trip_kind,
        ride_role: posting.ride_role.unwrap_or(RideRole::Driver),
        schedule,
        departure_time: posting.departure_time,
        return_date: posting.return_date,
        return_time: posting.return_time,
        seat_capacity: posting.seats_available,
        price_per_seat: posting.price_per_seat,
        notes: posting.notes.filter(|n| !n.trim().is_empty()),
        status: RideStatus::Active,
        created_at: now,
    })
}
