use chrono::{DateTime, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Stored ride status. FULL is never written here; it is derived on read
/// from capacity and accepted requests (see `availability`).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RideStatus {
    Active,
    Full,
    Cancelled,
    Completed,
}

impl RideStatus {
    /// CANCELLED and COMPLETED never leave their state again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, RideStatus::Cancelled | RideStatus::Completed)
    }
}

impl fmt::Display for RideStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RideStatus::Active => "ACTIVE",
            RideStatus::Full => "FULL",
            RideStatus::Cancelled => "CANCELLED",
            RideStatus::Completed => "COMPLETED",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TripKind {
    OneWay,
    RoundTrip,
}

impl fmt::Display for TripKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TripKind::OneWay => "ONE_WAY",
            TripKind::RoundTrip => "ROUND_TRIP",
        };
        write!(f, "{}", s)
    }
}

/// Whether the poster is offering seats or looking for one.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RideRole {
    Driver,
    Rider,
}

impl fmt::Display for RideRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RideRole::Driver => "DRIVER",
            RideRole::Rider => "RIDER",
        };
        write!(f, "{}", s)
    }
}

/// Weekday as it appears in the stored pattern ("monday", "tuesday", ...).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl From<Weekday> for DayOfWeek {
    fn from(day: Weekday) -> Self {
        match day {
            Weekday::Mon => DayOfWeek::Monday,
            Weekday::Tue => DayOfWeek::Tuesday,
            Weekday::Wed => DayOfWeek::Wednesday,
            Weekday::Thu => DayOfWeek::Thursday,
            Weekday::Fri => DayOfWeek::Friday,
            Weekday::Sat => DayOfWeek::Saturday,
            Weekday::Sun => DayOfWeek::Sunday,
        }
    }
}

/// Which weekdays a recurring ride runs, and the last date it runs at all.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecurrencePattern {
    pub days: Vec<DayOfWeek>,
    pub until: NaiveDate,
}

/// Exactly one of a fixed departure date or a recurrence pattern.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Schedule {
    Once { date: NaiveDate },
    Recurring(RecurrencePattern),
}

/// A posted ride: an offer of seats, or a request for one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ride {
    pub id: Uuid,
    pub driver_id: Uuid,
    pub origin: String,
    pub destination: String,
    pub trip_kind: TripKind,
    pub ride_role: RideRole,
    pub schedule: Schedule,
    /// Departure time of day, "HH:MM".
    pub departure_time: String,
    pub return_date: Option<NaiveDate>,
    pub return_time: Option<String>,
    pub seat_capacity: u32,
    pub price_per_seat: Option<f64>,
    pub notes: Option<String>,
    pub status: RideStatus,
    pub created_at: DateTime<Utc>,
}

impl Ride {
    pub fn is_recurring(&self) -> bool {
        matches!(self.schedule, Schedule::Recurring(_))
    }

    /// The fixed departure date, if this is a one-time ride.
    pub fn departure_date(&self) -> Option<NaiveDate> {
        match &self.schedule {
            Schedule::Once { date } => Some(*date),
            Schedule::Recurring(_) => None,
        }
    }

    pub fn recurrence(&self) -> Option<&RecurrencePattern> {
        match &self.schedule {
            Schedule::Once { .. } => None,
            Schedule::Recurring(pattern) => Some(pattern),
        }
    }
}
