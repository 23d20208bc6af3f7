pub mod availability;
pub mod models;
pub mod recurrence;
pub mod repository;
pub mod search;
pub mod validate;

pub use availability::{effective_status, remaining_seats, AvailabilityError};
pub use models::{DayOfWeek, RecurrencePattern, Ride, RideRole, RideStatus, Schedule, TripKind};
pub use recurrence::{occurs_on, parse_pattern, RecurrenceError};
pub use search::{search, RideFilters, RideMatch};
pub use validate::{build_ride, RidePosting, ValidationError};
