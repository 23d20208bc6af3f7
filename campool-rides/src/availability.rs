use crate::models::{Ride, RideStatus};
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum AvailabilityError {
    #[error("Ride {ride_id}: accepted seats {accepted} exceed capacity {capacity}")]
    CapacityExceeded {
        ride_id: Uuid,
        capacity: u32,
        accepted: u32,
    },
}

/// Seats still open on a ride given the total seats across its ACCEPTED
/// requests. A negative result means the accept path let more seats through
/// than exist; that is an invariant breach, not a user-facing outcome.
pub fn remaining_seats(ride: &Ride, accepted_seats: u32) -> Result<u32, AvailabilityError> {
    if accepted_seats > ride.seat_capacity {
        return Err(AvailabilityError::CapacityExceeded {
            ride_id: ride.id,
            capacity: ride.seat_capacity,
            accepted: accepted_seats,
        });
    }

    Ok(ride.seat_capacity - accepted_seats)
}

/// Derived ride status. The stored column only carries owner-written states;
/// ACTIVE flips to FULL here whenever the last seat is taken.
pub fn effective_status(ride: &Ride, accepted_seats: u32) -> Result<RideStatus, AvailabilityError> {
    if ride.status.is_terminal() {
        return Ok(ride.status);
    }

    if remaining_seats(ride, accepted_seats)? > 0 {
        Ok(RideStatus::Active)
    } else {
        Ok(RideStatus::Full)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RideRole, Schedule, TripKind};
    use chrono::{NaiveDate, Utc};

    fn ride_with_capacity(capacity: u32) -> Ride {
        Ride {
            id: Uuid::new_v4(),
            driver_id: Uuid::new_v4(),
            origin: "Hartman Union Building".to_string(),
            destination: "Boston South Station".to_string(),
            trip_kind: TripKind::OneWay,
            ride_role: RideRole::Driver,
            schedule: Schedule::Once {
                date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            },
            departure_time: "08:30".to_string(),
            return_date: None,
            return_time: None,
            seat_capacity: capacity,
            price_per_seat: None,
            notes: None,
            status: RideStatus::Active,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_remaining_seats_arithmetic() {
        let ride = ride_with_capacity(3);
        assert_eq!(remaining_seats(&ride, 0).unwrap(), 3);
        assert_eq!(remaining_seats(&ride, 2).unwrap(), 1);
        assert_eq!(remaining_seats(&ride, 3).unwrap(), 0);
    }

    #[test]
    fn test_overcommit_is_an_invariant_breach() {
        let ride = ride_with_capacity(2);
        let err = remaining_seats(&ride, 3).unwrap_err();
        assert!(matches!(
            err,
            AvailabilityError::CapacityExceeded {
                capacity: 2,
                accepted: 3,
                ..
            }
        ));
    }

    #[test]
    fn test_status_flips_to_full_at_zero_seats() {
        let ride = ride_with_capacity(2);
        assert_eq!(effective_status(&ride, 1).unwrap(), RideStatus::Active);
        assert_eq!(effective_status(&ride, 2).unwrap(), RideStatus::Full);
    }

    #[test]
    fn test_terminal_statuses_pass_through() {
        let mut ride = ride_with_capacity(2);
        ride.status = RideStatus::Cancelled;
        assert_eq!(effective_status(&ride, 0).unwrap(), RideStatus::Cancelled);

        ride.status = RideStatus::Completed;
        // Terminal states pass through even when seat data is corrupt.
        assert_eq!(effective_status(&ride, 5).unwrap(), RideStatus::Completed);
    }
}
