use crate::models::{RequestStatus, RideRequest};
use campool_rides::availability::{effective_status, remaining_seats, AvailabilityError};
use campool_rides::models::{Ride, RideStatus};
use campool_shared::display_location;
use campool_shared::models::events::{BoardEvent, RequestAcceptedEvent, RequestDeclinedEvent, RideCancelledEvent};
use chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("Ride is no longer active")]
    RideNotActive,

    #[error("You cannot request your own ride")]
    CannotRequestOwnRide,

    #[error("You have already requested this ride")]
    DuplicateRequest,

    #[error("Not enough seats available: requested {requested}, available {available}")]
    InsufficientSeats { requested: u32, available: u32 },

    #[error("At least one seat must be requested")]
    InvalidSeatCount,

    #[error("Only the driver can respond to this ride")]
    NotAuthorized,

    #[error("Request was already {0}")]
    RequestAlreadyResolved(RequestStatus),

    #[error(transparent)]
    Capacity(#[from] AvailabilityError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Accept,
    Decline,
}

/// Submit a rider's bid for seats. `existing` is every request already on
/// the ride; `accepted_seats` is the ride's accepted total, read inside the
/// same transaction that will persist the result. Preconditions run in a
/// fixed order and nothing is produced unless all pass.
pub fn submit(
    rider_id: Uuid,
    ride: &Ride,
    existing: &[RideRequest],
    accepted_seats: u32,
    seats_requested: u32,
    message: Option<String>,
    now: DateTime<Utc>,
) -> Result<RideRequest, RequestError> {
    if effective_status(ride, accepted_seats)? != RideStatus::Active {
        return Err(RequestError::RideNotActive);
    }

    if rider_id == ride.driver_id {
        return Err(RequestError::CannotRequestOwnRide);
    }

    if existing
        .iter()
        .any(|r| r.rider_id == rider_id && r.is_active())
    {
        return Err(RequestError::DuplicateRequest);
    }

    if seats_requested < 1 {
        return Err(RequestError::InvalidSeatCount);
    }

    let available = remaining_seats(ride, accepted_seats)?;
    if seats_requested > available {
        return Err(RequestError::InsufficientSeats {
            requested: seats_requested,
            available,
        });
    }

    Ok(RideRequest::new(
        ride.id,
        rider_id,
        seats_requested,
        message,
        now,
    ))
}

/// A resolved request plus the event the board publishes for it.
#[derive(Debug)]
pub struct ResponseOutcome {
    pub request: RideRequest,
    pub event: BoardEvent,
}

/// Accept or decline a pending request. Only the ride's driver may respond,
/// and only once: a second response reports the decision that already
/// happened rather than succeeding idempotently.
pub fn respond(
    owner_id: Uuid,
    ride: &Ride,
    request: &RideRequest,
    decision: Decision,
    now: DateTime<Utc>,
) -> Result<ResponseOutcome, RequestError> {
    if owner_id != ride.driver_id {
        return Err(RequestError::NotAuthorized);
    }

    if request.status != RequestStatus::Pending {
        return Err(RequestError::RequestAlreadyResolved(request.status));
    }

    let mut resolved = request.clone();
    let event = match decision {
        Decision::Accept => {
            resolved.status = RequestStatus::Accepted;
            BoardEvent::RequestAccepted(RequestAcceptedEvent {
                request_id: resolved.id,
                ride_id: ride.id,
                rider_id: resolved.rider_id,
                driver_id: ride.driver_id,
                origin: display_location(&ride.origin),
                destination: display_location(&ride.destination),
                seats_requested: resolved.seats_requested,
                timestamp: now.timestamp(),
            })
        }
        Decision::Decline => {
            resolved.status = RequestStatus::Declined;
            BoardEvent::RequestDeclined(RequestDeclinedEvent {
                request_id: resolved.id,
                ride_id: ride.id,
                rider_id: resolved.rider_id,
                timestamp: now.timestamp(),
            })
        }
    };

    Ok(ResponseOutcome {
        request: resolved,
        event,
    })
}

/// A cancelled ride plus one event per rider who had an accepted seat.
#[derive(Debug)]
pub struct CancelOutcome {
    pub ride: Ride,
    pub events: Vec<BoardEvent>,
}

/// Cancel a ride. Pending and declined requests generate no notification;
/// riders already accepted each get a `RideCancelled` event.
pub fn cancel_ride(
    owner_id: Uuid,
    ride: &Ride,
    requests: &[RideRequest],
    now: DateTime<Utc>,
) -> Result<CancelOutcome, RequestError> {
    if owner_id != ride.driver_id {
        return Err(RequestError::NotAuthorized);
    }

    if ride.status.is_terminal() {
        return Err(RequestError::RideNotActive);
    }

    let mut cancelled = ride.clone();
    cancelled.status = RideStatus::Cancelled;

    let events = requests
        .iter()
        .filter(|r| r.status == RequestStatus::Accepted)
        .map(|r| {
            BoardEvent::RideCancelled(RideCancelledEvent {
                ride_id: ride.id,
                driver_id: ride.driver_id,
                rider_id: r.rider_id,
                origin: display_location(&ride.origin),
                destination: display_location(&ride.destination),
                timestamp: now.timestamp(),
            })
        })
        .collect();

    Ok(CancelOutcome {
        ride: cancelled,
        events,
    })
}
