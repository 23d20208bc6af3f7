use crate::app_config::BoardRules;
use crate::database::DbClient;
use crate::request_repo::{PostgresRideRequestRepository, RequestTxRepository};
use crate::ride_repo::{PostgresRideRepository, RideTxRepository};
use campool_core::clock::Clock;
use campool_core::events::EventSink;
use campool_core::identity::IdentityProvider;
use campool_requests::lifecycle::{self, Decision, RequestError};
use campool_requests::models::{RequestStatus, RideRequest};
use campool_rides::models::Ride;
use campool_rides::recurrence::RecurrenceError;
use campool_rides::search::{search, RideFilters, RideMatch};
use campool_rides::validate::{build_ride, RidePosting, ValidationError};
use campool_shared::display_location;
use campool_shared::models::events::{BoardEvent, RidePostedEvent};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum BoardError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Request(#[from] RequestError),

    #[error(transparent)]
    Recurrence(#[from] RecurrenceError),

    #[error("Corrupt stored data: {0}")]
    Data(String),

    #[error("Identity verification failed: {0}")]
    Identity(String),

    #[error(transparent)]
    Store(#[from] sqlx::Error),
}

/// Application service over the board: every operation is one short
/// transaction, with events published only after commit.
pub struct BoardService {
    db: DbClient,
    rides: PostgresRideRepository,
    requests: PostgresRideRequestRepository,
    events: Arc<dyn EventSink>,
    identity: Arc<dyn IdentityProvider>,
    clock: Arc<dyn Clock>,
    rules: BoardRules,
}

impl BoardService {
    pub fn new(
        db: DbClient,
        events: Arc<dyn EventSink>,
        identity: Arc<dyn IdentityProvider>,
        clock: Arc<dyn Clock>,
        rules: BoardRules,
    ) -> Self {
        let rides = PostgresRideRepository::new(db.pool.clone());
        let requests = PostgresRideRequestRepository::new(db.pool.clone());
        Self {
            db,
            rides,
            requests,
            events,
            identity,
            clock,
            rules,
        }
    }

    /// Resolve the acting user from an opaque credential. Everything below
    /// takes the resolved id; the board itself never authenticates.
    pub async fn authenticate(&self, credential: &str) -> Result<Uuid, BoardError> {
        self.identity
            .resolve_actor(credential)
            .await
            .map_err(|e| BoardError::Identity(e.to_string()))
    }

    pub async fn post_ride(
        &self,
        driver_id: Uuid,
        posting: RidePosting,
    ) -> Result<Ride, BoardError> {
        if posting.seats_available > self.rules.max_seats_per_ride {
            return Err(ValidationError::TooManySeats(self.rules.max_seats_per_ride).into());
        }

        let ride = build_ride(driver_id, posting, self.clock.now())?;

        let mut tx = self.db.pool.begin().await?;
        RideTxRepository::insert_ride(&mut tx, &ride).await?;
        tx.commit().await?;

        let date_info = match ride.departure_date() {
            Some(date) => date.to_string(),
            None => "Recurring ride".to_string(),
        };
        self.publish(BoardEvent::RidePosted(RidePostedEvent {
            ride_id: ride.id,
            driver_id: ride.driver_id,
            origin: display_location(&ride.origin),
            destination: display_location(&ride.destination),
            ride_role: ride.ride_role.to_string(),
            date_info,
            timestamp: self.clock.now().timestamp(),
        }))
        .await;

        info!("Ride {} posted by {}", ride.id, ride.driver_id);
        Ok(ride)
    }

    pub async fn cancel_ride(&self, owner_id: Uuid, ride_id: Uuid) -> Result<Ride, BoardError> {
        let mut tx = self.db.pool.begin().await?;

        let ride = RideTxRepository::lock_ride(&mut tx, ride_id)
            .await?
            .ok_or(BoardError::NotFound("ride"))?;
        let requests = RequestTxRepository::list_for_ride(&mut tx, ride_id).await?;

        let outcome = lifecycle::cancel_ride(owner_id, &ride, &requests, self.clock.now())?;

        RideTxRepository::set_status(&mut tx, ride_id, outcome.ride.status).await?;
        tx.commit().await?;

        let notified = outcome.events.len();
        for event in outcome.events {
            self.publish(event).await;
        }
        info!(
            "Ride {} cancelled by {}, {} riders notified",
            ride_id, owner_id, notified
        );
        Ok(outcome.ride)
    }

    /// Submit a rider's bid. The ride row lock spans the accepted-seat read
    /// and the insert, so two concurrent bids cannot jointly overshoot the
    /// remaining seats.
    pub async fn submit_request(
        &self,
        rider_id: Uuid,
        ride_id: Uuid,
        seats_requested: u32,
        message: Option<String>,
    ) -> Result<RideRequest, BoardError> {
        let mut tx = self.db.pool.begin().await?;

        let ride = RideTxRepository::lock_ride(&mut tx, ride_id)
            .await?
            .ok_or(BoardError::NotFound("ride"))?;
        let accepted_seats = RideTxRepository::accepted_seats(&mut tx, ride_id).await?;
        let existing = RequestTxRepository::list_for_ride(&mut tx, ride_id).await?;

        let request = lifecycle::submit(
            rider_id,
            &ride,
            &existing,
            accepted_seats,
            seats_requested,
            message,
            self.clock.now(),
        )?;

        RequestTxRepository::insert_request(&mut tx, &request).await?;
        tx.commit().await?;

        info!(
            "Request {} submitted by {} for ride {} ({} seats)",
            request.id, rider_id, ride_id, seats_requested
        );
        Ok(request)
    }

    pub async fn respond(
        &self,
        owner_id: Uuid,
        request_id: Uuid,
        decision: Decision,
    ) -> Result<RideRequest, BoardError> {
        let mut tx = self.db.pool.begin().await?;

        let request = RequestTxRepository::fetch_request(&mut tx, request_id)
            .await?
            .ok_or(BoardError::NotFound("request"))?;
        let ride = RideTxRepository::lock_ride(&mut tx, request.ride_id)
            .await?
            .ok_or(BoardError::NotFound("ride"))?;
        // Re-read under the ride lock: a concurrent response commits before
        // our lock is granted, and this must see its decision.
        let request = RequestTxRepository::fetch_request(&mut tx, request_id)
            .await?
            .ok_or(BoardError::NotFound("request"))?;

        let outcome = lifecycle::respond(owner_id, &ride, &request, decision, self.clock.now())?;

        RequestTxRepository::set_status(&mut tx, request_id, outcome.request.status).await?;
        tx.commit().await?;

        self.publish(outcome.event).await;
        info!(
            "Request {} {} by {}",
            request_id, outcome.request.status, owner_id
        );
        Ok(outcome.request)
    }

    /// The "find a ride" bulletin. Re-evaluated on every call against
    /// current state.
    pub async fn search_rides(
        &self,
        filters: &RideFilters,
        exclude_driver: Option<Uuid>,
    ) -> Result<Vec<RideMatch>, BoardError> {
        let candidates = self.rides.search_candidates(filters).await?;
        let matches: Vec<RideMatch> = search(candidates, filters, exclude_driver).collect();
        info!("Search returned {} rides", matches.len());
        Ok(matches)
    }

    pub async fn ride_details(&self, ride_id: Uuid) -> Result<(Ride, u32), BoardError> {
        self.rides
            .fetch_ride(ride_id)
            .await?
            .ok_or(BoardError::NotFound("ride"))
    }

    /// Rides the user posted, any status, freshest first.
    pub async fn my_rides(&self, driver_id: Uuid) -> Result<Vec<(Ride, u32)>, BoardError> {
        self.rides.list_by_driver(driver_id).await
    }

    /// Rides the user holds an accepted seat on.
    pub async fn joined_rides(
        &self,
        rider_id: Uuid,
    ) -> Result<Vec<(RideRequest, Ride)>, BoardError> {
        self.rides_for_requests(rider_id, RequestStatus::Accepted)
            .await
    }

    /// The user's still-pending bids.
    pub async fn pending_requests(
        &self,
        rider_id: Uuid,
    ) -> Result<Vec<(RideRequest, Ride)>, BoardError> {
        self.rides_for_requests(rider_id, RequestStatus::Pending)
            .await
    }

    async fn rides_for_requests(
        &self,
        rider_id: Uuid,
        status: RequestStatus,
    ) -> Result<Vec<(RideRequest, Ride)>, BoardError> {
        let requests = self.requests.list_by_rider(rider_id, Some(status)).await?;

        let mut out = Vec::with_capacity(requests.len());
        for request in requests {
            if let Some((ride, _)) = self.rides.fetch_ride(request.ride_id).await? {
                out.push((request, ride));
            }
        }
        Ok(out)
    }

    async fn publish(&self, event: BoardEvent) {
        let topic = event.topic();
        if let Err(e) = self.events.publish(event).await {
            warn!("Failed to publish {} event: {}", topic, e);
        }
    }
}
