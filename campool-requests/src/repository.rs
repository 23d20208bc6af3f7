use crate::models::{RequestStatus, RideRequest};
use async_trait::async_trait;
use std::error::Error;
use uuid::Uuid;

/// Repository trait for ride-request data access.
#[async_trait]
pub trait RideRequestRepository: Send + Sync {
    async fn fetch_request(
        &self,
        id: Uuid,
    ) -> Result<Option<RideRequest>, Box<dyn Error + Send + Sync>>;

    async fn list_for_ride(
        &self,
        ride_id: Uuid,
    ) -> Result<Vec<RideRequest>, Box<dyn Error + Send + Sync>>;

    async fn list_by_rider(
        &self,
        rider_id: Uuid,
        status: Option<RequestStatus>,
    ) -> Result<Vec<RideRequest>, Box<dyn Error + Send + Sync>>;
}
