use crate::models::Ride;
use crate::search::RideFilters;
use async_trait::async_trait;
use std::error::Error;
use uuid::Uuid;

/// Repository trait for ride data access. Candidate queries return each
/// ride together with its accepted-seat total so callers can derive
/// effective status without a second round trip.
#[async_trait]
pub trait RideRepository: Send + Sync {
    async fn fetch_ride(
        &self,
        id: Uuid,
    ) -> Result<Option<(Ride, u32)>, Box<dyn Error + Send + Sync>>;

    /// ACTIVE-status rides pre-filtered on the substring filters; date and
    /// recurrence matching happen in the engine.
    async fn search_candidates(
        &self,
        filters: &RideFilters,
    ) -> Result<Vec<(Ride, u32)>, Box<dyn Error + Send + Sync>>;

    async fn list_by_driver(
        &self,
        driver_id: Uuid,
    ) -> Result<Vec<(Ride, u32)>, Box<dyn Error + Send + Sync>>;
}
