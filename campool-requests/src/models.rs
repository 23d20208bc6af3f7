use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Request status in the lifecycle. PENDING is the only non-terminal state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestStatus {
    Pending,
    Accepted,
    Declined,
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RequestStatus::Pending => "PENDING",
            RequestStatus::Accepted => "ACCEPTED",
            RequestStatus::Declined => "DECLINED",
        };
        write!(f, "{}", s)
    }
}

/// A rider's bid for seats on a ride.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RideRequest {
    pub id: Uuid,
    pub ride_id: Uuid,
    pub rider_id: Uuid,
    pub seats_requested: u32,
    pub message: Option<String>,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
}

impl RideRequest {
    pub fn new(
        ride_id: Uuid,
        rider_id: Uuid,
        seats_requested: u32,
        message: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            ride_id,
            rider_id,
            seats_requested,
            message,
            status: RequestStatus::Pending,
            created_at: now,
        }
    }

    /// PENDING and ACCEPTED requests count against the one-per-rider rule.
    pub fn is_active(&self) -> bool {
        matches!(self.status, RequestStatus::Pending | RequestStatus::Accepted)
    }
}
