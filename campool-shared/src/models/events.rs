use uuid::Uuid;

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct RidePostedEvent {
    pub ride_id: Uuid,
    pub driver_id: Uuid,
    pub origin: String,
    pub destination: String,
    pub ride_role: String,
    pub date_info: String,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct RequestAcceptedEvent {
    pub request_id: Uuid,
    pub ride_id: Uuid,
    pub rider_id: Uuid,
    pub driver_id: Uuid,
    pub origin: String,
    pub destination: String,
    pub seats_requested: u32,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct RequestDeclinedEvent {
    pub request_id: Uuid,
    pub ride_id: Uuid,
    pub rider_id: Uuid,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct RideCancelledEvent {
    pub ride_id: Uuid,
    pub driver_id: Uuid,
    pub rider_id: Uuid,
    pub origin: String,
    pub destination: String,
    pub timestamp: i64,
}

/// Everything the board publishes to the notification side.
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BoardEvent {
    RidePosted(RidePostedEvent),
    RequestAccepted(RequestAcceptedEvent),
    RequestDeclined(RequestDeclinedEvent),
    RideCancelled(RideCancelledEvent),
}

impl BoardEvent {
    pub fn topic(&self) -> &'static str {
        match self {
            BoardEvent::RidePosted(_) => "rides.posted",
            BoardEvent::RequestAccepted(_) => "requests.accepted",
            BoardEvent::RequestDeclined(_) => "requests.declined",
            BoardEvent::RideCancelled(_) => "rides.cancelled",
        }
    }

    /// Partition key: the ride the event belongs to.
    pub fn key(&self) -> String {
        match self {
            BoardEvent::RidePosted(e) => e.ride_id.to_string(),
            BoardEvent::RequestAccepted(e) => e.ride_id.to_string(),
            BoardEvent::RequestDeclined(e) => e.ride_id.to_string(),
            BoardEvent::RideCancelled(e) => e.ride_id.to_string(),
        }
    }
}
