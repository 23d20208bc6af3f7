pub mod lifecycle;
pub mod models;
pub mod repository;

pub use lifecycle::{cancel_ride, respond, submit, CancelOutcome, Decision, RequestError, ResponseOutcome};
pub use models::{RequestStatus, RideRequest};
pub use repository::RideRequestRepository;
