pub mod app_config;
pub mod board;
pub mod database;
pub mod events;
pub mod request_repo;
pub mod ride_repo;

pub use board::{BoardError, BoardService};
pub use database::DbClient;
pub use events::EventDispatcher;
pub use request_repo::PostgresRideRequestRepository;
pub use ride_repo::PostgresRideRepository;
