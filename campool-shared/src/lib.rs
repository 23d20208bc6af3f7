pub mod location;
pub mod models;

pub use location::display_location;
pub use models::events::BoardEvent;
