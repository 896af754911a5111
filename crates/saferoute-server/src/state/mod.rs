pub mod hazards;
pub mod store;

pub use hazards::HazardStore;
pub use store::AppState;
