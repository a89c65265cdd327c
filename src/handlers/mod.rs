pub mod forecasts;
pub mod health;
pub mod predictive_inventory;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;
