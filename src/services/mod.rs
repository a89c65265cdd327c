// Order history
pub mod demand_history;

// Optional external adjustment of forecasts
pub mod enhancement;

// Forecast orchestration and stock recommendations
pub mod forecasting;

pub use demand_history::DemandHistoryService;
pub use enhancement::{DemandEnhancer, HttpDemandEnhancer, NoopEnhancer};
pub use forecasting::ForecastingService;
