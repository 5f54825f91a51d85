pub mod engine;
pub mod models;

pub use engine::Backtester;
pub use models::{BacktestConfig, BacktestReport, EquityPoint};
