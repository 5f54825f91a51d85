pub mod frame;
pub mod indicators;
pub mod score;
pub mod strategy;

pub use frame::{IndicatorFrame, IndicatorRow};
pub use score::composite_score;
pub use strategy::{generate_signals, Strategy};

#[cfg(test)]
mod indicators_tests;
#[cfg(test)]
mod strategy_tests;
