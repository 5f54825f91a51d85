use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use advisor_core::{TAX_RATE, TRANSACTION_FEE};

/// Configuration for a backtest run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestConfig {
    pub initial_capital: f64,
    /// Commission charged whenever the position changes, as a fraction.
    pub transaction_fee: f64,
    /// Transaction tax charged on the same occasions.
    pub tax_rate: f64,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            initial_capital: 10_000_000.0,
            transaction_fee: TRANSACTION_FEE,
            tax_rate: TAX_RATE,
        }
    }
}

/// One day on the equity curve.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub close: f64,
    pub signal: i32,
    pub daily_return: f64,
    /// Compounded growth factor; the first day is pinned to 1.0.
    pub cumulative: f64,
}

/// Result of a completed backtest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestReport {
    pub total_return_pct: f64,
    /// Most negative peak-to-trough drop of the cumulative curve, <= 0.
    pub mdd_pct: f64,
    /// Positive share of non-zero-return days, 0-100.
    pub win_rate: f64,
    /// Annualized; 0 when daily returns have no variance.
    pub sharpe_ratio: f64,
    pub final_capital: f64,
    pub trade_count: usize,
    pub equity_curve: Vec<EquityPoint>,
}
