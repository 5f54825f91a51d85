use advisor_core::{AdvisorError, Bar, TRADING_DAYS_PER_YEAR};
use tracing::debug;

use crate::models::{BacktestConfig, BacktestReport, EquityPoint};

/// Replays a daily position-signal series against historical closes with
/// commission and tax frictions.
pub struct Backtester {
    config: BacktestConfig,
}

impl Backtester {
    pub fn new(config: BacktestConfig) -> Self {
        Self { config }
    }

    pub fn with_capital(initial_capital: f64) -> Self {
        Self::new(BacktestConfig { initial_capital, ..BacktestConfig::default() })
    }

    pub fn initial_capital(&self) -> f64 {
        self.config.initial_capital
    }

    /// Runs the simulation. `signals` holds one position per bar (1 long,
    /// 0 flat, -1 short); today's return is earned on yesterday's
    /// position, and any position change pays fee plus tax that day.
    pub fn run(&self, bars: &[Bar], signals: &[i32]) -> Result<BacktestReport, AdvisorError> {
        if bars.is_empty() {
            return Err(AdvisorError::InvalidData("empty price series".to_string()));
        }
        if bars.len() != signals.len() {
            return Err(AdvisorError::InvalidData(format!(
                "signal length {} does not match price series length {}",
                signals.len(),
                bars.len()
            )));
        }

        let cost = self.config.transaction_fee + self.config.tax_rate;
        let mut returns = Vec::with_capacity(bars.len());
        let mut trade_count = 0;
        returns.push(0.0);

        for i in 1..bars.len() {
            let pct_change = if bars[i - 1].close != 0.0 {
                bars[i].close / bars[i - 1].close - 1.0
            } else {
                0.0
            };
            let mut daily = signals[i - 1] as f64 * pct_change;
            if signals[i] != signals[i - 1] {
                daily -= cost;
                trade_count += 1;
            }
            returns.push(daily);
        }

        // Equity curve compounds from par; the first day never moves it.
        let mut equity_curve = Vec::with_capacity(bars.len());
        let mut cumulative = 1.0;
        for (i, bar) in bars.iter().enumerate() {
            if i > 0 {
                cumulative *= 1.0 + returns[i];
            }
            equity_curve.push(EquityPoint {
                date: bar.date,
                close: bar.close,
                signal: signals[i],
                daily_return: returns[i],
                cumulative,
            });
        }

        let total_return_pct = (cumulative - 1.0) * 100.0;
        let final_capital = self.config.initial_capital * cumulative;
        let mdd_pct = max_drawdown(&equity_curve) * 100.0;
        let win_rate = win_rate(&returns[1..]);
        let sharpe_ratio = sharpe(&returns[1..]);

        debug!(
            days = bars.len(),
            trades = trade_count,
            total_return_pct,
            "backtest complete"
        );

        Ok(BacktestReport {
            total_return_pct,
            mdd_pct,
            win_rate,
            sharpe_ratio,
            final_capital,
            trade_count,
            equity_curve,
        })
    }
}

fn max_drawdown(curve: &[EquityPoint]) -> f64 {
    let mut peak = f64::NEG_INFINITY;
    let mut worst: f64 = 0.0;
    for point in curve {
        peak = peak.max(point.cumulative);
        if peak > 0.0 {
            worst = worst.min(point.cumulative / peak - 1.0);
        }
    }
    worst
}

fn win_rate(returns: &[f64]) -> f64 {
    let active: Vec<f64> = returns.iter().copied().filter(|r| *r != 0.0).collect();
    if active.is_empty() {
        return 0.0;
    }
    let wins = active.iter().filter(|r| **r > 0.0).count();
    wins as f64 / active.len() as f64 * 100.0
}

fn sharpe(returns: &[f64]) -> f64 {
    if returns.len() < 2 {
        return 0.0;
    }
    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance =
        returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1.0);
    let std = variance.sqrt();
    if std == 0.0 {
        0.0
    } else {
        mean / std * TRADING_DAYS_PER_YEAR.sqrt()
    }
}
