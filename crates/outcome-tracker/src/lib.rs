use std::sync::Arc;

use advisor_core::{
    Action, AdvisorError, Bar, HorizonOutcome, MarketDataProvider, OutcomeStats,
    PendingRecommendation, RecentOutcome,
};
use chrono::{Duration, NaiveDate};
use storage::Database;
use tracing::{info, warn};


/// Evaluation horizons in trading days, processed strictly in order.
const HORIZONS: [u32; 3] = [5, 10, 20];
/// Calendar-day fetch window covering the longest horizon plus weekends
/// and holidays.
const LOOK_AHEAD_DAYS: i64 = 2 * 20 + 10;
const STATS_WINDOW_DAYS: i64 = 90;
const RECENT_WINDOW_DAYS: i64 = 14;

/// Verifies persisted recommendations against realized prices once enough
/// trading days have elapsed.
pub struct OutcomeTracker {
    provider: Arc<dyn MarketDataProvider>,
    db: Database,
}

impl OutcomeTracker {
    pub fn new(provider: Arc<dyn MarketDataProvider>, db: Database) -> Self {
        Self { provider, db }
    }

    /// Processes every recommendation still lacking a 20-day outcome.
    /// Returns how many records gained at least one new horizon. One
    /// record's failure never stops the batch.
    pub async fn record_outcomes(&self, today: NaiveDate) -> Result<usize, AdvisorError> {
        let pending = self.db.pending_outcomes().await?;
        let total = pending.len();
        let mut updated = 0;

        for record in pending {
            match self.evaluate(&record, today).await {
                Ok(true) => updated += 1,
                Ok(false) => {}
                Err(e) => {
                    warn!(code = %record.code, session = %record.session_date, error = %e,
                        "outcome evaluation failed");
                }
            }
        }

        info!(pending = total, updated, "outcome tracking pass complete");
        Ok(updated)
    }

    async fn evaluate(
        &self,
        record: &PendingRecommendation,
        today: NaiveDate,
    ) -> Result<bool, AdvisorError> {
        let entry_price = match record.entry_price {
            Some(p) if p > 0.0 => p,
            _ => return Ok(false),
        };
        if record.action == Action::Na {
            return Ok(false);
        }

        self.db.ensure_outcome_row(record).await?;

        let start = record.session_date + Duration::days(1);
        let end = (record.session_date + Duration::days(LOOK_AHEAD_DAYS)).min(today);
        if start > end {
            return Ok(false);
        }
        let bars = self.provider.get_ohlcv_range(&record.code, start, end).await?;

        let mut wrote = false;
        for horizon in HORIZONS {
            let already = match horizon {
                5 => record.price_5d,
                10 => record.price_10d,
                _ => record.price_20d,
            };
            if already.is_some() {
                continue;
            }

            // The n-th trading day after the session; if the data has not
            // advanced that far, longer horizons cannot be ready either.
            let Some(price) = nth_trading_close(&bars, horizon) else {
                break;
            };

            let return_pct = (price / entry_price - 1.0) * 100.0;
            let outcome = HorizonOutcome {
                price,
                return_pct,
                correct: action_was_correct(record.action, return_pct),
            };
            self.db
                .record_horizon(&record.code, record.session_date, horizon, outcome)
                .await?;
            wrote = true;

            if horizon == 20 {
                if let Some(hit) = target_hit(record, price) {
                    self.db.set_target_hit(&record.code, record.session_date, hit).await?;
                }
            }
        }

        Ok(wrote)
    }

    /// Aggregate stats and freshly evaluated entries for the performance
    /// report.
    pub async fn performance_summary(
        &self,
        today: NaiveDate,
    ) -> Result<(OutcomeStats, Vec<RecentOutcome>), AdvisorError> {
        let stats = self.db.outcome_stats(today, STATS_WINDOW_DAYS).await?;
        let recent = self.db.recent_outcomes(today, RECENT_WINDOW_DAYS).await?;
        Ok((stats, recent))
    }
}

fn nth_trading_close(bars: &[Bar], horizon: u32) -> Option<f64> {
    bars.get(horizon as usize - 1).map(|b| b.close)
}

/// BUY needs any gain, SELL any loss; HOLD tolerates a small loss but not
/// a large one.
pub fn action_was_correct(action: Action, return_pct: f64) -> bool {
    match action {
        Action::Buy => return_pct > 0.0,
        Action::Sell => return_pct < 0.0,
        Action::Hold => return_pct > -5.0,
        Action::Na => false,
    }
}

fn target_hit(record: &PendingRecommendation, price_20d: f64) -> Option<bool> {
    let target = record.target_price.filter(|t| *t > 0.0)?;
    match record.action {
        Action::Buy => Some(price_20d >= target),
        Action::Sell => Some(price_20d <= target),
        _ => None,
    }
}
