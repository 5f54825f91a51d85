use std::sync::Arc;

use advisor_core::{AdvisorConfig, MarketDataProvider};
use chrono::NaiveDate;
use notification_service::Notifier;
use outcome_tracker::OutcomeTracker;
use storage::Database;
use tracing::{error, info, warn};

use crate::candidates::{select_candidates, CandidateQuery};
use crate::composer::Composer;

/// One scheduled end-of-session run: settle past recommendations, refresh
/// metadata, compose today's list, notify. Every stage is isolated; a
/// failing stage is logged and the run continues.
pub struct DailyPipeline {
    provider: Arc<dyn MarketDataProvider>,
    composer: Composer,
    tracker: OutcomeTracker,
    notifier: Notifier,
    db: Database,
    query: CandidateQuery,
    max_candidates: usize,
}

impl DailyPipeline {
    pub fn new(
        provider: Arc<dyn MarketDataProvider>,
        composer: Composer,
        tracker: OutcomeTracker,
        notifier: Notifier,
        db: Database,
        query: CandidateQuery,
        config: &AdvisorConfig,
    ) -> Self {
        Self {
            provider,
            composer,
            tracker,
            notifier,
            db,
            query,
            max_candidates: config.max_candidates,
        }
    }

    pub async fn run(&self, today: NaiveDate) {
        info!(%today, "daily pipeline starting");

        self.settle_outcomes(today).await;
        self.refresh_stocks().await;
        self.recommend(today).await;

        info!(%today, "daily pipeline finished");
    }

    async fn settle_outcomes(&self, today: NaiveDate) {
        match self.tracker.record_outcomes(today).await {
            Ok(updated) => {
                info!(updated, "outcomes recorded");
                match self.tracker.performance_summary(today).await {
                    // The notifier skips the send when there is nothing
                    // evaluated yet.
                    Ok((stats, recent)) => self.notifier.notify_performance(&stats, &recent).await,
                    Err(e) => warn!(error = %e, "performance summary unavailable"),
                }
            }
            Err(e) => error!(error = %e, "outcome tracking failed"),
        }
    }

    async fn refresh_stocks(&self) {
        match self.provider.get_stock_list().await {
            Ok(stocks) if stocks.is_empty() => {
                warn!("provider returned an empty stock list, keeping previous metadata");
            }
            Ok(stocks) => {
                if let Err(e) = self.db.replace_stocks(&stocks).await {
                    error!(error = %e, "stock metadata refresh failed");
                }
            }
            Err(e) => warn!(error = %e, "stock list fetch failed, keeping previous metadata"),
        }
    }

    async fn recommend(&self, today: NaiveDate) {
        let candidates = match select_candidates(
            self.provider.as_ref(),
            &self.db,
            &self.query,
            self.max_candidates,
        )
        .await
        {
            Ok(c) => c,
            Err(e) => {
                error!(error = %e, "candidate selection failed, skipping recommendations");
                return;
            }
        };
        if candidates.is_empty() {
            warn!("no candidates selected, skipping recommendations");
            return;
        }

        match self.composer.compose(candidates, today).await {
            Ok(recommendations) => {
                self.notifier.notify_recommendations(today, &recommendations).await;
            }
            Err(e) => error!(error = %e, "composer run failed"),
        }
    }
}

/// Installs the global tracing subscriber. Call once from the binary
/// entry point before anything logs.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
