use std::sync::Arc;
use std::time::Duration;

use advisor_core::{
    AdvisorConfig, AdvisorError, MlScore, ScoredRecommendation, StockAnalysis, StockInfo,
};
use chrono::NaiveDate;
use storage::Database;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::analyzer::StockAnalyzer;

pub const SOURCE_TAG: &str = "ADVISOR_V1";

/// Composite recommendation score. With an active ensemble all three
/// signals contribute; in a fallback mode the ensemble term is dropped
/// entirely so the technical score is not counted twice.
pub fn composite_score(analysis: &StockAnalysis) -> f64 {
    let sentiment = analysis.sentiment.normalized();
    match analysis.ml {
        MlScore::Ensemble { score, .. } => {
            0.40 * analysis.tech_score + 0.35 * score + 0.25 * sentiment
        }
        _ => 0.65 * analysis.tech_score + 0.35 * sentiment,
    }
}

/// Fans out per-entity analysis with bounded concurrency, ranks by the
/// composite score, and persists the top N for the session.
pub struct Composer {
    analyzer: Arc<StockAnalyzer>,
    db: Database,
    worker_count: usize,
    task_timeout: Duration,
    top_n: usize,
}

impl Composer {
    pub fn new(analyzer: Arc<StockAnalyzer>, db: Database, config: &AdvisorConfig) -> Self {
        Self {
            analyzer,
            db,
            worker_count: config.worker_count.max(1),
            task_timeout: config.task_timeout,
            top_n: config.top_n,
        }
    }

    /// Analyzes every candidate and persists the ranked top N. Candidates
    /// that error or exceed the per-task timeout are dropped from this
    /// run, not retried.
    pub async fn compose(
        &self,
        candidates: Vec<StockInfo>,
        today: NaiveDate,
    ) -> Result<Vec<ScoredRecommendation>, AdvisorError> {
        let total = candidates.len();
        let semaphore = Arc::new(Semaphore::new(self.worker_count));
        let mut tasks: JoinSet<Option<StockAnalysis>> = JoinSet::new();

        for stock in candidates {
            let analyzer = self.analyzer.clone();
            let semaphore = semaphore.clone();
            let task_timeout = self.task_timeout;
            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok()?;
                match tokio::time::timeout(task_timeout, analyzer.analyze(&stock, today)).await {
                    Ok(Ok(analysis)) => Some(analysis),
                    Ok(Err(e)) => {
                        warn!(code = %stock.code, error = %e, "analysis failed, dropping candidate");
                        None
                    }
                    Err(_) => {
                        warn!(code = %stock.code, "analysis timed out, dropping candidate");
                        None
                    }
                }
            });
        }

        let mut scored = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Some(analysis)) => scored.push(ScoredRecommendation {
                    composite_score: composite_score(&analysis),
                    analysis,
                    source: SOURCE_TAG.to_string(),
                }),
                Ok(None) => {}
                Err(e) => warn!(error = %e, "analysis task aborted"),
            }
        }

        scored.sort_by(|a, b| b.composite_score.total_cmp(&a.composite_score));
        scored.truncate(self.top_n);
        self.db.save_recommendations(today, &scored).await?;

        info!(analyzed = total, selected = scored.len(), %today, "composer run complete");
        Ok(scored)
    }
}
