pub mod dedup;
pub mod prompt;

use std::sync::Arc;
use std::time::Duration;

use advisor_core::{
    AdvisorError, DisclosureSource, NewsSource, ReasoningClient, SentimentResult,
};
use chrono::{NaiveDate, Utc};
use dashmap::DashMap;
use storage::Database;
use tracing::{debug, info, warn};


const DISCLOSURE_LOOKBACK_DAYS: i64 = 7;
const RATE_LIMIT_ATTEMPTS: u32 = 3;
const RATE_LIMIT_BACKOFF: Duration = Duration::from_secs(10);

/// Computes and caches daily sentiment per entity. Tier 1 is an
/// in-process map, tier 2 the durable store; a result computed on a miss
/// is written to both.
///
/// Two workers racing on the same key may both compute; the reasoning
/// call is idempotent for a given day, so last-write-wins is accepted
/// instead of locking.
pub struct SentimentService {
    reasoning: Arc<dyn ReasoningClient>,
    news: Arc<dyn NewsSource>,
    disclosures: Arc<dyn DisclosureSource>,
    db: Database,
    memory: DashMap<String, SentimentResult>,
}

impl SentimentService {
    pub fn new(
        reasoning: Arc<dyn ReasoningClient>,
        news: Arc<dyn NewsSource>,
        disclosures: Arc<dyn DisclosureSource>,
        db: Database,
    ) -> Self {
        Self { reasoning, news, disclosures, db, memory: DashMap::new() }
    }

    /// Sentiment for `(entity, today)`. Never fails: source and reasoning
    /// errors degrade to a neutral result.
    pub async fn sentiment_for(
        &self,
        entity_name: &str,
        code: &str,
        today: NaiveDate,
    ) -> SentimentResult {
        let key = format!("{entity_name}_{today}");

        if let Some(cached) = self.memory.get(&key) {
            debug!(key, "sentiment tier-1 hit");
            return cached.clone();
        }
        match self.db.get_sentiment(&key).await {
            Ok(Some(cached)) => {
                debug!(key, "sentiment tier-2 hit");
                self.memory.insert(key, cached.clone());
                return cached;
            }
            Ok(None) => {}
            Err(e) => warn!(key, error = %e, "sentiment tier-2 lookup failed"),
        }

        let result = self.compute(entity_name, code, today).await;
        if let Err(e) = self.db.put_sentiment(&key, &result).await {
            warn!(key, error = %e, "failed to persist sentiment");
        }
        self.memory.insert(key, result.clone());
        result
    }

    async fn compute(&self, entity_name: &str, code: &str, today: NaiveDate) -> SentimentResult {
        let news = match self.news.recent_news(entity_name).await {
            Ok(items) => items,
            Err(e) => {
                warn!(entity_name, error = %e, "news fetch failed");
                Vec::new()
            }
        };
        let disclosures = match self
            .disclosures
            .recent_disclosures(code, DISCLOSURE_LOOKBACK_DAYS)
            .await
        {
            Ok(items) => items,
            Err(e) => {
                warn!(code, error = %e, "disclosure fetch failed");
                Vec::new()
            }
        };

        if news.is_empty() && disclosures.is_empty() {
            // Nothing to score; skip the reasoning call entirely.
            return SentimentResult::neutral("no recent news or disclosures");
        }

        let news = dedup::relevance_filter(news, entity_name);
        let news = dedup::dedup_by_domain(news);
        let news = dedup::dedup_by_title(news);
        info!(entity_name, news = news.len(), disclosures = disclosures.len(), "scoring sentiment");

        let now = Utc::now();
        let user_prompt = prompt::build_prompt(entity_name, &news, &disclosures, now, today);

        let mut result = match self.complete_with_retry(&user_prompt).await {
            Ok(response) => parse_response(&response),
            Err(e) => {
                warn!(entity_name, error = %e, "sentiment reasoning failed");
                SentimentResult::neutral("sentiment scoring unavailable")
            }
        };
        result.items = news;
        result
    }

    /// Rate-limit errors get a short bounded retry with growing backoff;
    /// everything else fails immediately.
    async fn complete_with_retry(
        &self,
        user_prompt: &str,
    ) -> Result<serde_json::Value, AdvisorError> {
        let mut attempt = 1;
        loop {
            match self.reasoning.complete_json(prompt::SYSTEM_PROMPT, user_prompt).await {
                Ok(response) => return Ok(response),
                Err(AdvisorError::RateLimited(msg)) if attempt < RATE_LIMIT_ATTEMPTS => {
                    let wait = RATE_LIMIT_BACKOFF * attempt;
                    warn!(attempt, wait_secs = wait.as_secs(), msg, "rate limited, backing off");
                    tokio::time::sleep(wait).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

fn parse_response(response: &serde_json::Value) -> SentimentResult {
    let score = lenient_f64(&response["sentiment_score"]).unwrap_or(0.0).clamp(-100.0, 100.0);
    let label = response["label"].as_str().unwrap_or("Neutral").to_string();
    let reason = response["reason"].as_str().unwrap_or_default().to_string();
    let top_item = response["top_item"].as_str().map(str::to_string);
    SentimentResult { score, label, reason, top_item, items: Vec::new() }
}

fn lenient_f64(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
