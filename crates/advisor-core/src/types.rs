use chrono::{DateTime, NaiveDate, Utc};
use serde::de::Deserializer;
use serde::{Deserialize, Serialize};

/// A single daily OHLCV bar.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    /// Day-over-day change ratio if the provider supplies it.
    #[serde(default)]
    pub change: Option<f64>,
}

/// Listing venue of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Market {
    #[serde(rename = "KOSPI")]
    Kospi,
    #[serde(rename = "KOSDAQ")]
    Kosdaq,
}

impl Market {
    /// Benchmark index code used for market-relative features.
    pub fn benchmark_code(&self) -> &'static str {
        match self {
            Market::Kospi => "KS11",
            Market::Kosdaq => "KQ11",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Market::Kospi => "KOSPI",
            Market::Kosdaq => "KOSDAQ",
        }
    }
}

/// Venue filter for market-ranking queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MarketFilter {
    #[default]
    All,
    Kospi,
    Kosdaq,
}

impl MarketFilter {
    pub fn matches(&self, market: Market) -> bool {
        match self {
            MarketFilter::All => true,
            MarketFilter::Kospi => market == Market::Kospi,
            MarketFilter::Kosdaq => market == Market::Kosdaq,
        }
    }
}

/// Listed-entity metadata from the market data provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockInfo {
    pub code: String,
    pub name: String,
    pub market: Market,
    #[serde(default)]
    pub sector: Option<String>,
    #[serde(default)]
    pub industry: Option<String>,
}

/// A news headline as returned by the news source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsItem {
    pub title: String,
    pub link: String,
    #[serde(default)]
    pub original_link: Option<String>,
    #[serde(default)]
    pub published: Option<DateTime<Utc>>,
}

impl NewsItem {
    /// Whole days elapsed since publication. Items with no parseable
    /// timestamp are treated as a week old so they decay to near zero.
    pub fn days_ago(&self, now: DateTime<Utc>) -> i64 {
        match self.published {
            Some(ts) => (now - ts).num_days().max(0),
            None => 7,
        }
    }
}

/// A corporate disclosure filing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisclosureItem {
    pub title: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub category: Option<String>,
}

/// Cached sentiment for one (entity, calendar day) key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentimentResult {
    /// [-100, 100]; positive = bullish.
    pub score: f64,
    pub label: String,
    pub reason: String,
    #[serde(default)]
    pub top_item: Option<String>,
    #[serde(default)]
    pub items: Vec<NewsItem>,
}

impl SentimentResult {
    pub fn neutral(reason: impl Into<String>) -> Self {
        Self {
            score: 0.0,
            label: "Neutral".to_string(),
            reason: reason.into(),
            top_item: None,
            items: Vec::new(),
        }
    }

    /// Score rescaled from [-100, 100] to [0, 100] for composite blending.
    pub fn normalized(&self) -> f64 {
        (self.score + 100.0) / 2.0
    }
}

/// Which path produced the ML score. The composer weights each mode
/// differently, so the mode travels with the number.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum MlScore {
    /// Reliability-weighted average over the active models.
    Ensemble { score: f64, model_count: usize },
    /// No active models; the caller-supplied technical score was reused.
    TechFallback { score: f64 },
    /// No active models and no fallback given; closed-form heuristic.
    Heuristic { score: f64 },
}

impl MlScore {
    pub fn value(&self) -> f64 {
        match self {
            MlScore::Ensemble { score, .. }
            | MlScore::TechFallback { score }
            | MlScore::Heuristic { score } => *score,
        }
    }

    pub fn model_count(&self) -> usize {
        match self {
            MlScore::Ensemble { model_count, .. } => *model_count,
            _ => 0,
        }
    }

    pub fn is_fallback(&self) -> bool {
        !matches!(self, MlScore::Ensemble { .. })
    }
}

/// Recommended action from the qualitative opinion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Action {
    #[serde(rename = "BUY")]
    Buy,
    #[default]
    #[serde(rename = "HOLD")]
    Hold,
    #[serde(rename = "SELL")]
    Sell,
    /// Opinion generation failed; excluded from outcome evaluation.
    #[serde(rename = "N/A", other)]
    Na,
}

impl Action {
    pub fn label(&self) -> &'static str {
        match self {
            Action::Buy => "BUY",
            Action::Hold => "HOLD",
            Action::Sell => "SELL",
            Action::Na => "N/A",
        }
    }
}

/// Structured qualitative opinion from the reasoning service.
///
/// The reasoning call occasionally returns lists where strings are expected
/// and formatted strings where numbers are expected; those shapes are
/// normalized here at the boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiOpinion {
    #[serde(default, deserialize_with = "flexible_string")]
    pub summary: String,
    #[serde(default, deserialize_with = "flexible_string")]
    pub strength: String,
    #[serde(default, deserialize_with = "flexible_string")]
    pub weakness: String,
    #[serde(default, deserialize_with = "flexible_string")]
    pub reasoning: String,
    #[serde(default)]
    pub action: Action,
    #[serde(default, deserialize_with = "flexible_price")]
    pub target_price: f64,
    #[serde(default, deserialize_with = "flexible_string")]
    pub target_rationale: String,
}

impl AiOpinion {
    /// Default opinion when the reasoning call fails outright.
    pub fn unavailable() -> Self {
        Self {
            summary: "Opinion generation failed".to_string(),
            strength: String::new(),
            weakness: String::new(),
            reasoning: String::new(),
            action: Action::Na,
            target_price: 0.0,
            target_rationale: String::new(),
        }
    }
}

fn flexible_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(stringify_value(&value))
}

fn stringify_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.trim().to_string(),
        serde_json::Value::Array(items) => items
            .iter()
            .map(stringify_value)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" · "),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        serde_json::Value::Null | serde_json::Value::Object(_) => String::new(),
    }
}

fn flexible_price<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Number(n) => n.as_f64().unwrap_or(0.0),
        serde_json::Value::String(s) => {
            let cleaned: String = s
                .chars()
                .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
                .collect();
            cleaned.parse().unwrap_or(0.0)
        }
        _ => 0.0,
    })
}

/// 52-week range and volume context for display and prompts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceStats {
    pub high_52w: f64,
    pub low_52w: f64,
    pub avg_volume: f64,
    pub current_volume: f64,
}

/// Latest-row indicator values carried on the analysis snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub rsi: f64,
    pub macd: f64,
    pub macd_signal: f64,
    pub sma_20: f64,
    pub bb_position: f64,
}

/// Full per-entity analysis snapshot. Immutable once written to history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockAnalysis {
    pub code: String,
    pub name: String,
    pub market: Market,
    #[serde(default)]
    pub sector: Option<String>,
    pub current_price: f64,
    pub change_pct: f64,
    pub tech_score: f64,
    /// Feeds the composite score; mode determines the weighting branch.
    pub ml: MlScore,
    /// Display-only blend of ML and sentiment; never feeds the composite.
    pub ml_blended: f64,
    pub sentiment: SentimentResult,
    pub stats: PriceStats,
    pub indicators: IndicatorSnapshot,
    pub opinion: AiOpinion,
    pub analyzed_at: DateTime<Utc>,
}

/// A ranked analysis ready for persistence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredRecommendation {
    pub analysis: StockAnalysis,
    pub composite_score: f64,
    pub source: String,
}

/// A persisted recommendation still awaiting its 20-day outcome.
#[derive(Debug, Clone)]
pub struct PendingRecommendation {
    pub code: String,
    pub name: String,
    pub session_date: NaiveDate,
    pub action: Action,
    pub entry_price: Option<f64>,
    pub target_price: Option<f64>,
    pub price_5d: Option<f64>,
    pub price_10d: Option<f64>,
    pub price_20d: Option<f64>,
}

/// Realized result at one horizon.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct HorizonOutcome {
    pub price: f64,
    pub return_pct: f64,
    pub correct: bool,
}

/// Aggregate hit-rate statistics over a trailing window.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutcomeStats {
    pub total: i64,
    pub evaluated_5d: i64,
    pub evaluated_10d: i64,
    pub evaluated_20d: i64,
    pub win_rate_5d: f64,
    pub win_rate_10d: f64,
    pub win_rate_20d: f64,
    pub avg_return_5d: f64,
    pub avg_return_10d: f64,
    pub avg_return_20d: f64,
    pub target_hit_rate: Option<f64>,
}

/// One recently evaluated recommendation, for the performance report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecentOutcome {
    pub code: String,
    pub name: String,
    pub session_date: NaiveDate,
    pub action: Action,
    pub outcome_5d: Option<HorizonOutcome>,
    pub outcome_10d: Option<HorizonOutcome>,
    pub outcome_20d: Option<HorizonOutcome>,
}
