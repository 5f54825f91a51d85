use std::collections::HashMap;
use std::sync::Arc;

use advisor_core::{
    Action, AdvisorError, AiOpinion, Bar, DisclosureItem, DisclosureSource, Market,
    MarketDataProvider, MarketFilter, MlScore, NewsItem, NewsSource, ReasoningClient, StockInfo,
};
use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use prediction_ensemble::PredictionEnsemble;
use sentiment_service::SentimentService;
use storage::Database;

use crate::analyzer::{apply_consistency_rule, StockAnalyzer};

pub(crate) struct MockProvider {
    pub bars: HashMap<String, Vec<Bar>>,
    pub stocks: Vec<StockInfo>,
    pub ranking: Vec<String>,
    pub hang: Option<String>,
}

impl MockProvider {
    pub fn new(bars: HashMap<String, Vec<Bar>>) -> Arc<Self> {
        Arc::new(Self { bars, stocks: Vec::new(), ranking: Vec::new(), hang: None })
    }
}

#[async_trait]
impl MarketDataProvider for MockProvider {
    async fn get_ohlcv(&self, code: &str, _days: i64) -> Result<Vec<Bar>, AdvisorError> {
        if self.hang.as_deref() == Some(code) {
            std::future::pending::<()>().await;
        }
        self.bars
            .get(code)
            .cloned()
            .ok_or_else(|| AdvisorError::Unavailable(format!("no data for {code}")))
    }

    async fn get_ohlcv_range(
        &self,
        _code: &str,
        _start: NaiveDate,
        _end: NaiveDate,
    ) -> Result<Vec<Bar>, AdvisorError> {
        Err(AdvisorError::Unavailable("not scripted".to_string()))
    }

    async fn get_stock_list(&self) -> Result<Vec<StockInfo>, AdvisorError> {
        Ok(self.stocks.clone())
    }

    async fn get_market_ranking(
        &self,
        limit: usize,
        _market: MarketFilter,
    ) -> Result<Vec<String>, AdvisorError> {
        Ok(self.ranking.iter().take(limit).cloned().collect())
    }
}

pub(crate) struct EmptyNews;

#[async_trait]
impl NewsSource for EmptyNews {
    async fn recent_news(&self, _entity_name: &str) -> Result<Vec<NewsItem>, AdvisorError> {
        Ok(Vec::new())
    }
}

pub(crate) struct EmptyDisclosures;

#[async_trait]
impl DisclosureSource for EmptyDisclosures {
    async fn recent_disclosures(
        &self,
        _code: &str,
        _days: i64,
    ) -> Result<Vec<DisclosureItem>, AdvisorError> {
        Ok(Vec::new())
    }
}

pub(crate) struct FixedReasoning {
    pub response: serde_json::Value,
    pub fail: bool,
}

#[async_trait]
impl ReasoningClient for FixedReasoning {
    async fn complete_json(
        &self,
        _system: &str,
        _user: &str,
    ) -> Result<serde_json::Value, AdvisorError> {
        if self.fail {
            Err(AdvisorError::Api("reasoning down".to_string()))
        } else {
            Ok(self.response.clone())
        }
    }
}

pub(crate) fn buy_opinion(target: f64) -> serde_json::Value {
    serde_json::json!({
        "summary": "Momentum intact",
        "strength": "trend",
        "weakness": "valuation",
        "reasoning": "indicators aligned",
        "action": "BUY",
        "target_price": target,
        "target_rationale": "range projection",
    })
}

pub(crate) fn series(n: usize, daily_growth: f64) -> Vec<Bar> {
    let first = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
    (0..n)
        .map(|i| {
            let close = 100.0 * daily_growth.powi(i as i32);
            Bar {
                date: first + Duration::days(i as i64),
                open: close,
                high: close * 1.01,
                low: close * 0.99,
                close,
                volume: 1_000_000.0,
                change: None,
            }
        })
        .collect()
}

pub(crate) fn stock(code: &str, name: &str) -> StockInfo {
    StockInfo {
        code: code.to_string(),
        name: name.to_string(),
        market: Market::Kospi,
        sector: None,
        industry: None,
    }
}

pub(crate) async fn build_analyzer(
    provider: Arc<MockProvider>,
    reasoning: Arc<FixedReasoning>,
) -> (Arc<StockAnalyzer>, Database) {
    let db = Database::in_memory().await.unwrap();
    let sentiment = Arc::new(SentimentService::new(
        reasoning.clone(),
        Arc::new(EmptyNews),
        Arc::new(EmptyDisclosures),
        db.clone(),
    ));
    let ensemble = Arc::new(PredictionEnsemble::from_models(Vec::new()));
    let analyzer =
        Arc::new(StockAnalyzer::new(provider, reasoning, ensemble, sentiment, db.clone()));
    (analyzer, db)
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 8, 29).unwrap()
}

#[tokio::test]
async fn analyze_blends_scores_and_repairs_the_opinion() {
    let bars = HashMap::from([
        ("005930".to_string(), series(160, 1.003)),
        ("KS11".to_string(), series(160, 1.001)),
    ]);
    let provider = MockProvider::new(bars);
    // Target far below the current price, which the consistency rule must
    // raise for a BUY call.
    let reasoning = Arc::new(FixedReasoning { response: buy_opinion(100.0), fail: false });
    let (analyzer, _db) = build_analyzer(provider, reasoning).await;

    let analysis = analyzer.analyze(&stock("005930", "Samsung Electronics"), today()).await.unwrap();

    // No models are loaded, so the ML score reuses the technical score.
    assert!(matches!(analysis.ml, MlScore::TechFallback { .. }));
    assert_eq!(analysis.ml.value(), analysis.tech_score);

    // Empty news and disclosures short-circuit to neutral sentiment.
    assert_eq!(analysis.sentiment.score, 0.0);
    let expected_blend = 0.65 * analysis.tech_score + 0.35 * 50.0;
    assert!((analysis.ml_blended - expected_blend).abs() < 1e-9);

    assert_eq!(analysis.opinion.action, Action::Buy);
    let expected_target = analysis.current_price * 1.03;
    assert!((analysis.opinion.target_price - expected_target).abs() < 1e-9);
    assert!(analysis.tech_score >= 0.0 && analysis.tech_score <= 100.0);
}

#[tokio::test]
async fn analyze_rejects_short_history() {
    let provider = MockProvider::new(HashMap::from([("005930".to_string(), series(20, 1.003))]));
    let reasoning = Arc::new(FixedReasoning { response: buy_opinion(120.0), fail: false });
    let (analyzer, _db) = build_analyzer(provider, reasoning).await;

    let err = analyzer.analyze(&stock("005930", "Samsung Electronics"), today()).await.unwrap_err();
    assert!(matches!(err, AdvisorError::InsufficientData(_)));
}

#[tokio::test]
async fn opinion_failure_degrades_to_na() {
    let bars = HashMap::from([("005930".to_string(), series(160, 1.003))]);
    let provider = MockProvider::new(bars);
    let reasoning = Arc::new(FixedReasoning { response: serde_json::Value::Null, fail: true });
    let (analyzer, _db) = build_analyzer(provider, reasoning).await;

    let analysis = analyzer.analyze(&stock("005930", "Samsung Electronics"), today()).await.unwrap();
    assert_eq!(analysis.opinion.action, Action::Na);
    assert_eq!(analysis.opinion.target_price, 0.0);
}

#[test]
fn consistency_rule_covers_every_branch() {
    let opinion = |action, target| AiOpinion { action, target_price: target, ..AiOpinion::unavailable() };

    // BUY aiming below the price gets a 3% upside target.
    let repaired = apply_consistency_rule(opinion(Action::Buy, 95.0), 100.0);
    assert_eq!(repaired.action, Action::Buy);
    assert!((repaired.target_price - 103.0).abs() < 1e-9);

    // HOLD implying more than 8% downside becomes a SELL.
    let repaired = apply_consistency_rule(opinion(Action::Hold, 90.0), 100.0);
    assert_eq!(repaired.action, Action::Sell);
    assert_eq!(repaired.target_price, 90.0);

    // SELL aiming above the price gets a 3% downside target.
    let repaired = apply_consistency_rule(opinion(Action::Sell, 105.0), 100.0);
    assert!((repaired.target_price - 97.0).abs() < 1e-9);

    // Consistent opinions pass through untouched.
    let repaired = apply_consistency_rule(opinion(Action::Buy, 110.0), 100.0);
    assert_eq!(repaired.target_price, 110.0);
    let repaired = apply_consistency_rule(opinion(Action::Hold, 95.0), 100.0);
    assert_eq!(repaired.action, Action::Hold);

    // Missing target: nothing to repair.
    let repaired = apply_consistency_rule(opinion(Action::Buy, 0.0), 100.0);
    assert_eq!(repaired.target_price, 0.0);
}
