use chrono::{Duration, Utc};
use serde_json::json;

use crate::*;

#[test]
fn ml_score_value_and_count_per_mode() {
    let ensemble = MlScore::Ensemble { score: 62.5, model_count: 3 };
    assert_eq!(ensemble.value(), 62.5);
    assert_eq!(ensemble.model_count(), 3);
    assert!(!ensemble.is_fallback());

    let tech = MlScore::TechFallback { score: 48.0 };
    assert_eq!(tech.value(), 48.0);
    assert_eq!(tech.model_count(), 0);
    assert!(tech.is_fallback());

    let heuristic = MlScore::Heuristic { score: 50.0 };
    assert_eq!(heuristic.model_count(), 0);
    assert!(heuristic.is_fallback());
}

#[test]
fn sentiment_normalization_maps_full_range() {
    assert_eq!(SentimentResult::neutral("no items").normalized(), 50.0);

    let mut bullish = SentimentResult::neutral("");
    bullish.score = 100.0;
    assert_eq!(bullish.normalized(), 100.0);

    let mut bearish = SentimentResult::neutral("");
    bearish.score = -100.0;
    assert_eq!(bearish.normalized(), 0.0);
}

#[test]
fn opinion_parses_clean_response() {
    let raw = json!({
        "summary": "Strong earnings momentum",
        "strength": "Export growth",
        "weakness": "Valuation",
        "reasoning": "Uptrend intact",
        "action": "BUY",
        "target_price": 75000.0,
        "target_rationale": "12x forward earnings"
    });
    let opinion: AiOpinion = serde_json::from_value(raw).unwrap();
    assert_eq!(opinion.action, Action::Buy);
    assert_eq!(opinion.target_price, 75000.0);
    assert_eq!(opinion.summary, "Strong earnings momentum");
}

#[test]
fn opinion_normalizes_list_fields_and_price_strings() {
    let raw = json!({
        "summary": ["Solid quarter", "Guidance raised"],
        "action": "SELL",
        "target_price": "68,500 KRW"
    });
    let opinion: AiOpinion = serde_json::from_value(raw).unwrap();
    assert_eq!(opinion.summary, "Solid quarter · Guidance raised");
    assert_eq!(opinion.action, Action::Sell);
    assert_eq!(opinion.target_price, 68500.0);
    assert_eq!(opinion.strength, "");
}

#[test]
fn opinion_tolerates_unknown_action_and_missing_fields() {
    let raw = json!({ "action": "ACCUMULATE" });
    let opinion: AiOpinion = serde_json::from_value(raw).unwrap();
    assert_eq!(opinion.action, Action::Na);
    assert_eq!(opinion.target_price, 0.0);

    let empty: AiOpinion = serde_json::from_value(json!({})).unwrap();
    assert_eq!(empty.action, Action::Hold);
}

#[test]
fn news_item_days_ago_defaults_to_week_without_timestamp() {
    let now = Utc::now();
    let fresh = NewsItem {
        title: "t".into(),
        link: "https://a.example/1".into(),
        original_link: None,
        published: Some(now - Duration::hours(5)),
    };
    assert_eq!(fresh.days_ago(now), 0);

    let dated = NewsItem { published: Some(now - Duration::days(3)), ..fresh.clone() };
    assert_eq!(dated.days_ago(now), 3);

    let unknown = NewsItem { published: None, ..fresh };
    assert_eq!(unknown.days_ago(now), 7);
}

#[test]
fn market_benchmark_codes() {
    assert_eq!(Market::Kospi.benchmark_code(), "KS11");
    assert_eq!(Market::Kosdaq.benchmark_code(), "KQ11");
    assert!(MarketFilter::All.matches(Market::Kosdaq));
    assert!(!MarketFilter::Kospi.matches(Market::Kosdaq));
}
