use advisor_core::{
    Action, AiOpinion, HorizonOutcome, IndicatorSnapshot, Market, MlScore, PriceStats,
    ScoredRecommendation, SentimentResult, StockAnalysis, StockInfo,
};
use chrono::{NaiveDate, Utc};

use crate::Database;

fn analysis(code: &str, name: &str, price: f64, composite: f64) -> ScoredRecommendation {
    ScoredRecommendation {
        analysis: StockAnalysis {
            code: code.to_string(),
            name: name.to_string(),
            market: Market::Kospi,
            sector: Some("Semiconductors".to_string()),
            current_price: price,
            change_pct: 1.2,
            tech_score: 70.0,
            ml: MlScore::Ensemble { score: 65.0, model_count: 2 },
            ml_blended: 62.0,
            sentiment: SentimentResult::neutral("fixture"),
            stats: PriceStats {
                high_52w: price * 1.3,
                low_52w: price * 0.7,
                avg_volume: 1_000_000.0,
                current_volume: 1_200_000.0,
            },
            indicators: IndicatorSnapshot {
                rsi: 55.0,
                macd: 1.0,
                macd_signal: 0.5,
                sma_20: price * 0.97,
                bb_position: 0.6,
            },
            opinion: AiOpinion {
                summary: "fixture".to_string(),
                action: Action::Buy,
                target_price: price * 1.1,
                ..AiOpinion::unavailable()
            },
            analyzed_at: Utc::now(),
        },
        composite_score: composite,
        source: "ADVISOR_V1".to_string(),
    }
}

fn date(s: &str) -> NaiveDate {
    s.parse().unwrap()
}

#[tokio::test]
async fn recommendation_upsert_is_idempotent_per_session() {
    let db = Database::in_memory().await.unwrap();
    let session = date("2025-08-01");

    db.save_recommendations(session, &[analysis("005930", "Samsung Electronics", 70000.0, 72.0)])
        .await
        .unwrap();
    db.save_recommendations(session, &[analysis("005930", "Samsung Electronics", 70000.0, 81.5)])
        .await
        .unwrap();

    let saved = db.recommendations_for(session).await.unwrap();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].composite_score, 81.5);
}

#[tokio::test]
async fn recommendations_ranked_by_score() {
    let db = Database::in_memory().await.unwrap();
    let session = date("2025-08-01");
    db.save_recommendations(
        session,
        &[
            analysis("005930", "Samsung Electronics", 70000.0, 64.0),
            analysis("000660", "SK Hynix", 180000.0, 77.0),
        ],
    )
    .await
    .unwrap();

    let saved = db.recommendations_for(session).await.unwrap();
    assert_eq!(saved[0].analysis.code, "000660");
    assert_eq!(saved[1].analysis.code, "005930");

    // Another session is invisible to this query.
    assert!(db.recommendations_for(date("2025-08-02")).await.unwrap().is_empty());
}

#[tokio::test]
async fn sentiment_cache_round_trip_and_overwrite() {
    let db = Database::in_memory().await.unwrap();
    let key = "Samsung Electronics_2025-08-01";
    assert!(db.get_sentiment(key).await.unwrap().is_none());

    let mut result = SentimentResult::neutral("no news");
    db.put_sentiment(key, &result).await.unwrap();
    assert_eq!(db.get_sentiment(key).await.unwrap().unwrap().score, 0.0);

    result.score = 42.0;
    result.label = "Positive".to_string();
    db.put_sentiment(key, &result).await.unwrap();
    let cached = db.get_sentiment(key).await.unwrap().unwrap();
    assert_eq!(cached.score, 42.0);
    assert_eq!(cached.label, "Positive");
}

#[tokio::test]
async fn outcome_horizons_are_write_once() {
    let db = Database::in_memory().await.unwrap();
    let session = date("2025-07-01");
    db.save_recommendations(session, &[analysis("005930", "Samsung Electronics", 70000.0, 70.0)])
        .await
        .unwrap();

    let pending = db.pending_outcomes().await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].code, "005930");
    assert!(pending[0].price_5d.is_none());

    db.ensure_outcome_row(&pending[0]).await.unwrap();
    db.record_horizon(
        "005930",
        session,
        5,
        HorizonOutcome { price: 72100.0, return_pct: 3.0, correct: true },
    )
    .await
    .unwrap();

    // A second write for the same horizon must not change anything.
    db.record_horizon(
        "005930",
        session,
        5,
        HorizonOutcome { price: 1.0, return_pct: -99.0, correct: false },
    )
    .await
    .unwrap();

    let pending = db.pending_outcomes().await.unwrap();
    assert_eq!(pending[0].price_5d, Some(72100.0));

    // Completing the 20-day horizon removes the record from the queue.
    db.record_horizon(
        "005930",
        session,
        20,
        HorizonOutcome { price: 74000.0, return_pct: 5.7, correct: true },
    )
    .await
    .unwrap();
    db.set_target_hit("005930", session, false).await.unwrap();
    assert!(db.pending_outcomes().await.unwrap().is_empty());
}

#[tokio::test]
async fn unsupported_horizon_is_rejected() {
    let db = Database::in_memory().await.unwrap();
    let err = db
        .record_horizon(
            "005930",
            date("2025-07-01"),
            7,
            HorizonOutcome { price: 1.0, return_pct: 0.0, correct: false },
        )
        .await;
    assert!(err.is_err());
}

#[tokio::test]
async fn outcome_stats_aggregate_evaluated_horizons() {
    let db = Database::in_memory().await.unwrap();
    let today = date("2025-08-29");

    for (code, session, ret_5d, correct_5d) in [
        ("005930", date("2025-08-01"), 3.0, true),
        ("000660", date("2025-08-05"), -2.0, false),
    ] {
        db.save_recommendations(session, &[analysis(code, code, 50000.0, 70.0)])
            .await
            .unwrap();
        let pending = db.pending_outcomes().await.unwrap();
        let mine = pending.iter().find(|p| p.code == code).unwrap();
        db.ensure_outcome_row(mine).await.unwrap();
        db.record_horizon(
            code,
            session,
            5,
            HorizonOutcome { price: 1.0, return_pct: ret_5d, correct: correct_5d },
        )
        .await
        .unwrap();
    }
    db.set_target_hit("005930", date("2025-08-01"), true).await.unwrap();

    let stats = db.outcome_stats(today, 90).await.unwrap();
    assert_eq!(stats.total, 2);
    assert_eq!(stats.evaluated_5d, 2);
    assert_eq!(stats.evaluated_20d, 0);
    assert_eq!(stats.win_rate_5d, 50.0);
    assert!((stats.avg_return_5d - 0.5).abs() < 1e-9);
    assert_eq!(stats.target_hit_rate, Some(100.0));

    let recent = db.recent_outcomes(today, 30).await.unwrap();
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0].session_date, date("2025-08-05"));
    assert!(recent[0].outcome_5d.is_some());
    assert!(recent[0].outcome_20d.is_none());
}

#[tokio::test]
async fn stock_list_replacement() {
    let db = Database::in_memory().await.unwrap();
    let first = vec![StockInfo {
        code: "005930".to_string(),
        name: "Samsung Electronics".to_string(),
        market: Market::Kospi,
        sector: Some("Tech".to_string()),
        industry: None,
    }];
    db.replace_stocks(&first).await.unwrap();

    let second = vec![StockInfo {
        code: "035720".to_string(),
        name: "Kakao".to_string(),
        market: Market::Kosdaq,
        sector: None,
        industry: Some("Internet".to_string()),
    }];
    db.replace_stocks(&second).await.unwrap();

    let stocks = db.get_stocks().await.unwrap();
    assert_eq!(stocks.len(), 1);
    assert_eq!(stocks[0].code, "035720");
    assert_eq!(stocks[0].market, Market::Kosdaq);
}

#[tokio::test]
async fn analysis_history_appends() {
    let db = Database::in_memory().await.unwrap();
    let rec = analysis("005930", "Samsung Electronics", 70000.0, 70.0);
    db.save_analysis(&rec.analysis).await.unwrap();
    db.save_analysis(&rec.analysis).await.unwrap();
}
