use std::path::Path;
use std::str::FromStr;

use advisor_core::{
    Action, AdvisorError, HorizonOutcome, Market, OutcomeStats, PendingRecommendation,
    RecentOutcome, ScoredRecommendation, SentimentResult, StockAnalysis, StockInfo,
};
use chrono::NaiveDate;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use tracing::{info, warn};

use crate::schema::SCHEMA;

/// SQLite-backed durable store. Cheap to clone; all methods take `&self`.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Opens (creating if needed) the database file and bootstraps the
    /// schema.
    pub async fn connect(path: &str) -> Result<Self, AdvisorError> {
        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| AdvisorError::Database(e.to_string()))?;
            }
        }

        let options = SqliteConnectOptions::from_str(&format!("sqlite://{path}"))
            .map_err(db_err)?
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(db_err)?;

        let db = Self { pool };
        db.init_schema().await?;
        info!(path, "database ready");
        Ok(db)
    }

    /// In-memory database for tests. Single connection so every query
    /// sees the same memory instance.
    pub async fn in_memory() -> Result<Self, AdvisorError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(db_err)?;
        let db = Self { pool };
        db.init_schema().await?;
        Ok(db)
    }

    async fn init_schema(&self) -> Result<(), AdvisorError> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await.map_err(db_err)?;
        }
        Ok(())
    }

    // --- stock metadata ---

    pub async fn replace_stocks(&self, stocks: &[StockInfo]) -> Result<(), AdvisorError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        sqlx::query("DELETE FROM stocks").execute(&mut *tx).await.map_err(db_err)?;
        for stock in stocks {
            sqlx::query(
                "INSERT INTO stocks (code, name, market, sector, industry)
                 VALUES (?, ?, ?, ?, ?)",
            )
            .bind(&stock.code)
            .bind(&stock.name)
            .bind(stock.market.label())
            .bind(&stock.sector)
            .bind(&stock.industry)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        }
        tx.commit().await.map_err(db_err)?;
        info!(count = stocks.len(), "stock list refreshed");
        Ok(())
    }

    pub async fn get_stocks(&self) -> Result<Vec<StockInfo>, AdvisorError> {
        let rows = sqlx::query("SELECT code, name, market, sector, industry FROM stocks")
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(rows
            .into_iter()
            .map(|row| StockInfo {
                code: row.get("code"),
                name: row.get("name"),
                market: market_from(&row.get::<String, _>("market")),
                sector: row.get("sector"),
                industry: row.get("industry"),
            })
            .collect())
    }

    // --- recommendations ---

    /// Persists a session's recommendations. Each (code, session_date)
    /// pair is replaced, never duplicated, and the whole batch commits as
    /// one transaction.
    pub async fn save_recommendations(
        &self,
        session_date: NaiveDate,
        recommendations: &[ScoredRecommendation],
    ) -> Result<(), AdvisorError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        for rec in recommendations {
            let analysis = &rec.analysis;
            let detail = serde_json::to_string(rec)
                .map_err(|e| AdvisorError::Parse(e.to_string()))?;

            sqlx::query("DELETE FROM recommendations WHERE code = ? AND session_date = ?")
                .bind(&analysis.code)
                .bind(session_date)
                .execute(&mut *tx)
                .await
                .map_err(db_err)?;

            sqlx::query(
                "INSERT INTO recommendations
                 (code, name, action, composite_score, reason, entry_price,
                  target_price, source, detail_json, session_date)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&analysis.code)
            .bind(&analysis.name)
            .bind(analysis.opinion.action.label())
            .bind(rec.composite_score)
            .bind(&analysis.opinion.summary)
            .bind(analysis.current_price)
            .bind(analysis.opinion.target_price)
            .bind(&rec.source)
            .bind(detail)
            .bind(session_date)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        }
        tx.commit().await.map_err(db_err)?;
        info!(count = recommendations.len(), %session_date, "recommendations saved");
        Ok(())
    }

    pub async fn recommendations_for(
        &self,
        session_date: NaiveDate,
    ) -> Result<Vec<ScoredRecommendation>, AdvisorError> {
        let rows = sqlx::query(
            "SELECT detail_json FROM recommendations
             WHERE session_date = ? ORDER BY composite_score DESC",
        )
        .bind(session_date)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        let mut results = Vec::with_capacity(rows.len());
        for row in rows {
            let raw: String = row.get("detail_json");
            match serde_json::from_str(&raw) {
                Ok(rec) => results.push(rec),
                Err(e) => warn!(error = %e, "skipping unreadable recommendation detail"),
            }
        }
        Ok(results)
    }

    // --- analysis history ---

    pub async fn save_analysis(&self, analysis: &StockAnalysis) -> Result<(), AdvisorError> {
        let payload =
            serde_json::to_string(analysis).map_err(|e| AdvisorError::Parse(e.to_string()))?;
        sqlx::query("INSERT INTO analysis_history (code, name, analysis_json) VALUES (?, ?, ?)")
            .bind(&analysis.code)
            .bind(&analysis.name)
            .bind(payload)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    // --- sentiment cache (tier 2) ---

    pub async fn get_sentiment(&self, key: &str) -> Result<Option<SentimentResult>, AdvisorError> {
        let row = sqlx::query("SELECT payload FROM sentiment_cache WHERE cache_key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(row.and_then(|r| {
            let raw: String = r.get("payload");
            match serde_json::from_str(&raw) {
                Ok(result) => Some(result),
                Err(e) => {
                    warn!(key, error = %e, "dropping unreadable cached sentiment");
                    None
                }
            }
        }))
    }

    pub async fn put_sentiment(
        &self,
        key: &str,
        result: &SentimentResult,
    ) -> Result<(), AdvisorError> {
        let payload =
            serde_json::to_string(result).map_err(|e| AdvisorError::Parse(e.to_string()))?;
        sqlx::query(
            "INSERT INTO sentiment_cache (cache_key, payload) VALUES (?, ?)
             ON CONFLICT (cache_key) DO UPDATE SET payload = excluded.payload",
        )
        .bind(key)
        .bind(payload)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    // --- outcomes ---

    /// Recommendations whose 20-day outcome has not been recorded yet.
    pub async fn pending_outcomes(&self) -> Result<Vec<PendingRecommendation>, AdvisorError> {
        let rows = sqlx::query(
            "SELECT r.code, r.name, r.session_date, r.action, r.entry_price,
                    r.target_price, o.price_5d, o.price_10d, o.price_20d
             FROM recommendations r
             LEFT JOIN recommendation_outcomes o
               ON o.code = r.code AND o.session_date = r.session_date
             WHERE o.correct_20d IS NULL
             ORDER BY r.session_date",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(rows
            .into_iter()
            .map(|row| PendingRecommendation {
                code: row.get("code"),
                name: row.get("name"),
                session_date: row.get("session_date"),
                action: action_from(&row.get::<String, _>("action")),
                entry_price: row.get("entry_price"),
                target_price: row.get("target_price"),
                price_5d: row.get("price_5d"),
                price_10d: row.get("price_10d"),
                price_20d: row.get("price_20d"),
            })
            .collect())
    }

    /// Makes sure an outcome row exists for the pair; existing rows are
    /// left untouched.
    pub async fn ensure_outcome_row(
        &self,
        pending: &PendingRecommendation,
    ) -> Result<(), AdvisorError> {
        sqlx::query(
            "INSERT OR IGNORE INTO recommendation_outcomes
             (code, session_date, action, entry_price, target_price)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&pending.code)
        .bind(pending.session_date)
        .bind(pending.action.label())
        .bind(pending.entry_price)
        .bind(pending.target_price)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    /// Records one horizon's realized outcome. COALESCE keeps any value
    /// that was already written, making the update write-once.
    pub async fn record_horizon(
        &self,
        code: &str,
        session_date: NaiveDate,
        horizon_days: u32,
        outcome: HorizonOutcome,
    ) -> Result<(), AdvisorError> {
        let statement = match horizon_days {
            5 => {
                "UPDATE recommendation_outcomes SET
                    price_5d = COALESCE(price_5d, ?),
                    return_5d = COALESCE(return_5d, ?),
                    correct_5d = COALESCE(correct_5d, ?),
                    updated_at = datetime('now')
                 WHERE code = ? AND session_date = ?"
            }
            10 => {
                "UPDATE recommendation_outcomes SET
                    price_10d = COALESCE(price_10d, ?),
                    return_10d = COALESCE(return_10d, ?),
                    correct_10d = COALESCE(correct_10d, ?),
                    updated_at = datetime('now')
                 WHERE code = ? AND session_date = ?"
            }
            20 => {
                "UPDATE recommendation_outcomes SET
                    price_20d = COALESCE(price_20d, ?),
                    return_20d = COALESCE(return_20d, ?),
                    correct_20d = COALESCE(correct_20d, ?),
                    updated_at = datetime('now')
                 WHERE code = ? AND session_date = ?"
            }
            other => {
                return Err(AdvisorError::InvalidData(format!(
                    "unsupported outcome horizon: {other}"
                )))
            }
        };

        sqlx::query(statement)
            .bind(outcome.price)
            .bind(outcome.return_pct)
            .bind(outcome.correct as i64)
            .bind(code)
            .bind(session_date)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    /// Records whether the 20-day price crossed the target favorably.
    /// Write-once like the horizon fields.
    pub async fn set_target_hit(
        &self,
        code: &str,
        session_date: NaiveDate,
        hit: bool,
    ) -> Result<(), AdvisorError> {
        sqlx::query(
            "UPDATE recommendation_outcomes
             SET target_hit = COALESCE(target_hit, ?), updated_at = datetime('now')
             WHERE code = ? AND session_date = ?",
        )
        .bind(hit as i64)
        .bind(code)
        .bind(session_date)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    /// Aggregate hit-rate statistics over recommendations made in the
    /// trailing window.
    pub async fn outcome_stats(
        &self,
        today: NaiveDate,
        window_days: i64,
    ) -> Result<OutcomeStats, AdvisorError> {
        let cutoff = today - chrono::Duration::days(window_days);
        let rows = sqlx::query(
            "SELECT action, return_5d, correct_5d, return_10d, correct_10d,
                    return_20d, correct_20d, target_hit
             FROM recommendation_outcomes
             WHERE session_date >= ?",
        )
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        let mut stats = OutcomeStats { total: rows.len() as i64, ..Default::default() };
        let mut sums = [0.0f64; 3];
        let mut wins = [0i64; 3];
        let mut evaluated = [0i64; 3];
        let mut target_hits = 0i64;
        let mut target_evaluated = 0i64;

        for row in &rows {
            let horizons: [(Option<f64>, Option<i64>); 3] = [
                (row.get("return_5d"), row.get("correct_5d")),
                (row.get("return_10d"), row.get("correct_10d")),
                (row.get("return_20d"), row.get("correct_20d")),
            ];
            for (idx, (ret, correct)) in horizons.into_iter().enumerate() {
                if let (Some(ret), Some(correct)) = (ret, correct) {
                    evaluated[idx] += 1;
                    sums[idx] += ret;
                    if correct != 0 {
                        wins[idx] += 1;
                    }
                }
            }
            if let Some(hit) = row.get::<Option<i64>, _>("target_hit") {
                target_evaluated += 1;
                if hit != 0 {
                    target_hits += 1;
                }
            }
        }

        let rate = |wins: i64, n: i64| if n > 0 { wins as f64 / n as f64 * 100.0 } else { 0.0 };
        let avg = |sum: f64, n: i64| if n > 0 { sum / n as f64 } else { 0.0 };

        stats.evaluated_5d = evaluated[0];
        stats.evaluated_10d = evaluated[1];
        stats.evaluated_20d = evaluated[2];
        stats.win_rate_5d = rate(wins[0], evaluated[0]);
        stats.win_rate_10d = rate(wins[1], evaluated[1]);
        stats.win_rate_20d = rate(wins[2], evaluated[2]);
        stats.avg_return_5d = avg(sums[0], evaluated[0]);
        stats.avg_return_10d = avg(sums[1], evaluated[1]);
        stats.avg_return_20d = avg(sums[2], evaluated[2]);
        stats.target_hit_rate =
            (target_evaluated > 0).then(|| rate(target_hits, target_evaluated));
        Ok(stats)
    }

    /// Recently evaluated recommendations, newest first.
    pub async fn recent_outcomes(
        &self,
        today: NaiveDate,
        window_days: i64,
    ) -> Result<Vec<RecentOutcome>, AdvisorError> {
        let cutoff = today - chrono::Duration::days(window_days);
        let rows = sqlx::query(
            "SELECT o.code, r.name, o.session_date, o.action,
                    o.price_5d, o.return_5d, o.correct_5d,
                    o.price_10d, o.return_10d, o.correct_10d,
                    o.price_20d, o.return_20d, o.correct_20d
             FROM recommendation_outcomes o
             JOIN recommendations r
               ON r.code = o.code AND r.session_date = o.session_date
             WHERE o.session_date >= ? AND o.price_5d IS NOT NULL
             ORDER BY o.session_date DESC",
        )
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(rows
            .into_iter()
            .map(|row| RecentOutcome {
                code: row.get("code"),
                name: row.get("name"),
                session_date: row.get("session_date"),
                action: action_from(&row.get::<String, _>("action")),
                outcome_5d: horizon_from(&row, "price_5d", "return_5d", "correct_5d"),
                outcome_10d: horizon_from(&row, "price_10d", "return_10d", "correct_10d"),
                outcome_20d: horizon_from(&row, "price_20d", "return_20d", "correct_20d"),
            })
            .collect())
    }
}

fn horizon_from(
    row: &sqlx::sqlite::SqliteRow,
    price_col: &str,
    return_col: &str,
    correct_col: &str,
) -> Option<HorizonOutcome> {
    let price: Option<f64> = row.get(price_col);
    let return_pct: Option<f64> = row.get(return_col);
    let correct: Option<i64> = row.get(correct_col);
    match (price, return_pct, correct) {
        (Some(price), Some(return_pct), Some(correct)) => {
            Some(HorizonOutcome { price, return_pct, correct: correct != 0 })
        }
        _ => None,
    }
}

fn action_from(label: &str) -> Action {
    match label {
        "BUY" => Action::Buy,
        "HOLD" => Action::Hold,
        "SELL" => Action::Sell,
        _ => Action::Na,
    }
}

fn market_from(label: &str) -> Market {
    if label == "KOSDAQ" {
        Market::Kosdaq
    } else {
        Market::Kospi
    }
}

fn db_err(e: impl std::fmt::Display) -> AdvisorError {
    AdvisorError::Database(e.to_string())
}
