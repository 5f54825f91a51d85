use std::sync::Arc;

use advisor_core::{
    Action, AdvisorError, AiOpinion, Bar, IndicatorSnapshot, Market, MarketDataProvider, MlScore,
    PriceStats, ReasoningClient, SentimentResult, StockAnalysis, StockInfo,
};
use chrono::{NaiveDate, Utc};
use prediction_ensemble::{MarketReturns, PredictionEnsemble};
use sentiment_service::SentimentService;
use storage::Database;
use technical_analysis::{composite_score, IndicatorFrame};
use tracing::{debug, warn};

/// Calendar days of history fetched per entity; covers the 52-week range
/// plus indicator warm-up with margin for holidays.
const LOOKBACK_DAYS: i64 = 450;
const YEAR_WINDOW: usize = 252;
const VOLUME_WINDOW: usize = 20;

const OPINION_SYSTEM_PROMPT: &str = "You are an equity analyst. Respond with a single JSON \
object and nothing else, using exactly these keys: \
{\"summary\": string, \"strength\": string, \"weakness\": string, \"reasoning\": string, \
\"action\": \"BUY\"|\"HOLD\"|\"SELL\", \"target_price\": number, \"target_rationale\": string}. \
Base the opinion only on the figures provided.";

/// Runs the full per-entity analysis: indicators, ensemble score,
/// sentiment, then a qualitative opinion from the reasoning service.
pub struct StockAnalyzer {
    provider: Arc<dyn MarketDataProvider>,
    reasoning: Arc<dyn ReasoningClient>,
    ensemble: Arc<PredictionEnsemble>,
    sentiment: Arc<SentimentService>,
    db: Database,
}

impl StockAnalyzer {
    pub fn new(
        provider: Arc<dyn MarketDataProvider>,
        reasoning: Arc<dyn ReasoningClient>,
        ensemble: Arc<PredictionEnsemble>,
        sentiment: Arc<SentimentService>,
        db: Database,
    ) -> Self {
        Self { provider, reasoning, ensemble, sentiment, db }
    }

    /// Analyzes one entity. Sentiment, ensemble, and opinion failures all
    /// degrade internally; only missing price history is a hard error.
    pub async fn analyze(
        &self,
        stock: &StockInfo,
        today: NaiveDate,
    ) -> Result<StockAnalysis, AdvisorError> {
        let bars = self.provider.get_ohlcv(&stock.code, LOOKBACK_DAYS).await?;
        let frame = IndicatorFrame::from_bars(&bars);
        let row = frame.last().ok_or_else(|| {
            AdvisorError::InsufficientData(format!("too little history for {}", stock.code))
        })?;

        let tech_score = composite_score(&frame);
        let sentiment = self.sentiment.sentiment_for(&stock.name, &stock.code, today).await;

        let market_returns = self.market_returns(stock.market).await;
        let ml = match self.ensemble.predict(&stock.code, &frame, market_returns, Some(tech_score))
        {
            Ok(score) => score,
            Err(e) => {
                warn!(code = %stock.code, error = %e, "ensemble unavailable, using technical score");
                MlScore::TechFallback { score: tech_score }
            }
        };
        // Display-only blend; the composite weighting never reads this.
        let ml_blended = 0.65 * ml.value() + 0.35 * sentiment.normalized();

        let current_price = row.close;
        let indicators = IndicatorSnapshot {
            rsi: row.rsi,
            macd: row.macd,
            macd_signal: row.macd_signal,
            sma_20: row.sma_20,
            bb_position: row.bb_position(),
        };
        let stats = price_stats(&bars);

        let opinion = self
            .opinion(stock, current_price, tech_score, &ml, &sentiment, &indicators)
            .await;
        let opinion = apply_consistency_rule(opinion, current_price);

        let analysis = StockAnalysis {
            code: stock.code.clone(),
            name: stock.name.clone(),
            market: stock.market,
            sector: stock.sector.clone(),
            current_price,
            change_pct: row.change_pct,
            tech_score,
            ml,
            ml_blended,
            sentiment,
            stats,
            indicators,
            opinion,
            analyzed_at: Utc::now(),
        };

        if let Err(e) = self.db.save_analysis(&analysis).await {
            warn!(code = %stock.code, error = %e, "failed to append analysis history");
        }
        Ok(analysis)
    }

    async fn market_returns(&self, market: Market) -> MarketReturns {
        match self.provider.get_ohlcv(market.benchmark_code(), LOOKBACK_DAYS).await {
            Ok(bars) => {
                let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
                MarketReturns::from_closes(&closes)
            }
            Err(e) => {
                warn!(benchmark = market.benchmark_code(), error = %e,
                    "benchmark fetch failed, market-relative features neutralized");
                MarketReturns::default()
            }
        }
    }

    async fn opinion(
        &self,
        stock: &StockInfo,
        current_price: f64,
        tech_score: f64,
        ml: &MlScore,
        sentiment: &SentimentResult,
        indicators: &IndicatorSnapshot,
    ) -> AiOpinion {
        let user_prompt = format!(
            "Entity: {} ({})\n\
             Current price: {current_price:.0}\n\
             Technical score: {tech_score:.1} / 100\n\
             Model score: {:.1} / 100 (active models: {})\n\
             Sentiment: {:+.0} ({})\n\
             RSI(14): {:.1}\n\
             MACD: {:.2} vs signal {:.2}\n\
             SMA(20): {:.0}\n\
             Bollinger position: {:.2}",
            stock.name,
            stock.code,
            ml.value(),
            ml.model_count(),
            sentiment.score,
            sentiment.reason,
            indicators.rsi,
            indicators.macd,
            indicators.macd_signal,
            indicators.sma_20,
            indicators.bb_position,
        );

        match self.reasoning.complete_json(OPINION_SYSTEM_PROMPT, &user_prompt).await {
            Ok(value) => match serde_json::from_value(value) {
                Ok(opinion) => opinion,
                Err(e) => {
                    warn!(code = %stock.code, error = %e, "unparseable opinion, marking N/A");
                    AiOpinion::unavailable()
                }
            },
            Err(e) => {
                warn!(code = %stock.code, error = %e, "opinion call failed, marking N/A");
                AiOpinion::unavailable()
            }
        }
    }
}

/// Repairs internally inconsistent opinions: a BUY aiming below the price
/// gets a modest upside target, a HOLD implying deep downside becomes a
/// SELL, a SELL aiming above the price gets a modest downside target.
pub fn apply_consistency_rule(mut opinion: AiOpinion, current_price: f64) -> AiOpinion {
    if current_price <= 0.0 || opinion.target_price <= 0.0 {
        return opinion;
    }
    match opinion.action {
        Action::Buy if opinion.target_price < current_price * 0.98 => {
            debug!(target = opinion.target_price, "BUY target below price, raising");
            opinion.target_price = current_price * 1.03;
        }
        Action::Hold if opinion.target_price < current_price * 0.92 => {
            debug!(target = opinion.target_price, "HOLD target implies deep downside, reclassifying");
            opinion.action = Action::Sell;
        }
        Action::Sell if opinion.target_price > current_price * 1.02 => {
            debug!(target = opinion.target_price, "SELL target above price, lowering");
            opinion.target_price = current_price * 0.97;
        }
        _ => {}
    }
    opinion
}

fn price_stats(bars: &[Bar]) -> PriceStats {
    let year = &bars[bars.len().saturating_sub(YEAR_WINDOW)..];
    let recent = &bars[bars.len().saturating_sub(VOLUME_WINDOW)..];
    PriceStats {
        high_52w: year.iter().map(|b| b.high).fold(0.0, f64::max),
        low_52w: year.iter().map(|b| b.low).fold(f64::INFINITY, f64::min),
        avg_volume: if recent.is_empty() {
            0.0
        } else {
            recent.iter().map(|b| b.volume).sum::<f64>() / recent.len() as f64
        },
        current_volume: bars.last().map(|b| b.volume).unwrap_or(0.0),
    }
}
