use std::collections::HashMap;

use advisor_core::{AdvisorError, MarketDataProvider, MarketFilter, StockInfo};
use storage::Database;
use tracing::{debug, warn};

/// Theme keyword sets matched against sector, industry, and entity name.
const THEMES: [(&str, &[&str]); 4] = [
    ("semiconductor", &["반도체", "semiconductor", "foundry", "메모리"]),
    ("battery", &["2차전지", "이차전지", "battery", "양극재"]),
    ("bio", &["바이오", "제약", "bio", "pharma"]),
    ("ai-robot", &["인공지능", "로봇", "robot", "자율주행"]),
];

/// How the candidate universe is built: a theme-filtered subset ordered by
/// market activity, or the activity ranking directly.
#[derive(Debug, Clone)]
pub enum CandidateQuery {
    Theme(String),
    Ranking(MarketFilter),
}

/// Builds the candidate list for one composer run, capped at `max`.
pub async fn select_candidates(
    provider: &dyn MarketDataProvider,
    db: &Database,
    query: &CandidateQuery,
    max: usize,
) -> Result<Vec<StockInfo>, AdvisorError> {
    let stocks = db.get_stocks().await?;
    let by_code: HashMap<&str, &StockInfo> =
        stocks.iter().map(|s| (s.code.as_str(), s)).collect();

    let candidates = match query {
        CandidateQuery::Ranking(filter) => {
            // Over-fetch so codes missing from the metadata table do not
            // under-fill the cap.
            let ranking = provider.get_market_ranking(max * 2, *filter).await?;
            resolve_ranked(&ranking, &by_code, max)
        }
        CandidateQuery::Theme(theme) => {
            let Some(keywords) = theme_keywords(theme) else {
                return Err(AdvisorError::InvalidData(format!("unknown theme: {theme}")));
            };
            // A wide ranking pull so thinly traded theme members still get
            // an activity order.
            let ranking = provider.get_market_ranking(max * 10, MarketFilter::All).await?;
            let rank_of: HashMap<&str, usize> =
                ranking.iter().enumerate().map(|(i, code)| (code.as_str(), i)).collect();

            let mut matched: Vec<&StockInfo> =
                stocks.iter().filter(|s| matches_keywords(s, keywords)).collect();
            matched.sort_by_key(|s| rank_of.get(s.code.as_str()).copied().unwrap_or(usize::MAX));
            matched.into_iter().take(max).cloned().collect()
        }
    };

    debug!(count = candidates.len(), "candidate universe built");
    Ok(candidates)
}

fn resolve_ranked(
    ranking: &[String],
    by_code: &HashMap<&str, &StockInfo>,
    max: usize,
) -> Vec<StockInfo> {
    let mut out = Vec::with_capacity(ranking.len().min(max));
    for code in ranking {
        match by_code.get(code.as_str()) {
            Some(stock) => out.push((*stock).clone()),
            None => warn!(code, "ranked code missing from stock metadata, skipping"),
        }
        if out.len() == max {
            break;
        }
    }
    out
}

fn theme_keywords(theme: &str) -> Option<&'static [&'static str]> {
    THEMES.iter().find(|(name, _)| *name == theme).map(|(_, keywords)| *keywords)
}

fn matches_keywords(stock: &StockInfo, keywords: &[&str]) -> bool {
    let haystack = format!(
        "{} {} {}",
        stock.name,
        stock.sector.as_deref().unwrap_or(""),
        stock.industry.as_deref().unwrap_or("")
    )
    .to_lowercase();
    keywords.iter().any(|k| haystack.contains(&k.to_lowercase()))
}
