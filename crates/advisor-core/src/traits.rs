use async_trait::async_trait;
use chrono::NaiveDate;

use crate::{AdvisorError, Bar, DisclosureItem, MarketFilter, NewsItem, StockInfo};

/// Trait for OHLCV and listing-metadata providers.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Daily bars for the trailing `days` calendar days, oldest first.
    async fn get_ohlcv(&self, code: &str, days: i64) -> Result<Vec<Bar>, AdvisorError>;

    /// Daily bars between two dates inclusive, oldest first.
    async fn get_ohlcv_range(
        &self,
        code: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Bar>, AdvisorError>;

    async fn get_stock_list(&self) -> Result<Vec<StockInfo>, AdvisorError>;

    /// Codes ordered by market activity (volume and gainers), most active first.
    async fn get_market_ranking(
        &self,
        limit: usize,
        market: MarketFilter,
    ) -> Result<Vec<String>, AdvisorError>;
}

/// Trait for the external reasoning service. Implementations must request a
/// JSON-only response mode; callers substitute neutral defaults on failure.
#[async_trait]
pub trait ReasoningClient: Send + Sync {
    async fn complete_json(
        &self,
        system: &str,
        user: &str,
    ) -> Result<serde_json::Value, AdvisorError>;
}

/// Trait for news headline sources. Missing credentials must yield an empty
/// list, not an error.
#[async_trait]
pub trait NewsSource: Send + Sync {
    async fn recent_news(&self, entity_name: &str) -> Result<Vec<NewsItem>, AdvisorError>;
}

/// Trait for corporate disclosure sources. Same degradation contract as
/// [`NewsSource`].
#[async_trait]
pub trait DisclosureSource: Send + Sync {
    async fn recent_disclosures(
        &self,
        code: &str,
        days: i64,
    ) -> Result<Vec<DisclosureItem>, AdvisorError>;
}

/// Trait for outbound notification sinks.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn send(&self, message: &str) -> Result<(), AdvisorError>;
}
