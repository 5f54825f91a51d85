mod telegram;
pub mod templates;

pub use telegram::TelegramSink;

use std::sync::Arc;

use advisor_core::{NotificationSink, OutcomeStats, RecentOutcome, ScoredRecommendation};
use chrono::NaiveDate;
use tracing::{info, warn};


/// Formats and dispatches pipeline reports. Delivery failures are logged
/// and swallowed; a broken sink never fails the pipeline.
pub struct Notifier {
    sink: Arc<dyn NotificationSink>,
}

impl Notifier {
    pub fn new(sink: Arc<dyn NotificationSink>) -> Self {
        Self { sink }
    }

    pub async fn notify_recommendations(
        &self,
        session_date: NaiveDate,
        recommendations: &[ScoredRecommendation],
    ) {
        if recommendations.is_empty() {
            return;
        }
        let message = templates::recommendation_report(session_date, recommendations);
        self.deliver(&message).await;
    }

    pub async fn notify_performance(&self, stats: &OutcomeStats, recent: &[RecentOutcome]) {
        if stats.total == 0 {
            return;
        }
        let message = templates::performance_report(stats, recent);
        self.deliver(&message).await;
    }

    async fn deliver(&self, message: &str) {
        match self.sink.send(message).await {
            Ok(()) => info!("notification sent"),
            Err(e) => warn!(error = %e, "notification delivery failed"),
        }
    }
}
