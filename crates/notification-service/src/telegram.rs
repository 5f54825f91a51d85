use advisor_core::{AdvisorError, NotificationSink};
use async_trait::async_trait;
use serde_json::json;
use tracing::warn;

/// Telegram bot sink. Without both credentials it stays disabled and
/// every send becomes a logged no-op rather than an error.
pub struct TelegramSink {
    client: reqwest::Client,
    token: Option<String>,
    chat_id: Option<String>,
}

impl TelegramSink {
    pub fn new(token: Option<String>, chat_id: Option<String>) -> Self {
        if token.is_none() || chat_id.is_none() {
            warn!("telegram notifications disabled (token or chat id missing)");
        }
        Self { client: reqwest::Client::new(), token, chat_id }
    }

    fn credentials(&self) -> Option<(&str, &str)> {
        Some((self.token.as_deref()?, self.chat_id.as_deref()?))
    }
}

#[async_trait]
impl NotificationSink for TelegramSink {
    async fn send(&self, message: &str) -> Result<(), AdvisorError> {
        let Some((token, chat_id)) = self.credentials() else {
            warn!("telegram send skipped, sink disabled");
            return Ok(());
        };

        let url = format!("https://api.telegram.org/bot{token}/sendMessage");
        let response = self
            .client
            .post(&url)
            .json(&json!({ "chat_id": chat_id, "text": message }))
            .send()
            .await
            .map_err(|e| AdvisorError::Api(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AdvisorError::Api(format!(
                "telegram returned {}",
                response.status()
            )));
        }
        Ok(())
    }
}
