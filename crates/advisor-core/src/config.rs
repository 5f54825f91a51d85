use std::path::PathBuf;
use std::time::Duration;

/// Brokerage commission charged when a position changes.
pub const TRANSACTION_FEE: f64 = 0.00015;
/// Securities transaction tax charged when a position changes.
pub const TAX_RATE: f64 = 0.0018;
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Process-wide configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct AdvisorConfig {
    pub db_path: String,
    pub model_dir: PathBuf,
    pub transaction_fee: f64,
    pub tax_rate: f64,
    pub worker_count: usize,
    pub task_timeout: Duration,
    pub top_n: usize,
    pub max_candidates: usize,
    pub telegram_bot_token: Option<String>,
    pub telegram_chat_id: Option<String>,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            db_path: "data/advisor.db".to_string(),
            model_dir: PathBuf::from("data/models"),
            transaction_fee: TRANSACTION_FEE,
            tax_rate: TAX_RATE,
            worker_count: 4,
            task_timeout: Duration::from_secs(60),
            top_n: 5,
            max_candidates: 20,
            telegram_bot_token: None,
            telegram_chat_id: None,
        }
    }
}

impl AdvisorConfig {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let defaults = Self::default();
        Self {
            db_path: env_or("ADVISOR_DB_PATH", defaults.db_path),
            model_dir: PathBuf::from(env_or(
                "ADVISOR_MODEL_DIR",
                defaults.model_dir.to_string_lossy().into_owned(),
            )),
            transaction_fee: env_parse("ADVISOR_TRANSACTION_FEE", defaults.transaction_fee),
            tax_rate: env_parse("ADVISOR_TAX_RATE", defaults.tax_rate),
            worker_count: env_parse("ADVISOR_WORKER_COUNT", defaults.worker_count),
            task_timeout: Duration::from_secs(env_parse("ADVISOR_TASK_TIMEOUT_SECS", 60)),
            top_n: env_parse("ADVISOR_TOP_N", defaults.top_n),
            max_candidates: env_parse("ADVISOR_MAX_CANDIDATES", defaults.max_candidates),
            telegram_bot_token: std::env::var("TELEGRAM_BOT_TOKEN").ok().filter(|s| !s.is_empty()),
            telegram_chat_id: std::env::var("TELEGRAM_CHAT_ID").ok().filter(|s| !s.is_empty()),
        }
    }
}

fn env_or(key: &str, default: String) -> String {
    std::env::var(key).ok().filter(|s| !s.is_empty()).unwrap_or(default)
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}
