use advisor_core::{DisclosureItem, NewsItem};
use chrono::{DateTime, NaiveDate, Utc};

/// Recency decay applied to each item: today 1.00, one day 0.70, three
/// days 0.35, a week 0.09.
const DECAY_RATE: f64 = 0.35;

pub const SYSTEM_PROMPT: &str = "You are a financial news analyst. Score the \
overall sentiment for the given company from the weighted headlines and \
disclosures. Respond with JSON only: {\"sentiment_score\": <-100..100>, \
\"label\": <\"Positive\"|\"Neutral\"|\"Negative\">, \"reason\": <one short \
sentence>, \"top_item\": <the single most market-relevant headline>}";

pub fn decay_weight(days_ago: i64) -> f64 {
    (-DECAY_RATE * days_ago as f64).exp()
}

/// Builds the scoring prompt. Each line carries its recency weight so the
/// model favors fresh items, and the disclosure section is flagged as
/// weighing more than headlines.
pub fn build_prompt(
    entity_name: &str,
    news: &[NewsItem],
    disclosures: &[DisclosureItem],
    now: DateTime<Utc>,
    today: NaiveDate,
) -> String {
    let mut lines = vec![format!(
        "Company: {entity_name}\nScore the aggregate sentiment. Weights in \
         brackets reflect recency; higher-weight items matter more."
    )];

    if !news.is_empty() {
        lines.push("\nNews headlines:".to_string());
        for item in news {
            let weight = decay_weight(item.days_ago(now));
            lines.push(format!("- [w={weight:.2}] {}", item.title));
        }
    }

    if !disclosures.is_empty() {
        lines.push(
            "\nOfficial disclosures (weigh these more heavily than headlines):"
                .to_string(),
        );
        for item in disclosures {
            let days_ago = (today - item.date).num_days().max(0);
            let weight = decay_weight(days_ago);
            let category = item.category.as_deref().unwrap_or("disclosure");
            lines.push(format!("- [w={weight:.2}] ({category}) {}", item.title));
        }
    }

    lines.join("\n")
}
