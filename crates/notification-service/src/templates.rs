use advisor_core::{OutcomeStats, RecentOutcome, ScoredRecommendation};
use chrono::NaiveDate;

const SEPARATOR: &str = "--------------------------";

fn score_bar(value: f64) -> String {
    let filled = ((value / 10.0) as usize).min(10);
    format!("[{}{}]", "#".repeat(filled), ".".repeat(10 - filled))
}

/// Plain-text recommendation report, one block per entity.
pub fn recommendation_report(
    session_date: NaiveDate,
    recommendations: &[ScoredRecommendation],
) -> String {
    let mut blocks = vec![format!(
        "Daily picks {session_date} ({} entities)\n{SEPARATOR}",
        recommendations.len()
    )];

    for (i, rec) in recommendations.iter().enumerate() {
        let analysis = &rec.analysis;
        let opinion = &analysis.opinion;

        let arrow = if analysis.change_pct >= 0.0 { "+" } else { "" };
        let price_line = if analysis.current_price > 0.0 && opinion.target_price > 0.0 {
            let upside =
                (opinion.target_price - analysis.current_price) / analysis.current_price * 100.0;
            format!(
                "{:.0} -> {:.0} ({upside:+.1}%)",
                analysis.current_price, opinion.target_price
            )
        } else {
            format!("{:.0}", analysis.current_price)
        };

        let mut lines = vec![
            format!("{}. {} ({})", i + 1, analysis.name, analysis.code),
            format!(
                "   {} {} {:.1}pt | day {arrow}{:.1}%",
                opinion.action.label(),
                score_bar(rec.composite_score),
                rec.composite_score,
                analysis.change_pct
            ),
            format!("   price {price_line}"),
            format!(
                "   tech {:.0} / ml {:.0} / sentiment {:+.0} / rsi {:.0}",
                analysis.tech_score,
                analysis.ml.value(),
                analysis.sentiment.score,
                analysis.indicators.rsi
            ),
        ];
        if let Some(top) = &analysis.sentiment.top_item {
            lines.push(format!("   news: {top}"));
        }
        if !opinion.summary.is_empty() {
            lines.push(format!("   note: {}", opinion.summary));
        }
        blocks.push(lines.join("\n"));
    }

    blocks.push(SEPARATOR.to_string());
    blocks.join("\n\n")
}

/// Plain-text outcome performance report: trailing-window hit rates plus
/// freshly evaluated entries.
pub fn performance_report(stats: &OutcomeStats, recent: &[RecentOutcome]) -> String {
    let mut lines = vec![
        format!("Recommendation performance\n{SEPARATOR}"),
        format!("Trailing 90 days ({} recommendations)", stats.total),
    ];

    let horizons = [
        (5u32, stats.evaluated_5d, stats.win_rate_5d, stats.avg_return_5d),
        (10, stats.evaluated_10d, stats.win_rate_10d, stats.avg_return_10d),
        (20, stats.evaluated_20d, stats.win_rate_20d, stats.avg_return_20d),
    ];
    for (days, evaluated, win_rate, avg_return) in horizons {
        if evaluated == 0 {
            continue;
        }
        lines.push(format!(
            "  {days:>2}d: {} {win_rate:.0}% correct, avg {avg_return:+.1}% ({evaluated} evaluated)",
            score_bar(win_rate)
        ));
    }
    if let Some(hit_rate) = stats.target_hit_rate {
        lines.push(format!("  target hit rate: {hit_rate:.0}%"));
    }

    let fresh: Vec<&RecentOutcome> =
        recent.iter().filter(|o| o.outcome_5d.is_some()).take(5).collect();
    if !fresh.is_empty() {
        lines.push(format!("{SEPARATOR}\nNewly evaluated"));
        for outcome in fresh {
            let five = outcome.outcome_5d.as_ref().map(|o| o.return_pct);
            let mark = outcome
                .outcome_5d
                .as_ref()
                .map(|o| if o.correct { "ok " } else { "miss" })
                .unwrap_or("-");
            lines.push(format!(
                "  [{mark}] {} ({}) {} {} -> 5d {}",
                outcome.name,
                outcome.code,
                outcome.session_date,
                outcome.action.label(),
                five.map(|r| format!("{r:+.1}%")).unwrap_or_else(|| "-".to_string()),
            ));
        }
    }

    lines.push(SEPARATOR.to_string());
    lines.join("\n")
}
