use technical_analysis::IndicatorFrame;

/// Feature order shared with the offline trainer. Scalers and models are
/// exported against exactly this layout.
pub const FEATURE_NAMES: [&str; 22] = [
    "rsi",
    "macd_diff",
    "price_sma_20_ratio",
    "vol_change",
    "price_sma_5_ratio",
    "rsi_change",
    "macd_diff_change",
    "bb_position",
    "bb_width",
    "vol_ratio",
    "stoch_k",
    "stoch_d",
    "cci",
    "atr_ratio",
    "candle_body",
    "obv_change",
    "return_1m",
    "return_3m",
    "high_52w_ratio",
    "mom_accel",
    "rs_vs_mkt_1m",
    "rs_vs_mkt_3m",
];

/// Lookbacks in trading days for the momentum features.
const ONE_MONTH: usize = 21;
const THREE_MONTHS: usize = 63;
const ONE_YEAR: usize = 252;

/// Benchmark-index returns for market-relative features. Zero when no
/// benchmark data is available, which neutralizes the relative features.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarketReturns {
    pub one_month: f64,
    pub three_month: f64,
}

impl MarketReturns {
    /// Trailing benchmark returns from a close series, oldest first.
    pub fn from_closes(closes: &[f64]) -> Self {
        let last = match closes.last() {
            Some(c) if *c != 0.0 => *c,
            _ => return Self::default(),
        };
        let trailing = |lookback: usize| -> f64 {
            if closes.len() > lookback {
                let base = closes[closes.len() - 1 - lookback];
                if base != 0.0 {
                    return last / base - 1.0;
                }
            }
            0.0
        };
        Self { one_month: trailing(ONE_MONTH), three_month: trailing(THREE_MONTHS) }
    }
}

/// Extracts the latest feature row in trainer order. None when the frame
/// is too short for the momentum lookbacks or any input is non-finite.
pub fn latest_features(frame: &IndicatorFrame, market: MarketReturns) -> Option<Vec<f64>> {
    let rows = frame.rows();
    let i = rows.len().checked_sub(1)?;
    if i < THREE_MONTHS {
        return None;
    }

    let row = &rows[i];
    let prev = &rows[i - 1];

    let ratio = |num: f64, den: f64| if den != 0.0 { num / den } else { 0.0 };
    let pct = |num: f64, den: f64| if den != 0.0 { num / den - 1.0 } else { 0.0 };

    let return_1m = pct(row.close, rows[i - ONE_MONTH].close);
    let return_3m = pct(row.close, rows[i - THREE_MONTHS].close);
    let prior_return_1m = if i >= 2 * ONE_MONTH {
        pct(rows[i - ONE_MONTH].close, rows[i - 2 * ONE_MONTH].close)
    } else {
        0.0
    };

    let window_start = rows.len().saturating_sub(ONE_YEAR);
    let high_52w = rows[window_start..]
        .iter()
        .map(|r| r.high)
        .fold(f64::NEG_INFINITY, f64::max);

    let features = vec![
        row.rsi,
        row.macd_diff,
        ratio(row.close, row.sma_20),
        pct(row.volume, prev.volume),
        ratio(row.close, row.sma_5),
        row.rsi - prev.rsi,
        row.macd_diff - prev.macd_diff,
        row.bb_position(),
        row.bb_width(),
        ratio(row.volume, row.vol_sma_20),
        row.stoch_k,
        row.stoch_d,
        row.cci,
        ratio(row.atr, row.close),
        pct(row.close, row.open),
        pct(row.obv, prev.obv),
        return_1m,
        return_3m,
        ratio(row.close, high_52w),
        return_1m - prior_return_1m,
        return_1m - market.one_month,
        return_3m - market.three_month,
    ];

    if features.iter().all(|v| v.is_finite()) {
        Some(features)
    } else {
        None
    }
}
