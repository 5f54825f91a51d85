use advisor_core::Bar;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::indicators;

// First input index at which each column is meaningful.
const RSI_WARMUP: usize = 15;
const SIGNAL_WARMUP: usize = 33;
const BAND_WARMUP: usize = 19;
const STOCH_K_WARMUP: usize = 13;
const STOCH_D_WARMUP: usize = 15;
const ATR_WARMUP: usize = 14;

/// A bar enriched with every derived indicator. Rows only exist past the
/// essential warm-up (RSI, MACD line/signal, Bollinger mid), so those
/// columns are plain floats; only the long-window SMAs stay optional.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndicatorRow {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    /// Day-over-day close change in percent.
    pub change_pct: f64,
    pub sma_5: f64,
    pub sma_20: f64,
    pub sma_60: Option<f64>,
    pub sma_120: Option<f64>,
    pub macd: f64,
    pub macd_signal: f64,
    pub macd_diff: f64,
    pub rsi: f64,
    pub bb_high: f64,
    pub bb_mid: f64,
    pub bb_low: f64,
    pub vol_sma_20: f64,
    pub obv: f64,
    pub stoch_k: f64,
    pub stoch_d: f64,
    pub cci: f64,
    pub atr: f64,
}

impl IndicatorRow {
    /// Position of the close within the Bollinger band, 0 at the lower
    /// band and 1 at the upper. Mid-band when the range collapses.
    pub fn bb_position(&self) -> f64 {
        let range = self.bb_high - self.bb_low;
        if range == 0.0 {
            0.5
        } else {
            (self.close - self.bb_low) / range
        }
    }

    pub fn bb_width(&self) -> f64 {
        if self.bb_mid == 0.0 {
            0.0
        } else {
            (self.bb_high - self.bb_low) / self.bb_mid
        }
    }
}

/// An OHLCV series enriched with derived indicators, restricted to rows
/// where the essential subset is available.
#[derive(Debug, Clone, Default)]
pub struct IndicatorFrame {
    rows: Vec<IndicatorRow>,
}

impl IndicatorFrame {
    /// Enrich a daily bar series. Rows before the longest essential
    /// warm-up window are dropped; missing long-window SMAs do not drop a
    /// row. Series shorter than the warm-up produce an empty frame.
    pub fn from_bars(bars: &[Bar]) -> Self {
        if bars.len() <= SIGNAL_WARMUP {
            return Self::default();
        }

        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let volumes: Vec<f64> = bars.iter().map(|b| b.volume).collect();

        let sma_5 = indicators::sma(&closes, 5);
        let sma_20 = indicators::sma(&closes, 20);
        let sma_60 = indicators::sma(&closes, 60);
        let sma_120 = indicators::sma(&closes, 120);
        let vol_sma_20 = indicators::sma(&volumes, 20);
        let macd = indicators::macd(&closes, 12, 26, 9);
        let rsi = indicators::rsi(&closes, 14);
        let bands = indicators::bollinger_bands(&closes, 20, 2.0);
        let stoch = indicators::stochastic(bars, 14, 3);
        let cci = indicators::cci(bars, 20);
        let atr = indicators::atr(bars, 14);
        let obv = indicators::obv(bars);

        let mut rows = Vec::with_capacity(bars.len() - SIGNAL_WARMUP);
        for i in SIGNAL_WARMUP..bars.len() {
            let bar = &bars[i];
            let change_pct = if i > 0 && closes[i - 1] != 0.0 {
                (closes[i] / closes[i - 1] - 1.0) * 100.0
            } else {
                bar.change.unwrap_or(0.0) * 100.0
            };

            rows.push(IndicatorRow {
                date: bar.date,
                open: bar.open,
                high: bar.high,
                low: bar.low,
                close: bar.close,
                volume: bar.volume,
                change_pct,
                sma_5: sma_5[i - 4],
                sma_20: sma_20[i - 19],
                sma_60: (i >= 59).then(|| sma_60[i - 59]),
                sma_120: (i >= 119).then(|| sma_120[i - 119]),
                macd: macd.macd[i],
                macd_signal: macd.signal[i],
                macd_diff: macd.histogram[i],
                rsi: rsi[i - RSI_WARMUP],
                bb_high: bands.upper[i - BAND_WARMUP],
                bb_mid: bands.middle[i - BAND_WARMUP],
                bb_low: bands.lower[i - BAND_WARMUP],
                vol_sma_20: vol_sma_20[i - BAND_WARMUP],
                obv: obv[i],
                stoch_k: stoch.k[i - STOCH_K_WARMUP],
                stoch_d: stoch.d[i - STOCH_D_WARMUP],
                cci: cci[i - BAND_WARMUP],
                atr: atr[i - ATR_WARMUP],
            });
        }

        Self { rows }
    }

    pub fn rows(&self) -> &[IndicatorRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn last(&self) -> Option<&IndicatorRow> {
        self.rows.last()
    }

    #[cfg(test)]
    pub(crate) fn from_rows(rows: Vec<IndicatorRow>) -> Self {
        Self { rows }
    }
}
