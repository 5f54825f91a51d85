use crate::frame::{IndicatorFrame, IndicatorRow};

/// Composite technical score in [0, 100] from the most recent row.
///
/// Trend contributes up to 40, RSI momentum up to 30, Bollinger position
/// plus volume up to 30. An empty frame scores a flat 50 so downstream
/// blending still has a neutral number to work with.
pub fn composite_score(frame: &IndicatorFrame) -> f64 {
    match frame.last() {
        Some(row) => trend_component(row) + momentum_component(row.rsi) + position_component(row),
        None => 50.0,
    }
}

/// Trend component, 0-40. When SMA60 exists the MACD cross is worth 15
/// and the long-trend check 5; without it the MACD cross alone carries 20.
pub(crate) fn trend_component(row: &IndicatorRow) -> f64 {
    let mut score = 0.0;
    if row.close > row.sma_20 {
        score += 10.0;
    }
    if row.sma_5 > row.sma_20 {
        score += 10.0;
    }
    match row.sma_60 {
        Some(sma_60) => {
            if row.macd > row.macd_signal {
                score += 15.0;
            }
            if row.close > sma_60 {
                score += 5.0;
            }
        }
        None => {
            if row.macd > row.macd_signal {
                score += 20.0;
            }
        }
    }
    score
}

/// RSI momentum component, 0-30, tiered around the healthy 45-65 band.
pub(crate) fn momentum_component(rsi: f64) -> f64 {
    if (45.0..=65.0).contains(&rsi) {
        30.0
    } else if (35.0..45.0).contains(&rsi) {
        22.0
    } else if rsi > 65.0 && rsi <= 75.0 {
        18.0
    } else if (30.0..35.0).contains(&rsi) {
        12.0
    } else if rsi > 75.0 {
        8.0
    } else {
        4.0
    }
}

/// Bollinger-position plus volume component, 0-30. The rewarded band zone
/// shifts with the MACD trend direction; a volume surge adds a flat 5.
pub(crate) fn position_component(row: &IndicatorRow) -> f64 {
    let bb_pos = row.bb_position();
    let uptrend = row.macd > row.macd_signal;

    let mut score = if uptrend {
        if (0.4..=0.75).contains(&bb_pos) {
            25.0
        } else if bb_pos > 0.75 && bb_pos <= 0.9 {
            18.0
        } else if (0.2..0.4).contains(&bb_pos) {
            14.0
        } else if bb_pos > 0.9 {
            8.0
        } else {
            3.0
        }
    } else {
        if (0.2..=0.5).contains(&bb_pos) {
            25.0
        } else if bb_pos > 0.5 && bb_pos <= 0.7 {
            18.0
        } else if (0.1..0.2).contains(&bb_pos) {
            12.0
        } else if bb_pos > 0.7 && bb_pos < 0.9 {
            8.0
        } else {
            3.0
        }
    };

    if row.vol_sma_20 > 0.0 && row.volume >= row.vol_sma_20 * 1.5 {
        score += 5.0;
    }
    score
}
