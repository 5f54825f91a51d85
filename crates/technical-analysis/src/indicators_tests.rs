use advisor_core::Bar;
use chrono::NaiveDate;

use crate::frame::IndicatorFrame;
use crate::indicators::*;

fn bar(day: u32, close: f64) -> Bar {
    Bar {
        date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Days::new(day as u64),
        open: close,
        high: close * 1.01,
        low: close * 0.99,
        close,
        volume: 1000.0,
        change: None,
    }
}

fn bars_from_closes(closes: &[f64]) -> Vec<Bar> {
    closes.iter().enumerate().map(|(i, c)| bar(i as u32, *c)).collect()
}

#[test]
fn sma_basic() {
    let data = vec![1.0, 2.0, 3.0, 4.0, 5.0];
    let result = sma(&data, 3);
    assert_eq!(result, vec![2.0, 3.0, 4.0]);
}

#[test]
fn sma_short_input_is_empty() {
    assert!(sma(&[1.0, 2.0], 3).is_empty());
    assert!(sma(&[1.0, 2.0, 3.0], 0).is_empty());
}

#[test]
fn ema_is_full_length_and_tracks_trend() {
    let data: Vec<f64> = (1..=30).map(|i| i as f64).collect();
    let result = ema(&data, 10);
    assert_eq!(result.len(), data.len());
    // EMA lags a rising series but keeps rising.
    assert!(result.windows(2).all(|w| w[1] > w[0]));
    assert!(result[29] < 30.0);
}

#[test]
fn rsi_extremes() {
    let rising: Vec<f64> = (1..=40).map(|i| 100.0 + i as f64).collect();
    let result = rsi(&rising, 14);
    assert!(!result.is_empty());
    // All gains, no losses.
    assert!(result.iter().all(|&v| v == 100.0));

    let falling: Vec<f64> = (1..=40).map(|i| 200.0 - i as f64).collect();
    let result = rsi(&falling, 14);
    assert!(result.iter().all(|&v| v == 0.0));
}

#[test]
fn rsi_mixed_series_stays_in_range() {
    let data: Vec<f64> = (0..60)
        .map(|i| 100.0 + (i as f64 * 0.7).sin() * 5.0)
        .collect();
    for v in rsi(&data, 14) {
        assert!((0.0..=100.0).contains(&v));
    }
}

#[test]
fn macd_positive_in_uptrend() {
    let data: Vec<f64> = (0..80).map(|i| 100.0 + i as f64 * 2.0).collect();
    let result = macd(&data, 12, 26, 9);
    assert_eq!(result.macd.len(), data.len());
    assert_eq!(result.signal.len(), data.len());
    let last = data.len() - 1;
    // Fast EMA sits above slow EMA in a sustained uptrend.
    assert!(result.macd[last] > 0.0);
    assert!(result.histogram[last] >= 0.0);
}

#[test]
fn bollinger_bands_order_and_alignment() {
    let data: Vec<f64> = (0..40)
        .map(|i| 100.0 + (i as f64 * 0.5).sin() * 3.0)
        .collect();
    let bands = bollinger_bands(&data, 20, 2.0);
    assert_eq!(bands.middle.len(), data.len() - 19);
    for j in 0..bands.middle.len() {
        assert!(bands.upper[j] >= bands.middle[j]);
        assert!(bands.middle[j] >= bands.lower[j]);
    }
}

#[test]
fn stochastic_flat_window_is_midrange() {
    let bars: Vec<Bar> = (0..20)
        .map(|i| Bar {
            high: 100.0,
            low: 100.0,
            close: 100.0,
            ..bar(i, 100.0)
        })
        .collect();
    let result = stochastic(&bars, 14, 3);
    assert!(result.k.iter().all(|&k| k == 50.0));
}

#[test]
fn obv_accumulates_with_direction() {
    let bars = bars_from_closes(&[10.0, 11.0, 10.5, 10.5, 12.0]);
    let result = obv(&bars);
    assert_eq!(result, vec![1000.0, 2000.0, 1000.0, 1000.0, 2000.0]);
}

#[test]
fn atr_positive_for_moving_prices() {
    let closes: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
    let bars = bars_from_closes(&closes);
    let result = atr(&bars, 14);
    assert!(!result.is_empty());
    assert!(result.iter().all(|&v| v > 0.0));
}

#[test]
fn cci_zero_on_flat_series() {
    let bars = bars_from_closes(&vec![100.0; 30]);
    let flat: Vec<Bar> = bars
        .into_iter()
        .map(|b| Bar { high: 100.0, low: 100.0, ..b })
        .collect();
    let result = cci(&flat, 20);
    assert!(result.iter().all(|&v| v == 0.0));
}

#[test]
fn frame_drops_warmup_rows_and_keeps_essentials() {
    let closes: Vec<f64> = (0..100)
        .map(|i| 100.0 + i as f64 * 0.5 + (i as f64 * 0.3).sin() * 2.0)
        .collect();
    let bars = bars_from_closes(&closes);
    let frame = IndicatorFrame::from_bars(&bars);

    assert_eq!(frame.len(), 100 - 33);
    for row in frame.rows() {
        assert!((0.0..=100.0).contains(&row.rsi));
        assert!(row.bb_high >= row.bb_mid && row.bb_mid >= row.bb_low);
        assert!(row.vol_sma_20 > 0.0);
    }
    // 60-day SMA appears only once enough history has accumulated.
    assert!(frame.rows()[0].sma_60.is_none());
    assert!(frame.last().unwrap().sma_60.is_some());
    // Not enough rows for the 120-day window.
    assert!(frame.last().unwrap().sma_120.is_none());
}

#[test]
fn frame_empty_for_short_series() {
    let bars = bars_from_closes(&(0..20).map(|i| 100.0 + i as f64).collect::<Vec<_>>());
    let frame = IndicatorFrame::from_bars(&bars);
    assert!(frame.is_empty());
}

#[test]
fn bb_position_handles_zero_range() {
    let closes = vec![100.0; 120];
    let bars = bars_from_closes(&closes);
    let frame = IndicatorFrame::from_bars(&bars);
    let row = frame.last().unwrap();
    assert_eq!(row.bb_position(), 0.5);
}
