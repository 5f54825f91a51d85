use chrono::NaiveDate;

use crate::frame::{IndicatorFrame, IndicatorRow};
use crate::strategy::{generate_signals, Strategy};

fn row(rsi: f64, macd: f64, macd_signal: f64) -> IndicatorRow {
    IndicatorRow {
        date: NaiveDate::from_ymd_opt(2024, 6, 3).unwrap(),
        open: 100.0,
        high: 101.0,
        low: 99.0,
        close: 100.0,
        volume: 1000.0,
        change_pct: 0.0,
        sma_5: 100.0,
        sma_20: 100.0,
        sma_60: None,
        sma_120: None,
        macd,
        macd_signal,
        macd_diff: macd - macd_signal,
        rsi,
        bb_high: 110.0,
        bb_mid: 100.0,
        bb_low: 90.0,
        vol_sma_20: 1000.0,
        obv: 0.0,
        stoch_k: 50.0,
        stoch_d: 50.0,
        cci: 0.0,
        atr: 1.0,
    }
}

#[test]
fn rsi_strategy_enters_low_exits_high_and_holds_between() {
    let frame = IndicatorFrame::from_rows(vec![
        row(55.0, 0.0, 0.0), // neutral, flat
        row(35.0, 0.0, 0.0), // oversold, enter
        row(50.0, 0.0, 0.0), // between thresholds, hold
        row(58.0, 0.0, 0.0), // still holding
        row(65.0, 0.0, 0.0), // overbought, exit
        row(50.0, 0.0, 0.0), // stays flat
    ]);
    let signals = generate_signals(&frame, Strategy::Rsi);
    assert_eq!(signals, vec![0, 1, 1, 1, 0, 0]);
}

#[test]
fn macd_strategy_follows_crosses() {
    let frame = IndicatorFrame::from_rows(vec![
        row(50.0, -1.0, 0.0), // below signal, flat
        row(50.0, 1.0, 0.0),  // golden cross, enter
        row(50.0, 2.0, 1.0),  // still above, hold
        row(50.0, -1.0, 0.0), // dead cross, exit
    ]);
    let signals = generate_signals(&frame, Strategy::Macd);
    assert_eq!(signals, vec![0, 1, 1, 0]);
}

#[test]
fn macd_strategy_holds_position_when_lines_touch() {
    let frame = IndicatorFrame::from_rows(vec![
        row(50.0, 1.0, 0.0),
        row(50.0, 1.0, 1.0), // equal lines, neither condition fires
        row(50.0, 1.0, 2.0),
    ]);
    let signals = generate_signals(&frame, Strategy::Macd);
    assert_eq!(signals, vec![1, 1, 0]);
}

#[test]
fn composite_strategy_requires_both_conditions_to_enter() {
    let frame = IndicatorFrame::from_rows(vec![
        row(45.0, -1.0, 0.0), // RSI low but MACD below signal, flat
        row(45.0, 1.0, 0.0),  // both conditions, enter
        row(55.0, 1.0, 0.0),  // hold zone
        row(62.0, 1.0, 0.0),  // RSI exit fires despite MACD
        row(45.0, -1.0, 0.0), // stays flat
    ]);
    let signals = generate_signals(&frame, Strategy::Composite);
    assert_eq!(signals, vec![0, 1, 1, 0, 0]);
}

#[test]
fn empty_frame_produces_no_signals() {
    let signals = generate_signals(&IndicatorFrame::default(), Strategy::Rsi);
    assert!(signals.is_empty());
}
