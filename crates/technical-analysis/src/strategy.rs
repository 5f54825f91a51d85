use crate::frame::IndicatorFrame;

/// The closed set of signal-combination rules available to the backtester.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Enter below RSI 40, exit above RSI 60.
    Rsi,
    /// Enter on a MACD golden cross, exit on a dead cross.
    Macd,
    /// Enter when RSI < 50 with MACD above signal; exit when RSI > 60 or
    /// MACD drops below signal.
    Composite,
}

/// Daily position series (1 = long, 0 = flat), one entry per frame row.
/// Positions carry over until an exit condition fires.
pub fn generate_signals(frame: &IndicatorFrame, strategy: Strategy) -> Vec<i32> {
    let mut signals = Vec::with_capacity(frame.len());
    let mut position = 0;

    for row in frame.rows() {
        match strategy {
            Strategy::Rsi => {
                if row.rsi < 40.0 {
                    position = 1;
                } else if row.rsi > 60.0 {
                    position = 0;
                }
            }
            Strategy::Macd => {
                if row.macd > row.macd_signal {
                    position = 1;
                } else if row.macd < row.macd_signal {
                    position = 0;
                }
            }
            Strategy::Composite => {
                if row.rsi < 50.0 && row.macd > row.macd_signal {
                    position = 1;
                } else if row.rsi > 60.0 || row.macd < row.macd_signal {
                    position = 0;
                }
            }
        }
        signals.push(position);
    }

    signals
}
