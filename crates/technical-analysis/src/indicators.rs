use advisor_core::Bar;

/// Simple Moving Average. Trailing-aligned: result[0] covers the first
/// `period` inputs.
pub fn sma(data: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || data.len() < period {
        return vec![];
    }

    let mut result = Vec::with_capacity(data.len() - period + 1);
    let mut sum: f64 = data[..period].iter().sum();
    result.push(sum / period as f64);
    for i in period..data.len() {
        sum += data[i] - data[i - period];
        result.push(sum / period as f64);
    }
    result
}

/// Exponential Moving Average, full length, seeded with the first value.
pub fn ema(data: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || data.is_empty() {
        return vec![];
    }

    let multiplier = 2.0 / (period as f64 + 1.0);
    let mut result = Vec::with_capacity(data.len());
    result.push(data[0]);
    for i in 1..data.len() {
        let prev = result[i - 1];
        result.push((data[i] - prev) * multiplier + prev);
    }
    result
}

/// Relative Strength Index with Wilder smoothing. First value corresponds
/// to input index `period + 1`.
pub fn rsi(data: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || data.len() < period + 2 {
        return vec![];
    }

    let mut gains = Vec::with_capacity(data.len() - 1);
    let mut losses = Vec::with_capacity(data.len() - 1);
    for pair in data.windows(2) {
        let change = pair[1] - pair[0];
        gains.push(change.max(0.0));
        losses.push((-change).max(0.0));
    }

    let mut avg_gain = gains[..period].iter().sum::<f64>() / period as f64;
    let mut avg_loss = losses[..period].iter().sum::<f64>() / period as f64;

    let mut values = Vec::with_capacity(gains.len() - period);
    for i in period..gains.len() {
        avg_gain = (avg_gain * (period - 1) as f64 + gains[i]) / period as f64;
        avg_loss = (avg_loss * (period - 1) as f64 + losses[i]) / period as f64;

        if avg_loss == 0.0 {
            values.push(100.0);
        } else {
            let rs = avg_gain / avg_loss;
            values.push(100.0 - 100.0 / (1.0 + rs));
        }
    }
    values
}

/// MACD line, signal line and histogram, all full length and index-aligned
/// with the input. Values before the slow warm-up are numerically present
/// but not meaningful; the frame layer enforces warm-up cutoffs.
pub struct MacdResult {
    pub macd: Vec<f64>,
    pub signal: Vec<f64>,
    pub histogram: Vec<f64>,
}

pub fn macd(data: &[f64], fast: usize, slow: usize, signal_period: usize) -> MacdResult {
    if fast == 0 || slow == 0 || signal_period == 0 || slow <= fast || data.is_empty() {
        return MacdResult { macd: vec![], signal: vec![], histogram: vec![] };
    }

    let ema_fast = ema(data, fast);
    let ema_slow = ema(data, slow);
    let macd: Vec<f64> = ema_fast
        .iter()
        .zip(&ema_slow)
        .map(|(f, s)| f - s)
        .collect();
    let signal = ema(&macd, signal_period);
    let histogram: Vec<f64> = macd.iter().zip(&signal).map(|(m, s)| m - s).collect();

    MacdResult { macd, signal, histogram }
}

/// Bollinger Bands, trailing-aligned like [`sma`].
pub struct BollingerBands {
    pub upper: Vec<f64>,
    pub middle: Vec<f64>,
    pub lower: Vec<f64>,
}

pub fn bollinger_bands(data: &[f64], period: usize, std_dev: f64) -> BollingerBands {
    if period == 0 || data.len() < period {
        return BollingerBands { upper: vec![], middle: vec![], lower: vec![] };
    }

    let middle = sma(data, period);
    let mut upper = Vec::with_capacity(middle.len());
    let mut lower = Vec::with_capacity(middle.len());

    for (j, mean) in middle.iter().enumerate() {
        let window = &data[j..j + period];
        let variance =
            window.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / period as f64;
        let std = variance.sqrt();
        upper.push(mean + std_dev * std);
        lower.push(mean - std_dev * std);
    }

    BollingerBands { upper, middle, lower }
}

/// Average True Range with Wilder smoothing. First value corresponds to
/// input index `period`.
pub fn atr(bars: &[Bar], period: usize) -> Vec<f64> {
    if period == 0 || bars.len() < period + 1 {
        return vec![];
    }

    let mut true_ranges = Vec::with_capacity(bars.len() - 1);
    for pair in bars.windows(2) {
        let high_low = pair[1].high - pair[1].low;
        let high_close = (pair[1].high - pair[0].close).abs();
        let low_close = (pair[1].low - pair[0].close).abs();
        true_ranges.push(high_low.max(high_close).max(low_close));
    }

    let mut values = Vec::with_capacity(true_ranges.len() - period + 1);
    let mut current = true_ranges[..period].iter().sum::<f64>() / period as f64;
    values.push(current);
    for tr in &true_ranges[period..] {
        current = (current * (period - 1) as f64 + tr) / period as f64;
        values.push(current);
    }
    values
}

/// Stochastic oscillator. %K is trailing-aligned on `k_period`; %D is the
/// SMA of %K over `d_period`.
pub struct StochasticResult {
    pub k: Vec<f64>,
    pub d: Vec<f64>,
}

pub fn stochastic(bars: &[Bar], k_period: usize, d_period: usize) -> StochasticResult {
    if k_period == 0 || bars.len() < k_period {
        return StochasticResult { k: vec![], d: vec![] };
    }

    let mut k_values = Vec::with_capacity(bars.len() - k_period + 1);
    for i in k_period - 1..bars.len() {
        let window = &bars[i + 1 - k_period..=i];
        let highest = window.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max);
        let lowest = window.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);

        // Flat window: park %K mid-range instead of dividing by zero.
        if highest == lowest {
            k_values.push(50.0);
        } else {
            k_values.push(100.0 * (bars[i].close - lowest) / (highest - lowest));
        }
    }

    let d_values = sma(&k_values, d_period);
    StochasticResult { k: k_values, d: d_values }
}

/// Commodity Channel Index over typical prices, trailing-aligned.
pub fn cci(bars: &[Bar], period: usize) -> Vec<f64> {
    if period == 0 || bars.len() < period {
        return vec![];
    }

    let typical: Vec<f64> = bars
        .iter()
        .map(|b| (b.high + b.low + b.close) / 3.0)
        .collect();
    let means = sma(&typical, period);

    let mut values = Vec::with_capacity(means.len());
    for (j, mean) in means.iter().enumerate() {
        let window = &typical[j..j + period];
        let mean_dev =
            window.iter().map(|x| (x - mean).abs()).sum::<f64>() / period as f64;
        if mean_dev == 0.0 {
            values.push(0.0);
        } else {
            values.push((typical[j + period - 1] - mean) / (0.015 * mean_dev));
        }
    }
    values
}

/// On-Balance Volume, full length.
pub fn obv(bars: &[Bar]) -> Vec<f64> {
    if bars.is_empty() {
        return vec![];
    }

    let mut values = Vec::with_capacity(bars.len());
    values.push(bars[0].volume);
    for i in 1..bars.len() {
        let prev = values[i - 1];
        let next = if bars[i].close > bars[i - 1].close {
            prev + bars[i].volume
        } else if bars[i].close < bars[i - 1].close {
            prev - bars[i].volume
        } else {
            prev
        };
        values.push(next);
    }
    values
}
