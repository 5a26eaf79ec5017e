//! Exponential moving averages.
//!
//! Recursive form, seeded with the first observation:
//! y[0] = x[0], y[i] = a*x[i] + (1-a)*y[i-1].
//! Span EMAs use a = 2/(span+1); Wilder smoothing uses a = 1/period.
//! Every output is defined, so callers decide their own warmup.

use crate::domain::ohlcv::OhlcvBar;

/// Smoothing factor for a span-based EMA.
pub fn span_alpha(span: usize) -> f64 {
    2.0 / (span as f64 + 1.0)
}

/// EMA over a dense slice of values.
pub fn ema_values(values: &[f64], span: usize) -> Vec<f64> {
    if span == 0 {
        return Vec::new();
    }
    let alpha = span_alpha(span);
    let mut out = Vec::with_capacity(values.len());
    let mut prev: Option<f64> = None;
    for &x in values {
        let next = match prev {
            None => x,
            Some(p) => alpha * x + (1.0 - alpha) * p,
        };
        out.push(next);
        prev = Some(next);
    }
    out
}

/// EMA of closing prices.
pub fn calculate_ema(bars: &[OhlcvBar], span: usize) -> Vec<f64> {
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    ema_values(&closes, span)
}

/// EMA over a series with a leading undefined stretch.
///
/// Leading `None`s are skipped; the first `Some` seeds the average. Output is
/// `None` until `min_periods` observations have been seen.
pub fn ewm_alpha(values: &[Option<f64>], alpha: f64, min_periods: usize) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(values.len());
    let mut prev: Option<f64> = None;
    let mut seen = 0usize;

    for value in values {
        match value {
            Some(x) => {
                seen += 1;
                let next = match prev {
                    None => *x,
                    Some(p) => alpha * x + (1.0 - alpha) * p,
                };
                prev = Some(next);
                out.push(if seen >= min_periods { prev } else { None });
            }
            None => out.push(if seen >= min_periods { prev } else { None }),
        }
    }
    out
}
