// =============================================================================
// Exponential Moving Average (EMA)
// =============================================================================
//
// Weighted average that favours recent samples:
//
//   multiplier = 2 / (period + 1)
//   EMA_t      = price_t * multiplier + EMA_{t-1} * (1 - multiplier)
//
// The first EMA value is seeded with the SMA of the first `period` inputs.
// Both MACD EMAs and the MACD signal line are built on this function.
// =============================================================================

/// Compute the EMA series for `values` with look-back `period`.
///
/// The returned vector holds one value per input starting at index
/// `period - 1` (the seed consumes the first `period` inputs), so its length
/// is `values.len() - period + 1`.
///
/// # Edge cases
/// - `period == 0` => empty vec
/// - `values.len() < period` => empty vec
/// - A non-finite intermediate value stops the series; downstream consumers
///   must not trust anything past that point.
pub fn calculate_ema(values: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || values.len() < period {
        return Vec::new();
    }

    let multiplier = 2.0 / (period + 1) as f64;

    // Seed: SMA of the first `period` inputs.
    let sma: f64 = values[..period].iter().sum::<f64>() / period as f64;
    if !sma.is_finite() {
        return Vec::new();
    }

    let mut result = Vec::with_capacity(values.len() - period + 1);
    result.push(sma);

    let mut prev = sma;
    for &value in &values[period..] {
        let ema = value * multiplier + prev * (1.0 - multiplier);
        if !ema.is_finite() {
            break;
        }
        result.push(ema);
        prev = ema;
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ema_empty_input() {
        assert!(calculate_ema(&[], 12).is_empty());
    }

    #[test]
    fn ema_period_zero() {
        assert!(calculate_ema(&[1.0, 2.0, 3.0], 0).is_empty());
    }

    #[test]
    fn ema_insufficient_data() {
        assert!(calculate_ema(&[1.0, 2.0], 12).is_empty());
    }

    #[test]
    fn ema_seed_is_sma() {
        // period == len: the single output is the plain SMA.
        let ema = calculate_ema(&[2.0, 4.0, 6.0], 3);
        assert_eq!(ema.len(), 1);
        assert!((ema[0] - 4.0).abs() < 1e-10);
    }

    #[test]
    fn ema_matches_recurrence() {
        let values: Vec<f64> = (1..=10).map(|x| x as f64).collect();
        let ema = calculate_ema(&values, 5);
        assert_eq!(ema.len(), 6);

        let mult = 2.0 / 6.0;
        let mut expected = 3.0; // SMA of 1..=5
        assert!((ema[0] - expected).abs() < 1e-10);
        for (out, &value) in ema[1..].iter().zip(&values[5..]) {
            expected = value * mult + expected * (1.0 - mult);
            assert!((out - expected).abs() < 1e-10, "got {out}, expected {expected}");
        }
    }

    #[test]
    fn ema_flat_series_stays_flat() {
        let ema = calculate_ema(&[42000.0; 30], 12);
        assert_eq!(ema.len(), 19);
        for v in ema {
            assert!((v - 42000.0).abs() < 1e-9);
        }
    }

    #[test]
    fn ema_stops_on_nan() {
        let values = vec![1.0, 2.0, 3.0, f64::NAN, 5.0];
        let ema = calculate_ema(&values, 3);
        // Seed survives; the NaN input poisons the next value and stops output.
        assert_eq!(ema.len(), 1);
    }
}
