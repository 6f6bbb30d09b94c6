//running peak of an equity curve
pub fn running_max(equity: &[f64]) -> Vec<f64> {
    let mut peak = f64::NEG_INFINITY;
    equity
        .iter()
        .map(|&value| {
            peak = peak.max(value);
            peak
        })
        .collect()
}

//drawdown from the running peak as a fraction (0 at a new high, negative below it)
pub fn drawdown_series(equity: &[f64]) -> Vec<f64> {
    equity
        .iter()
        .zip(running_max(equity))
        .map(|(&value, peak)| value / peak - 1.0)
        .collect()
}

//deepest drawdown as a fraction, 0 for an empty or never-declining curve
pub fn max_drawdown(equity: &[f64]) -> f64 {
    drawdown_series(equity).into_iter().fold(0.0, f64::min)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn running_max_tracks_peak() {
        assert_eq!(
            running_max(&[100.0, 120.0, 90.0, 130.0, 125.0]),
            vec![100.0, 120.0, 120.0, 130.0, 130.0]
        );
    }

    #[test]
    fn drawdown_is_relative_to_peak() {
        let dd = drawdown_series(&[100.0, 120.0, 90.0, 130.0]);
        assert_eq!(dd[0], 0.0);
        assert_eq!(dd[1], 0.0);
        assert_relative_eq!(dd[2], -0.25, epsilon = 1e-12);
        assert_eq!(dd[3], 0.0);
    }

    #[test]
    fn max_drawdown_picks_deepest_trough() {
        assert_relative_eq!(
            max_drawdown(&[100.0, 80.0, 110.0, 55.0, 120.0]),
            -0.5,
            epsilon = 1e-12
        );
        assert_eq!(max_drawdown(&[1.0, 2.0, 3.0]), 0.0);
        assert_eq!(max_drawdown(&[]), 0.0);
    }
}
