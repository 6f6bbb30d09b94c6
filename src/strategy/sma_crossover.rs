use crate::config::backtest_config::validate_window;
use crate::data::PriceSeries;
use crate::error::Result;
use crate::strategy::{Position, RollingMean};
use chrono::NaiveDate;
use log::{debug, warn};
use serde::Serialize;

//moving averages and crossover state for one date
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SignalPoint {
    pub date: NaiveDate,
    pub ma_short: f64,
    pub ma_long: f64,
    //1 when the short average is above the long one on this date
    pub signal: Position,
    //yesterday's signal, the exposure actually held today
    pub position: Position,
}

//per-date signals, same length and dates as the price series they came from
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignalSeries {
    pub short_window: usize,
    pub long_window: usize,
    points: Vec<SignalPoint>,
}

impl SignalSeries {
    pub fn points(&self) -> &[SignalPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn positions(&self) -> Vec<Position> {
        self.points.iter().map(|p| p.position).collect()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.points.iter().map(|p| p.date).collect()
    }
}

//computes the crossover signal series
//position[t] is signal[t-1] so a day's exposure never depends on that day's close
pub fn generate_signals(
    prices: &PriceSeries,
    short_window: usize,
    long_window: usize,
) -> Result<SignalSeries> {
    validate_window("short_window", short_window)?;
    validate_window("long_window", long_window)?;

    if short_window >= long_window {
        warn!(
            "short window ({}) is not below long window ({}), crossover signals may be meaningless",
            short_window, long_window
        );
    }

    let mut short_mean = RollingMean::new(short_window);
    let mut long_mean = RollingMean::new(long_window);
    let mut previous_signal = Position::Flat;

    let points: Vec<SignalPoint> = prices
        .bars()
        .iter()
        .map(|bar| {
            let ma_short = short_mean.push(bar.close);
            let ma_long = long_mean.push(bar.close);
            let signal = Position::from_flag(ma_short > ma_long);
            let position = previous_signal;
            previous_signal = signal;

            SignalPoint {
                date: bar.date,
                ma_short,
                ma_long,
                signal,
                position,
            }
        })
        .collect();

    debug!(
        "generated {} signals ({} long days)",
        points.len(),
        points.iter().filter(|p| p.position.is_long()).count()
    );

    Ok(SignalSeries {
        short_window,
        long_window,
        points,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BacktestError;
    use approx::assert_relative_eq;

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    fn values(series: &SignalSeries, f: fn(&SignalPoint) -> f64) -> Vec<f64> {
        series.points().iter().map(f).collect()
    }

    #[test]
    fn hand_computed_averages_and_positions() {
        let prices =
            PriceSeries::from_closes(start(), &[100.0, 101.0, 102.0, 100.0, 99.0, 105.0, 110.0])
                .unwrap();
        let signals = generate_signals(&prices, 2, 3).unwrap();

        let expected_short = [100.0, 100.5, 101.5, 101.0, 99.5, 102.0, 107.5];
        let expected_long = [100.0, 100.5, 101.0, 101.0, 301.0 / 3.0, 304.0 / 3.0, 314.0 / 3.0];
        for (actual, expected) in values(&signals, |p| p.ma_short).iter().zip(expected_short) {
            assert_relative_eq!(*actual, expected, epsilon = 1e-9);
        }
        for (actual, expected) in values(&signals, |p| p.ma_long).iter().zip(expected_long) {
            assert_relative_eq!(*actual, expected, epsilon = 1e-9);
        }

        let signal: Vec<u8> = signals.points().iter().map(|p| p.signal.value()).collect();
        let position: Vec<u8> = signals.points().iter().map(|p| p.position.value()).collect();
        assert_eq!(signal, vec![0, 0, 1, 0, 0, 1, 1]);
        assert_eq!(position, vec![0, 0, 0, 1, 0, 0, 1]);
    }

    #[test]
    fn windows_longer_than_series_use_partial_averages() {
        let prices = PriceSeries::from_closes(start(), &[10.0, 20.0, 30.0]).unwrap();
        let signals = generate_signals(&prices, 5, 100).unwrap();

        assert_eq!(signals.len(), 3);
        for point in signals.points() {
            assert!(point.ma_short.is_finite());
            assert!(point.ma_long.is_finite());
        }
        assert_eq!(values(&signals, |p| p.ma_long), vec![10.0, 15.0, 20.0]);
    }

    #[test]
    fn first_position_is_flat_and_lags_signal() {
        let prices = PriceSeries::from_closes(start(), &[1.0, 2.0, 3.0, 4.0, 3.0, 2.0, 5.0, 1.0])
            .unwrap();
        let signals = generate_signals(&prices, 1, 3).unwrap();
        let points = signals.points();

        assert_eq!(points[0].position, Position::Flat);
        for t in 1..points.len() {
            assert_eq!(points[t].position, points[t - 1].signal);
        }
    }

    #[test]
    fn later_prices_do_not_change_earlier_positions() {
        let base = [100.0, 102.0, 101.0, 105.0, 104.0, 108.0];
        let mut altered = base;
        altered[4] = 50.0;
        altered[5] = 500.0;

        let a = generate_signals(&PriceSeries::from_closes(start(), &base).unwrap(), 2, 3).unwrap();
        let b =
            generate_signals(&PriceSeries::from_closes(start(), &altered).unwrap(), 2, 3).unwrap();

        //prices from index 4 differ, so positions up to and including 4 must match
        for t in 0..=4 {
            assert_eq!(a.points()[t].position, b.points()[t].position);
        }
    }

    #[test]
    fn output_aligns_with_input_dates() {
        let prices = PriceSeries::from_closes(start(), &[5.0, 6.0, 7.0, 8.0]).unwrap();
        let signals = generate_signals(&prices, 2, 3).unwrap();
        assert_eq!(signals.dates(), prices.dates().collect::<Vec<_>>());
    }

    #[test]
    fn flat_prices_after_a_trend_never_signal_long() {
        for base in [100.1, 0.3, 1.1, 17234.55, 48123.7] {
            let mut closes: Vec<f64> = (0..60)
                .map(|i| base * (1.0 + (i as f64 / 4.0).sin() * 0.03))
                .collect();
            closes.extend(std::iter::repeat(base).take(200));

            let prices = PriceSeries::from_closes(start(), &closes).unwrap();
            let signals = generate_signals(&prices, 5, 20).unwrap();

            //from index 79 both windows hold only the repeated close
            for point in &signals.points()[79..] {
                assert_eq!(point.ma_short, base);
                assert_eq!(point.ma_long, base);
                assert_eq!(point.signal, Position::Flat);
            }
            for point in &signals.points()[80..] {
                assert_eq!(point.position, Position::Flat);
            }
        }
    }

    #[test]
    fn zero_window_is_rejected() {
        let prices = PriceSeries::from_closes(start(), &[5.0, 6.0]).unwrap();
        assert_eq!(
            generate_signals(&prices, 2, 0),
            Err(BacktestError::InvalidWindow {
                name: "long_window",
                value: 0
            })
        );
    }

    #[test]
    fn inverted_windows_still_produce_signals() {
        let prices = PriceSeries::from_closes(start(), &[5.0, 6.0, 7.0]).unwrap();
        let signals = generate_signals(&prices, 3, 2).unwrap();
        assert_eq!(signals.len(), 3);
    }
}
