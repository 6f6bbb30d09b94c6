use crate::config::backtest_config::{validate_capital, validate_cost};
use crate::data::PriceSeries;
use crate::error::{BacktestError, Result};
use crate::strategy::{Position, SignalSeries};
use chrono::NaiveDate;
use serde::Serialize;

//daily returns and equity for one date
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReturnPoint {
    pub date: NaiveDate,
    pub market_return: f64,
    //net of transaction costs
    pub strategy_return: f64,
    //1 on days the position changed, 0 otherwise
    pub trade_flag: u8,
    pub strategy_equity: f64,
    pub buy_hold_equity: f64,
}

//strategy and buy-and-hold equity curves, read-only once computed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReturnSeries {
    pub initial_capital: f64,
    pub cost_perc: f64,
    points: Vec<ReturnPoint>,
}

impl ReturnSeries {
    pub fn points(&self) -> &[ReturnPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn strategy_returns(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.strategy_return).collect()
    }

    pub fn strategy_equity(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.strategy_equity).collect()
    }

    pub fn final_strategy_equity(&self) -> Option<f64> {
        self.points.last().map(|p| p.strategy_equity)
    }

    pub fn final_buy_hold_equity(&self) -> Option<f64> {
        self.points.last().map(|p| p.buy_hold_equity)
    }
}

//cost charged on a day where the position changed, in either direction
pub fn transaction_cost(cost_perc: f64, trade_flag: u8) -> f64 {
    if trade_flag > 0 {
        cost_perc
    } else {
        0.0
    }
}

//turns positions into net daily returns and compounds both equity curves
//equity is never clamped, a large enough cost can drive it below zero
pub fn compute_returns(
    prices: &PriceSeries,
    signals: &SignalSeries,
    initial_capital: f64,
    cost_perc: f64,
) -> Result<ReturnSeries> {
    validate_capital(initial_capital)?;
    validate_cost(cost_perc)?;
    check_alignment("returns", prices, signals)?;

    let mut points = Vec::with_capacity(prices.len());
    let mut previous_close: Option<f64> = None;
    let mut previous_position = Position::Flat;
    let mut strategy_growth = 1.0;
    let mut buy_hold_growth = 1.0;

    for (bar, signal) in prices.bars().iter().zip(signals.points()) {
        let market_return = match previous_close {
            Some(close) => bar.close / close - 1.0,
            None => 0.0,
        };

        //the first day has no prior position to change from
        let trade_flag = if previous_close.is_some() {
            signal.position.change_from(previous_position).unsigned_abs()
        } else {
            0
        };

        let strategy_return =
            signal.position.as_f64() * market_return - transaction_cost(cost_perc, trade_flag);

        strategy_growth *= 1.0 + strategy_return;
        buy_hold_growth *= 1.0 + market_return;

        points.push(ReturnPoint {
            date: bar.date,
            market_return,
            strategy_return,
            trade_flag,
            strategy_equity: initial_capital * strategy_growth,
            buy_hold_equity: initial_capital * buy_hold_growth,
        });

        previous_close = Some(bar.close);
        previous_position = signal.position;
    }

    Ok(ReturnSeries {
        initial_capital,
        cost_perc,
        points,
    })
}

//signals must cover exactly the dates of the price series
pub(crate) fn check_alignment(
    step: &'static str,
    prices: &PriceSeries,
    signals: &SignalSeries,
) -> Result<()> {
    if prices.len() != signals.len() {
        return Err(BacktestError::LengthMismatch {
            step,
            expected: prices.len(),
            actual: signals.len(),
        });
    }

    for (bar, signal) in prices.bars().iter().zip(signals.points()) {
        if bar.date != signal.date {
            return Err(BacktestError::DateMismatch {
                step,
                expected: bar.date,
                found: signal.date,
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::generate_signals;
    use approx::assert_relative_eq;

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    fn run(closes: &[f64], short: usize, long: usize, cost: f64) -> ReturnSeries {
        let prices = PriceSeries::from_closes(start(), closes).unwrap();
        let signals = generate_signals(&prices, short, long).unwrap();
        compute_returns(&prices, &signals, 100000.0, cost).unwrap()
    }

    #[test]
    fn hand_computed_equity_without_costs() {
        let returns = run(&[100.0, 101.0, 102.0, 100.0, 99.0, 105.0, 110.0], 2, 3, 0.0);
        let points = returns.points();

        assert_eq!(points[0].market_return, 0.0);
        assert_relative_eq!(points[1].market_return, 0.01, epsilon = 1e-12);

        //long on day 3 (102 -> 100) and day 6 (105 -> 110)
        let expected = 100000.0 * (100.0 / 102.0) * (110.0 / 105.0);
        assert_relative_eq!(
            returns.final_strategy_equity().unwrap(),
            expected,
            max_relative = 1e-12
        );
        assert_relative_eq!(
            returns.final_buy_hold_equity().unwrap(),
            110000.0,
            max_relative = 1e-12
        );

        let flags: Vec<u8> = points.iter().map(|p| p.trade_flag).collect();
        assert_eq!(flags, vec![0, 0, 0, 1, 1, 0, 1]);
    }

    #[test]
    fn cost_charged_once_per_transition_day() {
        let closes = [100.0, 101.0, 102.0, 100.0, 99.0, 105.0, 110.0];
        let free = run(&closes, 2, 3, 0.0);
        let charged = run(&closes, 2, 3, 0.001);

        for (a, b) in free.points().iter().zip(charged.points()) {
            let expected = a.strategy_return - 0.001 * f64::from(a.trade_flag);
            assert_relative_eq!(b.strategy_return, expected, epsilon = 1e-15);
        }
    }

    #[test]
    fn equity_can_go_negative_under_extreme_costs() {
        let returns = run(&[100.0, 99.0, 101.0, 98.0, 102.0, 97.0, 103.0, 96.0], 1, 2, 1.5);

        assert!(returns
            .points()
            .iter()
            .any(|p| p.strategy_equity < 0.0));
    }

    #[test]
    fn identical_inputs_give_identical_outputs() {
        let closes = [100.0, 103.0, 101.0, 104.0, 99.0, 98.0, 106.0, 107.0];
        assert_eq!(run(&closes, 2, 4, 0.002), run(&closes, 2, 4, 0.002));
    }

    #[test]
    fn flat_strategy_keeps_initial_capital() {
        let returns = run(&[10.0, 9.0, 8.0, 7.0, 6.0], 2, 3, 0.001);
        for point in returns.points() {
            assert_eq!(point.strategy_equity, 100000.0);
        }
    }

    #[test]
    fn misaligned_signals_are_rejected() {
        let prices = PriceSeries::from_closes(start(), &[1.0, 2.0, 3.0]).unwrap();
        let shorter = PriceSeries::from_closes(start(), &[1.0, 2.0]).unwrap();
        let signals = generate_signals(&shorter, 1, 2).unwrap();

        assert_eq!(
            compute_returns(&prices, &signals, 1000.0, 0.0),
            Err(BacktestError::LengthMismatch {
                step: "returns",
                expected: 3,
                actual: 2
            })
        );

        let shifted = PriceSeries::from_closes(start().succ_opt().unwrap(), &[1.0, 2.0, 3.0])
            .unwrap();
        let signals = generate_signals(&shifted, 1, 2).unwrap();
        assert!(matches!(
            compute_returns(&prices, &signals, 1000.0, 0.0),
            Err(BacktestError::DateMismatch { .. })
        ));
    }

    #[test]
    fn invalid_capital_and_cost_fail_fast() {
        let prices = PriceSeries::from_closes(start(), &[1.0, 2.0]).unwrap();
        let signals = generate_signals(&prices, 1, 2).unwrap();
        assert_eq!(
            compute_returns(&prices, &signals, -5.0, 0.0),
            Err(BacktestError::InvalidCapital(-5.0))
        );
        assert_eq!(
            compute_returns(&prices, &signals, 1000.0, -0.1),
            Err(BacktestError::InvalidCost(-0.1))
        );
    }
}
