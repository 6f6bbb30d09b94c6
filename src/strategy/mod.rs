pub mod sma_crossover;

pub use sma_crossover::{generate_signals, SignalPoint, SignalSeries};

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

//long-only exposure, either fully invested or flat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Position {
    #[default]
    Flat,
    Long,
}

impl Position {
    pub fn from_flag(long: bool) -> Self {
        if long {
            Position::Long
        } else {
            Position::Flat
        }
    }

    //0 for flat, 1 for long
    pub fn value(self) -> u8 {
        match self {
            Position::Flat => 0,
            Position::Long => 1,
        }
    }

    pub fn as_f64(self) -> f64 {
        f64::from(self.value())
    }

    pub fn is_long(self) -> bool {
        self == Position::Long
    }

    //+1 on entry, -1 on exit, 0 otherwise
    pub fn change_from(self, previous: Position) -> i8 {
        self.value() as i8 - previous.value() as i8
    }
}

//trailing mean over at most `capacity` values
//keeps a compensated running sum in a ring buffer, so the mean is partial until the window fills
//a window holding one repeated value averages to exactly that value
#[derive(Debug, Clone)]
pub struct RollingMean {
    values: VecDeque<f64>,
    capacity: usize,
    sum: f64,
    compensation: f64,
    //length of the trailing run of identical values
    run: usize,
}

impl RollingMean {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        RollingMean {
            values: VecDeque::with_capacity(capacity),
            capacity,
            sum: 0.0,
            compensation: 0.0,
            run: 0,
        }
    }

    //adds a value and returns the mean of the current window
    pub fn push(&mut self, value: f64) -> f64 {
        if self.values.len() == self.capacity {
            if let Some(oldest) = self.values.pop_front() {
                self.accumulate(-oldest);
            }
        }

        self.run = match self.values.back() {
            Some(&last) if last == value => self.run + 1,
            _ => 1,
        };

        self.values.push_back(value);
        self.accumulate(value);

        if self.run >= self.values.len() {
            return value;
        }
        (self.sum + self.compensation) / self.values.len() as f64
    }

    //neumaier summation
    fn accumulate(&mut self, value: f64) {
        let total = self.sum + value;
        if self.sum.abs() >= value.abs() {
            self.compensation += (self.sum - total) + value;
        } else {
            self.compensation += (value - total) + self.sum;
        }
        self.sum = total;
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rolling_mean_is_partial_until_full() {
        let mut mean = RollingMean::new(3);
        assert_eq!(mean.push(3.0), 3.0);
        assert_eq!(mean.push(5.0), 4.0);
        assert_eq!(mean.push(7.0), 5.0);
        assert_eq!(mean.len(), 3);
        assert_eq!(mean.push(9.0), 7.0);
        assert_eq!(mean.len(), 3);
    }

    #[test]
    fn repeated_values_average_exactly() {
        for base in [100.1, 0.3, 1.1, 17234.55, 48123.7] {
            let mut short = RollingMean::new(5);
            let mut long = RollingMean::new(20);
            for i in 0..60 {
                let value = base * (1.0 + (i as f64 / 3.0).sin() * 0.05);
                short.push(value);
                long.push(value);
            }
            for repeat in 1..=200 {
                let ma_short = short.push(base);
                let ma_long = long.push(base);
                if repeat >= 5 {
                    assert_eq!(ma_short, base);
                }
                if repeat >= 20 {
                    assert_eq!(ma_long, base);
                }
            }
        }
    }

    #[test]
    fn compensated_sum_stays_close_after_many_evictions() {
        let mut mean = RollingMean::new(4);
        for i in 0..10_000 {
            mean.push(1e6 + (i % 7) as f64 * 0.1);
        }
        //window is now 0.1, 0.2, 0.3 (i = 9997..9999) plus 0.6 above 1e6
        assert!((mean.push(1e6 + 0.6) - (1e6 + 0.3)).abs() < 1e-9);
    }

    #[test]
    fn rolling_mean_of_one_tracks_last_value() {
        let mut mean = RollingMean::new(1);
        for value in [4.0, 8.0, 2.0] {
            assert_eq!(mean.push(value), value);
        }
    }

    #[test]
    fn position_changes() {
        assert_eq!(Position::Long.change_from(Position::Flat), 1);
        assert_eq!(Position::Flat.change_from(Position::Long), -1);
        assert_eq!(Position::Long.change_from(Position::Long), 0);
        assert_eq!(Position::from_flag(true).value(), 1);
        assert_eq!(Position::default(), Position::Flat);
    }
}
