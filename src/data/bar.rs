use crate::error::{BacktestError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

//a single daily ohlcv bar
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    pub fn new(date: NaiveDate, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Bar {
            date,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    //creates a bar where every price field is the close
    pub fn from_close(date: NaiveDate, close: f64) -> Self {
        Bar::new(date, close, close, close, close, 0.0)
    }
}

//a date-ordered daily price series
//construction enforces the input contract, the series is immutable afterwards
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceSeries {
    bars: Vec<Bar>,
}

impl PriceSeries {
    //validates and wraps bars
    //rejects an empty series, missing or non-positive closes and non-increasing dates
    pub fn new(bars: Vec<Bar>) -> Result<Self> {
        if bars.is_empty() {
            return Err(BacktestError::EmptySeries);
        }

        for bar in &bars {
            if !bar.close.is_finite() || bar.close <= 0.0 {
                return Err(BacktestError::InvalidClose {
                    date: bar.date,
                    close: bar.close,
                });
            }
        }

        for pair in bars.windows(2) {
            if pair[1].date <= pair[0].date {
                return Err(BacktestError::NonMonotonicDates {
                    previous: pair[0].date,
                    current: pair[1].date,
                });
            }
        }

        Ok(PriceSeries { bars })
    }

    //builds a series of closes on consecutive calendar days
    pub fn from_closes(start: NaiveDate, closes: &[f64]) -> Result<Self> {
        let bars = start
            .iter_days()
            .zip(closes)
            .map(|(date, &close)| Bar::from_close(date, close))
            .collect();
        PriceSeries::new(bars)
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    //always false for a constructed series, kept for slice-like ergonomics
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn closes(&self) -> impl Iterator<Item = f64> + '_ {
        self.bars.iter().map(|bar| bar.close)
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.bars.iter().map(|bar| bar.date)
    }

    pub fn first_date(&self) -> NaiveDate {
        self.bars[0].date
    }

    pub fn last_date(&self) -> NaiveDate {
        self.bars[self.bars.len() - 1].date
    }
}
