use chrono::NaiveDate;
use thiserror::Error;

//errors raised by the backtest core
//input contract and configuration problems fail fast before any computation,
//degenerate statistics (zero variance, zero elapsed time) are not errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BacktestError {
    #[error("price series is empty")]
    EmptySeries,
    #[error("invalid close price {close} on {date}")]
    InvalidClose { date: NaiveDate, close: f64 },
    #[error("dates must be strictly increasing: {current} follows {previous}")]
    NonMonotonicDates {
        previous: NaiveDate,
        current: NaiveDate,
    },
    #[error("{step}: expected {expected} rows, got {actual}")]
    LengthMismatch {
        step: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("{step}: row date {found} does not match price date {expected}")]
    DateMismatch {
        step: &'static str,
        expected: NaiveDate,
        found: NaiveDate,
    },
    #[error("{name} must be at least 1, got {value}")]
    InvalidWindow { name: &'static str, value: usize },
    #[error("initial capital must be positive and finite, got {0}")]
    InvalidCapital(f64),
    #[error("transaction cost must be non-negative and finite, got {0}")]
    InvalidCost(f64),
    #[error("{step} needs at least 2 rows, got {len}")]
    InsufficientData { step: &'static str, len: usize },
    #[error("unbalanced trades: {entries} entries vs {exits} exits")]
    UnbalancedTrades { entries: usize, exits: usize },
    #[error("trade exit {exit} precedes entry {entry}")]
    ExitBeforeEntry { entry: NaiveDate, exit: NaiveDate },
}

pub type Result<T> = std::result::Result<T, BacktestError>;
