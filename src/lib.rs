//a Rust-based moving-average crossover backtester for daily index data

pub mod config;
pub mod data;
pub mod engine;
pub mod error;
pub mod metrics;
pub mod strategy;

//prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{BacktestConfiguration, BacktestParams};
    pub use crate::data::{load_csv, Bar, PriceSeries};
    pub use crate::engine::{
        compute_returns, run_backtest, sweep, BacktestResult, BacktestRow, ReturnPoint,
        ReturnSeries, SweepResult,
    };
    pub use crate::error::BacktestError;
    pub use crate::metrics::{
        extract_trades, MetricsRecord, PerformanceMetrics, Trade, TradeStats,
    };
    pub use crate::strategy::{generate_signals, Position, SignalPoint, SignalSeries};
}
