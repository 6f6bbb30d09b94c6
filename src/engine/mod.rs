pub mod backtest;
pub mod returns;
pub mod sweep;

pub use backtest::{run_backtest, BacktestResult, BacktestRow};
pub use returns::{compute_returns, transaction_cost, ReturnPoint, ReturnSeries};
pub use sweep::{sweep, SweepResult};
