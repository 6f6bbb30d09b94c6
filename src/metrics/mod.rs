pub mod summary;
pub mod timeseries;
pub mod trades;

pub use summary::{cagr_pct, sharpe_ratio, MetricsRecord, PerformanceMetrics};
pub use timeseries::{drawdown_series, max_drawdown, running_max};
pub use trades::{extract_trades, segment_trades, Trade, TradeStats};
