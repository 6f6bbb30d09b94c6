use crate::engine::ReturnSeries;
use crate::error::{BacktestError, Result};
use crate::metrics::timeseries::max_drawdown;
use crate::metrics::trades::TradeStats;
use indexmap::IndexMap;
use prettytable::{Cell, Row, Table};
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

const TRADING_DAYS_PER_YEAR: f64 = 252.0;
const DAYS_PER_YEAR: f64 = 365.25;

//tolerance, not an exact zero test: a sample std dev below this is rounding
//residue of a constant series and sharpe falls back to 0.0
const MIN_STD_DEV: f64 = 1e-12;

//return and risk statistics of a backtest
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub total_return_pct: f64,
    pub buy_hold_return_pct: f64,
    pub cagr_pct: f64,
    pub sharpe: f64,
    pub max_drawdown_pct: f64,
}

impl PerformanceMetrics {
    //calculate performance metrics from a completed return series
    //needs at least two rows, zero variance or zero elapsed days fall back to 0.0
    pub fn compute(returns: &ReturnSeries, initial_capital: f64) -> Result<Self> {
        let points = returns.points();
        if points.len() < 2 {
            return Err(BacktestError::InsufficientData {
                step: "performance metrics",
                len: points.len(),
            });
        }

        let first = points[0];
        let last = points[points.len() - 1];

        let total_return_pct = (last.strategy_equity / initial_capital - 1.0) * 100.0;
        let buy_hold_return_pct = (last.buy_hold_equity / initial_capital - 1.0) * 100.0;

        let days = (last.date - first.date).num_days();
        let cagr_pct = cagr_pct(initial_capital, last.strategy_equity, days);

        let sharpe = sharpe_ratio(&returns.strategy_returns());
        let max_drawdown_pct = max_drawdown(&returns.strategy_equity()) * 100.0;

        Ok(PerformanceMetrics {
            total_return_pct,
            buy_hold_return_pct,
            cagr_pct,
            sharpe,
            max_drawdown_pct,
        })
    }
}

//compound annual growth over calendar days, 0.0 when undefined
pub fn cagr_pct(initial_capital: f64, final_equity: f64, days: i64) -> f64 {
    if days <= 0 || final_equity <= 0.0 {
        return 0.0;
    }

    let years = days as f64 / DAYS_PER_YEAR;
    ((final_equity / initial_capital).powf(1.0 / years) - 1.0) * 100.0
}

//annualized sharpe ratio of daily returns
//0.0 when the std dev is within MIN_STD_DEV of zero
pub fn sharpe_ratio(returns: &[f64]) -> f64 {
    if returns.len() < 2 {
        return 0.0;
    }

    let mean = returns.mean();
    let std_dev = returns.std_dev();

    if !std_dev.is_finite() || std_dev < MIN_STD_DEV {
        return 0.0;
    }

    //annualize assuming daily returns
    (mean / std_dev) * TRADING_DAYS_PER_YEAR.sqrt()
}

//flat record of every statistic produced by one backtest run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricsRecord {
    pub total_return_pct: f64,
    pub buy_hold_return_pct: f64,
    pub cagr_pct: f64,
    pub sharpe: f64,
    pub max_drawdown_pct: f64,
    pub num_trades: usize,
    pub win_rate_pct: f64,
    pub avg_profit_per_trade_pct: f64,
}

impl MetricsRecord {
    pub fn merge(performance: PerformanceMetrics, trades: TradeStats) -> Self {
        MetricsRecord {
            total_return_pct: performance.total_return_pct,
            buy_hold_return_pct: performance.buy_hold_return_pct,
            cagr_pct: performance.cagr_pct,
            sharpe: performance.sharpe,
            max_drawdown_pct: performance.max_drawdown_pct,
            num_trades: trades.num_trades,
            win_rate_pct: trades.win_rate_pct,
            avg_profit_per_trade_pct: trades.avg_profit_per_trade_pct,
        }
    }

    //named values in a stable order for display and export
    pub fn entries(&self) -> IndexMap<&'static str, f64> {
        IndexMap::from([
            ("total_return_pct", self.total_return_pct),
            ("buy_hold_return_pct", self.buy_hold_return_pct),
            ("cagr_pct", self.cagr_pct),
            ("sharpe", self.sharpe),
            ("max_drawdown_pct", self.max_drawdown_pct),
            ("num_trades", self.num_trades as f64),
            ("win_rate_pct", self.win_rate_pct),
            ("avg_profit_per_trade_pct", self.avg_profit_per_trade_pct),
        ])
    }

    //prints metrics in a formatted table
    pub fn pretty_print_table(&self) {
        let mut table = Table::new();

        table.add_row(Row::new(vec![Cell::new("Metric"), Cell::new("Value")]));

        let rows = [
            ("Total Return (Strategy)", format!("{:.2}%", self.total_return_pct)),
            ("Buy & Hold Return", format!("{:.2}%", self.buy_hold_return_pct)),
            ("CAGR", format!("{:.2}%", self.cagr_pct)),
            ("Sharpe Ratio", format!("{:.2}", self.sharpe)),
            ("Max Drawdown", format!("{:.2}%", self.max_drawdown_pct)),
            ("Number of Trades", format!("{}", self.num_trades)),
            ("Win Rate", format!("{:.2}%", self.win_rate_pct)),
            (
                "Avg Profit per Trade",
                format!("{:.2}%", self.avg_profit_per_trade_pct),
            ),
        ];

        for (label, value) in rows {
            table.add_row(Row::new(vec![Cell::new(label), Cell::new(&value)]));
        }

        table.printstd();
    }
}
