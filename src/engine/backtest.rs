use crate::config::BacktestParams;
use crate::data::PriceSeries;
use crate::engine::returns::{check_alignment, compute_returns, ReturnSeries};
use crate::error::Result;
use crate::metrics::{
    drawdown_series, extract_trades, MetricsRecord, PerformanceMetrics, Trade, TradeStats,
};
use crate::strategy::{generate_signals, SignalSeries};
use chrono::NaiveDate;
use log::info;
use serde::Serialize;

//one row of the augmented output table
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BacktestRow {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub ma_short: f64,
    pub ma_long: f64,
    pub signal: u8,
    pub position: u8,
    pub market_return: f64,
    pub strategy_return: f64,
    pub trade_flag: u8,
    pub strategy_equity: f64,
    pub buy_hold_equity: f64,
    pub drawdown_pct: f64,
}

//result of a backtest
#[derive(Debug, Clone, PartialEq)]
pub struct BacktestResult {
    pub params: BacktestParams,
    pub signals: SignalSeries,
    pub returns: ReturnSeries,
    pub trades: Vec<Trade>,
    pub metrics: MetricsRecord,
}

impl BacktestResult {
    //joins prices with every derived column
    //the prices must be the series this result was computed from
    pub fn rows(&self, prices: &PriceSeries) -> Result<Vec<BacktestRow>> {
        check_alignment("rows", prices, &self.signals)?;

        let drawdowns = drawdown_series(&self.returns.strategy_equity());

        let rows = prices
            .bars()
            .iter()
            .zip(self.signals.points())
            .zip(self.returns.points())
            .zip(drawdowns)
            .map(|(((bar, signal), ret), drawdown)| BacktestRow {
                date: bar.date,
                open: bar.open,
                high: bar.high,
                low: bar.low,
                close: bar.close,
                volume: bar.volume,
                ma_short: signal.ma_short,
                ma_long: signal.ma_long,
                signal: signal.signal.value(),
                position: signal.position.value(),
                market_return: ret.market_return,
                strategy_return: ret.strategy_return,
                trade_flag: ret.trade_flag,
                strategy_equity: ret.strategy_equity,
                buy_hold_equity: ret.buy_hold_equity,
                drawdown_pct: drawdown * 100.0,
            })
            .collect();

        Ok(rows)
    }
}

//runs one backtest: signals, returns and equity, then performance and trade statistics
//every stage builds a fresh series from the previous one, nothing is shared between runs
pub fn run_backtest(prices: &PriceSeries, params: &BacktestParams) -> Result<BacktestResult> {
    params.validate()?;

    info!(
        "backtesting {} rows ({} to {}), windows {}/{}, capital {:.2}, cost {:.4}",
        prices.len(),
        prices.first_date(),
        prices.last_date(),
        params.short_window,
        params.long_window,
        params.initial_capital,
        params.cost_perc
    );

    let signals = generate_signals(prices, params.short_window, params.long_window)?;
    let returns = compute_returns(prices, &signals, params.initial_capital, params.cost_perc)?;

    let performance = PerformanceMetrics::compute(&returns, params.initial_capital)?;
    let trades = extract_trades(&signals, &returns)?;
    let trade_stats = TradeStats::from_trades(&trades);

    let metrics = MetricsRecord::merge(performance, trade_stats);

    info!(
        "total return {:.2}%, {} trades",
        metrics.total_return_pct, metrics.num_trades
    );

    Ok(BacktestResult {
        params: *params,
        signals,
        returns,
        trades,
        metrics,
    })
}
