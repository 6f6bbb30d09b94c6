use crate::engine::ReturnSeries;
use crate::error::{BacktestError, Result};
use crate::strategy::{Position, SignalSeries};
use chrono::NaiveDate;
use log::debug;
use serde::{Deserialize, Serialize};

//a completed (or still open at series end) long trade
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub entry_date: NaiveDate,
    pub exit_date: NaiveDate,
    //compounded net return over the holding span, as a fraction
    pub return_frac: f64,
}

impl Trade {
    pub fn is_win(&self) -> bool {
        self.return_frac > 0.0
    }

    pub fn holding_days(&self) -> i64 {
        (self.exit_date - self.entry_date).num_days()
    }
}

//aggregate trade statistics
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TradeStats {
    pub num_trades: usize,
    pub win_rate_pct: f64,
    pub avg_profit_per_trade_pct: f64,
}

impl TradeStats {
    pub fn from_trades(trades: &[Trade]) -> Self {
        if trades.is_empty() {
            return TradeStats::default();
        }

        let count = trades.len() as f64;
        let wins = trades.iter().filter(|t| t.is_win()).count() as f64;
        let total: f64 = trades.iter().map(|t| t.return_frac).sum();

        TradeStats {
            num_trades: trades.len(),
            win_rate_pct: wins / count * 100.0,
            avg_profit_per_trade_pct: total / count * 100.0,
        }
    }
}

//index pairs (entry, exit) of each maximal long span
//a position still open at the end is closed on the last index
//every returned pair has entry <= exit
pub fn segment_trades(
    dates: &[NaiveDate],
    positions: &[Position],
) -> Result<Vec<(usize, usize)>> {
    if dates.len() != positions.len() {
        return Err(BacktestError::LengthMismatch {
            step: "trade segmentation",
            expected: dates.len(),
            actual: positions.len(),
        });
    }

    let mut entries = Vec::new();
    let mut exits = Vec::new();

    for t in 1..positions.len() {
        match positions[t].change_from(positions[t - 1]) {
            1 => entries.push(t),
            -1 => exits.push(t),
            _ => {}
        }
    }

    if entries.len() == exits.len() + 1 {
        exits.push(positions.len() - 1);
    }

    if entries.len() != exits.len() {
        return Err(BacktestError::UnbalancedTrades {
            entries: entries.len(),
            exits: exits.len(),
        });
    }

    let spans: Vec<(usize, usize)> = entries.into_iter().zip(exits).collect();
    if let Some(&(entry, exit)) = spans.iter().find(|(entry, exit)| exit < entry) {
        return Err(BacktestError::ExitBeforeEntry {
            entry: dates[entry],
            exit: dates[exit],
        });
    }

    Ok(spans)
}

//splits the position series into trades and compounds each trade's returns
//a trade's span runs from the day after entry through the exit day, empty spans are skipped
pub fn extract_trades(signals: &SignalSeries, returns: &ReturnSeries) -> Result<Vec<Trade>> {
    if signals.len() != returns.len() {
        return Err(BacktestError::LengthMismatch {
            step: "trade statistics",
            expected: signals.len(),
            actual: returns.len(),
        });
    }

    let dates = signals.dates();
    let points = returns.points();
    let mut trades = Vec::new();

    for (entry, exit) in segment_trades(&dates, &signals.positions())? {
        let span = &points[entry + 1..=exit];
        if span.is_empty() {
            continue;
        }

        let growth: f64 = span.iter().map(|p| 1.0 + p.strategy_return).product();
        trades.push(Trade {
            entry_date: dates[entry],
            exit_date: dates[exit],
            return_frac: growth - 1.0,
        });
    }

    debug!("extracted {} trades", trades.len());

    Ok(trades)
}
