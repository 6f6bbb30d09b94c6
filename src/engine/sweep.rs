use crate::config::BacktestParams;
use crate::data::PriceSeries;
use crate::engine::backtest::run_backtest;
use crate::error::Result;
use crate::metrics::MetricsRecord;
use log::info;
use rayon::prelude::*;
use serde::Serialize;
use std::cmp::Ordering;

//metrics of one window pair in a parameter sweep
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SweepResult {
    pub short_window: usize,
    pub long_window: usize,
    pub metrics: MetricsRecord,
}

//runs an independent backtest for every (short, long) pair with short < long
//runs are spread across the rayon pool, results are ranked by sharpe then total return
pub fn sweep(
    prices: &PriceSeries,
    base: &BacktestParams,
    short_windows: &[usize],
    long_windows: &[usize],
) -> Result<Vec<SweepResult>> {
    let combos: Vec<(usize, usize)> = short_windows
        .iter()
        .flat_map(|&short| long_windows.iter().map(move |&long| (short, long)))
        .filter(|(short, long)| short < long)
        .collect();

    info!("sweeping {} window combinations", combos.len());

    let mut results: Vec<SweepResult> = combos
        .into_par_iter()
        .map(|(short_window, long_window)| {
            let params = BacktestParams {
                short_window,
                long_window,
                ..*base
            };
            run_backtest(prices, &params).map(|result| SweepResult {
                short_window,
                long_window,
                metrics: result.metrics,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    results.sort_by(|a, b| {
        b.metrics
            .sharpe
            .partial_cmp(&a.metrics.sharpe)
            .unwrap_or(Ordering::Equal)
            .then_with(|| {
                b.metrics
                    .total_return_pct
                    .partial_cmp(&a.metrics.total_return_pct)
                    .unwrap_or(Ordering::Equal)
            })
    });

    Ok(results)
}
