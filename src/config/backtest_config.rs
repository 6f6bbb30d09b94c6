use crate::error::{BacktestError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

//parameters consumed by the backtest core
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestParams {
    pub short_window: usize,
    pub long_window: usize,
    pub initial_capital: f64,
    //fraction charged per position change (0.001 = 0.1%)
    pub cost_perc: f64,
}

impl Default for BacktestParams {
    fn default() -> Self {
        BacktestParams {
            short_window: 20,
            long_window: 50,
            initial_capital: 100000.0,
            cost_perc: 0.001,
        }
    }
}

impl BacktestParams {
    pub fn new(short_window: usize, long_window: usize, initial_capital: f64, cost_perc: f64) -> Self {
        BacktestParams {
            short_window,
            long_window,
            initial_capital,
            cost_perc,
        }
    }

    //checks every parameter before any computation starts
    //short_window >= long_window is allowed, the signal generator only warns about it
    pub fn validate(&self) -> Result<()> {
        validate_window("short_window", self.short_window)?;
        validate_window("long_window", self.long_window)?;
        validate_capital(self.initial_capital)?;
        validate_cost(self.cost_perc)
    }
}

pub(crate) fn validate_window(name: &'static str, value: usize) -> Result<()> {
    if value == 0 {
        return Err(BacktestError::InvalidWindow { name, value });
    }
    Ok(())
}

pub(crate) fn validate_capital(initial_capital: f64) -> Result<()> {
    if !initial_capital.is_finite() || initial_capital <= 0.0 {
        return Err(BacktestError::InvalidCapital(initial_capital));
    }
    Ok(())
}

pub(crate) fn validate_cost(cost_perc: f64) -> Result<()> {
    if !cost_perc.is_finite() || cost_perc < 0.0 {
        return Err(BacktestError::InvalidCost(cost_perc));
    }
    Ok(())
}

//complete run configuration, loadable from json
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestConfiguration {
    //data
    pub data_path: PathBuf,

    //strategy and account
    #[serde(flatten)]
    pub params: BacktestParams,

    //optional output paths
    #[serde(default)]
    pub output_series_csv: Option<PathBuf>,
    #[serde(default)]
    pub output_metrics_json: Option<PathBuf>,
}

impl Default for BacktestConfiguration {
    fn default() -> Self {
        BacktestConfiguration {
            data_path: PathBuf::from("data/nifty.csv"),
            params: BacktestParams::default(),
            output_series_csv: None,
            output_metrics_json: None,
        }
    }
}

impl BacktestConfiguration {
    //load configuration from a JSON file
    pub fn from_json_file(path: &PathBuf) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: BacktestConfiguration = serde_json::from_str(&contents)?;
        Ok(config)
    }

    //save configuration to a JSON file
    pub fn to_json_file(&self, path: &PathBuf) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
