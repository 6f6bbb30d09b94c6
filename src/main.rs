use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use macross::prelude::*;
use prettytable::{Cell, Row, Table};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "macross")]
#[command(about = "A moving-average crossover backtester for daily index data", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    //run a single backtest
    Run {
        //path to csv data file (overrides the config file)
        #[arg(long)]
        data: Option<PathBuf>,

        //json configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        //short moving average window in days
        #[arg(long)]
        short: Option<usize>,

        //long moving average window in days
        #[arg(long)]
        long: Option<usize>,

        //initial capital
        #[arg(long)]
        capital: Option<f64>,

        //transaction cost per trade side in percent (0.10 = 0.1%)
        #[arg(long)]
        cost_pct: Option<f64>,

        //output path for the augmented series csv
        #[arg(long)]
        output_series_csv: Option<PathBuf>,

        //output path for the metrics json
        #[arg(long)]
        output_metrics_json: Option<PathBuf>,

        //print every trade
        #[arg(long)]
        show_trades: bool,
    },
    //backtest a grid of window pairs in parallel
    Sweep {
        //path to csv data file
        #[arg(long)]
        data: PathBuf,

        //short windows to try (comma separated)
        #[arg(long, value_delimiter = ',', default_value = "5,10,20")]
        shorts: Vec<usize>,

        //long windows to try (comma separated)
        #[arg(long, value_delimiter = ',', default_value = "50,100,200")]
        longs: Vec<usize>,

        //initial capital
        #[arg(long, default_value = "100000")]
        capital: f64,

        //transaction cost per trade side in percent (0.10 = 0.1%)
        #[arg(long, default_value = "0.10")]
        cost_pct: f64,

        //number of best combinations to show
        #[arg(long, default_value = "10")]
        top: usize,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            data,
            config,
            short,
            long,
            capital,
            cost_pct,
            output_series_csv,
            output_metrics_json,
            show_trades,
        } => {
            let mut configuration = match config {
                Some(path) => BacktestConfiguration::from_json_file(&path)
                    .context(format!("Failed to load config from {:?}", path))?,
                None => BacktestConfiguration::default(),
            };

            //command line flags win over the config file
            if let Some(data) = data {
                configuration.data_path = data;
            }
            if let Some(short) = short {
                configuration.params.short_window = short;
            }
            if let Some(long) = long {
                configuration.params.long_window = long;
            }
            if let Some(capital) = capital {
                configuration.params.initial_capital = capital;
            }
            if let Some(cost_pct) = cost_pct {
                configuration.params.cost_perc = cost_pct / 100.0;
            }
            if output_series_csv.is_some() {
                configuration.output_series_csv = output_series_csv;
            }
            if output_metrics_json.is_some() {
                configuration.output_metrics_json = output_metrics_json;
            }

            run(&configuration, show_trades)?;
        }
        Commands::Sweep {
            data,
            shorts,
            longs,
            capital,
            cost_pct,
            top,
        } => {
            let params = BacktestParams {
                initial_capital: capital,
                cost_perc: cost_pct / 100.0,
                ..BacktestParams::default()
            };
            run_sweep(&data, &params, &shorts, &longs, top)?;
        }
    }

    Ok(())
}

fn run(configuration: &BacktestConfiguration, show_trades: bool) -> Result<()> {
    let params = &configuration.params;

    println!("Moving Average Crossover Backtester");
    println!("===================================\n");

    let prices = load_csv(&configuration.data_path).context(format!(
        "Failed to load data from {:?}",
        configuration.data_path
    ))?;

    println!("Loaded {} rows", prices.len());
    println!(
        "Date range: {} to {}\n",
        prices.first_date(),
        prices.last_date()
    );
    println!(
        "Strategy: MA crossover (short={}, long={})",
        params.short_window, params.long_window
    );
    println!("Initial capital: {:.2}", params.initial_capital);
    println!(
        "Transaction cost: {:.2}% per side\n",
        params.cost_perc * 100.0
    );

    let result = run_backtest(&prices, params).context("Backtest failed")?;

    println!("Backtest Results");
    println!("================\n");
    result.metrics.pretty_print_table();

    if show_trades {
        println!();
        print_trades(&result.trades);
    }

    if let Some(path) = &configuration.output_series_csv {
        let rows = result.rows(&prices).context("Failed to build series rows")?;
        save_series_csv(&rows, path)?;
        println!("\nSeries saved to {:?}", path);
    }

    if let Some(path) = &configuration.output_metrics_json {
        save_metrics_json(&result.metrics, path)?;
        println!("Metrics saved to {:?}", path);
    }

    Ok(())
}

fn run_sweep(
    data_path: &Path,
    params: &BacktestParams,
    shorts: &[usize],
    longs: &[usize],
    top: usize,
) -> Result<()> {
    let prices =
        load_csv(data_path).context(format!("Failed to load data from {:?}", data_path))?;

    let results = sweep(&prices, params, shorts, longs).context("Sweep failed")?;
    info!("sweep finished with {} results", results.len());

    let mut table = Table::new();
    table.add_row(Row::new(vec![
        Cell::new("Short"),
        Cell::new("Long"),
        Cell::new("Sharpe"),
        Cell::new("Total Return"),
        Cell::new("CAGR"),
        Cell::new("Max Drawdown"),
        Cell::new("Trades"),
    ]));

    for result in results.iter().take(top) {
        let metrics = &result.metrics;
        table.add_row(Row::new(vec![
            Cell::new(&result.short_window.to_string()),
            Cell::new(&result.long_window.to_string()),
            Cell::new(&format!("{:.2}", metrics.sharpe)),
            Cell::new(&format!("{:.2}%", metrics.total_return_pct)),
            Cell::new(&format!("{:.2}%", metrics.cagr_pct)),
            Cell::new(&format!("{:.2}%", metrics.max_drawdown_pct)),
            Cell::new(&metrics.num_trades.to_string()),
        ]));
    }

    table.printstd();

    Ok(())
}

fn print_trades(trades: &[Trade]) {
    let mut table = Table::new();
    table.add_row(Row::new(vec![
        Cell::new("Entry"),
        Cell::new("Exit"),
        Cell::new("Days"),
        Cell::new("Return"),
    ]));

    for trade in trades {
        table.add_row(Row::new(vec![
            Cell::new(&trade.entry_date.to_string()),
            Cell::new(&trade.exit_date.to_string()),
            Cell::new(&trade.holding_days().to_string()),
            Cell::new(&format!("{:.2}%", trade.return_frac * 100.0)),
        ]));
    }

    table.printstd();
}

fn save_series_csv(rows: &[BacktestRow], path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .context(format!("Failed to create series file {:?}", path))?;

    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    Ok(())
}

fn save_metrics_json(metrics: &MetricsRecord, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(&metrics.entries())?;
    std::fs::write(path, json).context(format!("Failed to write metrics to {:?}", path))?;
    Ok(())
}
