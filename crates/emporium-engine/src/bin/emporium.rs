//! # Emporium CLI
//!
//! Operator front end over the engine. Every command prints JSON.
//!
//! ## Usage
//! ```bash
//! emporium dashboard [today|month|week|quarter|all]
//! emporium trend [DAYS]
//! emporium recent [N]
//! emporium sell COKE-330=2 BREAD-01=1
//! emporium products
//! emporium sales [PRESET]
//! emporium expenses [PRESET]
//! emporium add-expense 2024-03-15 18.50 "Electricity bill" [CATEGORY]
//!
//! # Options (before the command)
//! emporium --config ./emporium.toml --db ./data/shop.db dashboard
//! ```

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use emporium_core::{Money, NewExpense, SaleLine, WindowPreset};
use emporium_engine::{init_tracing, Engine, EngineConfig};

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

const USAGE: &str = "\
Emporium sale engine

Usage: emporium [OPTIONS] <COMMAND> [ARGS]

Commands:
  dashboard [PRESET]                        Metrics for a period (default: today)
  trend [DAYS]                              Daily revenue and expenses
  recent [N]                                Latest sales
  sell CODE=QTY...                          Record a sale
  products                                  List the catalog
  sales [PRESET]                            Sales in a period, newest first
  expenses [PRESET]                         Expenses in a period, newest first
  add-expense DATE AMOUNT DESC [CATEGORY]   Record an expense

Presets: today, month, week, quarter, all

Options:
  -c, --config <PATH>   Config file (default: platform config dir)
  -d, --db <PATH>       Database file, overrides the config
  -h, --help            Show this help message";

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    match run(env::args().skip(1).collect()).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Vec<String>) -> CliResult<ExitCode> {
    let mut config_path: Option<PathBuf> = None;
    let mut db_path: Option<PathBuf> = None;
    let mut rest: Vec<String> = Vec::new();

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                i += 1;
                config_path = Some(PathBuf::from(value_for("--config", args.get(i))?));
            }
            "--db" | "-d" => {
                i += 1;
                db_path = Some(PathBuf::from(value_for("--db", args.get(i))?));
            }
            "--help" | "-h" => {
                println!("{}", USAGE);
                return Ok(ExitCode::SUCCESS);
            }
            _ => rest.push(args[i].clone()),
        }
        i += 1;
    }

    let Some((command, params)) = rest.split_first() else {
        println!("{}", USAGE);
        return Ok(ExitCode::FAILURE);
    };

    let mut config = EngineConfig::load(config_path)?;
    if let Some(path) = db_path {
        config.database.path = path;
    }
    let engine = Engine::open(config).await?;

    let code = match command.as_str() {
        "dashboard" => {
            let preset = preset_arg(params.first(), WindowPreset::Today)?;
            let metrics = engine.aggregation().compute_preset(preset).await?;
            for alert in &metrics.alerts {
                eprintln!("! {}", alert.message());
            }
            print_json(&metrics)?;
            ExitCode::SUCCESS
        }
        "trend" => {
            let days = match params.first() {
                Some(raw) => raw.parse()?,
                None => engine.config().dashboard.trend_days,
            };
            print_json(&engine.aggregation().trend(days).await?)?;
            ExitCode::SUCCESS
        }
        "recent" => {
            let limit = match params.first() {
                Some(raw) => raw.parse()?,
                None => engine.config().dashboard.recent_sales_limit,
            };
            print_json(&engine.aggregation().recent_sales(limit).await?)?;
            ExitCode::SUCCESS
        }
        "sell" => sell(&engine, params).await?,
        "products" => {
            print_json(&engine.products().list().await?)?;
            ExitCode::SUCCESS
        }
        "sales" => {
            let preset = preset_arg(params.first(), WindowPreset::Today)?;
            let window = preset.resolve(Utc::now());
            print_json(&engine.sales().list(&window).await?)?;
            ExitCode::SUCCESS
        }
        "expenses" => {
            let preset = preset_arg(params.first(), WindowPreset::CurrentMonth)?;
            let window = preset.resolve(Utc::now());
            print_json(&engine.expenses().list(&window).await?)?;
            ExitCode::SUCCESS
        }
        "add-expense" => {
            let expense = parse_expense(params)?;
            print_json(&engine.expenses().add(expense).await?)?;
            ExitCode::SUCCESS
        }
        other => {
            eprintln!("Unknown command: {}\n", other);
            eprintln!("{}", USAGE);
            ExitCode::FAILURE
        }
    };

    engine.close().await;
    Ok(code)
}

async fn sell(engine: &Engine, params: &[String]) -> CliResult<ExitCode> {
    let lines = params
        .iter()
        .map(|raw| parse_line(raw))
        .collect::<CliResult<Vec<_>>>()?;

    match engine.recorder().record_sale(&lines).await {
        Ok(sale) => {
            print_json(&sale)?;
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            if e.is_operator_visible() {
                eprintln!("OPERATOR ACTION REQUIRED: {}", e);
            } else {
                eprintln!("Sale refused: {}", e);
            }
            Ok(ExitCode::FAILURE)
        }
    }
}

/// `CODE=QTY`, or a bare `CODE` for one unit.
fn parse_line(raw: &str) -> CliResult<SaleLine> {
    match raw.split_once('=') {
        Some((code, qty)) => {
            let quantity: i64 = qty
                .parse()
                .map_err(|_| format!("invalid quantity in '{}'", raw))?;
            Ok(SaleLine::new(code, quantity))
        }
        None => Ok(SaleLine::new(raw, 1)),
    }
}

fn parse_expense(params: &[String]) -> CliResult<NewExpense> {
    let [date, amount, description, rest @ ..] = params else {
        return Err("usage: add-expense DATE AMOUNT DESC [CATEGORY]".into());
    };

    Ok(NewExpense {
        date: NaiveDate::parse_from_str(date, "%Y-%m-%d")?,
        amount: amount.parse::<Money>()?,
        description: description.clone(),
        category: rest.first().cloned().unwrap_or_default(),
    })
}

fn preset_arg(raw: Option<&String>, default: WindowPreset) -> CliResult<WindowPreset> {
    match raw {
        Some(raw) => Ok(raw.parse()?),
        None => Ok(default),
    }
}

fn value_for<'a>(flag: &str, value: Option<&'a String>) -> CliResult<&'a String> {
    value.ok_or_else(|| format!("{} requires a value", flag).into())
}

fn print_json<T: Serialize>(value: &T) -> CliResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
