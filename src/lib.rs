pub mod aggregate;
pub mod cli;
pub mod engine;
pub mod error;
pub mod loader;
pub mod output;
pub mod reports;
pub mod session;
pub mod types;
pub mod util;

use std::io;
use std::{env, sync::OnceLock};

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use log::{info, LevelFilter};

use crate::cli::Cli;
use crate::engine::Outcome;
use crate::session::Session;
use crate::types::ReportOptions;

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("txn_report", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    if cli.list {
        for name in engine::selection_names().into_iter().skip(1) {
            println!("{}", name);
        }
        return Ok(());
    }

    let options = ReportOptions::default()
        .with_missing_keys(cli.missing_keys.into())
        .with_top_n(cli.top_n)?;

    let Some(report) = cli.report.as_deref() else {
        let stdin = io::stdin();
        let mut session = Session::new(stdin.lock(), io::stdout(), options, cli.limit);
        if let Some(path) = &cli.input {
            session.load(path)?;
        }
        return session.run();
    };

    let input = cli
        .input
        .as_ref()
        .ok_or_else(|| anyhow!("--input is required together with --report"))?;
    let raw = loader::load_path(input).with_context(|| format!("Loading {:?}", input))?;
    let (ds, prep) = loader::prepare_with_report(raw);
    info!("Prepared {} rows from {:?}", prep.rows, input);

    if let Some(n) = cli.preview {
        println!("{}\n", output::preview_dataset(&ds, n));
    }

    let result = match engine::compute(&ds, report, &options)? {
        Outcome::Idle => return Ok(()),
        Outcome::Skipped(missing) => return Err(anyhow!("{}", missing)),
        Outcome::Ready(result) => result,
    };
    println!("{}", output::render(&result, cli.limit));
    if let Some(line) = output::headline(&result) {
        println!("\n{}", line);
    }
    if let Some(path) = &cli.export {
        output::write_csv(path, &result).with_context(|| format!("Writing report rows to {:?}", path))?;
        info!("Report rows written to {:?}", path);
    }
    if let Some(path) = &cli.json {
        output::write_json(path, &result).with_context(|| format!("Writing JSON to {:?}", path))?;
        info!("Report JSON written to {:?}", path);
    }
    Ok(())
}
