use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::types::{MissingKeys, TOP_N_DEFAULT};

#[derive(Debug, Parser)]
#[command(author, version, about = "Canned sales reports over a transactions CSV", long_about = None)]
pub struct Cli {
    /// Transactions CSV file with a header row
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,
    /// Report to compute (see --list); omit to start the interactive menu
    #[arg(short = 'r', long = "report")]
    pub report: Option<String>,
    /// Number of customers for "Top Customers By Spend" (5-50)
    #[arg(long = "top-n", default_value_t = TOP_N_DEFAULT)]
    pub top_n: usize,
    /// How rows with an empty grouping value are treated
    #[arg(long = "missing-keys", value_enum, default_value_t = MissingKeyArg::Drop)]
    pub missing_keys: MissingKeyArg,
    /// Write the report rows to this CSV file
    #[arg(long = "export")]
    pub export: Option<PathBuf>,
    /// Write the report result as JSON to this file
    #[arg(long = "json")]
    pub json: Option<PathBuf>,
    /// Print the first N rows of the prepared dataset
    #[arg(long = "preview")]
    pub preview: Option<usize>,
    /// Maximum number of rows to print for tabular reports
    #[arg(long = "limit", default_value_t = 50)]
    pub limit: usize,
    /// List the available report names and exit
    #[arg(long = "list")]
    pub list: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MissingKeyArg {
    /// Leave rows with an empty key out of the groups
    Drop,
    /// Collect rows with an empty key under `<missing>`
    Bucket,
}

impl From<MissingKeyArg> for MissingKeys {
    fn from(arg: MissingKeyArg) -> Self {
        match arg {
            MissingKeyArg::Drop => MissingKeys::Drop,
            MissingKeyArg::Bucket => MissingKeys::Bucket,
        }
    }
}
