use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;
use tabled::Tabled;

use crate::util::{format_int, format_number, parse_f64_safe};

pub const CUST_ID: &str = "cust_id";
pub const T_AMT: &str = "t_amt";
pub const T_DATE: &str = "t_date";
pub const SERVICES: &str = "services";
pub const PRODUCTS_USED: &str = "products_used";
pub const STATE: &str = "state";
pub const CITY: &str = "city";
pub const T_DETAILS: &str = "t_details";
pub const MONTH: &str = "month";
pub const QUARTER: &str = "quarter";

/// Label used for the missing-key group when `MissingKeys::Bucket` is active.
pub const MISSING_LABEL: &str = "<missing>";

/// A present cell. Absent or unparsable cells are `None` in the row.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    Date(NaiveDate),
}

impl Value {
    pub fn as_amount(&self) -> Option<f64> {
        match self {
            Value::Text(s) => parse_f64_safe(Some(s)),
            Value::Date(_) => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => f.write_str(s),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
        }
    }
}

pub type Row = Vec<Option<Value>>;

/// In-memory transactions table. Header order and row order are the
/// order of the source file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub headers: Vec<String>,
    pub rows: Vec<Row>,
}

impl Dataset {
    pub fn new(headers: Vec<String>, rows: Vec<Row>) -> Self {
        Self { headers, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<&Value> {
        self.rows.get(row)?.get(column)?.as_ref()
    }

    /// Cell text for every row; all `None` when the column is absent.
    pub fn keys(&self, name: &str) -> Vec<Option<String>> {
        match self.column_index(name) {
            Some(idx) => (0..self.len())
                .map(|r| self.cell(r, idx).map(|v| v.to_string()))
                .collect(),
            None => vec![None; self.len()],
        }
    }

    /// Numeric reading of every row; unparsable or absent cells are `None`.
    pub fn amounts(&self, name: &str) -> Vec<Option<f64>> {
        match self.column_index(name) {
            Some(idx) => (0..self.len())
                .map(|r| self.cell(r, idx).and_then(Value::as_amount))
                .collect(),
            None => vec![None; self.len()],
        }
    }

    /// Append a column; `values` must hold one entry per row.
    pub fn push_column(&mut self, name: &str, values: Vec<Option<Value>>) {
        self.headers.push(name.to_string());
        for (row, value) in self.rows.iter_mut().zip(values) {
            row.push(value);
        }
    }
}

/// How a grouping treats rows whose key cell is missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingKeys {
    #[default]
    Drop,
    Bucket,
}

pub const TOP_N_MIN: usize = 5;
pub const TOP_N_MAX: usize = 50;
pub const TOP_N_DEFAULT: usize = 10;

/// Per-request knobs the shell passes alongside the report name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportOptions {
    pub top_n: usize,
    pub missing_keys: MissingKeys,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            top_n: TOP_N_DEFAULT,
            missing_keys: MissingKeys::Drop,
        }
    }
}

impl ReportOptions {
    pub fn with_top_n(mut self, top_n: usize) -> crate::error::Result<Self> {
        if !(TOP_N_MIN..=TOP_N_MAX).contains(&top_n) {
            return Err(crate::error::ReportError::TopNOutOfRange { value: top_n });
        }
        self.top_n = top_n;
        Ok(self)
    }

    pub fn with_missing_keys(mut self, missing_keys: MissingKeys) -> Self {
        self.missing_keys = missing_keys;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Unit {
    /// Thousands separators, 2 decimals.
    Currency,
    /// Thousands separators, 3 decimals.
    Precise,
    /// 2 decimals with a trailing `%`.
    Percent,
    Count,
}

impl Unit {
    pub fn format(self, value: f64) -> String {
        match self {
            Unit::Currency => format_number(value, 2),
            Unit::Precise => format_number(value, 3),
            Unit::Percent => format!("{:.2}%", value),
            Unit::Count => format_int(value.round() as i64),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metric {
    pub label: String,
    pub value: f64,
    pub unit: Unit,
}

impl Metric {
    pub fn new(label: &str, value: f64, unit: Unit) -> Self {
        Self {
            label: label.to_string(),
            value,
            unit,
        }
    }

    pub fn display_value(&self) -> String {
        self.unit.format(self.value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankEntry {
    pub key: String,
    pub value: f64,
}

/// Ordered key → value series, ready to chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ranking {
    pub key: String,
    pub measure: String,
    pub unit: Unit,
    pub headline: Option<String>,
    pub entries: Vec<RankEntry>,
}

impl Ranking {
    pub fn top(&self) -> Option<&RankEntry> {
        self.entries.first()
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.entries.iter().find(|e| e.key == key).map(|e| e.value)
    }

    pub fn keys(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.key.as_str()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BreakdownEntry {
    pub key: String,
    pub total: f64,
    pub average: Option<f64>,
}

/// Per-group total and mean, as produced by the quantile screens.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Breakdown {
    pub key: String,
    pub entries: Vec<BreakdownEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Leader {
    pub group: String,
    pub item: String,
    pub count: u64,
}

/// Most frequent item within each group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Leaders {
    pub group: String,
    pub item: String,
    pub entries: Vec<Leader>,
}

/// Zero-filled count table indexed by two categorical columns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Pivot {
    pub row_key: String,
    pub column_key: String,
    pub rows: Vec<String>,
    pub columns: Vec<String>,
    pub counts: Vec<Vec<u64>>,
}

impl Pivot {
    pub fn get(&self, row: &str, column: &str) -> Option<u64> {
        let r = self.rows.iter().position(|k| k == row)?;
        let c = self.columns.iter().position(|k| k == column)?;
        self.counts.get(r)?.get(c).copied()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum ReportResult {
    Metric(Metric),
    Metrics(Vec<Metric>),
    Ranking(Ranking),
    Breakdown(Breakdown),
    Leaders(Leaders),
    Pivot(Pivot),
}

impl ReportResult {
    pub fn as_ranking(&self) -> Option<&Ranking> {
        match self {
            ReportResult::Ranking(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_metric(&self) -> Option<&Metric> {
        match self {
            ReportResult::Metric(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_metrics(&self) -> Option<&[Metric]> {
        match self {
            ReportResult::Metrics(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_breakdown(&self) -> Option<&Breakdown> {
        match self {
            ReportResult::Breakdown(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_leaders(&self) -> Option<&Leaders> {
        match self {
            ReportResult::Leaders(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_pivot(&self) -> Option<&Pivot> {
        match self {
            ReportResult::Pivot(p) => Some(p),
            _ => None,
        }
    }
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct MetricRow {
    #[serde(rename = "Metric")]
    #[tabled(rename = "Metric")]
    pub label: String,
    #[serde(rename = "Value")]
    #[tabled(rename = "Value")]
    pub value: String,
}
