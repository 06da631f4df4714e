use crate::error::{ReportError, Result};
use crate::types::{Dataset, Row, Value, MONTH, QUARTER, T_DATE};
use crate::util::parse_date_safe;
use chrono::Datelike;
use csv::ReaderBuilder;
use log::{debug, info, warn};
use std::collections::{HashMap, HashSet};
use std::io::Read;
use std::path::Path;

/// Cell texts read as missing, alongside the empty field.
pub const NA_TOKENS: &[&str] = &[
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN", "<NA>", "N/A", "NA",
    "NULL", "NaN", "None", "n/a", "nan", "null",
];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrepareReport {
    pub rows: usize,
    pub unparsed_dates: usize,
    pub derived_month: bool,
    pub derived_quarter: bool,
}

pub fn load_path(path: impl AsRef<Path>) -> Result<Dataset> {
    let path = path.as_ref();
    debug!("Opening {:?}", path);
    let file = std::fs::File::open(path)?;
    load_reader(file)
}

pub fn load_bytes(bytes: &[u8]) -> Result<Dataset> {
    load_reader(bytes)
}

/// Rename repeated header names to `name.1`, `name.2`, ... so every
/// column stays addressable.
fn dedupe_headers(headers: Vec<String>) -> Vec<String> {
    let mut seen: HashSet<String> = headers.iter().cloned().collect();
    let mut first = HashSet::new();
    let mut suffixes: HashMap<String, usize> = HashMap::new();
    let mut out = Vec::with_capacity(headers.len());
    for h in headers {
        if first.insert(h.clone()) {
            out.push(h);
            continue;
        }
        let n = suffixes.entry(h.clone()).or_insert(0);
        let renamed = loop {
            *n += 1;
            let candidate = format!("{}.{}", h, n);
            if !seen.contains(&candidate) {
                break candidate;
            }
        };
        warn!("Duplicate column '{}' renamed to '{}'", h, renamed);
        seen.insert(renamed.clone());
        out.push(renamed);
    }
    out
}

fn is_missing(field: &str) -> bool {
    field.is_empty() || NA_TOKENS.contains(&field)
}

/// Parse comma-separated text with a header row. Empty fields and NA
/// tokens become missing cells; short rows are padded, long rows are
/// rejected.
pub fn load_reader<R: Read>(reader: R) -> Result<Dataset> {
    let mut rdr = ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
    if headers.is_empty() || (headers.len() == 1 && headers[0].is_empty()) {
        return Err(ReportError::EmptyInput);
    }
    let headers = dedupe_headers(headers);

    let width = headers.len();
    let mut rows: Vec<Row> = Vec::new();
    for (idx, result) in rdr.records().enumerate() {
        let record = result?;
        if record.len() > width {
            return Err(ReportError::RaggedRow {
                row: idx + 2,
                found: record.len(),
                expected: width,
            });
        }
        let mut row: Row = record
            .iter()
            .map(|field| {
                if is_missing(field) {
                    None
                } else {
                    Some(Value::Text(field.to_string()))
                }
            })
            .collect();
        row.resize(width, None);
        rows.push(row);
    }

    info!("Loaded {} rows across {} columns", rows.len(), width);
    Ok(Dataset::new(headers, rows))
}

/// Coerce `t_date` to dates and derive `month` / `quarter` when absent.
pub fn prepare(raw: Dataset) -> Dataset {
    prepare_with_report(raw).0
}

pub fn prepare_with_report(mut ds: Dataset) -> (Dataset, PrepareReport) {
    let mut report = PrepareReport {
        rows: ds.len(),
        ..PrepareReport::default()
    };
    let Some(date_idx) = ds.column_index(T_DATE) else {
        debug!("No '{}' column; skipping date derivation", T_DATE);
        return (ds, report);
    };

    let mut dates = Vec::with_capacity(ds.len());
    for row in &mut ds.rows {
        let Some(cell) = row.get_mut(date_idx) else {
            dates.push(None);
            continue;
        };
        let parsed = match cell.take() {
            Some(Value::Date(d)) => Some(d),
            Some(Value::Text(s)) => {
                let d = parse_date_safe(Some(&s));
                if d.is_none() {
                    report.unparsed_dates += 1;
                }
                d
            }
            None => None,
        };
        *cell = parsed.map(Value::Date);
        dates.push(parsed);
    }
    if report.unparsed_dates > 0 {
        warn!(
            "{} '{}' value(s) could not be read as dates and were treated as missing",
            report.unparsed_dates, T_DATE
        );
    }

    if !ds.has_column(MONTH) {
        let months = dates
            .iter()
            .map(|d| d.map(|d| Value::Text(d.format("%B").to_string())))
            .collect();
        ds.push_column(MONTH, months);
        report.derived_month = true;
    }
    if !ds.has_column(QUARTER) {
        let quarters = dates
            .iter()
            .map(|d| d.map(|d| Value::Text(format!("{}Q{}", d.year(), d.month0() / 3 + 1))))
            .collect();
        ds.push_column(QUARTER, quarters);
        report.derived_quarter = true;
    }
    (ds, report)
}
