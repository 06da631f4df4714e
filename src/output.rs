use crate::error::Result;
use crate::types::{Dataset, Metric, MetricRow, ReportResult, Unit};
use crate::util::format_number;
use serde::Serialize;
use std::path::Path;
use tabled::{builder::Builder, settings::Style, Table};

/// Header row plus display rows for any result shape.
pub fn tabulate(result: &ReportResult) -> (Vec<String>, Vec<Vec<String>>) {
    match result {
        ReportResult::Metric(m) => (
            vec!["Metric".into(), "Value".into()],
            vec![vec![m.label.clone(), m.display_value()]],
        ),
        ReportResult::Metrics(ms) => (
            vec!["Metric".into(), "Value".into()],
            ms.iter().map(|m| vec![m.label.clone(), m.display_value()]).collect(),
        ),
        ReportResult::Ranking(r) => (
            vec![r.key.clone(), r.measure.clone()],
            r.entries
                .iter()
                .map(|e| vec![e.key.clone(), r.unit.format(e.value)])
                .collect(),
        ),
        ReportResult::Breakdown(b) => (
            vec![b.key.clone(), "total".into(), "avg".into()],
            b.entries
                .iter()
                .map(|e| {
                    vec![
                        e.key.clone(),
                        Unit::Currency.format(e.total),
                        e.average.map_or_else(|| "-".to_string(), |a| format_number(a, 2)),
                    ]
                })
                .collect(),
        ),
        ReportResult::Leaders(l) => (
            vec![l.group.clone(), l.item.clone(), "count".into()],
            l.entries
                .iter()
                .map(|e| vec![e.group.clone(), e.item.clone(), e.count.to_string()])
                .collect(),
        ),
        ReportResult::Pivot(p) => {
            let mut headers = vec![format!("{} \\ {}", p.row_key, p.column_key)];
            headers.extend(p.columns.iter().cloned());
            let rows = p
                .rows
                .iter()
                .zip(&p.counts)
                .map(|(key, counts)| {
                    std::iter::once(key.clone())
                        .chain(counts.iter().map(u64::to_string))
                        .collect()
                })
                .collect();
            (headers, rows)
        }
    }
}

/// Markdown rendering of at most `max_rows` rows of a result.
pub fn render(result: &ReportResult, max_rows: usize) -> String {
    let metrics: &[Metric] = match result {
        ReportResult::Metric(m) => std::slice::from_ref(m),
        ReportResult::Metrics(ms) => ms.as_slice(),
        _ => &[],
    };
    if !metrics.is_empty() {
        let rows: Vec<MetricRow> = metrics
            .iter()
            .map(|m| MetricRow {
                label: m.label.clone(),
                value: m.display_value(),
            })
            .collect();
        return Table::new(rows).with(Style::markdown()).to_string();
    }
    let (headers, rows) = tabulate(result);
    if rows.is_empty() {
        return "(no rows)".to_string();
    }
    let mut builder = Builder::default();
    builder.push_record(headers);
    for row in rows.into_iter().take(max_rows) {
        builder.push_record(row);
    }
    builder.build().with(Style::markdown()).to_string()
}

/// Info line announcing the leading entry, for reports that name a winner.
pub fn headline(result: &ReportResult) -> Option<String> {
    let ranking = result.as_ranking()?;
    let label = ranking.headline.as_deref()?;
    ranking.top().map(|top| format!("{}: {}", label, top.key))
}

pub fn preview_dataset(ds: &Dataset, max_rows: usize) -> String {
    if ds.is_empty() {
        return "(no rows)".to_string();
    }
    let mut builder = Builder::default();
    builder.push_record(ds.headers.clone());
    for row in ds.rows.iter().take(max_rows) {
        builder.push_record(
            row.iter()
                .map(|cell| cell.as_ref().map(|v| v.to_string()).unwrap_or_default()),
        );
    }
    builder.build().with(Style::markdown()).to_string()
}

pub fn write_csv(path: impl AsRef<Path>, result: &ReportResult) -> Result<()> {
    let (headers, rows) = tabulate(result);
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(&headers)?;
    for r in rows {
        wtr.write_record(&r)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_json<T: Serialize>(path: impl AsRef<Path>, value: &T) -> Result<()> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    Ok(())
}
