mod common;

use common::{dataset, TestWorkspace, SAMPLE};
use txn_report::error::ReportError;
use txn_report::loader::{self, prepare};
use txn_report::types::{MONTH, QUARTER, T_DATE};

#[test]
fn preparation_is_idempotent() {
    let once = dataset(SAMPLE);
    let twice = prepare(once.clone());
    assert_eq!(once, twice);
    assert_eq!(twice.keys(MONTH), once.keys(MONTH));
    assert_eq!(twice.keys(QUARTER), once.keys(QUARTER));
}

#[test]
fn column_and_row_order_preserved() {
    let ds = dataset(SAMPLE);
    assert_eq!(
        ds.headers,
        vec![
            "cust_id",
            "t_amt",
            "t_date",
            "services",
            "products_used",
            "state",
            "city",
            "t_details",
            "month",
            "quarter"
        ]
    );
    let ids: Vec<_> = ds.keys("cust_id").into_iter().flatten().collect();
    assert_eq!(ids, vec!["C1", "C2", "C1", "C3", "C2", "C4"]);
}

#[test]
fn unparsable_dates_become_missing_but_rows_stay() {
    let ds = dataset(SAMPLE);
    assert_eq!(ds.len(), 6);
    assert_eq!(ds.keys(T_DATE)[5], None);
    assert_eq!(ds.keys(MONTH)[5], None);
    assert_eq!(ds.keys(QUARTER)[5], None);
    assert_eq!(ds.keys(T_DATE)[0].as_deref(), Some("2024-01-05"));
}

#[test]
fn caller_supplied_quarter_is_not_recomputed() {
    let ds = dataset("t_date,quarter\n2024-05-01,1999Q4\n");
    assert_eq!(ds.keys(QUARTER), vec![Some("1999Q4".to_string())]);
    assert_eq!(ds.keys(MONTH), vec![Some("May".to_string())]);
}

#[test]
fn loads_from_disk() {
    let ws = TestWorkspace::new();
    let path = ws.write("transactions.csv", SAMPLE);
    let ds = loader::load_path(&path).expect("load");
    assert_eq!(ds.len(), 6);
}

#[test]
fn missing_file_is_a_load_failure() {
    let ws = TestWorkspace::new();
    let err = loader::load_path(ws.path().join("absent.csv")).unwrap_err();
    assert!(matches!(err, ReportError::Io { .. }));
}

#[test]
fn header_only_file_loads_as_zero_rows() {
    let ds = dataset("cust_id,t_amt,t_date\n");
    assert!(ds.is_empty());
    assert!(ds.has_column(MONTH));
    assert!(ds.has_column(QUARTER));
}
