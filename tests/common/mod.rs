#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::{tempdir, TempDir};
use txn_report::engine::{self, Outcome};
use txn_report::loader;
use txn_report::types::{Dataset, ReportOptions, ReportResult};

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents.as_bytes())
            .expect("write temp file contents");
        path
    }
}

/// Loads CSV text and runs dataset preparation on it.
pub fn dataset(csv: &str) -> Dataset {
    loader::prepare(loader::load_bytes(csv.as_bytes()).expect("load csv"))
}

/// Computes `name` with default options and unwraps a ready result.
pub fn report(ds: &Dataset, name: &str) -> ReportResult {
    report_with(ds, name, &ReportOptions::default())
}

pub fn report_with(ds: &Dataset, name: &str, opts: &ReportOptions) -> ReportResult {
    match engine::compute(ds, name, opts).expect("known report") {
        Outcome::Ready(result) => result,
        other => panic!("'{name}' did not produce a result: {other:?}"),
    }
}

pub const SAMPLE: &str = "\
cust_id,t_amt,t_date,services,products_used,state,city,t_details
C1,10,2024-01-05,Team Sports,Ball,California,Los Angeles,Credit
C2,20,2024-02-10,Outdoor Recreation,Tent,Texas,Austin,cash
C1,30,2024-01-20,Exercise & Fitness,Treadmill,California,San Diego,CASH
C3,abc,2024-04-01,Team Sports,Bat,Texas,Austin,credit
C2,40,2024-03-15,Outdoor Recreation,Kayak,California,Los Angeles,debit
C4,5,not-a-date,Team Sports,Ball,Nevada,Reno,cash
";
