// Interactive terminal flow:
// - Option [1] loads and prepares a CSV file, replacing any previous one.
// - Option [2] lists the reports, computes the chosen one and renders it.
// - Option [3] previews the first rows of the prepared data.
// After a report the user can go back to the report list or exit.
use crate::engine::{self, Outcome};
use crate::error::ReportError;
use crate::loader;
use crate::output;
use crate::types::{Dataset, ReportOptions, TOP_N_MAX, TOP_N_MIN};
use crate::util::format_int;
use anyhow::Result;
use log::info;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

const PREVIEW_ROWS: usize = 50;

/// State of one interactive run. The dataset lives until the next load.
pub struct Session<R, W> {
    input: R,
    out: W,
    options: ReportOptions,
    limit: usize,
    dataset: Option<Dataset>,
    source: Option<PathBuf>,
}

impl<R: BufRead, W: Write> Session<R, W> {
    pub fn new(input: R, out: W, options: ReportOptions, limit: usize) -> Self {
        Self {
            input,
            out,
            options,
            limit,
            dataset: None,
            source: None,
        }
    }

    pub fn dataset(&self) -> Option<&Dataset> {
        self.dataset.as_ref()
    }

    /// Read one trimmed line after printing `prompt`; `None` at end of input.
    fn prompt(&mut self, prompt: &str) -> Result<Option<String>> {
        write!(self.out, "{}", prompt)?;
        self.out.flush()?;
        let mut buf = String::new();
        if self.input.read_line(&mut buf)? == 0 {
            return Ok(None);
        }
        Ok(Some(buf.trim().to_string()))
    }

    /// Returns `true` for `Y`, `false` for `N` or end of input.
    fn prompt_back_to_menu(&mut self) -> Result<bool> {
        loop {
            let Some(resp) = self.prompt("Back to Report Selection (Y/N): ")? else {
                return Ok(false);
            };
            match resp.to_uppercase().as_str() {
                "Y" => return Ok(true),
                "N" => return Ok(false),
                _ => writeln!(self.out, "Invalid choice. Please enter Y or N.")?,
            }
        }
    }

    /// Load and prepare `path`. A failed load leaves no dataset behind.
    pub fn load(&mut self, path: &Path) -> Result<()> {
        self.dataset = None;
        self.source = None;
        match loader::load_path(path) {
            Ok(raw) => {
                let (ds, report) = loader::prepare_with_report(raw);
                writeln!(
                    self.out,
                    "File loaded successfully! ({} rows, {} columns)",
                    format_int(ds.len() as u64),
                    ds.headers.len()
                )?;
                if report.unparsed_dates > 0 {
                    writeln!(
                        self.out,
                        "Note: {} t_date value(s) could not be read and were left empty.",
                        format_int(report.unparsed_dates as u64)
                    )?;
                }
                writeln!(self.out)?;
                info!("Session dataset replaced by {:?}", path);
                self.dataset = Some(ds);
                self.source = Some(path.to_path_buf());
            }
            Err(e) => writeln!(self.out, "{}\n", e)?,
        }
        Ok(())
    }

    fn handle_load(&mut self) -> Result<()> {
        let Some(path) = self.prompt("CSV file path: ")? else {
            return Ok(());
        };
        if path.is_empty() {
            writeln!(self.out, "Please enter a file path.\n")?;
            return Ok(());
        }
        self.load(Path::new(&path))
    }

    fn handle_preview(&mut self) -> Result<()> {
        let Some(ds) = &self.dataset else {
            writeln!(self.out, "Please upload a CSV file to continue (option 1).\n")?;
            return Ok(());
        };
        writeln!(self.out, "Data Preview")?;
        if let Some(source) = &self.source {
            writeln!(self.out, "({})", source.display())?;
        }
        writeln!(self.out, "{}\n", output::preview_dataset(ds, PREVIEW_ROWS))?;
        Ok(())
    }

    fn read_top_n(&mut self) -> Result<ReportOptions> {
        loop {
            let prompt = format!("Top N ({}-{}) [{}]: ", TOP_N_MIN, TOP_N_MAX, self.options.top_n);
            let Some(resp) = self.prompt(&prompt)? else {
                return Ok(self.options);
            };
            if resp.is_empty() {
                return Ok(self.options);
            }
            match resp.parse::<usize>().map(|n| self.options.with_top_n(n)) {
                Ok(Ok(opts)) => return Ok(opts),
                Ok(Err(e)) => writeln!(self.out, "{}", e)?,
                Err(_) => writeln!(self.out, "Please enter a whole number.")?,
            }
        }
    }

    /// Show the report list and run one selection. Returns `false` when
    /// the user is done with reports.
    fn handle_generate_report(&mut self) -> Result<bool> {
        if self.dataset.is_none() {
            writeln!(self.out, "Error: No data loaded. Please load a CSV file first (option 1).\n")?;
            return Ok(false);
        }
        writeln!(self.out, "Choose a report to generate:")?;
        for (idx, name) in engine::selection_names().iter().enumerate() {
            writeln!(self.out, "[{}] {}", idx, name)?;
        }
        let Some(choice) = self.prompt("Enter choice: ")? else {
            return Ok(false);
        };
        let names = engine::selection_names();
        let Some(name) = choice.parse::<usize>().ok().and_then(|i| names.get(i).copied()) else {
            writeln!(self.out, "Invalid choice. Please enter 0-{}.\n", names.len() - 1)?;
            return Ok(true);
        };

        let options = match engine::find(name) {
            Some(def) if def.uses_top_n => self.read_top_n()?,
            _ => self.options,
        };
        let Some(ds) = &self.dataset else {
            return Ok(false);
        };
        match engine::compute(ds, name, &options) {
            Ok(Outcome::Idle) => return Ok(false),
            Ok(Outcome::Skipped(missing)) => writeln!(self.out, "{}\n", missing)?,
            Ok(Outcome::Ready(result)) => {
                writeln!(self.out, "\n{}\n", name)?;
                writeln!(self.out, "{}\n", output::render(&result, self.limit))?;
                if let Some(line) = output::headline(&result) {
                    writeln!(self.out, "{}\n", line)?;
                }
            }
            Err(e @ ReportError::UnknownReport(_)) => writeln!(self.out, "{}\n", e)?,
            Err(e) => return Err(e.into()),
        }
        self.prompt_back_to_menu()
    }

    pub fn run(&mut self) -> Result<()> {
        loop {
            writeln!(self.out, "Transaction Data Analysis")?;
            writeln!(self.out, "[1] Load the file")?;
            writeln!(self.out, "[2] Generate Report")?;
            writeln!(self.out, "[3] Preview Data")?;
            writeln!(self.out, "[0] Exit\n")?;
            let Some(choice) = self.prompt("Enter choice: ")? else {
                break;
            };
            match choice.as_str() {
                "1" => self.handle_load()?,
                "2" => {
                    writeln!(self.out)?;
                    while self.handle_generate_report()? {}
                }
                "3" => self.handle_preview()?,
                "0" => break,
                _ => writeln!(self.out, "Invalid choice. Please enter 0-3.\n")?,
            }
        }
        writeln!(self.out, "Exiting the program.")?;
        Ok(())
    }
}
