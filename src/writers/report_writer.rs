use crate::error::{ProcessingError, Result};
use crate::models::StationSummary;
use crate::utils::constants::{FORMAT_CSV, FORMAT_JSON, FORMAT_TEXT};
use crate::utils::filename::generate_default_report_filename;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    /// `{Paris=5.0/5.0/5.0, Tokyo=10.0/15.0/20.0}`
    Text,
    Json,
    Csv,
}

impl ReportFormat {
    pub fn from_name(name: &str) -> Result<Self> {
        match name.to_lowercase().as_str() {
            FORMAT_TEXT | "txt" => Ok(ReportFormat::Text),
            FORMAT_JSON => Ok(ReportFormat::Json),
            FORMAT_CSV => Ok(ReportFormat::Csv),
            _ => Err(ProcessingError::Config(format!(
                "Unsupported report format: {}",
                name
            ))),
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ReportFormat::Text => "txt",
            ReportFormat::Json => FORMAT_JSON,
            ReportFormat::Csv => FORMAT_CSV,
        }
    }
}

#[derive(Serialize)]
struct CsvRow<'a> {
    station: &'a str,
    min: f32,
    mean: f32,
    max: f32,
    count: u64,
}

pub struct ReportWriter {
    format: ReportFormat,
}

impl ReportWriter {
    pub fn new() -> Self {
        Self {
            format: ReportFormat::Text,
        }
    }

    pub fn with_format(mut self, format: &str) -> Result<Self> {
        self.format = ReportFormat::from_name(format)?;
        Ok(self)
    }

    /// Write station statistics, sorted by station name
    pub fn write_report<W: Write>(
        &self,
        stations: &BTreeMap<String, StationSummary>,
        mut writer: W,
    ) -> Result<()> {
        match self.format {
            ReportFormat::Text => {
                write!(writer, "{{")?;
                for (i, (station, summary)) in stations.iter().enumerate() {
                    if i > 0 {
                        write!(writer, ", ")?;
                    }
                    write!(writer, "{}={}", station, summary)?;
                }
                writeln!(writer, "}}")?;
            }
            ReportFormat::Json => {
                serde_json::to_writer_pretty(&mut writer, stations)?;
                writeln!(writer)?;
            }
            ReportFormat::Csv => {
                let mut csv_writer = csv::Writer::from_writer(&mut writer);
                for (station, summary) in stations {
                    csv_writer.serialize(CsvRow {
                        station,
                        min: summary.min,
                        mean: summary.mean,
                        max: summary.max,
                        count: summary.count,
                    })?;
                }
                csv_writer.flush()?;
            }
        }

        writer.flush()?;
        Ok(())
    }

    /// Write to `path`, or to a dated file inside it when `path` is a
    /// directory. Returns the file actually written.
    pub fn write_to_path(
        &self,
        stations: &BTreeMap<String, StationSummary>,
        path: &Path,
    ) -> Result<PathBuf> {
        let target = if path.is_dir() {
            generate_default_report_filename(path, self.format.extension())
        } else {
            path.to_path_buf()
        };

        if let Some(parent) = target.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let file = File::create(&target)?;
        self.write_report(stations, BufWriter::new(file))?;

        Ok(target)
    }

    pub fn render(&self, stations: &BTreeMap<String, StationSummary>) -> Result<String> {
        let mut buffer = Vec::new();
        self.write_report(stations, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

impl Default for ReportWriter {
    fn default() -> Self {
        Self::new()
    }
}
