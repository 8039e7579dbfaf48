use crate::utils::constants::REPORT_FILE_PREFIX;
use chrono::{Datelike, Local};
use std::path::{Path, PathBuf};

/// Generate default report filename with format: brc-report-{YYMMDD}.{extension}
pub fn generate_default_report_filename(dir: &Path, extension: &str) -> PathBuf {
    let now = Local::now();
    let year = now.year() % 100; // Get last 2 digits of year
    let month = now.month();
    let day = now.day();

    let filename = format!(
        "{}-{:02}{:02}{:02}.{}",
        REPORT_FILE_PREFIX, year, month, day, extension
    );
    dir.join(filename)
}
