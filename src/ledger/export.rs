//! Spreadsheet export of the ledger
//!
//! Every invocation re-renders the entire ledger into a single-sheet XLSX
//! artifact named after the current date; a same-day artifact is overwritten.

use crate::ledger::records::DownloadRecord;
use crate::utils::BilifetchError;
use chrono::{NaiveDate, Utc};
use rust_xlsxwriter::Workbook;
use std::path::{Path, PathBuf};

const SHEET_NAME: &str = "Download Records";

/// Fixed column order with display widths
const COLUMNS: [(&str, f64); 14] = [
    ("Title", 30.0),
    ("Page URL", 50.0),
    ("Cover URL", 50.0),
    ("Cover Path", 30.0),
    ("Video Files", 50.0),
    ("Project Dir", 20.0),
    ("Cut Dir", 20.0),
    ("Original Dir", 20.0),
    ("Downloaded At", 20.0),
    ("Quality", 15.0),
    ("Owner", 15.0),
    ("Duration (s)", 10.0),
    ("AID", 15.0),
    ("BVID", 15.0),
];

/// One spreadsheet row in column order
fn record_row(record: &DownloadRecord) -> [String; 14] {
    [
        record.title.clone(),
        record.url.clone(),
        record.cover_url.clone(),
        record.cover_path.clone().unwrap_or_default(),
        record.video_files.join("; "),
        record.project_path.clone(),
        record.cut_video_path.clone(),
        record.original_video_path.clone(),
        record.download_time.to_rfc3339(),
        record.quality.clone(),
        record.owner.clone(),
        record.duration.to_string(),
        record.aid.to_string(),
        record.bvid.clone(),
    ]
}

/// Renders the ledger to an XLSX artifact in a target directory
pub struct ExportEmitter {
    dir: PathBuf,
}

impl ExportEmitter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn artifact_name(date: NaiveDate) -> String {
        format!("download_records_{}.xlsx", date.format("%Y-%m-%d"))
    }

    /// Full re-export of `records`; returns the written artifact path
    pub fn emit(&self, records: &[DownloadRecord]) -> Result<PathBuf, BilifetchError> {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.set_name(SHEET_NAME)?;

        for (col, (header, width)) in COLUMNS.iter().enumerate() {
            sheet.set_column_width(col as u16, *width)?;
            sheet.write_string(0, col as u16, *header)?;
        }

        for (i, record) in records.iter().enumerate() {
            let row = (i + 1) as u32;
            for (col, cell) in record_row(record).iter().enumerate() {
                sheet.write_string(row, col as u16, cell.as_str())?;
            }
        }

        std::fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(Self::artifact_name(Utc::now().date_naive()));
        workbook.save(&path)?;
        Ok(path)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}
