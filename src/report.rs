//! Run summary table and CSV output.
//!
//! One `FrameRecord` per processed frame, appended in run order and
//! immutable after append. At the end of a run the whole table is written
//! once, plus a second CSV holding only the failed rows. Files are UTF-8
//! with a BOM so spreadsheet tools pick up the encoding.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

use crate::decision::Verdict;

pub const SUMMARY_FILE_NAME: &str = "summary.csv";
pub const FAILED_FILE_NAME: &str = "failed.csv";

const HEADER: &str = "File_name,Scaled,Success,Note,Current_pixel";
const BOM: &str = "\u{feff}";

/// One row of the run summary.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRecord {
    pub file_name: String,
    pub scaled: bool,
    pub success: bool,
    pub note: String,
    pub current_pixels: u64,
}

impl FrameRecord {
    pub fn from_verdict(file_name: &str, verdict: &Verdict) -> Self {
        Self {
            file_name: file_name.to_string(),
            scaled: verdict.scaled,
            success: verdict.accepted,
            note: verdict.note.to_string(),
            current_pixels: verdict.reported_pixels,
        }
    }

    fn to_csv_row(&self) -> String {
        format!(
            "{},{},{},{},{}",
            csv_field(&self.file_name),
            mark(self.scaled),
            mark(self.success),
            csv_field(&self.note),
            self.current_pixels
        )
    }
}

fn mark(flag: bool) -> &'static str {
    if flag {
        "O"
    } else {
        "X"
    }
}

/// Quote a field when it contains CSV metacharacters.
fn csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Accumulating run summary.
#[derive(Debug, Default)]
pub struct SummaryTable {
    rows: Vec<FrameRecord>,
}

impl SummaryTable {
    pub fn new() -> Self {
        Self { rows: Vec::new() }
    }

    pub fn push(&mut self, record: FrameRecord) {
        self.rows.push(record);
    }

    pub fn rows(&self) -> &[FrameRecord] {
        &self.rows
    }

    pub fn accepted_count(&self) -> usize {
        self.rows.iter().filter(|row| row.success).count()
    }

    pub fn rejected_count(&self) -> usize {
        self.rows.len() - self.accepted_count()
    }

    /// Write the whole-run CSV.
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        self.write_rows(path, self.rows.iter())
    }

    /// Write the CSV holding only failed rows.
    pub fn write_failed_csv(&self, path: &Path) -> Result<()> {
        self.write_rows(path, self.rows.iter().filter(|row| !row.success))
    }

    fn write_rows<'a>(
        &self,
        path: &Path,
        rows: impl Iterator<Item = &'a FrameRecord>,
    ) -> Result<()> {
        let mut out = String::new();
        out.push_str(BOM);
        out.push_str(HEADER);
        out.push('\n');
        for row in rows {
            out.push_str(&row.to_csv_row());
            out.push('\n');
        }
        let mut file = std::fs::File::create(path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        file.write_all(out.as_bytes())
            .with_context(|| format!("failed to write {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, success: bool, note: &str) -> FrameRecord {
        FrameRecord {
            file_name: name.to_string(),
            scaled: false,
            success,
            note: note.to_string(),
            current_pixels: 8_300_000,
        }
    }

    #[test]
    fn csv_contains_header_and_rows_in_order() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("summary.csv");

        let mut table = SummaryTable::new();
        table.push(record("a_Full", true, "-"));
        table.push(record("b_Half", false, "Size failed"));
        table.write_csv(&path).expect("write csv");

        let contents = std::fs::read_to_string(&path).expect("read csv");
        let mut lines = contents.lines();
        assert_eq!(lines.next().unwrap(), format!("{}{}", BOM, HEADER));
        assert_eq!(lines.next().unwrap(), "a_Full,X,O,-,8300000");
        assert_eq!(lines.next().unwrap(), "b_Half,X,X,Size failed,8300000");
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn failed_csv_holds_only_rejected_rows() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("failed.csv");

        let mut table = SummaryTable::new();
        table.push(record("a_Full", true, "-"));
        table.push(record("b_Half", false, "class failed"));
        table.push(record("c_Half", false, "Size failed"));
        table.write_failed_csv(&path).expect("write csv");

        let contents = std::fs::read_to_string(&path).expect("read csv");
        assert!(!contents.contains("a_Full"));
        assert!(contents.contains("b_Half"));
        assert!(contents.contains("c_Half"));
        assert_eq!(table.accepted_count(), 1);
        assert_eq!(table.rejected_count(), 2);
    }

    #[test]
    fn fields_with_commas_are_quoted() {
        assert_eq!(csv_field("a,b"), "\"a,b\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(csv_field("plain"), "plain");
    }
}
