//! Batch-wide CSV accumulation.
//!
//! Export steps append one patient's rows per run to a shared file; the
//! first writer emits the header.

use std::fs::{self, OpenOptions};
use std::path::Path;

use anyhow::{Context, Result};

/// Appends rows, writing `header` first when the file does not exist yet.
pub fn append_rows(path: &Path, header: &[&str], rows: &[Vec<String>]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create output directory {}", parent.display()))?;
    }
    let new_file = !path.exists();
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open {}", path.display()))?;
    let mut writer = csv::Writer::from_writer(file);
    if new_file {
        writer.write_record(header)?;
    }
    for row in rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Reads a CSV into its header and rows.
pub fn read_rows(path: &Path) -> Result<(Vec<String>, Vec<Vec<String>>)> {
    let mut reader =
        csv::Reader::from_path(path).with_context(|| format!("read {}", path.display()))?;
    let header = reader
        .headers()
        .with_context(|| format!("read header of {}", path.display()))?
        .iter()
        .map(str::to_string)
        .collect();
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.with_context(|| format!("read row of {}", path.display()))?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok((header, rows))
}

/// Index of a named column, case-insensitive.
pub fn column_index(header: &[String], name: &str) -> Option<usize> {
    header
        .iter()
        .position(|column| column.eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_is_written_once() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("out/dvh.csv");
        append_rows(
            &path,
            &["patient", "roi"],
            &[vec!["P1".into(), "PTV".into()]],
        )
        .unwrap();
        append_rows(
            &path,
            &["patient", "roi"],
            &[vec!["P2".into(), "PTV".into()]],
        )
        .unwrap();
        let (header, rows) = read_rows(&path).unwrap();
        assert_eq!(header, vec!["patient", "roi"]);
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn column_lookup_is_case_insensitive() {
        let header = vec!["Patient_ID".to_string(), "Stage".to_string()];
        assert_eq!(column_index(&header, "patient_id"), Some(0));
        assert_eq!(column_index(&header, "missing"), None);
    }
}
