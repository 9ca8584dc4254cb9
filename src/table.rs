//! A minimal in-memory row table.
//!
//! This is intentionally not a DataFrame library: the engine only needs
//! column lookup by name and cell access by (row, col). File I/O is a thin
//! `csv` reader/writer on top, in the same spirit as
//! `other_examples/...csv_cluster.rs` reading rows by header lookup rather
//! than pulling in a schema-heavy dependency.

use std::path::Path;

use anyhow::{Context, Result};

#[derive(Clone, Debug, Default)]
pub struct Table {
    header: Vec<String>,
    rows: Vec<Vec<Option<String>>>,
}

impl Table {
    pub fn new(header: Vec<String>, rows: Vec<Vec<Option<String>>>) -> Self {
        Self { header, rows }
    }

    pub fn from_csv_path(path: &Path) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_path(path)
            .with_context(|| format!("open {}", path.display()))?;

        let header: Vec<String> = reader
            .headers()
            .with_context(|| format!("read header of {}", path.display()))?
            .iter()
            .map(|s| s.to_string())
            .collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.with_context(|| format!("read record from {}", path.display()))?;
            let row: Vec<Option<String>> = record
                .iter()
                .map(|cell| {
                    let trimmed = cell.trim();
                    if trimmed.is_empty() {
                        None
                    } else {
                        Some(trimmed.to_string())
                    }
                })
                .collect();
            rows.push(row);
        }

        Ok(Self { header, rows })
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.header.iter().position(|h| h == name)
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&str> {
        self.rows.get(row).and_then(|r| r.get(col)).and_then(|c| c.as_deref())
    }

    /// Extracts the given original row indices into a fresh table with the
    /// same header (used by recon mode to hand one cluster's rows to its own
    /// engine invocation).
    pub fn subset_rows(&self, rows: &[usize]) -> Table {
        let rows = rows.iter().map(|&i| self.rows[i].clone()).collect();
        Table {
            header: self.header.clone(),
            rows,
        }
    }

    /// Returns a copy of this table with an extra column appended.
    pub fn with_column(&self, name: &str, values: Vec<String>) -> Table {
        assert_eq!(values.len(), self.rows.len(), "column length mismatch");
        let mut header = self.header.clone();
        header.push(name.to_string());
        let rows = self
            .rows
            .iter()
            .zip(values)
            .map(|(r, v)| {
                let mut r = r.clone();
                r.push(if v.is_empty() { None } else { Some(v) });
                r
            })
            .collect();
        Table { header, rows }
    }

    pub fn write_csv(&self, path: &Path) -> Result<()> {
        let mut writer =
            csv::Writer::from_path(path).with_context(|| format!("create {}", path.display()))?;
        writer.write_record(&self.header)?;
        for row in &self.rows {
            let record: Vec<&str> = row.iter().map(|c| c.as_deref().unwrap_or("")).collect();
            writer.write_record(&record)?;
        }
        writer.flush()?;
        Ok(())
    }
}
