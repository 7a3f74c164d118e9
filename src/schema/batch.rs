//! Batch loading and column-level edits

use crate::error::BadgeError;
use crate::types::Row;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// One problem set's rows together with its column list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    name: String,
    headers: Vec<String>,
    rows: Vec<Row>,
}

impl Batch {
    pub fn new(name: impl Into<String>, headers: Vec<String>, rows: Vec<Row>) -> Self {
        Self {
            name: name.into(),
            headers,
            rows,
        }
    }

    /// Build a batch from literal cells; empty strings and null tokens become missing values
    pub fn from_rows(name: &str, headers: &[&str], cells: Vec<Vec<&str>>) -> Self {
        let headers: Vec<String> = headers.iter().map(|h| h.to_string()).collect();
        let rows = cells
            .into_iter()
            .map(|cells| {
                let record = csv::StringRecord::from(cells);
                Row::from_record(&headers, &record)
            })
            .collect();
        Self::new(name, headers, rows)
    }

    /// Load a CSV file whose first row is the header
    pub fn from_path(path: &Path) -> Result<Self, BadgeError> {
        let file = File::open(path).map_err(|e| BadgeError::io(path, e))?;
        Self::from_reader(file_name(path), file)
    }

    pub fn from_reader<R: Read>(name: impl Into<String>, reader: R) -> Result<Self, BadgeError> {
        let records = read_records(reader)?;
        let mut records = records.into_iter();
        let headers = match records.next() {
            Some(header) => header_cells(&header),
            None => Vec::new(),
        };
        let rows = records.map(|r| Row::from_record(&headers, &r)).collect();
        Ok(Self::new(name, headers, rows))
    }

    /// Load a raw export whose header row sits somewhere in the first
    /// `max_rows` rows; the header is the first row containing `column`
    pub fn probe_path(path: &Path, column: &str, max_rows: usize) -> Result<Self, BadgeError> {
        let file = File::open(path).map_err(|e| BadgeError::io(path, e))?;
        Self::probe_reader(file_name(path), file, column, max_rows)
    }

    pub fn probe_reader<R: Read>(
        name: impl Into<String>,
        reader: R,
        column: &str,
        max_rows: usize,
    ) -> Result<Self, BadgeError> {
        let name = name.into();
        let records = read_records(reader)?;
        let header_idx = records
            .iter()
            .take(max_rows)
            .position(|record| header_cells(record).iter().any(|cell| cell == column))
            .ok_or_else(|| BadgeError::MissingHeader {
                file: name.clone(),
                column: column.to_string(),
                probed: max_rows,
            })?;

        let headers = header_cells(&records[header_idx]);
        let rows = records[header_idx + 1..]
            .iter()
            .map(|r| Row::from_record(&headers, r))
            .collect();
        Ok(Self::new(name, headers, rows))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.headers.iter().any(|h| h == column)
    }

    /// Keep only rows matching the predicate
    pub fn retain_rows<F: FnMut(&Row) -> bool>(&mut self, keep: F) {
        self.rows.retain(keep);
    }

    /// Drop the named columns, ignoring any that are absent
    pub fn drop_columns<S: AsRef<str>>(&mut self, columns: &[S]) {
        let dropped = |h: &str| columns.iter().any(|c| c.as_ref() == h);
        self.headers.retain(|h| !dropped(h.as_str()));
        for row in &mut self.rows {
            for column in columns {
                row.remove(column.as_ref());
            }
        }
    }

    /// Set a column to the same value on every row, appending it if new
    pub fn set_constant_column(&mut self, column: &str, value: &str) {
        if !self.has_column(column) {
            self.headers.push(column.to_string());
        }
        for row in &mut self.rows {
            row.insert(column, Some(value.to_string()));
        }
    }

    /// Rewrite every cell of a column; no-op when the column is absent
    pub fn map_column<F>(&mut self, column: &str, mut map: F)
    where
        F: FnMut(Option<&str>) -> Option<String>,
    {
        if !self.has_column(column) {
            return;
        }
        for row in &mut self.rows {
            let mapped = map(row.get(column));
            row.insert(column, mapped);
        }
    }

    /// Write the batch as CSV with its header row
    pub fn write_csv(&self, path: &Path) -> Result<(), BadgeError> {
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(&self.headers)?;
        for row in &self.rows {
            writer.write_record(self.headers.iter().map(|h| row.get(h).unwrap_or("")))?;
        }
        writer.flush().map_err(|e| BadgeError::io(path, e))?;
        Ok(())
    }
}

fn read_records<R: Read>(reader: R) -> Result<Vec<csv::StringRecord>, BadgeError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);
    let mut records = Vec::new();
    for record in reader.records() {
        records.push(record?);
    }
    Ok(records)
}

fn header_cells(record: &csv::StringRecord) -> Vec<String> {
    record
        .iter()
        .map(|cell| cell.trim_start_matches('\u{feff}').to_string())
        .collect()
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const RAW_EXPORT: &str = "\
Survey export,,
,,
Status,ExternalReference,L1 problem
Response Type,External Data Reference,Pick one
IP Address,S1,a
Survey Preview,S2,
";

    #[test]
    fn test_from_reader_uses_first_row_as_header() {
        let csv = "\u{feff}ExternalReference,L1 problem\nS1,B\nS2,\n";
        let batch = Batch::from_reader("cleaned_#1.csv", csv.as_bytes()).unwrap();

        assert_eq!(batch.headers(), &["ExternalReference", "L1 problem"]);
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.rows()[0].get("L1 problem"), Some("B"));
        assert!(batch.rows()[1].has_field("L1 problem"));
        assert_eq!(batch.rows()[1].get("L1 problem"), None);
    }

    #[test]
    fn test_probe_finds_header_row() {
        let batch = Batch::probe_reader("raw.csv", RAW_EXPORT.as_bytes(), "Status", 10).unwrap();

        assert_eq!(batch.headers(), &["Status", "ExternalReference", "L1 problem"]);
        assert_eq!(batch.len(), 3);
        assert_eq!(batch.rows()[1].get("ExternalReference"), Some("S1"));
    }

    #[test]
    fn test_probe_gives_up_after_max_rows() {
        let err = Batch::probe_reader("raw.csv", RAW_EXPORT.as_bytes(), "Status", 2).unwrap_err();
        assert!(matches!(err, BadgeError::MissingHeader { probed: 2, .. }));
    }

    #[test]
    fn test_column_edits() {
        let mut batch = Batch::from_rows(
            "b",
            &["Status", "IPAddress", "RecordedDate"],
            vec![vec!["IP Address", "1.2.3.4", "2024-07-01 10:00:00"]],
        );

        batch.drop_columns(&["IPAddress", "LocationLatitude"]);
        batch.set_constant_column("Problem Number", "#90");
        batch.map_column("RecordedDate", |v| v.map(|s| s[..10].to_string()));

        assert_eq!(batch.headers(), &["Status", "RecordedDate", "Problem Number"]);
        let row = &batch.rows()[0];
        assert!(!row.has_field("IPAddress"));
        assert_eq!(row.get("Problem Number"), Some("#90"));
        assert_eq!(row.get("RecordedDate"), Some("2024-07-01"));
    }

    #[test]
    fn test_write_then_read_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cleaned_#3.csv");
        let batch = Batch::from_rows(
            "cleaned_#3.csv",
            &["ExternalReference", "Trivia Day"],
            vec![vec!["S1", "just trivia"], vec!["S2", ""]],
        );

        batch.write_csv(&path).unwrap();
        let loaded = Batch::from_path(&path).unwrap();

        assert_eq!(loaded, batch);
    }
}
