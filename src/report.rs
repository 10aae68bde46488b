use std::path::Path;

use csv::WriterBuilder;
use serde::Serialize;

use crate::domain::SequenceRecord;
use crate::error::KiraError;

pub const COLUMNS: [&str; 3] = ["Accession", "Length", "Description"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableRow {
    #[serde(rename = "Accession")]
    pub accession: String,
    #[serde(rename = "Length")]
    pub length: usize,
    #[serde(rename = "Description")]
    pub description: String,
}

/// Accession/Length/Description rows, in fetch order until sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultTable {
    rows: Vec<TableRow>,
}

impl ResultTable {
    pub fn from_records(records: &[SequenceRecord]) -> Self {
        let rows = records
            .iter()
            .map(|record| TableRow {
                accession: record.accession.clone(),
                length: record.length,
                description: record.description.clone(),
            })
            .collect();
        Self { rows }
    }

    pub fn rows(&self) -> &[TableRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Longest first. Ties keep their current relative order.
    pub fn sort_by_length_desc(&mut self) {
        self.rows.sort_by(|a, b| b.length.cmp(&a.length));
    }

    pub fn write_csv(&self, path: &Path) -> Result<(), KiraError> {
        let mut writer = WriterBuilder::new()
            .has_headers(false)
            .from_path(path)
            .map_err(|err| KiraError::CsvWrite(err.to_string()))?;
        writer
            .write_record(COLUMNS)
            .map_err(|err| KiraError::CsvWrite(err.to_string()))?;
        for row in &self.rows {
            writer
                .serialize(row)
                .map_err(|err| KiraError::CsvWrite(err.to_string()))?;
        }
        writer
            .flush()
            .map_err(|err| KiraError::CsvWrite(err.to_string()))?;
        Ok(())
    }
}

/// Builds the table, writes it to `path` and hands it back for plotting.
pub fn tabulate(records: &[SequenceRecord], path: &Path) -> Result<ResultTable, KiraError> {
    let table = ResultTable::from_records(records);
    table.write_csv(path)?;
    tracing::debug!(rows = table.len(), path = %path.display(), "wrote table");
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(accession: &str, length: usize) -> SequenceRecord {
        SequenceRecord {
            accession: accession.to_string(),
            length,
            description: format!("{accession} description"),
        }
    }

    #[test]
    fn sort_is_descending_and_stable() {
        let mut table = ResultTable::from_records(&[
            record("A.1", 120),
            record("B.1", 180),
            record("C.1", 120),
            record("D.1", 150),
        ]);
        table.sort_by_length_desc();
        let order: Vec<&str> = table.rows().iter().map(|r| r.accession.as_str()).collect();
        assert_eq!(order, vec!["B.1", "D.1", "A.1", "C.1"]);
    }

    #[test]
    fn empty_table_still_has_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.csv");
        let table = tabulate(&[], &path).unwrap();
        assert!(table.is_empty());
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "Accession,Length,Description\n"
        );
    }
}
