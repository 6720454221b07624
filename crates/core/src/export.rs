//! Spreadsheet (CSV) encoding of the bulk dataset
//!
//! Header row holds the column names in dataset order; a null cell is
//! written empty and read back as null.

use crate::bulk::BulkDataset;
use crate::record::DrugRecord;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

/// Error type for dataset export/import
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Write `dataset` as CSV to `writer`.
pub fn write_csv<W: Write>(dataset: &BulkDataset, writer: W) -> Result<(), ExportError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(dataset.columns())?;

    for row in dataset.rows() {
        csv_writer.write_record(
            dataset
                .columns()
                .iter()
                .map(|column| row.get(column).unwrap_or_default()),
        )?;
    }

    csv_writer.flush()?;
    Ok(())
}

/// Read a dataset previously written by [`write_csv`].
pub fn read_csv<R: Read>(reader: R) -> Result<BulkDataset, ExportError> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let headers = csv_reader.headers()?.clone();

    let mut rows = Vec::new();
    for record in csv_reader.records() {
        let record = record?;
        let row: DrugRecord = headers
            .iter()
            .zip(record.iter())
            .map(|(name, value)| {
                let value = (!value.is_empty()).then(|| value.to_string());
                (name, value)
            })
            .collect();
        rows.push(row);
    }

    Ok(BulkDataset::from_rows(rows))
}

/// Path of the partial dump next to `path`:
/// `drug_data_api.csv` becomes `drug_data_api_partial.csv`.
pub fn partial_path(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let file_name = match path.extension() {
        Some(ext) => format!("{stem}_partial.{}", ext.to_string_lossy()),
        None => format!("{stem}_partial"),
    };
    path.with_file_name(file_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_dataset() -> BulkDataset {
        BulkDataset::from_rows(vec![
            DrugRecord::from_iter([
                ("주성분코드", Some("281700ATB".to_string())),
                ("제품명", Some("졸피드정, 10mg".to_string())),
                ("비고", None),
            ]),
            DrugRecord::from_iter([
                ("주성분코드", Some("111111ATB".to_string())),
                ("제품명", Some("아시콘정".to_string())),
            ]),
        ])
    }

    #[test]
    fn test_write_csv_layout() {
        let mut buffer = Vec::new();
        write_csv(&create_test_dataset(), &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "주성분코드,제품명,비고");
        assert_eq!(lines[1], "281700ATB,\"졸피드정, 10mg\",");
        assert_eq!(lines[2], "111111ATB,아시콘정,");
    }

    #[test]
    fn test_read_csv_restores_dataset() {
        let mut buffer = Vec::new();
        write_csv(&create_test_dataset(), &mut buffer).unwrap();

        let dataset = read_csv(buffer.as_slice()).unwrap();

        assert_eq!(dataset.columns(), &["주성분코드", "제품명", "비고"]);
        assert_eq!(dataset.rows()[0].get("제품명"), Some("졸피드정, 10mg"));
        assert_eq!(dataset.rows()[0].get("비고"), None);
        // Missing fields come back as explicit nulls
        assert!(dataset.rows()[1].contains_field("비고"));
    }

    #[test]
    fn test_partial_path() {
        assert_eq!(
            partial_path(Path::new("out/drug_data_api.csv")),
            PathBuf::from("out/drug_data_api_partial.csv")
        );
        assert_eq!(
            partial_path(Path::new("dataset")),
            PathBuf::from("dataset_partial")
        );
    }
}
