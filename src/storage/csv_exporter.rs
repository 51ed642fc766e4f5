// src/storage/csv_exporter.rs
use std::io::{Read, Write};

use crate::extractors::RowRecord;
use crate::utils::error::StorageError;

const HEADER: [&str; 2] = ["line", "source_page"];

/// Writes `line,source_page` rows. The header is written even when there are no records.
pub fn write_csv<W: Write>(writer: W, records: &[RowRecord]) -> Result<(), StorageError> {
    let mut wtr = csv::WriterBuilder::new().has_headers(false).from_writer(writer);
    wtr.write_record(HEADER).map_err(csv_error)?;
    for record in records {
        wtr.serialize(record).map_err(csv_error)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Reads back an export written by [`write_csv`].
pub fn read_csv<R: Read>(reader: R) -> Result<Vec<RowRecord>, StorageError> {
    csv::Reader::from_reader(reader)
        .deserialize()
        .collect::<Result<Vec<RowRecord>, _>>()
        .map_err(csv_error)
}

fn csv_error(e: csv::Error) -> StorageError {
    StorageError::SerializationError(format!("CSV: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_delimiters_and_quotes() {
        let records = vec![RowRecord {
            line: "7001 | Bomba OH2, \"urgente\" | Aberta".to_string(),
            source_page: "https://listing/p1".to_string(),
        }];
        let mut out = Vec::new();
        write_csv(&mut out, &records).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "line,source_page\n\"7001 | Bomba OH2, \"\"urgente\"\" | Aberta\",https://listing/p1\n"
        );
    }

    #[test]
    fn empty_export_keeps_header_and_reads_back_empty() {
        let mut out = Vec::new();
        write_csv(&mut out, &[]).unwrap();

        assert_eq!(out, b"line,source_page\n");
        assert!(read_csv(out.as_slice()).unwrap().is_empty());
    }
}
