// src/storage/xlsx_exporter.rs
use rust_xlsxwriter::{Format, Workbook, XlsxError};

use crate::extractors::RowRecord;
use crate::utils::error::StorageError;

const SHEET_NAME: &str = "licitacoes";

/// Renders the records as a one-sheet workbook: a bold header row, then one row per record.
pub fn render_xlsx(records: &[RowRecord]) -> Result<Vec<u8>, StorageError> {
    build_workbook(records).map_err(|e| StorageError::SerializationError(format!("XLSX: {}", e)))
}

fn build_workbook(records: &[RowRecord]) -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();

    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME)?;
    sheet.write_string_with_format(0, 0, "line", &header)?;
    sheet.write_string_with_format(0, 1, "source_page", &header)?;
    sheet.set_column_width(0, 120)?;
    sheet.set_column_width(1, 60)?;

    for (index, record) in records.iter().enumerate() {
        let row = index as u32 + 1;
        sheet.write_string(row, 0, &record.line)?;
        sheet.write_string(row, 1, &record.source_page)?;
    }

    workbook.save_to_buffer()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_a_zip_container() {
        let records = vec![RowRecord {
            line: "7001 | Bomba centrífuga API 610 | Aberta".to_string(),
            source_page: "https://listing/p1".to_string(),
        }];
        let bytes = render_xlsx(&records).unwrap();

        // xlsx files are zip archives
        assert!(bytes.starts_with(b"PK"));
    }

    #[test]
    fn empty_result_set_still_renders() {
        assert!(!render_xlsx(&[]).unwrap().is_empty());
    }
}
