// src/storage/mod.rs
pub mod csv_exporter;
#[cfg(feature = "export-xlsx")]
pub mod xlsx_exporter;

use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use crate::extractors::RowRecord;
use crate::pipeline::RunReport;
use crate::utils::error::StorageError;

pub const DEFAULT_OUTPUT_DIR: &str = "./saida_petronect";
pub const DEFAULT_EXPORT_PREFIX: &str = "petronect_api610";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%Hh%M";

/// Paths written for one run.
#[derive(Debug, Clone)]
pub struct ExportPaths {
    pub csv: PathBuf,
    pub json: PathBuf,
    pub metadata: PathBuf,
    #[cfg(feature = "export-xlsx")]
    pub xlsx: PathBuf,
}

impl ExportPaths {
    fn all(&self) -> Vec<&PathBuf> {
        let mut paths = vec![&self.csv, &self.json, &self.metadata];
        #[cfg(feature = "export-xlsx")]
        paths.push(&self.xlsx);
        paths
    }
}

pub struct ResultSink {
    base_dir: PathBuf,
    prefix: String,
}

impl ResultSink {
    /// Creates the sink, creating `base_dir` if it doesn't exist yet.
    pub fn new<P: AsRef<Path>>(base_dir: P, prefix: impl Into<String>) -> Result<Self, StorageError> {
        let base_path = base_dir.as_ref().to_path_buf();

        if !base_path.exists() {
            fs::create_dir_all(&base_path).map_err(StorageError::IoError)?;
        }

        Ok(Self { base_dir: base_path, prefix: prefix.into() })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// File stem for a run finished at `at`: `{prefix}_YYYY-MM-DD_HHhMM`.
    pub fn stem_for(&self, at: &DateTime<Local>) -> String {
        format!("{}_{}", self.prefix, at.format(TIMESTAMP_FORMAT))
    }

    /// Writes the CSV, the JSON record dump, the run metadata and (with `export-xlsx`)
    /// the spreadsheet. Refuses to overwrite: a second export in the same minute fails
    /// with `FileExists`.
    pub fn save_run(&self, report: &RunReport, at: DateTime<Local>) -> Result<ExportPaths, StorageError> {
        let stem = self.stem_for(&at);
        let paths = ExportPaths {
            csv: self.base_dir.join(format!("{}.csv", stem)),
            json: self.base_dir.join(format!("{}.json", stem)),
            metadata: self.base_dir.join(format!("{}_meta.json", stem)),
            #[cfg(feature = "export-xlsx")]
            xlsx: self.base_dir.join(format!("{}.xlsx", stem)),
        };

        for path in paths.all() {
            if path.exists() {
                return Err(StorageError::FileExists(path.display().to_string()));
            }
        }

        #[cfg(feature = "export-xlsx")]
        let workbook = xlsx_exporter::render_xlsx(report.results.records())?;

        csv_exporter::write_csv(create_new(&paths.csv)?, report.results.records())?;
        tracing::info!("Saved {} rows to {}", report.results.len(), paths.csv.display());

        let records_json = serde_json::to_string_pretty(&report.results)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;
        write_new(&paths.json, records_json.as_bytes())?;
        tracing::info!("Saved records to {}", paths.json.display());

        #[cfg(feature = "export-xlsx")]
        {
            write_new(&paths.xlsx, &workbook)?;
            tracing::info!("Saved spreadsheet to {}", paths.xlsx.display());
        }

        let metadata = serde_json::json!({
            "row_count": report.results.len(),
            "rows_matched": report.rows_matched,
            "pages_read": report.pages_read,
            "stop_reason": report.stop_reason,
            "csv_file": paths.csv.file_name().map(|n| n.to_string_lossy().into_owned()),
            "extraction_timestamp": at.to_rfc3339(),
        });
        let metadata_str = serde_json::to_string_pretty(&metadata)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;
        write_new(&paths.metadata, metadata_str.as_bytes())?;
        tracing::info!("Saved metadata to {}", paths.metadata.display());

        Ok(paths)
    }

    /// The newest CSV export in the output directory, by file name.
    pub fn latest_csv(&self) -> Result<Option<PathBuf>, StorageError> {
        let pattern_start = format!("{}_", self.prefix);
        let mut exports: Vec<PathBuf> = fs::read_dir(&self.base_dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().map_or(false, |ext| ext == "csv"))
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .map_or(false, |n| n.starts_with(&pattern_start))
            })
            .collect();
        exports.sort();
        Ok(exports.pop())
    }

    /// The newest CSV export together with the records it holds.
    pub fn read_latest(&self) -> Result<Option<(PathBuf, Vec<RowRecord>)>, StorageError> {
        match self.latest_csv()? {
            Some(path) => {
                let records = csv_exporter::read_csv(File::open(&path)?)?;
                Ok(Some((path, records)))
            }
            None => Ok(None),
        }
    }
}

fn create_new(path: &Path) -> Result<File, StorageError> {
    OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|e| match e.kind() {
            ErrorKind::AlreadyExists => StorageError::FileExists(path.display().to_string()),
            _ => StorageError::IoError(e),
        })
}

fn write_new(path: &Path, contents: &[u8]) -> Result<(), StorageError> {
    create_new(path)?.write_all(contents)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{ResultSet, StopReason};
    use chrono::TimeZone;
    use tokio_test::assert_err;

    fn temp_dir(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("tender_storage_{}_{}", name, std::process::id()))
    }

    fn report() -> RunReport {
        RunReport {
            results: ResultSet::from_accumulated(vec![RowRecord {
                line: "7001 | Bomba OH2, \"urgente\" | Aberta".to_string(),
                source_page: "https://listing/p1".to_string(),
            }]),
            pages_read: 3,
            rows_matched: 2,
            stop_reason: StopReason::NoAffordance,
        }
    }

    #[test]
    fn stem_encodes_minute_timestamp() {
        let dir = temp_dir("stem");
        let sink = ResultSink::new(&dir, DEFAULT_EXPORT_PREFIX).unwrap();
        let at = Local.with_ymd_and_hms(2025, 3, 9, 14, 5, 59).unwrap();
        assert_eq!(sink.stem_for(&at), "petronect_api610_2025-03-09_14h05");
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn save_run_writes_all_files_and_never_overwrites() {
        let dir = temp_dir("save");
        let sink = ResultSink::new(&dir, DEFAULT_EXPORT_PREFIX).unwrap();
        let at = Local.with_ymd_and_hms(2025, 3, 9, 14, 5, 0).unwrap();

        let paths = sink.save_run(&report(), at).unwrap();
        assert!(paths.csv.exists());
        assert!(paths.json.exists());
        #[cfg(feature = "export-xlsx")]
        assert!(fs::read(&paths.xlsx).unwrap().starts_with(b"PK"));

        let meta: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&paths.metadata).unwrap()).unwrap();
        assert_eq!(meta["row_count"], 1);
        assert_eq!(meta["pages_read"], 3);
        assert_eq!(meta["stop_reason"], "no_affordance");

        let records: Vec<RowRecord> =
            serde_json::from_str(&fs::read_to_string(&paths.json).unwrap()).unwrap();
        assert_eq!(records.as_slice(), report().results.records());

        let (latest, from_csv) = sink.read_latest().unwrap().unwrap();
        assert_eq!(latest, paths.csv);
        assert_eq!(from_csv.as_slice(), report().results.records());

        let err = assert_err!(sink.save_run(&report(), at));
        assert!(matches!(err, StorageError::FileExists(_)));

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn latest_csv_picks_newest_export() {
        let dir = temp_dir("latest");
        let sink = ResultSink::new(&dir, DEFAULT_EXPORT_PREFIX).unwrap();
        assert_eq!(sink.latest_csv().unwrap(), None);

        fs::write(dir.join("petronect_api610_2025-03-09_14h05.csv"), "").unwrap();
        fs::write(dir.join("petronect_api610_2025-03-10_08h00.csv"), "").unwrap();
        fs::write(dir.join("other_2099-01-01_00h00.csv"), "").unwrap();

        let latest = sink.latest_csv().unwrap().unwrap();
        assert!(latest.ends_with("petronect_api610_2025-03-10_08h00.csv"));

        fs::remove_dir_all(&dir).ok();
    }

    #[cfg(feature = "export-xlsx")]
    #[test]
    fn existing_spreadsheet_blocks_the_whole_export() {
        let dir = temp_dir("xlsx_clash");
        let sink = ResultSink::new(&dir, DEFAULT_EXPORT_PREFIX).unwrap();
        let at = Local.with_ymd_and_hms(2025, 3, 9, 14, 5, 0).unwrap();
        fs::write(dir.join("petronect_api610_2025-03-09_14h05.xlsx"), "").unwrap();

        let err = assert_err!(sink.save_run(&report(), at));
        assert!(matches!(err, StorageError::FileExists(_)));
        assert!(!dir.join("petronect_api610_2025-03-09_14h05.csv").exists());

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn header_only_export_reads_back_empty() {
        let dir = temp_dir("empty");
        let sink = ResultSink::new(&dir, DEFAULT_EXPORT_PREFIX).unwrap();
        let at = Local.with_ymd_and_hms(2025, 3, 9, 14, 5, 0).unwrap();
        let empty = RunReport {
            results: ResultSet::from_accumulated(Vec::new()),
            pages_read: 1,
            rows_matched: 0,
            stop_reason: StopReason::Disabled,
        };
        sink.save_run(&empty, at).unwrap();

        let (_, records) = sink.read_latest().unwrap().unwrap();
        assert!(records.is_empty());

        fs::remove_dir_all(&dir).ok();
    }
}
