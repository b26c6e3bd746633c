use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, TimeZone};
use serde_json::json;
use workbench_core::{ExportMetadata, ProcessedResult};
use workbench_logging::bench_info;

use crate::backend::{Backend, BackendRequest};
use crate::persist::AtomicFileWriter;
use crate::{BackendError, PersistError};

/// `processed_data_<YYYYMMDDTHHMMSS>.json`
pub fn export_file_name<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!("processed_data_{}.json", at.format("%Y%m%dT%H%M%S"))
}

/// `chat-export-<YYYY-MM-DD>.txt`
pub fn transcript_file_name(day: NaiveDate) -> String {
    format!("chat-export-{}.txt", day.format("%Y-%m-%d"))
}

/// Writes an export blob atomically under `dir` and returns its path.
pub fn save_export<Tz: TimeZone>(
    dir: &Path,
    blob: &[u8],
    at: &DateTime<Tz>,
) -> Result<PathBuf, PersistError>
where
    Tz::Offset: std::fmt::Display,
{
    let writer = AtomicFileWriter::new(dir.to_path_buf());
    let path = writer.write(&export_file_name(at), blob)?;
    bench_info!("export written to {}", path.display());
    Ok(path)
}

/// Server-side export through `/export-processed-data/`.
pub struct ExportClient {
    backend: Arc<dyn Backend>,
}

impl ExportClient {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }

    /// The backend adds its own timestamp; the metadata timestamp is not sent.
    pub async fn export_remote(
        &self,
        result: &ProcessedResult,
        metadata: &ExportMetadata,
    ) -> Result<Vec<u8>, BackendError> {
        let body = json!({
            "process_type": metadata.process_type,
            "dimensions": metadata.dimensions,
            "original_data": metadata.original_data,
            "processed_result": result.to_value(),
        });
        self.backend
            .send(BackendRequest::post_json("export-processed-data/", body))
            .await?
            .into_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn export_names_carry_a_compact_timestamp() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 9, 8, 7).unwrap();
        assert_eq!(export_file_name(&at), "processed_data_20240501T090807.json");
    }

    #[test]
    fn transcript_names_carry_the_day() {
        let day = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
        assert_eq!(transcript_file_name(day), "chat-export-2024-12-31.txt");
    }
}
