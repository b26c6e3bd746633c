use std::path::Path;
use std::sync::Arc;

use workbench_logging::bench_info;

use crate::backend::{Backend, BackendRequest};
use crate::wire::UploadBody;
use crate::UploadError;

/// Sends a text file to the backend, which answers with its decoded content.
pub struct FileUploader {
    backend: Arc<dyn Backend>,
}

impl FileUploader {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }

    pub async fn upload_path(&self, path: &Path) -> Result<String, UploadError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| UploadError::Read {
                path: path.display().to_string(),
                source,
            })?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload.txt".to_string());
        self.upload(&file_name, bytes).await
    }

    pub async fn upload(&self, file_name: &str, bytes: Vec<u8>) -> Result<String, UploadError> {
        let size = bytes.len();
        let request = BackendRequest::Upload {
            path: "upload-file/".to_string(),
            field: "file".to_string(),
            file_name: file_name.to_string(),
            bytes,
        };
        let value = self.backend.send(request).await?.into_json()?;
        let body: UploadBody =
            serde_json::from_value(value).map_err(|_| UploadError::MissingContent)?;
        let content = body.content.ok_or(UploadError::MissingContent)?;
        bench_info!(
            "uploaded {file_name} ({size} bytes, {} characters back)",
            content.chars().count()
        );
        Ok(content)
    }
}
