use std::sync::Arc;

use workbench_core::{Dimension, DimensionCatalog, DimensionId, JobKind, ValidationError};
use workbench_logging::bench_info;

use crate::backend::{Backend, BackendRequest};
use crate::wire::{AddDimensionRequest, DimensionsBody};
use crate::{BackendError, DimensionError, FailureKind};

/// The cleaning and labeling dimensions stored on the backend.
pub struct DimensionService {
    backend: Arc<dyn Backend>,
}

impl DimensionService {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }

    pub async fn load(&self) -> Result<DimensionCatalog, DimensionError> {
        let value = self
            .backend
            .send(BackendRequest::get("api/dimensions/"))
            .await?
            .into_json()?;
        let body: DimensionsBody = serde_json::from_value(value).map_err(decode_error)?;
        let mut catalog = DimensionCatalog::from(body);
        catalog.cleaning.sort_by_key(|d| d.order);
        catalog.labeling.sort_by_key(|d| d.order);
        Ok(catalog)
    }

    pub async fn add(
        &self,
        kind: JobKind,
        name: &str,
        description: &str,
    ) -> Result<Dimension, DimensionError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyDimensionName.into());
        }
        let request = AddDimensionRequest {
            kind: kind.as_str(),
            name,
            description: description.trim(),
        };
        let body = serde_json::to_value(request).map_err(decode_error)?;
        let value = self
            .backend
            .send(BackendRequest::post_json("api/dimensions/add/", body))
            .await?
            .into_json()?;
        let dimension: Dimension = serde_json::from_value(value).map_err(decode_error)?;
        bench_info!("added {kind} dimension {} ({})", dimension.id, dimension.name);
        Ok(dimension)
    }

    /// Deletes a user-defined dimension. Default dimensions are refused
    /// without asking the backend.
    pub async fn delete(
        &self,
        catalog: &DimensionCatalog,
        kind: JobKind,
        id: DimensionId,
    ) -> Result<(), DimensionError> {
        if catalog.find(kind, id).is_some_and(|d| d.is_default) {
            return Err(ValidationError::DefaultDimension { id }.into());
        }
        self.backend
            .send(BackendRequest::delete(format!("api/dimensions/{id}/delete/")))
            .await?
            .into_json()?;
        bench_info!("deleted {kind} dimension {id}");
        Ok(())
    }
}

fn decode_error(err: serde_json::Error) -> DimensionError {
    BackendError::new(FailureKind::Decode, err.to_string()).into()
}
