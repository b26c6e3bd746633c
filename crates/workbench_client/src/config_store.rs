use std::sync::Arc;

use tokio::sync::watch;
use workbench_core::{ServiceConfig, ServiceConfigWire};
use workbench_logging::{bench_info, bench_warn, redact};

use crate::backend::{Backend, BackendRequest};
use crate::{BackendError, ConfigError, FailureKind};

/// Remote AI service configuration. Saving a configuration announces the
/// new service to every subscriber.
pub struct ConfigStore {
    backend: Arc<dyn Backend>,
    changes: watch::Sender<Option<String>>,
}

impl ConfigStore {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        let (changes, _) = watch::channel(None);
        Self { backend, changes }
    }

    /// Never fails: a missing or unreadable configuration yields
    /// [`ServiceConfig::default`].
    pub async fn load(&self) -> ServiceConfig {
        match self.fetch().await {
            Ok(config) => config,
            Err(err) if err.kind == FailureKind::HttpStatus(404) => {
                bench_info!("no service configuration stored yet, using defaults");
                ServiceConfig::default()
            }
            Err(err) => {
                bench_warn!("loading service configuration failed ({err}), using defaults");
                ServiceConfig::default()
            }
        }
    }

    pub async fn save(&self, config: &ServiceConfig) -> Result<(), ConfigError> {
        config.validate()?;
        let body = serde_json::to_value(config.to_wire())
            .map_err(|err| BackendError::new(FailureKind::Decode, err.to_string()))?;
        self.backend
            .send(BackendRequest::post_json("set-api-config/", body))
            .await?
            .into_json()?;

        let service = config.service_type().to_string();
        bench_info!(
            "saved {service} configuration (key {})",
            redact(&config.api_key)
        );
        self.changes.send_replace(Some(service));
        Ok(())
    }

    /// Receives the service type after every successful save.
    pub fn subscribe(&self) -> watch::Receiver<Option<String>> {
        self.changes.subscribe()
    }

    async fn fetch(&self) -> Result<ServiceConfig, BackendError> {
        let value = self
            .backend
            .send(BackendRequest::get("get-api-config/"))
            .await?
            .into_json()?;
        let wire: ServiceConfigWire = serde_json::from_value(value)
            .map_err(|err| BackendError::new(FailureKind::Decode, err.to_string()))?;
        Ok(ServiceConfig::from_wire(wire))
    }
}
