use serde::{Deserialize, Serialize};

use crate::ValidationError;

const OPENAI: &str = "openai";

/// Which AI service the backend should talk to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceKind {
    /// OpenAI-compatible endpoint; the base URL is mandatory when saving.
    OpenAi { base_url: String },
    /// Any other named service (`zhipu`, `deepseek`, ...).
    Other { name: String },
}

impl ServiceKind {
    pub fn service_type(&self) -> &str {
        match self {
            ServiceKind::OpenAi { .. } => OPENAI,
            ServiceKind::Other { name } => name,
        }
    }

    pub fn base_url(&self) -> Option<&str> {
        match self {
            ServiceKind::OpenAi { base_url } => Some(base_url),
            ServiceKind::Other { .. } => None,
        }
    }
}

/// The single AI-service configuration, persisted remotely and overwritten
/// wholesale on save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub service: ServiceKind,
    pub api_key: String,
    pub system_prompt: String,
}

impl Default for ServiceConfig {
    /// What the form shows when nothing has been configured yet.
    fn default() -> Self {
        Self {
            service: ServiceKind::OpenAi {
                base_url: String::new(),
            },
            api_key: String::new(),
            system_prompt: String::new(),
        }
    }
}

impl ServiceConfig {
    pub fn openai(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            service: ServiceKind::OpenAi {
                base_url: base_url.into(),
            },
            api_key: api_key.into(),
            system_prompt: String::new(),
        }
    }

    pub fn other(name: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            service: ServiceKind::Other { name: name.into() },
            api_key: api_key.into(),
            system_prompt: String::new(),
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn service_type(&self) -> &str {
        self.service.service_type()
    }

    /// Checks the fields the backend needs before a save is attempted.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.service_type().trim().is_empty() {
            return Err(ValidationError::MissingServiceType);
        }
        if self.api_key.trim().is_empty() {
            return Err(ValidationError::MissingApiKey);
        }
        if let ServiceKind::OpenAi { base_url } = &self.service {
            if base_url.trim().is_empty() {
                return Err(ValidationError::MissingBaseUrl {
                    service: OPENAI.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Builds the typed config from its JSON form. An empty service type
    /// means "nothing configured" and yields the default.
    pub fn from_wire(wire: ServiceConfigWire) -> Self {
        let service_type = wire.service_type.trim();
        let service = match service_type {
            "" => return Self::default(),
            OPENAI => ServiceKind::OpenAi {
                base_url: wire.base_url.unwrap_or_default().trim().to_string(),
            },
            other => ServiceKind::Other {
                name: other.to_string(),
            },
        };
        Self {
            service,
            api_key: wire.api_key,
            system_prompt: wire.system_prompt,
        }
    }

    pub fn to_wire(&self) -> ServiceConfigWire {
        ServiceConfigWire::from(self)
    }
}

/// JSON shape exchanged with `/get-api-config/` and `/set-api-config/`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ServiceConfigWire {
    #[serde(default)]
    pub service_type: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default)]
    pub system_prompt: String,
}

impl From<&ServiceConfig> for ServiceConfigWire {
    fn from(config: &ServiceConfig) -> Self {
        Self {
            service_type: config.service_type().to_string(),
            api_key: config.api_key.clone(),
            base_url: config
                .service
                .base_url()
                .map(str::trim)
                .filter(|url| !url.is_empty())
                .map(ToOwned::to_owned),
            system_prompt: config.system_prompt.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openai_requires_base_url() {
        let config = ServiceConfig::openai("sk-test", "  ");
        assert_eq!(
            config.validate(),
            Err(ValidationError::MissingBaseUrl {
                service: "openai".to_string()
            })
        );
        assert!(ServiceConfig::openai("sk-test", "https://api.example.com/v1")
            .validate()
            .is_ok());
    }

    #[test]
    fn other_services_need_only_a_key() {
        assert!(ServiceConfig::other("zhipu", "key").validate().is_ok());
        assert_eq!(
            ServiceConfig::other("deepseek", "").validate(),
            Err(ValidationError::MissingApiKey)
        );
        assert_eq!(
            ServiceConfig::other("", "key").validate(),
            Err(ValidationError::MissingServiceType)
        );
    }

    #[test]
    fn wire_round_trip_drops_base_url_for_other_services() {
        let wire = ServiceConfig::other("deepseek", "key").to_wire();
        assert_eq!(wire.base_url, None);
        let json = serde_json::to_value(&wire).unwrap();
        assert!(json.get("base_url").is_none());
    }

    #[test]
    fn empty_service_type_reads_as_default() {
        let config = ServiceConfig::from_wire(ServiceConfigWire::default());
        assert_eq!(config, ServiceConfig::default());
    }
}
