//! Shared application state handed to every handler.

use casewise_ai::AiClient;
use casewise_config::CasewiseConfig;
use casewise_core::requests::Validate;
use casewise_db::service::CasewiseService;
use casewise_schema::SchemaRegistry;
use serde::de::DeserializeOwned;

use crate::error::ApiError;
use crate::http::ApiRequest;

pub struct AppState {
    pub service: CasewiseService,
    pub ai: AiClient,
    pub schemas: SchemaRegistry,
    pub config: CasewiseConfig,
}

impl AppState {
    /// Open the database and build the AI client from `config`.
    ///
    /// # Errors
    ///
    /// Fails if the database cannot be opened or the HTTP client cannot be
    /// built.
    pub async fn init(config: CasewiseConfig) -> anyhow::Result<Self> {
        let service = CasewiseService::open(&config.database).await?;
        Self::with_service(config, service)
    }

    /// Assemble state around an already opened service.
    ///
    /// # Errors
    ///
    /// Fails if the HTTP client cannot be built.
    pub fn with_service(config: CasewiseConfig, service: CasewiseService) -> anyhow::Result<Self> {
        let ai = AiClient::new(&config.ai)?;
        if !ai.is_configured() {
            tracing::warn!("ai.api_key is not set; AI endpoints will answer 503");
        }
        Ok(Self {
            service,
            ai,
            schemas: SchemaRegistry::new(),
            config,
        })
    }

    /// Parse a JSON body: syntax, then the named schema, then [`Validate`].
    ///
    /// # Errors
    ///
    /// Returns 400 at whichever stage rejects the body.
    pub fn parse_body<T>(&self, req: &ApiRequest, schema: &str) -> Result<T, ApiError>
    where
        T: DeserializeOwned + Validate,
    {
        let value = req.json_value()?;
        let parsed: T = self.schemas.parse(schema, value)?;
        parsed.validate()?;
        Ok(parsed)
    }

    #[must_use]
    pub fn limit(&self, requested: Option<u32>) -> u32 {
        self.config.general.effective_limit(requested)
    }

    /// Fail early with 503 when no AI provider is configured.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Unavailable`] without an API key.
    pub fn require_ai(&self) -> Result<(), ApiError> {
        if self.ai.is_configured() {
            Ok(())
        } else {
            Err(casewise_ai::AiError::NotConfigured.into())
        }
    }
}
