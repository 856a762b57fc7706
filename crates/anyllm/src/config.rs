use std::fmt;
use std::time::Duration;

use anyllm_common::ConfigError;
use bon::Builder;
use url::Url;

pub const DEFAULT_MODEL: &str = "gpt-4";
pub const DEFAULT_MAX_RETRIES: u32 = 5;
pub const DEFAULT_RETRY_INITIAL_DELAY: Duration = Duration::from_millis(500);
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const MIN_RETRY_INITIAL_DELAY: Duration = Duration::from_millis(100);
const MIN_TIMEOUT: Duration = Duration::from_secs(1);

/// Connection settings for the gateway.
///
/// Validated once by [`crate::GatewayClient::new`] and immutable afterwards;
/// a client never exists with an invalid configuration.
#[derive(Clone, Builder)]
pub struct GatewayConfig {
    /// Absolute base URL of the gateway (e.g. `https://llm.example.com`)
    #[builder(into)]
    pub base_url: String,

    /// API credential sent as a bearer token
    #[builder(into)]
    pub api_key: String,

    /// Workspace the conversation belongs to
    #[builder(into)]
    pub workspace_slug: String,

    /// Model used when a request does not override it
    #[builder(default = DEFAULT_MODEL.to_string(), into)]
    pub model_slug: String,

    /// Total attempt budget per `chat()` call (the first attempt counts)
    #[builder(default = DEFAULT_MAX_RETRIES)]
    pub max_retries: u32,

    /// Backoff delay before the first retry; doubles per attempt
    #[builder(default = DEFAULT_RETRY_INITIAL_DELAY)]
    pub retry_initial_delay: Duration,

    /// Hard deadline for one attempt (connection establishment, for streams)
    #[builder(default = DEFAULT_TIMEOUT)]
    pub timeout: Duration,
}

impl GatewayConfig {
    /// Check every field against its contract. No network access.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::MissingBaseUrl);
        }
        let parsed =
            Url::parse(&self.base_url).map_err(|e| ConfigError::InvalidBaseUrl(e.to_string()))?;
        if parsed.host_str().is_none() {
            return Err(ConfigError::InvalidBaseUrl("missing host".to_string()));
        }

        if self.api_key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey);
        }
        if self.workspace_slug.trim().is_empty() {
            return Err(ConfigError::MissingWorkspace);
        }
        if self.model_slug.trim().is_empty() {
            return Err(ConfigError::EmptyModel);
        }

        if self.max_retries < 1 {
            return Err(ConfigError::InvalidMaxRetries);
        }
        if self.retry_initial_delay < MIN_RETRY_INITIAL_DELAY {
            return Err(ConfigError::InvalidRetryDelay);
        }
        if self.timeout < MIN_TIMEOUT {
            return Err(ConfigError::InvalidTimeout);
        }

        Ok(())
    }

    /// Load a validated configuration from the environment.
    ///
    /// Required: `ANYTHINGLLM_BASE_URL`, `ANYTHINGLLM_API_KEY`,
    /// `ANYTHINGLLM_WORKSPACE_SLUG`. Optional, falling back to their defaults
    /// when absent or unparseable: `ANYTHINGLLM_MODEL_SLUG`,
    /// `ANYTHINGLLM_MAX_RETRIES`, `ANYTHINGLLM_RETRY_INITIAL_DELAY_MS`,
    /// `ANYTHINGLLM_REQUEST_TIMEOUT_MS`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Self {
            base_url: env_string("ANYTHINGLLM_BASE_URL"),
            api_key: env_string("ANYTHINGLLM_API_KEY"),
            workspace_slug: env_string("ANYTHINGLLM_WORKSPACE_SLUG"),
            model_slug: {
                let model = env_string("ANYTHINGLLM_MODEL_SLUG");
                if model.is_empty() {
                    DEFAULT_MODEL.to_string()
                } else {
                    model
                }
            },
            max_retries: env_u32("ANYTHINGLLM_MAX_RETRIES", DEFAULT_MAX_RETRIES),
            retry_initial_delay: env_duration_ms(
                "ANYTHINGLLM_RETRY_INITIAL_DELAY_MS",
                DEFAULT_RETRY_INITIAL_DELAY,
            ),
            timeout: env_duration_ms("ANYTHINGLLM_REQUEST_TIMEOUT_MS", DEFAULT_TIMEOUT),
        };

        config.validate()?;
        Ok(config)
    }
}

// Credential must not leak through debug output.
impl fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("workspace_slug", &self.workspace_slug)
            .field("model_slug", &self.model_slug)
            .field("max_retries", &self.max_retries)
            .field("retry_initial_delay", &self.retry_initial_delay)
            .field("timeout", &self.timeout)
            .finish()
    }
}

fn env_string(name: &str) -> String {
    std::env::var(name).unwrap_or_default()
}

fn env_u32(name: &str, default: u32) -> u32 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<u32>().ok())
        .unwrap_or(default)
}

fn env_duration_ms(name: &str, default: Duration) -> Duration {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(default)
}
