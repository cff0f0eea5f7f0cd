//! Credential resolution for bookclub-server
//!
//! API credentials resolve with ENV → TOML priority. A missing credential is
//! reported as `Error::Config`; the caller decides whether that is fatal.

use bookclub_common::config::TomlConfig;
use bookclub_common::{Error, Result};
use tracing::{info, warn};

pub const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const ENV_NAVER_CLIENT_ID: &str = "NAVER_CLIENT_ID";
pub const ENV_NAVER_CLIENT_SECRET: &str = "NAVER_CLIENT_SECRET";

/// Client id and secret for the book search API
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NaverCredentials {
    pub client_id: String,
    pub client_secret: String,
}

/// Validate API key (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

/// Pick the first valid value from environment then TOML
fn resolve_credential(name: &str, env_var: &str, toml_value: Option<&String>) -> Option<String> {
    let env_value = std::env::var(env_var).ok().filter(|k| is_valid_key(k));
    let toml_value = toml_value.filter(|k| is_valid_key(k)).cloned();

    if env_value.is_some() && toml_value.is_some() {
        warn!(
            "{} found in both environment and TOML config. Using environment (highest priority).",
            name
        );
    }

    if let Some(value) = env_value {
        info!("{} loaded from environment variable", name);
        return Some(value);
    }

    if let Some(value) = toml_value {
        info!("{} loaded from TOML config", name);
        return Some(value);
    }

    None
}

/// Resolve the OpenAI API key
pub fn resolve_openai_api_key(toml_config: &TomlConfig) -> Result<String> {
    resolve_credential(
        "OpenAI API key",
        ENV_OPENAI_API_KEY,
        toml_config.openai.api_key.as_ref(),
    )
    .ok_or_else(|| {
        Error::Config(format!(
            "OpenAI API key not configured. Set {} or [openai] api_key in the TOML config",
            ENV_OPENAI_API_KEY
        ))
    })
}

/// Resolve the Naver client id and secret; both must be present
pub fn resolve_naver_credentials(toml_config: &TomlConfig) -> Result<NaverCredentials> {
    let client_id = resolve_credential(
        "Naver client id",
        ENV_NAVER_CLIENT_ID,
        toml_config.naver.client_id.as_ref(),
    );
    let client_secret = resolve_credential(
        "Naver client secret",
        ENV_NAVER_CLIENT_SECRET,
        toml_config.naver.client_secret.as_ref(),
    );

    match (client_id, client_secret) {
        (Some(client_id), Some(client_secret)) => Ok(NaverCredentials {
            client_id,
            client_secret,
        }),
        _ => Err(Error::Config(format!(
            "Naver credentials not configured. Set {} and {} or [naver] client_id/client_secret in the TOML config",
            ENV_NAVER_CLIENT_ID, ENV_NAVER_CLIENT_SECRET
        ))),
    }
}
