use crate::constants::{env_vars, environments, http};
use crate::errors::ToolError;
use crate::services::logger::Logger;
use std::fmt;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NableEnvironment {
    Staging,
    Production,
}

impl NableEnvironment {
    /// Unrecognized names fall back to staging; the caller decides whether to
    /// warn about it.
    pub fn resolve(raw: Option<&str>) -> (Self, bool) {
        let normalized = raw
            .map(|v| v.trim().to_lowercase())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| environments::DEFAULT.to_string());
        match normalized.as_str() {
            environments::STAGING => (NableEnvironment::Staging, true),
            environments::PRODUCTION => (NableEnvironment::Production, true),
            _ => (NableEnvironment::Staging, false),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NableEnvironment::Staging => environments::STAGING,
            NableEnvironment::Production => environments::PRODUCTION,
        }
    }

    pub fn default_base_url(self) -> &'static str {
        match self {
            NableEnvironment::Staging => environments::STAGING_BASE_URL,
            NableEnvironment::Production => environments::PRODUCTION_BASE_URL,
        }
    }
}

impl fmt::Display for NableEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Connection settings for one deployment target. Immutable once resolved.
#[derive(Clone, PartialEq, Eq)]
pub struct NableConfig {
    pub environment: NableEnvironment,
    pub base_url: String,
    pub username: String,
    pub password: String,
}

impl fmt::Debug for NableConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NableConfig")
            .field("environment", &self.environment)
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl NableConfig {
    pub fn new(
        environment: NableEnvironment,
        base_url: &str,
        username: &str,
        password: &str,
    ) -> Result<Self, ToolError> {
        Ok(Self {
            environment,
            base_url: normalize_base_url(base_url)?,
            username: username.to_string(),
            password: password.to_string(),
        })
    }

    pub fn from_env(logger: &Logger) -> Result<Self, ToolError> {
        Self::from_lookup(|key| std::env::var(key).ok(), logger)
    }

    /// Resolves the config through `lookup`, preferring environment-scoped
    /// keys (`NABLE_STAGING_USERNAME`) over the generic ones (`NABLE_USERNAME`).
    pub fn from_lookup<F>(lookup: F, logger: &Logger) -> Result<Self, ToolError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw_env = lookup(env_vars::ENVIRONMENT);
        let (environment, recognized) = NableEnvironment::resolve(raw_env.as_deref());
        if !recognized {
            logger.warn(
                "Unknown environment, falling back to staging",
                Some(&serde_json::json!({ "requested": raw_env })),
            );
        }

        let read = |name: &str| -> Option<String> {
            let scoped = format!(
                "{}_{}_{}",
                env_vars::PREFIX,
                environment.as_str().to_uppercase(),
                name
            );
            let generic = format!("{}_{}", env_vars::PREFIX, name);
            lookup(&scoped)
                .or_else(|| lookup(&generic))
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let base_url = read(env_vars::BASE_URL)
            .unwrap_or_else(|| environment.default_base_url().to_string());
        let username = read(env_vars::USERNAME)
            .ok_or_else(|| missing_credential(environment, env_vars::USERNAME))?;
        let password = read(env_vars::PASSWORD)
            .ok_or_else(|| missing_credential(environment, env_vars::PASSWORD))?;

        Self::new(environment, &base_url, &username, &password)
    }
}

fn missing_credential(environment: NableEnvironment, name: &str) -> ToolError {
    ToolError::invalid_params(format!(
        "Missing credential {}_{} for environment {}",
        env_vars::PREFIX,
        name,
        environment
    ))
    .with_hint(format!(
        "Set {}_{}_{} or {}_{}",
        env_vars::PREFIX,
        environment.as_str().to_uppercase(),
        name,
        env_vars::PREFIX,
        name
    ))
}

fn normalize_base_url(raw: &str) -> Result<String, ToolError> {
    let trimmed = raw.trim().trim_end_matches('/');
    let parsed = Url::parse(trimmed).map_err(|err| {
        ToolError::invalid_params(format!("Invalid base_url '{}': {}", trimmed, err))
    })?;
    if !http::ALLOWED_SCHEMES.contains(&parsed.scheme()) {
        return Err(ToolError::invalid_params(format!(
            "base_url must use http or https, got: {}",
            parsed.scheme()
        )));
    }
    Ok(trimmed.to_string())
}
