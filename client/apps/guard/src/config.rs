//! Environment-driven configuration for the guard binary

use std::env;
use std::path::PathBuf;

use anyhow::Context;
use security::{Environment, SecurityPolicy};
use session::SessionConfig;

pub const DEFAULT_SESSION_STORE_PATH: &str = ".guard/session.json";

#[derive(Debug, Clone)]
pub struct GuardConfig {
    pub environment: Environment,
    pub session_store_path: PathBuf,
    /// Extra origin allowed in CSP `connect-src` (the auth service)
    pub auth_origin: Option<String>,
}

impl GuardConfig {
    /// Read `APP_ENV`, `SESSION_STORE_PATH` and `AUTH_ORIGIN`
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let environment = match lookup("APP_ENV") {
            Some(raw) => raw
                .parse::<Environment>()
                .with_context(|| format!("APP_ENV has an unsupported value: {raw}"))?,
            None => Environment::default(),
        };

        let session_store_path = lookup("SESSION_STORE_PATH")
            .filter(|path| !path.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SESSION_STORE_PATH.to_string())
            .into();

        Ok(Self {
            environment,
            session_store_path,
            auth_origin: lookup("AUTH_ORIGIN").filter(|origin| !origin.trim().is_empty()),
        })
    }

    pub fn security_policy(&self) -> SecurityPolicy {
        let policy = SecurityPolicy::for_environment(self.environment);
        match &self.auth_origin {
            Some(origin) => policy.with_auth_origin(origin.clone()),
            None => policy,
        }
    }

    /// Session timing taken from the security policy
    pub fn session_config(&self, policy: &SecurityPolicy) -> SessionConfig {
        SessionConfig::default().with_refresh_timing(
            policy.session.auto_refresh_threshold,
            policy.session.refresh_interval,
        )
    }
}
