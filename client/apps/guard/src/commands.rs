//! Subcommand implementations
//!
//! Each command renders its result as text so `main` only decides where it
//! goes and which exit code to use.

use std::collections::BTreeMap;
use std::time::Duration;

use kernel::error::app_error::{AppError, AppResult, OptionExt, ResultExt};
use kernel::error::kind::ErrorKind;
use kernel::time::Clock;
use platform::rate_limit::RateLimitPolicy;
use platform::storage::KeyValueStorage;
use security::{SecurityError, SecurityManager, ValidationPattern};
use serde_json::{Value, json};
use session::{Session, SessionConfig};

/// Result of one command: what to print and whether it succeeded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub output: String,
    pub success: bool,
}

impl Report {
    pub fn from_text(output: impl Into<String>) -> Self {
        Self::ok(output)
    }

    pub fn from_json(value: &Value) -> AppResult<Self> {
        Ok(Self::ok(serde_json::to_string_pretty(value)?))
    }

    pub fn from_error(err: AppError, detailed: bool) -> Self {
        Self::failed(err.render(detailed))
    }

    fn ok(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            success: true,
        }
    }

    fn failed(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            success: false,
        }
    }
}

/// Active policy as JSON
pub fn policy(manager: &SecurityManager) -> Value {
    let policy = manager.policy();

    let mut field_limits: Vec<_> = policy.field_limits.iter().collect();
    field_limits.sort();
    let field_limits: serde_json::Map<String, Value> = field_limits
        .into_iter()
        .map(|(field, max)| (field.clone(), json!(max)))
        .collect();

    let headers: serde_json::Map<String, Value> = manager
        .security_headers()
        .into_iter()
        .map(|(name, value)| (name.to_string(), json!(value)))
        .collect();

    json!({
        "environment": policy.environment,
        "flags": policy.flags(),
        "rateLimits": limits_json(&policy.rate_limits),
        "actionLimits": limits_json(&policy.action_limits),
        "fieldLimits": field_limits,
        "patterns": ValidationPattern::ALL.iter().map(|p| p.name()).collect::<Vec<_>>(),
        "securityHeaders": headers,
        "contentSecurityPolicy": manager.content_security_policy(),
    })
}

fn limits_json(limits: &BTreeMap<String, RateLimitPolicy>) -> Value {
    limits
        .iter()
        .map(|(category, limit)| {
            (
                category.clone(),
                json!({ "maxRequests": limit.max_requests, "windowMs": limit.window_ms() }),
            )
        })
        .collect::<serde_json::Map<_, _>>()
        .into()
}

pub fn validate(manager: &SecurityManager, pattern: &str, input: &str) -> Report {
    if pattern.parse::<ValidationPattern>().is_err() {
        return Report::failed(format!("unknown pattern '{pattern}'"));
    }
    if manager.validate_input(input, pattern) {
        Report::ok(format!("valid {pattern}"))
    } else {
        Report::failed(format!("invalid {pattern}"))
    }
}

/// Run `attempts` checks against one limiter and describe each outcome
pub fn limit(
    manager: &SecurityManager,
    category: &str,
    key: &str,
    attempts: u32,
    detailed_errors: bool,
    now_ms: i64,
) -> Report {
    let mut lines = Vec::new();
    let mut denied = false;

    for attempt in 1..=attempts {
        match manager.guard_request(category, key) {
            Ok(Some(result)) => lines.push(format!(
                "#{attempt} allowed, {} remaining",
                result.remaining
            )),
            Ok(None) => {
                lines.push(format!(
                    "#{attempt} allowed, '{category}' is not rate limited"
                ));
            }
            Err(err) => {
                denied = true;
                let resets_in = match &err {
                    SecurityError::RateLimited { reset_at_ms, .. } => {
                        (reset_at_ms - now_ms).max(0)
                    }
                    _ => 0,
                };
                let rendered = AppError::from(err).render(detailed_errors);
                lines.push(format!("#{attempt} denied: {rendered}, resets in {resets_in}ms"));
            }
        }
    }

    let output = lines.join("\n");
    if denied {
        Report::failed(output)
    } else {
        Report::ok(output)
    }
}

/// Describe the persisted session without revealing its tokens
pub fn session(
    storage: &dyn KeyValueStorage,
    config: &SessionConfig,
    clock: &dyn Clock,
    detailed_errors: bool,
) -> Report {
    let session = match load_session(storage, &config.storage_key) {
        Ok(session) => session,
        Err(err) => return Report::from_error(err, detailed_errors),
    };

    let now_ms = clock.now_ms();
    let status = if session.is_expired_at(now_ms) {
        "expired".to_string()
    } else if session.expires_within(now_ms, config.auto_refresh_threshold) {
        "refresh due".to_string()
    } else {
        match session.remaining_ms(now_ms) {
            Some(ms) => format!("valid for {}", humanize(Duration::from_millis(ms as u64))),
            None => "valid, never expires".to_string(),
        }
    };

    let expires = session
        .expires_at
        .map_or_else(|| "never".to_string(), |at| at.to_string());

    let output = [
        format!("subject:    {}", session.subject_id),
        format!("issued at:  {}", session.issued_at),
        format!("expires at: {expires}"),
        format!("status:     {status}"),
    ]
    .join("\n");

    if session.is_expired_at(now_ms) {
        Report::failed(output)
    } else {
        Report::ok(output)
    }
}

/// Strict read of the persisted session; unlike `SessionStore`, failures surface
fn load_session(storage: &dyn KeyValueStorage, key: &str) -> AppResult<Session> {
    let raw = storage
        .get(key)?
        .ok_or_unauthorized(format!("No session stored under '{key}'"))?;
    serde_json::from_str(&raw).map_app_err(ErrorKind::InvalidInput, "Stored session is malformed")
}

fn humanize(duration: Duration) -> String {
    let secs = duration.as_secs();
    match secs {
        0..60 => format!("{secs}s"),
        60..3600 => format!("{}m {}s", secs / 60, secs % 60),
        _ => format!("{}h {}m", secs / 3600, (secs % 3600) / 60),
    }
}
