//! Security Manager
//!
//! The facade the UI calls before submitting a form or calling the remote
//! service. One instance per process, built by the application entry point and
//! handed to whatever needs it.

use std::collections::HashMap;
use std::sync::Arc;

use kernel::time::{Clock, SystemClock};
use platform::crypto;
use platform::html;
use platform::rate_limit::{ClientRateLimiter, RateLimitResult};
use serde_json::Value;

use crate::error::{SecurityError, SecurityResult};
use crate::policy::{FileCategory, SecurityPolicy, ValidationPattern};

/// Default byte length for [`SecurityManager::generate_secure_random`]
pub const DEFAULT_RANDOM_LENGTH: usize = 32;

const REDACTED: &str = "[REDACTED]";

/// Client security facade
pub struct SecurityManager {
    policy: SecurityPolicy,
    /// One limiter per API-call category, built up front
    limiters: HashMap<String, ClientRateLimiter>,
}

impl SecurityManager {
    pub fn new(policy: SecurityPolicy) -> Self {
        Self::with_clock(policy, Arc::new(SystemClock))
    }

    pub fn with_clock(policy: SecurityPolicy, clock: Arc<dyn Clock>) -> Self {
        let limiters = policy
            .rate_limits
            .iter()
            .map(|(category, limit)| {
                (
                    category.clone(),
                    ClientRateLimiter::with_clock(*limit, Arc::clone(&clock)),
                )
            })
            .collect();

        tracing::info!(
            environment = %policy.environment,
            categories = policy.rate_limits.len(),
            "Security manager initialized"
        );

        Self { policy, limiters }
    }

    pub fn policy(&self) -> &SecurityPolicy {
        &self.policy
    }

    // ========================================================================
    // Rate limiting
    // ========================================================================

    /// Record a request for (`category`, `key`)
    ///
    /// Unknown categories are always allowed.
    pub fn can_make_request(&self, category: &str, key: &str) -> bool {
        match self.limiters.get(category) {
            Some(limiter) => {
                let allowed = limiter.can_make_request(key);
                if !allowed {
                    tracing::debug!(category = %category, "Request denied by client rate limit");
                }
                allowed
            }
            None => {
                tracing::debug!(category = %category, "No rate limit for category, allowing");
                true
            }
        }
    }

    /// Requests left for (`category`, `key`); 0 for unknown categories
    pub fn remaining_requests(&self, category: &str, key: &str) -> u32 {
        self.limiters
            .get(category)
            .map_or(0, |limiter| limiter.remaining_requests(key))
    }

    /// Like [`Self::can_make_request`] but returns a typed error on denial
    pub fn guard_request(&self, category: &str, key: &str) -> SecurityResult<Option<RateLimitResult>> {
        let Some(limiter) = self.limiters.get(category) else {
            return Ok(None);
        };

        let result = limiter.check(key);
        if result.allowed {
            Ok(Some(result))
        } else {
            let err = SecurityError::RateLimited {
                category: category.to_string(),
                reset_at_ms: result.reset_at_ms,
            };
            err.log();
            Err(err)
        }
    }

    /// Evict expired windows from every limiter
    pub fn sweep_expired_windows(&self) -> usize {
        let removed: usize = self.limiters.values().map(|l| l.sweep_expired()).sum();
        if removed > 0 {
            tracing::debug!(removed = removed, "Swept expired rate limit windows");
        }
        removed
    }

    // ========================================================================
    // Validation
    // ========================================================================

    /// Match `input` against a named pattern; unknown names never match
    pub fn validate_input(&self, input: &str, pattern_name: &str) -> bool {
        match pattern_name.parse::<ValidationPattern>() {
            Ok(pattern) => pattern.matches(input),
            Err(err) => {
                err.log();
                false
            }
        }
    }

    pub fn validate(&self, input: &str, pattern: ValidationPattern) -> bool {
        pattern.matches(input)
    }

    /// Check `value` against the field's length limit (in characters)
    pub fn check_field_length(&self, field: &str, value: &str) -> SecurityResult<()> {
        match self.policy.max_field_length(field) {
            Some(max) if value.chars().count() > max => Err(SecurityError::FieldTooLong {
                field: field.to_string(),
                max,
            }),
            _ => Ok(()),
        }
    }

    pub fn validate_field_length(&self, field: &str, value: &str) -> bool {
        self.check_field_length(field, value).is_ok()
    }

    /// Check an upload's MIME type and size against its category
    pub fn validate_file(&self, category: &str, mime: &str, size_bytes: u64) -> SecurityResult<()> {
        let rule = category
            .parse::<FileCategory>()
            .ok()
            .and_then(|c| self.policy.file_rule(c))
            .ok_or_else(|| SecurityError::UnknownFileCategory(category.to_string()))?;

        if !rule.allows_type(mime) {
            return Err(SecurityError::FileTypeNotAllowed {
                category: category.to_string(),
                mime: mime.to_string(),
            });
        }
        if size_bytes > rule.max_bytes {
            return Err(SecurityError::FileTooLarge {
                size: size_bytes,
                max: rule.max_bytes,
            });
        }
        Ok(())
    }

    // ========================================================================
    // Data protection
    // ========================================================================

    pub fn is_sensitive_field(&self, name: &str) -> bool {
        self.policy.is_pii(name)
    }

    pub fn is_excluded_from_logging(&self, name: &str) -> bool {
        self.policy.is_log_excluded(name)
    }

    /// Copy of `value` with every log-excluded key's value replaced, at any depth
    pub fn redact_for_logging(&self, value: &Value) -> Value {
        match value {
            Value::Object(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| {
                        let v = if self.is_excluded_from_logging(k) {
                            Value::String(REDACTED.to_string())
                        } else {
                            self.redact_for_logging(v)
                        };
                        (k.clone(), v)
                    })
                    .collect(),
            ),
            Value::Array(items) => {
                Value::Array(items.iter().map(|v| self.redact_for_logging(v)).collect())
            }
            other => other.clone(),
        }
    }

    pub fn sanitize_html(&self, input: &str) -> String {
        html::escape_html(input)
    }

    /// `length` CSPRNG bytes, hex-encoded
    pub fn generate_secure_random(&self, length: usize) -> String {
        crypto::random_hex(length)
    }

    /// SHA-256 of the UTF-8 bytes of `data`, lowercase hex
    pub async fn hash_sensitive_data(&self, data: &str) -> String {
        crypto::sha256_hex(data.as_bytes())
    }

    // ========================================================================
    // Headers
    // ========================================================================

    /// Security headers, empty when the environment disables them
    pub fn security_headers(&self) -> Vec<(&str, &str)> {
        if !self.policy.flags().security_headers_enabled {
            return Vec::new();
        }
        self.policy
            .security_headers
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect()
    }

    /// CSP header value, `None` when the environment disables CSP
    pub fn content_security_policy(&self) -> Option<String> {
        self.policy
            .flags()
            .csp_enabled
            .then(|| self.policy.content_security_policy())
    }
}

impl std::fmt::Debug for SecurityManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecurityManager")
            .field("environment", &self.policy.environment)
            .field("categories", &self.limiters.len())
            .finish()
    }
}
