//! Security Policy Registry
//!
//! Static security configuration for the client. Pure data plus lookups; the
//! only runtime input is the active [`Environment`].

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;
use std::time::Duration;

use platform::rate_limit::RateLimitPolicy;
use regex::Regex;
use serde::Serialize;

use crate::error::SecurityError;

/// Limit applied to fields without an explicit entry
pub const DEFAULT_FIELD: &str = "text";

const MIB: u64 = 1024 * 1024;

// ============================================================================
// Environment
// ============================================================================

/// Deployment environment the client runs in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

/// Feature toggles selected by the environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EnvironmentFlags {
    pub csp_enabled: bool,
    pub security_headers_enabled: bool,
    pub detailed_errors: bool,
    pub debug_mode: bool,
    pub analytics_enabled: bool,
    pub monitoring_enabled: bool,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }

    pub fn flags(&self) -> EnvironmentFlags {
        match self {
            Environment::Development => EnvironmentFlags {
                csp_enabled: false,
                security_headers_enabled: false,
                detailed_errors: true,
                debug_mode: true,
                analytics_enabled: false,
                monitoring_enabled: false,
            },
            Environment::Staging => EnvironmentFlags {
                csp_enabled: true,
                security_headers_enabled: true,
                detailed_errors: false,
                debug_mode: false,
                analytics_enabled: false,
                monitoring_enabled: false,
            },
            Environment::Production => EnvironmentFlags {
                csp_enabled: true,
                security_headers_enabled: true,
                detailed_errors: false,
                debug_mode: false,
                analytics_enabled: true,
                monitoring_enabled: true,
            },
        }
    }
}

impl FromStr for Environment {
    type Err = SecurityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "staging" => Ok(Environment::Staging),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(SecurityError::UnknownEnvironment(other.to_string())),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Validation patterns
// ============================================================================

/// Named input validation patterns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidationPattern {
    /// http(s) URL made of word characters, dots and dashes
    SafeUrl,
    Email,
    /// RFC 4122 UUID, versions 1-5, any case
    Uuid,
    /// Optional `+`, then up to 15 digits not starting with 0
    Phone,
    PostalCode,
}

static SAFE_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^https?://[-A-Za-z0-9_.]+(?:[:0-9]+)?(?:/[A-Za-z0-9_/.]*(?:\?[A-Za-z0-9_&=%.]*)?(?:#[A-Za-z0-9_]*)?)?$",
    )
    .expect("Safe URL regex is valid")
});
static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("Email regex is valid"));
static UUID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[0-9a-f]{8}-[0-9a-f]{4}-[1-5][0-9a-f]{3}-[89ab][0-9a-f]{3}-[0-9a-f]{12}$")
        .expect("UUID regex is valid")
});
static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[1-9][0-9]{1,14}$").expect("Phone regex is valid"));
static POSTAL_CODE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9\s\-]{3,10}$").expect("Postal code regex is valid")
});

impl ValidationPattern {
    pub const ALL: [ValidationPattern; 5] = [
        ValidationPattern::SafeUrl,
        ValidationPattern::Email,
        ValidationPattern::Uuid,
        ValidationPattern::Phone,
        ValidationPattern::PostalCode,
    ];

    /// Name used by callers that select patterns dynamically
    pub fn name(&self) -> &'static str {
        match self {
            ValidationPattern::SafeUrl => "safe",
            ValidationPattern::Email => "email",
            ValidationPattern::Uuid => "uuid",
            ValidationPattern::Phone => "phone",
            ValidationPattern::PostalCode => "postalCode",
        }
    }

    pub fn regex(&self) -> &'static Regex {
        match self {
            ValidationPattern::SafeUrl => &SAFE_URL_RE,
            ValidationPattern::Email => &EMAIL_RE,
            ValidationPattern::Uuid => &UUID_RE,
            ValidationPattern::Phone => &PHONE_RE,
            ValidationPattern::PostalCode => &POSTAL_CODE_RE,
        }
    }

    pub fn matches(&self, input: &str) -> bool {
        self.regex().is_match(input)
    }
}

impl FromStr for ValidationPattern {
    type Err = SecurityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.name() == s)
            .ok_or_else(|| SecurityError::UnknownPattern(s.to_string()))
    }
}

// ============================================================================
// File uploads
// ============================================================================

/// Upload categories with their own type and size rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileCategory {
    Images,
    Documents,
    Videos,
    Audio,
}

impl FileCategory {
    pub fn name(&self) -> &'static str {
        match self {
            FileCategory::Images => "images",
            FileCategory::Documents => "documents",
            FileCategory::Videos => "videos",
            FileCategory::Audio => "audio",
        }
    }
}

impl FromStr for FileCategory {
    type Err = SecurityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "images" => Ok(FileCategory::Images),
            "documents" => Ok(FileCategory::Documents),
            "videos" => Ok(FileCategory::Videos),
            "audio" => Ok(FileCategory::Audio),
            other => Err(SecurityError::UnknownFileCategory(other.to_string())),
        }
    }
}

/// Allowed MIME types and size cap for one category
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRule {
    pub allowed_types: Vec<String>,
    pub max_bytes: u64,
}

impl FileRule {
    fn new(allowed_types: &[&str], max_bytes: u64) -> Self {
        Self {
            allowed_types: allowed_types.iter().map(|t| t.to_string()).collect(),
            max_bytes,
        }
    }

    pub fn allows_type(&self, mime: &str) -> bool {
        self.allowed_types.iter().any(|t| t.eq_ignore_ascii_case(mime))
    }
}

// ============================================================================
// Session
// ============================================================================

/// Token lifetimes and refresh cadence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionPolicy {
    pub access_token_ttl: Duration,
    pub refresh_token_ttl: Duration,
    pub session_ttl: Duration,
    /// Refresh when the session expires within this margin
    pub auto_refresh_threshold: Duration,
    /// How often the auto-refresh task checks the session
    pub refresh_interval: Duration,
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self {
            access_token_ttl: Duration::from_secs(3600),
            refresh_token_ttl: Duration::from_secs(30 * 24 * 3600),
            session_ttl: Duration::from_secs(24 * 3600),
            auto_refresh_threshold: Duration::from_secs(300),
            refresh_interval: Duration::from_secs(60),
        }
    }
}

// ============================================================================
// Registry
// ============================================================================

/// The complete client security configuration
#[derive(Debug, Clone)]
pub struct SecurityPolicy {
    pub environment: Environment,
    /// API-call category -> policy; only these categories are enforced
    pub rate_limits: BTreeMap<String, RateLimitPolicy>,
    /// User-action category -> policy, published but never enforced
    pub action_limits: BTreeMap<String, RateLimitPolicy>,
    /// Form field -> maximum length in characters
    pub field_limits: HashMap<String, usize>,
    pub file_rules: HashMap<FileCategory, FileRule>,
    pub pii_fields: HashSet<String>,
    /// Fields whose values must never reach a log line
    pub log_excluded_fields: HashSet<String>,
    pub security_headers: Vec<(String, String)>,
    /// CSP directive -> sources, in emission order
    pub csp_directives: Vec<(String, Vec<String>)>,
    pub session: SessionPolicy,
}

impl Default for SecurityPolicy {
    fn default() -> Self {
        Self::for_environment(Environment::default())
    }
}

fn owned_set(items: &[&str]) -> HashSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn category_map(items: &[(&str, RateLimitPolicy)]) -> BTreeMap<String, RateLimitPolicy> {
    items
        .iter()
        .map(|(name, policy)| (name.to_string(), *policy))
        .collect()
}

impl SecurityPolicy {
    pub fn for_environment(environment: Environment) -> Self {
        let rate_limits = category_map(&[
            ("recommendations", RateLimitPolicy::from_millis(10, 60_000)),
            ("assessments", RateLimitPolicy::from_millis(3, 300_000)),
            ("uploads", RateLimitPolicy::from_millis(5, 60_000)),
            ("general", RateLimitPolicy::from_millis(100, 60_000)),
        ]);

        let action_limits = category_map(&[
            ("formSubmissions", RateLimitPolicy::from_millis(5, 60_000)),
            ("searches", RateLimitPolicy::from_millis(20, 60_000)),
            ("enrollments", RateLimitPolicy::from_millis(3, 300_000)),
        ]);

        let field_limits = [
            ("text", 1000),
            ("email", 254),
            ("password", 128),
            ("name", 50),
            ("description", 2000),
            ("bio", 500),
            ("title", 200),
        ]
        .into_iter()
        .map(|(name, max)| (name.to_string(), max))
        .collect();

        let file_rules = HashMap::from([
            (
                FileCategory::Images,
                FileRule::new(&["image/jpeg", "image/png", "image/gif", "image/webp"], 5 * MIB),
            ),
            (
                FileCategory::Documents,
                FileRule::new(&["application/pdf", "text/plain"], 10 * MIB),
            ),
            (
                FileCategory::Videos,
                FileRule::new(&["video/mp4", "video/webm"], 100 * MIB),
            ),
            (
                FileCategory::Audio,
                FileRule::new(&["audio/mp3", "audio/wav", "audio/ogg"], 50 * MIB),
            ),
        ]);

        let security_headers = [
            ("X-Content-Type-Options", "nosniff"),
            ("X-Frame-Options", "DENY"),
            ("X-XSS-Protection", "1; mode=block"),
            ("Referrer-Policy", "strict-origin-when-cross-origin"),
            ("Permissions-Policy", "geolocation=(), microphone=(), camera=()"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let csp_directives = [
            ("default-src", &["'self'"][..]),
            ("script-src", &["'self'", "'unsafe-inline'"][..]),
            ("style-src", &["'self'", "'unsafe-inline'"][..]),
            ("img-src", &["'self'", "data:", "https:"][..]),
            ("font-src", &["'self'"][..]),
            ("connect-src", &["'self'"][..]),
            ("frame-src", &["'none'"][..]),
            ("object-src", &["'none'"][..]),
            ("media-src", &["'self'"][..]),
            ("worker-src", &["'self'"][..]),
        ]
        .into_iter()
        .map(|(name, sources)| {
            (
                name.to_string(),
                sources.iter().map(|s| s.to_string()).collect(),
            )
        })
        .collect();

        Self {
            environment,
            rate_limits,
            action_limits,
            field_limits,
            file_rules,
            pii_fields: owned_set(&[
                "email",
                "firstName",
                "lastName",
                "phone",
                "address",
                "dateOfBirth",
            ]),
            log_excluded_fields: owned_set(&[
                "password",
                "confirmPassword",
                "token",
                "secret",
                "key",
            ]),
            security_headers,
            csp_directives,
            session: SessionPolicy::default(),
        }
    }

    /// Add or replace an enforced rate-limit category
    pub fn with_rate_limit(mut self, category: impl Into<String>, policy: RateLimitPolicy) -> Self {
        self.rate_limits.insert(category.into(), policy);
        self
    }

    /// Allow the remote auth/data service in `connect-src`
    pub fn with_auth_origin(mut self, origin: impl Into<String>) -> Self {
        let origin = origin.into();
        if let Some((_, sources)) = self
            .csp_directives
            .iter_mut()
            .find(|(name, _)| name == "connect-src")
        {
            if !sources.contains(&origin) {
                sources.push(origin);
            }
        }
        self
    }

    pub fn flags(&self) -> EnvironmentFlags {
        self.environment.flags()
    }

    pub fn rate_limit(&self, category: &str) -> Option<RateLimitPolicy> {
        self.rate_limits.get(category).copied()
    }

    pub fn action_limit(&self, category: &str) -> Option<RateLimitPolicy> {
        self.action_limits.get(category).copied()
    }

    /// Max length for `field`, falling back to the generic text limit
    pub fn max_field_length(&self, field: &str) -> Option<usize> {
        self.field_limits
            .get(field)
            .or_else(|| self.field_limits.get(DEFAULT_FIELD))
            .copied()
    }

    pub fn file_rule(&self, category: FileCategory) -> Option<&FileRule> {
        self.file_rules.get(&category)
    }

    pub fn is_pii(&self, field: &str) -> bool {
        self.pii_fields.contains(field)
    }

    pub fn is_log_excluded(&self, field: &str) -> bool {
        self.log_excluded_fields.contains(field)
    }

    /// Render the CSP header value
    pub fn content_security_policy(&self) -> String {
        self.csp_directives
            .iter()
            .map(|(name, sources)| format!("{} {}", name, sources.join(" ")))
            .collect::<Vec<_>>()
            .join("; ")
    }
}
