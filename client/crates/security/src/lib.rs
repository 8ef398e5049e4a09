//! Security (client-side guards) Module
//!
//! Everything the UI consults before it submits a form or calls the remote
//! service:
//! - `policy` - static security configuration per environment
//! - `manager` - the facade owning one rate limiter per category plus the
//!   validation, sanitization and hashing utilities
//! - `error` - security-specific error variants
//!
//! ## Defaults on missing configuration
//! - Unknown rate-limit category: requests are allowed, remaining is reported as 0
//! - Unknown validation pattern: input is treated as invalid

pub mod error;
pub mod manager;
pub mod policy;

// Re-exports for convenience
pub use error::{SecurityError, SecurityResult};
pub use manager::SecurityManager;
pub use policy::{
    Environment, EnvironmentFlags, FileCategory, FileRule, SecurityPolicy, SessionPolicy,
    ValidationPattern,
};
