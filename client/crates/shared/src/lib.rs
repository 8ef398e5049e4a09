//! Shared Kernel - Domain-crossing minimal core
//!
//! This crate contains the "smallest core" shared by every client crate:
//! - Error classification and the UI-facing error type
//! - The clock abstraction used for every time-based decision
//!
//! **Design Principle**: Only include things that are "hard to change"
//! and have consistent meaning across all domains.

pub mod error {
    pub mod app_error;
    pub mod conversions;
    pub mod kind;
}
pub mod time;
