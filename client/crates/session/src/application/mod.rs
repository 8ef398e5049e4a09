//! Application Layer
//!
//! The session controller and its configuration.

pub mod config;
pub mod controller;

// Re-exports
pub use config::SessionConfig;
pub use controller::SessionController;
