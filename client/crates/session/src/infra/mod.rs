//! Infrastructure Layer
//!
//! Change-notification plumbing and best-effort persistence.

pub mod channel;
pub mod store;
