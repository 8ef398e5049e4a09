//! Platform Crate - Technical Infrastructure
//!
//! This crate provides shared technical foundations for the client:
//! - Cryptographic utilities (secure random, SHA-256, hex encoding)
//! - Client-side fixed-window rate limiting
//! - Best-effort key/value storage surfaces (in-memory, JSON file)
//! - HTML escaping for untrusted text

pub mod crypto;
pub mod html;
pub mod rate_limit;
pub mod storage;
