//! Domain Layer
//!
//! Session entity, change events, controller state and the auth client seam.

pub mod client;
pub mod entity;
pub mod state;
