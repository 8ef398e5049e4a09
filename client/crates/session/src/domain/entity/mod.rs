//! Domain Entities

pub mod event;
pub mod session;
