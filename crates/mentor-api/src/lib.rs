//! HTTP surface for the mentorship relationship service.

pub mod auth;
pub mod server;
