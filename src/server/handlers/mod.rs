//! HTTP handlers for the server.

pub mod documents;
pub mod health;
pub mod templates;
