//! HTTP API: router, server lifecycle, shared state, error surface.

pub mod endpoints;
pub mod error;
pub mod router;
pub mod server;
pub mod types;
