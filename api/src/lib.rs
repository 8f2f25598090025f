//! BoardHub HTTP API
//!
//! Exposes the registration and password reset flows over JSON. The binary
//! in `main.rs` wires concrete stores and delivery channels into [`state::AppState`];
//! tests build the same app over in-memory collaborators.

pub mod app;
pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod telemetry;
