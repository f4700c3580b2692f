//! HTTP ingestion surface.

mod server;

pub use server::{router, serve, AppState};
