//! HTTP API for the taste graph

pub mod handlers;
pub mod routes;

pub use handlers::{ApiState, AppError, ServerState};
pub use routes::create_router;
