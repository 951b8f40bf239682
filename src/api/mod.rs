//! HTTP API for experiment notes

pub mod extractor;
pub mod handlers;
pub mod note_handlers;
pub mod query;
pub mod routes;

pub use handlers::{ApiState, AppError, ServerState};
pub use query::*;
pub use routes::create_router;
