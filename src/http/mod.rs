//! HTTP receiver for webhook notifications
//!
//! Routes:
//! - POST /webhook - Verify and accept a signed notification
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
