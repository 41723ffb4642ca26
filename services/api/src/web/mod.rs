pub mod auth;
pub mod extract;
pub mod middleware;
pub mod notify;
pub mod questions;
pub mod rest;
pub mod routes;
pub mod state;

// Re-export the router builder so the binary and the integration tests share it.
pub use middleware::require_auth;
pub use routes::router;
