//! HTTP API for the Almanac server.

mod handlers;
mod rest;

pub use handlers::ApiState;
pub use rest::{create_router, RestApiConfig};
