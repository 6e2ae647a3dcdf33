//! HTTP façade over the MediaWiki history metrics

mod handlers;
mod routes;

pub use handlers::{AppState, CACHE_CONTROL};
pub use routes::create_api_router;
