// Caption Summary API HTTP handlers
//
// This module contains the HTTP handlers for the API.
// It provides the interface between HTTP requests and the transcript and summary services.

pub mod extract;
pub mod routes;

#[cfg(test)]
mod tests;

use actix_web::web;

// Re-export handlers for easier access
pub use self::extract::{cors_headers, fallback, json_config};
pub use self::routes::{get_transcript, health, metrics_handler, summarize};

/// Register the JSON extractor settings and the API routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .service(get_transcript)
        .service(summarize)
        .service(health);
}
