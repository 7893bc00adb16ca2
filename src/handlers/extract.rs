// Request extraction and cross-origin handling
//
// Browser extensions call the API directly, so every response carries permissive CORS
// headers and OPTIONS pre-flight requests are answered for any path.

use actix_web::{
    error::JsonPayloadError, http::Method, middleware::DefaultHeaders, web, HttpRequest,
    HttpResponse,
};
use log::warn;

use crate::error::HandlerError;
use crate::models::ErrorResponse;

const ALLOWED_METHODS: &str = "GET, POST, OPTIONS";

/// JSON extractor settings: malformed bodies become a structured 400
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err: JsonPayloadError, req: &HttpRequest| {
        warn!("Rejected request body for {}: {}", req.path(), err);
        let message = match &err {
            JsonPayloadError::ContentType => "Content type must be application/json".to_string(),
            JsonPayloadError::Deserialize(e) => format!("Invalid request body: {}", e),
            other => format!("Invalid request body: {}", other),
        };
        HandlerError::invalid_request(message).into()
    })
}

/// Headers added to every response
pub fn cors_headers() -> DefaultHeaders {
    DefaultHeaders::new().add(("Access-Control-Allow-Origin", "*"))
}

/// Default service: answers pre-flight requests, 404 for anything else
pub async fn fallback(req: HttpRequest) -> HttpResponse {
    if req.method() == Method::OPTIONS {
        return HttpResponse::Ok()
            .append_header(("Allow", ALLOWED_METHODS))
            .append_header(("Access-Control-Allow-Methods", ALLOWED_METHODS))
            .append_header(("Access-Control-Allow-Headers", "Content-Type"))
            .append_header(("Access-Control-Max-Age", "86400"))
            .finish();
    }
    HttpResponse::NotFound().json(ErrorResponse::new(format!("No route for {} {}", req.method(), req.path())))
}
