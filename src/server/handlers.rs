use crate::{
    error::GeneratorError,
    models::{ErrorResponse, GenerateResponse, GenerationRequest, HealthResponse, ServiceInfo},
    server::{middleware::RequestId, state::AppState},
};
use actix_web::{error::JsonPayloadError, web, HttpRequest, HttpResponse};
use chrono::Utc;

pub const SERVICE_NAME: &str = "AI Image Generator";

pub async fn root(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(ServiceInfo {
        message: format!("{} API", SERVICE_NAME),
        status: "ready".to_string(),
        service: SERVICE_NAME.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        endpoints: vec![
            "GET /".to_string(),
            "GET /health".to_string(),
            "POST /generate".to_string(),
        ],
        backends: state.generator.backend_names(),
        fallback_format: state.generator.fallback_format().as_str().to_string(),
    })
}

pub async fn health(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
        service: SERVICE_NAME.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.uptime_seconds(),
        timestamp: Utc::now(),
    })
}

pub async fn generate(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Json<GenerationRequest>,
) -> Result<HttpResponse, GeneratorError> {
    let request_id = RequestId::of(&req);
    let GenerationRequest { prompt } = body.into_inner();

    match state.generator.generate(&prompt).await {
        Ok(result) => {
            log::info!(
                "[{}] served {} image from {} in {:.2}s",
                request_id,
                result.format,
                result.source.label(),
                result.elapsed_seconds
            );
            Ok(HttpResponse::Ok().json(GenerateResponse::from(result)))
        }
        Err(e) => {
            match &e {
                GeneratorError::InvalidPrompt(rejection) => {
                    log::info!("[{}] prompt rejected: {}", request_id, rejection)
                }
                other => log::error!("[{}] generation failed: {}", request_id, other),
            }
            Err(e)
        }
    }
}

/// Turns body extraction failures into the usual error envelope.
pub fn json_error_handler(err: JsonPayloadError, req: &HttpRequest) -> actix_web::Error {
    let detail = format!("Invalid request body: {}", err);
    log::info!("[{}] {}", RequestId::of(req), detail);
    actix_web::error::InternalError::from_response(
        err,
        HttpResponse::BadRequest().json(ErrorResponse::new(detail)),
    )
    .into()
}
