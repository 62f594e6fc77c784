pub mod handlers;
pub mod middleware;
pub mod state;

use crate::{
    config::Config,
    error::{GeneratorError, Result},
    logger,
};
use actix_cors::Cors;
use actix_web::{
    body::MessageBody,
    dev::{ServiceFactory, ServiceRequest, ServiceResponse},
    middleware::Logger,
    web, App, HttpServer,
};

pub use middleware::{RequestId, RequestIdMiddleware, REQUEST_ID_HEADER};
pub use state::AppState;

/// Development CORS: any origin, method and header.
fn cors() -> Cors {
    Cors::default()
        .allow_any_origin()
        .allow_any_method()
        .allow_any_header()
        .expose_any_header()
        .max_age(3600)
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(handlers::json_error_handler))
        .route("/", web::get().to(handlers::root))
        .route("/health", web::get().to(handlers::health))
        .route("/generate", web::post().to(handlers::generate));
}

pub fn create_app(
    state: web::Data<AppState>,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .app_data(state)
        .wrap(cors())
        .wrap(RequestIdMiddleware)
        .wrap(Logger::new("%r %s %Dms"))
        .configure(configure)
}

pub async fn run(config: Config) -> Result<()> {
    let address = config.bind_address();
    logger::log_startup_info(handlers::SERVICE_NAME, env!("CARGO_PKG_VERSION"), &address);
    logger::log_config_info(&config);

    let state = web::Data::new(AppState::new(config)?);

    let server = HttpServer::new(move || create_app(state.clone()))
        .bind(&address)
        .map_err(|e| GeneratorError::ConfigError(format!("Failed to bind {}: {}", address, e)))?
        .run();

    log::info!("HTTP server listening on {}", address);
    server
        .await
        .map_err(|e| GeneratorError::InternalError(format!("Server error: {}", e)))?;
    log::info!("HTTP server stopped");
    Ok(())
}
