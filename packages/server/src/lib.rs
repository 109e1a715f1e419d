#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for the Fyn housing dashboard.
//!
//! The server holds no per-client state. Each request carries the client's
//! session snapshot; the response carries the updated snapshot together
//! with the recomputed view. The loaded dataset is shared read-only across
//! workers.

mod handlers;

use std::path::PathBuf;
use std::sync::Arc;

use actix_cors::Cors;
use actix_files::Files;
use actix_web::{App, HttpServer, middleware, web};
use fyn_housing_dashboard::Dashboard;

/// Shared application state.
pub struct AppState {
    /// Dataset, configuration and event dispatch.
    pub dashboard: Arc<Dashboard>,
}

/// Network and static file settings.
#[derive(Debug, Clone)]
pub struct ServerOptions {
    pub bind_addr: String,
    pub port: u16,
    /// Frontend build to serve at `/`, if any.
    pub static_dir: Option<PathBuf>,
}

/// Registers the `/api` routes.
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(handlers::health))
            .route("/views", web::get().to(handlers::views))
            .route("/views/{view}", web::get().to(handlers::initial_view))
            .route("/views/{view}/events", web::post().to(handlers::view_event))
            .route("/zip-areas", web::get().to(handlers::zip_areas))
            .route("/property-types", web::get().to(handlers::property_types)),
    );
}

/// Starts the HTTP server and runs until it is stopped.
///
/// This is a regular async function; the caller provides the runtime
/// (e.g. via `#[actix_web::main]`).
///
/// # Errors
///
/// Returns an `std::io::Result` error if the HTTP server fails to bind or
/// encounters a runtime error.
pub async fn run_server(dashboard: Arc<Dashboard>, options: ServerOptions) -> std::io::Result<()> {
    let state = web::Data::new(AppState { dashboard });
    let static_dir = options.static_dir.clone();

    log::info!("Starting server on {}:{}", options.bind_addr, options.port);
    if let Some(dir) = &static_dir {
        log::info!("Serving frontend from {}", dir.display());
    }

    HttpServer::new(move || {
        let cors = Cors::permissive();

        let app = App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure_api);

        match &static_dir {
            Some(dir) => app.service(Files::new("/", dir).index_file("index.html")),
            None => app,
        }
    })
    .bind((options.bind_addr, options.port))?
    .run()
    .await
}
