//! Local file server: uploads, listing, download and deletion over a single
//! flat directory, next to a frontend bundle with client-side routing fallback.

use axum::{
    Router,
    extract::{DefaultBodyLimit, Extension},
    middleware,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub mod config;
pub mod cors;
pub mod errors;
pub mod routes;
pub mod spa;
pub mod storage;

use config::AppConfig;
use cors::CorsPolicy;
use errors::StartupError;
use spa::StaticBundle;
use storage::{LocalFileStorage, Storage};

pub fn app(storage: Arc<dyn Storage>, config: &AppConfig) -> Router {
    let cors_policy = Arc::new(CorsPolicy::new(&config.cors_allow_methods));
    let bundle = Arc::new(StaticBundle::new(&config.static_dir));

    Router::new()
        .route(
            "/api/upload",
            post(routes::upload).layer(DefaultBodyLimit::max(config.max_upload_bytes)),
        )
        .route("/api/files", get(routes::list_files))
        .route(
            "/api/files/",
            get(routes::missing_name).delete(routes::missing_name),
        )
        .route(
            "/api/files/{*name}",
            get(routes::download).delete(routes::delete_file),
        )
        .route("/api/status", get(routes::status))
        .method_not_allowed_fallback(routes::method_not_allowed)
        .fallback(spa::serve_bundle)
        .layer(Extension(storage))
        .layer(Extension(bundle))
        .layer(middleware::from_fn_with_state(cors_policy, cors::cors))
        .layer(TraceLayer::new_for_http())
}

/// Creates the storage directory, binds the listener and serves until the
/// process is stopped.
pub async fn serve(config: AppConfig) -> Result<(), StartupError> {
    let storage = LocalFileStorage::new(config.storage_path.clone())?;
    tracing::info!("Storing files in {}", storage.path().display());

    let app = app(Arc::new(storage), &config);

    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| StartupError::Bind { addr, source })?;
    tracing::info!("Server running at: http://localhost:{}", config.port);

    axum::serve(listener, app).await?;
    Ok(())
}
