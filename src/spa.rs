//! Frontend bundle serving with client-side routing fallback.

use axum::{
    extract::{Extension, Request},
    response::{IntoResponse, Response},
};
use http::Uri;
use std::{path::PathBuf, sync::Arc};
use tokio::fs;
use tower::ServiceExt;
use tower_http::services::ServeDir;

/// Paths under this prefix never fall back to the entry document.
pub const API_PREFIX: &str = "/api";

#[derive(Debug, Clone)]
pub struct StaticBundle {
    root: PathBuf,
}

impl StaticBundle {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    async fn has_asset(&self, path: &str) -> bool {
        let decoded = urlencoding::decode(path).map(|p| p.into_owned());
        let relative = decoded.as_deref().unwrap_or(path).trim_start_matches('/');
        fs::try_exists(self.root.join(relative))
            .await
            .unwrap_or(false)
    }

    /// Deep links that match no asset are answered with the bundle's index page.
    async fn should_rewrite(&self, path: &str) -> bool {
        path != "/" && !path.starts_with(API_PREFIX) && !self.has_asset(path).await
    }
}

/// The bundle root with the original query string kept.
fn index_uri(uri: &Uri) -> Uri {
    match uri.query() {
        Some(query) => format!("/?{query}")
            .parse()
            .unwrap_or_else(|_| Uri::from_static("/")),
        None => Uri::from_static("/"),
    }
}

pub async fn serve_bundle(
    Extension(bundle): Extension<Arc<StaticBundle>>,
    mut req: Request,
) -> Response {
    if bundle.should_rewrite(req.uri().path()).await {
        tracing::debug!("Rewriting {} to the bundle index", req.uri());
        let index = index_uri(req.uri());
        *req.uri_mut() = index;
    }

    ServeDir::new(&bundle.root).oneshot(req).await.into_response()
}
