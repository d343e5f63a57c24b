use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use http::{HeaderMap, HeaderValue, Method, StatusCode, header};
use std::sync::Arc;

/// Fixed cross-origin policy stamped on every response.
#[derive(Debug, Clone)]
pub struct CorsPolicy {
    allow_methods: HeaderValue,
}

impl CorsPolicy {
    /// Falls back to an empty method list if the configured names can't form a header.
    pub fn new(methods: &[String]) -> Self {
        let joined = methods
            .iter()
            .map(|m| m.trim().to_ascii_uppercase())
            .collect::<Vec<_>>()
            .join(", ");
        let allow_methods = HeaderValue::from_str(&joined).unwrap_or_else(|_| {
            tracing::warn!("Ignoring invalid CORS method list: {joined:?}");
            HeaderValue::from_static("")
        });

        Self { allow_methods }
    }

    fn apply(&self, headers: &mut HeaderMap) {
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        );
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            self.allow_methods.clone(),
        );
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static("Content-Type, Authorization"),
        );
    }
}

pub async fn cors(State(policy): State<Arc<CorsPolicy>>, req: Request, next: Next) -> Response {
    let mut response = if req.method() == Method::OPTIONS {
        StatusCode::OK.into_response()
    } else {
        next.run(req).await
    };

    policy.apply(response.headers_mut());
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn methods_are_normalized_into_one_header() {
        let policy = CorsPolicy::new(&["get".into(), " POST".into(), "DELETE".into()]);
        assert_eq!(policy.allow_methods, "GET, POST, DELETE");
    }

    #[test]
    fn apply_sets_the_three_headers() {
        let policy = CorsPolicy::new(&["GET".into()]);
        let mut headers = HeaderMap::new();

        policy.apply(&mut headers);

        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_METHODS], "GET");
        assert_eq!(
            headers[header::ACCESS_CONTROL_ALLOW_HEADERS],
            "Content-Type, Authorization"
        );
    }
}
