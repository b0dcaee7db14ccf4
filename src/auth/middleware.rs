//! Bearer authentication middleware.

use std::sync::Arc;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::http::{HeaderValue, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use futures::future::BoxFuture;
use tower::{Layer, Service};

use super::{AuthContext, Authenticator};

/// Auth middleware layer.
#[derive(Clone)]
pub struct AuthLayer {
    authenticator: Arc<Authenticator>,
}

impl AuthLayer {
    /// Create a new auth layer.
    pub fn new(authenticator: Arc<Authenticator>) -> Self {
        Self { authenticator }
    }
}

impl<S> Layer<S> for AuthLayer {
    type Service = AuthMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthMiddleware {
            inner,
            authenticator: self.authenticator.clone(),
        }
    }
}

/// Auth middleware service.
///
/// Validates the bearer token on every request except the public routes and
/// stores the resulting [`AuthContext`] in request extensions. Verification
/// failure short-circuits with 401 before any handler runs.
#[derive(Clone)]
pub struct AuthMiddleware<S> {
    inner: S,
    authenticator: Arc<Authenticator>,
}

/// Routes reachable without a token.
fn is_public(path: &str) -> bool {
    matches!(path, "/" | "/health") || path.starts_with("/auth/")
}

fn unauthorized() -> Response {
    let body = Json(serde_json::json!({
        "error": "Unauthorized",
        "code": "unauthorized",
    }));
    let mut response = (StatusCode::UNAUTHORIZED, body).into_response();
    response
        .headers_mut()
        .insert("WWW-Authenticate", HeaderValue::from_static("Bearer"));
    response
}

impl<S> Service<Request<Body>> for AuthMiddleware<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<Body>) -> Self::Future {
        if !is_public(req.uri().path()) {
            let token = req
                .headers()
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.strip_prefix("Bearer "));

            let ctx = token.and_then(|t| self.authenticator.validate_token(t.trim()).ok());

            match ctx {
                Some(ctx) => {
                    req.extensions_mut().insert::<AuthContext>(ctx);
                }
                None => {
                    return Box::pin(async move { Ok(unauthorized()) });
                }
            }
        }

        let inner = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, inner);

        Box::pin(async move { inner.call(req).await })
    }
}
