use axum::{
    Json,
    extract::Request,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use common::Principal;
use common::token::{decode_api_token, verify_api_secret};
use data::api_token::{ENTITLEMENT_ADMIN, ENTITLEMENT_BUNDLE_PUSH, ENTITLEMENT_BUNDLE_ROLLBACK};
use futures::future::BoxFuture;
use repos::api_token::ApiTokenRepo;
use serde_json::json;
use std::task::{Context, Poll};
use tower::{Layer, Service};
use tracing::{error, info, warn};

use crate::state::AppState;

#[derive(Clone, Copy, Debug)]
pub enum RequiredEntitlement {
    BundlePush,
    BundleRollback,
    Admin,
}

impl RequiredEntitlement {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequiredEntitlement::BundlePush => ENTITLEMENT_BUNDLE_PUSH,
            RequiredEntitlement::BundleRollback => ENTITLEMENT_BUNDLE_ROLLBACK,
            RequiredEntitlement::Admin => ENTITLEMENT_ADMIN,
        }
    }
}

fn extract_api_token<B>(request: &Request<B>) -> Option<String> {
    let auth_value = request.headers().get(header::AUTHORIZATION)?.to_str().ok()?;
    auth_value
        .strip_prefix("Bearer ")
        .map(|token| token.trim().to_string())
}

fn reject(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(json!({
            "result": "failed",
            "error": message
        })),
    )
        .into_response()
}

/// Verifies the bearer token and inserts the caller's [`Principal`] into the
/// request extensions.
#[derive(Clone)]
pub struct ApiTokenLayer {
    app_state: AppState,
    required_entitlement: RequiredEntitlement,
}

impl ApiTokenLayer {
    pub fn new(app_state: AppState, required_entitlement: RequiredEntitlement) -> Self {
        Self {
            app_state,
            required_entitlement,
        }
    }
}

impl<S> Layer<S> for ApiTokenLayer {
    type Service = ApiTokenService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ApiTokenService {
            inner,
            app_state: self.app_state.clone(),
            required_entitlement: self.required_entitlement,
        }
    }
}

#[derive(Clone)]
pub struct ApiTokenService<S> {
    inner: S,
    app_state: AppState,
    required_entitlement: RequiredEntitlement,
}

impl<S, B> Service<Request<B>> for ApiTokenService<S>
where
    S: Service<Request<B>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
    B: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut request: Request<B>) -> Self::Future {
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let required_entitlement = self.required_entitlement;
        let app_state = self.app_state.clone();

        Box::pin(async move {
            let Some(token) = extract_api_token(&request) else {
                return Ok(reject(StatusCode::UNAUTHORIZED, "missing API token"));
            };

            let (token_id, secret) = match decode_api_token(&token) {
                Ok(decoded) => decoded,
                Err(err) => {
                    warn!("Failed to decode API token: {}", err);
                    return Ok(reject(StatusCode::UNAUTHORIZED, "invalid API token"));
                }
            };

            let api_token = match ApiTokenRepo::get_by_token_id(&app_state.repo.pool, token_id).await
            {
                Ok(Some(api_token)) => api_token,
                Ok(None) => return Ok(reject(StatusCode::UNAUTHORIZED, "invalid API token")),
                Err(err) => {
                    error!("Database error when retrieving API token: {}", err);
                    return Ok(reject(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "internal server error",
                    ));
                }
            };

            if !verify_api_secret(&secret, &api_token.token_hash) {
                return Ok(reject(StatusCode::UNAUTHORIZED, "invalid API token"));
            }

            if !api_token.is_valid() {
                return Ok(reject(
                    StatusCode::UNAUTHORIZED,
                    "API token is expired or inactive",
                ));
            }

            if !api_token.has_entitlement(required_entitlement.as_str()) {
                return Ok(reject(StatusCode::FORBIDDEN, "insufficient permissions"));
            }

            if let Err(err) = ApiTokenRepo::update_last_used(&app_state.repo.pool, api_token.id).await
            {
                error!("Failed to update last_used_at: {}", err);
            }

            info!(
                token_id = %api_token.id,
                entitlement = required_entitlement.as_str(),
                "API token validated"
            );

            request.extensions_mut().insert(Principal::new(
                api_token.id,
                api_token.description,
                api_token.app_id,
            ));
            inner.call(request).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn request_with(header_value: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri("/");
        if let Some(value) = header_value {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(
            extract_api_token(&request_with(Some("Bearer abc"))),
            Some("abc".to_string())
        );
        assert_eq!(extract_api_token(&request_with(Some("Basic abc"))), None);
        assert_eq!(extract_api_token(&request_with(None)), None);
    }

    #[test]
    fn test_entitlement_names() {
        assert_eq!(RequiredEntitlement::BundlePush.as_str(), "bundle-push");
        assert_eq!(RequiredEntitlement::BundleRollback.as_str(), "bundle-rollback");
        assert_eq!(RequiredEntitlement::Admin.as_str(), "admin");
    }
}
