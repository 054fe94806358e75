//! Content negotiation at dispatch time.
//!
//! [`negotiation_middleware`] resolves the representation once per request
//! and stores it in the request extensions. Handlers take [`MediaType`] as an
//! extractor and answer with [`Negotiated`], which serializes the body in
//! the chosen format.

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{FromRequestParts, State},
    http::{header::CONTENT_TYPE, request::Parts, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::http::response::ApiError;
use crate::observability::metrics;
use crate::policy::{MediaType, NegotiationPolicy};

pub async fn negotiation_middleware(
    State(policy): State<Arc<NegotiationPolicy>>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let media_type = policy.resolve(request.uri());
    request.extensions_mut().insert(media_type);
    next.run(request).await
}

impl<S> FromRequestParts<S> for MediaType
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<MediaType>()
            .copied()
            .unwrap_or(MediaType::Json))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("XML serialization failed: {0}")]
    Xml(String),

    #[error("YAML serialization failed: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Serialize `body` as `media_type`. `root` names the XML document element.
pub fn render<T: Serialize>(media_type: MediaType, root: &str, body: &T) -> Result<String, RenderError> {
    match media_type {
        MediaType::Json => Ok(serde_json::to_string(body)?),
        MediaType::Xml => quick_xml::se::to_string_with_root(root, body)
            .map_err(|e| RenderError::Xml(e.to_string())),
        MediaType::Yaml => Ok(serde_yaml::to_string(body)?),
    }
}

/// A response body written in the negotiated representation.
#[derive(Debug, Clone)]
pub struct Negotiated<T> {
    media_type: MediaType,
    status: StatusCode,
    root: &'static str,
    body: T,
}

impl<T: Serialize> Negotiated<T> {
    pub fn new(media_type: MediaType, body: T) -> Self {
        Self {
            media_type,
            status: StatusCode::OK,
            root: "response",
            body,
        }
    }

    /// XML document element name.
    pub fn root(mut self, root: &'static str) -> Self {
        self.root = root;
        self
    }

    pub fn status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }
}

impl<T: Serialize> IntoResponse for Negotiated<T> {
    fn into_response(self) -> Response {
        match render(self.media_type, self.root, &self.body) {
            Ok(text) => {
                metrics::record_negotiated(self.media_type.short_name());
                (self.status, [(CONTENT_TYPE, self.media_type.mime())], text).into_response()
            }
            Err(e) => ApiError::Internal(e.to_string()).into_response(),
        }
    }
}
