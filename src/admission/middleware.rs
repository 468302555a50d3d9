//! Axum middleware running the admission gate ahead of product routes.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{ConnectInfo, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::admission::{AdmissionGate, Decision, RequestFacts};
use crate::http::response::ApiError;

/// State for the admission middleware.
#[derive(Clone)]
pub struct AdmissionState {
    pub gate: Arc<AdmissionGate>,
    /// Largest body buffered for inspection. Anything bigger cannot be
    /// inspected and is denied.
    pub max_body_size: usize,
}

pub async fn admission_middleware(
    State(state): State<AdmissionState>,
    request: Request,
    next: Next,
) -> Response {
    let policy = state.gate.policy();
    if !policy.enabled() {
        return next.run(request).await;
    }

    let (parts, body) = request.into_parts();

    let body = match axum::body::to_bytes(body, state.max_body_size).await {
        Ok(bytes) => Some(bytes),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to buffer request body for inspection");
            None
        }
    };

    let facts = RequestFacts {
        client_ip: client_ip(&parts, policy.trust_forwarded_for()),
        path: parts.uri.path().to_string(),
        query: parts.uri.query().map(String::from),
        user_agent: header_str(&parts.headers, header::USER_AGENT),
        referer: header_str(&parts.headers, header::REFERER),
        cookie: header_str(&parts.headers, header::COOKIE),
        body,
    };

    match state.gate.evaluate(&facts) {
        Ok(Decision::Allowed) => {
            let body = facts.body.map(Body::from).unwrap_or_else(Body::empty);
            next.run(Request::from_parts(parts, body)).await
        }
        Ok(Decision::Denied { reason, retry_after }) => {
            ApiError::denied(reason, retry_after).into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, path = %facts.path, "Admission gate failed, denying request");
            ApiError::security_system().into_response()
        }
    }
}

/// Characteristic key source: the peer address, or the left-most
/// `X-Forwarded-For` entry when forwarded headers are trusted.
fn client_ip(parts: &Parts, trust_forwarded_for: bool) -> Option<IpAddr> {
    if trust_forwarded_for {
        let forwarded = parts
            .headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .and_then(|ip| ip.trim().parse::<IpAddr>().ok());
        if forwarded.is_some() {
            return forwarded;
        }
    }

    parts
        .extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
}

fn header_str(headers: &HeaderMap, name: header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
}
