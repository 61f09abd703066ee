//! Fixed-window rate limiting backed by Redis counters.
//!
//! Two policies share one enforcement path: a general one for the
//! authenticated API and a stricter one for `/auth`. When Redis cannot be
//! reached the request is refused.

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header::RETRY_AFTER, HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::net::SocketAddr;

use crate::api::AppState;
use crate::config::{
    RATE_LIMIT_AUTH_REQUESTS, RATE_LIMIT_AUTH_WINDOW_SECONDS, RATE_LIMIT_REQUESTS,
    RATE_LIMIT_WINDOW_SECONDS,
};

const HEADER_LIMIT: &str = "X-RateLimit-Limit";
const HEADER_REMAINING: &str = "X-RateLimit-Remaining";

/// A named request budget per client and window
#[derive(Debug, Clone, Copy)]
struct RateLimit {
    prefix: &'static str,
    requests: u64,
    window_seconds: u64,
}

const GENERAL: RateLimit = RateLimit {
    prefix: "general",
    requests: RATE_LIMIT_REQUESTS,
    window_seconds: RATE_LIMIT_WINDOW_SECONDS,
};

const AUTH: RateLimit = RateLimit {
    prefix: "auth",
    requests: RATE_LIMIT_AUTH_REQUESTS,
    window_seconds: RATE_LIMIT_AUTH_WINDOW_SECONDS,
};

impl RateLimit {
    fn key(&self, client: &str) -> String {
        format!("{}:{}", self.prefix, client)
    }

    fn rejection(&self) -> RateLimitError {
        RateLimitError {
            retry_after: self.window_seconds,
            limit: self.requests,
        }
    }

    fn annotate(&self, response: &mut Response, used: u64) {
        let headers = response.headers_mut();
        headers.insert(HEADER_LIMIT, HeaderValue::from(self.requests));
        headers.insert(
            HEADER_REMAINING,
            HeaderValue::from(self.requests.saturating_sub(used)),
        );
    }
}

/// Rejection sent once a client has used up its window
#[derive(Debug)]
pub struct RateLimitError {
    pub retry_after: u64,
    pub limit: u64,
}

impl IntoResponse for RateLimitError {
    fn into_response(self) -> Response {
        let mut headers = HeaderMap::new();
        headers.insert(RETRY_AFTER, HeaderValue::from(self.retry_after));
        headers.insert(HEADER_LIMIT, HeaderValue::from(self.limit));
        headers.insert(HEADER_REMAINING, HeaderValue::from_static("0"));

        (
            StatusCode::TOO_MANY_REQUESTS,
            headers,
            "Too many requests. Please try again later.",
        )
            .into_response()
    }
}

fn header<'r>(request: &'r Request, name: &str) -> Option<&'r str> {
    request
        .headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

/// Who the budget is charged to: the first proxy hop, then `X-Real-IP`,
/// then the peer address.
fn client_key(request: &Request) -> String {
    header(request, "X-Forwarded-For")
        .and_then(|chain| chain.split(',').map(str::trim).find(|hop| !hop.is_empty()))
        .or_else(|| header(request, "X-Real-IP"))
        .map(str::to_owned)
        .or_else(|| {
            request
                .extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip().to_string())
        })
        .unwrap_or_else(|| "unknown".to_owned())
}

async fn enforce(
    state: &AppState,
    policy: RateLimit,
    request: Request,
    next: Next,
) -> Result<Response, RateLimitError> {
    let client = client_key(&request);

    let used = match state
        .cache
        .check_rate_limit(&policy.key(&client), policy.requests, policy.window_seconds)
        .await
    {
        Ok((used, true)) => used,
        Ok((used, false)) => {
            tracing::warn!(policy = policy.prefix, %client, used, "Rate limit exceeded");
            return Err(policy.rejection());
        }
        Err(e) => {
            tracing::error!(
                policy = policy.prefix,
                error = %e,
                "Rate limit check failed, denying request"
            );
            return Err(policy.rejection());
        }
    };

    let mut response = next.run(request).await;
    policy.annotate(&mut response, used);
    Ok(response)
}

/// General budget for the authenticated API
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, RateLimitError> {
    enforce(&state, GENERAL, request, next).await
}

/// Stricter budget for register and login
pub async fn rate_limit_auth_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, RateLimitError> {
    enforce(&state, AUTH, request, next).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn request_with(headers: &[(&str, &str)]) -> Request {
        let mut builder = Request::builder();
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn test_rejection_carries_policy_window() {
        let response = AUTH.rejection().into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            response.headers()[RETRY_AFTER],
            RATE_LIMIT_AUTH_WINDOW_SECONDS.to_string().as_str()
        );
        assert_eq!(response.headers()[HEADER_REMAINING], "0");
    }

    #[test]
    fn test_policies_use_separate_keys() {
        assert_eq!(GENERAL.key("203.0.113.7"), "general:203.0.113.7");
        assert_eq!(AUTH.key("203.0.113.7"), "auth:203.0.113.7");
    }

    #[test]
    fn test_client_key_prefers_first_forwarded_hop() {
        let request = request_with(&[
            ("X-Forwarded-For", "203.0.113.7, 10.0.0.1"),
            ("X-Real-IP", "10.0.0.2"),
        ]);
        assert_eq!(client_key(&request), "203.0.113.7");
    }

    #[test]
    fn test_client_key_skips_blank_forwarded_for() {
        let request = request_with(&[("X-Forwarded-For", " , "), ("X-Real-IP", "10.0.0.2")]);
        assert_eq!(client_key(&request), "10.0.0.2");
    }

    #[test]
    fn test_client_key_falls_back_to_peer_then_unknown() {
        let mut request = request_with(&[]);
        assert_eq!(client_key(&request), "unknown");

        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([192, 0, 2, 1], 4000))));
        assert_eq!(client_key(&request), "192.0.2.1");
    }

    #[test]
    fn test_annotate_reports_remaining_budget() {
        let mut response = StatusCode::OK.into_response();
        let policy = RateLimit {
            prefix: "test",
            requests: 10,
            window_seconds: 60,
        };
        policy.annotate(&mut response, 4);
        assert_eq!(response.headers()[HEADER_LIMIT], "10");
        assert_eq!(response.headers()[HEADER_REMAINING], "6");
    }
}
