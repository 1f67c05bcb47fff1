// src/utils.rs
use actix_web::{HttpRequest, HttpResponse, ResponseError};
use actix_web::http::StatusCode;
use governor::{RateLimiter, clock::DefaultClock};
use governor::state::keyed::DefaultKeyedStateStore;
use log::debug;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

use crate::refresh::FetchError;

pub type KeyedLimiter = RateLimiter<IpAddr, DefaultKeyedStateStore<IpAddr>, DefaultClock>;

#[derive(Debug)]
pub enum RequestError {
    MissingPeerIP,
    RateLimitExceeded,
    ServerUnreachable(FetchError),
    Render,
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingPeerIP => write!(f, "Failed to extract client IP"),
            Self::RateLimitExceeded => write!(f, "Rate limit exceeded"),
            Self::ServerUnreachable(_) => write!(f, "error contacting server"),
            Self::Render => write!(f, "error rendering scoreboard"),
        }
    }
}

impl ResponseError for RequestError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingPeerIP => StatusCode::BAD_REQUEST,
            Self::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
            Self::ServerUnreachable(_) | Self::Render => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).body(self.to_string())
    }
}

fn parse_ip(addr: &str) -> Option<IpAddr> {
    addr.parse::<SocketAddr>()
        .map(|socket| socket.ip())
        .or_else(|_| addr.parse::<IpAddr>())
        .ok()
}

/// The address requests are rate limited by. Forwarding headers are only
/// believed when the server sits behind a proxy that sets them.
pub fn extract_client_ip(req: &HttpRequest, trust_forwarded_for: bool) -> Result<IpAddr, RequestError> {
    if trust_forwarded_for {
        let info = req.connection_info();
        if let Some(ip) = info.realip_remote_addr().and_then(parse_ip) {
            debug!("Using forwarded client IP: {}", ip);
            return Ok(ip);
        }
    }
    req.peer_addr()
        .map(|addr| addr.ip())
        .ok_or(RequestError::MissingPeerIP)
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;
    use actix_web::test::TestRequest;

    #[test]
    fn parses_ips_with_and_without_port() {
        assert_eq!(parse_ip("10.0.0.1:4000"), Some("10.0.0.1".parse::<IpAddr>().unwrap()));
        assert_eq!(parse_ip("10.0.0.1"), Some("10.0.0.1".parse::<IpAddr>().unwrap()));
        assert_eq!(parse_ip("[::1]:80"), Some("::1".parse::<IpAddr>().unwrap()));
        assert_eq!(parse_ip("not an ip"), None);
    }

    #[test]
    fn uses_peer_address_by_default() {
        let req = TestRequest::default()
            .peer_addr("203.0.113.9:5555".parse().unwrap())
            .insert_header(("X-Forwarded-For", "198.51.100.1"))
            .to_http_request();
        assert_eq!(extract_client_ip(&req, false).unwrap(), "203.0.113.9".parse::<IpAddr>().unwrap());
    }

    #[test]
    fn uses_forwarded_header_when_trusted() {
        let req = TestRequest::default()
            .peer_addr("203.0.113.9:5555".parse().unwrap())
            .insert_header(("X-Forwarded-For", "198.51.100.1, 10.0.0.1"))
            .to_http_request();
        assert_eq!(extract_client_ip(&req, true).unwrap(), "198.51.100.1".parse::<IpAddr>().unwrap());
    }

    #[test]
    fn missing_peer_is_an_error() {
        let req = TestRequest::default().to_http_request();
        assert!(matches!(extract_client_ip(&req, false), Err(RequestError::MissingPeerIP)));
    }

    #[actix_web::test]
    async fn fetch_failures_become_500s() {
        let err = RequestError::ServerUnreachable(FetchError::Aborted("boom".to_string()));
        let resp = err.error_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = to_bytes(resp.into_body()).await.unwrap();
        assert_eq!(body, "error contacting server");
    }
}
