//! Request descriptor module
//!
//! Extracts the parts of an incoming request the file pipeline needs, so the
//! pipeline never touches the hyper request body or connection.

use hyper::header::{self, HeaderMap};
use hyper::{Method, Request};
use std::net::SocketAddr;

/// Parsed view of one HTTP request
#[derive(Debug, Clone)]
pub struct RequestInfo {
    pub method: Method,
    /// Path and query as received
    pub url: String,
    /// Path only, still percent-encoded
    pub path: String,
    pub client_ip: Option<SocketAddr>,
    pub user_agent: Option<String>,
    pub referrer: Option<String>,
    pub range: Option<String>,
}

impl RequestInfo {
    pub fn from_request<B>(req: &Request<B>, peer_addr: Option<SocketAddr>) -> Self {
        let uri = req.uri();
        let headers = req.headers();
        Self {
            method: req.method().clone(),
            url: uri
                .path_and_query()
                .map_or_else(|| uri.path().to_string(), ToString::to_string),
            path: uri.path().to_string(),
            client_ip: peer_addr,
            user_agent: header_str(headers, &header::USER_AGENT),
            referrer: header_str(headers, &header::REFERER),
            range: header_str(headers, &header::RANGE),
        }
    }
}

fn header_str(headers: &HeaderMap, name: &header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
}
