//! HTTP response building module
//!
//! Builders for the file responses and for every error status the file pipeline can produce.

use super::body::{self, ResponseBody};
use super::range::DeliveryPlan;
use crate::error::FileError;
use hyper::header;
use hyper::{Response, StatusCode};

/// Representation headers of a file, known once validation succeeded
#[derive(Debug, Clone)]
pub struct FileHeaders {
    pub content_type: &'static str,
    pub cache_control: String,
    pub last_modified: Option<String>,
}

/// Build the 200/206 response head for a delivery plan
///
/// The body is attached as-is; for partial plans `Content-Range` describes it.
pub fn build_file_response(
    plan: &DeliveryPlan,
    headers: &FileHeaders,
    body: ResponseBody,
) -> Response<ResponseBody> {
    let status = if plan.is_partial() {
        StatusCode::PARTIAL_CONTENT
    } else {
        StatusCode::OK
    };

    let mut builder = Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, headers.content_type)
        .header(header::CONTENT_LENGTH, plan.content_length())
        .header(header::ACCEPT_RANGES, "bytes")
        .header(header::CACHE_CONTROL, headers.cache_control.as_str());

    if let Some(content_range) = plan.content_range() {
        builder = builder.header(header::CONTENT_RANGE, content_range);
    }
    if let Some(last_modified) = &headers.last_modified {
        builder = builder.header(header::LAST_MODIFIED, last_modified.as_str());
    }

    builder.body(body).unwrap_or_else(|e| {
        log_build_error(status.as_str(), &e);
        plain_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
    })
}

/// Build the response for a pipeline error
///
/// 416 carries `Content-Range: bytes */size` and no body; every other error
/// carries its fixed plain-text message.
pub fn build_error_response(err: &FileError) -> Response<ResponseBody> {
    let status = err.status_code();

    if let FileError::RangeNotSatisfiable { size } = err {
        return Response::builder()
            .status(status)
            .header(header::CONTENT_RANGE, format!("bytes */{size}"))
            .header(header::CONTENT_LENGTH, 0)
            .body(body::empty())
            .unwrap_or_else(|e| {
                log_build_error("416", &e);
                plain_response(status, "")
            });
    }

    plain_response(status, &err.client_message())
}

/// Build 405 Method Not Allowed response
pub fn build_405_response() -> Response<ResponseBody> {
    Response::builder()
        .status(StatusCode::METHOD_NOT_ALLOWED)
        .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
        .header(header::ALLOW, "GET, HEAD")
        .body(body::full("Method not allowed"))
        .unwrap_or_else(|e| {
            log_build_error("405", &e);
            plain_response(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
        })
}

/// Plain-text response with a fixed message
pub fn plain_response(status: StatusCode, message: &str) -> Response<ResponseBody> {
    let mut response = Response::new(body::full(message.to_string()));
    *response.status_mut() = status;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        header::HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response
}

/// Log response build error
fn log_build_error(status: &str, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}
