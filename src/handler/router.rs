//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: `/files/` requests go to the file
//! service, everything else gets the default liveness answer.

use crate::files::ROUTE_PREFIX;
use crate::handler::files::FileService;
use crate::http::body::{self, ResponseBody};
use crate::http::RequestInfo;
use crate::logger;
use http_body_util::{BodyExt, Limited};
use hyper::body::Body;
use hyper::{Request, Response, StatusCode};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

/// Body of the default handler's response
pub const DEFAULT_RESPONSE: &str = "Server is running.";

/// Largest request body the default handler reads for the server log
const MAX_LOGGED_BODY: usize = 64 * 1024;

/// Main entry point for HTTP request handling
pub async fn handle_request<B>(
    req: Request<B>,
    service: Arc<FileService>,
    peer_addr: Option<SocketAddr>,
) -> Result<Response<ResponseBody>, Infallible>
where
    B: Body + Send,
    B::Error: std::error::Error + Send + Sync + 'static,
{
    let info = RequestInfo::from_request(&req, peer_addr);
    logger::log_request(&info);

    if info.path.starts_with(ROUTE_PREFIX) {
        return Ok(service.handle(&info).await);
    }

    Ok(serve_default(req).await)
}

/// Answer non-file requests, logging any request body
async fn serve_default<B>(req: Request<B>) -> Response<ResponseBody>
where
    B: Body + Send,
    B::Error: std::error::Error + Send + Sync + 'static,
{
    match Limited::new(req.into_body(), MAX_LOGGED_BODY).collect().await {
        Ok(collected) => {
            let bytes = collected.to_bytes();
            if !bytes.is_empty() {
                logger::log_debug(&format!(
                    "Request body: {}",
                    String::from_utf8_lossy(&bytes)
                ));
            }
        }
        Err(e) => logger::log_debug(&format!("Request body not logged: {e}")),
    }

    let mut response = Response::new(body::full(DEFAULT_RESPONSE));
    *response.status_mut() = StatusCode::OK;
    response
}
