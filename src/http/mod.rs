//! HTTP protocol layer module
//!
//! Request descriptors, range negotiation, response builders and the streamed body,
//! decoupled from the file pipeline that uses them.

pub mod body;
pub mod cache;
pub mod mime;
pub mod range;
pub mod request;
pub mod response;

// Re-export commonly used types
pub use body::{ResponseBody, ResponseSink, SinkClosed};
pub use range::{negotiate, DeliveryPlan};
pub use request::RequestInfo;
pub use response::{build_405_response, build_error_response, build_file_response, FileHeaders};
