//! Response body module
//!
//! `ResponseBody` is the single body type every handler returns. Streamed file
//! bodies are fed through a bounded channel: the sending half is the
//! `ResponseSink` the pump writes into, the receiving half is polled by hyper as
//! the socket drains, so file reads are paced by the client.

use async_trait::async_trait;
use bytes::Bytes;
use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Empty, Full};
use hyper::body::{Body, Frame};
use std::convert::Infallible;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use thiserror::Error;
use tokio::sync::mpsc;

/// Body type of every response the server produces
pub type ResponseBody = BoxBody<Bytes, io::Error>;

/// Fixed in-memory body
pub fn full(data: impl Into<Bytes>) -> ResponseBody {
    Full::new(data.into()).map_err(infallible).boxed()
}

/// Empty body
pub fn empty() -> ResponseBody {
    Empty::<Bytes>::new().map_err(infallible).boxed()
}

const fn infallible(never: Infallible) -> io::Error {
    match never {}
}

/// The receiving side of the response has gone away
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("response sink closed")]
pub struct SinkClosed;

/// Destination of streamed body bytes
#[async_trait]
pub trait ResponseSink: Send + Sync {
    /// Deliver one chunk, waiting while the receiver is still busy with earlier ones
    async fn send_chunk(&self, chunk: Bytes) -> Result<(), SinkClosed>;

    /// Resolves once the receiver is gone (client disconnected)
    async fn closed(&self);

    /// End the body with an error so the connection is torn down
    fn abort(&self, error: io::Error);
}

/// Sending half of a streamed body
#[derive(Debug)]
pub struct ChannelSink {
    tx: mpsc::Sender<io::Result<Bytes>>,
}

/// Receiving half of a streamed body, polled by hyper
#[derive(Debug)]
pub struct ChannelBody {
    rx: mpsc::Receiver<io::Result<Bytes>>,
}

/// Create a streamed body holding at most `capacity` unsent chunks
pub fn channel(capacity: usize) -> (ChannelSink, ChannelBody) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (ChannelSink { tx }, ChannelBody { rx })
}

#[async_trait]
impl ResponseSink for ChannelSink {
    async fn send_chunk(&self, chunk: Bytes) -> Result<(), SinkClosed> {
        self.tx.send(Ok(chunk)).await.map_err(|_| SinkClosed)
    }

    async fn closed(&self) {
        self.tx.closed().await;
    }

    fn abort(&self, error: io::Error) {
        // A full channel still ends short of Content-Length once the sender drops,
        // which hyper also treats as a broken body.
        let _ = self.tx.try_send(Err(error));
    }
}

impl Body for ChannelBody {
    type Data = Bytes;
    type Error = io::Error;

    fn poll_frame(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        self.rx
            .poll_recv(cx)
            .map(|item| item.map(|chunk| chunk.map(Frame::data)))
    }
}
