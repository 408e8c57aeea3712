//! # Framed Stream Connection
//!
//! [`NegotiationConn`] over any tokio byte stream (TCP in production, an
//! in-memory duplex pipe in tests).
//!
//! ## Frame Format
//!
//! ```text
//! +----------------+---------------------+
//! | len: u64 (LE)  | body: len bytes     |
//! +----------------+---------------------+
//! ```
//!
//! The length is checked against the reader's cap before anything is
//! allocated.

use std::future::Future;
use std::io;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::Instant;

use crate::domain::ConnError;
use crate::ports::NegotiationConn;

/// Length-prefixed frames over a byte stream, bounded by a deadline.
#[derive(Debug)]
pub struct StreamConn<S> {
    stream: S,
    deadline: Option<Instant>,
}

impl<S> StreamConn<S> {
    /// Wrap a stream. No deadline applies until one is set.
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            deadline: None,
        }
    }

    /// Unwrap the underlying stream.
    pub fn into_inner(self) -> S {
        self.stream
    }
}

fn map_io(err: io::Error) -> ConnError {
    match err.kind() {
        io::ErrorKind::UnexpectedEof
        | io::ErrorKind::ConnectionReset
        | io::ErrorKind::BrokenPipe => ConnError::Closed,
        _ => ConnError::Io(err),
    }
}

async fn bounded<T, F>(deadline: Option<Instant>, op: F) -> Result<T, ConnError>
where
    F: Future<Output = io::Result<T>>,
{
    match deadline {
        Some(deadline) => tokio::time::timeout_at(deadline, op)
            .await
            .map_err(|_| ConnError::DeadlineExceeded)?
            .map_err(map_io),
        None => op.await.map_err(map_io),
    }
}

#[async_trait]
impl<S> NegotiationConn for StreamConn<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    fn set_deadline(&mut self, deadline: Instant) {
        self.deadline = Some(deadline);
    }

    async fn read_frame(&mut self, max_len: u64) -> Result<Vec<u8>, ConnError> {
        let deadline = self.deadline;
        let len = bounded(deadline, self.stream.read_u64_le()).await?;
        if len > max_len {
            return Err(ConnError::ObjectTooLarge {
                size: len,
                max: max_len,
            });
        }

        let mut body = vec![0u8; len as usize];
        bounded(deadline, self.stream.read_exact(&mut body)).await?;
        Ok(body)
    }

    async fn write_frame(&mut self, frame: &[u8]) -> Result<(), ConnError> {
        let deadline = self.deadline;
        let stream = &mut self.stream;
        bounded(deadline, async move {
            stream.write_u64_le(frame.len() as u64).await?;
            stream.write_all(frame).await?;
            stream.flush().await
        })
        .await
    }
}
