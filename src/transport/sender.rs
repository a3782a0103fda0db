//! OpenTSDB Sender
//!
//! One connection per export: connect, write the lines plus a blank line,
//! close. Connection and write failures are logged and reported as
//! [`SendOutcome::Failed`], never as errors. There is no connect timeout; a
//! peer that neither accepts nor refuses keeps the send pending.

use bytes::{BufMut, BytesMut};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Written after the payload to mark the end of the batch
pub const BATCH_TERMINATOR: &[u8] = b"\n\n";

/// How a send attempt ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// Payload and terminator were written and the connection closed
    Delivered { bytes: usize },
    /// Nothing, or not everything, could be written
    Failed,
}

impl SendOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered { .. })
    }
}

/// Sends metric batches to a single OpenTSDB endpoint
#[derive(Debug, Clone)]
pub struct MetricSender {
    host: String,
    port: u16,
}

impl MetricSender {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Send one batch. Resolves exactly once, on success or failure.
    pub async fn send(&self, payload: &str) -> SendOutcome {
        debug!(
            host = %self.host,
            port = self.port,
            "Send the following keys to OpenTSDB:\n{}",
            payload
        );

        let mut stream = match TcpStream::connect((self.host.as_str(), self.port)).await {
            Ok(stream) => stream,
            Err(e) => {
                error!(
                    host = %self.host,
                    port = self.port,
                    error = %e,
                    "Couldn't send data to OpenTSDB"
                );
                return SendOutcome::Failed;
            }
        };

        info!(host = %self.host, port = self.port, "Sending data to OpenTSDB");

        let mut buffer = BytesMut::with_capacity(payload.len() + BATCH_TERMINATOR.len());
        buffer.put_slice(payload.as_bytes());
        buffer.put_slice(BATCH_TERMINATOR);

        if let Err(e) = stream.write_all(&buffer).await {
            warn!(host = %self.host, port = self.port, error = %e, "Failed writing to OpenTSDB");
            return SendOutcome::Failed;
        }

        if let Err(e) = stream.shutdown().await {
            debug!(error = %e, "Error closing OpenTSDB connection");
        }

        SendOutcome::Delivered { bytes: buffer.len() }
    }

    /// Send in the background; the handle resolves with the outcome.
    pub fn spawn_send(&self, payload: String) -> JoinHandle<SendOutcome> {
        let sender = self.clone();
        tokio::spawn(async move { sender.send(&payload).await })
    }
}
