// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Attach Client (spec.md §4.6): connects to a session daemon's Unix
//! socket, drives the join protocol, and exposes the live frame stream plus
//! a request/response helper for control RPCs.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use conclave_core::{BroadcastFrame, FrameTag};
use conclave_daemon::wire::{self, ControlRequest, ControlResultPayload, MetaPayload, Payload, ProtocolError, RawEnvelope, SnapshotPayload};
use thiserror::Error;
use tokio::io::BufReader;
use tokio::net::unix::OwnedWriteHalf;
use tokio::net::UnixStream;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("daemon not running at {0}")]
    DaemonNotRunning(PathBuf),
    #[error("timed out connecting to daemon")]
    ConnectTimeout,
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
    #[error("connection closed by daemon")]
    ConnectionClosed,
    #[error("timed out waiting for control result")]
    RequestTimeout,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// A connected client to one session's daemon socket, past the join
/// protocol (spec.md §4.5.1).
pub struct AttachClient {
    reader: BufReader<tokio::net::unix::OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl AttachClient {
    /// Connect once; returns [`ClientError::DaemonNotRunning`] if nothing is
    /// listening (mirrors `oj-cli::client::DaemonClient::connect`'s
    /// probe-then-connect split).
    pub async fn connect(socket_path: &Path) -> Result<Self, ClientError> {
        let stream = UnixStream::connect(socket_path)
            .await
            .map_err(|_| ClientError::DaemonNotRunning(socket_path.to_path_buf()))?;
        let (read_half, writer) = stream.into_split();
        Ok(Self {
            reader: BufReader::new(read_half),
            writer,
        })
    }

    /// Connect, retrying at [`crate::poll_interval`] until `timeout` elapses
    /// — used right after starting a freshly forked daemon, whose socket
    /// bind may not have happened yet (mirrors
    /// `oj-cli::client::DaemonClient::connect_with_retry`).
    pub async fn connect_with_retry(socket_path: &Path, timeout: Duration) -> Result<Self, ClientError> {
        let start = Instant::now();
        loop {
            match Self::connect(socket_path).await {
                Ok(client) => return Ok(client),
                Err(_) if start.elapsed() < timeout => {
                    tokio::time::sleep(crate::env::poll_interval()).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Read the join protocol's three frames in order (spec.md §4.5.1:
    /// meta, snapshot, live marker) and return the typed meta/snapshot.
    pub async fn join(&mut self) -> Result<(MetaPayload, SnapshotPayload), ClientError> {
        let meta_frame: BroadcastFrame<Payload> = self.read_frame().await?;
        let meta = match meta_frame.data {
            Some(Payload::Meta(m)) => m,
            _ => return Err(ClientError::Protocol(ProtocolError::ConnectionClosed)),
        };

        let snapshot_frame: BroadcastFrame<Payload> = self.read_frame().await?;
        let snapshot = match snapshot_frame.data {
            Some(Payload::Snapshot(s)) => s,
            _ => return Err(ClientError::Protocol(ProtocolError::ConnectionClosed)),
        };

        let live_frame: BroadcastFrame<Payload> = self.read_frame().await?;
        if live_frame.tag != FrameTag::Live {
            return Err(ClientError::Protocol(ProtocolError::ConnectionClosed));
        }

        Ok((meta, snapshot))
    }

    /// Read the next live broadcast frame; `Ok(None)` on clean disconnect.
    pub async fn next_frame(&mut self) -> Result<Option<BroadcastFrame<Payload>>, ClientError> {
        match wire::read_line(&mut self.reader).await? {
            Some(line) => Ok(Some(wire::decode_line(&line)?)),
            None => Ok(None),
        }
    }

    /// Issue one control request and wait for its matching result, ignoring
    /// any live frames that arrive first (spec.md §4.5.2: "the daemon
    /// answers exactly one `ControlResult` per request").
    pub async fn request(&mut self, request: ControlRequest) -> Result<ControlResultPayload, ClientError> {
        let envelope = serde_json::json!({"type": "control", "data": request});
        let mut line = serde_json::to_string(&envelope).map_err(|e| ClientError::Protocol(ProtocolError::Json(e)))?;
        line.push('\n');
        wire::write_line(&mut self.writer, &line).await?;

        let deadline = Instant::now() + crate::env::timeout_ipc();
        loop {
            if Instant::now() >= deadline {
                return Err(ClientError::RequestTimeout);
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            let line = tokio::time::timeout(remaining, wire::read_line(&mut self.reader))
                .await
                .map_err(|_| ClientError::RequestTimeout)??;
            let Some(line) = line else {
                return Err(ClientError::ConnectionClosed);
            };
            let envelope: RawEnvelope = serde_json::from_str(line.trim_end()).map_err(ProtocolError::from)?;
            if envelope.tag != FrameTag::ControlResult {
                continue;
            }
            let Some(data) = envelope.data else { continue };
            return serde_json::from_value(data).map_err(|e| ClientError::Protocol(ProtocolError::Json(e)));
        }
    }

    /// Write the bare `cancel` line (spec.md §6.1).
    pub async fn cancel(&mut self) -> Result<(), ClientError> {
        wire::write_line(&mut self.writer, &format!("{}\n", wire::CANCEL_LINE)).await?;
        Ok(())
    }

    async fn read_frame(&mut self) -> Result<BroadcastFrame<Payload>, ClientError> {
        match wire::read_line(&mut self.reader).await? {
            Some(line) => Ok(wire::decode_line(&line)?),
            None => Err(ClientError::ConnectionClosed),
        }
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
