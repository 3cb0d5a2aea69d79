//! Queue accessors: command dispatch, response matching, result draining

use std::time::Duration;

use tokio::io::AsyncWriteExt;

use crate::error::{Error, Result};
use crate::protocol::{Command, MonitorEvent, Response, ResponseKind, encode_line};

use super::Supervisor;

/// Dequeue slice used while filtering for a specific response type
const FILTER_POLL_SLICE: Duration = Duration::from_millis(100);

impl Supervisor {
    /// Enqueue a command for the worker
    ///
    /// Only the command's type tag is logged.
    ///
    /// # Errors
    /// Returns error if the worker is not running or the write fails
    pub async fn send_command(&self, command: &Command) -> Result<()> {
        if !self.is_running() {
            log::error!("worker process not running");
            return Err(Error::WorkerNotRunning);
        }
        self.write_command(command).await?;
        log::info!("sent command: {}", command.kind());
        Ok(())
    }

    pub(super) async fn write_command(&self, command: &Command) -> Result<()> {
        let line = encode_line(command)?;
        let mut guard = self.stdin.lock().await;
        let stdin = guard
            .as_mut()
            .ok_or_else(|| Error::transport("worker stdin not available"))?;
        stdin
            .write_all(line.as_bytes())
            .await
            .map_err(|error| Error::transport(format!("failed to write command: {error}")))?;
        stdin
            .flush()
            .await
            .map_err(|error| Error::transport(format!("failed to flush command: {error}")))?;
        Ok(())
    }

    /// Wait for a response from the worker
    ///
    /// Without a filter this is a single dequeue bounded by `timeout`. With
    /// a filter, the queue is polled in short slices and every non-matching
    /// response is discarded permanently, until a response of the wanted
    /// kind arrives or the cumulative deadline passes. The discard is safe
    /// under the protocol's one-outstanding-request assumption.
    pub async fn get_response(
        &self,
        timeout: Duration,
        filter: Option<ResponseKind>,
    ) -> Option<Response> {
        let mut guard = self.responses.lock().await;
        let Some(queue) = guard.as_mut() else {
            log::error!("response queue not available");
            return None;
        };

        let Some(wanted) = filter else {
            return match tokio::time::timeout(timeout, queue.recv()).await {
                Ok(Some(response)) => {
                    log::info!("received response: {}", response.kind().as_str());
                    Some(response)
                }
                Ok(None) => {
                    log::error!("response queue closed");
                    None
                }
                Err(_) => None,
            };
        };

        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if tokio::time::Instant::now() >= deadline {
                log::warn!("response timeout, no {} received", wanted.as_str());
                return None;
            }
            match tokio::time::timeout(FILTER_POLL_SLICE, queue.recv()).await {
                Ok(Some(response)) if response.kind() == wanted => {
                    log::info!("received matching response: {}", wanted.as_str());
                    return Some(response);
                }
                Ok(Some(response)) => {
                    log::warn!(
                        "discarding response {}, expected {}",
                        response.kind().as_str(),
                        wanted.as_str()
                    );
                }
                Ok(None) => {
                    log::error!("response queue closed");
                    return None;
                }
                Err(_) => {}
            }
        }
    }

    /// Wait up to `timeout` for one monitor result
    pub async fn get_result(&self, timeout: Duration) -> Option<MonitorEvent> {
        let mut guard = self.results.lock().await;
        let queue = guard.as_mut()?;
        match tokio::time::timeout(timeout, queue.recv()).await {
            Ok(Some(event)) => Some(event),
            Ok(None) | Err(_) => None,
        }
    }

    /// Drain every buffered monitor result, in emission order
    ///
    /// The batch is removed permanently; a second immediate call returns an
    /// empty batch.
    pub async fn check_results(&self) -> Vec<MonitorEvent> {
        let mut guard = self.results.lock().await;
        let Some(queue) = guard.as_mut() else {
            return Vec::new();
        };
        let mut batch = Vec::new();
        while let Ok(event) = queue.try_recv() {
            batch.push(event);
        }
        batch
    }

    /// Drop everything currently buffered on the result queue
    pub async fn clear_results(&self) {
        let dropped = self.check_results().await;
        if !dropped.is_empty() {
            log::debug!("cleared {} buffered results", dropped.len());
        }
    }
}
