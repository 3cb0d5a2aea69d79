//! Worker process lifecycle (start, three-tier stop)

use std::process::Stdio;
use std::sync::atomic::Ordering;
use std::time::Duration;

use tokio::io::BufReader;
use tokio::sync::mpsc;

use crate::error::{Error, Result};
use crate::protocol::Command;

use super::{ENV_API_HASH, ENV_API_ID, Supervisor};

/// Wait for the worker to exit after the cooperative disconnect command
const COOPERATIVE_EXIT_WAIT: Duration = Duration::from_secs(5);

/// Wait for the worker to exit after its stdin is closed
const STDIN_CLOSE_WAIT: Duration = Duration::from_secs(3);

impl Supervisor {
    /// Spawn the worker process and wire up its stdio
    ///
    /// Idempotent: calling while the worker is already running logs and
    /// returns without effect.
    ///
    /// # Errors
    /// Returns error if the process cannot be spawned or a stdio handle
    /// cannot be obtained. This is the only supervisor operation that
    /// propagates a failure instead of converting it to a null return.
    pub async fn start(&self) -> Result<()> {
        if self.running.load(Ordering::SeqCst) {
            log::warn!("worker process already running");
            return Ok(());
        }

        let mut command = tokio::process::Command::new(&self.worker_program);
        command
            .args(&self.worker_args)
            .env(ENV_API_ID, self.credentials.api_id.to_string())
            .env(ENV_API_HASH, &self.credentials.api_hash)
            // Piped, never inherited: the worker must not touch the
            // supervisor's terminal.
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = command.spawn().map_err(|error| {
            Error::spawn(format!("{}: {error}", self.worker_program.display()))
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| Error::transport("failed to get worker stdin handle"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::transport("failed to get worker stdout handle"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| Error::transport("failed to get worker stderr handle"))?;

        // Forward worker stderr to our own for visibility.
        let stderr_task = tokio::spawn(async move {
            use tokio::io::AsyncReadExt;
            let mut stderr = stderr;
            let mut buffer = vec![0u8; 4096];
            loop {
                match stderr.read(&mut buffer).await {
                    Ok(0) | Err(_) => break,
                    Ok(n) => {
                        let _ = std::io::Write::write_all(&mut std::io::stderr(), &buffer[..n]);
                    }
                }
            }
        });

        let (response_tx, response_rx) = mpsc::unbounded_channel();
        let (result_tx, result_rx) = mpsc::unbounded_channel();
        let reader_task = tokio::spawn(super::reader::demux(
            BufReader::new(stdout),
            response_tx,
            result_tx,
        ));

        *self.child.lock().await = Some(child);
        *self.stdin.lock().await = Some(stdin);
        *self.responses.lock().await = Some(response_rx);
        *self.results.lock().await = Some(result_rx);
        *self.reader_task.lock().await = Some(reader_task);
        *self.stderr_task.lock().await = Some(stderr_task);
        self.running.store(true, Ordering::SeqCst);

        log::info!("worker process started");
        Ok(())
    }

    /// Stop the worker process; no-op when not running
    ///
    /// Escalates through three bounded tiers so a stuck platform call in
    /// the worker can never hang shutdown: a cooperative `disconnect`
    /// command, then closing the worker's stdin (its termination signal),
    /// then a kill.
    pub async fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }

        if let Err(error) = self.write_command(&Command::Disconnect).await {
            log::debug!("cooperative disconnect not delivered: {error}");
        }

        let child = self.child.lock().await.take();
        if let Some(mut child) = child {
            if tokio::time::timeout(COOPERATIVE_EXIT_WAIT, child.wait())
                .await
                .is_err()
            {
                log::warn!("worker did not exit cooperatively, closing its stdin");
                drop(self.stdin.lock().await.take());

                if tokio::time::timeout(STDIN_CLOSE_WAIT, child.wait())
                    .await
                    .is_err()
                {
                    log::warn!("worker still alive, killing it");
                    let _ = child.kill().await;
                }
            }
        }

        drop(self.stdin.lock().await.take());
        if let Some(task) = self.reader_task.lock().await.take() {
            task.abort();
        }
        if let Some(task) = self.stderr_task.lock().await.take() {
            task.abort();
        }
        self.responses.lock().await.take();
        self.results.lock().await.take();

        log::info!("worker process stopped");
    }
}
