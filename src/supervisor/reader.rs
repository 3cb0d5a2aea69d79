//! Reader task: demultiplexes the worker's stdout into the two queues

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::ChildStdout;
use tokio::sync::mpsc;

use crate::protocol::{MonitorEvent, Response, WorkerMessage, decode_line};

/// Read `WorkerMessage` lines until EOF, routing responses and results to
/// their queues
///
/// Malformed lines are logged and skipped; the worker keeps its stdout
/// clean of anything but protocol messages, so a bad line is noise, not a
/// reason to tear the stream down.
pub(super) async fn demux(
    stdout: BufReader<ChildStdout>,
    response_tx: mpsc::UnboundedSender<Response>,
    result_tx: mpsc::UnboundedSender<MonitorEvent>,
) {
    let mut lines = stdout.lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if line.trim().is_empty() {
                    continue;
                }
                match decode_line::<WorkerMessage>(&line) {
                    Ok(WorkerMessage::Response(response)) => {
                        log::debug!("worker response: {}", response.kind().as_str());
                        if response_tx.send(response).is_err() {
                            break;
                        }
                    }
                    Ok(WorkerMessage::Result(event)) => {
                        log::debug!("worker result");
                        if result_tx.send(event).is_err() {
                            break;
                        }
                    }
                    Err(error) => log::warn!("discarding malformed worker message: {error}"),
                }
            }
            Ok(None) => {
                log::info!("worker output stream closed");
                break;
            }
            Err(error) => {
                log::error!("worker output stream error: {error}");
                break;
            }
        }
    }
}
