//! Keyword monitor: subscription, matching and the scripted reply sequence

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::platform::{IncomingMessage, Platform, PlatformError, PlatformSession};
use crate::protocol::{MonitorConfig, MonitorEvent, Response, WorkerMessage};

use super::{Inbox, Worker};

/// State of the active monitor
pub(super) struct MonitorState {
    config: MonitorConfig,
    /// Pumps subscription deliveries into the worker inbox
    feed_task: JoinHandle<()>,
    /// In-flight reply sequences, one per keyword match
    send_tasks: Vec<JoinHandle<()>>,
}

impl<P: Platform> Worker<P> {
    /// Handle `start_monitor`: subscribe to the target group and arm the
    /// keyword matcher; an already-active monitor is replaced
    pub(super) async fn start_monitor(&mut self, config: MonitorConfig) {
        let Some(session) = self.session.clone() else {
            self.respond(Response::MonitorStarted {
                success: false,
                message: None,
                error: Some("未连接".to_string()),
            });
            return;
        };

        self.shutdown_monitor().await;

        let mut deliveries = session.subscribe(config.target_group_id);
        let inbox_tx = self.inbox_tx.clone();
        let feed_task = tokio::spawn(async move {
            while let Some(message) = deliveries.recv().await {
                if inbox_tx.send(Inbox::NewMessage(message)).is_err() {
                    break;
                }
            }
        });

        log::info!("monitoring group {}", config.target_group_id);
        self.monitor = Some(MonitorState {
            config,
            feed_task,
            send_tasks: Vec::new(),
        });
        self.respond(Response::MonitorStarted {
            success: true,
            message: Some("监听已开始".to_string()),
            error: None,
        });
    }

    /// Handle `stop_monitor`; succeeds even when no monitor is active
    pub(super) async fn stop_monitor(&mut self) {
        self.shutdown_monitor().await;
        self.respond(Response::MonitorStopped {
            success: true,
            message: Some("监听已停止".to_string()),
            error: None,
        });
        log::info!("monitoring stopped");
    }

    /// Cancel the feed task and every in-flight reply sequence, then drop
    /// the subscription
    ///
    /// Awaits each aborted task, so no monitor result can be emitted once
    /// this returns.
    async fn shutdown_monitor(&mut self) {
        let Some(state) = self.monitor.take() else {
            return;
        };

        state.feed_task.abort();
        let _ = state.feed_task.await;
        for task in state.send_tasks {
            task.abort();
            let _ = task.await;
        }

        if let Some(session) = &self.session {
            session.unsubscribe(state.config.target_group_id);
        }
    }

    /// Handle one message observed in the subscribed chat
    ///
    /// Spawns a reply sequence on a keyword match; does nothing otherwise.
    pub(super) async fn handle_new_message(&mut self, message: IncomingMessage) {
        let Some(state) = self.monitor.as_mut() else {
            return;
        };
        if message.chat_id != state.config.target_group_id {
            return;
        }
        if !state.config.matches(&message.text) {
            return;
        }

        log::info!("keyword matched in group {}", message.chat_id);
        let Some(session) = self.session.clone() else {
            self.emit(MonitorEvent::Error {
                error: "发送消息失败: 未连接".to_string(),
            });
            return;
        };

        state.send_tasks.retain(|task| !task.is_finished());
        let config = state.config.clone();
        let outbound = self.outbound.clone();
        state
            .send_tasks
            .push(tokio::spawn(send_sequence(session, config, outbound)));
    }
}

/// Post the scripted messages in order
///
/// A rate limit waits out the platform's backoff and retries the same
/// message; any other send failure is reported as a result and the
/// sequence continues with the next message.
async fn send_sequence<S: PlatformSession>(
    session: S,
    config: MonitorConfig,
    outbound: mpsc::UnboundedSender<WorkerMessage>,
) {
    for text in &config.messages {
        loop {
            match session.send_message(config.target_group_id, text).await {
                Ok(()) => {
                    log::info!("sent reply: {text}");
                    let _ = outbound.send(WorkerMessage::Result(MonitorEvent::MessageSent {
                        content: text.clone(),
                    }));
                    if config.interval > 0 {
                        tokio::time::sleep(Duration::from_secs(config.interval)).await;
                    }
                    break;
                }
                Err(PlatformError::RateLimited { wait }) => {
                    log::warn!("rate limited for {}s, retrying", wait.as_secs());
                    tokio::time::sleep(wait).await;
                }
                Err(error) => {
                    log::error!("failed to send reply: {error}");
                    let _ = outbound.send(WorkerMessage::Result(MonitorEvent::Error {
                        error: format!("发送消息失败: {error}"),
                    }));
                    break;
                }
            }
        }
    }
}
