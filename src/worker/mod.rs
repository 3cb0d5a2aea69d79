//! Worker process: the actor that owns the live platform session
//!
//! Runs as a child process of the supervisor. A single-threaded actor loop
//! consumes one inbox that merges commands (posted by the stdin reader
//! task), new-message events (posted by the subscription feed task) and a
//! shutdown signal (stdin EOF or SIGTERM/SIGINT), so command handlers and
//! the message callback never run concurrently. All responses and results
//! leave through one writer channel to a single stdout writer task, which
//! preserves emission order on the wire.

mod auth;
mod monitor;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;

use crate::error::Result;
use crate::platform::{DialogKind, IncomingMessage, Platform, PlatformSession};
use crate::protocol::{
    Command, GroupInfo, MonitorConfig, MonitorEvent, Response, WorkerMessage, decode_line,
    encode_line,
};

use monitor::MonitorState;

/// One item of the worker's merged inbox
#[derive(Debug)]
pub enum Inbox {
    /// A command dequeued from the supervisor
    Command(Command),
    /// A message observed in a subscribed chat
    NewMessage(IncomingMessage),
    /// Terminate the loop and clean up
    Shutdown,
}

/// Login progress of the current session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingAuth {
    /// No login flow in progress
    None,
    /// A login code was requested and not yet verified
    CodePending,
    /// The code step passed; the second-factor password is outstanding
    PasswordPending,
}

/// The worker state machine
pub struct Worker<P: Platform> {
    platform: P,
    inbox_tx: mpsc::UnboundedSender<Inbox>,
    outbound: mpsc::UnboundedSender<WorkerMessage>,
    session: Option<P::Session>,
    authorized: bool,
    pending: PendingAuth,
    monitor: Option<MonitorState>,
}

impl<P: Platform> Worker<P> {
    /// Create a worker bound to its inbox and outbound channel
    ///
    /// `inbox_tx` must feed the same inbox the caller drains; the monitor
    /// feed task uses it to post new-message events.
    #[must_use]
    pub fn new(
        platform: P,
        inbox_tx: mpsc::UnboundedSender<Inbox>,
        outbound: mpsc::UnboundedSender<WorkerMessage>,
    ) -> Self {
        Self {
            platform,
            inbox_tx,
            outbound,
            session: None,
            authorized: false,
            pending: PendingAuth::None,
            monitor: None,
        }
    }

    /// Process one inbox item; returns false when the loop should exit
    pub async fn process(&mut self, item: Inbox) -> bool {
        match item {
            Inbox::Command(command) => {
                self.handle_command(command).await;
                true
            }
            Inbox::NewMessage(message) => {
                self.handle_new_message(message).await;
                true
            }
            Inbox::Shutdown => false,
        }
    }

    /// Dispatch one command to its handler
    pub async fn handle_command(&mut self, command: Command) {
        log::info!("handling command: {}", command.kind());
        match command {
            Command::Connect => self.connect().await,
            Command::SendCode { phone } => self.send_code(&phone).await,
            Command::VerifyCode { code, password } => {
                self.verify_code(&code, password.as_deref()).await;
            }
            Command::GetDialogs => self.get_dialogs().await,
            Command::StartMonitor {
                target_group_id,
                keywords,
                messages,
                interval,
            } => {
                self.start_monitor(MonitorConfig {
                    target_group_id,
                    keywords,
                    messages,
                    interval,
                })
                .await;
            }
            Command::StopMonitor => self.stop_monitor().await,
            Command::Disconnect => self.disconnect().await,
        }
    }

    fn respond(&self, response: Response) {
        if self
            .outbound
            .send(WorkerMessage::Response(response))
            .is_err()
        {
            log::warn!("outbound channel closed, dropping response");
        }
    }

    fn emit(&self, event: MonitorEvent) {
        if self.outbound.send(WorkerMessage::Result(event)).is_err() {
            log::warn!("outbound channel closed, dropping result");
        }
    }

    async fn get_dialogs(&mut self) {
        let session = match self.session.as_ref() {
            Some(session) if self.authorized => session,
            _ => {
                self.respond(Response::DialogsResponse {
                    success: false,
                    groups: None,
                    error: Some("未登录".to_string()),
                });
                return;
            }
        };

        match session.list_dialogs().await {
            Ok(dialogs) => {
                let groups: Vec<GroupInfo> = dialogs
                    .into_iter()
                    .filter(|dialog| dialog.kind == DialogKind::Channel)
                    .map(|dialog| GroupInfo {
                        title: if dialog.title.is_empty() {
                            format!("群聊 {}", dialog.id)
                        } else {
                            dialog.title
                        },
                        id: dialog.id,
                        username: dialog.username.unwrap_or_default(),
                        participants_count: dialog.participants_count.unwrap_or(0),
                    })
                    .collect();
                log::info!("fetched {} groups", groups.len());
                self.respond(Response::DialogsResponse {
                    success: true,
                    groups: Some(groups),
                    error: None,
                });
            }
            Err(error) => {
                log::error!("failed to fetch dialogs: {error}");
                self.respond(Response::DialogsResponse {
                    success: false,
                    groups: None,
                    error: Some(error.to_string()),
                });
            }
        }
    }

    /// Tear down the session: stop the monitor, close the transport,
    /// reset the auth state
    pub async fn disconnect(&mut self) {
        self.stop_monitor().await;

        if let Some(session) = self.session.take() {
            if let Err(error) = session.disconnect().await {
                log::warn!("session close failed: {error}");
            }
        }
        self.authorized = false;
        self.pending = PendingAuth::None;

        self.respond(Response::Disconnected { success: true });
        log::info!("session disconnected");
    }
}

/// Run the worker process end to end
///
/// Wires stdin/stdout to the inbox and the outbound channel, installs
/// termination signal handlers and drives the actor loop until shutdown.
///
/// # Errors
/// Returns error if the signal handlers cannot be installed
pub async fn run<P: Platform>(platform: P) -> Result<()> {
    log::info!("worker process starting");

    let (inbox_tx, mut inbox_rx) = mpsc::unbounded_channel();
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<WorkerMessage>();

    // stdin reader: one command per line; EOF is the termination signal
    let command_tx = inbox_tx.clone();
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    match decode_line::<Command>(&line) {
                        Ok(command) => {
                            if command_tx.send(Inbox::Command(command)).is_err() {
                                break;
                            }
                        }
                        Err(error) => log::warn!("ignoring unrecognized command: {error}"),
                    }
                }
                Ok(None) => {
                    log::info!("command stream closed");
                    let _ = command_tx.send(Inbox::Shutdown);
                    break;
                }
                Err(error) => {
                    log::error!("command stream error: {error}");
                    let _ = command_tx.send(Inbox::Shutdown);
                    break;
                }
            }
        }
    });

    // stdout writer: the only task that touches stdout
    tokio::spawn(async move {
        let mut stdout = tokio::io::stdout();
        while let Some(message) = outbound_rx.recv().await {
            match encode_line(&message) {
                Ok(line) => {
                    if stdout.write_all(line.as_bytes()).await.is_err()
                        || stdout.flush().await.is_err()
                    {
                        break;
                    }
                }
                Err(error) => log::error!("failed to encode outbound message: {error}"),
            }
        }
    });

    spawn_signal_listener(inbox_tx.clone())?;

    let mut worker = Worker::new(platform, inbox_tx, outbound_tx);
    while let Some(item) = inbox_rx.recv().await {
        if !worker.process(item).await {
            break;
        }
    }

    log::info!("worker shutting down");
    worker.disconnect().await;
    Ok(())
}

#[cfg(unix)]
fn spawn_signal_listener(inbox_tx: mpsc::UnboundedSender<Inbox>) -> Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut terminate = signal(SignalKind::terminate())?;
    let mut interrupt = signal(SignalKind::interrupt())?;
    tokio::spawn(async move {
        tokio::select! {
            _ = terminate.recv() => log::info!("received SIGTERM"),
            _ = interrupt.recv() => log::info!("received SIGINT"),
        }
        let _ = inbox_tx.send(Inbox::Shutdown);
    });
    Ok(())
}

#[cfg(not(unix))]
fn spawn_signal_listener(inbox_tx: mpsc::UnboundedSender<Inbox>) -> Result<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::info!("received interrupt");
        }
        let _ = inbox_tx.send(Inbox::Shutdown);
    });
    Ok(())
}
