//! Protocol message types
//!
//! Tagged unions for the three queue payloads: commands (supervisor to
//! worker), responses (worker to supervisor, one per command family) and
//! results (worker to supervisor, fire-and-forget event stream). The `type`
//! tags and field names are the compatibility contract with the control
//! panel and must not be renamed.

use serde::{Deserialize, Serialize};

fn default_interval() -> u64 {
    1
}

/// Command sent from the supervisor to the worker process
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    /// Connect the platform session and report authorization state
    Connect,
    /// Request a login code for the given phone number
    SendCode {
        /// Phone number in international format
        phone: String,
    },
    /// Verify a login code, optionally with the second-factor password
    VerifyCode {
        /// Login code received out of band
        code: String,
        /// Second-factor password, when the account has one
        #[serde(default, skip_serializing_if = "Option::is_none")]
        password: Option<String>,
    },
    /// List the account's group dialogs
    GetDialogs,
    /// Start keyword monitoring on a target group
    StartMonitor {
        /// Group to watch and reply into
        target_group_id: i64,
        /// Trigger keywords (case-sensitive substring match)
        keywords: Vec<String>,
        /// Scripted reply sequence
        messages: Vec<String>,
        /// Seconds to pause between replies
        #[serde(default = "default_interval")]
        interval: u64,
    },
    /// Stop keyword monitoring
    StopMonitor,
    /// Tear down the platform session
    Disconnect,
}

impl Command {
    /// The command's wire tag, for logging without payload leakage
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Connect => "connect",
            Self::SendCode { .. } => "send_code",
            Self::VerifyCode { .. } => "verify_code",
            Self::GetDialogs => "get_dialogs",
            Self::StartMonitor { .. } => "start_monitor",
            Self::StopMonitor => "stop_monitor",
            Self::Disconnect => "disconnect",
        }
    }
}

/// One group entry in a `dialogs_response`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupInfo {
    /// Platform identifier of the group
    pub id: i64,
    /// Display title (never empty; falls back to a generated one)
    pub title: String,
    /// Public username, empty string when the group has none
    pub username: String,
    /// Member count, zero when the platform does not report one
    pub participants_count: i32,
}

/// Response answering a specific command, correlated by its `type` tag only
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    /// Answer to `connect`
    ConnectResponse {
        /// Whether the connect attempt succeeded
        success: bool,
        /// Authorization state of the session, present on success
        #[serde(default, skip_serializing_if = "Option::is_none")]
        is_authorized: Option<bool>,
        /// Informational note
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
        /// Failure cause
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    /// Answer to `send_code`
    CodeSent {
        /// Whether the login code was requested
        success: bool,
        /// Informational note
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
        /// Failure cause, user-facing
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    /// Answer to `verify_code` (both the code and the password step)
    VerifyResponse {
        /// Whether sign-in completed
        success: bool,
        /// Informational note
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
        /// Failure cause; `need_password` marks the expected
        /// second-factor intermediate state, not an error
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    /// Answer to `get_dialogs`
    DialogsResponse {
        /// Whether the dialog list was fetched
        success: bool,
        /// Channel and supergroup entries, present on success
        #[serde(default, skip_serializing_if = "Option::is_none")]
        groups: Option<Vec<GroupInfo>>,
        /// Failure cause
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    /// Answer to `start_monitor`
    MonitorStarted {
        /// Whether the subscription is live
        success: bool,
        /// Informational note
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
        /// Failure cause
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    /// Answer to `stop_monitor`
    MonitorStopped {
        /// Always true; stopping is idempotent
        success: bool,
        /// Informational note
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
        /// Failure cause
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    /// Answer to `disconnect`
    Disconnected {
        /// Always true; teardown is best-effort
        success: bool,
    },
}

/// Response family discriminant, used for type-filtered matching
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseKind {
    /// `connect_response`
    ConnectResponse,
    /// `code_sent`
    CodeSent,
    /// `verify_response`
    VerifyResponse,
    /// `dialogs_response`
    DialogsResponse,
    /// `monitor_started`
    MonitorStarted,
    /// `monitor_stopped`
    MonitorStopped,
    /// `disconnected`
    Disconnected,
}

impl ResponseKind {
    /// The wire tag this kind matches
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ConnectResponse => "connect_response",
            Self::CodeSent => "code_sent",
            Self::VerifyResponse => "verify_response",
            Self::DialogsResponse => "dialogs_response",
            Self::MonitorStarted => "monitor_started",
            Self::MonitorStopped => "monitor_stopped",
            Self::Disconnected => "disconnected",
        }
    }
}

impl Response {
    /// The response's family discriminant
    #[must_use]
    pub const fn kind(&self) -> ResponseKind {
        match self {
            Self::ConnectResponse { .. } => ResponseKind::ConnectResponse,
            Self::CodeSent { .. } => ResponseKind::CodeSent,
            Self::VerifyResponse { .. } => ResponseKind::VerifyResponse,
            Self::DialogsResponse { .. } => ResponseKind::DialogsResponse,
            Self::MonitorStarted { .. } => ResponseKind::MonitorStarted,
            Self::MonitorStopped { .. } => ResponseKind::MonitorStopped,
            Self::Disconnected { .. } => ResponseKind::Disconnected,
        }
    }

    /// Whether the response reports success
    #[must_use]
    pub const fn is_success(&self) -> bool {
        match self {
            Self::ConnectResponse { success, .. }
            | Self::CodeSent { success, .. }
            | Self::VerifyResponse { success, .. }
            | Self::DialogsResponse { success, .. }
            | Self::MonitorStarted { success, .. }
            | Self::MonitorStopped { success, .. }
            | Self::Disconnected { success } => *success,
        }
    }
}

/// Asynchronous monitor event, delivered on the result queue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MonitorEvent {
    /// One message of the reply sequence was posted
    MessageSent {
        /// The message text that was sent
        content: String,
    },
    /// A monitor-path failure the panel should display
    Error {
        /// Failure description
        error: String,
    },
}

/// Envelope for everything the worker writes to its stdout
///
/// The supervisor's reader task demultiplexes on `channel`, splitting the
/// single pipe back into the response queue and the result queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "channel", content = "payload", rename_all = "snake_case")]
pub enum WorkerMessage {
    /// Request/ack style answer to a command
    Response(Response),
    /// Fire-and-forget monitor event
    Result(MonitorEvent),
}

/// Active monitor configuration
///
/// At most one is active at a time; a new `start_monitor` replaces it.
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorConfig {
    /// Group being watched and replied into
    pub target_group_id: i64,
    /// Trigger keywords
    pub keywords: Vec<String>,
    /// Scripted reply sequence
    pub messages: Vec<String>,
    /// Seconds between replies
    pub interval: u64,
}

impl MonitorConfig {
    /// Whether any keyword occurs in `text` (case-sensitive, unanchored)
    #[must_use]
    pub fn matches(&self, text: &str) -> bool {
        self.keywords.iter().any(|keyword| text.contains(keyword))
    }
}
