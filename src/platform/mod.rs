//! Messaging-platform client seam
//!
//! The worker never talks to a platform library directly; it goes through
//! these traits. [`Platform`] creates connected sessions, [`PlatformSession`]
//! is the cloneable live-session handle with exactly the capabilities the
//! worker needs: authorization checks, the two-step login flow, dialog
//! listing, new-message subscriptions and message sending.
//!
//! The crate ships one implementation, the deterministic in-process
//! simulator in [`sim`]; a production client plugs in here.

pub mod sim;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

pub use sim::SimPlatform;

/// Errors surfaced by a platform client
///
/// Structured variants instead of error-text sniffing: the worker maps
/// these to its user-facing response strings.
#[derive(Error, Debug)]
pub enum PlatformError {
    /// Transient rate limit; retry after the given wait
    #[error("rate limited, retry after {}s", wait.as_secs())]
    RateLimited {
        /// How long the platform asks us to back off
        wait: Duration,
    },

    /// The account requires a second-factor password after the code step
    #[error("two-factor password required")]
    PasswordRequired,

    /// The second-factor password was wrong
    #[error("invalid two-factor password")]
    InvalidPassword,

    /// The login code was wrong or expired
    #[error("invalid login code")]
    InvalidCode,

    /// All delivery options for a login code were used up
    #[error("login code options exhausted")]
    CodeOptionsExhausted,

    /// Anything else the platform reports
    #[error("{0}")]
    Other(String),
}

/// Result type alias for platform operations
pub type PlatformResult<T> = std::result::Result<T, PlatformError>;

/// Classification of a dialog entity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogKind {
    /// One-on-one conversation
    User,
    /// Small basic group
    Group,
    /// Channel or supergroup
    Channel,
}

/// One conversation as reported by the platform
#[derive(Debug, Clone)]
pub struct Dialog {
    /// Platform identifier
    pub id: i64,
    /// Display title; may be empty
    pub title: String,
    /// Public username, if the entity has one
    pub username: Option<String>,
    /// Member count, if the platform reports one
    pub participants_count: Option<i32>,
    /// Entity classification
    pub kind: DialogKind,
}

/// A message observed in a subscribed chat
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    /// Chat the message appeared in
    pub chat_id: i64,
    /// Message text; empty when the message carries none
    pub text: String,
}

/// Factory for connected platform sessions
#[async_trait]
pub trait Platform: Send + Sync + 'static {
    /// The session handle type this platform produces
    type Session: PlatformSession;

    /// Create a session and connect its transport
    ///
    /// Authorization state carries over from any persisted session data,
    /// so a freshly connected session may already be authorized.
    async fn connect(&self) -> PlatformResult<Self::Session>;
}

/// Live session handle
///
/// Handles are cheap to clone (they share one underlying connection), which
/// lets the worker hand a clone to its send-sequence tasks.
#[async_trait]
pub trait PlatformSession: Clone + Send + Sync + 'static {
    /// Whether the session is signed in
    async fn is_authorized(&self) -> PlatformResult<bool>;

    /// Ask the platform to deliver a login code to `phone`
    async fn request_login_code(&self, phone: &str) -> PlatformResult<()>;

    /// Sign in with the delivered code
    ///
    /// # Errors
    /// `PasswordRequired` when the account has a second factor; the caller
    /// must follow up with [`sign_in_password`](Self::sign_in_password).
    async fn sign_in_code(&self, code: &str) -> PlatformResult<()>;

    /// Complete sign-in with the second-factor password
    async fn sign_in_password(&self, password: &str) -> PlatformResult<()>;

    /// Enumerate all of the account's dialogs
    async fn list_dialogs(&self) -> PlatformResult<Vec<Dialog>>;

    /// Subscribe to new messages in one chat
    ///
    /// Every message that appears in `chat_id` is delivered on the returned
    /// channel until [`unsubscribe`](Self::unsubscribe) is called or the
    /// receiver is dropped.
    fn subscribe(&self, chat_id: i64) -> mpsc::UnboundedReceiver<IncomingMessage>;

    /// Drop all new-message subscriptions for one chat
    fn unsubscribe(&self, chat_id: i64);

    /// Send a text message into a chat
    async fn send_message(&self, chat_id: i64, text: &str) -> PlatformResult<()>;

    /// Close the underlying connection
    async fn disconnect(&self) -> PlatformResult<()>;
}
