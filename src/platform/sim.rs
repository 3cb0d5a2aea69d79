//! Deterministic in-process platform simulator
//!
//! Implements the platform seam against in-memory state: registered
//! accounts drive the login flow, a fixed dialog list answers enumeration,
//! and injected messages fan out to subscribers. Backs the test suite and
//! the default worker binary.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use super::{
    Dialog, DialogKind, IncomingMessage, Platform, PlatformError, PlatformResult, PlatformSession,
};

struct SimAccount {
    code: String,
    password: Option<String>,
}

struct SimInner {
    api_id: i64,
    api_hash: String,
    accounts: Mutex<HashMap<String, SimAccount>>,
    dialogs: Mutex<Vec<Dialog>>,
    // Mirrors a persisted session file: authorization survives reconnects.
    authorized: AtomicBool,
    subscribers: Mutex<HashMap<i64, Vec<mpsc::UnboundedSender<IncomingMessage>>>>,
    sent: Mutex<Vec<(i64, String)>>,
    next_send_error: Mutex<Option<PlatformError>>,
    next_code_error: Mutex<Option<PlatformError>>,
}

/// Simulated messaging platform
///
/// Cloning shares all state, so a cloned handle can observe and steer a
/// session handed to the worker.
#[derive(Clone)]
pub struct SimPlatform {
    inner: Arc<SimInner>,
}

impl SimPlatform {
    /// Create an empty simulator bound to the given credentials
    #[must_use]
    pub fn new(api_id: i64, api_hash: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(SimInner {
                api_id,
                api_hash: api_hash.into(),
                accounts: Mutex::new(HashMap::new()),
                dialogs: Mutex::new(Vec::new()),
                authorized: AtomicBool::new(false),
                subscribers: Mutex::new(HashMap::new()),
                sent: Mutex::new(Vec::new()),
                next_send_error: Mutex::new(None),
                next_code_error: Mutex::new(None),
            }),
        }
    }

    /// Register an account that can complete the login flow
    #[must_use]
    pub fn with_account(
        self,
        phone: impl Into<String>,
        code: impl Into<String>,
        password: Option<&str>,
    ) -> Self {
        self.inner.accounts.lock().insert(
            phone.into(),
            SimAccount {
                code: code.into(),
                password: password.map(str::to_string),
            },
        );
        self
    }

    /// Add a dialog to the enumeration result
    #[must_use]
    pub fn with_dialog(self, dialog: Dialog) -> Self {
        self.inner.dialogs.lock().push(dialog);
        self
    }

    /// A seeded instance for local runs: one password-less demo account and
    /// a handful of dialogs
    #[must_use]
    pub fn demo(api_id: i64, api_hash: impl Into<String>) -> Self {
        Self::new(api_id, api_hash)
            .with_account("+10000000000", "12345", None)
            .with_dialog(Dialog {
                id: 1001,
                title: "Announcements".to_string(),
                username: Some("announce".to_string()),
                participants_count: Some(2048),
                kind: DialogKind::Channel,
            })
            .with_dialog(Dialog {
                id: 1002,
                title: "Trading Floor".to_string(),
                username: None,
                participants_count: Some(87),
                kind: DialogKind::Channel,
            })
            .with_dialog(Dialog {
                id: 2001,
                title: "Alice".to_string(),
                username: Some("alice".to_string()),
                participants_count: None,
                kind: DialogKind::User,
            })
    }

    /// Mark the persisted session as already signed in
    pub fn authorize(&self) {
        self.inner.authorized.store(true, Ordering::SeqCst);
    }

    /// Deliver a message into a chat, fanning out to subscribers
    pub fn inject_message(&self, chat_id: i64, text: impl Into<String>) {
        let text = text.into();
        let mut subscribers = self.inner.subscribers.lock();
        if let Some(senders) = subscribers.get_mut(&chat_id) {
            senders.retain(|tx| {
                tx.send(IncomingMessage {
                    chat_id,
                    text: text.clone(),
                })
                .is_ok()
            });
        }
    }

    /// Snapshot of every message sent through any session, in send order
    #[must_use]
    pub fn sent_messages(&self) -> Vec<(i64, String)> {
        self.inner.sent.lock().clone()
    }

    /// Make the next `send_message` fail with `error`
    pub fn fail_next_send(&self, error: PlatformError) {
        *self.inner.next_send_error.lock() = Some(error);
    }

    /// Make the next `send_message` fail with a rate limit of `wait`
    pub fn flood_next_send(&self, wait: Duration) {
        self.fail_next_send(PlatformError::RateLimited { wait });
    }

    /// Make the next `request_login_code` fail with `error`
    pub fn fail_next_code_request(&self, error: PlatformError) {
        *self.inner.next_code_error.lock() = Some(error);
    }

    /// Number of live subscriptions for a chat
    #[must_use]
    pub fn subscriber_count(&self, chat_id: i64) -> usize {
        self.inner
            .subscribers
            .lock()
            .get(&chat_id)
            .map_or(0, Vec::len)
    }
}

#[async_trait]
impl Platform for SimPlatform {
    type Session = SimSession;

    async fn connect(&self) -> PlatformResult<SimSession> {
        if self.inner.api_id <= 0 || self.inner.api_hash.is_empty() {
            return Err(PlatformError::Other("invalid api credentials".to_string()));
        }
        Ok(SimSession {
            inner: Arc::clone(&self.inner),
            pending_phone: Arc::new(Mutex::new(None)),
        })
    }
}

/// Session handle produced by [`SimPlatform`]
#[derive(Clone)]
pub struct SimSession {
    inner: Arc<SimInner>,
    pending_phone: Arc<Mutex<Option<String>>>,
}

#[async_trait]
impl PlatformSession for SimSession {
    async fn is_authorized(&self) -> PlatformResult<bool> {
        Ok(self.inner.authorized.load(Ordering::SeqCst))
    }

    async fn request_login_code(&self, phone: &str) -> PlatformResult<()> {
        if let Some(error) = self.inner.next_code_error.lock().take() {
            return Err(error);
        }
        if !self.inner.accounts.lock().contains_key(phone) {
            return Err(PlatformError::Other(format!(
                "no account registered for {phone}"
            )));
        }
        *self.pending_phone.lock() = Some(phone.to_string());
        Ok(())
    }

    async fn sign_in_code(&self, code: &str) -> PlatformResult<()> {
        let phone = self
            .pending_phone
            .lock()
            .clone()
            .ok_or_else(|| PlatformError::Other("no login code requested".to_string()))?;

        let accounts = self.inner.accounts.lock();
        let account = accounts
            .get(&phone)
            .ok_or_else(|| PlatformError::Other(format!("no account registered for {phone}")))?;

        if account.code != code {
            return Err(PlatformError::InvalidCode);
        }
        if account.password.is_some() {
            return Err(PlatformError::PasswordRequired);
        }
        self.inner.authorized.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn sign_in_password(&self, password: &str) -> PlatformResult<()> {
        let phone = self
            .pending_phone
            .lock()
            .clone()
            .ok_or_else(|| PlatformError::Other("no login code requested".to_string()))?;

        let accounts = self.inner.accounts.lock();
        let account = accounts
            .get(&phone)
            .ok_or_else(|| PlatformError::Other(format!("no account registered for {phone}")))?;

        if account.password.as_deref() != Some(password) {
            return Err(PlatformError::InvalidPassword);
        }
        self.inner.authorized.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn list_dialogs(&self) -> PlatformResult<Vec<Dialog>> {
        Ok(self.inner.dialogs.lock().clone())
    }

    fn subscribe(&self, chat_id: i64) -> mpsc::UnboundedReceiver<IncomingMessage> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.inner
            .subscribers
            .lock()
            .entry(chat_id)
            .or_default()
            .push(tx);
        rx
    }

    fn unsubscribe(&self, chat_id: i64) {
        self.inner.subscribers.lock().remove(&chat_id);
    }

    async fn send_message(&self, chat_id: i64, text: &str) -> PlatformResult<()> {
        if let Some(error) = self.inner.next_send_error.lock().take() {
            return Err(error);
        }
        self.inner.sent.lock().push((chat_id, text.to_string()));
        Ok(())
    }

    async fn disconnect(&self) -> PlatformResult<()> {
        self.inner.subscribers.lock().clear();
        Ok(())
    }
}
