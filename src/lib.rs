//! # keywatch
//!
//! A web control panel that drives an external messaging-platform account:
//! authenticate, list groups, and run a keyword-triggered auto-responder
//! that posts a scripted message sequence when a matching message appears
//! in a target group.
//!
//! ## Architecture
//!
//! Two processes. The supervisor process hosts the HTTP panel and owns the
//! worker's lifecycle; the worker process owns the live platform session.
//! They communicate over three unidirectional queues carried on the
//! worker's stdio as newline-delimited JSON:
//!
//! - commands (supervisor → worker) on the child's stdin;
//! - responses (worker → supervisor, one per command family) and
//! - results (worker → supervisor, fire-and-forget monitor events),
//!   demultiplexed from the child's stdout by the supervisor's reader task.
//!
//! There are no request IDs: a response is correlated to its command by its
//! `type` tag alone, and the supervisor's
//! [`get_response`](supervisor::Supervisor::get_response) filter discards
//! everything else. This assumes one outstanding request at a time, which
//! the panel guarantees.
//!
//! ## Modules
//!
//! - [`protocol`]: command/response/result contracts and the line codec
//! - [`supervisor`]: worker lifecycle and the queue accessors
//! - [`worker`]: the session-owning actor and its state machine
//! - [`platform`]: the messaging-client seam and the in-process simulator
//! - [`server`]: the axum control panel
//! - [`config`]: persisted API credentials
//! - [`error`]: error types

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod platform;
pub mod protocol;
pub mod server;
pub mod supervisor;
pub mod worker;

pub use config::ApiCredentials;
pub use error::{Error, Result};
pub use platform::{Platform, PlatformError, PlatformSession, SimPlatform};
pub use protocol::{
    Command, GroupInfo, MonitorConfig, MonitorEvent, Response, ResponseKind, WorkerMessage,
};
pub use supervisor::Supervisor;

/// Version of the crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
