//! Protocol message types and line codec
//!
//! Defines the command/response/result contract spoken between the
//! supervisor and the worker process, and the newline-delimited JSON
//! framing used to carry it over the worker's stdio.

pub mod codec;
pub mod messages;

pub use codec::{decode_line, encode_line};
pub use messages::{
    Command, GroupInfo, MonitorConfig, MonitorEvent, Response, ResponseKind, WorkerMessage,
};
