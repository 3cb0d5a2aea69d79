//! Supervisor: worker process lifecycle and the synchronous-call contract
//!
//! The supervisor owns no platform client. It spawns the worker as an
//! isolated child process, speaks newline-delimited JSON over the child's
//! stdio, and exposes blocking-with-timeout accessors over the two inbound
//! queues (responses and results) that its reader task demultiplexes from
//! the worker's stdout.

mod lifecycle;
mod queues;
mod reader;

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::process::{Child, ChildStdin};
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;

use crate::config::ApiCredentials;
use crate::error::Result;
use crate::protocol::{MonitorEvent, Response};

/// Environment variable carrying the numeric API ID into the worker
pub const ENV_API_ID: &str = "KEYWATCH_API_ID";

/// Environment variable carrying the API hash into the worker
pub const ENV_API_HASH: &str = "KEYWATCH_API_HASH";

/// Argument that switches the binary into worker mode
pub const WORKER_ARG: &str = "worker";

/// Manager of the single worker process
///
/// One supervisor owns at most one worker. Construct it with the account
/// credentials, [`start()`](Supervisor::start) it, then drive it with
/// [`send_command`](Supervisor::send_command) /
/// [`get_response`](Supervisor::get_response) /
/// [`check_results`](Supervisor::check_results).
pub struct Supervisor {
    credentials: ApiCredentials,
    worker_program: PathBuf,
    worker_args: Vec<String>,
    child: Mutex<Option<Child>>,
    stdin: Mutex<Option<ChildStdin>>,
    responses: Mutex<Option<mpsc::UnboundedReceiver<Response>>>,
    results: Mutex<Option<mpsc::UnboundedReceiver<MonitorEvent>>>,
    reader_task: Mutex<Option<JoinHandle<()>>>,
    stderr_task: Mutex<Option<JoinHandle<()>>>,
    running: AtomicBool,
}

impl Supervisor {
    /// Create a supervisor whose worker is this binary in worker mode
    ///
    /// # Errors
    /// Returns error if the current executable path cannot be resolved
    pub fn new(credentials: ApiCredentials) -> Result<Self> {
        let program = std::env::current_exe()?;
        Ok(Self::with_program(
            credentials,
            program,
            vec![WORKER_ARG.to_string()],
        ))
    }

    /// Create a supervisor around an arbitrary worker program
    ///
    /// The program must speak the worker protocol: commands on stdin,
    /// [`WorkerMessage`](crate::protocol::WorkerMessage) lines on stdout.
    #[must_use]
    pub fn with_program(
        credentials: ApiCredentials,
        program: PathBuf,
        args: Vec<String>,
    ) -> Self {
        Self {
            credentials,
            worker_program: program,
            worker_args: args,
            child: Mutex::new(None),
            stdin: Mutex::new(None),
            responses: Mutex::new(None),
            results: Mutex::new(None),
            reader_task: Mutex::new(None),
            stderr_task: Mutex::new(None),
            running: AtomicBool::new(false),
        }
    }

    /// Whether the worker process is considered running
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}
