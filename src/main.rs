// Control panel binary.
//
// Default mode serves the HTTP panel and supervises the worker child
// process. Invoked with the `worker` argument (as the supervisor does) it
// becomes that worker: it owns the platform session and speaks the
// command/response protocol over its own stdio.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Result;

use keywatch::platform::SimPlatform;
use keywatch::server::{self, AppState};
use keywatch::supervisor::{ENV_API_HASH, ENV_API_ID, WORKER_ARG};
use keywatch::{config, worker};

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if std::env::args().nth(1).as_deref() == Some(WORKER_ARG) {
        return run_worker().await;
    }
    serve_panel().await
}

async fn run_worker() -> Result<()> {
    let api_id = std::env::var(ENV_API_ID)
        .ok()
        .and_then(|value| value.parse::<i64>().ok())
        .unwrap_or(0);
    let api_hash = std::env::var(ENV_API_HASH).unwrap_or_default();

    // The built-in backend is the deterministic simulator; a real client
    // implements `keywatch::platform::Platform` and slots in here.
    let platform = SimPlatform::demo(api_id, api_hash);
    worker::run(platform).await?;
    Ok(())
}

async fn serve_panel() -> Result<()> {
    let addr: SocketAddr = std::env::var("KEYWATCH_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:8000".to_string())
        .parse()?;
    let state = AppState::new(PathBuf::from(config::CONFIG_FILE));

    log::info!("control panel listening on http://{addr}");
    server::serve(state, addr).await
}
