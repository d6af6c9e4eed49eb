//! Endpoint table hot reload.
//!
//! Each content change to the config file is reloaded and compiled into a
//! fresh [`EndpointRouter`] here, on the notify thread. Only tables that
//! compile reach the server, which swaps them in without touching
//! listener, quota or auth settings.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::event::ModifyKind;
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::{load_config, ConfigError};
use crate::routing::EndpointRouter;

const POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Watches the config file and publishes compiled endpoint tables.
pub struct ConfigWatcher {
    path: PathBuf,
    tables: mpsc::UnboundedSender<EndpointRouter>,
}

impl ConfigWatcher {
    /// Returns the watcher and the receiving end the server listens on.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<EndpointRouter>) {
        let (tables, tables_rx) = mpsc::unbounded_channel();
        (
            Self {
                path: path.to_path_buf(),
                tables,
            },
            tables_rx,
        )
    }

    /// Start watching. The returned watcher must be kept alive.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let Self { path, tables } = self;
        let reload_path = path.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if is_content_change(&event.kind) => {
                    tracing::info!(path = ?reload_path, "Config file changed");
                    publish(&reload_path, &tables);
                }
                Ok(_) => {}
                Err(e) => tracing::error!(error = %e, "Config watch failed"),
            },
            Config::default().with_poll_interval(POLL_INTERVAL),
        )?;
        watcher.watch(&path, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?path, "Config watcher started");
        Ok(watcher)
    }
}

/// Load `path` and compile its endpoint table.
pub fn compile_endpoints(path: &Path) -> Result<EndpointRouter, ConfigError> {
    let config = load_config(path)?;
    EndpointRouter::from_config(&config.endpoints)
}

fn is_content_change(kind: &EventKind) -> bool {
    match kind {
        EventKind::Modify(ModifyKind::Metadata(_)) => false,
        EventKind::Modify(_) | EventKind::Create(_) => true,
        _ => false,
    }
}

/// Returns whether a table was handed to the server.
fn publish(path: &Path, tables: &mpsc::UnboundedSender<EndpointRouter>) -> bool {
    let table = match compile_endpoints(path) {
        Ok(table) => table,
        Err(e) => {
            tracing::error!(error = %e, "Rejected config reload. Keeping current endpoints.");
            return false;
        }
    };

    let endpoints = table.len();
    match tables.send(table) {
        Ok(()) => {
            tracing::info!(endpoints, "Reloaded endpoint table published");
            true
        }
        Err(_) => {
            tracing::warn!("Server no longer accepts endpoint tables; reload dropped");
            false
        }
    }
}
