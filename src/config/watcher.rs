//! Configuration file watcher for admission policy hot reload.
//!
//! # Responsibilities
//! - Watch the config file's directory so editor save-by-rename is seen
//! - Collapse the burst of events one save produces into a single reload
//! - Forward the `admission` section only when it actually changed
//!
//! Other sections (listener, database, timeouts) need a restart and are
//! not forwarded.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::load_config;
use crate::config::schema::AdmissionConfig;

/// Quiet period after the last file event before the file is re-read.
pub const DEBOUNCE: Duration = Duration::from_millis(250);

/// Watches one config file and emits changed admission policies.
pub struct ConfigWatcher {
    path: PathBuf,
    current: AdmissionConfig,
    update_tx: mpsc::UnboundedSender<AdmissionConfig>,
}

impl ConfigWatcher {
    /// `current` is the admission section already in force; it is the
    /// baseline the first reload is compared against.
    pub fn new(
        path: &Path,
        current: AdmissionConfig,
    ) -> (Self, mpsc::UnboundedReceiver<AdmissionConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        let watcher = Self {
            path: path.to_path_buf(),
            current,
            update_tx,
        };
        (watcher, update_rx)
    }

    /// Start watching. Must be called inside a tokio runtime.
    ///
    /// The returned watcher must be kept alive for events to keep flowing.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let file_name = self.path.file_name().map(OsString::from).ok_or_else(|| {
            notify::Error::generic("config path has no file name")
                .add_path(self.path.clone())
        })?;
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    let touches_file = event
                        .paths
                        .iter()
                        .any(|p| p.file_name() == Some(file_name.as_os_str()));
                    if touches_file && (event.kind.is_modify() || event.kind.is_create()) {
                        let _ = event_tx.send(());
                    }
                }
                Err(e) => tracing::error!(error = %e, "Config watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;
        watcher.watch(&dir, RecursiveMode::NonRecursive)?;

        tracing::info!(path = %self.path.display(), "Config watcher started");
        tokio::spawn(forward_changes(
            self.path,
            event_rx,
            self.current,
            self.update_tx,
        ));
        Ok(watcher)
    }
}

/// Reload `path` once per burst of `events` and send the admission section
/// when it differs from the last one sent.
///
/// Returns when either channel closes.
pub async fn forward_changes(
    path: PathBuf,
    mut events: mpsc::UnboundedReceiver<()>,
    mut current: AdmissionConfig,
    updates: mpsc::UnboundedSender<AdmissionConfig>,
) {
    let mut open = true;
    while open && events.recv().await.is_some() {
        loop {
            match tokio::time::timeout(DEBOUNCE, events.recv()).await {
                Ok(Some(())) => continue,
                Ok(None) => {
                    open = false;
                    break;
                }
                Err(_) => break,
            }
        }

        match load_config(&path) {
            Ok(config) if config.admission == current => {
                tracing::debug!(path = %path.display(), "Config changed outside admission, nothing to reload");
            }
            Ok(config) => {
                tracing::info!(path = %path.display(), "Admission section changed, forwarding new policy");
                current = config.admission.clone();
                if updates.send(config.admission).is_err() {
                    break;
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to reload config, keeping current policy");
            }
        }
    }
}
