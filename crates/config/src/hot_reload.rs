//! Hot-reload: polls the config file's mtime, validates a reload
//! candidate, and swaps the active snapshot atomically so coordinators never
//! observe a torn read. Polling rather than a filesystem-watcher dependency
//! keeps this to the same small dependency surface as the rest of the crate.

use crate::settings::{load_settings, Settings};
use crate::ConfigError;
use parking_lot::RwLock;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::sync::watch;

pub struct ConfigWatcher {
    path: PathBuf,
    current: Arc<RwLock<Arc<Settings>>>,
    last_mtime: RwLock<Option<SystemTime>>,
    changed_tx: watch::Sender<u64>,
    changed_rx: watch::Receiver<u64>,
    generation: std::sync::atomic::AtomicU64,
}

impl ConfigWatcher {
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let settings = load_settings(Some(&path))?;
        let mtime = std::fs::metadata(&path).ok().and_then(|m| m.modified().ok());
        let (tx, rx) = watch::channel(0);
        Ok(Self {
            path,
            current: Arc::new(RwLock::new(Arc::new(settings))),
            last_mtime: RwLock::new(mtime),
            changed_tx: tx,
            changed_rx: rx,
            generation: std::sync::atomic::AtomicU64::new(0),
        })
    }

    pub fn snapshot(&self) -> Arc<Settings> {
        self.current.read().clone()
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.changed_rx.clone()
    }

    /// Check the file's mtime; if changed, load + validate + swap. Returns
    /// `Ok(true)` if a new snapshot was published, `Ok(false)` if unchanged.
    /// A reload that fails validation leaves the previous snapshot active
    /// A reload that fails validation leaves the previous snapshot active.
    pub fn poll_once(&self) -> Result<bool, ConfigError> {
        let mtime = std::fs::metadata(&self.path)
            .ok()
            .and_then(|m| m.modified().ok());
        let changed = {
            let last = self.last_mtime.read();
            mtime != *last
        };
        if !changed {
            return Ok(false);
        }
        let new_settings = load_settings(Some(&self.path))?;
        let old = self.current.read().clone();
        tracing::info!(
            path = %self.path.display(),
            old_environment = ?old.environment,
            new_environment = ?new_settings.environment,
            "reloading configuration"
        );
        {
            let mut guard = self.current.write();
            *guard = Arc::new(new_settings);
        }
        *self.last_mtime.write() = mtime;
        let gen = self.generation.fetch_add(1, std::sync::atomic::Ordering::SeqCst) + 1;
        let _ = self.changed_tx.send(gen);
        Ok(true)
    }

    /// Spawn a background task polling every `interval`. Errors are logged,
    /// not propagated — a malformed on-disk edit must never crash the
    /// running process, only fail to take effect.
    pub fn spawn_polling(self: Arc<Self>, interval: Duration) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                if let Err(err) = self.poll_once() {
                    tracing::warn!(error = %err, "configuration reload rejected, keeping previous snapshot");
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn poll_detects_and_validates_change() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[webapi]\nport = 9000\n").unwrap();
        let watcher = ConfigWatcher::new(file.path()).unwrap();
        assert_eq!(watcher.snapshot().webapi.port, 9000);

        std::thread::sleep(Duration::from_millis(10));
        let mut file2 = std::fs::OpenOptions::new().write(true).truncate(true).open(file.path()).unwrap();
        writeln!(file2, "[webapi]\nport = 9100\n").unwrap();
        drop(file2);

        let changed = watcher.poll_once().unwrap();
        assert!(changed);
        assert_eq!(watcher.snapshot().webapi.port, 9100);
    }

    #[test]
    fn invalid_reload_keeps_previous_snapshot() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[wake_word]\nthreshold = 0.5\n").unwrap();
        let watcher = ConfigWatcher::new(file.path()).unwrap();

        std::thread::sleep(Duration::from_millis(10));
        let mut file2 = std::fs::OpenOptions::new().write(true).truncate(true).open(file.path()).unwrap();
        writeln!(file2, "[wake_word]\nthreshold = 5.0\n").unwrap();
        drop(file2);

        let result = watcher.poll_once();
        assert!(result.is_err());
        assert_eq!(watcher.snapshot().wake_word.threshold, 0.5);
    }
}
