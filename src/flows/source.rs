use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use anyhow::{bail, Result};
use crossbeam_channel::Sender;
use crossbeam_channel::TrySendError::*;
use log::{debug, warn};
use super::Connection;

/// Polls a conntrack dump file and forwards each snapshot.
pub struct Source {
    path:     PathBuf,
    interval: Duration,
    tx:       Sender<Vec<Connection>>,
    shutdown: Arc<AtomicBool>,
}

impl Source {
    pub fn watch(path: PathBuf, interval: Duration, tx: Sender<Vec<Connection>>, shutdown: Arc<AtomicBool>) -> Result<JoinHandle<()>> {
        if interval == Duration::from_secs(0) {
            bail!("poll interval must be positive");
        }

        let source = Self { path, interval, tx, shutdown };
        Ok(thread::Builder::new().name("source".into()).spawn(move || {
            source.poll();
        })?)
    }

    fn poll(&self) {
        while !self.shutdown.load(Ordering::Acquire) {
            match read(&self.path) {
                Ok(conns) => {
                    debug!("polled {} connections", conns.len());
                    match self.tx.try_send(conns) {
                        Ok(_)                => (),
                        Err(Full(_))         => warn!("source channel full"),
                        Err(Disconnected(_)) => return,
                    }
                },
                Err(e) => warn!("failed to read {}: {}", self.path.display(), e),
            }
            thread::sleep(self.interval);
        }
    }
}

pub fn read(path: &Path) -> Result<Vec<Connection>> {
    let data = fs::read(path)?;
    Ok(serde_json::from_slice(&data)?)
}
