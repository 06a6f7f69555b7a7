//! Polling watcher over the per-family configuration files.
//!
//! Compares modification times on an interval and raises one
//! [`ConfigChange`] per family whose file changed.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::application::{ConfigChange, ReloadCoordinator};
use crate::domain::Family;
use crate::infrastructure::config::ConfigStore;

pub struct ConfigWatcher {
    store: Arc<ConfigStore>,
    coordinator: Arc<ReloadCoordinator>,
    interval: Duration,
    seen: HashMap<Family, SystemTime>,
}

fn modified(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

impl ConfigWatcher {
    /// Record the current modification times as the baseline.
    #[must_use]
    pub fn new(store: Arc<ConfigStore>, coordinator: Arc<ReloadCoordinator>, interval: Duration) -> Self {
        let seen = Family::ALL
            .into_iter()
            .filter_map(|family| modified(&store.path(family)).map(|t| (family, t)))
            .collect();
        Self {
            store,
            coordinator,
            interval,
            seen,
        }
    }

    /// Families whose file was created or modified since the last poll.
    ///
    /// A removed file is not a change; the last loaded configuration stays.
    pub fn poll(&mut self) -> Vec<Family> {
        let mut changed = Vec::new();
        for family in Family::ALL {
            let path = self.store.path(family);
            match modified(&path) {
                Some(time) if self.seen.get(&family) != Some(&time) => {
                    self.seen.insert(family, time);
                    changed.push(family);
                }
                None if self.seen.remove(&family).is_some() => {
                    warn!(family = %family, path = %path.display(), "Config file removed; keeping last configuration");
                }
                _ => {}
            }
        }
        changed
    }

    /// Poll forever, dispatching every change to the coordinator.
    pub fn spawn(mut self) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!(
                dir = %self.store.dir().display(),
                interval_ms = self.interval.as_millis() as u64,
                "Watching config directory"
            );
            let mut interval = tokio::time::interval(self.interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                for family in self.poll() {
                    info!(family = %family, "Config file changed");
                    let tasks = self.coordinator.notify_changed(ConfigChange { family });
                    debug!(family = %family, handlers = tasks.len(), "Change dispatched");
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use std::fs::{self, File};

    use super::*;

    fn touch(path: &Path, offset_secs: u64) {
        let file = File::options().write(true).open(path).unwrap();
        file.set_modified(SystemTime::now() + Duration::from_secs(offset_secs))
            .unwrap();
    }

    #[test]
    fn detects_modified_and_created_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(ConfigStore::new(dir.path()));
        fs::write(store.path(Family::Redis), "[redis]\n").unwrap();

        let mut watcher = ConfigWatcher::new(
            Arc::clone(&store),
            Arc::new(ReloadCoordinator::new()),
            Duration::from_secs(1),
        );
        assert!(watcher.poll().is_empty());

        touch(&store.path(Family::Redis), 30);
        assert_eq!(watcher.poll(), vec![Family::Redis]);
        assert!(watcher.poll().is_empty());

        fs::write(store.path(Family::MySql), "[mysql]\n").unwrap();
        assert_eq!(watcher.poll(), vec![Family::MySql]);
    }

    #[test]
    fn removal_is_not_a_change() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(ConfigStore::new(dir.path()));
        fs::write(store.path(Family::Kafka), "[kafka]\n").unwrap();
        let mut watcher = ConfigWatcher::new(
            Arc::clone(&store),
            Arc::new(ReloadCoordinator::new()),
            Duration::from_secs(1),
        );

        fs::remove_file(store.path(Family::Kafka)).unwrap();
        assert!(watcher.poll().is_empty());
    }
}
