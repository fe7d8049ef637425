use parking_lot::Mutex;
use tokio::sync::Notify;
use tracing::{trace, warn};

#[derive(Debug, Default)]
struct Level {
    secs: f64,
    high_water: f64,
}

/// Seconds of media buffered between the fetcher and the player.
///
/// The fetcher is the only writer that increases the level and the player
/// the only one that decreases it. Every read-modify-write happens under
/// one lock; draining wakes a fetcher blocked in [`wait_for_headroom`].
///
/// [`wait_for_headroom`]: BufferModel::wait_for_headroom
#[derive(Debug)]
pub struct BufferModel {
    capacity_secs: f64,
    level: Mutex<Level>,
    drained: Notify,
}

impl BufferModel {
    pub fn new(capacity_secs: f64) -> Self {
        Self {
            capacity_secs,
            level: Mutex::new(Level::default()),
            drained: Notify::new(),
        }
    }

    pub fn capacity_secs(&self) -> f64 {
        self.capacity_secs
    }

    pub fn level_secs(&self) -> f64 {
        self.level.lock().secs
    }

    /// Highest level ever reached.
    pub fn high_water_secs(&self) -> f64 {
        self.level.lock().high_water
    }

    pub fn has_headroom(&self, needed_secs: f64) -> bool {
        self.capacity_secs - self.level.lock().secs >= needed_secs
    }

    /// Add `secs` and return the new level.
    pub fn fill(&self, secs: f64) -> f64 {
        let mut level = self.level.lock();
        level.secs += secs;
        level.high_water = level.high_water.max(level.secs);
        trace!(level = level.secs, added = secs, "buffer filled");
        level.secs
    }

    /// Remove `secs`, clamping at zero, and return the new level.
    pub fn drain(&self, secs: f64) -> f64 {
        let new_level = {
            let mut level = self.level.lock();
            if secs > level.secs {
                warn!(
                    level = level.secs,
                    requested = secs,
                    "buffer drain below zero, clamping"
                );
                level.secs = 0.0;
            } else {
                level.secs -= secs;
            }
            level.secs
        };
        self.drained.notify_waiters();
        trace!(level = new_level, removed = secs, "buffer drained");
        new_level
    }

    /// Wait until `needed_secs` fit under capacity and return the level seen.
    pub async fn wait_for_headroom(&self, needed_secs: f64) -> f64 {
        loop {
            let notified = self.drained.notified();
            tokio::pin!(notified);
            // Register before checking so a drain between the check and the
            // await is not lost.
            notified.as_mut().enable();

            {
                let level = self.level.lock();
                if self.capacity_secs - level.secs >= needed_secs {
                    return level.secs;
                }
                trace!(level = level.secs, needed_secs, "waiting for buffer headroom");
            }

            notified.await;
        }
    }
}
