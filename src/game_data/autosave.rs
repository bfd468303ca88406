//! Debounced autosave
//!
//! A save request waits out the debounce interval before it is honoured,
//! and two saves are never closer together than the interval. Any number
//! of dirty marks inside one window collapse into a single save of the
//! then-current state.
//!
//! `AutosaveScheduler` is the pure timing logic over a `Clock`; `spawn`
//! drives it from a worker thread for documents shared behind a mutex.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use super::document::GameData;

/// Minimum time between a save request and the save, and between saves
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);

/// How often the worker thread re-checks the document
pub const DEFAULT_TICK: Duration = Duration::from_millis(100);

/// Time source, swappable for tests
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

pub struct AutosaveScheduler {
    clock: Arc<dyn Clock>,
    interval: Duration,
    requested_at: Option<Instant>,
    last_save: Option<Instant>,
}

impl AutosaveScheduler {
    pub fn new(clock: Arc<dyn Clock>, interval: Duration) -> Self {
        AutosaveScheduler {
            clock,
            interval,
            requested_at: None,
            last_save: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Feeds the current dirty state; returns true when a save is due now
    pub fn observe(&mut self, dirty: bool) -> bool {
        if !dirty {
            self.requested_at = None;
            return false;
        }

        let now = self.clock.now();
        let requested = *self.requested_at.get_or_insert(now);
        let waited = now.duration_since(requested) >= self.interval;
        let spaced = self
            .last_save
            .is_none_or(|last| now.duration_since(last) >= self.interval);
        waited && spaced
    }

    /// Records a completed save
    pub fn mark_saved(&mut self) {
        self.last_save = Some(self.clock.now());
        self.requested_at = None;
    }
}

impl Default for AutosaveScheduler {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock), DEFAULT_INTERVAL)
    }
}

/// Generation counter shared between an owner and its autosave loops
///
/// Each `spawn` takes a new generation; loops holding an older one exit
/// at their next check without writing.
#[derive(Debug, Clone, Default)]
pub struct AutosaveToken {
    generation: Arc<AtomicU64>,
}

impl AutosaveToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Invalidates every running loop and returns the new generation
    pub fn renew(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }
}

/// Runs the autosave loop for `data` on a worker thread
///
/// The loop holds only a weak reference, so it also exits once the last
/// owner drops the document.
pub fn spawn(
    data: &Arc<Mutex<GameData>>,
    token: &AutosaveToken,
    tick: Duration,
) -> std::io::Result<JoinHandle<()>> {
    let generation = token.renew();
    let token = token.clone();
    let weak: Weak<Mutex<GameData>> = Arc::downgrade(data);

    thread::Builder::new()
        .name("gamevault-autosave".to_string())
        .spawn(move || {
            log::debug!("Autosave loop {} started", generation);
            loop {
                thread::sleep(tick);
                if token.current() != generation {
                    break;
                }
                let Some(data) = weak.upgrade() else {
                    break;
                };
                let mut data = data.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
                // Re-check under the lock: a renewal may have raced the sleep
                if token.current() != generation {
                    break;
                }
                if let Err(e) = data.poll_autosave() {
                    log::error!("Autosave of '{}' failed: {}", data.name(), e);
                }
            }
            log::debug!("Autosave loop {} stopped", generation);
        })
}
