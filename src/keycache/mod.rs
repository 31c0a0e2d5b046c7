//! Credential lifecycle manager.
//!
//! Holds the unlocked credential for the lifetime of a session and evicts it
//! on request, on teardown or after a period with no visible surface.
//!
//! # State
//!
//! ```text
//!                 install
//!   NoCredential ─────────▶ Active(credential, alarm?)
//!        ▲                       │        │ ▲
//!        │  evict / timeout      │        │ │ install (replace),
//!        └───────────────────────┘        └─┘ surface shown / hidden
//! ```
//!
//! The inactivity alarm is armed iff no surface is visible, a credential is
//! installed and the timeout is enabled. Every transition re-evaluates that
//! condition; the alarm callback checks it once more before evicting, so a
//! late or cancelled fire never evicts.
//!
//! All state lives behind one mutex, and only state and alarm bookkeeping
//! happen while it is held. Foreground changes and broadcasts run after the
//! guard drops; pipeline drains and notification refreshes run on the
//! blocking pool. Collaborators may therefore call back into the cache.

mod alarm;
mod credential;

pub use alarm::{AlarmCallback, AlarmHandle, AlarmScheduler, TokioAlarmScheduler};
pub use credential::Credential;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use tokio::runtime::Handle;

use crate::events::{CoreEvent, EventBus};
use crate::services::{DecryptPipeline, ForegroundGuard, MigrationStatus, Notifier};

/// Default inactivity interval before the credential is evicted.
pub const DEFAULT_TIMEOUT_MINUTES: u64 = 300;

/// When the cache evicts on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LockPolicy {
    pub timeout_enabled: bool,
    pub timeout_minutes: u64,
}

impl Default for LockPolicy {
    fn default() -> Self {
        Self {
            timeout_enabled: false,
            timeout_minutes: DEFAULT_TIMEOUT_MINUTES,
        }
    }
}

impl LockPolicy {
    pub fn enabled(timeout_minutes: u64) -> Self {
        Self {
            timeout_enabled: true,
            timeout_minutes,
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.timeout_minutes.saturating_mul(60))
    }
}

/// Everything the cache notifies or schedules through.
#[derive(Clone)]
pub struct Collaborators {
    pub bus: EventBus,
    pub alarms: Arc<dyn AlarmScheduler>,
    pub pipeline: Arc<dyn DecryptPipeline>,
    pub notifier: Arc<dyn Notifier>,
    pub foreground: Arc<dyn ForegroundGuard>,
    pub migration: Arc<dyn MigrationStatus>,
    /// Runtime whose blocking pool runs drains and refreshes.
    pub runtime: Handle,
}

struct ArmedAlarm {
    id: u64,
    handle: AlarmHandle,
}

struct CacheState {
    credential: Option<Credential>,
    visible_surfaces: usize,
    policy: LockPolicy,
    alarm: Option<ArmedAlarm>,
    next_alarm_id: u64,
}

impl CacheState {
    fn timeout_eligible(&self) -> bool {
        self.visible_surfaces == 0 && self.credential.is_some() && self.policy.timeout_enabled
    }

    fn cancel_alarm(&mut self) {
        if let Some(alarm) = self.alarm.take() {
            debug!("[cancel_alarm] cancelling alarm {}", alarm.id);
            alarm.handle.cancel();
        }
    }
}

struct Shared {
    state: Mutex<CacheState>,
    collaborators: Collaborators,
}

/// Owned credential cache, shared by cloning.
#[derive(Clone)]
pub struct KeyCache {
    shared: Arc<Shared>,
}

impl KeyCache {
    pub fn new(policy: LockPolicy, collaborators: Collaborators) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(CacheState {
                    credential: None,
                    visible_surfaces: 0,
                    policy,
                    alarm: None,
                    next_alarm_id: 0,
                }),
                collaborators,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.shared
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Make `credential` the active one.
    ///
    /// A previously installed, different credential is scrubbed. Unless a
    /// storage upgrade is running, pending ciphertext is drained and
    /// notifications are refreshed in the background. A credential that was
    /// already scrubbed is refused.
    pub fn install(&self, credential: Credential) {
        if credential.is_scrubbed() {
            warn!("[install] refusing a credential that was already scrubbed");
            return;
        }

        let collaborators = &self.shared.collaborators;
        let replaced = {
            let mut state = self.lock();
            let replaced = state.credential.replace(credential.clone());
            self.rearm(&mut state);
            replaced
        };
        collaborators.foreground.raise();
        collaborators
            .bus
            .publish(CoreEvent::CredentialInstalled(credential.clone()));
        info!("[install] credential installed");

        if let Some(old) = replaced {
            if !old.same_as(&credential) {
                debug!("[install] scrubbing replaced credential");
                old.scrub();
            }
        }

        if collaborators.migration.upgrade_in_progress() {
            info!("[install] storage upgrade in progress, skipping drain and refresh");
            return;
        }

        let pipeline = collaborators.pipeline.clone();
        let notifier = collaborators.notifier.clone();
        collaborators.runtime.spawn_blocking(move || {
            pipeline.drain_pending(&credential);
            notifier.refresh(Some(&credential));
        });
    }

    /// Forget and scrub the credential. Always broadcasts, even when nothing
    /// was installed.
    pub fn evict(&self) {
        let removed = {
            let mut state = self.lock();
            Self::evict_locked(&mut state)
        };
        info!("[evict] credential cleared");
        self.finish_eviction(removed);
    }

    /// Evict as the owning process tears down.
    pub fn shutdown(&self) {
        info!("[shutdown] tearing down key cache");
        self.evict();
    }

    /// A surface showing decrypted content became visible.
    pub fn note_surface_visible(&self) {
        let mut state = self.lock();
        state.visible_surfaces += 1;
        debug!(
            "[note_surface_visible] {} visible surfaces",
            state.visible_surfaces
        );
        state.cancel_alarm();
    }

    /// A surface went away. Extra calls are ignored.
    pub fn note_surface_hidden(&self) {
        let mut state = self.lock();
        if state.visible_surfaces == 0 {
            warn!("[note_surface_hidden] no visible surface to hide");
        } else {
            state.visible_surfaces -= 1;
        }
        debug!(
            "[note_surface_hidden] {} visible surfaces",
            state.visible_surfaces
        );
        self.rearm(&mut state);
    }

    /// Snapshot of the current credential.
    pub fn get(&self) -> Option<Credential> {
        self.lock().credential.clone()
    }

    pub fn set_lock_policy(&self, policy: LockPolicy) {
        let mut state = self.lock();
        state.policy = policy;
        info!(
            "[set_lock_policy] timeout_enabled={}, timeout_minutes={}",
            policy.timeout_enabled, policy.timeout_minutes
        );
        self.rearm(&mut state);
    }

    pub fn lock_policy(&self) -> LockPolicy {
        self.lock().policy
    }

    pub fn visible_surfaces(&self) -> usize {
        self.lock().visible_surfaces
    }

    pub fn is_timeout_armed(&self) -> bool {
        self.lock().alarm.is_some()
    }

    fn rearm(&self, state: &mut CacheState) {
        state.cancel_alarm();
        if !state.timeout_eligible() {
            return;
        }

        let id = state.next_alarm_id;
        state.next_alarm_id += 1;

        let weak: Weak<Shared> = Arc::downgrade(&self.shared);
        let handle = self.shared.collaborators.alarms.arm(
            state.policy.interval(),
            Box::new(move || {
                if let Some(shared) = weak.upgrade() {
                    KeyCache { shared }.on_alarm(id);
                }
            }),
        );
        debug!(
            "[rearm] alarm {id} armed for {} minutes",
            state.policy.timeout_minutes
        );
        state.alarm = Some(ArmedAlarm { id, handle });
    }

    fn on_alarm(&self, id: u64) {
        let removed = {
            let mut state = self.lock();
            match &state.alarm {
                Some(alarm) if alarm.id == id => {}
                _ => {
                    debug!("[on_alarm] ignoring stale alarm {id}");
                    return;
                }
            }
            state.alarm = None;
            if !state.timeout_eligible() {
                debug!("[on_alarm] no longer eligible, ignoring alarm {id}");
                return;
            }
            Self::evict_locked(&mut state)
        };
        info!("[on_alarm] inactivity timeout reached, credential cleared");
        self.finish_eviction(removed);
    }

    fn evict_locked(state: &mut CacheState) -> Option<Credential> {
        state.cancel_alarm();
        state.credential.take()
    }

    /// Runs with the lock released.
    fn finish_eviction(&self, removed: Option<Credential>) {
        if let Some(credential) = removed {
            credential.scrub();
        }
        let collaborators = &self.shared.collaborators;
        collaborators.foreground.lower();
        collaborators.bus.publish(CoreEvent::CredentialCleared);

        let notifier = self.shared.collaborators.notifier.clone();
        self.shared.collaborators.runtime.spawn_blocking(move || {
            notifier.refresh(None);
        });
    }
}
