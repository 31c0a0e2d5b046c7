//! One-shot timers used for the inactivity timeout.
//!
//! Provides an [`AlarmScheduler`] trait and a default [`TokioAlarmScheduler`]
//! that sleeps on the runtime. Tests substitute a manual scheduler and fire
//! alarms by hand.

use std::time::Duration;

use log::debug;
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;

/// Callback run when an alarm fires.
pub type AlarmCallback = Box<dyn FnOnce() + Send + 'static>;

/// Cancels a pending alarm. Dropping the handle does not cancel.
#[derive(Debug, Clone)]
pub struct AlarmHandle {
    token: CancellationToken,
}

impl AlarmHandle {
    pub fn new(token: CancellationToken) -> Self {
        Self { token }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

/// Trait for arming one-shot alarms.
///
/// A callback may still run after its handle is cancelled if the two race;
/// callers must tolerate a late fire.
pub trait AlarmScheduler: Send + Sync + 'static {
    /// Run `on_fire` once `after` has elapsed, unless cancelled first.
    fn arm(&self, after: Duration, on_fire: AlarmCallback) -> AlarmHandle;
}

/// Alarm scheduler backed by `tokio::time::sleep`.
pub struct TokioAlarmScheduler {
    runtime: Handle,
}

impl TokioAlarmScheduler {
    pub fn new(runtime: Handle) -> Self {
        Self { runtime }
    }

    /// Scheduler on the runtime of the calling task. Panics outside a runtime.
    pub fn current() -> Self {
        Self::new(Handle::current())
    }
}

impl AlarmScheduler for TokioAlarmScheduler {
    fn arm(&self, after: Duration, on_fire: AlarmCallback) -> AlarmHandle {
        let token = CancellationToken::new();
        let cancelled = token.clone();
        self.runtime.spawn(async move {
            tokio::select! {
                biased;
                _ = cancelled.cancelled() => {
                    debug!("[arm] alarm cancelled");
                }
                _ = tokio::time::sleep(after) => {
                    on_fire();
                }
            }
        });
        AlarmHandle::new(token)
    }
}
