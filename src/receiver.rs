//! Effectful side of transport intake.
//!
//! [`SmsReceiver`] runs the pure intake filter and acts on its verdict:
//! challenges go out on the event bus, relevant payloads are handed to the
//! decrypt pipeline exactly once and everything else passes through to the
//! system untouched.

use std::sync::{Arc, PoisonError, RwLock};

use intake::{filter_intake, InboundPayload, Intake, IntakeConfig};
use log::{debug, info};

use crate::events::{CoreEvent, EventBus};
use crate::services::{DecryptPipeline, MigrationStatus};

/// What the transport should do with the payload after intake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Claimed; stop delivering it to anyone else.
    Aborted,
    /// Not ours; let it continue to the system inbox.
    PassThrough,
}

/// Intake switches that may change while the receiver runs.
#[derive(Debug, Clone, Default)]
pub struct IntakeSettings {
    inner: Arc<RwLock<IntakeConfig>>,
}

impl IntakeSettings {
    pub fn new(config: IntakeConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(config)),
        }
    }

    pub fn snapshot(&self) -> IntakeConfig {
        *self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_accept_all(&self, accept_all: bool) {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .accept_all = accept_all;
    }

    pub fn set_awaiting_verification(&self, awaiting: bool) {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .awaiting_verification = awaiting;
    }
}

pub struct SmsReceiver {
    settings: IntakeSettings,
    bus: EventBus,
    pipeline: Arc<dyn DecryptPipeline>,
    migration: Arc<dyn MigrationStatus>,
}

impl SmsReceiver {
    pub fn new(
        settings: IntakeSettings,
        bus: EventBus,
        pipeline: Arc<dyn DecryptPipeline>,
        migration: Arc<dyn MigrationStatus>,
    ) -> Self {
        Self {
            settings,
            bus,
            pipeline,
            migration,
        }
    }

    pub fn settings(&self) -> &IntakeSettings {
        &self.settings
    }

    /// Handle one inbound payload.
    pub fn on_receive(&self, payload: InboundPayload) -> Disposition {
        let config = self.settings.snapshot();
        let migration = &self.migration;
        let verdict = filter_intake(&payload, &config, || migration.legacy_import_complete());

        match verdict {
            Intake::Challenge(code) => {
                info!("[on_receive] verification challenge received");
                self.bus.publish(CoreEvent::ChallengeReceived(code));
                Disposition::Aborted
            }
            Intake::Relevant => {
                debug!(
                    "[on_receive] queueing payload from {}",
                    payload.origin().unwrap_or_default()
                );
                self.pipeline.enqueue_for_decryption(payload);
                Disposition::Aborted
            }
            Intake::Exempt(reason) => {
                debug!("[on_receive] passing through: {reason}");
                Disposition::PassThrough
            }
        }
    }
}
