//! Collaborators the core drives but does not own.
//!
//! Every call is fire-and-forget: implementations catch and log their own
//! failures. The key cache invokes them off its lock and off the calling
//! thread, with a snapshot of the credential.

use intake::InboundPayload;

use crate::keycache::Credential;
use crate::message::{Classifier, MessageRecord, RecordKey};

/// Secure message pipeline that decrypts stored ciphertext.
pub trait DecryptPipeline: Send + Sync + 'static {
    /// Queue an inbound payload for decryption and storage.
    ///
    /// # Arguments
    /// * `payload` - The payload the intake filter claimed
    fn enqueue_for_decryption(&self, payload: InboundPayload);

    /// Decrypt everything that queued up while no credential was available.
    ///
    /// # Arguments
    /// * `credential` - Snapshot of the credential just installed
    fn drain_pending(&self, credential: &Credential);
}

/// Notification service.
pub trait Notifier: Send + Sync + 'static {
    /// Rebuild notifications. `None` means content must be hidden.
    fn refresh(&self, credential: Option<&Credential>);
}

/// Keeps the process at raised priority while a credential is held.
pub trait ForegroundGuard: Send + Sync + 'static {
    fn raise(&self);
    fn lower(&self);
}

/// Storage migration state.
pub trait MigrationStatus: Send + Sync + 'static {
    /// A storage schema upgrade is running.
    fn upgrade_in_progress(&self) -> bool;

    /// Messages from the legacy store have been imported.
    fn legacy_import_complete(&self) -> bool;
}

/// Reads one stored message into a classified record.
pub trait RecordReader: Send + Sync + 'static {
    /// # Arguments
    /// * `classifier` - The core's classifier; records must be built with it
    /// * `key` - Store and row id of the message
    /// * `credential` - Snapshot of the active credential, if any
    fn read(
        &self,
        classifier: &Classifier,
        key: RecordKey,
        credential: Option<&Credential>,
    ) -> Option<MessageRecord>;
}

/// Foreground guard for hosts without a priority concept.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopForeground;

impl ForegroundGuard for NoopForeground {
    fn raise(&self) {}

    fn lower(&self) {}
}

/// Migration status for a store that has never needed migrating.
#[derive(Debug, Default, Clone, Copy)]
pub struct MigrationComplete;

impl MigrationStatus for MigrationComplete {
    fn upgrade_in_progress(&self) -> bool {
        false
    }

    fn legacy_import_complete(&self) -> bool {
        true
    }
}
