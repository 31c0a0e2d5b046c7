#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use sms_trust::intake::InboundPayload;
use sms_trust::message::{Body, Classifier, MessageRecord, MessageTypeMask, RecordKey};
use sms_trust::services::{
    DecryptPipeline, ForegroundGuard, MigrationStatus, Notifier, RecordReader,
};
use sms_trust::{CoreServices, Credential, Recipient, Recipients};

#[derive(Default)]
pub struct RecordingPipeline {
    pub queued: Mutex<Vec<InboundPayload>>,
    pub drains: AtomicUsize,
}

impl DecryptPipeline for RecordingPipeline {
    fn enqueue_for_decryption(&self, payload: InboundPayload) {
        self.queued.lock().unwrap().push(payload);
    }

    fn drain_pending(&self, _credential: &Credential) {
        self.drains.fetch_add(1, Ordering::SeqCst);
    }
}

/// Records `true` for a refresh with a credential, `false` without.
#[derive(Default)]
pub struct RecordingNotifier {
    pub refreshes: Mutex<Vec<bool>>,
}

impl Notifier for RecordingNotifier {
    fn refresh(&self, credential: Option<&Credential>) {
        self.refreshes.lock().unwrap().push(credential.is_some());
    }
}

#[derive(Default)]
pub struct CountingForeground {
    pub raised: AtomicUsize,
    pub lowered: AtomicUsize,
}

impl ForegroundGuard for CountingForeground {
    fn raise(&self) {
        self.raised.fetch_add(1, Ordering::SeqCst);
    }

    fn lower(&self) {
        self.lowered.fetch_add(1, Ordering::SeqCst);
    }
}

pub struct Migration {
    pub upgrading: AtomicBool,
    pub imported: AtomicBool,
}

impl Default for Migration {
    fn default() -> Self {
        Self {
            upgrading: AtomicBool::new(false),
            imported: AtomicBool::new(true),
        }
    }
}

impl MigrationStatus for Migration {
    fn upgrade_in_progress(&self) -> bool {
        self.upgrading.load(Ordering::SeqCst)
    }

    fn legacy_import_complete(&self) -> bool {
        self.imported.load(Ordering::SeqCst)
    }
}

/// Stored rows: mask, native status and body.
#[derive(Default)]
pub struct MapStore {
    pub rows: Mutex<HashMap<RecordKey, (u64, i32, Body)>>,
    pub reads: AtomicUsize,
}

impl MapStore {
    pub fn insert(&self, key: RecordKey, mask: u64, status: i32, body: Body) {
        self.rows.lock().unwrap().insert(key, (mask, status, body));
    }
}

impl RecordReader for MapStore {
    fn read(
        &self,
        classifier: &Classifier,
        key: RecordKey,
        _credential: Option<&Credential>,
    ) -> Option<MessageRecord> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let (mask, status, body) = self.rows.lock().unwrap().get(&key).cloned()?;
        let now = Utc::now();
        let sender = Recipient::new("+15550102000");
        Some(MessageRecord::new(
            classifier,
            key,
            1,
            MessageTypeMask::new(mask),
            status,
            body,
            now,
            now,
            Recipients::single(sender.clone()),
            sender,
        ))
    }
}

pub struct Doubles {
    pub pipeline: Arc<RecordingPipeline>,
    pub notifier: Arc<RecordingNotifier>,
    pub foreground: Arc<CountingForeground>,
    pub migration: Arc<Migration>,
    pub store: Arc<MapStore>,
}

impl Doubles {
    pub fn new() -> Self {
        Self {
            pipeline: Arc::default(),
            notifier: Arc::default(),
            foreground: Arc::default(),
            migration: Arc::default(),
            store: Arc::default(),
        }
    }

    pub fn services(&self) -> CoreServices {
        CoreServices {
            pipeline: self.pipeline.clone(),
            notifier: self.notifier.clone(),
            foreground: self.foreground.clone(),
            migration: self.migration.clone(),
            reader: self.store.clone(),
        }
    }

    pub fn refreshes(&self) -> Vec<bool> {
        self.notifier.refreshes.lock().unwrap().clone()
    }
}

/// Poll `condition` until it holds or give up after a few seconds.
pub async fn eventually(condition: impl Fn() -> bool) -> bool {
    for _ in 0..200 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}
