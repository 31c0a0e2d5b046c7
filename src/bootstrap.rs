use std::sync::Arc;

use anyhow::Context;
use log::info;
use tokio::runtime::Handle;

use crate::cache::RecordCache;
use crate::config::CoreConfig;
use crate::events::{EventBus, DEFAULT_EVENT_CAPACITY};
use crate::keycache::{AlarmScheduler, Collaborators, KeyCache, TokioAlarmScheduler};
use crate::message::{Classifier, MessageRecord, RecordKey};
use crate::receiver::{IntakeSettings, SmsReceiver};
use crate::services::{DecryptPipeline, ForegroundGuard, MigrationStatus, Notifier, RecordReader};

/// Host-provided collaborators.
#[derive(Clone)]
pub struct CoreServices {
    pub pipeline: Arc<dyn DecryptPipeline>,
    pub notifier: Arc<dyn Notifier>,
    pub foreground: Arc<dyn ForegroundGuard>,
    pub migration: Arc<dyn MigrationStatus>,
    pub reader: Arc<dyn RecordReader>,
}

/// The wired trust core. Owned by the host and torn down with [`Core::shutdown`].
pub struct Core {
    pub config: CoreConfig,
    pub bus: EventBus,
    pub key_cache: KeyCache,
    pub receiver: SmsReceiver,
    pub classifier: Classifier,
    pub records: RecordCache,
    reader: Arc<dyn RecordReader>,
}

impl Core {
    /// Cached record, read through the storage reader on a miss.
    pub fn record(&self, key: RecordKey) -> Option<Arc<MessageRecord>> {
        let credential = self.key_cache.get();
        self.records.get_or_load(key, || {
            self.reader.read(&self.classifier, key, credential.as_ref())
        })
    }

    pub fn shutdown(&self) {
        info!("[shutdown] stopping trust core");
        self.key_cache.shutdown();
        self.records.clear();
    }
}

/// Wire the core on the current tokio runtime with the default alarm scheduler.
pub fn bootstrap_core(config: CoreConfig, services: CoreServices) -> anyhow::Result<Core> {
    let runtime = Handle::try_current().context("bootstrap_core must run inside a tokio runtime")?;
    let alarms = Arc::new(TokioAlarmScheduler::new(runtime.clone()));
    bootstrap_core_with_alarms(config, services, alarms, runtime)
}

/// Same wiring with an explicit alarm scheduler and runtime.
pub fn bootstrap_core_with_alarms(
    config: CoreConfig,
    services: CoreServices,
    alarms: Arc<dyn AlarmScheduler>,
    runtime: Handle,
) -> anyhow::Result<Core> {
    config.validate().context("invalid core configuration")?;

    let bus = EventBus::new(DEFAULT_EVENT_CAPACITY);
    let key_cache = KeyCache::new(
        config.lock,
        Collaborators {
            bus: bus.clone(),
            alarms,
            pipeline: services.pipeline.clone(),
            notifier: services.notifier.clone(),
            foreground: services.foreground.clone(),
            migration: services.migration.clone(),
            runtime,
        },
    );
    let receiver = SmsReceiver::new(
        IntakeSettings::new(config.intake),
        bus.clone(),
        services.pipeline.clone(),
        services.migration.clone(),
    );

    info!(
        "[bootstrap_core] timeout_enabled={}, timeout_minutes={}, accept_all={}",
        config.lock.timeout_enabled, config.lock.timeout_minutes, config.intake.accept_all
    );

    Ok(Core {
        classifier: Classifier::with_thresholds(config.status),
        records: RecordCache::new(config.record_cache_capacity),
        bus,
        key_cache,
        receiver,
        reader: services.reader,
        config,
    })
}

/// Bootstrap with configuration read from the environment.
///
/// If `SMS_TRUST_CONFIG` names a JSON file it is loaded instead.
pub fn bootstrap_core_from_env(services: CoreServices) -> anyhow::Result<Core> {
    let config = match std::env::var("SMS_TRUST_CONFIG") {
        Ok(path) => CoreConfig::from_json_file(&path)
            .with_context(|| format!("Failed to load config file: {path}"))?,
        Err(_) => CoreConfig::from_env().context("Failed to read config from environment")?,
    };
    bootstrap_core(config, services)
}
