//! Interactive driver for the trust core.
//!
//! Reads one command per line from stdin:
//!
//! ```text
//! unlock <secret>           install a credential
//! lock                      evict it
//! show | hide               a decrypted surface appears / disappears
//! sms <origin> <body...>    deliver an inbound SMS
//! verify on|off             toggle awaiting verification
//! accept-all on|off         toggle accept-all intake
//! timeout off|<minutes>     change the inactivity policy
//! classify <mask> <status> <plaintext> <body...>
//! status
//! quit
//! ```
use std::str::SplitWhitespace;
use std::sync::Arc;

use chrono::Utc;
use log::{error, info, warn};
use tokio::io::{AsyncBufReadExt, BufReader};

use sms_trust::intake::InboundPayload;
use sms_trust::message::{Classifier, MessageRecord, MessageTypeMask, RecordKey};
use sms_trust::services::{
    DecryptPipeline, ForegroundGuard, MigrationComplete, Notifier, RecordReader,
};
use sms_trust::{bootstrap_core_from_env, Core, CoreServices, Credential, LockPolicy};

struct LoggingPipeline;

impl DecryptPipeline for LoggingPipeline {
    fn enqueue_for_decryption(&self, payload: InboundPayload) {
        info!(
            "[pipeline] queued {} part(s) from {}",
            payload.parts.len(),
            payload.origin().unwrap_or_default()
        );
    }

    fn drain_pending(&self, credential: &Credential) {
        info!(
            "[pipeline] draining pending messages with a {}-byte key",
            credential.len()
        );
    }
}

struct LoggingNotifier;

impl Notifier for LoggingNotifier {
    fn refresh(&self, credential: Option<&Credential>) {
        if credential.is_some() {
            info!("[notifier] refresh with content");
        } else {
            info!("[notifier] refresh, content hidden");
        }
    }
}

struct LoggingForeground;

impl ForegroundGuard for LoggingForeground {
    fn raise(&self) {
        info!("[foreground] raised");
    }

    fn lower(&self) {
        info!("[foreground] lowered");
    }
}

struct EmptyStore;

impl RecordReader for EmptyStore {
    fn read(
        &self,
        _classifier: &Classifier,
        _key: RecordKey,
        _credential: Option<&Credential>,
    ) -> Option<MessageRecord> {
        None
    }
}

fn parse_switch(arg: Option<&str>) -> Option<bool> {
    match arg {
        Some("on") => Some(true),
        Some("off") => Some(false),
        _ => None,
    }
}

fn rest(words: SplitWhitespace<'_>) -> String {
    words.collect::<Vec<_>>().join(" ")
}

fn handle(core: &Core, line: &str) -> bool {
    let mut words = line.split_whitespace();
    let Some(command) = words.next() else {
        return true;
    };
    match command {
        "unlock" => match words.next() {
            Some(secret) => core.key_cache.install(Credential::from_slice(secret.as_bytes())),
            None => warn!("usage: unlock <secret>"),
        },
        "lock" => core.key_cache.evict(),
        "show" => core.key_cache.note_surface_visible(),
        "hide" => core.key_cache.note_surface_hidden(),
        "sms" => match words.next() {
            Some(origin) => {
                let body = rest(words);
                let disposition = core
                    .receiver
                    .on_receive(InboundPayload::single(origin, &body));
                println!("{disposition:?}");
            }
            None => warn!("usage: sms <origin> <body>"),
        },
        "verify" => match parse_switch(words.next()) {
            Some(on) => core.receiver.settings().set_awaiting_verification(on),
            None => warn!("usage: verify on|off"),
        },
        "accept-all" => match parse_switch(words.next()) {
            Some(on) => core.receiver.settings().set_accept_all(on),
            None => warn!("usage: accept-all on|off"),
        },
        "timeout" => match words.next() {
            Some("off") => core.key_cache.set_lock_policy(LockPolicy {
                timeout_enabled: false,
                ..core.key_cache.lock_policy()
            }),
            Some(minutes) => match minutes.parse::<u64>() {
                Ok(minutes) if minutes > 0 => {
                    core.key_cache.set_lock_policy(LockPolicy::enabled(minutes))
                }
                _ => warn!("usage: timeout off|<minutes>"),
            },
            None => warn!("usage: timeout off|<minutes>"),
        },
        "classify" => {
            let mask = words.next().and_then(|m| {
                m.strip_prefix("0x")
                    .map_or_else(|| m.parse::<u64>().ok(), |hex| u64::from_str_radix(hex, 16).ok())
            });
            let status = words.next().and_then(|s| s.parse::<i32>().ok());
            let plaintext = words.next().and_then(|p| p.parse::<bool>().ok());
            match (mask, status, plaintext) {
                (Some(mask), Some(status), Some(plaintext)) => {
                    let body = rest(words);
                    let c = core.classifier.classify(
                        MessageTypeMask::new(mask),
                        status,
                        plaintext,
                        &body,
                    );
                    println!(
                        "{:?} delivery={:?} emphasized={} text={:?}",
                        c.branch,
                        c.delivery,
                        c.is_emphasized(),
                        c.text
                    );
                }
                _ => warn!("usage: classify <mask> <status> <plaintext> <body>"),
            }
        }
        "status" => {
            let credential = core.key_cache.get();
            println!(
                "credential={} surfaces={} timeout_armed={} policy={:?} intake={:?} at={}",
                credential.is_some(),
                core.key_cache.visible_surfaces(),
                core.key_cache.is_timeout_armed(),
                core.key_cache.lock_policy(),
                core.receiver.settings().snapshot(),
                Utc::now().to_rfc3339()
            );
        }
        "quit" | "exit" => return false,
        other => warn!("unknown command: {other}"),
    }
    true
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let core = bootstrap_core_from_env(CoreServices {
        pipeline: Arc::new(LoggingPipeline),
        notifier: Arc::new(LoggingNotifier),
        foreground: Arc::new(LoggingForeground),
        migration: Arc::new(MigrationComplete),
        reader: Arc::new(EmptyStore),
    })?;

    let mut events = core.bus.subscribe_all();
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            info!("[event] {event}");
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if !handle(&core, &line) {
                    break;
                }
            }
            Ok(None) => break,
            Err(e) => {
                error!("Failed to read stdin: {e}");
                break;
            }
        }
    }

    core.shutdown();
    Ok(())
}
