mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use common::Doubles;
use sms_trust::intake::{InboundPayload, IntakeConfig, MessageClass, PayloadPart};
use sms_trust::message::mask::types::*;
use sms_trust::message::{Body, DisplayBranch, MessageTypeMask, RecordKey, StatusThresholds};
use sms_trust::{
    bootstrap_core, Core, CoreConfig, CoreEvent, DeliveryStatus, Disposition, EventKind,
};

const ORIGIN: &str = "+15551234567";

fn core_with(doubles: &Doubles, intake: IntakeConfig) -> Core {
    let config = CoreConfig {
        intake,
        ..CoreConfig::default()
    };
    bootstrap_core(config, doubles.services()).expect("bootstrap")
}

fn secure_only() -> IntakeConfig {
    IntakeConfig {
        accept_all: false,
        awaiting_verification: false,
    }
}

#[tokio::test]
async fn test_vendor_control_from_short_origin_passes_through() {
    let doubles = Doubles::new();
    let core = core_with(&doubles, IntakeConfig::default());

    let disposition = core
        .receiver
        .on_receive(InboundPayload::single("12345", "//ANDROID:xyz"));

    assert_eq!(disposition, Disposition::PassThrough);
    assert!(doubles.pipeline.queued.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_challenge_while_verifying() {
    let doubles = Doubles::new();
    let core = core_with(
        &doubles,
        IntakeConfig {
            accept_all: true,
            awaiting_verification: true,
        },
    );
    let mut challenges = core.bus.subscribe(EventKind::ChallengeReceived);

    let disposition = core.receiver.on_receive(InboundPayload::single(
        ORIGIN,
        "Your TextSecure verification code: 123-4567",
    ));

    assert_eq!(disposition, Disposition::Aborted);
    assert_eq!(
        challenges.recv().await,
        Some(CoreEvent::ChallengeReceived("1234567".into()))
    );
    assert!(doubles.pipeline.queued.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_secure_only_intake() {
    let doubles = Doubles::new();
    let core = core_with(&doubles, secure_only());

    assert_eq!(
        core.receiver.on_receive(InboundPayload::single(ORIGIN, "see you at 6")),
        Disposition::PassThrough
    );
    assert_eq!(
        core.receiver.on_receive(InboundPayload::single(ORIGIN, "?TSKAAECAwQ=")),
        Disposition::Aborted
    );
    assert_eq!(
        core.receiver.on_receive(InboundPayload::single(ORIGIN, "?TSMAAECAwQ=")),
        Disposition::Aborted
    );
    assert_eq!(doubles.pipeline.queued.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn test_pending_legacy_import_defers_everything() {
    let doubles = Doubles::new();
    doubles.migration.imported.store(false, Ordering::SeqCst);
    let core = core_with(&doubles, IntakeConfig::default());

    assert_eq!(
        core.receiver.on_receive(InboundPayload::single(ORIGIN, "?TSMAAECAwQ=")),
        Disposition::PassThrough
    );
    assert!(doubles.pipeline.queued.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_flash_message_is_never_claimed() {
    let doubles = Doubles::new();
    let core = core_with(&doubles, IntakeConfig::default());
    let flash = InboundPayload::new(vec![PayloadPart::new(
        ORIGIN,
        "?TSMAAECAwQ=",
        MessageClass::Flash,
    )]);

    assert_eq!(core.receiver.on_receive(flash), Disposition::PassThrough);
}

#[tokio::test]
async fn test_multipart_payload_queued_whole() {
    let doubles = Doubles::new();
    let core = core_with(&doubles, secure_only());
    let payload = InboundPayload::new(vec![
        PayloadPart::new(ORIGIN, "?TSM", MessageClass::Unspecified),
        PayloadPart::new(ORIGIN, "AAECAwQ=", MessageClass::Unspecified),
    ]);

    assert_eq!(core.receiver.on_receive(payload.clone()), Disposition::Aborted);
    assert_eq!(doubles.pipeline.queued.lock().unwrap().as_slice(), &[payload]);
}

#[tokio::test]
async fn test_records_are_cached_while_held() {
    let doubles = Doubles::new();
    let core = core_with(&doubles, IntakeConfig::default());
    let key = RecordKey::sms(42);
    doubles.store.insert(
        key,
        BASE_INBOX_TYPE | SECURE_MESSAGE_BIT,
        -1,
        Body::ciphertext("?TSMAAECAwQ="),
    );

    let first = core.record(key).expect("stored row");
    assert_eq!(first.display_branch(), DisplayBranch::Encrypted);
    assert!(first.is_secure());

    let second = core.record(key).expect("stored row");
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(doubles.store.reads.load(Ordering::SeqCst), 1);

    drop((first, second));
    core.records.clear();
    assert!(core.record(key).is_some());
    assert_eq!(doubles.store.reads.load(Ordering::SeqCst), 2);

    assert!(core.record(RecordKey::mms(42)).is_none());
}

#[tokio::test]
async fn test_records_use_configured_status_thresholds() {
    let doubles = Doubles::new();
    let config = CoreConfig {
        status: StatusThresholds {
            none: 0,
            pending: 1,
            failed: 2,
        },
        ..CoreConfig::default()
    };
    let core = bootstrap_core(config, doubles.services()).expect("bootstrap");
    let key = RecordKey::sms(7);
    doubles
        .store
        .insert(key, BASE_SENT_TYPE, 2, Body::plaintext("running late"));

    let record = core.record(key).expect("stored row");

    let direct = core
        .classifier
        .classify(MessageTypeMask::new(BASE_SENT_TYPE), 2, true, "running late");
    assert_eq!(direct.delivery, DeliveryStatus::Failed);
    assert_eq!(record.delivery_status(), DeliveryStatus::Failed);
    assert!(record.is_failed());
}
