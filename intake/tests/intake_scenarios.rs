use intake::{
    filter_intake, wire, ExemptReason, InboundPayload, Intake, IntakeConfig, MessageClass,
    PayloadPart,
};

const ORIGIN: &str = "+15551234567";

fn config(accept_all: bool, awaiting_verification: bool) -> IntakeConfig {
    IntakeConfig {
        accept_all,
        awaiting_verification,
    }
}

#[test]
fn test_vendor_control_from_short_origin_is_exempt() {
    let payload = InboundPayload::single("12345", "//ANDROID:xyz");
    let outcome = filter_intake(&payload, &config(true, false), || true);
    assert_eq!(outcome, Intake::Exempt(ExemptReason::VendorControl));
}

#[test]
fn test_verification_code_is_extracted() {
    let payload = InboundPayload::single(ORIGIN, "Your TextSecure verification code: 123-4567");
    let outcome = filter_intake(&payload, &config(true, true), || true);
    assert_eq!(outcome, Intake::Challenge("1234567".to_string()));
}

#[test]
fn test_plain_sms_is_exempt_when_secure_only() {
    let payload = InboundPayload::single(ORIGIN, "see you at 8");
    let outcome = filter_intake(&payload, &config(false, false), || true);
    assert_eq!(outcome, Intake::Exempt(ExemptReason::NotSecureTraffic));
}

#[test]
fn test_key_exchange_is_relevant_when_secure_only() {
    let body = format!("{}AAECAwQFBgc", wire::KEY_EXCHANGE_PREFIX);
    let payload = InboundPayload::single(ORIGIN, &body);
    let outcome = filter_intake(&payload, &config(false, false), || true);
    assert_eq!(outcome, Intake::Relevant);
}

#[test]
fn test_encrypted_multipart_is_relevant_when_secure_only() {
    let payload = InboundPayload::new(vec![
        PayloadPart::new(ORIGIN, wire::SECURE_MESSAGE_PREFIX, MessageClass::Unspecified),
        PayloadPart::new(ORIGIN, "Zm9vYmFy", MessageClass::Unspecified),
    ]);
    let outcome = filter_intake(&payload, &config(false, false), || true);
    assert_eq!(outcome, Intake::Relevant);
}

#[test]
fn test_everything_deferred_until_legacy_import_completes() {
    let bodies = [
        "hello".to_string(),
        format!("{}payload", wire::SECURE_MESSAGE_PREFIX),
        format!("{}payload", wire::KEY_EXCHANGE_PREFIX),
    ];

    for body in bodies {
        let payload = InboundPayload::single(ORIGIN, &body);
        for accept_all in [true, false] {
            let outcome = filter_intake(&payload, &config(accept_all, false), || false);
            assert_eq!(outcome, Intake::Exempt(ExemptReason::ImportPending));
        }
    }
}

#[test]
fn test_empty_payload_is_exempt() {
    let payload = InboundPayload::new(vec![]);
    let outcome = filter_intake(&payload, &config(true, true), || true);
    assert_eq!(outcome, Intake::Exempt(ExemptReason::Empty));
}

#[test]
fn test_config_defaults_from_partial_json() {
    let parsed: IntakeConfig =
        serde_json::from_str(r#"{"awaiting_verification": true}"#).expect("valid json");
    assert!(parsed.accept_all);
    assert!(parsed.awaiting_verification);
}
