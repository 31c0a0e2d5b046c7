//! Intake classification of inbound payloads.
//!
//! Rules are evaluated in order and the first match wins:
//!
//! ```text
//! ephemeral (flash) class              -> Exempt
//! third-party OTP body                 -> Exempt
//! short origin + vendor control prefix -> Exempt
//! awaiting verification + challenge    -> Challenge(code)
//! legacy import not finished           -> Exempt
//! accept all                           -> Relevant
//! encrypted / key exchange wire prefix -> Relevant
//! otherwise                            -> Exempt
//! ```
use std::fmt::Display;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::challenge::parse_verification_code;
use crate::payload::InboundPayload;
use crate::wire;

/// Bodies from this service are one-time passwords consumed by its own app.
const THIRD_PARTY_OTP_PREFIX: &str = "Sparebank1://otp?";

/// Carrier visual-voicemail control messages arrive from short codes with
/// one of these prefixes.
const VENDOR_CONTROL_PREFIXES: [&str; 4] = ["//ANDROID:", "//Android:", "//android:", "//BREW:"];

/// Origins shorter than this are treated as carrier short codes.
const SHORT_ORIGIN_LEN: usize = 7;

/// Operator switches that drive intake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntakeConfig {
    /// Take over every inbound SMS, not only encrypted and key exchange traffic.
    pub accept_all: bool,
    /// Registration is waiting for an SMS verification code.
    pub awaiting_verification: bool,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            accept_all: true,
            awaiting_verification: false,
        }
    }
}

/// Why a payload was left to the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExemptReason {
    Empty,
    Ephemeral,
    ThirdPartyOtp,
    VendorControl,
    ImportPending,
    NotSecureTraffic,
}

impl Display for ExemptReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let reason = match self {
            ExemptReason::Empty => "Empty",
            ExemptReason::Ephemeral => "Ephemeral",
            ExemptReason::ThirdPartyOtp => "ThirdPartyOtp",
            ExemptReason::VendorControl => "VendorControl",
            ExemptReason::ImportPending => "ImportPending",
            ExemptReason::NotSecureTraffic => "NotSecureTraffic",
        };
        write!(f, "{reason}")
    }
}

/// Outcome of intake classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intake {
    /// Not ours; leave it to the system and never queue it.
    Exempt(ExemptReason),
    /// Registration challenge carrying the concatenated code.
    Challenge(String),
    /// Queue into the secure pipeline.
    Relevant,
}

impl Intake {
    pub fn is_exempt(&self) -> bool {
        matches!(self, Intake::Exempt(_))
    }

    /// Whether the caller must claim the payload and stop further delivery.
    pub fn claims_delivery(&self) -> bool {
        !self.is_exempt()
    }
}

/// Payloads the client must never intercept, whatever the configuration.
pub fn exemption(payload: &InboundPayload) -> Option<ExemptReason> {
    let Some(origin) = payload.origin() else {
        return Some(ExemptReason::Empty);
    };

    if payload.message_class().is_ephemeral() {
        return Some(ExemptReason::Ephemeral);
    }

    let body = payload.body();

    if body.starts_with(THIRD_PARTY_OTP_PREFIX) {
        return Some(ExemptReason::ThirdPartyOtp);
    }

    if origin.chars().count() < SHORT_ORIGIN_LEN
        && VENDOR_CONTROL_PREFIXES
            .iter()
            .any(|prefix| body.starts_with(prefix))
    {
        return Some(ExemptReason::VendorControl);
    }

    None
}

/// Classify an inbound payload.
///
/// `legacy_import_complete` is only consulted once the payload has passed the
/// exemption and challenge checks.
pub fn filter_intake<F>(
    payload: &InboundPayload,
    config: &IntakeConfig,
    legacy_import_complete: F,
) -> Intake
where
    F: FnOnce() -> bool,
{
    if let Some(reason) = exemption(payload) {
        debug!("[filter_intake] exempt: {reason}");
        return Intake::Exempt(reason);
    }

    let body = payload.body();

    if config.awaiting_verification {
        if let Some(code) = parse_verification_code(&body) {
            return Intake::Challenge(code);
        }
    }

    if !legacy_import_complete() {
        debug!("[filter_intake] legacy import pending, deferring");
        return Intake::Exempt(ExemptReason::ImportPending);
    }

    if config.accept_all {
        return Intake::Relevant;
    }

    if wire::is_encrypted_message(&body) || wire::is_key_exchange(&body) {
        Intake::Relevant
    } else {
        Intake::Exempt(ExemptReason::NotSecureTraffic)
    }
}
