//! Transport-level envelope of an inbound SMS.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Message class reported by the carrier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MessageClass {
    /// Class 0 ("flash"): shown immediately and never stored.
    Flash,
    Class1,
    Class2,
    Class3,
    #[default]
    Unspecified,
}

impl MessageClass {
    pub fn is_ephemeral(&self) -> bool {
        matches!(self, MessageClass::Flash)
    }
}

/// One PDU of a (possibly multi-part) message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadPart {
    pub origin: String,
    pub body: String,
    #[serde(default)]
    pub class: MessageClass,
}

impl PayloadPart {
    pub fn new(origin: &str, body: &str, class: MessageClass) -> Self {
        Self {
            origin: origin.to_string(),
            body: body.to_string(),
            class,
        }
    }
}

/// A raw inbound payload as delivered by the transport.
///
/// The envelope (origin address and message class) is taken from the first
/// part; the body is the concatenation of every part in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundPayload {
    pub parts: Vec<PayloadPart>,
    pub received_at: DateTime<Utc>,
}

impl InboundPayload {
    pub fn new(parts: Vec<PayloadPart>) -> Self {
        Self {
            parts,
            received_at: Utc::now(),
        }
    }

    /// Single-part payload with an unspecified message class.
    pub fn single(origin: &str, body: &str) -> Self {
        Self::new(vec![PayloadPart::new(origin, body, MessageClass::Unspecified)])
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub fn origin(&self) -> Option<&str> {
        self.parts.first().map(|p| p.origin.as_str())
    }

    pub fn message_class(&self) -> MessageClass {
        self.parts
            .first()
            .map(|p| p.class)
            .unwrap_or_default()
    }

    pub fn body(&self) -> String {
        self.parts.iter().map(|p| p.body.as_str()).collect()
    }
}
