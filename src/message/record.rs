//! Immutable message and thread records materialized by the storage reader.
use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::message::classify::{Classification, Classifier, DisplayBranch, Summary};
use crate::message::mask::MessageTypeMask;
use crate::message::status::DeliveryStatus;
use crate::recipients::{Recipient, Recipients};

/// Transport a record was carried over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransportKind {
    Sms,
    Mms,
}

impl Display for TransportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self {
            TransportKind::Sms => "sms",
            TransportKind::Mms => "mms",
        };
        write!(f, "{kind}")
    }
}

/// Identity of a record across both transports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordKey {
    pub transport: TransportKind,
    pub id: i64,
}

impl RecordKey {
    pub fn new(transport: TransportKind, id: i64) -> Self {
        Self { transport, id }
    }

    pub fn sms(id: i64) -> Self {
        Self::new(TransportKind::Sms, id)
    }

    pub fn mms(id: i64) -> Self {
        Self::new(TransportKind::Mms, id)
    }
}

impl Display for RecordKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.transport, self.id)
    }
}

/// Stored body and whether it has already been decrypted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Body {
    text: String,
    plaintext: bool,
}

impl Body {
    pub fn plaintext(text: &str) -> Self {
        Self {
            text: text.to_string(),
            plaintext: true,
        }
    }

    pub fn ciphertext(text: &str) -> Self {
        Self {
            text: text.to_string(),
            plaintext: false,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_plaintext(&self) -> bool {
        self.plaintext
    }
}

/// One message in a conversation, SMS or MMS.
///
/// Classification happens once at construction; a state change in storage
/// means reading the record again.
#[derive(Debug, Clone)]
pub struct MessageRecord {
    key: RecordKey,
    thread_id: i64,
    mask: MessageTypeMask,
    body: Body,
    date_sent: DateTime<Utc>,
    date_received: DateTime<Utc>,
    recipients: Recipients,
    individual_recipient: Recipient,
    classification: Classification,
}

impl MessageRecord {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        classifier: &Classifier,
        key: RecordKey,
        thread_id: i64,
        mask: MessageTypeMask,
        transport_status: i32,
        body: Body,
        date_sent: DateTime<Utc>,
        date_received: DateTime<Utc>,
        recipients: Recipients,
        individual_recipient: Recipient,
    ) -> Self {
        let classification =
            classifier.classify(mask, transport_status, body.is_plaintext(), body.text());

        Self {
            key,
            thread_id,
            mask,
            body,
            date_sent,
            date_received,
            recipients,
            individual_recipient,
            classification,
        }
    }

    pub fn key(&self) -> RecordKey {
        self.key
    }

    pub fn id(&self) -> i64 {
        self.key.id
    }

    pub fn is_mms(&self) -> bool {
        self.key.transport == TransportKind::Mms
    }

    pub fn thread_id(&self) -> i64 {
        self.thread_id
    }

    pub fn mask(&self) -> MessageTypeMask {
        self.mask
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    pub fn date_sent(&self) -> DateTime<Utc> {
        self.date_sent
    }

    pub fn date_received(&self) -> DateTime<Utc> {
        self.date_received
    }

    pub fn recipients(&self) -> &Recipients {
        &self.recipients
    }

    pub fn individual_recipient(&self) -> &Recipient {
        &self.individual_recipient
    }

    pub fn classification(&self) -> &Classification {
        &self.classification
    }

    pub fn delivery_status(&self) -> DeliveryStatus {
        self.classification.delivery
    }

    pub fn is_delivered(&self) -> bool {
        self.classification.delivery == DeliveryStatus::Received
    }

    pub fn is_outgoing(&self) -> bool {
        self.classification.flags.is_outgoing
    }

    pub fn is_pending(&self) -> bool {
        self.classification.flags.is_pending
    }

    pub fn is_failed(&self) -> bool {
        self.classification.flags.is_failed
    }

    pub fn is_secure(&self) -> bool {
        self.classification.flags.is_secure
    }

    pub fn is_key_exchange(&self) -> bool {
        self.classification.flags.is_key_exchange
    }

    pub fn is_processed_key_exchange(&self) -> bool {
        self.classification.flags.is_processed_key_exchange
    }

    pub fn is_stale_key_exchange(&self) -> bool {
        self.classification.flags.is_stale_key_exchange
    }

    pub fn display_branch(&self) -> DisplayBranch {
        self.classification.branch
    }

    pub fn display_body(&self) -> &str {
        &self.classification.text
    }
}

/// Audience of a thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DistributionType {
    #[default]
    Default,
    Broadcast,
    Conversation,
}

/// Heading of a conversation as shown in the thread list.
#[derive(Debug, Clone)]
pub struct ThreadSummary {
    thread_id: i64,
    recipients: Recipients,
    date: DateTime<Utc>,
    count: u64,
    read: bool,
    snippet_mask: MessageTypeMask,
    distribution: DistributionType,
    summary: Summary,
}

impl ThreadSummary {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        classifier: &Classifier,
        thread_id: i64,
        snippet: Body,
        snippet_mask: MessageTypeMask,
        recipients: Recipients,
        date: DateTime<Utc>,
        count: u64,
        read: bool,
        distribution: DistributionType,
    ) -> Self {
        let summary = classifier.summarize(snippet_mask, snippet.is_plaintext(), snippet.text());

        Self {
            thread_id,
            recipients,
            date,
            count,
            read,
            snippet_mask,
            distribution,
            summary,
        }
    }

    pub fn thread_id(&self) -> i64 {
        self.thread_id
    }

    pub fn recipients(&self) -> &Recipients {
        &self.recipients
    }

    pub fn date(&self) -> DateTime<Utc> {
        self.date
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn is_read(&self) -> bool {
        self.read
    }

    pub fn snippet_mask(&self) -> MessageTypeMask {
        self.snippet_mask
    }

    pub fn distribution(&self) -> DistributionType {
        self.distribution
    }

    pub fn display_branch(&self) -> DisplayBranch {
        self.summary.branch
    }

    pub fn display_body(&self) -> &str {
        &self.summary.text
    }
}
