//! Message state classification and display text resolution.
//!
//! Classification is a pure function of the packed type mask, the transport's
//! native delivery status, whether the body is already plaintext and the body
//! itself. The display branch that fired is returned alongside the text so a
//! renderer can style system-generated text differently from user content.
//!
//! # Display precedence (conversation view)
//!
//! ```text
//! processed key exchange -> stale key exchange -> outgoing key exchange
//!   -> incoming key exchange -> failed decrypt -> decrypting -> no session
//!   -> still ciphertext -> body (tag stripped when outgoing)
//! ```
//!
//! # Display precedence (thread summary)
//!
//! ```text
//! decrypting -> key exchange -> failed decrypt -> no session
//!   -> still ciphertext -> "no subject" when blank -> body
//! ```
use serde::{Deserialize, Serialize};

use crate::message::mask::{
    DecodedType, DecryptState, Direction, KeyExchangeState, MessageTypeMask, TransportSecurity,
};
use crate::message::status::{DeliveryStatus, StatusThresholds};
use crate::message::tag;

/// Independently queryable state of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageFlags {
    pub is_outgoing: bool,
    pub is_pending: bool,
    pub is_key_exchange: bool,
    pub is_processed_key_exchange: bool,
    pub is_stale_key_exchange: bool,
    pub is_corrupted_key_exchange: bool,
    pub is_failed_decrypt: bool,
    pub is_decrypt_in_progress: bool,
    pub is_no_remote_session: bool,
    pub is_secure: bool,
    pub is_failed: bool,
}

impl MessageFlags {
    pub fn new(decoded: &DecodedType, delivery: DeliveryStatus) -> Self {
        Self {
            is_outgoing: decoded.direction == Direction::Outgoing,
            is_pending: decoded.base.is_pending(),
            is_key_exchange: decoded.key_exchange.is_key_exchange(),
            is_processed_key_exchange: decoded.key_exchange == KeyExchangeState::Processed,
            is_stale_key_exchange: decoded.key_exchange == KeyExchangeState::Stale,
            is_corrupted_key_exchange: decoded.key_exchange == KeyExchangeState::Corrupted,
            is_failed_decrypt: decoded.decrypt == DecryptState::Failed,
            is_decrypt_in_progress: decoded.decrypt == DecryptState::InProgress,
            is_no_remote_session: decoded.decrypt == DecryptState::NoRemoteSession,
            is_secure: decoded.security == TransportSecurity::SessionEncrypted,
            is_failed: decoded.base.is_failed() || delivery == DeliveryStatus::Failed,
        }
    }
}

/// Which display rule produced the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DisplayBranch {
    ProcessedKeyExchange,
    StaleKeyExchange,
    OutgoingKeyExchange,
    IncomingKeyExchange,
    /// Any key exchange, as summarized in the thread list.
    KeyExchange,
    FailedDecrypt,
    Decrypting,
    NoRemoteSession,
    Encrypted,
    NoSubject,
    Body,
}

impl DisplayBranch {
    /// System-generated text that renderers show muted and italic.
    pub fn is_emphasized(&self) -> bool {
        !matches!(self, DisplayBranch::Body | DisplayBranch::NoSubject)
    }
}

/// Fixed texts for the system-generated branches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayTexts {
    pub processed_key_exchange: String,
    pub stale_key_exchange: String,
    pub outgoing_key_exchange: String,
    pub incoming_key_exchange: String,
    pub key_exchange: String,
    pub failed_decrypt: String,
    pub decrypting: String,
    pub no_remote_session: String,
    pub encrypted: String,
    pub no_subject: String,
}

impl Default for DisplayTexts {
    fn default() -> Self {
        Self {
            processed_key_exchange: "Received and processed key exchange message.".to_string(),
            stale_key_exchange: "Error, received stale key exchange message.".to_string(),
            outgoing_key_exchange: "Key exchange message...".to_string(),
            incoming_key_exchange: "Received key exchange message, tap to process.".to_string(),
            key_exchange: "Key exchange message...".to_string(),
            failed_decrypt: "Bad encrypted message...".to_string(),
            decrypting: "Decrypting, please wait...".to_string(),
            no_remote_session: "Message encrypted for non-existing session...".to_string(),
            encrypted: "Encrypted message".to_string(),
            no_subject: "(No subject)".to_string(),
        }
    }
}

impl DisplayTexts {
    fn fixed(&self, branch: DisplayBranch) -> Option<&str> {
        let text = match branch {
            DisplayBranch::ProcessedKeyExchange => &self.processed_key_exchange,
            DisplayBranch::StaleKeyExchange => &self.stale_key_exchange,
            DisplayBranch::OutgoingKeyExchange => &self.outgoing_key_exchange,
            DisplayBranch::IncomingKeyExchange => &self.incoming_key_exchange,
            DisplayBranch::KeyExchange => &self.key_exchange,
            DisplayBranch::FailedDecrypt => &self.failed_decrypt,
            DisplayBranch::Decrypting => &self.decrypting,
            DisplayBranch::NoRemoteSession => &self.no_remote_session,
            DisplayBranch::Encrypted => &self.encrypted,
            DisplayBranch::NoSubject => &self.no_subject,
            DisplayBranch::Body => return None,
        };
        Some(text)
    }
}

/// Full result of classifying one message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub decoded: DecodedType,
    pub flags: MessageFlags,
    pub delivery: DeliveryStatus,
    pub branch: DisplayBranch,
    pub text: String,
}

impl Classification {
    pub fn is_emphasized(&self) -> bool {
        self.branch.is_emphasized()
    }
}

/// Text shown for a thread in the conversation list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub branch: DisplayBranch,
    pub text: String,
}

/// Stateless classifier configured with the transport's status cutoffs and
/// the fixed display texts.
#[derive(Debug, Clone, Default)]
pub struct Classifier {
    thresholds: StatusThresholds,
    texts: DisplayTexts,
}

impl Classifier {
    pub fn new(thresholds: StatusThresholds, texts: DisplayTexts) -> Self {
        Self { thresholds, texts }
    }

    pub fn with_thresholds(thresholds: StatusThresholds) -> Self {
        Self {
            thresholds,
            texts: DisplayTexts::default(),
        }
    }

    pub fn thresholds(&self) -> &StatusThresholds {
        &self.thresholds
    }

    pub fn classify(
        &self,
        mask: MessageTypeMask,
        transport_status: i32,
        is_plaintext: bool,
        body: &str,
    ) -> Classification {
        let decoded = mask.decode();
        let delivery = self.thresholds.delivery_status(transport_status);
        let flags = MessageFlags::new(&decoded, delivery);
        let branch = message_branch(&flags, is_plaintext);

        let text = match self.texts.fixed(branch) {
            Some(fixed) => fixed.to_string(),
            None if flags.is_outgoing => tag::strip_tag(body).to_string(),
            None => body.to_string(),
        };

        Classification {
            decoded,
            flags,
            delivery,
            branch,
            text,
        }
    }

    /// Thread-list rendering of a snippet.
    pub fn summarize(&self, mask: MessageTypeMask, is_plaintext: bool, body: &str) -> Summary {
        let decoded = mask.decode();
        let branch = summary_branch(&decoded, is_plaintext, body);
        let text = match self.texts.fixed(branch) {
            Some(fixed) => fixed.to_string(),
            None => body.to_string(),
        };

        Summary { branch, text }
    }
}

/// Classify with the SMS status scale and default texts.
pub fn classify(
    mask: MessageTypeMask,
    transport_status: i32,
    is_plaintext: bool,
    body: &str,
) -> Classification {
    Classifier::default().classify(mask, transport_status, is_plaintext, body)
}

fn message_branch(flags: &MessageFlags, is_plaintext: bool) -> DisplayBranch {
    if flags.is_processed_key_exchange {
        DisplayBranch::ProcessedKeyExchange
    } else if flags.is_stale_key_exchange {
        DisplayBranch::StaleKeyExchange
    } else if flags.is_key_exchange && flags.is_outgoing {
        DisplayBranch::OutgoingKeyExchange
    } else if flags.is_key_exchange {
        DisplayBranch::IncomingKeyExchange
    } else if flags.is_failed_decrypt {
        DisplayBranch::FailedDecrypt
    } else if flags.is_decrypt_in_progress {
        DisplayBranch::Decrypting
    } else if flags.is_no_remote_session {
        DisplayBranch::NoRemoteSession
    } else if !is_plaintext {
        DisplayBranch::Encrypted
    } else {
        DisplayBranch::Body
    }
}

fn summary_branch(decoded: &DecodedType, is_plaintext: bool, body: &str) -> DisplayBranch {
    if decoded.decrypt == DecryptState::InProgress {
        DisplayBranch::Decrypting
    } else if decoded.key_exchange.is_key_exchange() {
        DisplayBranch::KeyExchange
    } else if decoded.decrypt == DecryptState::Failed {
        DisplayBranch::FailedDecrypt
    } else if decoded.decrypt == DecryptState::NoRemoteSession {
        DisplayBranch::NoRemoteSession
    } else if !is_plaintext {
        DisplayBranch::Encrypted
    } else if body.trim().is_empty() {
        DisplayBranch::NoSubject
    } else {
        DisplayBranch::Body
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::mask::types::*;

    fn mask(raw: u64) -> MessageTypeMask {
        MessageTypeMask::new(raw)
    }

    #[test]
    fn test_plain_incoming_body_as_is() {
        let c = classify(mask(BASE_INBOX_TYPE), -1, true, "hi there");
        assert_eq!(c.branch, DisplayBranch::Body);
        assert_eq!(c.text, "hi there");
        assert_eq!(c.delivery, DeliveryStatus::None);
        assert!(!c.is_emphasized());
        assert!(!c.flags.is_outgoing);
    }

    #[test]
    fn test_outgoing_tagged_body_is_stripped() {
        let body = tag::tag_message("see you");
        let c = classify(mask(BASE_SENT_TYPE), 0, true, &body);
        assert_eq!(c.branch, DisplayBranch::Body);
        assert_eq!(c.text, "see you");
        assert_eq!(c.delivery, DeliveryStatus::Received);
    }

    #[test]
    fn test_incoming_tagged_body_is_kept() {
        let body = tag::tag_message("see you");
        let c = classify(mask(BASE_INBOX_TYPE), -1, true, &body);
        assert_eq!(c.text, body);
    }

    #[test]
    fn test_key_exchange_branches() {
        let processed = classify(
            mask(BASE_INBOX_TYPE | KEY_EXCHANGE_BIT | KEY_EXCHANGE_PROCESSED_BIT),
            -1,
            true,
            "?TSK...",
        );
        assert_eq!(processed.branch, DisplayBranch::ProcessedKeyExchange);

        let stale = classify(
            mask(BASE_INBOX_TYPE | KEY_EXCHANGE_BIT | KEY_EXCHANGE_STALE_BIT),
            -1,
            true,
            "?TSK...",
        );
        assert_eq!(stale.branch, DisplayBranch::StaleKeyExchange);

        let outgoing = classify(mask(BASE_OUTBOX_TYPE | KEY_EXCHANGE_BIT), -1, true, "?TSK...");
        assert_eq!(outgoing.branch, DisplayBranch::OutgoingKeyExchange);
        assert!(outgoing.flags.is_pending);

        let incoming = classify(mask(BASE_INBOX_TYPE | KEY_EXCHANGE_BIT), -1, true, "?TSK...");
        assert_eq!(incoming.branch, DisplayBranch::IncomingKeyExchange);
        assert!(incoming.is_emphasized());
        assert_eq!(incoming.text, DisplayTexts::default().incoming_key_exchange);
    }

    #[test]
    fn test_key_exchange_wins_over_decrypt_state() {
        let c = classify(
            mask(BASE_INBOX_TYPE | KEY_EXCHANGE_BIT | ENCRYPTION_REMOTE_FAILED_BIT),
            -1,
            false,
            "",
        );
        assert_eq!(c.branch, DisplayBranch::IncomingKeyExchange);
        assert!(c.flags.is_failed_decrypt);
    }

    #[test]
    fn test_decrypt_branches() {
        let failed = classify(mask(BASE_INBOX_TYPE | ENCRYPTION_REMOTE_FAILED_BIT), -1, false, "x");
        assert_eq!(failed.branch, DisplayBranch::FailedDecrypt);

        let decrypting = classify(mask(BASE_INBOX_TYPE | ENCRYPTION_ASYMMETRIC_BIT), -1, false, "x");
        assert_eq!(decrypting.branch, DisplayBranch::Decrypting);

        let no_session = classify(
            mask(BASE_INBOX_TYPE | ENCRYPTION_REMOTE_NO_SESSION_BIT),
            -1,
            false,
            "x",
        );
        assert_eq!(no_session.branch, DisplayBranch::NoRemoteSession);

        let ciphertext = classify(mask(BASE_INBOX_TYPE | SECURE_MESSAGE_BIT), -1, false, "x");
        assert_eq!(ciphertext.branch, DisplayBranch::Encrypted);
        assert!(ciphertext.flags.is_secure);
    }

    #[test]
    fn test_failed_from_mailbox_or_delivery() {
        let by_mailbox = classify(mask(BASE_SENT_FAILED_TYPE), 0, true, "x");
        assert!(by_mailbox.flags.is_failed);
        assert_eq!(by_mailbox.delivery, DeliveryStatus::Received);

        let by_delivery = classify(mask(BASE_SENT_TYPE), 64, true, "x");
        assert!(by_delivery.flags.is_failed);
        assert_eq!(by_delivery.delivery, DeliveryStatus::Failed);

        let pending = classify(mask(BASE_SENT_TYPE), 32, true, "x");
        assert!(!pending.flags.is_failed);
        assert_eq!(pending.delivery, DeliveryStatus::Pending);
    }

    #[test]
    fn test_custom_thresholds() {
        let classifier = Classifier::with_thresholds(StatusThresholds {
            none: 0,
            pending: 1,
            failed: 2,
        });
        let c = classifier.classify(mask(BASE_SENT_TYPE), 2, true, "x");
        assert_eq!(c.delivery, DeliveryStatus::Failed);
        assert!(c.flags.is_failed);
    }

    #[test]
    fn test_summary_no_subject() {
        let classifier = Classifier::default();
        for body in ["", "   ", "\n\t"] {
            let s = classifier.summarize(mask(BASE_INBOX_TYPE), true, body);
            assert_eq!(s.branch, DisplayBranch::NoSubject);
            assert_eq!(s.text, "(No subject)");
            assert!(!s.branch.is_emphasized());
        }
    }

    #[test]
    fn test_summary_precedence() {
        let classifier = Classifier::default();

        let decrypting = classifier.summarize(
            mask(BASE_INBOX_TYPE | KEY_EXCHANGE_BIT | ENCRYPTION_ASYMMETRIC_BIT),
            false,
            "",
        );
        assert_eq!(decrypting.branch, DisplayBranch::Decrypting);

        let key_exchange = classifier.summarize(
            mask(BASE_SENT_TYPE | KEY_EXCHANGE_BIT | KEY_EXCHANGE_PROCESSED_BIT),
            true,
            "?TSK",
        );
        assert_eq!(key_exchange.branch, DisplayBranch::KeyExchange);

        let ciphertext = classifier.summarize(mask(BASE_INBOX_TYPE), false, "abc");
        assert_eq!(ciphertext.branch, DisplayBranch::Encrypted);

        let body = classifier.summarize(mask(BASE_INBOX_TYPE), true, "lunch?");
        assert_eq!(body.branch, DisplayBranch::Body);
        assert_eq!(body.text, "lunch?");
    }

    #[test]
    fn test_conversation_view_keeps_blank_body() {
        let c = classify(mask(BASE_INBOX_TYPE), -1, true, "");
        assert_eq!(c.branch, DisplayBranch::Body);
        assert_eq!(c.text, "");
    }
}
