//! Decoder for the packed message type column.
//!
//! A stored message carries a single integer that overloads several
//! independent concerns: the mailbox it sits in (which also gives direction
//! and send progress), whether it travelled over a secure session, its
//! key-exchange sub-state and how its body is encrypted at rest. This module
//! is the only place that looks at raw bits; everything else works on
//! [`DecodedType`].
use serde::{Deserialize, Serialize};

/// Bit layout of the type column, used by storage when writing a mask.
pub mod types {
    pub const BASE_TYPE_MASK: u64 = 0xFF;

    pub const BASE_INBOX_TYPE: u64 = 20;
    pub const BASE_OUTBOX_TYPE: u64 = 21;
    pub const BASE_SENDING_TYPE: u64 = 22;
    pub const BASE_SENT_TYPE: u64 = 23;
    pub const BASE_SENT_FAILED_TYPE: u64 = 24;

    pub const KEY_EXCHANGE_BIT: u64 = 0x8000;
    pub const KEY_EXCHANGE_STALE_BIT: u64 = 0x4000;
    pub const KEY_EXCHANGE_PROCESSED_BIT: u64 = 0x2000;
    pub const KEY_EXCHANGE_CORRUPTED_BIT: u64 = 0x1000;
    pub const KEY_EXCHANGE_INVALID_VERSION_BIT: u64 = 0x800;

    pub const SECURE_MESSAGE_BIT: u64 = 0x80_0000;

    pub const ENCRYPTION_SYMMETRIC_BIT: u64 = 0x8000_0000;
    pub const ENCRYPTION_ASYMMETRIC_BIT: u64 = 0x4000_0000;
    pub const ENCRYPTION_REMOTE_BIT: u64 = 0x2000_0000;
    pub const ENCRYPTION_REMOTE_FAILED_BIT: u64 = 0x1000_0000;
    pub const ENCRYPTION_REMOTE_NO_SESSION_BIT: u64 = 0x0800_0000;
}

use types::*;

/// Raw type value as stored alongside a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct MessageTypeMask(u64);

impl MessageTypeMask {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(&self) -> u64 {
        self.0
    }

    pub fn decode(&self) -> DecodedType {
        let base = BaseType::from_raw(self.0 & BASE_TYPE_MASK);

        DecodedType {
            base,
            direction: base.direction(),
            security: if self.has(SECURE_MESSAGE_BIT) {
                TransportSecurity::SessionEncrypted
            } else {
                TransportSecurity::Plaintext
            },
            key_exchange: self.key_exchange(),
            decrypt: self.decrypt(),
            at_rest: self.at_rest(),
        }
    }

    fn has(&self, bit: u64) -> bool {
        self.0 & bit != 0
    }

    fn key_exchange(&self) -> KeyExchangeState {
        if !self.has(KEY_EXCHANGE_BIT) {
            KeyExchangeState::NotKeyExchange
        } else if self.has(KEY_EXCHANGE_PROCESSED_BIT) {
            KeyExchangeState::Processed
        } else if self.has(KEY_EXCHANGE_STALE_BIT) {
            KeyExchangeState::Stale
        } else if self.has(KEY_EXCHANGE_CORRUPTED_BIT) {
            KeyExchangeState::Corrupted
        } else if self.has(KEY_EXCHANGE_INVALID_VERSION_BIT) {
            KeyExchangeState::InvalidVersion
        } else {
            KeyExchangeState::Pending
        }
    }

    fn decrypt(&self) -> DecryptState {
        if self.has(ENCRYPTION_REMOTE_FAILED_BIT) {
            DecryptState::Failed
        } else if self.has(ENCRYPTION_ASYMMETRIC_BIT) {
            DecryptState::InProgress
        } else if self.has(ENCRYPTION_REMOTE_NO_SESSION_BIT) {
            DecryptState::NoRemoteSession
        } else {
            DecryptState::Ready
        }
    }

    fn at_rest(&self) -> AtRest {
        if self.has(ENCRYPTION_SYMMETRIC_BIT) {
            AtRest::Symmetric
        } else if self.has(ENCRYPTION_ASYMMETRIC_BIT) {
            AtRest::Asymmetric
        } else if self.has(ENCRYPTION_REMOTE_BIT) {
            AtRest::Remote
        } else {
            AtRest::Plaintext
        }
    }
}

impl From<u64> for MessageTypeMask {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

/// Mailbox the message sits in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BaseType {
    Inbox,
    Outbox,
    Sending,
    Sent,
    SentFailed,
    /// Any other value; read as an incoming message.
    Unknown(u8),
}

impl BaseType {
    fn from_raw(raw: u64) -> Self {
        match raw {
            BASE_INBOX_TYPE => BaseType::Inbox,
            BASE_OUTBOX_TYPE => BaseType::Outbox,
            BASE_SENDING_TYPE => BaseType::Sending,
            BASE_SENT_TYPE => BaseType::Sent,
            BASE_SENT_FAILED_TYPE => BaseType::SentFailed,
            other => BaseType::Unknown((other & BASE_TYPE_MASK) as u8),
        }
    }

    pub fn direction(&self) -> Direction {
        match self {
            BaseType::Outbox | BaseType::Sending | BaseType::Sent | BaseType::SentFailed => {
                Direction::Outgoing
            }
            BaseType::Inbox | BaseType::Unknown(_) => Direction::Incoming,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, BaseType::Outbox | BaseType::Sending)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, BaseType::SentFailed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Incoming,
    Outgoing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransportSecurity {
    Plaintext,
    SessionEncrypted,
}

/// Key-exchange family. Sub-states only exist when the key-exchange bit is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyExchangeState {
    NotKeyExchange,
    /// Not yet processed.
    Pending,
    Processed,
    Stale,
    Corrupted,
    InvalidVersion,
}

impl KeyExchangeState {
    pub fn is_key_exchange(&self) -> bool {
        !matches!(self, KeyExchangeState::NotKeyExchange)
    }
}

/// Decryption state of an incoming secure message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecryptState {
    Ready,
    InProgress,
    Failed,
    NoRemoteSession,
}

/// How the body is encrypted in local storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AtRest {
    Plaintext,
    Symmetric,
    Asymmetric,
    Remote,
}

/// Orthogonal view of a [`MessageTypeMask`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodedType {
    pub base: BaseType,
    pub direction: Direction,
    pub security: TransportSecurity,
    pub key_exchange: KeyExchangeState,
    pub decrypt: DecryptState,
    pub at_rest: AtRest,
}
