//! Coarse delivery status derived from a transport's native status scale.
use serde::{Deserialize, Serialize};

/// Delivery state shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeliveryStatus {
    None,
    Received,
    Pending,
    Failed,
}

/// Cutoffs on the transport's native status scale.
///
/// The defaults are the SMS provider values: `-1` for no status, `0` for
/// complete, `32` for pending and `64` for failed. Other transports supply
/// their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusThresholds {
    pub none: i32,
    pub pending: i32,
    pub failed: i32,
}

impl StatusThresholds {
    pub const SMS: StatusThresholds = StatusThresholds {
        none: -1,
        pending: 32,
        failed: 64,
    };

    pub fn is_ordered(&self) -> bool {
        self.none < self.pending && self.pending < self.failed
    }

    /// Map a native status value onto [`DeliveryStatus`].
    pub fn delivery_status(&self, status: i32) -> DeliveryStatus {
        if status == self.none {
            DeliveryStatus::None
        } else if status >= self.failed {
            DeliveryStatus::Failed
        } else if status >= self.pending {
            DeliveryStatus::Pending
        } else {
            DeliveryStatus::Received
        }
    }
}

impl Default for StatusThresholds {
    fn default() -> Self {
        Self::SMS
    }
}
