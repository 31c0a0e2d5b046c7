use std::fmt::Debug;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use zeroize::{Zeroize, Zeroizing};

struct Secret {
    bytes: Mutex<Zeroizing<Vec<u8>>>,
    scrubbed: AtomicBool,
}

/// Unlocked key material.
///
/// Handles are cheap clones of one shared secret. When the cache evicts the
/// credential the secret is overwritten in place, so every outstanding handle
/// observes the scrub and [`Credential::with_bytes`] returns `None` from then on.
#[derive(Clone)]
pub struct Credential {
    inner: Arc<Secret>,
}

impl Credential {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            inner: Arc::new(Secret {
                bytes: Mutex::new(Zeroizing::new(bytes)),
                scrubbed: AtomicBool::new(false),
            }),
        }
    }

    pub fn from_slice(bytes: &[u8]) -> Self {
        Self::new(bytes.to_vec())
    }

    /// Run `f` over the key bytes, unless the credential was scrubbed.
    pub fn with_bytes<R>(&self, f: impl FnOnce(&[u8]) -> R) -> Option<R> {
        let bytes = self
            .inner
            .bytes
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if self.is_scrubbed() {
            return None;
        }
        Some(f(bytes.as_slice()))
    }

    pub fn is_scrubbed(&self) -> bool {
        self.inner.scrubbed.load(Ordering::Acquire)
    }

    pub fn len(&self) -> usize {
        self.inner
            .bytes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True when both handles refer to the same installed secret.
    pub fn same_as(&self, other: &Credential) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn scrub(&self) {
        let mut bytes = self
            .inner
            .bytes
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        bytes.zeroize();
        self.inner.scrubbed.store(true, Ordering::Release);
    }
}

impl PartialEq for Credential {
    fn eq(&self, other: &Self) -> bool {
        self.same_as(other)
    }
}

impl Eq for Credential {}

impl Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Credential([REDACTED])")
    }
}
