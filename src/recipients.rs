//! Conversation participants.
//!
//! A [`Recipient`] is identified by its number (or email address) for its whole
//! life. Display details such as the contact name are filled in later by an
//! asynchronous lookup, at which point registered listeners are told.
use std::fmt::Display;
use std::sync::{Arc, PoisonError, RwLock};

use log::debug;

/// Notified when a recipient's display details change.
pub trait RecipientModifiedListener: Send + Sync {
    fn on_modified(&self, recipient: &Recipient);
}

struct RecipientInner {
    number: String,
    name: RwLock<Option<String>>,
    listeners: RwLock<Vec<Arc<dyn RecipientModifiedListener>>>,
}

/// A single participant. Clones share identity and details.
#[derive(Clone)]
pub struct Recipient {
    inner: Arc<RecipientInner>,
}

impl Recipient {
    pub fn new(number: &str) -> Self {
        Self {
            inner: Arc::new(RecipientInner {
                number: number.to_string(),
                name: RwLock::new(None),
                listeners: RwLock::new(Vec::new()),
            }),
        }
    }

    pub fn with_name(number: &str, name: &str) -> Self {
        let recipient = Self::new(number);
        *recipient.inner.name.write().unwrap_or_else(PoisonError::into_inner) =
            Some(name.to_string());
        recipient
    }

    pub fn number(&self) -> &str {
        &self.inner.number
    }

    pub fn name(&self) -> Option<String> {
        self.inner
            .name
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Name if known, number otherwise.
    pub fn to_short_string(&self) -> String {
        self.name().unwrap_or_else(|| self.number().to_string())
    }

    /// Apply the result of a contact lookup and notify listeners.
    pub fn resolve(&self, name: Option<String>) {
        *self
            .inner
            .name
            .write()
            .unwrap_or_else(PoisonError::into_inner) = name;

        let listeners = self
            .inner
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        debug!(
            "[resolve] {} resolved, notifying {} listeners",
            self.number(),
            listeners.len()
        );
        for listener in listeners {
            listener.on_modified(self);
        }
    }

    pub fn add_listener(&self, listener: Arc<dyn RecipientModifiedListener>) {
        self.inner
            .listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(listener);
    }

    pub fn remove_listener(&self, listener: &Arc<dyn RecipientModifiedListener>) {
        self.inner
            .listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|l| !Arc::ptr_eq(l, listener));
    }
}

impl PartialEq for Recipient {
    fn eq(&self, other: &Self) -> bool {
        self.number() == other.number()
    }
}

impl Eq for Recipient {}

impl std::fmt::Debug for Recipient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Recipient")
            .field("number", &self.number())
            .field("name", &self.name())
            .finish()
    }
}

impl Display for Recipient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_short_string())
    }
}

/// Ordered participants of one conversation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Recipients {
    list: Vec<Recipient>,
}

impl Recipients {
    pub fn new(list: Vec<Recipient>) -> Self {
        Self { list }
    }

    pub fn single(recipient: Recipient) -> Self {
        Self {
            list: vec![recipient],
        }
    }

    pub fn append(&mut self, other: &Recipients) {
        self.list.extend(other.list.iter().cloned());
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub fn is_single_recipient(&self) -> bool {
        self.list.len() == 1
    }

    pub fn primary_recipient(&self) -> Option<&Recipient> {
        self.list.first()
    }

    pub fn as_slice(&self) -> &[Recipient] {
        &self.list
    }

    pub fn is_email_recipient(&self) -> bool {
        self.list.iter().any(|r| is_valid_email(r.number()))
    }

    /// Numbers of every recipient; `scrub` keeps only digits and `+` for
    /// anything that is not an email address.
    pub fn to_number_strings(&self, scrub: bool) -> Vec<String> {
        self.list
            .iter()
            .map(|r| {
                let number = r.number();
                if scrub && !is_valid_email(number) {
                    number
                        .chars()
                        .filter(|c| c.is_ascii_digit() || *c == '+')
                        .collect()
                } else {
                    number.to_string()
                }
            })
            .collect()
    }

    pub fn to_short_string(&self) -> String {
        self.list
            .iter()
            .map(Recipient::to_short_string)
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn add_listener(&self, listener: Arc<dyn RecipientModifiedListener>) {
        for recipient in &self.list {
            recipient.add_listener(listener.clone());
        }
    }

    pub fn remove_listener(&self, listener: &Arc<dyn RecipientModifiedListener>) {
        for recipient in &self.list {
            recipient.remove_listener(listener);
        }
    }
}

fn is_valid_email(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !value.chars().any(char::is_whitespace)
}
