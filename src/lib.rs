//! Trust and state core of a secure SMS client.
//!
//! - [`keycache`] holds the unlocked credential and evicts it on request or
//!   after inactivity.
//! - [`message`] decodes stored type masks and decides what each message and
//!   thread shows.
//! - [`receiver`] applies the [`intake`] filter to inbound SMS and routes the
//!   result.

pub mod bootstrap;
pub mod cache;
pub mod config;
pub mod error;
pub mod events;
pub mod keycache;
pub mod message;
pub mod receiver;
pub mod recipients;
pub mod services;

pub use bootstrap::{
    bootstrap_core, bootstrap_core_from_env, bootstrap_core_with_alarms, Core, CoreServices,
};
pub use cache::RecordCache;
pub use config::CoreConfig;
pub use error::ConfigError;
pub use events::{CoreEvent, EventBus, EventKind, Subscription};
pub use keycache::{Credential, KeyCache, LockPolicy};
pub use message::{classify, Classification, Classifier, DeliveryStatus, DisplayBranch};
pub use receiver::{Disposition, IntakeSettings, SmsReceiver};
pub use recipients::{Recipient, Recipients};

pub use intake;
