//! Message state: mask decoding, classification and display.

pub mod classify;
pub mod mask;
pub mod record;
pub mod status;
pub mod tag;

pub use classify::{
    classify, Classification, Classifier, DisplayBranch, DisplayTexts, MessageFlags, Summary,
};
pub use mask::{
    AtRest, BaseType, DecodedType, DecryptState, Direction, KeyExchangeState, MessageTypeMask,
    TransportSecurity,
};
pub use record::{
    Body, DistributionType, MessageRecord, RecordKey, ThreadSummary, TransportKind,
};
pub use status::{DeliveryStatus, StatusThresholds};
