//! Inbound transport intake.
//!
//! Decides what happens to a raw SMS payload before anything else in the
//! client sees it: drop it, treat it as a registration challenge, or hand it
//! to the secure pipeline. Everything in this crate is pure; emitting the
//! challenge and queueing the payload is left to the caller.

mod challenge;
mod filter;
mod payload;
pub mod wire;

pub use challenge::{parse_verification_code, VERIFICATION_PREFIX};
pub use filter::{exemption, filter_intake, ExemptReason, Intake, IntakeConfig};
pub use payload::{InboundPayload, MessageClass, PayloadPart};
