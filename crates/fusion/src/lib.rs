//! Decoding, cross-model deduplication and totalling of currency detections.
//!
//! Everything in this crate is pure: no I/O, no shared state, and the same
//! input always produces the same output.

pub mod aggregate;
pub mod decode;
pub mod dedup;
pub mod denomination;
pub mod detection;
pub mod errors;
pub mod locale;

pub use aggregate::{Aggregator, MessageFormatter, RunResult};
pub use decode::{DEFAULT_CONFIDENCE_THRESHOLD, Decoder, SLOT_WIDTH};
pub use dedup::{DEFAULT_IOU_THRESHOLD, Deduplicator};
pub use denomination::DenominationTable;
pub use detection::{BoundingBox, Detection};
pub use errors::FusionError;
pub use locale::Locale;
