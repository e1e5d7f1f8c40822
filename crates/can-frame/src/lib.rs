//! CAN Frame Decoding
//!
//! Turns the JSON-encoded CAN frames published on the sensor bus into
//! normalized sensor results:
//! - Payload parsing for the production and simulation key layouts
//! - Per-algorithm signal extraction (status, distance, blind-spot side)
//! - Encoding of the outbound result document

mod error;
mod frame;
mod result;
mod signal;

pub use error::FrameError;
pub use frame::{CanFrame, PayloadShape};
pub use result::{OutboundResult, ResultData};
pub use signal::{DecodedSignal, Side};

/// Well-known algorithm identifiers
pub mod algorithm {
    /// Blind spot detection; the only algorithm that reports a side
    pub const BLIND_SPOT_DETECTION: &str = "BlindSpotDetection";
    /// Substituted when a frame carries no algorithm identifier
    pub const UNKNOWN: &str = "Unknown";
}
