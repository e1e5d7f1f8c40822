//! Sensor Signal Decoding
//!
//! Byte layout shared by every sensor algorithm:
//!
//! | byte | meaning |
//! |------|---------|
//! | 0    | status flag (`1` = active) |
//! | 1    | distance, low byte (cm) |
//! | 2    | distance, high byte (cm) |
//! | 3    | blind spot side (`1` = right), BlindSpotDetection only |

use serde::{Deserialize, Serialize};

use crate::algorithm;
use crate::frame::CanFrame;

/// Side of the vehicle reported by blind spot detection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    #[default]
    #[serde(rename = "Esquerda")]
    Left,
    #[serde(rename = "Direita")]
    Right,
}

/// Readings extracted from a frame's data bytes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecodedSignal {
    /// Detection active
    pub status: bool,
    /// Distance to the detected vehicle (meters)
    pub distance_m: f64,
    /// Only set for blind spot detection
    pub side: Option<Side>,
}

impl DecodedSignal {
    /// Decode the data bytes of a frame produced by `algorithm_id`
    ///
    /// Total over any input length: missing bytes fall back to an inactive
    /// status, a zero distance and the left side.
    pub fn decode(algorithm_id: &str, data: &[u8]) -> Self {
        let status = !data.is_empty() && data[0] == 1;

        let distance_raw = if data.len() > 2 {
            (u16::from(data[2]) << 8) | u16::from(data[1])
        } else {
            0
        };

        let side = (algorithm_id == algorithm::BLIND_SPOT_DETECTION).then(|| {
            if data.len() > 3 && data[3] == 1 {
                Side::Right
            } else {
                Side::Left
            }
        });

        Self {
            status,
            distance_m: f64::from(distance_raw) / 100.0,
            side,
        }
    }

    /// Decode a parsed frame
    pub fn from_frame(frame: &CanFrame) -> Self {
        Self::decode(&frame.algorithm_id, &frame.data)
    }
}
