//! Outbound Result Encoding

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::frame::CanFrame;
use crate::signal::{DecodedSignal, Side};

/// Normalized sensor result published for every decoded frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboundResult {
    #[serde(rename = "AlgorithmID")]
    pub algorithm_id: String,
    /// ISO-8601 UTC, seconds precision
    #[serde(rename = "Timestamp")]
    pub timestamp: String,
    #[serde(rename = "Status")]
    pub status: bool,
    #[serde(rename = "Data")]
    pub data: ResultData,
}

/// Algorithm-dependent body of a result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultData {
    /// Present for blind spot detection only
    #[serde(rename = "Side", default, skip_serializing_if = "Option::is_none")]
    pub side: Option<Side>,
    /// Meters
    #[serde(rename = "DistanceToVehicle")]
    pub distance_to_vehicle: f64,
}

impl OutboundResult {
    /// Build the result for a frame and its decoded signal, stamped with `now`
    pub fn encode(frame: &CanFrame, signal: &DecodedSignal, now: DateTime<Utc>) -> Self {
        let side = if frame.is_blind_spot() {
            Some(signal.side.unwrap_or_default())
        } else {
            None
        };

        Self {
            algorithm_id: frame.algorithm_id.clone(),
            timestamp: now.to_rfc3339_opts(SecondsFormat::Secs, true),
            status: signal.status,
            data: ResultData {
                side,
                distance_to_vehicle: signal.distance_m,
            },
        }
    }

    /// Serialize to the wire JSON document
    pub fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}
