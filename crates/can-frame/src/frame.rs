//! CAN Frame Payload Parsing
//!
//! The production bus and the simulator publish the same frame structure
//! under differently cased keys:
//!
//! ```text
//! production: {"AlgorithmID": .., "CAN_Message": {"ArbitrationId": .., "Data": [..]}}
//! simulation: {"algorithm_id": .., "can_message": {"arbitration_id": .., "data": [..]}}
//! ```

use serde_json::{Map, Value};

use crate::algorithm;
use crate::error::FrameError;

/// Key layout of an inbound frame payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadShape {
    /// `can/messages` layout (PascalCase keys)
    Production,
    /// `sim/canmessages` layout (snake_case keys)
    Simulation,
}

/// JSON key names for one payload shape
struct FrameKeys {
    algorithm_id: &'static str,
    can_message: &'static str,
    arbitration_id: &'static str,
    data: &'static str,
}

impl PayloadShape {
    fn keys(&self) -> FrameKeys {
        match self {
            PayloadShape::Production => FrameKeys {
                algorithm_id: "AlgorithmID",
                can_message: "CAN_Message",
                arbitration_id: "ArbitrationId",
                data: "Data",
            },
            PayloadShape::Simulation => FrameKeys {
                algorithm_id: "algorithm_id",
                can_message: "can_message",
                arbitration_id: "arbitration_id",
                data: "data",
            },
        }
    }
}

/// A CAN frame extracted from an inbound payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanFrame {
    /// Sensor algorithm that produced the frame, never empty
    pub algorithm_id: String,
    /// Bus arbitration identifier (routing key only)
    pub arbitration_id: u32,
    /// Raw frame bytes, in bus order
    pub data: Vec<u8>,
}

impl CanFrame {
    /// Create a frame, substituting `"Unknown"` for an empty algorithm id
    pub fn new(algorithm_id: impl Into<String>, arbitration_id: u32, data: Vec<u8>) -> Self {
        let algorithm_id = algorithm_id.into();
        let algorithm_id = if algorithm_id.is_empty() {
            algorithm::UNKNOWN.to_string()
        } else {
            algorithm_id
        };

        Self {
            algorithm_id,
            arbitration_id,
            data,
        }
    }

    /// Parse a raw payload laid out as `shape`
    ///
    /// Missing keys fall back to defaults: no algorithm id gives `"Unknown"`,
    /// no arbitration id gives 0 and a missing or non-array data field gives
    /// an empty frame. Keys that are present with the wrong type are errors.
    pub fn parse(payload: &[u8], shape: PayloadShape) -> Result<Self, FrameError> {
        let keys = shape.keys();
        let root: Value = serde_json::from_slice(payload)?;
        let root = root.as_object().ok_or(FrameError::NotAnObject)?;

        let algorithm_id = match root.get(keys.algorithm_id) {
            None => "",
            Some(Value::String(id)) => id.as_str(),
            Some(_) => {
                return Err(FrameError::InvalidField {
                    field: keys.algorithm_id,
                    expected: "a string",
                })
            }
        };

        let (arbitration_id, data) = match root.get(keys.can_message) {
            None => (0, Vec::new()),
            Some(Value::Object(message)) => (
                parse_arbitration_id(message, keys.arbitration_id)?,
                parse_data(message, keys.data)?,
            ),
            Some(_) => {
                return Err(FrameError::InvalidField {
                    field: keys.can_message,
                    expected: "an object",
                })
            }
        };

        Ok(Self::new(algorithm_id, arbitration_id, data))
    }

    /// Whether this frame comes from the blind spot detection algorithm
    pub fn is_blind_spot(&self) -> bool {
        self.algorithm_id == algorithm::BLIND_SPOT_DETECTION
    }
}

fn parse_arbitration_id(message: &Map<String, Value>, key: &'static str) -> Result<u32, FrameError> {
    match message.get(key) {
        None => Ok(0),
        Some(value) => value
            .as_u64()
            .and_then(|id| u32::try_from(id).ok())
            .ok_or(FrameError::InvalidField {
                field: key,
                expected: "an unsigned 32-bit integer",
            }),
    }
}

fn parse_data(message: &Map<String, Value>, key: &'static str) -> Result<Vec<u8>, FrameError> {
    let elements = match message.get(key) {
        Some(Value::Array(elements)) => elements,
        _ => return Ok(Vec::new()),
    };

    elements
        .iter()
        .enumerate()
        .map(|(index, element)| match element {
            Value::Number(n) if n.is_i64() || n.is_u64() => n
                .as_u64()
                .and_then(|byte| u8::try_from(byte).ok())
                .ok_or_else(|| FrameError::ByteOutOfRange {
                    index,
                    value: n.to_string(),
                }),
            _ => Err(FrameError::InvalidField {
                field: key,
                expected: "an array of integers",
            }),
        })
        .collect()
}
