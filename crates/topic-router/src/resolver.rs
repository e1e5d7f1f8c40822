//! Route Resolution
//!
//! Resolution runs in two steps. The inbound topic is first classified;
//! exact topics (`can/messages`, `sim/canmessages`) win over the `sim/`
//! prefix rule. The class plus, for simulated frames, the parsed frame
//! then yield exactly one terminal [`Route`].

use can_frame::{CanFrame, PayloadShape};
use thiserror::Error;

use crate::table::ArbitrationTable;
use crate::topics;

/// Classification of an inbound topic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopicClass<'a> {
    /// `can/messages`
    SensorFrames,
    /// `sim/canmessages`
    SimulationFrames,
    /// Any other `sim/...` topic; holds the part after `sim/`
    SimulationPassthrough(&'a str),
    /// Not handled by the bridge
    Unrecognized,
}

impl<'a> TopicClass<'a> {
    pub fn classify(topic: &'a str) -> Self {
        if topic == topics::CAN_MESSAGES {
            return TopicClass::SensorFrames;
        }
        if topic == topics::SIM_CAN_MESSAGES {
            return TopicClass::SimulationFrames;
        }
        match topic.strip_prefix(topics::SIM_PREFIX) {
            Some(suffix) => TopicClass::SimulationPassthrough(suffix),
            None => TopicClass::Unrecognized,
        }
    }

    /// Payload layout to decode, if this class carries CAN frames
    pub fn payload_shape(&self) -> Option<PayloadShape> {
        match self {
            TopicClass::SensorFrames => Some(PayloadShape::Production),
            TopicClass::SimulationFrames => Some(PayloadShape::Simulation),
            _ => None,
        }
    }
}

/// Why a message is not published
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DropReason {
    #[error("no specific-topic mapping for arbitration id 0x{0:X}")]
    UnmappedArbitrationId(u32),

    #[error("no decoded frame to route")]
    MissingFrame,

    #[error("topic not recognized")]
    UnrecognizedTopic,
}

/// Terminal routing decision for one message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Publish the encoded result to this topic
    Forward(String),
    /// Publish the raw payload, unchanged, to this topic
    Redirect(String),
    /// Publish nothing
    Drop(DropReason),
}

/// Stateless resolver over an immutable arbitration table
#[derive(Debug, Clone, Default)]
pub struct RouteResolver {
    table: ArbitrationTable,
}

impl RouteResolver {
    pub fn new(table: ArbitrationTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &ArbitrationTable {
        &self.table
    }

    /// Resolve the destination of a message received on `topic`
    ///
    /// `frame` is only consulted for `sim/canmessages`.
    pub fn resolve(&self, topic: &str, frame: Option<&CanFrame>) -> Route {
        self.resolve_class(TopicClass::classify(topic), frame)
    }

    /// Resolve an already classified topic
    pub fn resolve_class(&self, class: TopicClass<'_>, frame: Option<&CanFrame>) -> Route {
        match class {
            TopicClass::SensorFrames => Route::Forward(topics::SENSOR_DETECTOR.to_string()),
            TopicClass::SimulationFrames => match frame {
                Some(frame) => match self.table.get(frame.arbitration_id) {
                    Some(topic) => Route::Forward(topic.to_string()),
                    None => Route::Drop(DropReason::UnmappedArbitrationId(frame.arbitration_id)),
                },
                None => Route::Drop(DropReason::MissingFrame),
            },
            TopicClass::SimulationPassthrough(suffix) => {
                Route::Redirect(format!("{}{}", topics::REDIRECT_PREFIX, suffix))
            }
            TopicClass::Unrecognized => Route::Drop(DropReason::UnrecognizedTopic),
        }
    }
}
