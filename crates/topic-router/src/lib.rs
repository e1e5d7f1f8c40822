//! Topic Routing
//!
//! Decides where each inbound bus message goes:
//! - `can/messages` frames are forwarded to the sensor detector topic
//! - `sim/canmessages` frames are routed by arbitration id
//! - any other `sim/...` topic is redirected to `moto/...` untouched
//! - everything else is dropped

mod resolver;
mod table;

pub use resolver::{DropReason, Route, RouteResolver, TopicClass};
pub use table::{ArbitrationTable, TableError};

/// Fixed topic names
pub mod topics {
    /// Production CAN frames
    pub const CAN_MESSAGES: &str = "can/messages";
    /// Destination of decoded production frames
    pub const SENSOR_DETECTOR: &str = "sensor/sensordetector";
    /// Simulated CAN frames
    pub const SIM_CAN_MESSAGES: &str = "sim/canmessages";
    /// Simulation namespace
    pub const SIM_PREFIX: &str = "sim/";
    /// Production-equivalent namespace for redirected simulation topics
    pub const REDIRECT_PREFIX: &str = "moto/";
}
