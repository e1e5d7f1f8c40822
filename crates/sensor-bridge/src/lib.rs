//! CAN Sensor Bridge
//!
//! Subscribes to the CAN frame topics of the sensor bus, decodes each frame
//! and republishes a normalized result on the routed output topic.

mod clock;
mod config;
mod dispatch;
mod error;
mod mqtt;
mod publisher;

pub use crate::clock::{Clock, FixedClock, SystemClock};
pub use crate::config::{ArbitrationRoute, BridgeConfig, MqttSettings, RoutingSettings};
pub use crate::dispatch::{DispatchOutcome, Dispatcher};
pub use crate::error::{ConfigError, DispatchError, PublishError};
pub use crate::mqtt::{MqttBridge, MqttPublisher};
pub use crate::publisher::Publisher;

use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Initialize logging
pub fn init_logging(level: Level) -> Result<(), tracing::subscriber::SetGlobalDefaultError> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
}
