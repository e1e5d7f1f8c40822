//! Bridge Error Types

use can_frame::FrameError;
use thiserror::Error;
use topic_router::TableError;

/// The transport could not accept a publish request
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("Publish to '{topic}' rejected: {reason}")]
    Rejected { topic: String, reason: String },
}

/// Why a message could not be delivered
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Frame decode failed: {0}")]
    Decode(#[from] FrameError),

    #[error("Result encode failed: {0}")]
    Encode(#[from] serde_json::Error),

    #[error(transparent)]
    Publish(#[from] PublishError),
}

/// Configuration loading and validation errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] ::config::ConfigError),

    #[error("Invalid arbitration table: {0}")]
    Routing(#[from] TableError),

    #[error("Invalid log level: {0}")]
    LogLevel(String),

    #[error("Invalid MQTT settings: {0}")]
    Mqtt(String),
}
