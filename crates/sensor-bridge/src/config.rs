//! Bridge configuration
//!
//! Layered: built-in defaults, then an optional TOML file, then
//! `CAN_BRIDGE__*` environment variables (`CAN_BRIDGE__MQTT__HOST=broker`).

use std::str::FromStr;
use std::time::Duration;

use ::config::{Config, Environment, File};
use rumqttc::MqttOptions;
use serde::{Deserialize, Serialize};
use topic_router::ArbitrationTable;
use tracing::Level;

use crate::error::ConfigError;

/// Prefix for environment overrides
const ENV_PREFIX: &str = "CAN_BRIDGE";

/// Top-level bridge configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Maximum log level (trace, debug, info, warn, error)
    pub log_level: String,
    pub mqtt: MqttSettings,
    pub routing: RoutingSettings,
}

/// Broker connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MqttSettings {
    pub host: String,
    pub port: u16,
    pub client_id: String,
    pub keep_alive_secs: u64,
    pub clean_session: bool,
    /// Capacity of the client request channel
    pub channel_capacity: usize,
    /// Topic filters subscribed at QoS 1 on every connect
    pub subscriptions: Vec<String>,
}

/// Arbitration id routing for simulated frames
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingSettings {
    pub arbitration: Vec<ArbitrationRoute>,
}

/// One arbitration table entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArbitrationRoute {
    pub id: u32,
    pub topic: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            mqtt: MqttSettings::default(),
            routing: RoutingSettings::default(),
        }
    }
}

impl Default for MqttSettings {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 1883,
            client_id: "can-bridge".to_string(),
            keep_alive_secs: 30,
            clean_session: true,
            channel_capacity: 10,
            subscriptions: vec!["sim/#".to_string(), "can/messages".to_string()],
        }
    }
}

impl Default for RoutingSettings {
    fn default() -> Self {
        let arbitration = ArbitrationTable::default()
            .iter()
            .map(|(id, topic)| ArbitrationRoute {
                id,
                topic: topic.to_string(),
            })
            .collect();

        Self { arbitration }
    }
}

impl BridgeConfig {
    /// Load configuration from `path` (if it exists) and the environment
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: BridgeConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Check every section, as `load` does
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.log_level()?;
        self.mqtt.validate()?;
        self.arbitration_table()?;
        Ok(())
    }

    pub fn log_level(&self) -> Result<Level, ConfigError> {
        Level::from_str(&self.log_level).map_err(|_| ConfigError::LogLevel(self.log_level.clone()))
    }

    /// Build the immutable arbitration table
    pub fn arbitration_table(&self) -> Result<ArbitrationTable, ConfigError> {
        let entries = self
            .routing
            .arbitration
            .iter()
            .map(|route| (route.id, route.topic.clone()));

        Ok(ArbitrationTable::new(entries)?)
    }
}

impl MqttSettings {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.host.is_empty() {
            return Err(ConfigError::Mqtt("host is empty".to_string()));
        }
        if self.client_id.is_empty() {
            return Err(ConfigError::Mqtt("client_id is empty".to_string()));
        }
        if self.channel_capacity == 0 {
            return Err(ConfigError::Mqtt("channel_capacity must be positive".to_string()));
        }
        if self.subscriptions.iter().any(String::is_empty) {
            return Err(ConfigError::Mqtt("empty subscription filter".to_string()));
        }
        Ok(())
    }

    /// Client options for this broker
    pub fn mqtt_options(&self) -> MqttOptions {
        let mut options = MqttOptions::new(&self.client_id, &self.host, self.port);
        options.set_keep_alive(Duration::from_secs(self.keep_alive_secs));
        options.set_clean_session(self.clean_session);
        options
    }
}
