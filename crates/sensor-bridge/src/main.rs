//! CAN Sensor Bridge - Main Entry Point

use sensor_bridge::{init_logging, BridgeConfig, MqttBridge};
use topic_router::RouteResolver;
use tracing::info;

/// Used when no path is given on the command line
const DEFAULT_CONFIG_PATH: &str = "can-bridge.toml";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let config = BridgeConfig::load(&path)?;
    init_logging(config.log_level()?)?;

    info!("=== CAN Sensor Bridge v{} ===", env!("CARGO_PKG_VERSION"));

    let table = config.arbitration_table()?;
    info!("Routing {} simulated arbitration ids", table.len());

    let bridge = MqttBridge::new(config.mqtt, RouteResolver::new(table));

    tokio::select! {
        _ = bridge.run() => {}
        result = tokio::signal::ctrl_c() => {
            result?;
            info!("Shutting down");
        }
    }

    Ok(())
}
