//! Flow Sensor Reader - Main Entry Point
//!
//! Usage: `flow-sensor [CONFIG_FILE]`. Settings can also come from
//! `FLOW_SENSOR_*` environment variables.

use flow_sensor::{
    init_logging, open_serial, FlowSensorClient, MockSensor, SensorConfig, Transport,
};
use std::path::PathBuf;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = SensorConfig::load(config_path.as_deref())?;
    init_logging(config.verbose)?;

    info!("=== Flow Sensor Reader v{} ===", env!("CARGO_PKG_VERSION"));

    if config.mock {
        info!("Using mock flow sensor");
        return report(MockSensor::new(), config.verbose).await;
    }

    let port = open_serial(&config.port, config.baud_rate)?;
    // Opening the port resets the board; wait for the firmware to boot
    tokio::time::sleep(config.settle_delay()).await;
    report(port, config.verbose).await
}

async fn report<T: Transport>(
    transport: T,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut sensor = FlowSensorClient::with_verbosity(transport, verbose).await?;

    println!("Device ID : {}", sensor.get_identification().await?);
    println!("Flow rate : {}", sensor.get_flow_rate().await?);
    println!("Temp : {}", sensor.get_temp().await?);
    println!("Bubble Fault : {}", sensor.query_bubble_fault().await?);
    println!("Flow Fault : {}", sensor.query_flow_fault().await?);

    sensor.close();
    Ok(())
}
