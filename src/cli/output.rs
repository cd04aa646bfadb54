use crate::cli::args::OutputFormat;
use crate::core::gateway::Gateway;
use crate::core::telemetry::DecodedRecord;
use crate::domain::config::{DeviceConfig, GatewayConfig};
use serde::Serialize;
use std::io;
use tabled::{Table, Tabled};

/// Output writer trait for different formats
pub trait OutputWriter {
    fn write_config(&self, config: &GatewayConfig) -> Result<(), OutputError>;
    fn write_devices(&self, devices: &[DeviceConfig]) -> Result<(), OutputError>;
    fn write_ports(&self, ports: &[String]) -> Result<(), OutputError>;
    fn write_route(&self, preview: &RoutePreview) -> Result<(), OutputError>;
    fn write_record(&self, record: &DecodedRecord) -> Result<(), OutputError>;
    fn write_message(&self, message: &str) -> Result<(), OutputError>;
    fn write_error(&self, error: &str) -> Result<(), OutputError>;
}

/// Output formatting errors
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
}

impl From<OutputError> for crate::domain::error::GatewayError {
    fn from(err: OutputError) -> Self {
        Self::Output(err.to_string())
    }
}

/// What the gateway would do with one control command
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoutePreview {
    pub command: String,
    pub acknowledgment: String,
    /// `None` when the command has no translation and is dropped
    pub translation: Option<String>,
    pub target: String,
}

/// Console output writer
pub struct ConsoleWriter {
    format: OutputFormat,
}

impl ConsoleWriter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }
}

impl OutputWriter for ConsoleWriter {
    fn write_config(&self, config: &GatewayConfig) -> Result<(), OutputError> {
        match self.format {
            OutputFormat::Text => {
                println!("HomeGate Configuration:");
                println!("  Log level: {}", config.global.log_level);
                println!("  Control channel: {}", config.server.bind_addr());
                println!(
                    "  Serial: {} baud, {} data bits, {} stop bits",
                    config.serial.baud_rate, config.serial.data_bits, config.serial.stop_bits
                );
                println!("  Buffer ceiling: {} bytes", config.serial.buffer_ceiling);
                println!("  Telemetry sink: {:?}", config.telemetry.sink);
                println!(
                    "  Thresholds: fire normal from {}, gas danger below {}",
                    config.telemetry.fire_normal_min, config.telemetry.gas_danger_below
                );

                println!("  Translations:");
                for (external, device) in Gateway::translator(config).entries() {
                    println!("    {} -> {}", external, device);
                }

                if !config.devices.is_empty() {
                    println!("  Devices:");
                    for device in &config.devices {
                        println!("    {}: {}", device.name, device.path);
                    }
                }
            }
            OutputFormat::Json => {
                let output = serde_json::to_string_pretty(config)?;
                println!("{}", output);
            }
            OutputFormat::Table => {
                self.write_devices(&config.devices)?;
            }
        }
        Ok(())
    }

    fn write_devices(&self, devices: &[DeviceConfig]) -> Result<(), OutputError> {
        match self.format {
            OutputFormat::Text => {
                for device in devices {
                    println!("Device: {}", device.name);
                    println!("  Path: {}", device.path);
                    let desc = if device.description.is_empty() { "No description" } else { &device.description };
                    println!("  Description: {}", desc);
                    if let Some(baud) = device.baud_rate {
                        println!("  Baud rate: {}", baud);
                    }
                    println!();
                }
            }
            OutputFormat::Json => {
                let output = serde_json::to_string_pretty(devices)?;
                println!("{}", output);
            }
            OutputFormat::Table => {
                if !devices.is_empty() {
                    let table_data: Vec<DeviceTableRow> = devices.iter().map(DeviceTableRow::from).collect();
                    println!("{}", Table::new(table_data));
                }
            }
        }
        Ok(())
    }

    fn write_ports(&self, ports: &[String]) -> Result<(), OutputError> {
        match self.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(ports)?);
            }
            _ => {
                println!("Available serial ports:");
                for port in ports {
                    println!("  {}", port);
                }
            }
        }
        Ok(())
    }

    fn write_route(&self, preview: &RoutePreview) -> Result<(), OutputError> {
        match self.format {
            OutputFormat::Text => {
                println!("Command: {}", preview.command);
                println!("  Acknowledgment: {}", preview.acknowledgment);
                match &preview.translation {
                    Some(translation) => {
                        println!("  Device command: {}", translation);
                        println!("  Target: {}", preview.target);
                    }
                    None => println!("  Unknown command, nothing is sent"),
                }
            }
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(preview)?);
            }
            OutputFormat::Table => {
                println!("{}", Table::new([RouteTableRow::from(preview)]));
            }
        }
        Ok(())
    }

    fn write_record(&self, record: &DecodedRecord) -> Result<(), OutputError> {
        match self.format {
            OutputFormat::Text => match record {
                DecodedRecord::Fire(fire) => {
                    println!("Fire record from {}", fire.source);
                    println!("  Fire: {} ({})", fire.fire_level, fire.fire_status);
                    println!("  Gas: {} ({})", fire.gas_level, fire.gas_status);
                }
                DecodedRecord::Pet(pet) => {
                    println!("Pet record from {}", pet.source);
                    println!("  Food: {}", pet.food);
                    println!("  Water: {}", pet.water);
                    println!("  Toilet: {}", pet.toilet);
                }
                DecodedRecord::Plant(plant) => {
                    println!("Plant record from {}", plant.source);
                    println!("  Soil moisture: {}", plant.soil_moisture);
                    println!("  Illumination: {}", plant.illumination);
                    println!("  Temperature: {}", plant.temperature);
                    println!("  Humidity: {}", plant.humidity);
                }
            },
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(record)?);
            }
            OutputFormat::Table => {
                println!("{}", Table::new(record_rows(record)));
            }
        }
        Ok(())
    }

    fn write_message(&self, message: &str) -> Result<(), OutputError> {
        match self.format {
            OutputFormat::Json => {
                let output = serde_json::json!({
                    "message": message,
                    "level": "info"
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
            _ => {
                println!("{}", message);
            }
        }
        Ok(())
    }

    fn write_error(&self, error: &str) -> Result<(), OutputError> {
        match self.format {
            OutputFormat::Json => {
                let output = serde_json::json!({
                    "error": error,
                    "level": "error"
                });
                eprintln!("{}", serde_json::to_string_pretty(&output)?);
            }
            _ => {
                eprintln!("Error: {}", error);
            }
        }
        Ok(())
    }
}

/// Table row for device configuration
#[derive(Tabled)]
struct DeviceTableRow {
    name: String,
    path: String,
    description: String,
}

impl From<&DeviceConfig> for DeviceTableRow {
    fn from(device: &DeviceConfig) -> Self {
        Self {
            name: device.name.clone(),
            path: device.path.clone(),
            description: device.description.clone(),
        }
    }
}

/// Table row for a routing preview
#[derive(Tabled)]
struct RouteTableRow {
    command: String,
    ack: String,
    translation: String,
    target: String,
}

impl From<&RoutePreview> for RouteTableRow {
    fn from(preview: &RoutePreview) -> Self {
        Self {
            command: preview.command.clone(),
            ack: preview.acknowledgment.clone(),
            translation: preview.translation.clone().unwrap_or_else(|| "-".to_string()),
            target: preview.target.clone(),
        }
    }
}

/// Field/value rows for one decoded record
#[derive(Tabled)]
struct FieldRow {
    field: &'static str,
    value: String,
}

fn record_rows(record: &DecodedRecord) -> Vec<FieldRow> {
    let row = |field, value: String| FieldRow { field, value };
    let mut rows = vec![row("kind", record.kind().to_string())];
    match record {
        DecodedRecord::Fire(fire) => {
            rows.push(row("source", fire.source.clone()));
            rows.push(row("fire_level", fire.fire_level.to_string()));
            rows.push(row("fire_status", fire.fire_status.to_string()));
            rows.push(row("gas_level", fire.gas_level.to_string()));
            rows.push(row("gas_status", fire.gas_status.to_string()));
        }
        DecodedRecord::Pet(pet) => {
            rows.push(row("source", pet.source.clone()));
            rows.push(row("food", pet.food.to_string()));
            rows.push(row("water", pet.water.to_string()));
            rows.push(row("toilet", pet.toilet.to_string()));
        }
        DecodedRecord::Plant(plant) => {
            rows.push(row("source", plant.source.clone()));
            rows.push(row("soil_moisture", plant.soil_moisture.to_string()));
            rows.push(row("illumination", plant.illumination.to_string()));
            rows.push(row("temperature", plant.temperature.to_string()));
            rows.push(row("humidity", plant.humidity.to_string()));
        }
    }
    rows
}
