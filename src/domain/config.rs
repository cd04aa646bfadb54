use crate::domain::error::{GatewayError, GatewayResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;
use std::time::Duration;

/// HomeGate configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Global configuration
    #[serde(default)]
    pub global: GlobalConfig,
    /// TCP control channel
    #[serde(default)]
    pub server: ServerConfig,
    /// Serial line settings shared by every device
    #[serde(default)]
    pub serial: SerialConfig,
    /// Telemetry decoding and persistence
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    /// Extra command translations
    #[serde(default)]
    pub commands: CommandsConfig,
    /// Device registrations
    #[serde(default)]
    pub devices: Vec<DeviceConfig>,
}

/// Global configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalConfig {
    /// Default log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// TCP control channel settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Listening port
    #[serde(default = "default_port")]
    pub port: u16,
    /// Per-session receive buffer size in bytes
    #[serde(default = "default_receive_buffer")]
    pub receive_buffer: usize,
}

/// Serial line settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerialConfig {
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
    #[serde(default = "default_data_bits")]
    pub data_bits: u8,
    #[serde(default = "default_stop_bits")]
    pub stop_bits: u8,
    #[serde(default = "default_parity")]
    pub parity: ParityConfig,
    #[serde(default = "default_flow_control")]
    pub flow_control: FlowControlConfig,
    /// Upper bound on one readiness wait
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
    /// Bytes requested per device read
    #[serde(default = "default_read_chunk")]
    pub read_chunk: usize,
    /// Per-device buffer ceiling; the buffer is discarded once exceeded
    #[serde(default = "default_buffer_ceiling")]
    pub buffer_ceiling: usize,
}

/// Parity configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParityConfig {
    None,
    Odd,
    Even,
}

/// Flow control configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowControlConfig {
    None,
    Hardware,
    Software,
}

/// Where decoded telemetry goes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkKind {
    /// Emit every insert as a log event
    Log,
    /// Append every insert to a JSON lines file
    JsonLines,
}

/// Telemetry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_sink")]
    pub sink: SinkKind,
    /// Output file for the JSON lines sink
    #[serde(default = "default_sink_path")]
    pub path: PathBuf,
    /// Fire level at or above which the fire status is normal
    #[serde(default = "default_fire_normal_min")]
    pub fire_normal_min: i32,
    /// Gas level below which the gas status is danger
    #[serde(default = "default_gas_danger_below")]
    pub gas_danger_below: f32,
}

/// Command translation additions, external verb to device verb
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommandsConfig {
    #[serde(default)]
    pub translations: BTreeMap<String, String>,
}

/// Device configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Logical device name, unique across the gateway
    pub name: String,
    /// Transport path, e.g. /dev/rfcomm0
    pub path: String,
    /// Device description
    #[serde(default)]
    pub description: String,
    /// Per-device baud rate override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baud_rate: Option<u32>,
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_bind() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_receive_buffer() -> usize {
    1024
}

fn default_baud_rate() -> u32 {
    9600
}

fn default_data_bits() -> u8 {
    8
}

fn default_stop_bits() -> u8 {
    1
}

fn default_parity() -> ParityConfig {
    ParityConfig::None
}

fn default_flow_control() -> FlowControlConfig {
    FlowControlConfig::None
}

fn default_poll_interval() -> u64 {
    1000
}

fn default_read_chunk() -> usize {
    1024
}

fn default_buffer_ceiling() -> usize {
    2048
}

fn default_sink() -> SinkKind {
    SinkKind::Log
}

fn default_sink_path() -> PathBuf {
    PathBuf::from("telemetry.jsonl")
}

fn default_fire_normal_min() -> i32 {
    150
}

fn default_gas_danger_below() -> f32 {
    700.0
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
            receive_buffer: default_receive_buffer(),
        }
    }
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            baud_rate: default_baud_rate(),
            data_bits: default_data_bits(),
            stop_bits: default_stop_bits(),
            parity: default_parity(),
            flow_control: default_flow_control(),
            poll_interval_ms: default_poll_interval(),
            read_chunk: default_read_chunk(),
            buffer_ceiling: default_buffer_ceiling(),
        }
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            sink: default_sink(),
            path: default_sink_path(),
            fire_normal_min: default_fire_normal_min(),
            gas_danger_below: default_gas_danger_below(),
        }
    }
}

impl Default for ParityConfig {
    fn default() -> Self {
        default_parity()
    }
}

impl Default for FlowControlConfig {
    fn default() -> Self {
        default_flow_control()
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}

impl SerialConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl DeviceConfig {
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            description: String::new(),
            baud_rate: None,
        }
    }
}

impl GatewayConfig {
    /// Check the invariants the gateway relies on at startup
    pub fn validate(&self) -> GatewayResult<()> {
        let mut seen = HashSet::new();
        for device in &self.devices {
            if device.name.trim().is_empty() {
                return Err(GatewayError::config("device name must not be empty"));
            }
            if device.path.trim().is_empty() {
                return Err(GatewayError::config(format!(
                    "device '{}' has an empty path",
                    device.name
                )));
            }
            if !seen.insert(device.name.as_str()) {
                return Err(GatewayError::config(format!(
                    "device '{}' is registered more than once",
                    device.name
                )));
            }
        }

        if self.serial.buffer_ceiling == 0 {
            return Err(GatewayError::config("serial.buffer_ceiling must be positive"));
        }
        if self.serial.read_chunk == 0 {
            return Err(GatewayError::config("serial.read_chunk must be positive"));
        }
        if self.serial.poll_interval_ms == 0 {
            return Err(GatewayError::config("serial.poll_interval_ms must be positive"));
        }
        if self.server.receive_buffer == 0 {
            return Err(GatewayError::config("server.receive_buffer must be positive"));
        }

        Ok(())
    }
}
