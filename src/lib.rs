//! HomeGate Library
//!
//! Household automation gateway: multiplexes serial-attached sensor and
//! actuator modules, decodes their line-framed telemetry and bridges a
//! plain-text TCP control channel to them.

pub mod cli;
pub mod core;
pub mod domain;
pub mod infrastructure;

pub use crate::domain::error::{GatewayError, GatewayResult};
pub use crate::domain::config::{DeviceConfig, GatewayConfig};
pub use crate::core::command::{CommandRouter, CommandTranslator, RouteOutcome};
pub use crate::core::framing::LineFramer;
pub use crate::core::gateway::{Gateway, RunningGateway};
pub use crate::core::telemetry::{DecodedRecord, RecordDecoder, TelemetrySink};
pub use crate::infrastructure::serial::{DeviceWriter, SerialMultiplexer, TransportOpener};
