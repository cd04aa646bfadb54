// Core module - framing, command handling, telemetry and gateway wiring
pub mod command;
pub mod framing;
pub mod gateway;
pub mod telemetry;
