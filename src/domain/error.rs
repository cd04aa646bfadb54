use thiserror::Error;

/// HomeGate unified error type
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Failed to open device '{device}' at {path}: {source}")]
    OpenFailure {
        device: String,
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Readiness wait failed: {0}")]
    ReadinessWait(String),

    #[error("Write to device '{device}' failed: {source}")]
    Write {
        device: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    #[error("No translation for command: {0}")]
    TranslationMiss(String),

    #[error("Buffer overflow on device '{device}': discarded {discarded} bytes")]
    BufferOverflow { device: String, discarded: usize },

    #[error("Malformed {kind} record '{line}': {reason}")]
    MalformedRecord {
        kind: &'static str,
        line: String,
        reason: String,
    },

    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    #[error("Failed to bind to {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Network error: {0}")]
    Network(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Lifecycle error: {message}")]
    Lifecycle { message: String },

    #[error("Telemetry sink error: {message}")]
    Sink { message: String },

    #[error("Output error: {0}")]
    Output(String),
}

pub type GatewayResult<T> = Result<T, GatewayError>;

impl GatewayError {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub(crate) fn lifecycle(message: impl Into<String>) -> Self {
        Self::Lifecycle {
            message: message.into(),
        }
    }

    pub(crate) fn sink(message: impl Into<String>) -> Self {
        Self::Sink {
            message: message.into(),
        }
    }
}
