use crate::core::telemetry::{
    FireReading, HomeEnvironment, LogSink, PetReading, PlantReading, TelemetrySink,
};
use crate::domain::config::{SinkKind, TelemetryConfig};
use crate::domain::error::{GatewayError, GatewayResult};
use async_trait::async_trait;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::info;

/// Appends every insert to a file as one JSON object per line
pub struct JsonLinesSink {
    path: PathBuf,
    file: Mutex<File>,
}

#[derive(Serialize)]
struct Entry<'a, T: Serialize> {
    table: &'static str,
    timestamp: u64,
    data: &'a T,
}

impl JsonLinesSink {
    pub async fn open(path: impl AsRef<Path>) -> GatewayResult<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(|e| GatewayError::sink(format!("Failed to open {}: {}", path.display(), e)))?;

        info!("Writing telemetry to {}", path.display());
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn append<T: Serialize + Sync>(&self, table: &'static str, data: &T) -> GatewayResult<()> {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        let mut line = serde_json::to_string(&Entry {
            table,
            timestamp,
            data,
        })
        .map_err(|e| GatewayError::sink(format!("Failed to encode {} row: {}", table, e)))?;
        line.push('\n');

        let mut file = self.file.lock().await;
        file.write_all(line.as_bytes())
            .await
            .map_err(|e| GatewayError::sink(format!("Failed to append to {}: {}", self.path.display(), e)))?;
        file.flush()
            .await
            .map_err(|e| GatewayError::sink(format!("Failed to flush {}: {}", self.path.display(), e)))
    }
}

#[async_trait]
impl TelemetrySink for JsonLinesSink {
    async fn insert_fire(&self, reading: &FireReading) -> GatewayResult<()> {
        self.append("fire_events", reading).await
    }

    async fn insert_pet(&self, reading: &PetReading) -> GatewayResult<()> {
        self.append("pet_status", reading).await
    }

    async fn insert_plant(&self, reading: &PlantReading) -> GatewayResult<()> {
        self.append("plant_env", reading).await
    }

    async fn insert_home(&self, environment: &HomeEnvironment) -> GatewayResult<()> {
        self.append("home_env", environment).await
    }
}

/// Build the sink selected in the configuration
pub async fn open_sink(config: &TelemetryConfig) -> GatewayResult<Arc<dyn TelemetrySink>> {
    match config.sink {
        SinkKind::Log => Ok(Arc::new(LogSink)),
        SinkKind::JsonLines => Ok(Arc::new(JsonLinesSink::open(&config.path).await?)),
    }
}
