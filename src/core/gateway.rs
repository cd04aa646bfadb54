//! Startup and shutdown sequencing for the whole gateway.
//!
//! Order on start: register devices, open them all (any failure aborts),
//! spawn the serial read loop, then bind and start the control server. Order on
//! shutdown: stop accepting clients, cancel the read loop and wait for it.

use crate::core::command::{CommandRouter, CommandTranslator};
use crate::core::telemetry::{RecordDecoder, TelemetrySink, Thresholds};
use crate::domain::config::GatewayConfig;
use crate::domain::error::{GatewayError, GatewayResult};
use crate::infrastructure::serial::{
    DeviceWriter, MultiplexerSettings, SerialMultiplexer, TransportOpener,
};
use crate::infrastructure::tcp::ControlServer;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// How long shutdown waits for the read loop to notice cancellation
const READ_LOOP_JOIN_TIMEOUT: Duration = Duration::from_secs(5);

pub struct Gateway {
    config: GatewayConfig,
    opener: Arc<dyn TransportOpener>,
    sink: Arc<dyn TelemetrySink>,
}

impl Gateway {
    pub fn new(
        config: GatewayConfig,
        opener: Arc<dyn TransportOpener>,
        sink: Arc<dyn TelemetrySink>,
    ) -> Self {
        Self {
            config,
            opener,
            sink,
        }
    }

    /// The translator described by the configuration
    pub fn translator(config: &GatewayConfig) -> CommandTranslator {
        CommandTranslator::builtin().with_entries(config.commands.translations.clone())
    }

    pub async fn start(self) -> GatewayResult<RunningGateway> {
        self.config.validate()?;

        let decoder = RecordDecoder::new(Thresholds::from(&self.config.telemetry));
        let mut multiplexer = SerialMultiplexer::new(
            MultiplexerSettings::from(&self.config.serial),
            self.opener,
            self.sink,
        )
        .with_decoder(decoder);

        for device in &self.config.devices {
            multiplexer.register(device.clone())?;
        }
        multiplexer.start().await?;

        let writer = multiplexer.writer();
        let cancel = CancellationToken::new();
        let read_loop = tokio::spawn(multiplexer.run_read_loop(cancel.clone()));

        let router = Arc::new(CommandRouter::new(Self::translator(&self.config), writer.clone()));

        let server = match ControlServer::bind(
            &self.config.server.bind_addr(),
            self.config.server.receive_buffer,
        )
        .await
        {
            Ok(server) => server,
            Err(e) => {
                cancel.cancel();
                let _ = read_loop.await;
                return Err(e);
            }
        };

        let mut running = RunningGateway {
            server,
            writer,
            cancel,
            read_loop: Some(read_loop),
        };
        running.server.start(router)?;

        info!(
            addr = %running.local_addr(),
            devices = self.config.devices.len(),
            "Gateway started"
        );
        Ok(running)
    }
}

/// A started gateway
pub struct RunningGateway {
    server: ControlServer,
    writer: DeviceWriter,
    cancel: CancellationToken,
    read_loop: Option<JoinHandle<GatewayResult<()>>>,
}

impl RunningGateway {
    pub fn local_addr(&self) -> SocketAddr {
        self.server.local_addr()
    }

    pub fn writer(&self) -> DeviceWriter {
        self.writer.clone()
    }

    pub async fn shutdown(mut self) -> GatewayResult<()> {
        info!("Gateway shutting down");
        self.server.stop().await?;
        self.cancel.cancel();

        if let Some(handle) = self.read_loop.take() {
            join_or_abort(handle, READ_LOOP_JOIN_TIMEOUT).await?;
        }

        info!("Gateway stopped");
        Ok(())
    }
}

/// Wait up to `limit` for the read loop, aborting it if it is still running
async fn join_or_abort(
    mut handle: JoinHandle<GatewayResult<()>>,
    limit: Duration,
) -> GatewayResult<()> {
    match tokio::time::timeout(limit, &mut handle).await {
        Ok(Ok(result)) => result,
        Ok(Err(e)) => Err(GatewayError::lifecycle(format!("read loop task failed: {}", e))),
        Err(_) => {
            warn!("Read loop did not stop within {:?}; aborting it", limit);
            handle.abort();
            Ok(())
        }
    }
}

impl Drop for RunningGateway {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_join_or_abort_returns_loop_result() {
        let handle = tokio::spawn(async { Ok(()) });
        assert!(join_or_abort(handle, Duration::from_secs(1)).await.is_ok());

        let handle = tokio::spawn(async { Err(GatewayError::lifecycle("boom")) });
        assert!(join_or_abort(handle, Duration::from_secs(1)).await.is_err());
    }

    #[tokio::test]
    async fn test_join_or_abort_stops_stuck_loop() {
        let alive = Arc::new(());
        let held = Arc::clone(&alive);
        let handle = tokio::spawn(async move {
            let _held = held;
            std::future::pending::<()>().await;
            Ok(())
        });

        join_or_abort(handle, Duration::from_millis(20)).await.unwrap();

        // The aborted task drops what it owned
        for _ in 0..50 {
            if Arc::strong_count(&alive) == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(Arc::strong_count(&alive), 1);
    }
}
