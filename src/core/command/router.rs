use crate::core::command::translator::{CommandTranslator, DeviceCommand};
use crate::domain::error::GatewayError;
use crate::infrastructure::serial::DeviceWriter;
use std::fmt;
use tracing::{info, warn};

pub const WINDOW_MODULE: &str = "windowModule";
pub const LIGHT_MODULE: &str = "lightModule";
pub const DOOR_MODULE: &str = "doorModule";

/// Where a translated command goes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Device(&'static str),
    Broadcast,
}

impl Target {
    /// Choose the target from the external command text.
    ///
    /// Substring match anywhere in the command, checked in this order:
    /// `window`, `light`, `door`, then `set_`.
    pub fn select(command: &str) -> Self {
        if command.contains("window") {
            Self::Device(WINDOW_MODULE)
        } else if command.contains("light") {
            Self::Device(LIGHT_MODULE)
        } else if command.contains("door") {
            Self::Device(DOOR_MODULE)
        } else if command.contains("set_") {
            Self::Device(WINDOW_MODULE)
        } else {
            Self::Broadcast
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Device(name) => f.write_str(name),
            Self::Broadcast => f.write_str("all devices"),
        }
    }
}

/// What happened to one routed command
#[derive(Debug)]
pub enum RouteOutcome {
    /// No translation exists; nothing was sent
    Unknown(GatewayError),
    Delivered {
        device: String,
        command: DeviceCommand,
    },
    Failed {
        device: String,
        error: GatewayError,
    },
    Broadcast {
        command: DeviceCommand,
        delivered: usize,
    },
    /// At least one device in a broadcast did not take the write
    PartiallyDelivered {
        command: DeviceCommand,
        delivered: usize,
        failed: usize,
    },
}

impl RouteOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered { .. } | Self::Broadcast { .. })
    }
}

/// Translates control commands and writes them to the chosen devices
#[derive(Clone)]
pub struct CommandRouter {
    translator: CommandTranslator,
    writer: DeviceWriter,
}

impl CommandRouter {
    pub fn new(translator: CommandTranslator, writer: DeviceWriter) -> Self {
        Self { translator, writer }
    }

    pub async fn route(&self, command: &str) -> RouteOutcome {
        let Some(device_command) = self.translator.translate(command) else {
            let miss = GatewayError::TranslationMiss(command.to_string());
            info!(command = %command, "{}", miss);
            return RouteOutcome::Unknown(miss);
        };

        match Target::select(command) {
            Target::Device(device) => {
                match self.writer.write_to(device, device_command.as_str()).await {
                    Ok(()) => {
                        info!(device = %device, command = %device_command, "Command sent");
                        RouteOutcome::Delivered {
                            device: device.to_string(),
                            command: device_command,
                        }
                    }
                    Err(error) => {
                        warn!(device = %device, command = %device_command, "Command not delivered: {}", error);
                        RouteOutcome::Failed {
                            device: device.to_string(),
                            error,
                        }
                    }
                }
            }
            Target::Broadcast => self.broadcast(device_command).await,
        }
    }

    async fn broadcast(&self, command: DeviceCommand) -> RouteOutcome {
        let mut delivered = 0;
        let mut failed = 0;

        for device in self.writer.device_names().await {
            match self.writer.write_to(&device, command.as_str()).await {
                Ok(()) => delivered += 1,
                Err(e) => {
                    warn!(device = %device, command = %command, "Broadcast write failed: {}", e);
                    failed += 1;
                }
            }
        }

        if failed == 0 {
            info!(command = %command, delivered, "Broadcast command sent");
            RouteOutcome::Broadcast { command, delivered }
        } else {
            warn!(command = %command, delivered, failed, "Broadcast not fully delivered");
            RouteOutcome::PartiallyDelivered {
                command,
                delivered,
                failed,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::serial::BoxedTransport;
    use std::sync::Arc;
    use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader, DuplexStream};

    async fn attach(writer: &DeviceWriter, name: &str) -> DuplexStream {
        let (ours, theirs) = tokio::io::duplex(64 * 1024);
        let transport: BoxedTransport = Box::new(ours);
        let (_reader, half) = tokio::io::split(transport);
        writer.attach(name.to_string(), half).await;
        theirs
    }

    fn router(writer: &DeviceWriter) -> CommandRouter {
        let translator = CommandTranslator::builtin().with_entry("fan_on", "CMD_FAN_ON");
        CommandRouter::new(translator, writer.clone())
    }

    #[test]
    fn test_target_selection() {
        assert_eq!(Target::select("light_on"), Target::Device(LIGHT_MODULE));
        assert_eq!(Target::select("set_angle=30"), Target::Device(WINDOW_MODULE));
        assert_eq!(Target::select("window_close"), Target::Device(WINDOW_MODULE));
        assert_eq!(Target::select("door_open"), Target::Device(DOOR_MODULE));
        assert_eq!(Target::select("fan_on"), Target::Broadcast);
    }

    #[test]
    fn test_target_selection_order() {
        // Keyword anywhere in the command, window checked before door.
        assert_eq!(Target::select("door_window"), Target::Device(WINDOW_MODULE));
        assert_eq!(Target::select("set_door"), Target::Device(DOOR_MODULE));
        assert_eq!(Target::Broadcast.to_string(), "all devices");
    }

    #[tokio::test]
    async fn test_route_to_single_device() {
        let writer = DeviceWriter::new();
        let mut light = attach(&writer, LIGHT_MODULE).await;
        let _window = attach(&writer, WINDOW_MODULE).await;

        let outcome = router(&writer).route("light_on").await;
        assert!(matches!(outcome, RouteOutcome::Delivered { ref device, .. } if device == LIGHT_MODULE));

        let mut buf = vec![0u8; "CMD_LIGHT_ON\n".len()];
        light.read_exact(&mut buf).await.unwrap();
        assert_eq!(buf, b"CMD_LIGHT_ON\n");
    }

    #[tokio::test]
    async fn test_unknown_command_sends_nothing() {
        let writer = DeviceWriter::new();
        let _light = attach(&writer, LIGHT_MODULE).await;

        let outcome = router(&writer).route("light_dim").await;
        assert!(matches!(
            outcome,
            RouteOutcome::Unknown(GatewayError::TranslationMiss(ref c)) if c == "light_dim"
        ));
        assert!(!outcome.is_delivered());
    }

    #[tokio::test]
    async fn test_missing_target_is_recorded() {
        let writer = DeviceWriter::new();
        let _light = attach(&writer, LIGHT_MODULE).await;

        let outcome = router(&writer).route("door_open").await;
        match outcome {
            RouteOutcome::Failed { device, error } => {
                assert_eq!(device, DOOR_MODULE);
                assert!(matches!(error, GatewayError::DeviceNotFound(_)));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_broadcast_reaches_every_device() {
        let writer = DeviceWriter::new();
        let mut fire = attach(&writer, "fireModule").await;
        let mut pet = attach(&writer, "petModule").await;

        let outcome = router(&writer).route("fan_on").await;
        assert!(matches!(outcome, RouteOutcome::Broadcast { delivered: 2, .. }));

        for device in [&mut fire, &mut pet] {
            let mut buf = vec![0u8; "CMD_FAN_ON\n".len()];
            device.read_exact(&mut buf).await.unwrap();
            assert_eq!(buf, b"CMD_FAN_ON\n");
        }
    }

    #[tokio::test]
    async fn test_broadcast_partial_failure() {
        let writer = DeviceWriter::new();
        let _fire = attach(&writer, "fireModule").await;
        let pet = attach(&writer, "petModule").await;
        drop(pet);

        let outcome = router(&writer).route("fan_on").await;
        assert!(matches!(
            outcome,
            RouteOutcome::PartiallyDelivered { delivered: 1, failed: 1, .. }
        ));
    }

    #[tokio::test]
    async fn test_concurrent_writes_never_interleave() {
        let writer = DeviceWriter::new();
        let window = attach(&writer, WINDOW_MODULE).await;
        let router = Arc::new(router(&writer));

        let mut tasks = Vec::new();
        for i in 0..32 {
            let router = Arc::clone(&router);
            let command = if i % 2 == 0 { "window_open" } else { "window_close" };
            tasks.push(tokio::spawn(async move { router.route(command).await }));
        }
        for task in tasks {
            assert!(task.await.unwrap().is_delivered());
        }
        drop(router);
        drop(writer);

        let mut lines = BufReader::new(window).lines();
        let mut count = 0;
        while let Some(line) = lines.next_line().await.unwrap() {
            assert!(line == "OPEN" || line == "CLOSE", "corrupted line: {line:?}");
            count += 1;
        }
        assert_eq!(count, 32);
    }
}
