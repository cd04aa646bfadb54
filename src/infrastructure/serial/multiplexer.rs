use crate::core::framing::{FramerEvent, LineFramer, DEFAULT_BUFFER_CEILING};
use crate::core::telemetry::{dispatch, RecordDecoder, TelemetrySink};
use crate::domain::config::{DeviceConfig, SerialConfig};
use crate::domain::error::{GatewayError, GatewayResult};
use crate::infrastructure::serial::transport::{BoxedTransport, TransportOpener};
use futures::stream::{self, StreamExt};
use futures::FutureExt;
use std::collections::{BTreeMap, HashMap};
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncWriteExt, ReadHalf, WriteHalf};
use tokio::sync::Mutex;
use tokio_util::io::ReaderStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

/// Read loop tuning
#[derive(Debug, Clone, Copy)]
pub struct MultiplexerSettings {
    /// Upper bound on one readiness wait
    pub poll_interval: Duration,
    /// Bytes requested per device read
    pub read_chunk: usize,
    /// Per-device buffer ceiling
    pub buffer_ceiling: usize,
}

impl Default for MultiplexerSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            read_chunk: 1024,
            buffer_ceiling: DEFAULT_BUFFER_CEILING,
        }
    }
}

impl From<&SerialConfig> for MultiplexerSettings {
    fn from(config: &SerialConfig) -> Self {
        Self {
            poll_interval: config.poll_interval(),
            read_chunk: config.read_chunk,
            buffer_ceiling: config.buffer_ceiling,
        }
    }
}

/// Shared write path into every open device.
///
/// One lock covers all devices, so a write and its trailing newline always land
/// on the transport as a unit.
#[derive(Clone, Default)]
pub struct DeviceWriter {
    devices: Arc<Mutex<BTreeMap<String, WriteHalf<BoxedTransport>>>>,
}

impl DeviceWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) async fn attach(&self, name: String, half: WriteHalf<BoxedTransport>) {
        self.devices.lock().await.insert(name, half);
    }

    /// Write `payload` plus a newline to one device
    pub async fn write_to(&self, name: &str, payload: &str) -> GatewayResult<()> {
        let mut devices = self.devices.lock().await;
        let half = devices
            .get_mut(name)
            .ok_or_else(|| GatewayError::DeviceNotFound(name.to_string()))?;

        let frame = format!("{}\n", payload);
        let written: io::Result<()> = async {
            half.write_all(frame.as_bytes()).await?;
            half.flush().await
        }
        .await;

        match written {
            Ok(()) => {
                debug!(device = %name, payload = %payload, "sent");
                Ok(())
            }
            Err(source) => Err(GatewayError::Write {
                device: name.to_string(),
                source,
            }),
        }
    }

    /// Registered device names in a stable order
    pub async fn device_names(&self) -> Vec<String> {
        self.devices.lock().await.keys().cloned().collect()
    }

    pub async fn contains(&self, name: &str) -> bool {
        self.devices.lock().await.contains_key(name)
    }
}

/// Owns every device channel and runs the telemetry read loop
pub struct SerialMultiplexer {
    settings: MultiplexerSettings,
    opener: Arc<dyn TransportOpener>,
    sink: Arc<dyn TelemetrySink>,
    decoder: RecordDecoder,
    registrations: Vec<DeviceConfig>,
    readers: Vec<(String, ReadHalf<BoxedTransport>)>,
    writer: DeviceWriter,
    started: bool,
}

impl SerialMultiplexer {
    pub fn new(
        settings: MultiplexerSettings,
        opener: Arc<dyn TransportOpener>,
        sink: Arc<dyn TelemetrySink>,
    ) -> Self {
        Self {
            settings,
            opener,
            sink,
            decoder: RecordDecoder::default(),
            registrations: Vec::new(),
            readers: Vec::new(),
            writer: DeviceWriter::new(),
            started: false,
        }
    }

    pub fn with_decoder(mut self, decoder: RecordDecoder) -> Self {
        self.decoder = decoder;
        self
    }

    pub fn register_device(&mut self, name: impl Into<String>, path: impl Into<String>) -> GatewayResult<()> {
        self.register(DeviceConfig::new(name, path))
    }

    pub fn register(&mut self, device: DeviceConfig) -> GatewayResult<()> {
        if self.started {
            return Err(GatewayError::lifecycle(format!(
                "cannot register '{}' after start",
                device.name
            )));
        }
        if self.registrations.iter().any(|d| d.name == device.name) {
            return Err(GatewayError::config(format!(
                "device '{}' is already registered",
                device.name
            )));
        }

        debug!(device = %device.name, path = %device.path, "Registered device");
        self.registrations.push(device);
        Ok(())
    }

    pub fn registrations(&self) -> &[DeviceConfig] {
        &self.registrations
    }

    /// Open every registered device, all or nothing
    pub async fn start(&mut self) -> GatewayResult<()> {
        if self.started {
            return Err(GatewayError::lifecycle("serial multiplexer already started"));
        }

        let mut opened = Vec::with_capacity(self.registrations.len());
        for device in &self.registrations {
            let transport = self.opener.open(device).await.map_err(|source| {
                error!(device = %device.name, path = %device.path, "Failed to open device: {}", source);
                GatewayError::OpenFailure {
                    device: device.name.clone(),
                    path: device.path.clone(),
                    source,
                }
            })?;
            info!(device = %device.name, path = %device.path, "Device port opened");
            opened.push((device.name.clone(), transport));
        }

        for (name, transport) in opened {
            let (reader, writer) = tokio::io::split(transport);
            self.writer.attach(name.clone(), writer).await;
            self.readers.push((name, reader));
        }

        self.started = true;
        Ok(())
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Handle onto the shared write path
    pub fn writer(&self) -> DeviceWriter {
        self.writer.clone()
    }

    pub async fn write_to(&self, name: &str, payload: &str) -> GatewayResult<()> {
        self.writer.write_to(name, payload).await
    }

    /// Read, frame and decode device output until `cancel` fires
    pub async fn run_read_loop(self, cancel: CancellationToken) -> GatewayResult<()> {
        if !self.started {
            return Err(GatewayError::lifecycle("read loop requires a started multiplexer"));
        }

        let settings = self.settings;
        let mut state = ReadLoopState {
            framers: HashMap::new(),
            decoder: self.decoder,
            sink: self.sink,
        };

        let mut streams = stream::select_all(self.readers.into_iter().map(|(name, reader)| {
            state
                .framers
                .insert(name.clone(), LineFramer::with_ceiling(settings.buffer_ceiling));
            let tag = name.clone();
            ReaderStream::with_capacity(reader, settings.read_chunk)
                .map(move |chunk| (tag.clone(), Some(chunk)))
                .chain(stream::once(async move { (name, None) }))
                .boxed()
        }));

        info!(devices = state.framers.len(), "Serial read loop started");

        loop {
            if streams.is_empty() {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(settings.poll_interval) => continue,
                }
            }

            let ready = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                ready = tokio::time::timeout(settings.poll_interval, streams.next()) => ready,
            };

            let (name, event) = match ready {
                Err(_) => {
                    trace!("No device activity within {:?}", settings.poll_interval);
                    continue;
                }
                Ok(None) => continue,
                Ok(Some(event)) => event,
            };
            state.on_event(&name, event).await;

            // Serve every other device that is already readable.
            while let Some(Some((name, event))) = streams.next().now_or_never() {
                state.on_event(&name, event).await;
            }
        }

        info!("Serial read loop stopped");
        Ok(())
    }
}

struct ReadLoopState {
    framers: HashMap<String, LineFramer>,
    decoder: RecordDecoder,
    sink: Arc<dyn TelemetrySink>,
}

impl ReadLoopState {
    async fn on_event<B: AsRef<[u8]>>(&mut self, name: &str, event: Option<io::Result<B>>) {
        match event {
            Some(Ok(chunk)) => self.on_chunk(name, chunk.as_ref()).await,
            Some(Err(e)) => {
                let err = GatewayError::ReadinessWait(format!("read from '{}' failed: {}", name, e));
                warn!(device = %name, "{}", err);
            }
            None => warn!(device = %name, "Device stream closed; no longer reading from it"),
        }
    }

    async fn on_chunk(&mut self, name: &str, chunk: &[u8]) {
        let Some(framer) = self.framers.get_mut(name) else {
            return;
        };
        trace!(device = %name, bytes = chunk.len(), raw = %hex::encode(chunk), "read");

        framer.push(chunk);
        let events: Vec<FramerEvent> = framer.extract().collect();

        for event in events {
            match event {
                FramerEvent::Message(message) => {
                    debug!(device = %name, "received: {}", message);
                    self.on_message(name, message.as_str()).await;
                }
                FramerEvent::Overflow { discarded } => {
                    let err = GatewayError::BufferOverflow {
                        device: name.to_string(),
                        discarded,
                    };
                    warn!(device = %name, "{}; buffer reset", err);
                }
            }
        }
    }

    async fn on_message(&self, name: &str, line: &str) {
        match self.decoder.decode(line) {
            Ok(Some(record)) => {
                if let Err(e) = dispatch(self.sink.as_ref(), &record).await {
                    error!(device = %name, kind = record.kind(), "Failed to store record: {}", e);
                }
            }
            Ok(None) => trace!(device = %name, line = %line, "Ignoring non-telemetry line"),
            Err(e) => warn!(device = %name, "{}", e),
        }
    }
}
