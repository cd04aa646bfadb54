use crate::domain::config::{DeviceConfig, FlowControlConfig, ParityConfig, SerialConfig};
use async_trait::async_trait;
use std::io;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_serial::SerialPortBuilderExt;
use tracing::debug;

/// Duplex byte channel to one device
pub trait DeviceIo: AsyncRead + AsyncWrite + Send + Unpin {}

impl<T> DeviceIo for T where T: AsyncRead + AsyncWrite + Send + Unpin {}

pub type BoxedTransport = Box<dyn DeviceIo>;

/// Opens the transport behind a registered device
#[async_trait]
pub trait TransportOpener: Send + Sync {
    async fn open(&self, device: &DeviceConfig) -> io::Result<BoxedTransport>;
}

/// Opens devices as serial ports, e.g. `/dev/rfcomm0`
#[derive(Debug, Clone)]
pub struct SerialOpener {
    serial: SerialConfig,
}

impl SerialOpener {
    pub fn new(serial: SerialConfig) -> Self {
        Self { serial }
    }

    fn builder(&self, device: &DeviceConfig) -> io::Result<serialport::SerialPortBuilder> {
        let baud_rate = device.baud_rate.unwrap_or(self.serial.baud_rate);
        let mut builder = serialport::new(device.path.as_str(), baud_rate);

        builder = builder.data_bits(match self.serial.data_bits {
            5 => serialport::DataBits::Five,
            6 => serialport::DataBits::Six,
            7 => serialport::DataBits::Seven,
            8 => serialport::DataBits::Eight,
            other => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("Invalid data bits: {}", other),
                ))
            }
        });

        builder = builder.stop_bits(match self.serial.stop_bits {
            1 => serialport::StopBits::One,
            2 => serialport::StopBits::Two,
            other => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("Invalid stop bits: {}", other),
                ))
            }
        });

        builder = builder.parity(match self.serial.parity {
            ParityConfig::None => serialport::Parity::None,
            ParityConfig::Even => serialport::Parity::Even,
            ParityConfig::Odd => serialport::Parity::Odd,
        });

        builder = builder.flow_control(match self.serial.flow_control {
            FlowControlConfig::None => serialport::FlowControl::None,
            FlowControlConfig::Software => serialport::FlowControl::Software,
            FlowControlConfig::Hardware => serialport::FlowControl::Hardware,
        });

        Ok(builder)
    }
}

#[async_trait]
impl TransportOpener for SerialOpener {
    async fn open(&self, device: &DeviceConfig) -> io::Result<BoxedTransport> {
        let builder = self.builder(device)?;
        let stream = builder.open_native_async().map_err(io::Error::from)?;
        debug!(device = %device.name, path = %device.path, "Serial stream registered with reactor");
        Ok(Box::new(stream))
    }
}

/// Serial ports visible on this host
pub fn available_ports() -> crate::domain::error::GatewayResult<Vec<String>> {
    let ports = serialport::available_ports()?;
    Ok(ports.into_iter().map(|port| port.port_name).collect())
}
