// Serial module - device transports and the multi-device read loop
pub mod multiplexer;
pub mod transport;

pub use multiplexer::{DeviceWriter, MultiplexerSettings, SerialMultiplexer};
pub use transport::{available_ports, BoxedTransport, DeviceIo, SerialOpener, TransportOpener};
