use crate::core::command::{Acknowledgment, CommandRouter};
use crate::domain::error::GatewayResult;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Serves one control client until it disconnects
pub struct SessionHandler<S> {
    id: Uuid,
    addr: SocketAddr,
    stream: S,
    router: Arc<CommandRouter>,
    receive_buffer: usize,
}

impl<S> SessionHandler<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, addr: SocketAddr, router: Arc<CommandRouter>, receive_buffer: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            addr,
            stream,
            router,
            receive_buffer: receive_buffer.max(1),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub async fn run(mut self) -> GatewayResult<()> {
        let mut buffer = vec![0u8; self.receive_buffer];

        loop {
            let n = match self.stream.read(&mut buffer).await {
                Ok(0) => {
                    debug!(session = %self.id, "Client {} disconnected gracefully", self.addr);
                    break;
                }
                Ok(n) => n,
                Err(e) => {
                    error!(session = %self.id, "Read error from {}: {}", self.addr, e);
                    break;
                }
            };

            let raw = String::from_utf8_lossy(&buffer[..n]);
            let command = clean_command(&raw);
            info!(session = %self.id, client = %self.addr, "Client command: {:?}", command);

            let ack = Acknowledgment::for_command(command);
            let acked: io::Result<()> = async {
                self.stream.write_all(ack.to_frame().as_bytes()).await?;
                self.stream.flush().await
            }
            .await;

            // A received command is forwarded even when its acknowledgment is lost.
            if !command.is_empty() {
                self.router.route(command).await;
            }

            if let Err(e) = acked {
                warn!(session = %self.id, "Failed to acknowledge {}: {}", self.addr, e);
                return Err(e.into());
            }
        }

        Ok(())
    }
}

/// Strip NUL padding and line terminators from one receipt
pub fn clean_command(raw: &str) -> &str {
    raw.trim_end_matches(|c: char| c == '\0' || c.is_whitespace())
        .trim_start()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::command::{CommandTranslator, WINDOW_MODULE};
    use crate::infrastructure::serial::{BoxedTransport, DeviceWriter};
    use std::time::Duration;
    use tokio::io::{AsyncBufReadExt, BufReader};
    use tokio::time::timeout;

    #[test]
    fn test_clean_command() {
        assert_eq!(clean_command("window_open"), "window_open");
        assert_eq!(clean_command("window_open\r\n"), "window_open");
        assert_eq!(clean_command("light_on\0\0\0"), "light_on");
        assert_eq!(clean_command("set_angle=30 \n"), "set_angle=30");
        assert_eq!(clean_command("\0\0"), "");
        assert_eq!(clean_command("\r\n"), "");
    }

    #[tokio::test]
    async fn test_blank_receipt_still_acknowledged() {
        let (client, server) = tokio::io::duplex(1024);
        let router = Arc::new(CommandRouter::new(
            CommandTranslator::builtin(),
            DeviceWriter::new(),
        ));
        let addr: SocketAddr = "127.0.0.1:40001".parse().unwrap();
        let task = tokio::spawn(SessionHandler::new(server, addr, router, 1024).run());

        let (mut reader, mut writer) = tokio::io::split(client);
        for receipt in [&b"\r\n"[..], &b"\0\0\0"[..]] {
            writer.write_all(receipt).await.unwrap();
            let mut ack = vec![0u8; "OK_COMMAND_RECEIVED\n".len()];
            timeout(Duration::from_millis(500), reader.read_exact(&mut ack))
                .await
                .expect("blank receipt was not acknowledged")
                .unwrap();
            assert_eq!(ack, b"OK_COMMAND_RECEIVED\n");
        }

        drop(writer);
        drop(reader);
        assert!(task.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn test_command_forwarded_when_ack_fails() {
        let writer = DeviceWriter::new();
        let (ours, theirs) = tokio::io::duplex(1024);
        let transport: BoxedTransport = Box::new(ours);
        let (_read_half, write_half) = tokio::io::split(transport);
        writer.attach(WINDOW_MODULE.to_string(), write_half).await;
        let router = Arc::new(CommandRouter::new(CommandTranslator::builtin(), writer));

        // Client sends one command and disconnects before the acknowledgment
        let (mut client, server) = tokio::io::duplex(1024);
        client.write_all(b"window_open").await.unwrap();
        drop(client);

        let addr: SocketAddr = "127.0.0.1:40002".parse().unwrap();
        let result = SessionHandler::new(server, addr, router, 1024).run().await;
        assert!(result.is_err());

        let mut window = BufReader::new(theirs);
        let mut line = String::new();
        timeout(Duration::from_millis(500), window.read_line(&mut line))
            .await
            .expect("command never reached the window module")
            .unwrap();
        assert_eq!(line, "OPEN\n");
    }

    #[tokio::test]
    async fn test_session_acknowledges_each_receipt() {
        let (client, server) = tokio::io::duplex(1024);
        let router = Arc::new(CommandRouter::new(
            CommandTranslator::builtin(),
            DeviceWriter::new(),
        ));
        let addr: SocketAddr = "127.0.0.1:40000".parse().unwrap();
        let handler = SessionHandler::new(server, addr, router, 1024);
        let task = tokio::spawn(handler.run());

        let (mut reader, mut writer) = tokio::io::split(client);
        let mut ack = vec![0u8; "OK_STATUS_REQUESTED\n".len()];

        writer.write_all(b"window_status\n").await.unwrap();
        reader.read_exact(&mut ack).await.unwrap();
        assert_eq!(ack, b"OK_STATUS_REQUESTED\n");

        let mut ack = vec![0u8; "OK_COMMAND_RECEIVED\n".len()];
        writer.write_all(b"light_on").await.unwrap();
        reader.read_exact(&mut ack).await.unwrap();
        assert_eq!(ack, b"OK_COMMAND_RECEIVED\n");

        drop(writer);
        drop(reader);
        assert!(task.await.unwrap().is_ok());
    }
}
