use crate::core::command::CommandRouter;
use crate::domain::error::{GatewayError, GatewayResult};
use crate::infrastructure::tcp::session::SessionHandler;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// TCP listener for the plain-text control channel
pub struct ControlServer {
    listener: Option<TcpListener>,
    bind_addr: SocketAddr,
    receive_buffer: usize,
    shutdown_sender: Option<mpsc::Sender<()>>,
    server_handle: Option<tokio::task::JoinHandle<()>>,
}

impl ControlServer {
    pub async fn bind(bind_addr: &str, receive_buffer: usize) -> GatewayResult<Self> {
        let listener = TcpListener::bind(bind_addr).await.map_err(|source| GatewayError::Bind {
            addr: bind_addr.to_string(),
            source,
        })?;

        let actual_addr = listener.local_addr()?;

        info!("Control server bound on {}", actual_addr);

        Ok(Self {
            listener: Some(listener),
            bind_addr: actual_addr,
            receive_buffer,
            shutdown_sender: None,
            server_handle: None,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.bind_addr
    }

    /// Spawn the accept loop; every client gets its own session task
    pub fn start(&mut self, router: Arc<CommandRouter>) -> GatewayResult<()> {
        if self.server_handle.is_some() {
            return Err(GatewayError::lifecycle("Server is already running"));
        }
        let listener = self
            .listener
            .take()
            .ok_or_else(|| GatewayError::lifecycle("Server listener already consumed"))?;

        let (shutdown_sender, mut shutdown_receiver) = mpsc::channel::<()>(1);
        let receive_buffer = self.receive_buffer;
        let bind_addr = self.bind_addr;

        info!("Starting control server on {}", bind_addr);

        let server_handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    accept_result = listener.accept() => {
                        match accept_result {
                            Ok((stream, addr)) => {
                                info!("Client connected: {}", addr);
                                let handler = SessionHandler::new(
                                    stream,
                                    addr,
                                    Arc::clone(&router),
                                    receive_buffer,
                                );
                                let session = handler.id();
                                tokio::spawn(async move {
                                    if let Err(e) = handler.run().await {
                                        error!(session = %session, "Error handling client {}: {}", addr, e);
                                    }
                                    info!(session = %session, "Client disconnected: {}", addr);
                                });
                            }
                            Err(e) => {
                                error!("Failed to accept connection: {}", e);
                            }
                        }
                    }

                    _ = shutdown_receiver.recv() => {
                        info!("Received shutdown signal, stopping control server");
                        break;
                    }
                }
            }
        });

        self.shutdown_sender = Some(shutdown_sender);
        self.server_handle = Some(server_handle);
        Ok(())
    }

    /// Close the listening socket; sessions already running finish on their own
    pub async fn stop(&mut self) -> GatewayResult<()> {
        if let Some(handle) = self.server_handle.take() {
            info!("Stopping control server");

            if let Some(sender) = self.shutdown_sender.take() {
                if let Err(e) = sender.send(()).await {
                    warn!("Failed to send shutdown signal: {}", e);
                }
            }

            if let Err(e) = handle.await {
                warn!("Server task completed with error: {}", e);
            }

            info!("Control server stopped");
        }
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.server_handle.is_some()
    }
}

impl Drop for ControlServer {
    fn drop(&mut self) {
        if let Some(handle) = self.server_handle.take() {
            warn!("ControlServer dropped while still running; aborting accept loop");
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::command::CommandTranslator;
    use crate::infrastructure::serial::DeviceWriter;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    fn router() -> Arc<CommandRouter> {
        Arc::new(CommandRouter::new(CommandTranslator::builtin(), DeviceWriter::new()))
    }

    #[tokio::test]
    async fn test_control_server_start_stop() {
        let mut server = ControlServer::bind("127.0.0.1:0", 1024).await.unwrap();
        assert!(!server.is_running());

        server.start(router()).unwrap();
        assert!(server.is_running());
        assert!(server.start(router()).is_err());

        server.stop().await.unwrap();
        assert!(!server.is_running());

        // Listening socket is gone once stopped.
        let addr = server.local_addr();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(TcpStream::connect(addr).await.is_err());
    }

    #[tokio::test]
    async fn test_bind_conflict_reported() {
        let server = ControlServer::bind("127.0.0.1:0", 1024).await.unwrap();
        let addr = server.local_addr().to_string();
        let err = ControlServer::bind(&addr, 1024).await.err().unwrap();
        assert!(err.to_string().contains("Failed to bind"));
        match err {
            GatewayError::Bind { addr: reported, source } => {
                assert_eq!(reported, addr);
                assert_eq!(source.kind(), std::io::ErrorKind::AddrInUse);
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[tokio::test]
    async fn test_multiple_clients_acknowledged() {
        let mut server = ControlServer::bind("127.0.0.1:0", 1024).await.unwrap();
        let addr = server.local_addr();
        server.start(router()).unwrap();

        let mut clients = Vec::new();
        for command in ["window_open", "window_close", "light_off"] {
            let mut client = TcpStream::connect(addr).await.unwrap();
            client.write_all(command.as_bytes()).await.unwrap();
            clients.push((command, client));
        }

        for (command, client) in clients.iter_mut() {
            let expected = match *command {
                "window_open" => "OK_WINDOW_OPENING\n",
                "window_close" => "OK_WINDOW_CLOSING\n",
                _ => "OK_COMMAND_RECEIVED\n",
            };
            let mut response = vec![0u8; expected.len()];
            client.read_exact(&mut response).await.unwrap();
            assert_eq!(response, expected.as_bytes());
        }

        server.stop().await.unwrap();

        // Sessions outlive the listener.
        let (_, client) = &mut clients[0];
        client.write_all(b"window_status").await.unwrap();
        let mut response = vec![0u8; "OK_STATUS_REQUESTED\n".len()];
        client.read_exact(&mut response).await.unwrap();
        assert_eq!(response, b"OK_STATUS_REQUESTED\n");
    }
}
