// TCP module - control channel listener and client sessions
pub mod server;
pub mod session;

pub use server::ControlServer;
pub use session::SessionHandler;
