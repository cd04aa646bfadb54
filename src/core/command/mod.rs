// Command module - control verbs, translation and routing
pub mod ack;
pub mod router;
pub mod translator;

pub use ack::Acknowledgment;
pub use router::{CommandRouter, RouteOutcome, Target, DOOR_MODULE, LIGHT_MODULE, WINDOW_MODULE};
pub use translator::{CommandTranslator, DeviceCommand};
