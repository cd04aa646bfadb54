use std::fmt;

/// Acknowledgment sent back to a control client for every command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acknowledgment {
    WindowOpening,
    WindowClosing,
    StatusRequested,
    CommandReceived,
}

impl Acknowledgment {
    /// Pick the acknowledgment from the first whitespace-delimited token
    pub fn for_command(command: &str) -> Self {
        match command.split_whitespace().next().unwrap_or("") {
            "window_open" => Self::WindowOpening,
            "window_close" => Self::WindowClosing,
            "window_status" => Self::StatusRequested,
            _ => Self::CommandReceived,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WindowOpening => "OK_WINDOW_OPENING",
            Self::WindowClosing => "OK_WINDOW_CLOSING",
            Self::StatusRequested => "OK_STATUS_REQUESTED",
            Self::CommandReceived => "OK_COMMAND_RECEIVED",
        }
    }

    /// Wire form, newline terminated
    pub fn to_frame(&self) -> String {
        format!("{}\n", self.as_str())
    }
}

impl fmt::Display for Acknowledgment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
