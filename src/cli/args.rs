use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

/// Command line arguments for HomeGate
#[derive(Parser, Debug)]
#[command(
    name = "homegate",
    version = env!("CARGO_PKG_VERSION"),
    about = "Household automation gateway for serial-attached modules",
    long_about = "Multiplexes serial sensor/actuator modules, persists their telemetry and bridges a plain-text TCP control channel to them."
)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text", global = true)]
    pub output: OutputFormat,

    /// Command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the gateway until interrupted
    Run(RunArgs),
    /// List configured devices
    Devices,
    /// List serial ports present on this machine
    Ports,
    /// Show how a control command would be acknowledged and routed
    Route {
        /// Control command, e.g. window_open
        command: String,
    },
    /// Decode one telemetry line without persisting it
    Decode {
        /// Framed message, e.g. fireModule_fire_120_650.5
        line: String,
    },
    /// Configuration management commands
    Config(ConfigArgs),
    /// Display version information
    Version,
}

/// Gateway run arguments
#[derive(ClapArgs, Debug)]
pub struct RunArgs {
    /// Bind address, overrides the configuration
    #[arg(short, long)]
    pub bind: Option<String>,

    /// Control port, overrides the configuration
    #[arg(short, long)]
    pub port: Option<u16>,
}

/// Configuration management arguments
#[derive(ClapArgs, Debug)]
pub struct ConfigArgs {
    /// Configuration subcommand
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Configuration management subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show current configuration
    Show,
    /// Create a project configuration listing the six household modules
    Init {
        /// Directory to create `.homegate/config.toml` in
        #[arg(short, long)]
        dir: Option<String>,
    },
    /// Print the configuration file locations
    Path,
}

/// Output format options
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OutputFormat {
    /// Human-readable text output
    #[default]
    Text,
    /// JSON output
    Json,
    /// Table output
    Table,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Table => write!(f, "table"),
        }
    }
}
