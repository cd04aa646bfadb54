use crate::cli::args::{Args, Command, ConfigCommand, RunArgs};
use crate::cli::output::{ConsoleWriter, OutputWriter, RoutePreview};
use crate::core::command::{Acknowledgment, Target};
use crate::core::gateway::Gateway;
use crate::core::telemetry::{RecordDecoder, Thresholds};
use crate::domain::config::{GatewayConfig, GlobalConfig};
use crate::domain::error::{GatewayError, GatewayResult};
use crate::infrastructure::config::ConfigManager;
use crate::infrastructure::logging::init_logging;
use crate::infrastructure::serial::{available_ports, SerialOpener};
use crate::infrastructure::telemetry::open_sink;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Execute CLI command
pub async fn execute_command(args: Args) -> GatewayResult<()> {
    let writer = ConsoleWriter::new(args.output);

    // Load configuration using ConfigManager
    let config_manager = ConfigManager::new()?;
    let config = if let Some(config_path) = &args.config {
        config_manager.load_config_from_path(config_path.as_ref())?
    } else {
        config_manager.load_config()?
    };

    if !args.quiet {
        setup_logging(&config.global, args.verbose)?;
    }

    match args.command {
        Command::Run(run_args) => run_gateway(config, run_args, &writer).await,
        Command::Devices => {
            if config.devices.is_empty() {
                writer.write_message("No devices configured; run `homegate config init`")?;
            } else {
                writer.write_devices(&config.devices)?;
            }
            Ok(())
        }
        Command::Ports => {
            let ports = available_ports()?;
            writer.write_ports(&ports)?;
            Ok(())
        }
        Command::Route { command } => {
            writer.write_route(&preview_route(&config, &command))?;
            Ok(())
        }
        Command::Decode { line } => {
            let decoder = RecordDecoder::new(Thresholds::from(&config.telemetry));
            match decoder.decode(line.trim_end())? {
                Some(record) => writer.write_record(&record)?,
                None => writer.write_message(&format!("Not a telemetry record: {}", line))?,
            }
            Ok(())
        }
        Command::Config(config_args) => {
            execute_config_command(config_args.command, &writer, &config, &config_manager, args.config)
        }
        Command::Version => {
            writer.write_message(&format!("homegate {}", env!("CARGO_PKG_VERSION")))?;
            Ok(())
        }
    }
}

async fn run_gateway(mut config: GatewayConfig, args: RunArgs, writer: &ConsoleWriter) -> GatewayResult<()> {
    if let Some(bind) = args.bind {
        config.server.bind = bind;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if config.devices.is_empty() {
        return Err(GatewayError::config(
            "No devices configured; run `homegate config init` or pass --config",
        ));
    }

    let opener = Arc::new(SerialOpener::new(config.serial.clone()));
    let sink = open_sink(&config.telemetry).await?;
    let running = Gateway::new(config, opener, sink).start().await?;

    writer.write_message(&format!(
        "HomeGate listening on {} (Ctrl+C to stop)",
        running.local_addr()
    ))?;

    wait_for_shutdown_signal().await?;
    info!("Shutdown signal received");
    running.shutdown().await
}

#[cfg(unix)]
async fn wait_for_shutdown_signal() -> GatewayResult<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = signal(SignalKind::terminate())?;
    tokio::select! {
        result = tokio::signal::ctrl_c() => result?,
        _ = terminate.recv() => {}
    }
    Ok(())
}

#[cfg(not(unix))]
async fn wait_for_shutdown_signal() -> GatewayResult<()> {
    tokio::signal::ctrl_c().await?;
    Ok(())
}

/// Dry-run of what a control session does with `command`
pub fn preview_route(config: &GatewayConfig, command: &str) -> RoutePreview {
    let translator = Gateway::translator(config);
    let translation = translator.translate(command);
    let target = match Target::select(command) {
        Target::Device(name) => name.to_string(),
        Target::Broadcast => config
            .devices
            .iter()
            .map(|d| d.name.as_str())
            .collect::<Vec<_>>()
            .join(","),
    };

    RoutePreview {
        command: command.to_string(),
        acknowledgment: Acknowledgment::for_command(command).as_str().to_string(),
        translation: translation.map(|t| t.as_str().to_string()),
        target,
    }
}

fn execute_config_command(
    command: ConfigCommand,
    writer: &ConsoleWriter,
    config: &GatewayConfig,
    config_manager: &ConfigManager,
    explicit_path: Option<String>,
) -> GatewayResult<()> {
    match command {
        ConfigCommand::Show => {
            writer.write_config(config)?;
        }
        ConfigCommand::Init { dir } => {
            let dir = match dir {
                Some(dir) => PathBuf::from(dir),
                None => std::env::current_dir()?,
            };
            let written = config_manager.init_project_config(&dir)?;
            writer.write_message(&format!("Project configuration written to {}", written.display()))?;
        }
        ConfigCommand::Path => {
            if let Some(path) = explicit_path {
                writer.write_message(&format!("Explicit: {}", path))?;
            }
            writer.write_message(&format!("Global: {}", config_manager.global_config_path().display()))?;
            match config_manager.project_config_path() {
                Some(path) => writer.write_message(&format!("Project: {}", path.display()))?,
                None => writer.write_message("Project: none found")?,
            }
        }
    }
    Ok(())
}

fn setup_logging(config: &GlobalConfig, verbose: bool) -> GatewayResult<()> {
    let level = if verbose {
        "debug"
    } else {
        match config.log_level.as_str() {
            level @ ("error" | "warn" | "info" | "debug" | "trace") => level,
            _ => "info",
        }
    };

    init_logging(level, verbose)
        .map_err(|e| GatewayError::config(format!("Failed to initialize logging: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::config::DeviceConfig;

    fn config() -> GatewayConfig {
        let mut config = ConfigManager::default_project_config();
        config.commands.translations.insert("fan_on".to_string(), "FAN_ON".to_string());
        config
    }

    #[test]
    fn test_preview_window_route() {
        let preview = preview_route(&config(), "window_open");
        assert_eq!(preview.acknowledgment, "OK_WINDOW_OPENING");
        assert_eq!(preview.translation.as_deref(), Some("OPEN"));
        assert_eq!(preview.target, "windowModule");
    }

    #[test]
    fn test_preview_broadcast_lists_devices() {
        let mut config = config();
        config.devices = vec![
            DeviceConfig::new("fireModule", "/dev/rfcomm0"),
            DeviceConfig::new("petModule", "/dev/rfcomm1"),
        ];

        let preview = preview_route(&config, "fan_on");
        assert_eq!(preview.acknowledgment, "OK_COMMAND_RECEIVED");
        assert_eq!(preview.translation.as_deref(), Some("FAN_ON"));
        assert_eq!(preview.target, "fireModule,petModule");
    }

    #[test]
    fn test_preview_unknown_command() {
        let preview = preview_route(&config(), "window_fly");
        assert_eq!(preview.translation, None);
        assert_eq!(preview.target, "windowModule");
    }

    #[tokio::test]
    async fn test_run_without_devices_rejected() {
        let writer = ConsoleWriter::new(crate::cli::args::OutputFormat::Text);
        let args = RunArgs { bind: None, port: Some(0) };
        let err = run_gateway(GatewayConfig::default(), args, &writer).await.unwrap_err();
        assert!(err.to_string().contains("No devices configured"));
    }
}
