use std::process::{Command, Output};
use std::str;
use tempfile::TempDir;

fn homegate(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_homegate"))
        .args(args)
        .output()
        .expect("Failed to execute command")
}

fn stdout(output: &Output) -> &str {
    str::from_utf8(&output.stdout).expect("Invalid UTF-8")
}

/// CLI interface tests
#[cfg(test)]
mod cli_tests {
    use super::*;

    #[test]
    fn test_cli_help() {
        let output = homegate(&["--help"]);
        let stdout = stdout(&output);

        assert!(stdout.contains("Usage:"));
        assert!(stdout.contains("Commands:"));
        for command in ["run", "devices", "ports", "route", "decode", "config", "version"] {
            assert!(stdout.contains(command), "help should list {}", command);
        }
    }

    #[test]
    fn test_cli_version() {
        let output = homegate(&["-q", "version"]);
        assert!(output.status.success());
        assert!(stdout(&output).contains(env!("CARGO_PKG_VERSION")));
    }

    #[test]
    fn test_cli_invalid_command() {
        let output = homegate(&["invalid-command"]);
        assert!(!output.status.success());
    }

    #[test]
    fn test_cli_route_json() {
        let output = homegate(&["-q", "--output", "json", "route", "window_open"]);
        assert!(output.status.success());

        let value: serde_json::Value = serde_json::from_str(stdout(&output)).unwrap();
        assert_eq!(value["acknowledgment"], "OK_WINDOW_OPENING");
        assert_eq!(value["translation"], "OPEN");
        assert_eq!(value["target"], "windowModule");
    }

    #[test]
    fn test_cli_decode_fire() {
        let output = homegate(&["-q", "decode", "fireModule_fire_120_650.5"]);
        assert!(output.status.success());

        let stdout = stdout(&output);
        assert!(stdout.contains("Fire: 120 (fire)"));
        assert!(stdout.contains("Gas: 650.5 (danger)"));
    }

    #[test]
    fn test_cli_decode_malformed_fails() {
        let output = homegate(&["-q", "decode", "fireModule_fire_x_1"]);
        assert!(!output.status.success());
        let stderr = str::from_utf8(&output.stderr).expect("Invalid UTF-8");
        assert!(stderr.contains("Malformed fire record"));
    }

    #[test]
    fn test_cli_config_show_lists_translations() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("homegate.toml");
        std::fs::write(&config_file, "[commands.translations]\nfan_on = \"FAN_ON\"\n").unwrap();

        let output = homegate(&["-q", "--config", config_file.to_str().unwrap(), "config", "show"]);
        assert!(output.status.success());

        let stdout = stdout(&output);
        assert!(stdout.contains("window_open -> OPEN"));
        assert!(stdout.contains("fan_on -> FAN_ON"));
    }

    #[test]
    fn test_cli_json_error_on_stderr() {
        let output = homegate(&["-q", "--output", "json", "decode", "petModule_pet_1"]);
        assert!(!output.status.success());

        let stderr = str::from_utf8(&output.stderr).expect("Invalid UTF-8");
        let value: serde_json::Value = serde_json::from_str(stderr).unwrap();
        assert_eq!(value["level"], "error");
        assert!(value["error"].as_str().unwrap().contains("Malformed pet record"));
    }

    #[test]
    fn test_cli_config_init_and_devices() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().to_str().unwrap();

        let output = homegate(&["-q", "config", "init", "--dir", dir]);
        assert!(output.status.success());

        let config_file = temp_dir.path().join(".homegate").join("config.toml");
        assert!(config_file.exists());

        let output = homegate(&[
            "-q",
            "--config",
            config_file.to_str().unwrap(),
            "--output",
            "json",
            "devices",
        ]);
        assert!(output.status.success());
        let devices: serde_json::Value = serde_json::from_str(stdout(&output)).unwrap();
        assert_eq!(devices.as_array().unwrap().len(), 6);
        assert_eq!(devices[3]["name"], "windowModule");

        // A second init refuses to overwrite
        let output = homegate(&["-q", "config", "init", "--dir", dir]);
        assert!(!output.status.success());
    }

    #[test]
    fn test_cli_run_without_devices_fails() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("empty.toml");
        std::fs::write(&config_file, "").unwrap();

        let output = homegate(&["-q", "--config", config_file.to_str().unwrap(), "run", "--port", "0"]);
        assert!(!output.status.success());
    }
}
