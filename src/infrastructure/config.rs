use crate::domain::config::{DeviceConfig, GatewayConfig};
use crate::domain::error::{GatewayError, GatewayResult};
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_DIR: &str = ".homegate";
const CONFIG_FILE: &str = "config.toml";

/// Modules shipped in a freshly initialized project, in rfcomm order
const DEFAULT_MODULES: [(&str, &str); 6] = [
    ("fireModule", "Fire and gas detector"),
    ("petModule", "Pet feeder and toilet monitor"),
    ("plantModule", "Plant and room environment sensor"),
    ("windowModule", "Smart window actuator"),
    ("lightModule", "Lighting controller"),
    ("doorModule", "Door controller"),
];

/// Configuration manager
pub struct ConfigManager {
    global_config_path: PathBuf,
    project_config_path: Option<PathBuf>,
}

impl ConfigManager {
    /// Create new configuration manager
    pub fn new() -> GatewayResult<Self> {
        let global_config_path = Self::default_global_config_path()?;
        let project_config_path = std::env::current_dir()
            .ok()
            .and_then(|dir| Self::find_project_config_path(&dir));

        Ok(Self {
            global_config_path,
            project_config_path,
        })
    }

    /// Manager rooted at explicit locations
    pub fn with_paths(global_config_path: PathBuf, project_config_path: Option<PathBuf>) -> Self {
        Self {
            global_config_path,
            project_config_path,
        }
    }

    /// Load configuration from files
    ///
    /// The global file supplies every section; a project file overrides the
    /// server, serial, telemetry and command sections and appends its devices.
    pub fn load_config(&self) -> GatewayResult<GatewayConfig> {
        let mut config = if self.global_config_path.exists() {
            self.load_config_from_path(&self.global_config_path)?
        } else {
            GatewayConfig::default()
        };

        if let Some(project_path) = &self.project_config_path {
            if project_path.exists() {
                let project = self.load_config_from_path(project_path)?;
                config.server = project.server;
                config.serial = project.serial;
                config.telemetry = project.telemetry;
                config.commands.translations.extend(project.commands.translations);
                config.devices.extend(project.devices);
            }
        }

        Ok(config)
    }

    /// Load configuration from specific path
    pub fn load_config_from_path(&self, path: &Path) -> GatewayResult<GatewayConfig> {
        let content = fs::read_to_string(path).map_err(|e| {
            GatewayError::config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;

        toml::from_str(&content).map_err(|e| {
            GatewayError::config(format!("Failed to parse config file {}: {}", path.display(), e))
        })
    }

    /// Save configuration to specific path
    pub fn save_config_to_path(&self, path: &Path, config: &GatewayConfig) -> GatewayResult<()> {
        let content = toml::to_string_pretty(config)
            .map_err(|e| GatewayError::config(format!("Failed to serialize config: {}", e)))?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                GatewayError::config(format!("Failed to create config directory: {}", e))
            })?;
        }

        fs::write(path, content).map_err(|e| {
            GatewayError::config(format!("Failed to write config file {}: {}", path.display(), e))
        })
    }

    /// Create default project configuration under `path/.homegate`
    pub fn init_project_config(&self, path: &Path) -> GatewayResult<PathBuf> {
        let config_file = path.join(CONFIG_DIR).join(CONFIG_FILE);

        if config_file.exists() {
            return Err(GatewayError::config(format!(
                "Project configuration already exists at {}",
                config_file.display()
            )));
        }

        self.save_config_to_path(&config_file, &Self::default_project_config())?;
        Ok(config_file)
    }

    /// The six household modules on /dev/rfcomm0 through /dev/rfcomm5
    pub fn default_project_config() -> GatewayConfig {
        let devices = DEFAULT_MODULES
            .iter()
            .enumerate()
            .map(|(index, (name, description))| DeviceConfig {
                description: description.to_string(),
                ..DeviceConfig::new(*name, format!("/dev/rfcomm{}", index))
            })
            .collect();

        GatewayConfig {
            devices,
            ..GatewayConfig::default()
        }
    }

    /// Get the current project config path (if any)
    pub fn project_config_path(&self) -> Option<&Path> {
        self.project_config_path.as_deref()
    }

    /// Get the global config path
    pub fn global_config_path(&self) -> &Path {
        &self.global_config_path
    }

    fn default_global_config_path() -> GatewayResult<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| GatewayError::config("Could not determine home directory"))?;

        Ok(home.join(".config").join("homegate").join(CONFIG_FILE))
    }

    /// Find project configuration path by walking up directory tree
    fn find_project_config_path(start: &Path) -> Option<PathBuf> {
        let mut path = start;

        loop {
            let config_path = path.join(CONFIG_DIR).join(CONFIG_FILE);
            if config_path.exists() {
                return Some(config_path);
            }

            path = path.parent()?;
        }
    }
}
