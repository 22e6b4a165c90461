use serde::Deserialize;
use std::fs;
use std::io;
use std::path::Path;

use protocol::{ClientVersion, CodecLimits};

use crate::error::{Result, ServerError};

pub const CONFIG_PATH_ENV: &str = "CONFIG_PATH";
pub const DEFAULT_CONFIG_PATH: &str = "server/config/server.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub gateway: GatewayConfig,
    pub client_version: ClientVersion,
    /// Handler ids switched off at startup.
    #[serde(default)]
    pub disabled_handlers: Vec<String>,
    #[serde(default)]
    pub codec: CodecConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct CodecConfig {
    pub max_frame_size: usize,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            max_frame_size: CodecLimits::default().max_frame_size,
        }
    }
}

impl CodecConfig {
    #[must_use]
    pub fn limits(&self) -> CodecLimits {
        CodecLimits {
            max_frame_size: self.max_frame_size,
        }
    }
}

impl ServerConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| ServerError::Config(format!("Failed to read config file: {}", e)))?;
        Self::parse(&content)
    }

    /// Loads the file named by `CONFIG_PATH` (or the default path). Only a
    /// missing file falls back to built-in defaults; a file that cannot be
    /// read, parsed or validated is an error.
    pub fn load_from_env() -> Result<Self> {
        let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

        match fs::read_to_string(&path) {
            Ok(content) => {
                let config = Self::parse(&content)
                    .map_err(|e| ServerError::Config(format!("{} ({})", e, path)))?;
                log::info!("Loaded configuration from {}", path);
                Ok(config)
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                log::warn!("Config file {} not found; using defaults", path);
                Ok(Self::default())
            }
            Err(err) => Err(ServerError::Config(format!(
                "Failed to read config file {}: {}",
                path, err
            ))),
        }
    }

    fn parse(content: &str) -> Result<Self> {
        let config: ServerConfig = toml::from_str(content)
            .map_err(|e| ServerError::Config(format!("Failed to parse config file: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.codec.max_frame_size < 4 {
            return Err(ServerError::Config(format!(
                "codec.max_frame_size must be at least 4, got {}",
                self.codec.max_frame_size
            )));
        }
        Ok(())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            gateway: GatewayConfig {
                host: "0.0.0.0".to_string(),
                port: 55901,
            },
            client_version: ClientVersion::SEASON_6,
            disabled_handlers: Vec::new(),
            codec: CodecConfig::default(),
        }
    }
}
