use config::{Config, ConfigError, Environment, File};

use crate::compressor::{Algorithm, DEFAULT_MAX_INPUT_BYTES, MAX_LEVEL};

#[derive(serde::Deserialize, Debug, Clone, PartialEq)]
pub struct ScaleDownSettings {
    #[serde(default)]
    pub algorithm: Algorithm,
    #[serde(default = "default_level")]
    pub level: u32,
    #[serde(default = "default_max_input_bytes")]
    pub max_input_bytes: usize,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_level() -> u32 {
    MAX_LEVEL
}

fn default_max_input_bytes() -> usize {
    DEFAULT_MAX_INPUT_BYTES
}

fn default_log_level() -> String {
    "info".into()
}

impl Default for ScaleDownSettings {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::default(),
            level: default_level(),
            max_input_bytes: default_max_input_bytes(),
            log_level: default_log_level(),
        }
    }
}

impl ScaleDownSettings {
    pub fn from_config(config: Config) -> Result<Self, ConfigError> {
        let settings = config.try_deserialize::<Self>()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.level > MAX_LEVEL {
            return Err(ConfigError::Message(format!(
                "level {} is out of range, use 0 to {}",
                self.level, MAX_LEVEL
            )));
        }
        if self.max_input_bytes == 0 || self.max_input_bytes > u32::MAX as usize {
            return Err(ConfigError::Message(format!(
                "max_input_bytes {} must be between 1 and {}",
                self.max_input_bytes,
                u32::MAX
            )));
        }
        Ok(())
    }
}

/// Reads `configuration/scaledown.yml` when present, then `SCALEDOWN__*`
/// environment variables (e.g. `SCALEDOWN__LEVEL=6`).
pub fn get_settings() -> Result<ScaleDownSettings, ConfigError> {
    let config = Config::builder()
        .add_source(File::with_name("configuration/scaledown").required(false))
        .add_source(
            Environment::with_prefix("SCALEDOWN")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    ScaleDownSettings::from_config(config)
}
