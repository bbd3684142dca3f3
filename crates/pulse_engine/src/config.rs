//! Configuration system

pub use serde::{Deserialize, Serialize};

/// Configuration trait
///
/// Anything deriving serde traits plus `Default` can be persisted to and
/// loaded from TOML or RON, dispatched by file extension.
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(ConfigError::Io)?;

        if path.ends_with(".toml") {
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else if path.ends_with(".ron") {
            ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else {
            Err(ConfigError::UnsupportedFormat(path.to_string()))
        }
    }

    /// Save configuration to file
    fn save_to_file(&self, path: &str) -> Result<(), ConfigError> {
        let contents = if path.ends_with(".toml") {
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else if path.ends_with(".ron") {
            ron::ser::to_string_pretty(self, Default::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else {
            return Err(ConfigError::UnsupportedFormat(path.to_string()));
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

/// Physics parameters for the default integrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhysicsSettings {
    /// Gravity vector applied to non-static bodies.
    pub gravity: [f64; 2],

    /// Per-axis velocity clamp; a zero component disables clamping on that
    /// axis.
    pub max_velocity: [f64; 2],
}

impl Default for PhysicsSettings {
    fn default() -> Self {
        Self {
            gravity: [0.0, 0.01],
            max_velocity: [100.0, 100.0],
        }
    }
}

/// File-loadable engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Fixed simulation rate in steps per 1000 time units.
    pub fixed_update_fps: f64,

    /// Default physics pipeline parameters.
    pub physics: PhysicsSettings,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            fixed_update_fps: 60.0,
            physics: PhysicsSettings::default(),
        }
    }
}

impl Config for EngineSettings {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_parse_from_toml() {
        let settings: EngineSettings = toml::from_str(
            r#"
            fixed_update_fps = 30.0

            [physics]
            gravity = [0.0, 0.02]
            max_velocity = [50.0, 0.0]
            "#,
        )
        .unwrap();

        assert_eq!(settings.fixed_update_fps, 30.0);
        assert_eq!(settings.physics.gravity, [0.0, 0.02]);
        assert_eq!(settings.physics.max_velocity, [50.0, 0.0]);
    }

    #[test]
    fn settings_roundtrip_through_ron() {
        let settings = EngineSettings::default();
        let text = ron::ser::to_string_pretty(&settings, Default::default()).unwrap();
        let back: EngineSettings = ron::from_str(&text).unwrap();
        assert_eq!(back.fixed_update_fps, settings.fixed_update_fps);
        assert_eq!(back.physics.gravity, settings.physics.gravity);
    }
}
