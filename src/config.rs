//! Server + vehicle effect configuration.
//!
//! Loaded from the JSON file named by `VEHICLE_FX_CONFIG` (optional, every
//! field has a default), then overridden from the environment.

use std::env;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::aven_fx::engine_sound::DEFAULT_INTERP_SPEED;
use crate::aven_fx::{DustTable, EffectId, EngineSample, SkidConfig, SoundId, SoundParams};

/// Accepted loop rates; every value here gives a non-zero, representable tick period.
pub const RATE_HZ: std::ops::RangeInclusive<f32> = 1.0..=10_000.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FxServerConfig {
    pub bind_addr: SocketAddr,
    pub tick_hz: f32,       // gameplay tick
    pub audio_hz: f32,      // engine sound evaluation
    pub log_level: String,
    pub vehicle: VehicleFxConfig,
    pub engine: EngineSoundConfig,
}

impl Default for FxServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 9002)),
            tick_hz: 60.0,
            audio_hz: 100.0,
            log_level: "info".to_string(),
            vehicle: VehicleFxConfig::default(),
            engine: EngineSoundConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VehicleFxConfig {
    pub skid: SkidConfig,
    pub dust: DustTable,

    pub landing_spring_threshold: f32,  // N, max spring force counted as a landing
    pub landing_sound: Option<SoundId>,

    pub impact_force_threshold: f32,    // N, chassis hit needed for an impact effect
    pub impact_effect: Option<EffectId>,

    pub engine_loop: Option<SoundId>,
    pub death_effect: Option<EffectId>,
    pub death_sound: Option<SoundId>,
}

impl Default for VehicleFxConfig {
    fn default() -> Self {
        Self {
            skid: SkidConfig::default(),
            dust: DustTable::default(),
            landing_spring_threshold: 250_000.0,
            landing_sound: None,
            impact_force_threshold: 100_000.0,
            impact_effect: None,
            engine_loop: None,
            death_effect: None,
            death_sound: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSoundConfig {
    pub interp_speed: f32,
    pub base: SoundParams,
    pub samples: Vec<EngineSample>,
}

impl Default for EngineSoundConfig {
    fn default() -> Self {
        Self {
            interp_speed: DEFAULT_INTERP_SPEED,
            base: SoundParams::default(),
            samples: vec![
                EngineSample::new((0.0, 0.0), (1500.0, 2500.0), 1.5),
                EngineSample::new((1500.0, 2500.0), (4000.0, 5000.0), 1.6),
                EngineSample::new((4000.0, 5000.0), (6500.0, 7000.0), 1.4),
            ],
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid value for environment variable {name}: {value:?}")]
    InvalidEnv { name: &'static str, value: String },

    #[error("invalid config: {0}")]
    Invalid(String),
}

impl FxServerConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// File (if `VEHICLE_FX_CONFIG` is set) -> env overrides -> validation.
    pub fn load() -> Result<Self, ConfigError> {
        let mut cfg = match env::var_os("VEHICLE_FX_CONFIG") {
            Some(path) => Self::from_file(Path::new(&path))?,
            None => Self::default(),
        };
        cfg.apply_env(|name| env::var(name).ok())?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        if let Some(v) = lookup("FX_BIND_ADDR") {
            self.bind_addr = v
                .parse()
                .map_err(|_| ConfigError::InvalidEnv { name: "FX_BIND_ADDR", value: v })?;
        }
        if let Some(v) = lookup("FX_TICK_HZ") {
            self.tick_hz = v
                .parse()
                .map_err(|_| ConfigError::InvalidEnv { name: "FX_TICK_HZ", value: v })?;
        }
        if let Some(v) = lookup("FX_AUDIO_HZ") {
            self.audio_hz = v
                .parse()
                .map_err(|_| ConfigError::InvalidEnv { name: "FX_AUDIO_HZ", value: v })?;
        }
        if let Some(v) = lookup("LOG_LEVEL") {
            self.log_level = v;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, hz) in [("tick_hz", self.tick_hz), ("audio_hz", self.audio_hz)] {
            if !RATE_HZ.contains(&hz) {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be within {}..={} Hz, got {hz}",
                    RATE_HZ.start(),
                    RATE_HZ.end()
                )));
            }
        }

        let v = &self.vehicle;
        let non_negative = [
            ("skid.threshold_velocity", v.skid.threshold_velocity),
            ("skid.fade_out_time", v.skid.fade_out_time),
            ("skid.min_duration_for_stop", v.skid.min_duration_for_stop),
            ("landing_spring_threshold", v.landing_spring_threshold),
            ("impact_force_threshold", v.impact_force_threshold),
            ("engine.interp_speed", self.engine.interp_speed),
        ];
        for (name, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::Invalid(format!("{name} must be >= 0, got {value}")));
            }
        }
        Ok(())
    }
}
