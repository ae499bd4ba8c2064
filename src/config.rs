// ==============================================================================
// config.rs — RUNTIME CONFIG (ENV) + GAMEPLAY TUNING (TOML)
// ------------------------------------------------------------------------------
// Runtime knobs come from the environment (optionally a .env file loaded in
// main). Gameplay tuning lives in a separate TOML file; every field has a
// default and loaded values are clamped, never rejected.
// ==============================================================================

use std::{env, net::SocketAddr, path::{Path, PathBuf}, time::Duration};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::camera::CameraConfig;
use crate::dynamics::VehicleTuning;
use crate::error::ConfigError;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:9001";
pub const DEFAULT_TICK_HZ: u32 = 60;

/// Downward ground probe reach below the chassis bottom, m.
pub const GROUND_PROBE_LENGTH: f32 = 0.25;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub tick_hz: u32,
    pub tuning_path: Option<PathBuf>,
    pub debug_overlay: bool,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let raw_addr = get("SIM_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = raw_addr
            .parse()
            .map_err(|_| ConfigError::Invalid { key: "SIM_BIND_ADDR", value: raw_addr.clone() })?;

        let tick_hz = match get("SIM_TICK_HZ") {
            Some(v) => match v.parse::<u32>() {
                Ok(hz) if (1..=1000).contains(&hz) => hz,
                _ => return Err(ConfigError::Invalid { key: "SIM_TICK_HZ", value: v }),
            },
            None => DEFAULT_TICK_HZ,
        };

        let tuning_path = get("SIM_TUNING_PATH").filter(|p| !p.is_empty()).map(PathBuf::from);

        let debug_overlay = get("SIM_DEBUG_OVERLAY")
            .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
            .unwrap_or(false);

        Ok(Self { bind_addr, tick_hz, tuning_path, debug_overlay })
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.tick_hz as f64)
    }

    pub fn dt(&self) -> f32 {
        1.0 / self.tick_hz as f32
    }
}

/// Gameplay tuning file: `[vehicle]` and `[camera]` tables, both optional.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TuningFile {
    pub vehicle: VehicleTuning,
    pub camera: CameraConfig,
}

impl TuningFile {
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let raw: TuningFile = toml::from_str(text)?;
        Ok(raw.sanitized())
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        let tuning = Self::parse(&text)?;
        info!(path = %path.display(), max_speed = tuning.vehicle.max_speed, "tuning loaded");
        Ok(tuning)
    }

    /// Defaults when no path is configured.
    pub fn load_optional(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }

    pub fn sanitized(self) -> Self {
        Self { vehicle: self.vehicle.sanitized(), camera: self.camera.sanitized() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn test_defaults() {
        let cfg = ServerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(cfg.bind_addr.port(), 9001);
        assert_eq!(cfg.tick_hz, 60);
        assert!(cfg.tuning_path.is_none());
        assert!(!cfg.debug_overlay);
    }

    #[test]
    fn test_overrides_and_bad_values() {
        let cfg = ServerConfig::from_lookup(lookup(&[
            ("SIM_BIND_ADDR", "127.0.0.1:4000"),
            ("SIM_TICK_HZ", "120"),
            ("SIM_DEBUG_OVERLAY", "true"),
        ]))
        .unwrap();
        assert_eq!(cfg.bind_addr.port(), 4000);
        assert!((cfg.dt() - 1.0 / 120.0).abs() < 1e-9);
        assert!(cfg.debug_overlay);

        let err = ServerConfig::from_lookup(lookup(&[("SIM_TICK_HZ", "fast")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "SIM_TICK_HZ", .. }));
    }

    #[test]
    fn test_tuning_file_partial_and_clamped() {
        let t = TuningFile::parse(
            r#"
            [vehicle]
            max_speed = 24.0
            mass = -3.0

            [camera]
            fov = 500.0
            follow_type = "chase"
            "#,
        )
        .unwrap();
        assert_eq!(t.vehicle.max_speed, 24.0);
        assert!(t.vehicle.mass > 0.0);
        assert_eq!(t.camera.fov, 150.0);
        assert_eq!(t.camera.follow_type, crate::camera::FollowType::Chase);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = TuningFile::load(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
