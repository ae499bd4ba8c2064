// Error types shared across the simulation. Out-of-range numeric input is
// clamped at the boundary and never shows up here.
use std::path::PathBuf;

/// The rigid body behind a handle is gone (despawned or never created).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BackendError {
    #[error("rigid body is no longer available")]
    Disposed,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum VehicleError {
    #[error("invalid timestep {0}")]
    InvalidTimestep(f32),
    #[error("vehicle backend unavailable: {0}")]
    Backend(#[from] BackendError),
}

/// Raycast failures; callers treat every variant as "no hit".
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum QueryError {
    #[error("ray direction is zero or not finite")]
    DegenerateRay,
    #[error("scene query failed: {0}")]
    Backend(String),
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CameraError {
    #[error("duration must be a non-negative number of seconds, got {0}")]
    NegativeDuration(f32),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse tuning file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}
