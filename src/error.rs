//! Errors for the few operations that can actually fail
//!
//! The simulation itself is infallible; only configuration overrides and the
//! sprite asset touch the outside world.

use thiserror::Error;

/// Failure to apply a JSON settings override
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("settings override is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid setting `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Failure to obtain the ball sprite
#[derive(Debug, Error)]
pub enum SpriteError {
    #[error("failed to fetch sprite `{path}`: {reason}")]
    Fetch { path: String, reason: String },
    #[error("failed to decode sprite: {0}")]
    Decode(#[from] image::ImageError),
    #[error("sprite has zero size")]
    Empty,
}
