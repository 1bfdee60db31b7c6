//! Scene settings
//!
//! One immutable record describing every body in the scene: sizes, physics
//! options, how each kind is drawn and where the balls respawn. Defaults
//! reproduce the stock toy; a JSON override may replace any subset of fields
//! at any depth. Reset anchors are the exception and are replaced whole.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::SettingsError;
use crate::sim::{BallId, Viewport};

/// Sprite drawn centered on a body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sprite {
    /// Path of the image, relative to the page
    pub texture: String,
    pub x_scale: f32,
    pub y_scale: f32,
}

/// How a body is drawn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderStyle {
    pub visible: bool,
    /// 0 = fully transparent
    pub opacity: f32,
    /// CSS hex color used when no sprite is drawn
    pub fill_style: Option<String>,
    pub sprite: Option<Sprite>,
}

impl Default for RenderStyle {
    fn default() -> Self {
        Self {
            visible: true,
            opacity: 1.0,
            fill_style: None,
            sprite: None,
        }
    }
}

impl RenderStyle {
    /// Whether anything of this body ends up on screen
    pub fn is_drawn(&self) -> bool {
        self.visible && self.opacity > 0.0
    }

    /// Fill color with opacity applied (white when unset or unparsable)
    pub fn fill_rgba(&self) -> [f32; 4] {
        self.fill_style
            .as_deref()
            .and_then(|css| crate::parse_hex_color(css, self.opacity))
            .unwrap_or([1.0, 1.0, 1.0, self.opacity.clamp(0.0, 1.0)])
    }
}

/// Options bag shared by every body of one kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BodyOptions {
    pub is_static: bool,
    pub restitution: f32,
    pub render: RenderStyle,
}

impl Default for BodyOptions {
    fn default() -> Self {
        Self {
            is_static: false,
            restitution: 0.0,
            render: RenderStyle::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BallSettings {
    pub radius: f32,
    pub options: BodyOptions,
}

impl Default for BallSettings {
    fn default() -> Self {
        Self {
            radius: 50.0,
            options: BodyOptions {
                is_static: false,
                restitution: 0.9,
                render: RenderStyle {
                    sprite: Some(Sprite {
                        texture: "./ball.png".to_string(),
                        x_scale: 0.5,
                        y_scale: 0.5,
                    }),
                    ..Default::default()
                },
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WallSettings {
    /// Thickness of each wall (px)
    pub size: f32,
    pub options: BodyOptions,
}

impl Default for WallSettings {
    fn default() -> Self {
        Self {
            size: 20.0,
            options: BodyOptions {
                is_static: true,
                restitution: 0.0,
                render: RenderStyle {
                    opacity: 0.0,
                    ..Default::default()
                },
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PinSettings {
    pub radius: f32,
    pub options: BodyOptions,
}

impl Default for PinSettings {
    fn default() -> Self {
        Self {
            radius: 30.0,
            options: BodyOptions {
                is_static: true,
                restitution: 0.0,
                render: RenderStyle {
                    fill_style: Some("#ffffff".to_string()),
                    ..Default::default()
                },
            },
        }
    }
}

/// A point tied to the viewport: `relative * (W, H) + offset`
///
/// Overridden as a whole; both fields are required.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Anchor {
    pub relative: Vec2,
    pub offset: Vec2,
}

impl Anchor {
    pub const fn new(relative: Vec2, offset: Vec2) -> Self {
        Self { relative, offset }
    }

    pub fn resolve(&self, viewport: Viewport) -> Vec2 {
        self.relative * viewport.size() + self.offset
    }
}

/// Canonical respawn point of each ball
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResetPositions {
    pub ball1: Anchor,
    pub ball2: Anchor,
}

impl Default for ResetPositions {
    fn default() -> Self {
        Self {
            ball1: Anchor::new(Vec2::new(0.5, 0.25), Vec2::ZERO),
            ball2: Anchor::new(Vec2::new(0.5, 1.0), Vec2::new(0.0, -50.0)),
        }
    }
}

impl ResetPositions {
    pub fn anchor(&self, id: BallId) -> Anchor {
        match id {
            BallId::Ball1 => self.ball1,
            BallId::Ball2 => self.ball2,
        }
    }
}

/// World-wide physics options, in pixels and seconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsSettings {
    /// px/s²
    pub gravity: Vec2,
    /// Mass per px² of every dynamic body
    pub density: f32,
    /// Linear velocity damping of the balls (1/s)
    pub air_drag: f32,
    pub friction: f32,
    /// Converts click/force magnitudes (mass·px/ms² at 60 Hz) into mass·px/s²
    pub force_scale: f32,
}

impl Default for PhysicsSettings {
    fn default() -> Self {
        Self {
            gravity: Vec2::new(0.0, 1000.0),
            density: 0.001,
            air_drag: 0.6,
            friction: 0.1,
            force_scale: 1.0e6,
        }
    }
}

/// Complete scene configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneSettings {
    pub ball: BallSettings,
    pub wall: WallSettings,
    pub pin: PinSettings,
    pub reset_positions: ResetPositions,
    pub physics: PhysicsSettings,

    // === Interaction ===
    /// Fraction of the pointer gap closed per step while dragging
    pub drag_stiffness: f32,
    /// Click force per px of distance between click point and ball center
    pub click_force: f32,
    /// Delay between leaving the viewport and respawning (wall-clock ms)
    pub reset_delay_ms: f64,
}

impl Default for SceneSettings {
    fn default() -> Self {
        Self {
            ball: BallSettings::default(),
            wall: WallSettings::default(),
            pin: PinSettings::default(),
            reset_positions: ResetPositions::default(),
            physics: PhysicsSettings::default(),

            drag_stiffness: 0.2,
            click_force: 0.02,
            reset_delay_ms: 1000.0,
        }
    }
}

impl SceneSettings {
    /// Parse a (possibly partial) JSON override on top of the defaults
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject values the simulation cannot work with
    pub fn validate(&self) -> Result<(), SettingsError> {
        let positive = [
            ("ball.radius", self.ball.radius),
            ("wall.size", self.wall.size),
            ("pin.radius", self.pin.radius),
            ("physics.density", self.physics.density),
        ];
        for (field, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(SettingsError::Invalid {
                    field,
                    reason: format!("must be positive, got {value}"),
                });
            }
        }
        if !(self.drag_stiffness > 0.0 && self.drag_stiffness <= 1.0) {
            return Err(SettingsError::Invalid {
                field: "drag_stiffness",
                reason: format!("must be in (0, 1], got {}", self.drag_stiffness),
            });
        }
        if !(self.reset_delay_ms.is_finite() && self.reset_delay_ms >= 0.0) {
            return Err(SettingsError::Invalid {
                field: "reset_delay_ms",
                reason: format!("must be non-negative, got {}", self.reset_delay_ms),
            });
        }
        Ok(())
    }

    /// Settings for this page: the override when it parses, defaults otherwise
    pub fn load(override_json: Option<&str>) -> Self {
        match override_json {
            Some(json) => match Self::from_json(json) {
                Ok(settings) => {
                    log::info!("Loaded scene settings override");
                    settings
                }
                Err(e) => {
                    log::warn!("Ignoring scene settings override: {e}");
                    Self::default()
                }
            },
            None => {
                log::info!("Using default scene settings");
                Self::default()
            }
        }
    }

    /// Spawn/respawn point of a ball in the given viewport
    pub fn reset_position(&self, id: BallId, viewport: Viewport) -> Vec2 {
        self.reset_positions.anchor(id).resolve(viewport)
    }
}
