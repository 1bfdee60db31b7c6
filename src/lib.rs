//! Bounce Toy - two balls, four walls and two pins in a browser canvas
//!
//! Core modules:
//! - `sim`: Simulation context (scene layout, physics world, interaction, resets)
//! - `renderer`: WebGPU rendering pipeline
//! - `settings`: Scene configuration record
//! - `error`: Errors for the fallible edges (settings overrides, sprite loading)

pub mod error;
pub mod renderer;
pub mod settings;
pub mod sim;

pub use error::{SettingsError, SpriteError};
pub use settings::SceneSettings;

/// Loop and interaction constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz, the physics library's default delta)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 4;
    /// Largest frame delta fed into the accumulator (seconds)
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// Pointer travel (px) after which a press counts as a drag, not a click
    pub const CLICK_SLOP: f32 = 4.0;

    /// Upper bounds on what the renderer uploads per frame
    pub const MAX_BALLS: usize = 4;
    pub const MAX_PINS: usize = 8;
    pub const MAX_WALLS: usize = 8;
}

/// Parse a CSS hex color (`#rgb` or `#rrggbb`) into RGBA components in `0.0..=1.0`
pub fn parse_hex_color(css: &str, opacity: f32) -> Option<[f32; 4]> {
    let hex = css.strip_prefix('#').filter(|h| h.is_ascii())?;
    let channel = |s: &str| u8::from_str_radix(s, 16).ok().map(|v| v as f32 / 255.0);
    let (r, g, b) = match hex.len() {
        3 => {
            let r = channel(hex[0..1].repeat(2).as_str())?;
            let g = channel(hex[1..2].repeat(2).as_str())?;
            let b = channel(hex[2..3].repeat(2).as_str())?;
            (r, g, b)
        }
        6 => (channel(&hex[0..2])?, channel(&hex[2..4])?, channel(&hex[4..6])?),
        _ => return None,
    };
    Some([r, g, b, opacity.clamp(0.0, 1.0)])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(parse_hex_color("#ffffff", 1.0), Some([1.0, 1.0, 1.0, 1.0]));
        assert_eq!(parse_hex_color("#000", 0.5), Some([0.0, 0.0, 0.0, 0.5]));
        assert_eq!(parse_hex_color("white", 1.0), None);
        assert_eq!(parse_hex_color("#12345", 1.0), None);
    }
}
