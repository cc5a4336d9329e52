//! Visualization style configuration.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error produced when a style field is outside its valid range.
#[derive(Debug, Error)]
#[error("invalid style: {field} {reason}")]
pub struct StyleError {
    pub field: &'static str,
    pub reason: &'static str,
}

/// How bars attach to the vertical anchor line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BarAnchor {
    /// Bar is centered on the anchor line, extending half its height
    /// above and half below.
    #[default]
    Centered,
    /// Bars grow downward from the anchor when `vertical_position`
    /// is in the top half, upward when it is in the bottom half.
    Directional,
}

/// Visualization style for one pipeline run.
///
/// Built from a caller-supplied preset (typically JSON) and read-only
/// for the duration of the run. [`StyleConfig::validate`] enforces the
/// documented ranges before any work starts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleConfig {
    /// Bar color as RGB.
    pub color: [u8; 3],
    /// Number of bars drawn per frame.
    pub bar_count: u32,
    /// Fraction of each bar slot filled by the bar itself, (0, 1].
    pub bar_width_ratio: f32,
    /// Multiplier on bar height, > 0.
    pub bar_height_scale: f32,
    /// Draw a soft glow rectangle beneath each bar.
    pub glow_enabled: bool,
    /// Glow opacity factor, [0, 1].
    pub glow_intensity: f32,
    /// Amplitude multiplier applied before normalization, > 0.
    pub responsiveness: f32,
    /// Blend factor against the previous frame's bars, [0, 1).
    pub smoothing: f32,
    /// Vertical anchor of the bars, 0 = top, 1 = bottom.
    pub vertical_position: f32,
    /// Margin kept clear on each side, [0, 0.5).
    pub horizontal_margin: f32,
    /// Vertical anchoring policy.
    pub anchor: BarAnchor,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            color: [0x00, 0xff, 0xff], // cyan
            bar_count: 64,
            bar_width_ratio: 0.8,
            bar_height_scale: 1.0,
            glow_enabled: false,
            glow_intensity: 0.5,
            responsiveness: 1.0,
            smoothing: 0.2,
            vertical_position: 0.5,
            horizontal_margin: 0.1,
            anchor: BarAnchor::Centered,
        }
    }
}

impl StyleConfig {
    /// Check every field against its documented range.
    pub fn validate(&self) -> Result<(), StyleError> {
        if self.bar_count == 0 {
            return Err(StyleError {
                field: "bar_count",
                reason: "must be at least 1",
            });
        }
        if !(self.bar_width_ratio > 0.0 && self.bar_width_ratio <= 1.0) {
            return Err(StyleError {
                field: "bar_width_ratio",
                reason: "must be in (0, 1]",
            });
        }
        if !(self.bar_height_scale > 0.0) {
            return Err(StyleError {
                field: "bar_height_scale",
                reason: "must be positive",
            });
        }
        if !(0.0..=1.0).contains(&self.glow_intensity) {
            return Err(StyleError {
                field: "glow_intensity",
                reason: "must be in [0, 1]",
            });
        }
        if !(self.responsiveness > 0.0) {
            return Err(StyleError {
                field: "responsiveness",
                reason: "must be positive",
            });
        }
        if !(self.smoothing >= 0.0 && self.smoothing < 1.0) {
            return Err(StyleError {
                field: "smoothing",
                reason: "must be in [0, 1)",
            });
        }
        if !(0.0..=1.0).contains(&self.vertical_position) {
            return Err(StyleError {
                field: "vertical_position",
                reason: "must be in [0, 1]",
            });
        }
        if !(self.horizontal_margin >= 0.0 && self.horizontal_margin < 0.5) {
            return Err(StyleError {
                field: "horizontal_margin",
                reason: "must be in [0, 0.5)",
            });
        }
        Ok(())
    }
}

/// Parse a hex color to RGB (accepts 6-char RGB or 8-char RGBA with a
/// leading `#` or not; alpha is ignored).
pub fn parse_hex_color(hex: &str) -> Option<[u8; 3]> {
    let hex = hex.trim_start_matches('#');
    if hex.len() != 6 && hex.len() != 8 {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some([r, g, b])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        StyleConfig::default().validate().unwrap();
    }

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(parse_hex_color("#00ffff"), Some([0, 255, 255]));
        assert_eq!(parse_hex_color("ffffff"), Some([255, 255, 255]));
        assert_eq!(parse_hex_color("#00000000"), Some([0, 0, 0]));
        assert_eq!(parse_hex_color("ff8800ff"), Some([255, 136, 0]));
        assert_eq!(parse_hex_color("invalid"), None);
        assert_eq!(parse_hex_color("#fff"), None);
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        let cases: Vec<(&str, Box<dyn Fn(&mut StyleConfig)>)> = vec![
            ("bar_count", Box::new(|s| s.bar_count = 0)),
            ("bar_width_ratio", Box::new(|s| s.bar_width_ratio = 0.0)),
            ("bar_width_ratio", Box::new(|s| s.bar_width_ratio = 1.5)),
            ("bar_height_scale", Box::new(|s| s.bar_height_scale = -1.0)),
            ("glow_intensity", Box::new(|s| s.glow_intensity = 1.5)),
            ("responsiveness", Box::new(|s| s.responsiveness = 0.0)),
            ("smoothing", Box::new(|s| s.smoothing = 1.0)),
            ("vertical_position", Box::new(|s| s.vertical_position = 2.0)),
            ("horizontal_margin", Box::new(|s| s.horizontal_margin = 0.5)),
        ];

        for (field, mutate) in cases {
            let mut style = StyleConfig::default();
            mutate(&mut style);
            let err = style.validate().unwrap_err();
            assert_eq!(err.field, field);
        }
    }

    #[test]
    fn test_preset_json_roundtrip() {
        let style = StyleConfig {
            color: [255, 0, 128],
            bar_count: 32,
            glow_enabled: true,
            anchor: BarAnchor::Directional,
            ..StyleConfig::default()
        };
        let json = serde_json::to_string(&style).unwrap();
        let back: StyleConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.color, style.color);
        assert_eq!(back.bar_count, 32);
        assert_eq!(back.anchor, BarAnchor::Directional);
    }

    #[test]
    fn test_partial_preset_uses_defaults() {
        let style: StyleConfig = serde_json::from_str(r#"{"bar_count": 16}"#).unwrap();
        assert_eq!(style.bar_count, 16);
        assert_eq!(style.color, [0, 255, 255]);
        assert_eq!(style.anchor, BarAnchor::Centered);
    }
}
