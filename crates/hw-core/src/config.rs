//! Canvas configuration and attribute parsing.
//!
//! Hosts forward the element attributes they observe (`width`, `height`,
//! `resolution`) as raw strings. Values are validated here so the batcher
//! only ever sees usable geometry.

use crate::geometry::SurfaceGeometry;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Attributes whose changes must be forwarded to [`CanvasConfig::set_attribute`].
pub const OBSERVED_ATTRIBUTES: [&str; 3] = ["width", "height", "resolution"];

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("unknown attribute `{0}`")]
    UnknownAttribute(String),
    #[error("attribute `{name}`: `{value}` is not a number")]
    InvalidNumber { name: String, value: String },
    #[error("attribute `{name}`: {value} is out of range")]
    OutOfRange { name: String, value: f64 },
}

/// What to do with the surface when the last active pointer lifts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReleasePolicy {
    /// Wipe every stroke once no pointer is down.
    #[default]
    ClearSurface,
    /// Leave drawn strokes on the surface.
    KeepContent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LineCap {
    #[default]
    Butt,
    Round,
    Square,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LineJoin {
    #[default]
    Miter,
    Round,
    Bevel,
}

/// RGBA color, 8 bits per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const BLACK: Self = Self::rgb(0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// CSS color string, e.g. `rgba(0, 0, 0, 1)`.
    pub fn to_css(&self) -> String {
        let alpha = self.a as f64 / 255.0;
        format!("rgba({}, {}, {}, {alpha})", self.r, self.g, self.b)
    }
}

impl Default for Rgba {
    fn default() -> Self {
        Self::BLACK
    }
}

/// How segments are stroked. Defaults match a fresh 2D canvas context.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StrokeStyle {
    pub width: f64,
    pub color: Rgba,
    pub cap: LineCap,
    pub join: LineJoin,
}

impl Default for StrokeStyle {
    fn default() -> Self {
        Self {
            width: 1.0,
            color: Rgba::BLACK,
            cap: LineCap::Butt,
            join: LineJoin::Miter,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CanvasConfig {
    pub geometry: SurfaceGeometry,
    pub stroke: StrokeStyle,
    pub release_policy: ReleasePolicy,
}

impl CanvasConfig {
    /// Parse a JSON config, filling omitted fields with defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Apply one observed attribute. On success returns the resulting
    /// geometry, which the caller hands to the batcher. On error the config
    /// is left untouched.
    pub fn set_attribute(&mut self, name: &str, value: &str) -> Result<SurfaceGeometry, ConfigError> {
        let parsed = parse_number(name, value)?;
        match name {
            "width" | "height" => {
                if parsed < 0.0 {
                    return Err(ConfigError::OutOfRange {
                        name: name.to_string(),
                        value: parsed,
                    });
                }
                if name == "width" {
                    self.geometry.width = parsed;
                } else {
                    self.geometry.height = parsed;
                }
            }
            "resolution" => {
                if parsed <= 0.0 {
                    return Err(ConfigError::OutOfRange {
                        name: name.to_string(),
                        value: parsed,
                    });
                }
                self.geometry.scale = parsed;
            }
            _ => return Err(ConfigError::UnknownAttribute(name.to_string())),
        }
        log::debug!("attribute {name}={parsed} -> {:?}", self.geometry);
        Ok(self.geometry)
    }
}

fn parse_number(name: &str, value: &str) -> Result<f64, ConfigError> {
    if !OBSERVED_ATTRIBUTES.contains(&name) {
        return Err(ConfigError::UnknownAttribute(name.to_string()));
    }
    match leading_float(value) {
        Some(v) if v.is_finite() => Ok(v),
        Some(v) => Err(ConfigError::OutOfRange {
            name: name.to_string(),
            value: v,
        }),
        None => Err(ConfigError::InvalidNumber {
            name: name.to_string(),
            value: value.to_string(),
        }),
    }
}

/// Longest numeric prefix of `value`, the way an HTML attribute is read
/// with `parseFloat`: surrounding whitespace and any trailing unit are
/// ignored (`"300px"` is 300). `None` when no number starts the string.
fn leading_float(value: &str) -> Option<f64> {
    let text = value.trim();
    let bytes = text.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }
    if text[end..].starts_with("Infinity") {
        return text[..end + "Infinity".len()].parse().ok();
    }

    let digits = |from: usize| {
        bytes[from..]
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .count()
    };
    let int_digits = digits(end);
    end += int_digits;
    let mut frac_digits = 0;
    if bytes.get(end) == Some(&b'.') {
        frac_digits = digits(end + 1);
        if int_digits > 0 || frac_digits > 0 {
            end += 1 + frac_digits;
        }
    }
    if int_digits == 0 && frac_digits == 0 {
        return None;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp = end + 1;
        if matches!(bytes.get(exp), Some(b'+' | b'-')) {
            exp += 1;
        }
        let exp_digits = digits(exp);
        if exp_digits > 0 {
            end = exp + exp_digits;
        }
    }
    text[..end].parse().ok()
}
