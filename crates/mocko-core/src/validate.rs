//! Input validation: canvas dimensions, image file types, colors.
//!
//! Everything here runs before a mutation is applied, so a rejected value
//! never reaches the scene.

use crate::error::{CoreError, CoreResult};

/// Check that both canvas dimensions fall within `min..=max`.
pub fn validate_dimensions(width: f64, height: f64, min: f64, max: f64) -> CoreResult<()> {
    let ok = |v: f64| v.is_finite() && (min..=max).contains(&v);
    if ok(width) && ok(height) {
        Ok(())
    } else {
        Err(CoreError::InvalidDimensions {
            width,
            height,
            min,
            max,
        })
    }
}

/// Image formats accepted for insertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
    Webp,
    Gif,
    Svg,
}

impl ImageFormat {
    pub fn from_mime(mime: &str) -> CoreResult<Self> {
        match mime.trim().to_ascii_lowercase().as_str() {
            "image/png" => Ok(Self::Png),
            "image/jpeg" | "image/jpg" => Ok(Self::Jpeg),
            "image/webp" => Ok(Self::Webp),
            "image/gif" => Ok(Self::Gif),
            "image/svg+xml" => Ok(Self::Svg),
            other => Err(CoreError::UnsupportedFileType(other.to_string())),
        }
    }

    pub fn from_file_name(name: &str) -> CoreResult<Self> {
        let ext = name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "png" => Ok(Self::Png),
            "jpg" | "jpeg" => Ok(Self::Jpeg),
            "webp" => Ok(Self::Webp),
            "gif" => Ok(Self::Gif),
            "svg" => Ok(Self::Svg),
            _ => Err(CoreError::UnsupportedFileType(name.to_string())),
        }
    }

    pub fn mime(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Webp => "image/webp",
            Self::Gif => "image/gif",
            Self::Svg => "image/svg+xml",
        }
    }
}

fn is_hex(s: &str) -> bool {
    matches!(s.len(), 3 | 4 | 6 | 8) && s.bytes().all(|b| b.is_ascii_hexdigit())
}

fn is_rgb_call(s: &str) -> bool {
    let body = s
        .strip_prefix("rgba(")
        .or_else(|| s.strip_prefix("rgb("))
        .and_then(|rest| rest.strip_suffix(')'));
    let Some(body) = body else {
        return false;
    };
    let parts: Vec<&str> = body.split(',').map(str::trim).collect();
    matches!(parts.len(), 3 | 4) && parts.iter().all(|p| p.parse::<f64>().is_ok())
}

/// Accepts hex colors, `rgb()`/`rgba()` calls, and CSS color keywords.
pub fn validate_color(color: &str) -> CoreResult<()> {
    let c = color.trim();
    let valid = match c.strip_prefix('#') {
        Some(hex) => is_hex(hex),
        None => is_rgb_call(c) || (!c.is_empty() && c.bytes().all(|b| b.is_ascii_alphabetic())),
    };
    if valid {
        Ok(())
    } else {
        Err(CoreError::InvalidColor(color.to_string()))
    }
}
