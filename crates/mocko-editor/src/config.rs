//! Editor configuration.

use crate::error::{EditorError, EditorResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tunables for the editor engine.
///
/// Deserializes from camelCase JSON; omitted fields keep their defaults,
/// so a host can override just the values it cares about.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EditorConfig {
    /// Maximum number of undo snapshots kept. Default: **50**.
    pub history_limit: usize,
    /// Coalescing window for object add/remove/modify events.
    pub debounce_ms: u64,
    /// Coalescing window for freehand paths.
    pub path_debounce_ms: u64,
    /// Offset applied to every clone, on both axes.
    pub clone_offset: f64,
    pub eraser_radius: f64,
    pub brush_width: f64,
    pub brush_color: String,
    pub min_zoom: f64,
    pub max_zoom: f64,
    /// Multiplier applied per zoom-in step (divided per zoom-out step).
    pub zoom_step: f64,
    /// Scroll padding on each side, as a fraction of the container size.
    pub padding_ratio: f64,
    /// Fraction of the container the canvas may fill on zoom-to-fit.
    pub fit_ratio: f64,
    pub min_canvas_size: f64,
    pub max_canvas_size: f64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history_limit: 50,
            debounce_ms: 300,
            path_debounce_ms: 500,
            clone_offset: 20.0,
            eraser_radius: 20.0,
            brush_width: 5.0,
            brush_color: "#000000".to_string(),
            min_zoom: 0.1,
            max_zoom: 5.0,
            zoom_step: 1.1,
            padding_ratio: 0.5,
            fit_ratio: 0.9,
            min_canvas_size: 50.0,
            max_canvas_size: 5000.0,
        }
    }
}

impl EditorConfig {
    /// Parse a (possibly partial) JSON configuration.
    pub fn from_json(json: &str) -> EditorResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject limits the viewport and canvas checks cannot work with.
    pub fn validate(&self) -> EditorResult<()> {
        let invalid = |msg: String| -> EditorResult<()> { Err(EditorError::InvalidConfig(msg)) };
        let positive = |v: f64| v.is_finite() && v > 0.0;

        if !positive(self.min_zoom) || !self.max_zoom.is_finite() || self.min_zoom > self.max_zoom {
            return invalid(format!(
                "zoom range {}..={} must be positive and ordered",
                self.min_zoom, self.max_zoom
            ));
        }
        if !self.zoom_step.is_finite() || self.zoom_step <= 1.0 {
            return invalid(format!("zoom step {} must be greater than 1", self.zoom_step));
        }
        if !positive(self.min_canvas_size)
            || !self.max_canvas_size.is_finite()
            || self.min_canvas_size > self.max_canvas_size
        {
            return invalid(format!(
                "canvas size range {}..={} must be positive and ordered",
                self.min_canvas_size, self.max_canvas_size
            ));
        }
        if !positive(self.fit_ratio) || !self.padding_ratio.is_finite() || self.padding_ratio < 0.0 {
            return invalid(format!(
                "fit ratio {} and padding ratio {} must be non-negative",
                self.fit_ratio, self.padding_ratio
            ));
        }
        if !self.clone_offset.is_finite() {
            return invalid(format!("clone offset {} is not finite", self.clone_offset));
        }
        for (name, value) in [
            ("eraser radius", self.eraser_radius),
            ("brush width", self.brush_width),
        ] {
            if !value.is_finite() || value < 0.0 {
                return invalid(format!("{name} {value} is out of range"));
            }
        }
        Ok(())
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn path_debounce(&self) -> Duration {
        Duration::from_millis(self.path_debounce_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config = EditorConfig::from_json(r#"{"historyLimit": 10, "eraserRadius": 8}"#).unwrap();
        assert_eq!(config.history_limit, 10);
        assert_eq!(config.eraser_radius, 8.0);
        assert_eq!(config.debounce(), Duration::from_millis(300));
        assert_eq!(config.path_debounce(), Duration::from_millis(500));
    }

    #[test]
    fn defaults_are_valid() {
        assert!(EditorConfig::default().validate().is_ok());
    }

    #[test]
    fn inverted_zoom_range_is_rejected() {
        let err = EditorConfig::from_json(r#"{"minZoom": 2.0, "maxZoom": 1.0}"#).unwrap_err();
        assert!(matches!(err, EditorError::InvalidConfig(_)));

        let config = EditorConfig {
            min_zoom: 2.0,
            max_zoom: 1.0,
            ..EditorConfig::default()
        };
        let err = crate::editor::Editor::new(800.0, 600.0, config).err();
        assert!(matches!(err, Some(EditorError::InvalidConfig(_))));
    }

    #[test]
    fn out_of_range_limits_are_rejected() {
        for bad in [
            EditorConfig { min_zoom: f64::NAN, ..EditorConfig::default() },
            EditorConfig { max_zoom: f64::INFINITY, ..EditorConfig::default() },
            EditorConfig { min_zoom: 0.0, ..EditorConfig::default() },
            EditorConfig { zoom_step: 0.5, ..EditorConfig::default() },
            EditorConfig { min_canvas_size: 6000.0, ..EditorConfig::default() },
            EditorConfig { eraser_radius: -1.0, ..EditorConfig::default() },
        ] {
            assert!(bad.validate().is_err(), "{bad:?}");
        }
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(EditorConfig::from_json("{\"historyLimit\": \"many\"}").is_err());
    }
}
