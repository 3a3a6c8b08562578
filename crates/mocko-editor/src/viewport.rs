//! Viewport and zoom management.
//!
//! Zoom is a CSS `scale()` on the wrapper element rather than an internal
//! canvas transform. To let the user scroll past every edge of a zoomed
//! canvas, the wrapper sits inside a transparent phantom element that is
//! larger than the zoomed canvas by a padding proportional to the
//! container; centering then means scrolling the container to the middle
//! of the phantom.
//!
//! Everything here is pure arithmetic over container metrics: the host
//! measures the DOM, feeds `ContainerMetrics` in, and applies the returned
//! `CenteringLayout` / `ZoomStyle`.

use crate::config::EditorConfig;
use log::debug;

/// Size of the scrolling container, in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContainerMetrics {
    pub width: f64,
    pub height: f64,
    pub device_pixel_ratio: f64,
}

impl ContainerMetrics {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            device_pixel_ratio: 1.0,
        }
    }

    pub fn with_dpr(mut self, dpr: f64) -> Self {
        self.device_pixel_ratio = dpr;
        self
    }
}

/// Result of a centering pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CenteringLayout {
    /// Padding on the left and right of the zoomed canvas.
    pub padding_x: f64,
    /// Padding above and below the zoomed canvas.
    pub padding_y: f64,
    /// Phantom element size: zoomed canvas plus padding on both sides.
    pub phantom_width: f64,
    pub phantom_height: f64,
    pub scroll_left: f64,
    pub scroll_top: f64,
}

/// Styles the host applies to the canvas wrapper after a zoom change.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoomStyle {
    /// CSS transform, e.g. `scale(1.5)`.
    pub transform: String,
    pub transform_origin: &'static str,
    pub image_rendering: &'static str,
    /// Backing-store bitmap size for the current device pixel ratio.
    pub backing_width: u32,
    pub backing_height: u32,
    /// Scale the renderer applies so one canvas unit fills `dpr` pixels.
    pub pixel_ratio: f64,
}

#[derive(Debug, Clone)]
pub struct ViewportManager {
    zoom: f64,
    min_zoom: f64,
    max_zoom: f64,
    step: f64,
    padding_ratio: f64,
    fit_ratio: f64,
    container: Option<ContainerMetrics>,
    layout: Option<CenteringLayout>,
}

impl ViewportManager {
    pub fn new(config: &EditorConfig) -> Self {
        Self {
            zoom: 1.0,
            min_zoom: config.min_zoom,
            max_zoom: config.max_zoom,
            step: config.zoom_step,
            padding_ratio: config.padding_ratio,
            fit_ratio: config.fit_ratio,
            container: None,
            layout: None,
        }
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    /// Set the zoom level, clamped to the configured range. Non-finite
    /// values are ignored. Returns the effective zoom.
    pub fn set_zoom(&mut self, zoom: f64) -> f64 {
        if zoom.is_finite() {
            self.zoom = zoom.clamp(self.min_zoom, self.max_zoom);
        }
        self.zoom
    }

    pub fn zoom_in(&mut self) -> f64 {
        self.set_zoom(self.zoom * self.step)
    }

    pub fn zoom_out(&mut self) -> f64 {
        self.set_zoom(self.zoom / self.step)
    }

    /// Largest zoom at which the whole canvas fits inside the container,
    /// leaving `1 - fit_ratio` of each dimension free.
    pub fn zoom_to_fit(&mut self, canvas_width: f64, canvas_height: f64) -> f64 {
        let Some(container) = self.container else {
            return self.zoom;
        };
        if canvas_width <= 0.0 || canvas_height <= 0.0 {
            return self.zoom;
        }
        let fit = (container.width * self.fit_ratio / canvas_width)
            .min(container.height * self.fit_ratio / canvas_height);
        self.set_zoom(fit)
    }

    pub fn container(&self) -> Option<ContainerMetrics> {
        self.container
    }

    pub fn set_container(&mut self, metrics: ContainerMetrics) {
        self.container = Some(metrics);
    }

    /// Last computed centering layout.
    pub fn layout(&self) -> Option<CenteringLayout> {
        self.layout
    }

    /// Record a user scroll so pointer conversion stays accurate.
    pub fn set_scroll(&mut self, scroll_left: f64, scroll_top: f64) {
        if let Some(layout) = &mut self.layout {
            layout.scroll_left = scroll_left;
            layout.scroll_top = scroll_top;
        }
    }

    /// Recompute padding, phantom size and scroll offsets from scratch.
    ///
    /// Returns `None` until container metrics are known. Calling twice with
    /// the same inputs yields the same layout.
    pub fn center(&mut self, canvas_width: f64, canvas_height: f64) -> Option<CenteringLayout> {
        let container = self.container?;
        let padding_x = container.width * self.padding_ratio;
        let padding_y = container.height * self.padding_ratio;
        let phantom_width = canvas_width * self.zoom + padding_x * 2.0;
        let phantom_height = canvas_height * self.zoom + padding_y * 2.0;
        let layout = CenteringLayout {
            padding_x,
            padding_y,
            phantom_width,
            phantom_height,
            scroll_left: ((phantom_width - container.width) / 2.0).max(0.0),
            scroll_top: ((phantom_height - container.height) / 2.0).max(0.0),
        };
        debug!(
            "centered {canvas_width}x{canvas_height} at zoom {:.3}: scroll ({:.1}, {:.1})",
            self.zoom, layout.scroll_left, layout.scroll_top
        );
        self.layout = Some(layout);
        Some(layout)
    }

    pub fn zoom_style(&self, canvas_width: f64, canvas_height: f64) -> ZoomStyle {
        let dpr = self
            .container
            .map(|c| c.device_pixel_ratio)
            .filter(|dpr| dpr.is_finite() && *dpr > 0.0)
            .unwrap_or(1.0);
        ZoomStyle {
            transform: format!("scale({})", self.zoom),
            transform_origin: "0 0",
            image_rendering: if self.zoom > 1.0 { "crisp-edges" } else { "auto" },
            backing_width: (canvas_width * dpr).ceil().max(1.0) as u32,
            backing_height: (canvas_height * dpr).ceil().max(1.0) as u32,
            pixel_ratio: dpr,
        }
    }

    /// Convert a point relative to the container's visible area into
    /// canvas coordinates.
    pub fn screen_to_canvas(&self, sx: f64, sy: f64) -> (f64, f64) {
        let (pad_x, pad_y, scroll_x, scroll_y) = self.offsets();
        (
            (sx + scroll_x - pad_x) / self.zoom,
            (sy + scroll_y - pad_y) / self.zoom,
        )
    }

    pub fn canvas_to_screen(&self, cx: f64, cy: f64) -> (f64, f64) {
        let (pad_x, pad_y, scroll_x, scroll_y) = self.offsets();
        (
            cx * self.zoom + pad_x - scroll_x,
            cy * self.zoom + pad_y - scroll_y,
        )
    }

    fn offsets(&self) -> (f64, f64, f64, f64) {
        self.layout
            .map(|l| (l.padding_x, l.padding_y, l.scroll_left, l.scroll_top))
            .unwrap_or((0.0, 0.0, 0.0, 0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn manager() -> ViewportManager {
        let mut vp = ViewportManager::new(&EditorConfig::default());
        vp.set_container(ContainerMetrics::new(1000.0, 800.0));
        vp
    }

    #[test]
    fn zoom_is_clamped() {
        let mut vp = manager();
        assert_eq!(vp.set_zoom(10.0), 5.0);
        assert_eq!(vp.set_zoom(0.01), 0.1);
        assert_eq!(vp.set_zoom(f64::NAN), 0.1);
        for _ in 0..100 {
            vp.zoom_in();
        }
        assert_eq!(vp.zoom(), 5.0);
    }

    #[test]
    fn zoom_steps_are_reversible() {
        let mut vp = manager();
        vp.zoom_in();
        assert!((vp.zoom() - 1.1).abs() < 1e-9);
        vp.zoom_out();
        assert!((vp.zoom() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn centering_puts_scroll_at_midpoint() {
        let mut vp = manager();
        vp.set_zoom(2.0);
        let layout = vp.center(400.0, 300.0).unwrap();
        assert_eq!(layout.padding_x, 500.0);
        assert_eq!(layout.padding_y, 400.0);
        assert_eq!(layout.phantom_width, 1800.0);
        assert_eq!(layout.phantom_height, 1400.0);
        assert_eq!(layout.scroll_left, 400.0);
        assert_eq!(layout.scroll_top, 300.0);
    }

    #[test]
    fn centering_is_idempotent() {
        let mut vp = manager();
        let first = vp.center(1080.0, 1080.0);
        let second = vp.center(1080.0, 1080.0);
        assert_eq!(first, second);
    }

    #[test]
    fn centering_needs_container() {
        let mut vp = ViewportManager::new(&EditorConfig::default());
        assert_eq!(vp.center(100.0, 100.0), None);
    }

    #[test]
    fn centered_canvas_midpoint_is_screen_midpoint() {
        let mut vp = manager();
        vp.set_zoom(0.5);
        vp.center(1080.0, 1080.0);
        let (sx, sy) = vp.canvas_to_screen(540.0, 540.0);
        assert!((sx - 500.0).abs() < 1e-9);
        assert!((sy - 400.0).abs() < 1e-9);
        let (cx, cy) = vp.screen_to_canvas(sx, sy);
        assert!((cx - 540.0).abs() < 1e-9);
        assert!((cy - 540.0).abs() < 1e-9);
    }

    #[test]
    fn zoom_to_fit_uses_smaller_axis() {
        let mut vp = manager();
        let zoom = vp.zoom_to_fit(2000.0, 1000.0);
        assert!((zoom - 0.45).abs() < 1e-9);
    }

    #[test]
    fn zoom_style_sizes_backing_store_by_dpr() {
        let mut vp = ViewportManager::new(&EditorConfig::default());
        vp.set_container(ContainerMetrics::new(800.0, 600.0).with_dpr(2.0));
        vp.set_zoom(1.5);
        let style = vp.zoom_style(500.0, 250.0);
        assert_eq!(style.transform, "scale(1.5)");
        assert_eq!(style.image_rendering, "crisp-edges");
        assert_eq!((style.backing_width, style.backing_height), (1000, 500));
        assert_eq!(style.pixel_ratio, 2.0);
    }
}
