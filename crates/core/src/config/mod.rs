use serde::{Deserialize, Serialize};

/// Top-level view configuration for the application.
///
/// All values are expressed in CSS-pixel units; the front end that paints the
/// timeline and the gameplay surface is expected to share them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewConfig {
    /// Horizontal scale of the editor timeline.
    pub pixels_per_second: f64,
    /// Dimensions of the gameplay canvas.
    pub surface: SurfaceConfig,
    /// Distance from a viewport edge at which the timeline auto-scrolls to
    /// keep the playhead visible.
    pub scroll_margin_px: f64,
    /// Markers further than this outside the gameplay surface are skipped.
    pub cull_margin_px: f64,
    /// A marker within this distance of the target centre counts as on-target
    /// for the current frame.
    pub hit_window_px: f64,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            pixels_per_second: 120.0,
            surface: SurfaceConfig::default(),
            scroll_margin_px: 80.0,
            cull_margin_px: 40.0,
            hit_window_px: 6.0,
        }
    }
}

/// Dimensions of the surface the gameplay preview is drawn onto.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SurfaceConfig {
    pub width: f64,
    pub height: f64,
}

impl SurfaceConfig {
    /// Centre of the gameplay target along the note travel axis.
    pub fn center_x(&self) -> f64 {
        self.width * 0.5
    }

    pub fn center_y(&self) -> f64 {
        self.height * 0.5
    }
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            width: 880.0,
            height: 300.0,
        }
    }
}
