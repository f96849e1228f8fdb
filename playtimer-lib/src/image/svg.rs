//! SVG template for the progress ring.

use std::f64::consts::PI;

use crate::config::RingStyle;

pub(crate) const WIDTH: u32 = 128;
pub(crate) const HEIGHT: u32 = 128;
const PADDING: u32 = 8;
const STROKE_WIDTH: u32 = 16;
const BG_STROKE_COLOR: &str = "#535353";
// -90 is top center; the round caps look centered a little later.
const ROUNDED_ORIGIN: i32 = -87;
const SHADOW_STYLE: &str = "#progress{filter: drop-shadow(-4px 7px 6px rgba(16, 16, 16, 0.2));}";

/// Geometry derived from the fixed canvas size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct RingGeometry {
    pub center_x: u32,
    pub center_y: u32,
    pub radius: f64,
    pub base_width: u32,
    pub circumference: f64,
}

impl RingGeometry {
    pub(crate) fn new() -> Self {
        let radius = f64::from(WIDTH) / 2.0 - f64::from(STROKE_WIDTH) - f64::from(PADDING);
        Self {
            center_x: WIDTH / 2,
            center_y: HEIGHT / 2,
            radius,
            base_width: (f64::from(STROKE_WIDTH) * 0.25).round() as u32,
            circumference: 2.0 * PI * radius,
        }
    }

    /// Dash offset that leaves `progress` percent of the ring drawn.
    pub(crate) fn dash_offset(&self, progress: f64) -> f64 {
        self.circumference * (1.0 - progress / 100.0)
    }
}

/// Render the ring for an already clamped and quantized `progress`.
pub(crate) fn progress_ring(progress: f64, style: &RingStyle) -> String {
    let geometry = RingGeometry::new();
    let RingGeometry {
        center_x,
        center_y,
        radius,
        base_width,
        circumference,
    } = geometry;
    let dash_offset = geometry.dash_offset(progress);

    let shadow = if style.shadow { SHADOW_STYLE } else { "" };
    let origin = if style.rounded { ROUNDED_ORIGIN } else { -90 };
    let linecap = if style.rounded {
        r#" stroke-linecap="round""#
    } else {
        ""
    };
    let color = &style.color;

    format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{WIDTH}" height="{HEIGHT}" viewBox="0 0 {WIDTH} {HEIGHT}">
  <style>{shadow}</style>
  <circle cx="{center_x}" cy="{center_y}" r="{radius}" fill="none" stroke="{BG_STROKE_COLOR}" stroke-width="{base_width}" />
  <circle id="progress"
    cx="{center_x}" cy="{center_y}" r="{radius}" fill="none" stroke="{color}"
    stroke-width="{STROKE_WIDTH}" stroke-dasharray="{circumference}" stroke-dashoffset="{dash_offset}"
    transform="rotate({origin} {center_x} {center_y})"{linecap}
  />
</svg>
"#
    )
}
