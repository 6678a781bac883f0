//! Page-space geometry: content transforms, viewports, rotation handling
//! and the position math that maps a PDF text run onto an unrotated page.

/// Six-value affine fragment describing a single text run in PDF user
/// space: font height/width in px, skew offsets and the run origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContentTransform {
    pub font_height: f64,
    pub font_width: f64,
    pub offset_x: f64,
    pub offset_y: f64,
    pub x: f64,
    pub y: f64,
}

impl From<[f64; 6]> for ContentTransform {
    fn from(m: [f64; 6]) -> Self {
        Self {
            font_height: m[0],
            font_width: m[1],
            offset_x: m[2],
            offset_y: m[3],
            x: m[4],
            y: m[5],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewBox {
    pub x_min: f64,
    pub y_min: f64,
    pub x_max: f64,
    pub y_max: f64,
}

impl ViewBox {
    pub fn width(&self) -> f64 {
        (self.x_max - self.x_min).max(0.0)
    }

    pub fn height(&self) -> f64 {
        (self.y_max - self.y_min).max(0.0)
    }
}

impl From<[f64; 4]> for ViewBox {
    fn from(b: [f64; 4]) -> Self {
        Self {
            x_min: b[0],
            y_min: b[1],
            x_max: b[2],
            y_max: b[3],
        }
    }
}

/// Scale/rotation-aware mapping from PDF user space to the rendering
/// surface. Recomputed from the page for every scale; never cached here.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Intrinsic page rotation in degrees, normalized to 0/90/180/270.
    pub rotation: i32,
    /// Page bounds in user-space units at scale 1.
    pub view_box: ViewBox,
    /// Rendered width at the requested scale, rotation applied.
    pub width: f64,
    /// Rendered height at the requested scale, rotation applied.
    pub height: f64,
}

/// Page/viewport provider collaborator.
pub trait PageGeometry {
    /// Intrinsic page rotation in degrees.
    fn rotation(&self) -> i32;

    fn viewport(&self, scale: f64) -> Viewport;
}

/// Page described by its scale-1 bounds and intrinsic rotation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StaticPage {
    view_box: ViewBox,
    rotation: i32,
}

impl StaticPage {
    pub fn new(view_box: ViewBox, rotation: i32) -> Self {
        Self {
            view_box,
            rotation: normalized_page_rotation(rotation),
        }
    }
}

impl PageGeometry for StaticPage {
    fn rotation(&self) -> i32 {
        self.rotation
    }

    fn viewport(&self, scale: f64) -> Viewport {
        let width = self.view_box.width();
        let height = self.view_box.height();
        // A 90/270 base rotation swaps the rendered extents.
        let (rotated_width, rotated_height) = if self.rotation == 90 || self.rotation == 270 {
            (height, width)
        } else {
            (width, height)
        };
        Viewport {
            rotation: self.rotation,
            view_box: self.view_box,
            width: rotated_width * scale,
            height: rotated_height * scale,
        }
    }
}

/// Normalizes an arbitrary rotation in degrees to `[0, 360)`.
pub fn normalized_rotation(degrees: i32) -> i32 {
    degrees.rem_euclid(360)
}

fn normalized_page_rotation(degrees: i32) -> i32 {
    match degrees.rem_euclid(360) {
        90 => 90,
        180 => 180,
        270 => 270,
        _ => 0,
    }
}

/// Requested display rotation minus the page's intrinsic rotation. A page
/// that is rotated by default must not have its text rotated again.
pub fn effective_rotation(requested: i32, intrinsic: i32) -> i32 {
    normalized_rotation(requested - intrinsic)
}

/// True when text runs sideways under `rotation`, i.e. rotation mod 180
/// is not zero. Invariant under any 180-degree shift.
pub fn is_sideways(rotation: i32) -> bool {
    rotation.rem_euclid(180) != 0
}

/// Orientation of one text item relative to the rendering surface.
///
/// `sideways` picks the measurement axis for glyph width checks;
/// `default_sideways` decides which transform components map to
/// horizontal vs vertical placement, because the PDF coordinate axes
/// swap under a 90/270 base rotation independent of any requested one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Orientation {
    pub sideways: bool,
    pub default_sideways: bool,
}

impl Orientation {
    pub fn resolve(requested_rotation: i32, intrinsic_rotation: i32, viewport: &Viewport) -> Self {
        Self {
            sideways: is_sideways(effective_rotation(requested_rotation, intrinsic_rotation)),
            default_sideways: is_sideways(viewport.rotation),
        }
    }
}

/// Computes `(top, left)` for a text run in page-space units.
///
/// PDF space has its origin bottom-left with y growing upward; screen
/// space is top-left with y growing downward. A sideways base viewport
/// exchanges the roles of the x/y transform components.
pub fn page_position(
    transform: &ContentTransform,
    view_box: &ViewBox,
    default_sideways: bool,
) -> (f64, f64) {
    if default_sideways {
        (
            transform.x + transform.offset_x + view_box.y_min,
            transform.y - view_box.x_min,
        )
    } else {
        (
            view_box.y_max - (transform.y + transform.offset_y),
            transform.x - view_box.x_min,
        )
    }
}

/// Nominal font size of the run in px, before display scaling.
pub fn nominal_font_size(transform: &ContentTransform, default_sideways: bool) -> f64 {
    if default_sideways {
        transform.font_width
    } else {
        transform.font_height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotation_normalizes_into_range() {
        assert_eq!(normalized_rotation(0), 0);
        assert_eq!(normalized_rotation(360), 0);
        assert_eq!(normalized_rotation(-90), 270);
        assert_eq!(normalized_rotation(450), 90);
        assert_eq!(effective_rotation(0, 90), 270);
        assert_eq!(effective_rotation(90, 90), 0);
    }

    #[test]
    fn page_rotation_rejects_non_quarter_turns() {
        let page = StaticPage::new([0.0, 0.0, 600.0, 800.0].into(), 45);
        assert_eq!(page.rotation(), 0, "non-quarter rotation should clamp to 0");
    }

    #[test]
    fn sideways_viewport_swaps_extents() {
        let page = StaticPage::new([0.0, 0.0, 600.0, 800.0].into(), 90);
        let viewport = page.viewport(2.0);
        assert_eq!(viewport.width, 1600.0, "rotated width should come from page height");
        assert_eq!(viewport.height, 1200.0, "rotated height should come from page width");
        assert_eq!(viewport.view_box.width(), 600.0, "view box stays unrotated");
    }

    #[test]
    fn upright_viewport_keeps_extents() {
        let page = StaticPage::new([0.0, 0.0, 600.0, 800.0].into(), 180);
        let viewport = page.viewport(1.0);
        assert_eq!(viewport.width, 600.0);
        assert_eq!(viewport.height, 800.0);
    }
}
