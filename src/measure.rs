//! Rendered-width measurement capability, injected so the aligner never
//! touches the render tree directly and tests can substitute a stub.

/// Axis along which a rendered run is measured. Sideways text is measured
/// along the vertical axis of the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeasureAxis {
    Horizontal,
    Vertical,
}

/// On-screen extent of the placed element, obtainable only once the
/// element exists in the render tree.
pub trait GlyphMeasurer {
    /// Extent of the run along `axis` with `font_family` applied, or
    /// `None` while no rendered node is available.
    fn rendered_extent(&self, font_family: &str, axis: MeasureAxis) -> Option<f64>;
}

/// Measurer for headless embeddings: nothing is rendered, so nothing can
/// be measured and no scale correction is ever applied.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullMeasurer;

impl GlyphMeasurer for NullMeasurer {
    fn rendered_extent(&self, _font_family: &str, _axis: MeasureAxis) -> Option<f64> {
        None
    }
}
