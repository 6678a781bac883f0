//! Per-item alignment: turns a content-stream transform plus page scale
//! and rotation into a screen-space placement, substituting a fallback
//! font when the rendered glyph metrics misfit the declared ones.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

use serde::Serialize;

use crate::font::{FontMetrics, FontRegistry};
use crate::geometry::{self, ContentTransform, Orientation, PageGeometry};
use crate::measure::{GlyphMeasurer, MeasureAxis};

/// Width disproportion above which the declared font is replaced by its
/// fallback. Strictly greater-than; a run exactly 10% off keeps the
/// declared font. Calibrated against font metric discrepancies in real
/// documents, not tunable independently of the other fit constants.
pub const WIDTH_DISPROPORTION_THRESHOLD: f64 = 0.1;

/// Widening applied to the target width before computing the corrective
/// horizontal scale. Empirical visual-fit correction.
pub const WIDTH_FIT_CORRECTION: f64 = 1.02;

/// Divisor applied to both the displayed font size and the corrective
/// scale factor. Empirical visual-fit correction.
pub const TEXT_SCALE_DIVISOR: f64 = 3.0;

/// One text run as supplied by the content stream: immutable caller input.
#[derive(Debug, Clone, PartialEq)]
pub struct TextItem {
    pub text: String,
    pub font_name: String,
    /// Logical width of the run in user-space units.
    pub width: f64,
    pub transform: ContentTransform,
}

impl TextItem {
    pub fn new(
        text: impl Into<String>,
        font_name: impl Into<String>,
        width: f64,
        transform: ContentTransform,
    ) -> Self {
        Self {
            text: text.into(),
            font_name: font_name.into(),
            width,
            transform,
        }
    }
}

/// Render-time inputs, passed explicitly on every alignment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderContext {
    pub scale: f64,
    /// Requested display rotation in degrees.
    pub rotation: i32,
}

/// Screen-space placement for one text run. Positions are percentages of
/// the scale-1 page extents so consumers can re-derive pixel offsets on
/// pure scale changes without recomputing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Placement {
    pub left_pct: f64,
    pub top_pct: f64,
    /// Display font size in px at the current scale.
    pub font_size: f64,
    pub font_family: String,
    /// Corrective horizontal scale, absent when nothing could be measured.
    pub scale_x: Option<f64>,
    /// Vertical shift compensating the gap between the nominal line box
    /// and the font's ascent, as a percentage of the line height.
    pub baseline_shift_pct: f64,
}

impl Placement {
    /// CSS-style transform string for the placed element.
    pub fn transform_css(&self) -> String {
        let shift = fmt_css_number(self.baseline_shift_pct);
        match self.scale_x {
            Some(scale_x) => format!("scaleX({}) translateY({}%)", fmt_css_number(scale_x), shift),
            None => format!("translateY({}%)", shift),
        }
    }
}

/// Placement plus the content to render inside the span.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextSpan {
    pub content: String,
    #[serde(flatten)]
    pub placement: Placement,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Unmounted,
    Pending,
    Placed,
    Discarded,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AlignOutcome {
    Placed(Placement),
    /// The item has no rendered node yet; no result was produced.
    Skipped,
    /// A newer alignment request took over before this one resolved.
    Superseded,
    /// The item was unmounted while metrics were pending.
    Discarded,
}

#[derive(Debug)]
struct ItemState {
    phase: Phase,
    placement: Option<Placement>,
}

/// Lifecycle holder for one text item.
///
/// Alignment is `UNMOUNTED -> PENDING -> PLACED`, re-entering `PENDING`
/// on every new [`ItemAligner::align`] call, and terminally `DISCARDED`
/// on unmount. The generation counter makes cancellation implicit: a
/// resolved lookup commits nothing unless it is still the newest request
/// on a mounted item.
pub struct ItemAligner {
    item: Mutex<TextItem>,
    mounted: AtomicBool,
    discarded: AtomicBool,
    generation: AtomicU64,
    state: Mutex<ItemState>,
}

impl ItemAligner {
    pub fn new(item: TextItem) -> Self {
        Self {
            item: Mutex::new(item),
            mounted: AtomicBool::new(false),
            discarded: AtomicBool::new(false),
            generation: AtomicU64::new(0),
            state: Mutex::new(ItemState {
                phase: Phase::Unmounted,
                placement: None,
            }),
        }
    }

    pub fn item(&self) -> TextItem {
        self.item.lock().unwrap().clone()
    }

    pub fn phase(&self) -> Phase {
        self.state.lock().unwrap().phase
    }

    /// Latest committed placement, surviving unmount unchanged. While a
    /// metrics lookup is pending this is the default-assumption interim
    /// placement (declared family, no corrective scale, ascent 1).
    pub fn placement(&self) -> Option<Placement> {
        self.state.lock().unwrap().placement.clone()
    }

    /// Marks the item as present in the render tree. A discarded item
    /// stays discarded.
    pub fn mount(&self) {
        if !self.discarded.load(Ordering::SeqCst) {
            self.mounted.store(true, Ordering::SeqCst);
        }
    }

    /// Terminal transition: any in-flight lookup result is dropped.
    pub fn unmount(&self) {
        self.mounted.store(false, Ordering::SeqCst);
        self.discarded.store(true, Ordering::SeqCst);
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.state.lock().unwrap().phase = Phase::Discarded;
    }

    /// Replaces the item's inputs, invalidating any in-flight alignment.
    pub fn replace_item(&self, item: TextItem) {
        *self.item.lock().unwrap() = item;
        self.generation.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock().unwrap();
        if state.phase == Phase::Placed {
            state.phase = Phase::Pending;
        }
    }

    /// Content for the rendered span: the custom renderer's output when
    /// one is supplied, the literal item text otherwise. `None` until a
    /// placement has been committed.
    pub fn span(&self, custom_renderer: Option<&dyn Fn(&TextItem) -> String>) -> Option<TextSpan> {
        let placement = self.placement()?;
        let item = self.item();
        let content = match custom_renderer {
            Some(render) => render(&item),
            None => item.text,
        };
        Some(TextSpan { content, placement })
    }

    /// Aligns the item against the current page, scale and rotation.
    ///
    /// Geometry is synchronous; the font metrics lookup is the only
    /// suspension point. Registry failures degrade to default metrics
    /// (ascent 1, generic fallback) rather than blocking placement.
    pub async fn align<P, R, M>(
        &self,
        page: &P,
        ctx: &RenderContext,
        registry: &R,
        measurer: &M,
    ) -> AlignOutcome
    where
        P: PageGeometry,
        R: FontRegistry,
        M: GlyphMeasurer,
    {
        if !self.mounted.load(Ordering::SeqCst) {
            return AlignOutcome::Skipped;
        }
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.lock().unwrap().phase = Phase::Pending;
        let item = self.item();

        let viewport = page.viewport(ctx.scale);
        let orientation = Orientation::resolve(ctx.rotation, page.rotation(), &viewport);
        let (top, left) = geometry::page_position(
            &item.transform,
            &viewport.view_box,
            orientation.default_sideways,
        );
        let font_size = geometry::nominal_font_size(&item.transform, orientation.default_sideways)
            * ctx.scale
            / TEXT_SCALE_DIVISOR;
        let base = page.viewport(1.0);
        let left_pct = to_percent(left, base.width);
        let top_pct = to_percent(top, base.height);

        // A slow or never-resolving lookup must not block rendering: the
        // item stays selectable at the computed position with default
        // metric assumptions until the lookup lands.
        let interim = Placement {
            left_pct,
            top_pct,
            font_size,
            font_family: item.font_name.clone(),
            scale_x: None,
            baseline_shift_pct: 0.0,
        };
        self.state.lock().unwrap().placement = Some(interim);

        let metrics = match registry.ensure_font(&item.font_name).await {
            Ok(metrics) => metrics,
            Err(err) => {
                log::warn!(
                    "no metrics for font {:?}: {}; using defaults",
                    item.font_name,
                    err
                );
                FontMetrics::default()
            }
        };

        if let Some(outcome) = self.liveness_check(generation) {
            return outcome;
        }

        let axis = if orientation.sideways {
            MeasureAxis::Vertical
        } else {
            MeasureAxis::Horizontal
        };
        let target_width = item.width * ctx.scale;
        let mut font_family = item.font_name.clone();
        let mut measured = positive_extent(measurer.rendered_extent(&font_family, axis));
        if let Some(extent) = measured {
            if exceeds_disproportion_threshold(width_disproportion(target_width, extent)) {
                log::debug!(
                    "substituting {:?} for {:?} (target {} vs measured {})",
                    metrics.fallback_name,
                    font_family,
                    target_width,
                    extent
                );
                font_family = metrics.fallback_name.clone();
                measured = positive_extent(measurer.rendered_extent(&font_family, axis));
            }
        }
        let scale_x = match measured {
            Some(extent) => Some(target_width * WIDTH_FIT_CORRECTION / extent / TEXT_SCALE_DIVISOR),
            None => {
                log::warn!(
                    "unmeasurable rendered extent for {:?}; skipping scale correction",
                    font_family
                );
                None
            }
        };

        let placement = Placement {
            left_pct,
            top_pct,
            font_size,
            font_family,
            scale_x,
            baseline_shift_pct: (1.0 - metrics.ascent) * 100.0,
        };

        let mut state = self.state.lock().unwrap();
        if let Some(outcome) = self.liveness_check(generation) {
            return outcome;
        }
        state.phase = Phase::Placed;
        state.placement = Some(placement.clone());
        AlignOutcome::Placed(placement)
    }

    fn liveness_check(&self, generation: u64) -> Option<AlignOutcome> {
        if self.discarded.load(Ordering::SeqCst) || !self.mounted.load(Ordering::SeqCst) {
            return Some(AlignOutcome::Discarded);
        }
        if self.generation.load(Ordering::SeqCst) != generation {
            return Some(AlignOutcome::Superseded);
        }
        None
    }
}

/// Relative deviation between the expected and measured run width.
///
/// A zero measured width yields infinity rather than NaN; the aligner
/// filters zero and negative extents out before ever comparing, treating
/// them as "no correction possible".
pub fn width_disproportion(target_width: f64, measured_width: f64) -> f64 {
    if measured_width == 0.0 {
        return f64::INFINITY;
    }
    (target_width / measured_width - 1.0).abs()
}

/// Strict comparison: a run exactly at the threshold keeps its font.
pub fn exceeds_disproportion_threshold(disproportion: f64) -> bool {
    disproportion > WIDTH_DISPROPORTION_THRESHOLD
}

fn positive_extent(extent: Option<f64>) -> Option<f64> {
    extent.filter(|value| *value > 0.0)
}

fn to_percent(value: f64, extent: f64) -> f64 {
    if extent > 0.0 {
        value / extent * 100.0
    } else {
        log::warn!("degenerate page extent {}; placing at origin", extent);
        0.0
    }
}

// CSS consumers want short stable numbers; four decimals keeps the fit
// constants exact while hiding float noise like 19.999999999999996.
fn fmt_css_number(value: f64) -> String {
    let mut s = format!("{:.4}", value);
    while s.ends_with('0') {
        s.pop();
    }
    if s.ends_with('.') {
        s.pop();
    }
    if s == "-0" {
        s = "0".to_string();
    }
    s
}
