#![allow(dead_code)]

use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;

use tokio::sync::oneshot;

use veneer::align::{ItemAligner, TextItem};
use veneer::font::{FontError, FontMetrics, FontRegistry};
use veneer::geometry::StaticPage;
use veneer::measure::{GlyphMeasurer, MeasureAxis};

pub fn page_600x800() -> StaticPage {
    StaticPage::new([0.0, 0.0, 600.0, 800.0].into(), 0)
}

pub fn rotated_page_600x800(rotation: i32) -> StaticPage {
    StaticPage::new([0.0, 0.0, 600.0, 800.0].into(), rotation)
}

pub fn item(font_name: &str, width: f64, transform: [f64; 6]) -> TextItem {
    TextItem::new("Sample run", font_name, width, transform.into())
}

pub fn mounted_aligner(item: TextItem) -> ItemAligner {
    let aligner = ItemAligner::new(item);
    aligner.mount();
    aligner
}

pub fn metrics(ascent: f64, fallback_name: &str) -> FontMetrics {
    FontMetrics {
        ascent,
        fallback_name: fallback_name.to_string(),
    }
}

/// Registry resolving every lookup immediately with the same metrics.
pub struct StubRegistry {
    pub metrics: FontMetrics,
}

impl StubRegistry {
    pub fn new(ascent: f64, fallback_name: &str) -> Self {
        Self {
            metrics: metrics(ascent, fallback_name),
        }
    }
}

impl FontRegistry for StubRegistry {
    fn ensure_font(
        &self,
        _font_name: &str,
    ) -> impl Future<Output = Result<FontMetrics, FontError>> + Send {
        let found = self.metrics.clone();
        async move { Ok(found) }
    }
}

/// Registry that always fails, exercising the default-metrics path.
pub struct FailingRegistry;

impl FontRegistry for FailingRegistry {
    fn ensure_font(
        &self,
        _font_name: &str,
    ) -> impl Future<Output = Result<FontMetrics, FontError>> + Send {
        async move { Err(FontError::Unavailable("stubbed outage".to_string())) }
    }
}

/// Registry whose single lookup stays pending until the test resolves it
/// through the paired sender.
pub struct GatedRegistry {
    rx: Mutex<Option<oneshot::Receiver<FontMetrics>>>,
}

impl GatedRegistry {
    pub fn new() -> (Self, oneshot::Sender<FontMetrics>) {
        let (tx, rx) = oneshot::channel();
        (
            Self {
                rx: Mutex::new(Some(rx)),
            },
            tx,
        )
    }
}

impl FontRegistry for GatedRegistry {
    fn ensure_font(
        &self,
        font_name: &str,
    ) -> impl Future<Output = Result<FontMetrics, FontError>> + Send {
        let rx = self.rx.lock().unwrap().take();
        let font_name = font_name.to_string();
        async move {
            match rx {
                Some(rx) => rx
                    .await
                    .map_err(|_| FontError::Unavailable("metrics channel closed".to_string())),
                None => Err(FontError::UnknownFont(font_name)),
            }
        }
    }
}

/// Deterministic measurement stub keyed by font family; records every
/// axis it was asked about.
pub struct TableMeasurer {
    extents: HashMap<String, f64>,
    axes_seen: Mutex<Vec<MeasureAxis>>,
}

impl TableMeasurer {
    pub fn new(entries: &[(&str, f64)]) -> Self {
        Self {
            extents: entries
                .iter()
                .map(|(family, extent)| (family.to_string(), *extent))
                .collect(),
            axes_seen: Mutex::new(Vec::new()),
        }
    }

    pub fn axes_seen(&self) -> Vec<MeasureAxis> {
        self.axes_seen.lock().unwrap().clone()
    }
}

impl GlyphMeasurer for TableMeasurer {
    fn rendered_extent(&self, font_family: &str, axis: MeasureAxis) -> Option<f64> {
        self.axes_seen.lock().unwrap().push(axis);
        self.extents.get(font_family).copied()
    }
}
