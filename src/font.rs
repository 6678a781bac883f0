//! Font metrics lookup: the registry collaborator and its failure modes.

use std::collections::HashMap;
use std::future::Future;

use serde::Deserialize;
use thiserror::Error;

/// Family used whenever the registry cannot supply a better fallback.
pub const GENERIC_FALLBACK: &str = "sans-serif";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FontMetrics {
    /// Fraction of the line height above the baseline.
    pub ascent: f64,
    /// Family to substitute when the declared font misfits.
    pub fallback_name: String,
}

impl Default for FontMetrics {
    fn default() -> Self {
        Self {
            ascent: 1.0,
            fallback_name: GENERIC_FALLBACK.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum FontError {
    #[error("font {0:?} is not known to the registry")]
    UnknownFont(String),
    #[error("font registry is unavailable: {0}")]
    Unavailable(String),
}

/// Asynchronous font metrics source, keyed by font name.
///
/// Caching and coalescing of concurrent lookups for the same name are the
/// registry's responsibility; the aligner issues one lookup per alignment.
pub trait FontRegistry {
    fn ensure_font(
        &self,
        font_name: &str,
    ) -> impl Future<Output = Result<FontMetrics, FontError>> + Send;
}

/// Registry backed by a prebuilt metrics table. Lookups resolve
/// immediately; unknown names report [`FontError::UnknownFont`].
#[derive(Debug, Clone, Default)]
pub struct TableRegistry {
    fonts: HashMap<String, FontMetrics>,
}

impl TableRegistry {
    pub fn new(fonts: HashMap<String, FontMetrics>) -> Self {
        Self { fonts }
    }

    pub fn insert(&mut self, font_name: impl Into<String>, metrics: FontMetrics) {
        self.fonts.insert(font_name.into(), metrics);
    }
}

impl FontRegistry for TableRegistry {
    fn ensure_font(
        &self,
        font_name: &str,
    ) -> impl Future<Output = Result<FontMetrics, FontError>> + Send {
        let found = self
            .fonts
            .get(font_name)
            .cloned()
            .ok_or_else(|| FontError::UnknownFont(font_name.to_string()));
        async move { found }
    }
}
