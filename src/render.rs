//! Plot specification and the external renderer seam.

use crate::data::table::Table;
use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Declarative scatter-plot specification handed to the renderer.
///
/// Channel bindings are only present when they resolved to a metadata
/// column, so a renderer can map the document straight onto its own
/// scatter call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlotSpec {
    /// Column holding the x series.
    pub x: String,
    /// Column holding the y series.
    pub y: String,
    /// X axis label, variance percentage embedded.
    pub x_label: String,
    /// Y axis label, variance percentage embedded.
    pub y_label: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
}

/// Raster and vector outputs from the renderer.
#[derive(Debug, Clone)]
pub struct RenderedPlot {
    pub png: Vec<u8>,
    pub pdf: Vec<u8>,
}

/// External scatter-plot renderer.
///
/// Implementations live outside this crate, typically a proxy to a
/// rendering service with its own timeout ceiling. A failure surfaces as
/// [`crate::error::PcaVizError::Render`] and maps to a gateway error at
/// the request boundary; it is never retried here.
pub trait Renderer {
    /// Render the specification over the joined coordinate/metadata rows.
    fn render(&self, spec: &PlotSpec, data: &Table) -> Result<RenderedPlot>;
}
