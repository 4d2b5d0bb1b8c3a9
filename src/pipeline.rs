//! End-to-end orchestration of the analysis pipeline.
//!
//! Each request is processed synchronously, start to finish; all
//! intermediate tables and matrices are request-scoped, so the pipeline is
//! stateless and reentrant. Validation failures short-circuit the
//! remaining stages and no partial result ever escapes.

use crate::aesthetics::{resolve_aesthetics, AestheticMapping, ChannelRequests};
use crate::align::align_samples;
use crate::assemble::{
    assemble_response, build_plot_spec, join_scores, variance_percents, PcaResponse,
    VarianceExplained,
};
use crate::data::resolve::{resolve_feature_axis, resolve_sample_axis};
use crate::data::table::Table;
use crate::error::Result;
use crate::normalize::normalize_log_cpm;
use crate::projection::{project, Projection};
use crate::render::{PlotSpec, Renderer};
use log::{debug, info};

/// One analysis request: two uploaded tables plus channel overrides.
///
/// The multipart HTTP layer that fills this struct lives outside the
/// crate.
#[derive(Debug, Clone)]
pub struct PcaRequest<'a> {
    /// Expression matrix bytes, delimiter auto-detected.
    pub expression: &'a [u8],
    /// Sample metadata bytes, delimiter auto-detected.
    pub metadata: &'a [u8],
    /// Optional per-channel overrides.
    pub channels: ChannelRequests,
}

/// Everything the assembler needs, computed before any renderer
/// involvement.
#[derive(Debug, Clone)]
pub struct Analysis {
    /// PC scores joined with the retained metadata, metadata order.
    pub joined: Table,
    /// Raw projection with full-precision variance ratios.
    pub projection: Projection,
    /// Resolved aesthetic mapping.
    pub mapping: AestheticMapping,
    /// Display-rounded variance percentages.
    pub variance: VarianceExplained,
    /// Scatter specification for the renderer.
    pub plot_spec: PlotSpec,
    /// Retained sample count.
    pub n_samples: usize,
    /// Retained feature count.
    pub n_features: usize,
}

/// Run ingestion through aesthetic resolution, no rendering.
pub fn analyze(request: &PcaRequest) -> Result<Analysis> {
    let expression = resolve_feature_axis(Table::read(request.expression)?)?;
    let metadata = resolve_sample_axis(Table::read(request.metadata)?)?;
    debug!(
        "parsed expression {}x{} and metadata {}x{}",
        expression.n_rows(),
        expression.n_columns(),
        metadata.n_rows(),
        metadata.n_columns()
    );

    let sample_axis: Vec<String> = metadata
        .index_labels()
        .map(<[String]>::to_vec)
        .unwrap_or_default();
    let aligned = align_samples(&expression, &sample_axis)?;
    debug!(
        "aligned {} of {} metadata samples",
        aligned.n_samples(),
        sample_axis.len()
    );

    let normalized = normalize_log_cpm(&aligned)?;
    let projection = project(&normalized)?;

    let retained = metadata.select_rows(&normalized.sample_ids)?;
    let mapping = resolve_aesthetics(&retained, &request.channels)?;
    let variance = variance_percents(&projection);
    let joined = join_scores(&projection, &retained)?;
    let plot_spec = build_plot_spec(&mapping, variance);

    info!(
        "projected {} samples over {} features (PC1 {:.1}%, PC2 {:.1}%)",
        normalized.n_samples(),
        normalized.n_features(),
        variance.pc1,
        variance.pc2
    );

    Ok(Analysis {
        n_samples: normalized.n_samples(),
        n_features: normalized.n_features(),
        joined,
        projection,
        mapping,
        variance,
        plot_spec,
    })
}

/// Full request handling: analysis, rendering, and payload packaging.
pub fn run(request: &PcaRequest, renderer: &dyn Renderer) -> Result<PcaResponse> {
    let analysis = analyze(request)?;
    assemble_response(
        &analysis.joined,
        &analysis.mapping,
        analysis.variance,
        analysis.n_features,
        renderer,
    )
}
