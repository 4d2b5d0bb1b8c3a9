//! Result assembly: score/metadata join, plot specification, export, and
//! response packaging.

use crate::aesthetics::AestheticMapping;
use crate::data::table::{Column, Index, Table, Value};
use crate::error::{PcaVizError, Result};
use crate::projection::Projection;
use crate::render::{PlotSpec, Renderer};
use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Serialize};

/// Title carried on every generated scatter specification.
pub const PLOT_TITLE: &str = "PCA Plot";

/// Variance-explained percentages, rounded to one decimal place for
/// display.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VarianceExplained {
    #[serde(rename = "PC1")]
    pub pc1: f64,
    #[serde(rename = "PC2")]
    pub pc2: f64,
}

/// Success payload for the request boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PcaResponse {
    /// Base64-encoded PNG of the rendered scatter plot.
    pub png: String,
    /// Base64-encoded PDF of the rendered scatter plot.
    pub pdf: String,
    /// Base64-encoded CSV of the joined PC-score/metadata table.
    pub pc_scores_csv: String,
    /// The resolved aesthetic mapping.
    pub mappings: AestheticMapping,
    pub variance_explained: VarianceExplained,
    /// Retained sample count.
    pub n_samples: usize,
    /// Retained feature count.
    pub n_features: usize,
}

/// Round the full-precision ratios into display percentages.
///
/// This is the only place the ratios are rounded; [`Projection`] keeps
/// full precision so downstream consumers never compound rounding error.
pub fn variance_percents(projection: &Projection) -> VarianceExplained {
    VarianceExplained {
        pc1: round_one_decimal(projection.variance_ratio[0] * 100.0),
        pc2: round_one_decimal(projection.variance_ratio[1] * 100.0),
    }
}

fn round_one_decimal(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

/// Join PC scores with the retained metadata rows.
///
/// Both sides must already share identical sample order; the joined table
/// keeps the metadata's identifier axis and prepends the PC1/PC2 columns.
/// A metadata column literally named "PC1" or "PC2" collides and is
/// rejected rather than silently renamed.
pub fn join_scores(projection: &Projection, metadata: &Table) -> Result<Table> {
    let index = metadata.index().ok_or_else(|| {
        PcaVizError::SampleMismatch("metadata has no identifier axis".to_string())
    })?;
    if index.labels() != projection.sample_ids.as_slice() {
        return Err(PcaVizError::SampleMismatch(
            "projection and metadata sample order diverged".to_string(),
        ));
    }

    let mut columns = Vec::with_capacity(metadata.n_columns() + 2);
    columns.push(Column::new(
        "PC1",
        projection.pc1.iter().map(|&v| Value::Number(v)).collect(),
    ));
    columns.push(Column::new(
        "PC2",
        projection.pc2.iter().map(|&v| Value::Number(v)).collect(),
    ));
    for column in metadata.columns() {
        columns.push(column.clone());
    }

    Table::new(
        Some(Index::new(index.name().to_string(), index.labels().to_vec())),
        columns,
    )
}

/// Build the scatter specification for the renderer. Axis labels embed the
/// rounded variance percentages; only bound channels are carried.
pub fn build_plot_spec(mapping: &AestheticMapping, variance: VarianceExplained) -> PlotSpec {
    PlotSpec {
        x: "PC1".to_string(),
        y: "PC2".to_string(),
        x_label: format!("PC1 ({:.1}%)", variance.pc1),
        y_label: format!("PC2 ({:.1}%)", variance.pc2),
        title: PLOT_TITLE.to_string(),
        color: mapping.color_col.clone(),
        symbol: mapping.symbol_col.clone(),
        size: mapping.size_col.clone(),
    }
}

/// Serialize the joined coordinate/metadata table to CSV bytes.
///
/// Floats print in shortest round-trip form, so decoding the export and
/// re-parsing it reproduces the response coordinates exactly.
pub fn export_csv(joined: &Table) -> Result<Vec<u8>> {
    let index = joined.index().ok_or_else(|| {
        PcaVizError::SampleMismatch("export requires an identifier axis".to_string())
    })?;

    let mut writer = csv::Writer::from_writer(Vec::new());

    let mut header = Vec::with_capacity(joined.n_columns() + 1);
    header.push(index.name().to_string());
    header.extend(joined.columns().iter().map(|c| c.name().to_string()));
    writer.write_record(&header)?;

    for (row, label) in index.labels().iter().enumerate() {
        let mut record = Vec::with_capacity(joined.n_columns() + 1);
        record.push(label.clone());
        record.extend(joined.columns().iter().map(|c| c.values()[row].render()));
        writer.write_record(&record)?;
    }

    writer
        .into_inner()
        .map_err(|e| PcaVizError::Io(e.into_error()))
}

/// Render the plot and package images, export, mapping and counts into the
/// response payload.
pub fn assemble_response(
    joined: &Table,
    mapping: &AestheticMapping,
    variance: VarianceExplained,
    n_features: usize,
    renderer: &dyn Renderer,
) -> Result<PcaResponse> {
    let spec = build_plot_spec(mapping, variance);
    let plot = renderer.render(&spec, joined)?;
    let export = export_csv(joined)?;

    Ok(PcaResponse {
        png: general_purpose::STANDARD.encode(&plot.png),
        pdf: general_purpose::STANDARD.encode(&plot.pdf),
        pc_scores_csv: general_purpose::STANDARD.encode(&export),
        mappings: mapping.clone(),
        variance_explained: variance,
        n_samples: joined.n_rows(),
        n_features,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::resolve::resolve_sample_axis;

    fn projection() -> Projection {
        Projection {
            sample_ids: vec!["s1".to_string(), "s2".to_string()],
            pc1: vec![1.25, -1.25],
            pc2: vec![0.5, -0.5],
            variance_ratio: [0.372_49, 0.101_51],
        }
    }

    fn metadata() -> Table {
        resolve_sample_axis(
            Table::read(b"sample\tgroup\ns1\ta\ns2\tb\n").unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_variance_rounded_once() {
        let v = variance_percents(&projection());
        assert_eq!(v.pc1, 37.2);
        assert_eq!(v.pc2, 10.2);
    }

    #[test]
    fn test_axis_labels_embed_percentages() {
        let mapping = AestheticMapping {
            color_col: Some("group".to_string()),
            symbol_col: None,
            size_col: None,
        };
        let spec = build_plot_spec(&mapping, VarianceExplained { pc1: 37.2, pc2: 10.0 });
        assert_eq!(spec.x_label, "PC1 (37.2%)");
        assert_eq!(spec.y_label, "PC2 (10.0%)");
        assert_eq!(spec.title, PLOT_TITLE);
    }

    #[test]
    fn test_unbound_channels_absent_from_spec_json() {
        let mapping = AestheticMapping {
            color_col: Some("group".to_string()),
            symbol_col: None,
            size_col: None,
        };
        let spec = build_plot_spec(&mapping, VarianceExplained { pc1: 50.0, pc2: 25.0 });
        let json = serde_json::to_value(&spec).unwrap();
        assert_eq!(json["color"], "group");
        assert!(json.get("symbol").is_none());
        assert!(json.get("size").is_none());
    }

    #[test]
    fn test_join_keeps_order_and_columns() {
        let joined = join_scores(&projection(), &metadata()).unwrap();
        assert_eq!(joined.index_labels().unwrap(), &["s1", "s2"]);
        assert_eq!(joined.columns()[0].name(), "PC1");
        assert_eq!(joined.columns()[1].name(), "PC2");
        assert_eq!(joined.columns()[2].name(), "group");
        assert_eq!(joined.columns()[0].values()[0], Value::Number(1.25));
    }

    #[test]
    fn test_join_rejects_order_mismatch() {
        let meta = metadata()
            .select_rows(&["s2".to_string(), "s1".to_string()])
            .unwrap();
        assert!(join_scores(&projection(), &meta).is_err());
    }

    #[test]
    fn test_join_rejects_pc_name_collision() {
        let meta = resolve_sample_axis(
            Table::read(b"sample\tPC1\ns1\t9\ns2\t8\n").unwrap(),
        )
        .unwrap();
        assert!(matches!(
            join_scores(&projection(), &meta),
            Err(PcaVizError::DuplicateColumn(_))
        ));
    }

    #[test]
    fn test_export_round_trips() {
        let joined = join_scores(&projection(), &metadata()).unwrap();
        let bytes = export_csv(&joined).unwrap();
        let reparsed = Table::read(&bytes).unwrap();
        assert_eq!(
            reparsed.column("sample").unwrap().values()[0],
            Value::Text("s1".to_string())
        );
        assert_eq!(
            reparsed.column("PC1").unwrap().values()[0],
            Value::Number(1.25)
        );
        assert_eq!(
            reparsed.column("PC2").unwrap().values()[1],
            Value::Number(-0.5)
        );
    }
}
