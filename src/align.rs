//! Sample alignment between the expression table and the metadata axis.

use crate::data::table::{Column, Table, Value};
use crate::error::{PcaVizError, Result};
use nalgebra::DMatrix;

/// Expression counts restricted to samples present in the metadata
/// identifier axis, in that axis's order.
#[derive(Debug, Clone)]
pub struct AlignedMatrix {
    /// Dense counts, genes × samples.
    pub data: DMatrix<f64>,
    /// Feature identifiers (row labels).
    pub feature_ids: Vec<String>,
    /// Sample identifiers (column labels), metadata order.
    pub sample_ids: Vec<String>,
}

impl AlignedMatrix {
    /// Number of features (rows).
    pub fn n_features(&self) -> usize {
        self.data.nrows()
    }

    /// Number of samples (columns).
    pub fn n_samples(&self) -> usize {
        self.data.ncols()
    }
}

/// Intersect the expression table's sample columns with the metadata
/// identifier axis.
///
/// The metadata ordering is authoritative: samples come out in axis
/// order, never in the expression table's own column order. An empty
/// intersection is a caller-input error, as are non-numeric or missing
/// cells in a kept column.
pub fn align_samples(expression: &Table, sample_axis: &[String]) -> Result<AlignedMatrix> {
    let kept: Vec<(&String, &Column)> = sample_axis
        .iter()
        .filter_map(|id| expression.column(id).map(|col| (id, col)))
        .collect();
    if kept.is_empty() {
        return Err(PcaVizError::NoOverlap);
    }

    let n_features = expression.n_rows();
    let mut data = DMatrix::zeros(n_features, kept.len());
    for (j, (_, col)) in kept.iter().enumerate() {
        if !col.is_numeric() {
            return Err(PcaVizError::NonNumericColumn(col.name().to_string()));
        }
        for (i, value) in col.values().iter().enumerate() {
            match value {
                Value::Number(v) => data[(i, j)] = *v,
                _ => {
                    return Err(PcaVizError::MissingValue {
                        column: col.name().to_string(),
                        row: i,
                    })
                }
            }
        }
    }

    Ok(AlignedMatrix {
        data,
        feature_ids: expression.row_labels(),
        sample_ids: kept.iter().map(|(id, _)| (*id).clone()).collect(),
    })
}
