//! Counts-per-million and log2 normalization of the aligned matrix.
//!
//! Each sample column is scaled by its own library size, multiplied up to
//! counts-per-million, then passed through log2(x + 0.5). The result is
//! transposed to sample-major order, which is what the projection engine
//! expects (rows = observations).

use crate::align::AlignedMatrix;
use crate::error::{PcaVizError, Result};
use nalgebra::DMatrix;
use rayon::prelude::*;

/// Scale factor for counts-per-million.
pub const CPM_SCALE: f64 = 1_000_000.0;

/// Fixed pseudocount inside the log2 transform; keeps zero counts finite.
/// Not configurable.
pub const LOG_PSEUDOCOUNT: f64 = 0.5;

/// Normalized expression, samples × genes.
#[derive(Debug, Clone)]
pub struct NormalizedMatrix {
    /// log2(CPM + 0.5) values; rows are samples, columns are genes.
    pub data: DMatrix<f64>,
    /// Retained sample identifiers (row labels).
    pub sample_ids: Vec<String>,
    /// Feature identifiers (column labels).
    pub feature_ids: Vec<String>,
}

impl NormalizedMatrix {
    /// Number of retained samples (rows).
    pub fn n_samples(&self) -> usize {
        self.data.nrows()
    }

    /// Number of features (columns).
    pub fn n_features(&self) -> usize {
        self.data.ncols()
    }

    /// Normalized value for a sample and feature.
    pub fn get(&self, sample: usize, feature: usize) -> f64 {
        self.data[(sample, feature)]
    }
}

/// Apply counts-per-million scaling and the log2 transform.
///
/// Samples whose total count is zero are dropped before scaling; dropping
/// every sample is a caller-input error, detected here rather than as a
/// divide-by-zero downstream.
pub fn normalize_log_cpm(aligned: &AlignedMatrix) -> Result<NormalizedMatrix> {
    let n_features = aligned.n_features();

    let retained: Vec<usize> = (0..aligned.n_samples())
        .filter(|&j| aligned.data.column(j).sum() > 0.0)
        .collect();
    if retained.is_empty() {
        return Err(PcaVizError::AllZeroSamples);
    }

    let rows: Vec<Vec<f64>> = retained
        .par_iter()
        .map(|&j| {
            let column = aligned.data.column(j);
            let library_size: f64 = column.sum();
            column
                .iter()
                .map(|&v| (v / library_size * CPM_SCALE + LOG_PSEUDOCOUNT).log2())
                .collect()
        })
        .collect();

    let mut data = DMatrix::zeros(retained.len(), n_features);
    for (i, row) in rows.iter().enumerate() {
        for (k, &v) in row.iter().enumerate() {
            data[(i, k)] = v;
        }
    }

    Ok(NormalizedMatrix {
        data,
        sample_ids: retained
            .iter()
            .map(|&j| aligned.sample_ids[j].clone())
            .collect(),
        feature_ids: aligned.feature_ids.clone(),
    })
}
