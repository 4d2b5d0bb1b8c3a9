//! 2-component principal component projection.

use crate::error::{PcaVizError, Result};
use crate::normalize::NormalizedMatrix;

/// Number of components produced; the pipeline is fixed at two.
pub const N_COMPONENTS: usize = 2;

/// PC scores and variance-explained ratios for the retained samples.
#[derive(Debug, Clone)]
pub struct Projection {
    /// Sample identifiers, same order as the normalized matrix rows.
    pub sample_ids: Vec<String>,
    /// First component score per sample.
    pub pc1: Vec<f64>,
    /// Second component score per sample.
    pub pc2: Vec<f64>,
    /// Fraction of total variance captured per component, full precision.
    /// Rounding for display happens at response assembly.
    pub variance_ratio: [f64; 2],
}

/// Fit a 2-component PCA over the normalized samples × genes matrix.
///
/// The data is centered per feature and decomposed with a thin SVD; the
/// scores are U·Σ truncated to the first two components. Fewer than two
/// samples or features, or a matrix with no variance at all, is a
/// caller-input error.
pub fn project(normalized: &NormalizedMatrix) -> Result<Projection> {
    let n_samples = normalized.n_samples();
    let n_features = normalized.n_features();
    if n_samples < N_COMPONENTS {
        return Err(PcaVizError::DegenerateInput(format!(
            "{} sample(s) after normalization, need at least {}",
            n_samples, N_COMPONENTS
        )));
    }
    if n_features < N_COMPONENTS {
        return Err(PcaVizError::DegenerateInput(format!(
            "{} feature(s) after normalization, need at least {}",
            n_features, N_COMPONENTS
        )));
    }

    // Center each feature column.
    let mut centered = normalized.data.clone();
    for mut column in centered.column_iter_mut() {
        let mean = column.mean();
        column.add_scalar_mut(-mean);
    }

    let svd = centered
        .try_svd(true, false, f64::EPSILON, 0)
        .ok_or_else(|| PcaVizError::Numerical("SVD did not converge".to_string()))?;
    let u = svd
        .u
        .ok_or_else(|| PcaVizError::Numerical("SVD did not produce U".to_string()))?;
    let sigma = svd.singular_values;

    let total: f64 = sigma.iter().map(|s| s * s).sum();
    if total <= 0.0 {
        return Err(PcaVizError::DegenerateInput(
            "expression matrix has no variance across samples".to_string(),
        ));
    }

    // Singular values are sorted descending, so columns 0 and 1 of U are
    // the top two components.
    let mut pc1: Vec<f64> = (0..n_samples).map(|i| u[(i, 0)] * sigma[0]).collect();
    let mut pc2: Vec<f64> = (0..n_samples).map(|i| u[(i, 1)] * sigma[1]).collect();
    fix_sign(&mut pc1);
    fix_sign(&mut pc2);

    Ok(Projection {
        sample_ids: normalized.sample_ids.clone(),
        pc1,
        pc2,
        variance_ratio: [
            sigma[0] * sigma[0] / total,
            sigma[1] * sigma[1] / total,
        ],
    })
}

/// Make the component sign deterministic: the coordinate with the largest
/// magnitude comes out non-negative. SVD signs are otherwise arbitrary and
/// would break run-to-run reproducibility.
fn fix_sign(scores: &mut [f64]) {
    let mut best = 0usize;
    let mut best_abs = f64::NEG_INFINITY;
    for (i, &v) in scores.iter().enumerate() {
        if v.abs() > best_abs {
            best_abs = v.abs();
            best = i;
        }
    }
    if scores.get(best).copied().unwrap_or(0.0) < 0.0 {
        for v in scores.iter_mut() {
            *v = -*v;
        }
    }
}
