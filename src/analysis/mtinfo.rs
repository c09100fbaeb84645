use serde::Serialize;
use tracing::info;

use crate::config::ConfigError;
use crate::input::Container;
use crate::input::femtodream::{detector_pair_name, pair_folder};
use crate::model::{EDGE_EPSILON, Hist1D};
use crate::pipeline::AnalysisError;

/// Run suffix of the task output holding the mT-vs-k* spectra.
pub const MT_RUN_SUFFIX: &str = "3001";
/// Upper k* edge of the femto region, GeV/c.
pub const KSTAR_MAX: f64 = 0.2;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MtBinMean {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairMtInfo {
    pub pair: String,
    pub integrated: f64,
    pub bins: Vec<MtBinMean>,
}

/// Mixed-event mT distribution of the pairs with k* below `kstar_max`.
pub fn mt_distribution(
    container: &Container,
    run_suffix: &str,
    pair: &str,
    kstar_max: f64,
) -> Result<Hist1D, AnalysisError> {
    let fd_pair = detector_pair_name(pair)?;
    let path = format!("{}/MEmTDist_{fd_pair}", pair_folder(run_suffix, &fd_pair));
    let h = container.load_th2(&path)?;
    let last = h.x.find_bin(kstar_max * (1.0 - EDGE_EPSILON));
    Ok(h.projection_y(format!("hMt_{pair}"), 1, last))
}

pub fn mean_per_bin(h: &Hist1D, limits: &[f64]) -> Vec<MtBinMean> {
    limits
        .windows(2)
        .map(|w| {
            let (first, last) = h.axis.bin_range_inclusive(w[0], w[1], EDGE_EPSILON);
            MtBinMean {
                min: w[0],
                max: w[1],
                mean: h.mean_range(first, last),
            }
        })
        .collect()
}

pub fn compute_mt_info(
    container: &Container,
    run_suffix: &str,
    pairs: &[String],
    limits: &[f64],
    kstar_max: f64,
) -> Result<Vec<PairMtInfo>, AnalysisError> {
    if limits.windows(2).any(|w| !(w[0] < w[1])) {
        return Err(ConfigError::Invalid(format!(
            "mT bin limits must increase, got {limits:?}"
        ))
        .into());
    }
    pairs
        .iter()
        .map(|pair| {
            let h = mt_distribution(container, run_suffix, pair, kstar_max)?;
            Ok(PairMtInfo {
                pair: pair.clone(),
                integrated: h.mean(),
                bins: mean_per_bin(&h, limits),
            })
        })
        .collect()
}

pub fn log_mt_info(infos: &[PairMtInfo], kstar_max: f64) {
    for p in infos {
        info!("average mT for pair {} for k* < {} MeV/c:", p.pair, kstar_max * 1000.0);
        info!("  mT (integrated): {:.3} GeV", p.integrated);
        for b in &p.bins {
            info!("  mT in [{:.3}, {:.3}]: {:.3} GeV", b.min, b.max, b.mean);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/analysis/mtinfo.rs"]
mod tests;
