use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::config::NormSpec;
use crate::input::me_region;
use crate::model::{Axis, Hist1D, Hist2D, HistError, PairMap};
use crate::pipeline::AnalysisError;
use crate::pipeline::stage1_load::Stage1Output;

pub const KSTAR_TITLE: &str = ";#it{k}* (GeV/#it{c});Counts";
pub const CF_TITLE: &str = ";#it{k}* (GeV/#it{c});#it{C}(#it{k}*)";

/// Per-multiplicity-bin slices. The three lists are index-aligned.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MultSlices {
    pub se: Vec<Hist1D>,
    pub me: Vec<Hist1D>,
    pub cf: Vec<Hist1D>,
}

impl MultSlices {
    pub fn len(&self) -> usize {
        self.cf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cf.is_empty()
    }

    /// Slices that produced a correlation function (non-placeholder).
    pub fn n_filled(&self) -> usize {
        self.cf
            .iter()
            .filter(|h| h.contents.iter().any(|c| *c != 0.0))
            .count()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Hist1D, &Hist1D, &Hist1D)> {
        self.se
            .iter()
            .zip(&self.me)
            .zip(&self.cf)
            .map(|((se, me), cf)| (se, me, cf))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReweightResult {
    pub me_rew: Hist1D,
    pub weights: Hist1D,
    pub slices: MultSlices,
}

/// Rebuilds the mixed-event k* spectrum with the same-event multiplicity
/// composition. `mult_range` is a half-open `[first, last)` range of
/// multiplicity bins; the default covers underflow, all bins and overflow.
pub fn reweight(
    se: &Hist2D,
    me: &Hist2D,
    norm: &NormSpec,
    mult_range: Option<(usize, usize)>,
    name: Option<&str>,
) -> Result<ReweightResult, HistError> {
    if !se.x.same_binning(&me.x) || se.ny() != me.ny() {
        return Err(HistError::BinningMismatch {
            left: se.name.clone(),
            right: me.name.clone(),
        });
    }
    let suffix = name.map(|n| format!("_{n}")).unwrap_or_default();

    let mut me_rew =
        Hist1D::new(format!("hMERew{suffix}"), me.x.clone()).with_title(KSTAR_TITLE);

    let n_mult = me.ny() + 2;
    let weights_axis = Axis::uniform(n_mult, me.y.min(), me.y.max())?;
    let mut weights = Hist1D::new(format!("hWeights{suffix}"), weights_axis)
        .with_title(";Mult bin (a.u.); Weight");

    let (first, last) = mult_range.unwrap_or((0, n_mult));
    if first > last || last > n_mult {
        return Err(HistError::InvalidRange {
            first,
            last,
            n_bins: me.ny(),
        });
    }

    let mut slices = MultSlices::default();
    for i_bin in first..last {
        let se_slice = se.projection_x(format!("hSEdistr_{i_bin}"), i_bin, i_bin);
        let me_slice = me.projection_x(format!("hMEdistr_{i_bin}"), i_bin, i_bin);

        let (first_norm, last_norm) = norm.bin_window(&se_slice.axis);
        let se_window = se_slice.integral_range(first_norm, last_norm);
        let me_total = me_slice.integral();

        let cf = if se_window > 0.0 && me_total > 0.0 {
            let weight = se_slice.integral() / me_total;
            me_rew.add_scaled(&me_slice, weight)?;
            weights.set_content(i_bin, weight);

            let norm_factor = me_slice.integral_range(first_norm, last_norm) / se_window;
            se_slice
                .scaled(norm_factor)
                .divided(&me_slice)?
                .renamed(format!("hCF_multbin{i_bin}"))
                .with_title(CF_TITLE)
        } else {
            debug!("multiplicity bin {} has no statistics; empty placeholder", i_bin);
            se_slice.zeroed_clone(format!("hCF_multbin{i_bin}"))
        };

        slices.se.push(se_slice);
        slices.me.push(me_slice);
        slices.cf.push(cf);
    }

    Ok(ReweightResult {
        me_rew,
        weights,
        slices,
    })
}

#[derive(Debug)]
pub struct Stage2Output {
    pub reweighted: PairMap<ReweightResult>,
}

/// Reweights every same-event region against its mixed-event counterpart.
pub fn run_stage2(stage1: &Stage1Output, norm: &NormSpec) -> Result<Stage2Output, AnalysisError> {
    info!("computing mult-reweighted ME");
    let mut reweighted = BTreeMap::new();
    for (pair, regions) in &stage1.distributions.se {
        let mut per_region = BTreeMap::new();
        for (region, se) in regions {
            let region_me = me_region(region);
            let me = stage1
                .distributions
                .me
                .get(pair)
                .and_then(|r| r.get(&region_me))
                .ok_or_else(|| AnalysisError::MissingSpectrum {
                    what: "mixed-event",
                    pair: pair.clone(),
                    region: region_me.clone(),
                })?;
            info!("reweight {} {}", pair, region);
            let result = reweight(se, me, norm, None, Some(&format!("{pair}_{region}")))?;
            debug!(
                "{} {}: {} multiplicity slices, {} filled",
                pair,
                region,
                result.slices.len(),
                result.slices.n_filled()
            );
            per_region.insert(region.clone(), result);
        }
        reweighted.insert(pair.clone(), per_region);
    }
    Ok(Stage2Output { reweighted })
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage2_reweight.rs"]
mod tests;
