use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::config::{NormSpec, RawCfConfig};
use crate::input::me_region;
use crate::model::{Axis, EDGE_EPSILON, Hist1D, Hist2D, HistError, PairMap};
use crate::pipeline::AnalysisError;
use crate::pipeline::stage2_reweight::{CF_TITLE, KSTAR_TITLE};
use crate::pipeline::stage3_project::ProjectedSpectra;

/// Columns of the pairs-in-femto-region table. Regions outside this list
/// are not tabulated.
pub const FEMTO_REGION_LABELS: [&str; 5] = ["sgn", "sgn/Common", "sgn/NonCommon", "sbl", "sbr"];

#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationFunction {
    pub se: Hist1D,
    pub me: Hist1D,
    pub me_rew: Hist1D,
    pub weights: Hist1D,
    pub cf: Hist1D,
    pub cf_rew: Hist1D,
    pub norm: f64,
    pub norm_rew: f64,
    pub femto_pairs: f64,
    pub rebin: usize,
}

/// Integer rebinning factor turning `bin_width_gev` bins into `target_mev` bins.
pub fn rebin_factor(target_mev: f64, bin_width_gev: f64) -> Result<usize, HistError> {
    let factor = (target_mev / (bin_width_gev * 1000.0)).round();
    if !factor.is_finite() || factor < 1.0 {
        return Err(HistError::InvalidAxis(format!(
            "target bin width {target_mev} MeV is not reachable from {bin_width_gev} GeV bins"
        )));
    }
    Ok(factor as usize)
}

/// `norm * se / me`, with `norm` the mixed- to same-event yield ratio inside
/// `window`. An empty same-event window gives `norm = 0`.
pub fn correlation_function(
    se: &Hist1D,
    me: &Hist1D,
    window: (usize, usize),
) -> Result<(f64, Hist1D), HistError> {
    se.check_compatible(me)?;
    let (first, last) = window;
    let se_yield = se.integral_range(first, last);
    let norm = if se_yield > 0.0 {
        me.integral_range(first, last) / se_yield
    } else {
        0.0
    };
    let cf = se.scaled(norm).divided(me)?.with_title(CF_TITLE);
    Ok((norm, cf))
}

pub fn build_cf(
    se: &Hist1D,
    me: &Hist1D,
    me_rew: &Hist1D,
    weights: &Hist1D,
    binwidth_mev: f64,
    norm: &NormSpec,
    femto_region: [f64; 2],
) -> Result<CorrelationFunction, HistError> {
    let rebin = rebin_factor(binwidth_mev, se.bin_width(1))?;
    let se = se.rebinned(rebin)?.renamed("hSE").with_title(KSTAR_TITLE);
    let me = me.rebinned(rebin)?.renamed("hME").with_title(KSTAR_TITLE);
    let me_rew = me_rew.rebinned(rebin)?.renamed("hMErew").with_title(KSTAR_TITLE);
    se.check_compatible(&me)?;
    se.check_compatible(&me_rew)?;

    let (first_femto, last_femto) =
        se.axis
            .bin_range_inclusive(femto_region[0], femto_region[1], EDGE_EPSILON);
    let femto_pairs = se.integral_range(first_femto, last_femto);

    let window = norm.bin_window(&se.axis);
    let (norm_value, cf) = correlation_function(&se, &me, window)?;
    let (norm_rew, cf_rew) = correlation_function(&se, &me_rew, window)?;

    Ok(CorrelationFunction {
        weights: weights
            .clone()
            .renamed("hWeightsRew")
            .with_title(";Mult bin;Weight"),
        cf: cf.renamed("hCF"),
        cf_rew: cf_rew.renamed("hCFrew"),
        se,
        me,
        me_rew,
        norm: norm_value,
        norm_rew,
        femto_pairs,
        rebin,
    })
}

#[derive(Debug)]
pub struct Stage5Output {
    pub cfs: PairMap<CorrelationFunction>,
    pub femto_pairs: Hist2D,
}

fn lookup<'a>(
    map: &'a PairMap<Hist1D>,
    what: &'static str,
    pair: &str,
    region: &str,
) -> Result<&'a Hist1D, AnalysisError> {
    map.get(pair)
        .and_then(|r| r.get(region))
        .ok_or_else(|| AnalysisError::MissingSpectrum {
            what,
            pair: pair.to_string(),
            region: region.to_string(),
        })
}

pub fn run_stage5(
    spectra: &ProjectedSpectra,
    config: &RawCfConfig,
) -> Result<Stage5Output, AnalysisError> {
    let pair_order = config.pair_order();
    let pair_labels: Vec<&str> = pair_order.iter().map(String::as_str).collect();
    let mut femto_pairs = Hist2D::new(
        "hFemtoPairs",
        Axis::labeled(&FEMTO_REGION_LABELS)?,
        Axis::labeled(&pair_labels)?,
    )
    .with_title("Pairs in femto region");

    let mut cfs = PairMap::new();
    for (i_pair, pair) in pair_order.iter().enumerate() {
        let se_regions = spectra
            .se
            .get(pair)
            .ok_or_else(|| AnalysisError::MissingSpectrum {
                what: "same-event",
                pair: pair.clone(),
                region: "*".to_string(),
            })?;

        let mut per_region = BTreeMap::new();
        for (region, se) in se_regions {
            let region_me = me_region(region);
            let me = lookup(&spectra.me, "mixed-event", pair, &region_me)?;
            let me_rew = lookup(&spectra.me_rew, "reweighted mixed-event", pair, region)?;
            let weights = lookup(&spectra.weights, "weight", pair, region)?;

            let cf = build_cf(
                se,
                me,
                me_rew,
                weights,
                config.binwidth_mev,
                &config.norm,
                config.femto_region,
            )?;
            info!(
                "CF {} {}: rebin={}, norm={:.6}, norm_rew={:.6}, femto pairs={}",
                pair, region, cf.rebin, cf.norm, cf.norm_rew, cf.femto_pairs
            );

            match femto_pairs.x.find_label(region) {
                Some(region_bin) => femto_pairs.set_content(region_bin, i_pair + 1, cf.femto_pairs),
                None => debug!("region {} has no column in the femto-pairs table", region),
            }
            per_region.insert(region.clone(), cf);
        }
        cfs.insert(pair.clone(), per_region);
    }

    femto_pairs.entries = femto_pairs.contents.iter().sum();
    Ok(Stage5Output { cfs, femto_pairs })
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage5_cf.rs"]
mod tests;
