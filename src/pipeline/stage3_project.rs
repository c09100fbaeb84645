use std::collections::BTreeMap;

use tracing::info;

use crate::model::{Hist1D, Hist2D, PairMap};
use crate::pipeline::stage1_load::Stage1Output;
use crate::pipeline::stage2_reweight::{KSTAR_TITLE, Stage2Output};

/// Multiplicity-integrated k* spectra plus the reweighting products,
/// all keyed by pair and region.
#[derive(Debug, Clone, Default)]
pub struct ProjectedSpectra {
    pub se: PairMap<Hist1D>,
    pub me: PairMap<Hist1D>,
    pub me_rew: PairMap<Hist1D>,
    pub weights: PairMap<Hist1D>,
}

/// Integrates each 2D spectrum over all in-range multiplicity bins.
pub fn project_distributions(distr: &PairMap<Hist2D>, label: &str) -> PairMap<Hist1D> {
    distr
        .iter()
        .map(|(pair, regions)| {
            let projected = regions
                .iter()
                .map(|(region, h)| {
                    let name = format!("{pair}{label}distr");
                    (
                        region.clone(),
                        h.projection_x_all(name).with_title(KSTAR_TITLE),
                    )
                })
                .collect::<BTreeMap<_, _>>();
            (pair.clone(), projected)
        })
        .collect()
}

pub fn run_stage3(stage1: &Stage1Output, stage2: &Stage2Output) -> ProjectedSpectra {
    info!("projecting 2D histograms");
    let mut me_rew = PairMap::new();
    let mut weights = PairMap::new();
    for (pair, regions) in &stage2.reweighted {
        let rew = me_rew.entry(pair.clone()).or_insert_with(BTreeMap::new);
        let wgt = weights.entry(pair.clone()).or_insert_with(BTreeMap::new);
        for (region, result) in regions {
            rew.insert(region.clone(), result.me_rew.clone());
            wgt.insert(region.clone(), result.weights.clone());
        }
    }
    ProjectedSpectra {
        se: project_distributions(&stage1.distributions.se, "SE"),
        me: project_distributions(&stage1.distributions.me, "ME"),
        me_rew,
        weights,
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage3_project.rs"]
mod tests;
