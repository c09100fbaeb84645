use std::collections::BTreeMap;

use tracing::info;

use crate::input::InputError;
use crate::input::container::Container;
use crate::model::{Hist2D, PairMap};

pub const ANCESTORS: [&str; 2] = ["Common", "NonCommon"];

/// Same- and mixed-event k*-vs-multiplicity spectra, per pair and region.
#[derive(Debug, Clone, Default)]
pub struct MultVsKstar {
    pub se: PairMap<Hist2D>,
    pub me: PairMap<Hist2D>,
}

/// `p02` -> `Particle0_Particle2`.
pub fn detector_pair_name(pair: &str) -> Result<String, InputError> {
    let mut chars = pair.chars();
    match (chars.next(), chars.next(), chars.next(), chars.next()) {
        (Some('p'), Some(a), Some(b), None) if a.is_ascii_digit() && b.is_ascii_digit() => {
            Ok(format!("Particle{a}_Particle{b}"))
        }
        _ => Err(InputError::Unsupported(format!(
            "pair label {pair} does not follow the pXY convention"
        ))),
    }
}

pub fn results_dir(run_suffix: &str) -> String {
    format!("HMResults{run_suffix}")
}

pub fn pair_folder(run_suffix: &str, detector_pair: &str) -> String {
    let results = results_dir(run_suffix);
    format!("{results}/{results}/{detector_pair}")
}

/// Loads the inclusive and mT-differential k*-vs-multiplicity spectra, plus
/// the same-event ancestor splits when the task stored them.
pub fn load_mult_vs_kstar(
    container: &Container,
    run_suffix: &str,
    pairs: &[String],
    regions: &[String],
) -> Result<MultVsKstar, InputError> {
    if !container
        .root
        .key_names()
        .contains(&results_dir(run_suffix).as_str())
    {
        return Err(InputError::Unsupported(format!(
            "{} has no {} directory; only femto-dream task output is supported",
            container.name,
            results_dir(run_suffix)
        )));
    }
    if regions.len() != 1 || regions[0] != "sgn" {
        return Err(InputError::Unsupported(format!(
            "only the signal region is implemented, got {regions:?}"
        )));
    }

    let mut out = MultVsKstar::default();
    for pair in pairs {
        let fd_pair = detector_pair_name(pair)?;
        let folder = pair_folder(run_suffix, &fd_pair);
        let mut se = BTreeMap::new();
        let mut me = BTreeMap::new();

        for region in regions {
            info!("loading {} {}", pair, region);
            se.insert(
                region.clone(),
                container
                    .load_th2(&format!("{folder}/SEMultDist_{fd_pair}"))?
                    .clone(),
            );
            me.insert(
                region.clone(),
                container
                    .load_th2(&format!("{folder}/MEMultDist_{fd_pair}"))?
                    .clone(),
            );

            let mut i_mt = 0usize;
            loop {
                let se_path = format!("{folder}/SEmTMult_{i_mt}_{fd_pair}");
                let me_path = format!("{folder}/MEmTMult_{i_mt}_{fd_pair}");
                if !container.contains(&se_path) || !container.contains(&me_path) {
                    break;
                }
                info!("loading mT bin {}", i_mt);
                se.insert(
                    format!("{region}/mT{i_mt}"),
                    container.load_th2(&se_path)?.clone(),
                );
                me.insert(
                    format!("{region}/mT{i_mt}"),
                    container.load_th2(&me_path)?.clone(),
                );
                i_mt += 1;
            }

            load_ancestors(container, &folder, &fd_pair, region, &mut se)?;
        }

        out.se.insert(pair.clone(), se);
        out.me.insert(pair.clone(), me);
    }
    Ok(out)
}

fn load_ancestors(
    container: &Container,
    folder: &str,
    fd_pair: &str,
    region: &str,
    se: &mut BTreeMap<String, Hist2D>,
) -> Result<(), InputError> {
    let inclusive: Vec<String> = ANCESTORS
        .iter()
        .map(|a| format!("{folder}/SEMultDist{a}_{fd_pair}"))
        .collect();
    if !inclusive.iter().all(|p| container.contains(p)) {
        info!("ancestors were not found for {}", fd_pair);
        return Ok(());
    }
    for (ancestor, path) in ANCESTORS.iter().zip(&inclusive) {
        info!("loading {} ancestor", ancestor);
        se.insert(
            format!("{region}/{ancestor}"),
            container.load_th2(path)?.clone(),
        );
    }

    let mut i_mt = 0usize;
    loop {
        let paths: Vec<String> = ANCESTORS
            .iter()
            .map(|a| format!("{folder}/SEmTMult{a}_{i_mt}_{fd_pair}"))
            .collect();
        if !paths.iter().all(|p| container.contains(p)) {
            break;
        }
        info!("loading ancestors for mT bin {}", i_mt);
        for (ancestor, path) in ANCESTORS.iter().zip(&paths) {
            se.insert(
                format!("{region}/mT{i_mt}/{ancestor}"),
                container.load_th2(path)?.clone(),
            );
        }
        i_mt += 1;
    }
    Ok(())
}

/// Mixed-event region matching a same-event region: ancestor splits share
/// the inclusive mixed-event spectrum.
pub fn me_region(region: &str) -> String {
    region.replace("/Common", "").replace("/NonCommon", "")
}

#[cfg(test)]
#[path = "../../tests/src_inline/input/femtodream.rs"]
mod tests;
