use std::collections::{BTreeMap, BTreeSet};

use tracing::info;

use crate::config::{CombineRecipe, ConfigError, RegionPolicy};
use crate::model::{Hist1D, PairMap};
use crate::pipeline::AnalysisError;
use crate::pipeline::stage3_project::ProjectedSpectra;

/// Adds one entry per recipe target holding the bin-wise sum of its two
/// sources. Source entries are left untouched.
pub fn combine(
    distr: &PairMap<Hist1D>,
    recipes: &[CombineRecipe],
    policy: RegionPolicy,
) -> Result<PairMap<Hist1D>, AnalysisError> {
    let mut out = distr.clone();
    for recipe in recipes {
        let first = source(distr, recipe, &recipe.first)?;
        let second = source(distr, recipe, &recipe.second)?;

        let regions: BTreeSet<&String> = match policy {
            RegionPolicy::FirstSource => first.keys().collect(),
            RegionPolicy::Union => first.keys().chain(second.keys()).collect(),
        };

        let mut combined = BTreeMap::new();
        for region in regions {
            let summed = match (first.get(region), second.get(region)) {
                (Some(a), Some(b)) => a.sum(b)?,
                (Some(only), None) | (None, Some(only)) if policy == RegionPolicy::Union => {
                    only.clone()
                }
                _ => {
                    return Err(AnalysisError::MissingSpectrum {
                        what: "combination source",
                        pair: recipe.second.clone(),
                        region: region.clone(),
                    });
                }
            };
            combined.insert(region.clone(), summed);
        }
        out.insert(recipe.target.clone(), combined);
    }
    Ok(out)
}

fn source<'a>(
    distr: &'a PairMap<Hist1D>,
    recipe: &CombineRecipe,
    label: &str,
) -> Result<&'a BTreeMap<String, Hist1D>, AnalysisError> {
    distr.get(label).ok_or_else(|| {
        AnalysisError::Config(ConfigError::UnknownPair {
            target: recipe.target.clone(),
            source_pair: label.to_string(),
        })
    })
}

/// Sums pair and antipair for every spectrum family.
pub fn run_stage4(
    projected: &ProjectedSpectra,
    recipes: &[CombineRecipe],
    policy: RegionPolicy,
) -> Result<ProjectedSpectra, AnalysisError> {
    for recipe in recipes {
        info!(
            "combining {} + {} -> {}",
            recipe.first, recipe.second, recipe.target
        );
    }
    Ok(ProjectedSpectra {
        se: combine(&projected.se, recipes, policy)?,
        me: combine(&projected.me, recipes, policy)?,
        me_rew: combine(&projected.me_rew, recipes, policy)?,
        weights: combine(&projected.weights, recipes, policy)?,
    })
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage4_combine.rs"]
mod tests;
