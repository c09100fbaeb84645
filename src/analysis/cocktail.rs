use std::path::PathBuf;

use itertools::Itertools;
use serde::Deserialize;
use tracing::{debug, info};

use crate::config::ConfigError;
use crate::input::{Container, Object};
use crate::model::Hist1D;
use crate::pipeline::AnalysisError;

#[derive(Debug, Clone, Deserialize)]
pub struct CocktailConfig {
    pub ofile: PathBuf,
    pub cocktail: Vec<CocktailEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CocktailEntry {
    pub infile: PathBuf,
    pub name: String,
    /// One list per decay channel: `[value]`, `[value, unc]` or
    /// `[value, unc_low, unc_high]`, in percent.
    #[serde(default)]
    pub bratio: Vec<Vec<f64>>,
}

/// Central value followed by its lower and upper variations.
pub fn apply_uncertainty(values: &[f64]) -> Result<Vec<f64>, ConfigError> {
    match *values {
        [v] => Ok(vec![v]),
        [v, u] => Ok(vec![v, v - u.abs(), v + u.abs()]),
        [v, lo, hi] => Ok(vec![v, v - lo.abs(), v + hi.abs()]),
        _ => Err(ConfigError::Invalid(format!(
            "branching ratio needs 1 to 3 values, got {values:?}"
        ))),
    }
}

/// Total branching ratios of one template: every combination of channel
/// variations, multiplied together. Percent inputs become fractions.
pub fn branching_variations(channels: &[Vec<f64>]) -> Result<Vec<f64>, ConfigError> {
    if channels.is_empty() {
        return Ok(vec![1.0]);
    }
    let expanded = channels
        .iter()
        .map(|chn| {
            let fractions: Vec<f64> = chn.iter().map(|v| v / 100.0).collect();
            apply_uncertainty(&fractions)
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(expanded
        .into_iter()
        .multi_cartesian_product()
        .map(|combo| combo.iter().product())
        .collect())
}

/// `hCocktail{i}` for every combination of per-template branching ratios.
pub fn build_cocktails(
    templates: &[Hist1D],
    variations: &[Vec<f64>],
) -> Result<Vec<Hist1D>, AnalysisError> {
    let Some(first) = templates.first() else {
        return Err(AnalysisError::Degenerate("empty cocktail".to_string()));
    };
    if templates.len() != variations.len() {
        return Err(AnalysisError::Degenerate(format!(
            "{} templates but {} branching ratio sets",
            templates.len(),
            variations.len()
        )));
    }

    let mut out = Vec::new();
    for (i, brs) in variations
        .iter()
        .cloned()
        .multi_cartesian_product()
        .enumerate()
    {
        debug!("making cocktail with BRs: {:?}", brs);
        let mut cocktail = first.zeroed_clone(format!("hCocktail{i}"));
        for (template, br) in templates.iter().zip(&brs) {
            cocktail.add_scaled(template, *br)?;
        }
        out.push(cocktail);
    }
    Ok(out)
}

pub fn run_cocktail(config: &CocktailConfig) -> Result<Vec<Hist1D>, AnalysisError> {
    let mut templates = Vec::with_capacity(config.cocktail.len());
    let mut variations = Vec::with_capacity(config.cocktail.len());
    for entry in &config.cocktail {
        let file = Container::open(&entry.infile)?;
        templates.push(file.load_th1(&entry.name)?.clone());
        variations.push(branching_variations(&entry.bratio)?);
    }

    let cocktails = build_cocktails(&templates, &variations)?;
    info!("built {} cocktail variations", cocktails.len());

    let mut out = Container::new(config.ofile.display().to_string());
    for h in &cocktails {
        out.insert(&h.name, Object::Th1(h.clone()))?;
    }
    out.save(&config.ofile)?;
    info!("output saved in {}", config.ofile.display());
    Ok(cocktails)
}

#[cfg(test)]
#[path = "../../tests/src_inline/analysis/cocktail.rs"]
mod tests;
