use tracing::info;

use crate::config::RawCfConfig;
use crate::input::{Container, MultVsKstar, load_mult_vs_kstar};
use crate::pipeline::AnalysisError;

#[derive(Debug)]
pub struct Stage1Output {
    pub distributions: MultVsKstar,
}

pub fn run_stage1(container: &Container, config: &RawCfConfig) -> Result<Stage1Output, AnalysisError> {
    info!("loading mult vs k* histograms");
    let distributions = load_mult_vs_kstar(
        container,
        &config.run_suffix,
        &config.pairs,
        &config.regions,
    )?;
    let n_regions: usize = distributions.se.values().map(|r| r.len()).sum();
    info!(
        "loaded {} pairs, {} same-event regions",
        distributions.se.len(),
        n_regions
    );
    Ok(Stage1Output { distributions })
}
