use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::config::RawCfConfig;
use crate::pipeline::stage2_reweight::Stage2Output;
use crate::pipeline::stage5_cf::Stage5Output;

pub mod json;
pub mod text;

#[derive(Debug, Clone, Serialize)]
pub struct ToolMeta {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PairSummary {
    pub pair: String,
    pub region: String,
    pub rebin: usize,
    pub norm: f64,
    pub norm_rew: f64,
    pub femto_pairs: f64,
    /// Absent for combined pairs, which are never reweighted themselves.
    pub mult_slices: Option<usize>,
    pub filled_slices: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SummaryData {
    pub tool: ToolMeta,
    pub input: String,
    pub output: String,
    pub normalization: String,
    pub binwidth_mev: f64,
    pub region_policy: String,
    pub femto_region: [f64; 2],
    pub pairs: Vec<PairSummary>,
}

pub fn format_f64_6(v: f64) -> String {
    format!("{:.6}", v)
}

pub fn build_summary(
    config: &RawCfConfig,
    stage2: &Stage2Output,
    stage5: &Stage5Output,
    output: &Path,
) -> SummaryData {
    let mut pairs = Vec::new();
    for pair in config.pair_order() {
        let Some(regions) = stage5.cfs.get(&pair) else {
            continue;
        };
        for (region, cf) in regions {
            let slices = stage2
                .reweighted
                .get(&pair)
                .and_then(|r| r.get(region))
                .map(|r| &r.slices);
            pairs.push(PairSummary {
                pair: pair.clone(),
                region: region.clone(),
                rebin: cf.rebin,
                norm: cf.norm,
                norm_rew: cf.norm_rew,
                femto_pairs: cf.femto_pairs,
                mult_slices: slices.map(|s| s.len()),
                filled_slices: slices.map(|s| s.n_filled()),
            });
        }
    }

    SummaryData {
        tool: ToolMeta {
            name: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
        input: config.infile.display().to_string(),
        output: output.display().to_string(),
        normalization: config.norm.to_string(),
        binwidth_mev: config.binwidth_mev,
        region_policy: format!("{:?}", config.region_policy),
        femto_region: config.femto_region,
        pairs,
    }
}

/// Writes `summary.json` and `report.txt` into `out_dir`.
pub fn write_reports(summary: &SummaryData, out_dir: &Path, base_name: &str) -> std::io::Result<()> {
    fs::create_dir_all(out_dir)?;
    let json = json::render_summary_json(summary)?;
    fs::write(out_dir.join(format!("{base_name}_summary.json")), json)?;
    let report = text::render_report_text(summary);
    fs::write(out_dir.join(format!("{base_name}_report.txt")), report)?;
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/src_inline/report/mod.rs"]
mod tests;
