use serde::Serialize;
use tracing::info;

use crate::input::Container;
use crate::model::{Function, Hist1D};
use crate::pipeline::AnalysisError;

/// Average of `f` over the in-range bins of `h`, weighted by the bin contents.
pub fn weighted_average(f: &Function, h: &Hist1D) -> f64 {
    let mut num = 0.0;
    let mut den = 0.0;
    for bin in 1..=h.n_bins() {
        let w = h.content(bin);
        num += f.eval(h.bin_center(bin)) * w;
        den += w;
    }
    if den == 0.0 { 0.0 } else { num / den }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairAcceptance {
    pub pair: String,
    pub n_reco: f64,
    pub acceptance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AcceptanceReport {
    pub n_events: f64,
    pub eff0: f64,
    pub eff1: f64,
    pub eff_product: f64,
    pub pairs: Vec<PairAcceptance>,
}

/// Efficiency-folded single-particle spectra and per-pair geometric acceptance
/// of a generator-level distribution file.
pub fn compute_acceptance(
    container: &Container,
    eff: &Function,
) -> Result<AcceptanceReport, AnalysisError> {
    let n_events = container.load_th1("hEvt")?.entries;
    info!("number of events: {}", n_events);

    let eff0 = weighted_average(eff, container.load_th1("qa0/hPt0")?);
    let eff1 = weighted_average(eff, container.load_th1("qa1/hPt1")?);

    let mut pairs = Vec::new();
    for name in container.dir("")?.subdir_names() {
        if !name.starts_with('p') {
            continue;
        }
        let n_reco = container.load_th1(&format!("{name}/hSE"))?.entries;
        let acceptance = if n_events > 0.0 { n_reco / n_events } else { 0.0 };
        pairs.push(PairAcceptance {
            pair: name.to_string(),
            n_reco,
            acceptance,
        });
    }

    Ok(AcceptanceReport {
        n_events,
        eff0,
        eff1,
        eff_product: eff0 * eff1,
        pairs,
    })
}

pub fn log_acceptance(report: &AcceptanceReport) {
    info!("<eff> part0 = {:.4} %", report.eff0 * 100.0);
    info!("<eff> part1 = {:.4} %", report.eff1 * 100.0);
    info!("product = {:.4} %", report.eff_product * 100.0);
    for p in &report.pairs {
        info!("pair: {}  Acc: {:.5}", p.pair, p.acceptance);
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/analysis/efficiency.rs"]
mod tests;
