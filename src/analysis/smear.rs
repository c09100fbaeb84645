use std::path::PathBuf;

use serde::Deserialize;
use tracing::{info, warn};

use crate::input::{Container, Object};
use crate::model::{Hist1D, Hist2D};
use crate::pipeline::AnalysisError;

#[derive(Debug, Clone, Deserialize)]
pub struct ObjectRef {
    pub file: PathBuf,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SmearJob {
    pub graph: ObjectRef,
    pub smearing: ObjectRef,
    pub output: ObjectRef,
}

/// Folds `hist` with a response matrix whose x axis is the true and y axis the
/// reconstructed observable. Each true bin is spread over the reconstructed
/// bins with probabilities `M(t, r) / sum_r M(t, r)`.
pub fn smear(hist: &Hist1D, response: &Hist2D, name: &str) -> Hist1D {
    let mut out = Hist1D::new(name, response.y.clone()).with_title(hist.title.clone());
    let mut lost = 0usize;
    for bin in 1..=hist.n_bins() {
        let content = hist.content(bin);
        if content == 0.0 {
            continue;
        }
        let t = response.x.find_bin(hist.bin_center(bin));
        if t == 0 || t > response.nx() {
            lost += 1;
            continue;
        }
        let row_sum: f64 = (1..=response.ny()).map(|r| response.content(t, r)).sum();
        if row_sum <= 0.0 {
            lost += 1;
            continue;
        }
        let sumw2 = hist.sumw2[bin];
        for r in 1..=response.ny() {
            let p = response.content(t, r) / row_sum;
            if p == 0.0 {
                continue;
            }
            out.contents[r] += p * content;
            out.sumw2[r] += p * p * sumw2;
        }
    }
    if lost > 0 {
        warn!(
            "{} bins of {} fall outside the response matrix or have an empty row",
            lost, hist.name
        );
    }
    out.entries = out.integral();
    out
}

pub fn run_smear(jobs: &[SmearJob]) -> Result<(), AnalysisError> {
    for job in jobs {
        let input = Container::open(&job.graph.file)?;
        let hist = match input.load(&job.graph.name)? {
            Object::Th1(h) => h.clone(),
            other => return Err(AnalysisError::unsupported("smearing", other.kind())),
        };

        let matrix_file = Container::open(&job.smearing.file)?;
        let response = matrix_file.load_th2(&job.smearing.name)?;

        let smeared = smear(&hist, response, &job.output.name);
        let mut out = Container::new(job.output.file.display().to_string());
        out.insert(&smeared.name.clone(), Object::Th1(smeared))?;
        out.insert(&hist.name.clone(), Object::Th1(hist))?;
        out.save(&job.output.file)?;
        info!("output saved in {}", job.output.file.display());
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/src_inline/analysis/smear.rs"]
mod tests;
