use std::path::PathBuf;

use serde::Deserialize;
use tracing::{error, info};

use crate::compare::{SpreadMode, pulls, ratio, relative_uncertainty, spread};
use crate::input::{Container, Object};
use crate::model::{Hist1D, Observable};
use crate::pipeline::AnalysisError;

fn one() -> usize {
    1
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlotEntry {
    pub plot: PlotConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlotConfig {
    pub output: PathBuf,
    pub input: Vec<InputConfig>,
    #[serde(default)]
    pub ratio: RatioPanel,
    #[serde(default)]
    pub relunc: Panel,
    #[serde(default)]
    pub pulls: Panel,
    #[serde(default)]
    pub spread: SpreadPanel,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InputConfig {
    pub file: PathBuf,
    pub name: String,
    #[serde(default = "one")]
    pub rebin: usize,
    /// Scale to unit integral.
    #[serde(default)]
    pub normalize: bool,
    #[serde(default)]
    pub normalizecf: Option<f64>,
    #[serde(default)]
    pub legend: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Panel {
    #[serde(default)]
    pub enable: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RatioPanel {
    #[serde(default)]
    pub enable: bool,
    #[serde(default = "one")]
    pub rebin: usize,
}

impl Default for RatioPanel {
    fn default() -> Self {
        Self {
            enable: false,
            rebin: 1,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SpreadPanel {
    #[serde(default)]
    pub enable: bool,
    #[serde(default)]
    pub mode: Option<SpreadMode>,
}

pub fn load_input(cfg: &InputConfig) -> Result<Observable, AnalysisError> {
    let container = Container::open(&cfg.file)?;
    let obj = container.load(&cfg.name)?;
    if let Object::Dir(dir) = obj {
        let names: Vec<&str> = dir
            .hists_in_dir()
            .into_iter()
            .chain(dir.graphs_in_dir())
            .map(|(name, _)| name)
            .collect();
        error!("{} is a directory; plottable objects inside: {:?}", cfg.name, names);
    }
    let obs = obj
        .to_observable()
        .ok_or_else(|| AnalysisError::unsupported("comparison", obj.kind()))?;
    Ok(match obs {
        Observable::Binned(h) => Observable::Binned(prepare_hist(h, cfg)?),
        other => other,
    })
}

fn prepare_hist(h: Hist1D, cfg: &InputConfig) -> Result<Hist1D, AnalysisError> {
    let mut h = h.rebinned(cfg.rebin)?;
    if cfg.normalize {
        let integral = h.integral();
        if integral != 0.0 {
            h.scale(1.0 / integral);
        }
    }
    if let Some(factor) = cfg.normalizecf {
        h.scale(factor);
    }
    Ok(h)
}

/// Unsupported combinations only cost the affected panel entry.
fn skip_unsupported<T>(result: Result<T, AnalysisError>, panel: &str) -> Result<Option<T>, AnalysisError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(err @ AnalysisError::Unsupported { .. }) => {
            error!("{}: {}. Skipping this object", panel, err);
            Ok(None)
        }
        Err(err) => Err(err),
    }
}

pub fn build_comparison(plot: &PlotConfig, inputs: &[Observable]) -> Result<Container, AnalysisError> {
    let mut out = Container::new(plot.output.display().to_string());
    for (i, (obs, cfg)) in inputs.iter().zip(&plot.input).enumerate() {
        out.insert(&format!("inputs/{i}"), Object::from(obs.clone()))?;
        if !cfg.legend.is_empty() {
            info!("input {}: {}", i, cfg.legend);
        }
    }
    let Some(reference) = inputs.first() else {
        return Ok(out);
    };

    if plot.ratio.enable {
        for (i, num) in inputs.iter().enumerate().skip(1) {
            if let Some(r) = skip_unsupported(ratio(num, reference, plot.ratio.rebin), "ratio")? {
                out.insert(&format!("ratio/{i}"), r.into())?;
            }
        }
    }

    if plot.relunc.enable {
        for (i, obs) in inputs.iter().enumerate() {
            if let Some(r) = skip_unsupported(relative_uncertainty(obs), "relative uncertainty")? {
                out.insert(&format!("relunc/{i}"), r.into())?;
            }
        }
    }

    if plot.pulls.enable {
        for (i, obs) in inputs.iter().enumerate().skip(1) {
            if let Some(p) = skip_unsupported(pulls(reference, obs), "pulls")? {
                out.insert(&format!("pulls/{i}"), p.into())?;
            }
        }
    }

    if plot.spread.enable {
        match reference {
            Observable::Binned(r) => {
                let mut binned = Vec::new();
                for (i, obs) in inputs.iter().enumerate().skip(1) {
                    let h = match obs {
                        Observable::Binned(h) => Ok(h.clone()),
                        other => Err(AnalysisError::unsupported("spread", other.kind())),
                    };
                    if let Some(h) = skip_unsupported(h, &format!("spread input {i}"))? {
                        binned.push(h);
                    }
                }
                if binned.is_empty() {
                    error!("spread: no binned spectrum to compare. Skipping this panel");
                } else if let Some(s) =
                    skip_unsupported(spread(&binned, r, plot.spread.mode), "spread")?
                {
                    out.insert("spread", Object::Th1(s))?;
                }
            }
            other => {
                let kind = format!("a {} reference", other.kind());
                skip_unsupported::<Hist1D>(Err(AnalysisError::unsupported("spread", kind)), "spread")?;
            }
        }
    }

    Ok(out)
}

pub fn run_compare(plots: &[PlotEntry]) -> Result<(), AnalysisError> {
    for entry in plots {
        let plot = &entry.plot;
        let inputs = plot
            .input
            .iter()
            .map(load_input)
            .collect::<Result<Vec<_>, _>>()?;
        let out = build_comparison(plot, &inputs)?;
        out.save(&plot.output)?;
        info!("output saved in {}", plot.output.display());
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/src_inline/compare/run.rs"]
mod tests;
