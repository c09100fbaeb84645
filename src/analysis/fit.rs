use std::path::PathBuf;

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::ConfigError;
use crate::input::{Container, Object};
use crate::model::{EDGE_EPSILON, Function, Graph, GraphPoint, Hist1D, Observable};
use crate::pipeline::AnalysisError;

fn unit() -> f64 {
    1.0
}

#[derive(Debug, Clone, Deserialize)]
pub struct FitConfig {
    pub fits: Vec<FitJob>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FitJob {
    pub infile: PathBuf,
    pub path: String,
    pub fitrange: [f64; 2],
    pub terms: Vec<FitTerm>,
    pub output: PathBuf,
}

/// A fit component, either a histogram template (`file` + `path`) or a
/// fixed-shape function.
#[derive(Debug, Clone, Deserialize)]
pub struct FitTerm {
    pub name: String,
    #[serde(default)]
    pub file: Option<PathBuf>,
    #[serde(default)]
    pub path: Option<String>,
    /// Multiplier applied to the template k* axis, e.g. 0.001 for MeV -> GeV.
    #[serde(default = "unit")]
    pub unit_mult: f64,
    #[serde(default)]
    pub function: Option<Function>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Template {
    Binned(Hist1D),
    Function(Function),
}

impl Template {
    /// Outside the template range a histogram contributes nothing.
    pub fn eval(&self, x: f64) -> f64 {
        match self {
            Template::Binned(h) => {
                let bin = h.find_bin(x);
                if bin == 0 || bin > h.n_bins() {
                    0.0
                } else {
                    h.content(bin)
                }
            }
            Template::Function(f) => f.eval(x),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FitResult {
    pub names: Vec<String>,
    pub coefficients: Vec<f64>,
    pub errors: Vec<f64>,
    pub chi2: f64,
    pub ndf: usize,
}

impl FitResult {
    pub fn eval(&self, templates: &[Template], x: f64) -> f64 {
        templates
            .iter()
            .zip(&self.coefficients)
            .map(|(t, a)| a * t.eval(x))
            .sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitPoint {
    pub x: f64,
    pub y: f64,
    pub err: f64,
}

/// Points of `obs` inside `[lo, hi]`. Points without uncertainty are dropped.
pub fn fit_points(obs: &Observable, range: [f64; 2]) -> Result<Vec<FitPoint>, AnalysisError> {
    let points: Vec<FitPoint> = match obs {
        Observable::Binned(h) => {
            let (first, last) = h.axis.bin_range_inclusive(range[0], range[1], EDGE_EPSILON);
            (first.max(1)..=last.min(h.n_bins()))
                .map(|bin| FitPoint {
                    x: h.bin_center(bin),
                    y: h.content(bin),
                    err: h.error(bin),
                })
                .collect()
        }
        Observable::Graph(g) | Observable::AsymmGraph(g) => g
            .points
            .iter()
            .filter(|p| p.x >= range[0] && p.x <= range[1])
            .map(|p| FitPoint {
                x: p.x,
                y: p.y,
                err: p.error_y(),
            })
            .collect(),
        Observable::Function(_) => return Err(AnalysisError::unsupported("template fit", obs.kind())),
    };
    Ok(points.into_iter().filter(|p| p.err > 0.0).collect())
}

/// Weighted linear least squares of `y = sum_j a_j T_j(x)`.
pub fn template_fit(
    points: &[FitPoint],
    templates: &[Template],
    names: &[String],
) -> Result<FitResult, AnalysisError> {
    let n_par = templates.len();
    if n_par == 0 {
        return Err(AnalysisError::Degenerate("no fit templates".to_string()));
    }
    if points.len() < n_par {
        return Err(AnalysisError::Degenerate(format!(
            "{} points cannot constrain {} parameters",
            points.len(),
            n_par
        )));
    }

    let mut normal = vec![0.0; n_par * n_par];
    let mut rhs = vec![0.0; n_par];
    for p in points {
        let w = 1.0 / (p.err * p.err);
        let t: Vec<f64> = templates.iter().map(|tpl| tpl.eval(p.x)).collect();
        for i in 0..n_par {
            rhs[i] += w * t[i] * p.y;
            for j in 0..n_par {
                normal[i * n_par + j] += w * t[i] * t[j];
            }
        }
    }

    let lu = DMatrix::from_row_slice(n_par, n_par, &normal).lu();
    let singular = || AnalysisError::Degenerate("singular template fit".to_string());
    let solution = lu.solve(&DVector::from_vec(rhs)).ok_or_else(singular)?;
    let covariance = lu.try_inverse().ok_or_else(singular)?;

    let mut result = FitResult {
        names: names.to_vec(),
        coefficients: solution.iter().copied().collect(),
        errors: (0..n_par).map(|i| covariance[(i, i)].max(0.0).sqrt()).collect(),
        chi2: 0.0,
        ndf: points.len() - n_par,
    };
    let chi2: f64 = points
        .iter()
        .map(|p| {
            let r = (p.y - result.eval(templates, p.x)) / p.err;
            r * r
        })
        .sum();
    result.chi2 = chi2;
    Ok(result)
}

fn load_template(term: &FitTerm) -> Result<Template, AnalysisError> {
    match (&term.function, &term.file, &term.path) {
        (Some(f), None, None) => Ok(Template::Function(f.clone())),
        (None, Some(file), Some(path)) => {
            let container = Container::open(file)?;
            if let Some(Object::Function(_)) = container.get(path) {
                return Ok(Template::Function(container.load_function(path)?.clone()));
            }
            let h = container.load_th1(path)?;
            let h = if term.unit_mult == 1.0 {
                h.clone()
            } else {
                h.with_scaled_axis(term.unit_mult, h.name.clone())?
            };
            Ok(Template::Binned(h))
        }
        _ => Err(ConfigError::Invalid(format!(
            "fit term {} needs either a function or a file and path",
            term.name
        ))
        .into()),
    }
}

/// Fitted model sampled like the observable: histogram bins or graph points
/// inside the fit range.
pub fn fitted_observable(
    obs: &Observable,
    result: &FitResult,
    templates: &[Template],
    range: [f64; 2],
) -> Object {
    match obs {
        Observable::Binned(h) => {
            let mut fit = h.zeroed_clone("hFit");
            let (first, last) = h.axis.bin_range_inclusive(range[0], range[1], EDGE_EPSILON);
            for bin in first.max(1)..=last.min(h.n_bins()) {
                fit.set_content(bin, result.eval(templates, h.bin_center(bin)));
            }
            Object::Th1(fit)
        }
        _ => {
            let mut g = Graph::new("hFit");
            for p in fit_points(obs, range).unwrap_or_default() {
                g.push(GraphPoint::symmetric(p.x, result.eval(templates, p.x), 0.0, 0.0));
            }
            Object::Graph(g)
        }
    }
}

pub fn run_fit(config: &FitConfig) -> Result<Vec<FitResult>, AnalysisError> {
    let mut results = Vec::with_capacity(config.fits.len());
    for job in &config.fits {
        let input = Container::open(&job.infile)?;
        let obj = input.load(&job.path)?;
        let obs = obj
            .to_observable()
            .ok_or_else(|| AnalysisError::unsupported("template fit", obj.kind()))?;

        let templates = job
            .terms
            .iter()
            .map(load_template)
            .collect::<Result<Vec<_>, _>>()?;
        let names: Vec<String> = job.terms.iter().map(|t| t.name.clone()).collect();

        let points = fit_points(&obs, job.fitrange)?;
        let result = template_fit(&points, &templates, &names)?;
        for ((name, a), e) in names.iter().zip(&result.coefficients).zip(&result.errors) {
            info!("{} = {:.6} +/- {:.6}", name, a, e);
        }
        if result.ndf == 0 {
            warn!("fit of {} has no degrees of freedom", job.path);
        } else {
            info!("chi2/ndf = {:.3}/{}", result.chi2, result.ndf);
        }

        let mut out = Container::new(job.output.display().to_string());
        out.insert("hObs", Object::from(obs.clone()))?;
        out.insert("hFit", fitted_observable(&obs, &result, &templates, job.fitrange))?;
        out.save(&job.output)?;
        info!("output saved in {}", job.output.display());
        results.push(result);
    }
    Ok(results)
}

#[cfg(test)]
#[path = "../../tests/src_inline/analysis/fit.rs"]
mod tests;
