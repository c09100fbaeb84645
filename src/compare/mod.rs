use serde::Deserialize;

use crate::model::{Graph, GraphPoint, Hist1D, HistError, Observable};
use crate::pipeline::AnalysisError;

pub mod run;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum SpreadMode {
    #[serde(rename = "percentage")]
    Percentage,
}

/// Numerator over denominator. Histograms are rebinned by `rebin` first;
/// graphs must have the same number of points.
pub fn ratio(num: &Observable, den: &Observable, rebin: usize) -> Result<Observable, AnalysisError> {
    match (num, den) {
        (Observable::Binned(n), Observable::Binned(d)) => {
            let n = n.rebinned(rebin)?;
            let d = d.rebinned(rebin)?;
            Ok(Observable::Binned(n.divided(&d)?.renamed("hRatio")))
        }
        (Observable::Graph(n), Observable::Graph(d)) => {
            if n.len() != d.len() {
                return Err(HistError::BinningMismatch {
                    left: format!("{} ({} points)", n.name, n.len()),
                    right: format!("{} ({} points)", d.name, d.len()),
                }
                .into());
            }
            let mut out = Graph::new("gRatio");
            for (pn, pd) in n.points.iter().zip(&d.points) {
                let (y, ey) = if pd.y == 0.0 {
                    (0.0, 0.0)
                } else {
                    let y = pn.y / pd.y;
                    let rel_n = pn.error_y() / pd.y;
                    let rel_d = pn.y * pd.error_y() / (pd.y * pd.y);
                    (y, (rel_n * rel_n + rel_d * rel_d).sqrt())
                };
                out.push(GraphPoint {
                    x: pn.x,
                    y,
                    ex_low: pn.ex_low,
                    ex_high: pn.ex_high,
                    ey_low: ey,
                    ey_high: ey,
                });
            }
            Ok(Observable::Graph(out))
        }
        (n, d) => Err(AnalysisError::unsupported(
            "ratio",
            format!("{} over {}", n.kind(), d.kind()),
        )),
    }
}

/// Relative uncertainty in percent.
pub fn relative_uncertainty(obs: &Observable) -> Result<Observable, AnalysisError> {
    match obs {
        Observable::Binned(h) => {
            let mut out = h.zeroed_clone("hRelUnc");
            for bin in 1..=h.n_bins() {
                let content = h.content(bin);
                if content > 0.0 {
                    out.set_content(bin, 100.0 * h.error(bin) / content);
                }
            }
            Ok(Observable::Binned(out))
        }
        Observable::Graph(g) => Ok(Observable::Graph(graph_rel_unc(g))),
        Observable::AsymmGraph(g) => Ok(Observable::AsymmGraph(graph_rel_unc(g))),
        Observable::Function(_) => Err(AnalysisError::unsupported(
            "relative uncertainty",
            obs.kind(),
        )),
    }
}

fn graph_rel_unc(g: &Graph) -> Graph {
    let mut out = Graph::new("gRelUnc");
    for p in &g.points {
        let y = if p.y != 0.0 {
            100.0 * p.error_y() / p.y
        } else {
            0.0
        };
        out.push(GraphPoint {
            x: p.x,
            y,
            ex_low: p.ex_low,
            ex_high: p.ex_high,
            ey_low: 0.0,
            ey_high: 0.0,
        });
    }
    out
}

/// Per-bin standard deviation across `set`, relative to the reference content.
pub fn spread(
    set: &[Hist1D],
    reference: &Hist1D,
    mode: Option<SpreadMode>,
) -> Result<Hist1D, AnalysisError> {
    if set.is_empty() {
        return Err(AnalysisError::Degenerate(
            "spread needs at least one spectrum".to_string(),
        ));
    }
    for h in set {
        reference.check_compatible(h)?;
    }
    let multiplier = match mode {
        Some(SpreadMode::Percentage) => 100.0,
        None => 1.0,
    };
    let n = set.len() as f64;
    let mut out = reference.zeroed_clone("hSpread");
    for bin in 1..=reference.n_bins() {
        let mean = set.iter().map(|h| h.content(bin)).sum::<f64>() / n;
        let var = set
            .iter()
            .map(|h| {
                let d = h.content(bin) - mean;
                d * d
            })
            .sum::<f64>()
            / n;
        let ref_content = reference.content(bin);
        if ref_content != 0.0 {
            out.set_content(bin, multiplier * var.sqrt() / ref_content);
        }
    }
    Ok(out)
}

/// `(observed - model) / error`, where the model must be a continuous function.
pub fn pulls(reference: &Observable, observed: &Observable) -> Result<Observable, AnalysisError> {
    let Observable::Function(model) = reference else {
        return Err(AnalysisError::unsupported(
            "pulls",
            format!("a {} reference", reference.kind()),
        ));
    };
    match observed {
        Observable::Binned(h) => {
            let mut out = h.zeroed_clone("hPulls");
            for bin in 1..=h.n_bins() {
                let content = h.content(bin);
                let error = h.error(bin);
                if content > 0.0 && error > 0.0 {
                    out.set_content(bin, (content - model.eval(h.bin_center(bin))) / error);
                }
            }
            Ok(Observable::Binned(out))
        }
        Observable::Graph(g) | Observable::AsymmGraph(g) => {
            let mut out = Graph::new("gPulls");
            for p in &g.points {
                let ey = p.error_y();
                let pull = if ey > 0.0 {
                    (p.y - model.eval(p.x)) / ey
                } else {
                    0.0
                };
                out.push(GraphPoint::symmetric(p.x, pull, 0.0, 0.0));
            }
            Ok(Observable::Graph(out))
        }
        Observable::Function(_) => Err(AnalysisError::unsupported("pulls", observed.kind())),
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/compare/mod.rs"]
mod tests;
