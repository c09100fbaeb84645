use serde::{Deserialize, Serialize};

use crate::model::HistError;

/// Relative shift applied to the window edges before bin lookup, so that a
/// window boundary sitting exactly on a bin edge selects the bin inside the window.
pub const EDGE_EPSILON: f64 = 1e-4;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Binning {
    Uniform { n: usize, min: f64, max: f64 },
    Variable { edges: Vec<f64> },
}

/// Binned axis. Bin 0 is the underflow and bin `n + 1` the overflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Axis {
    pub binning: Binning,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,
}

impl Axis {
    pub fn uniform(n: usize, min: f64, max: f64) -> Result<Self, HistError> {
        if n == 0 || !(max > min) || !min.is_finite() || !max.is_finite() {
            return Err(HistError::InvalidAxis(format!(
                "uniform axis needs n > 0 and min < max (n={n}, min={min}, max={max})"
            )));
        }
        Ok(Self {
            binning: Binning::Uniform { n, min, max },
            labels: None,
        })
    }

    pub fn variable(edges: Vec<f64>) -> Result<Self, HistError> {
        if edges.len() < 2 {
            return Err(HistError::InvalidAxis(
                "variable axis needs at least two edges".to_string(),
            ));
        }
        if edges.windows(2).any(|w| !(w[1] > w[0])) {
            return Err(HistError::InvalidAxis(
                "variable axis edges must be strictly increasing".to_string(),
            ));
        }
        Ok(Self {
            binning: Binning::Variable { edges },
            labels: None,
        })
    }

    pub fn labeled(labels: &[&str]) -> Result<Self, HistError> {
        let mut axis = Self::uniform(labels.len(), 0.0, labels.len() as f64)?;
        axis.labels = Some(labels.iter().map(|s| s.to_string()).collect());
        Ok(axis)
    }

    pub fn validate(&self) -> Result<(), HistError> {
        match &self.binning {
            Binning::Uniform { n, min, max } => Self::uniform(*n, *min, *max).map(|_| ()),
            Binning::Variable { edges } => Self::variable(edges.clone()).map(|_| ()),
        }?;
        if let Some(labels) = &self.labels {
            if labels.len() != self.n_bins() {
                return Err(HistError::InvalidAxis(format!(
                    "axis has {} bins but {} labels",
                    self.n_bins(),
                    labels.len()
                )));
            }
        }
        Ok(())
    }

    pub fn n_bins(&self) -> usize {
        match &self.binning {
            Binning::Uniform { n, .. } => *n,
            Binning::Variable { edges } => edges.len() - 1,
        }
    }

    pub fn min(&self) -> f64 {
        match &self.binning {
            Binning::Uniform { min, .. } => *min,
            Binning::Variable { edges } => edges[0],
        }
    }

    pub fn max(&self) -> f64 {
        match &self.binning {
            Binning::Uniform { max, .. } => *max,
            Binning::Variable { edges } => edges[edges.len() - 1],
        }
    }

    /// Lower edge of `bin` for `bin` in `1..=n + 1`.
    pub fn low_edge(&self, bin: usize) -> f64 {
        match &self.binning {
            Binning::Uniform { n, min, max } => {
                let width = (max - min) / *n as f64;
                min + (bin as f64 - 1.0) * width
            }
            Binning::Variable { edges } => {
                let idx = bin.clamp(1, edges.len()) - 1;
                edges[idx]
            }
        }
    }

    pub fn up_edge(&self, bin: usize) -> f64 {
        self.low_edge(bin + 1)
    }

    pub fn width(&self, bin: usize) -> f64 {
        self.up_edge(bin) - self.low_edge(bin)
    }

    pub fn center(&self, bin: usize) -> f64 {
        0.5 * (self.low_edge(bin) + self.up_edge(bin))
    }

    pub fn edges(&self) -> Vec<f64> {
        (1..=self.n_bins() + 1).map(|b| self.low_edge(b)).collect()
    }

    pub fn find_bin(&self, x: f64) -> usize {
        let n = self.n_bins();
        if x.is_nan() {
            return n + 1;
        }
        if x < self.min() {
            return 0;
        }
        if x >= self.max() {
            return n + 1;
        }
        match &self.binning {
            Binning::Uniform { n, min, max } => {
                let bin = 1 + (*n as f64 * (x - min) / (max - min)) as usize;
                bin.min(*n)
            }
            Binning::Variable { edges } => edges.partition_point(|e| *e <= x),
        }
    }

    /// Maps `[lo, hi]` to a first/last bin pair, shrinking the window by
    /// `rel_eps` on both sides before the lookup.
    pub fn bin_range_inclusive(&self, lo: f64, hi: f64, rel_eps: f64) -> (usize, usize) {
        (
            self.find_bin(lo * (1.0 + rel_eps)),
            self.find_bin(hi * (1.0 - rel_eps)),
        )
    }

    pub fn find_label(&self, label: &str) -> Option<usize> {
        self.labels
            .as_ref()
            .and_then(|labels| labels.iter().position(|l| l == label))
            .map(|idx| idx + 1)
    }

    pub fn same_binning(&self, other: &Axis) -> bool {
        if self.n_bins() != other.n_bins() {
            return false;
        }
        let scale = (self.max() - self.min()).abs().max(1.0);
        self.edges()
            .iter()
            .zip(other.edges())
            .all(|(a, b)| (a - b).abs() <= 1e-9 * scale)
    }

    /// Axis obtained by merging groups of `group` consecutive bins; trailing
    /// bins that do not fill a complete group are dropped from the range.
    pub fn rebinned(&self, group: usize) -> Result<Axis, HistError> {
        let n = self.n_bins();
        if group == 0 || group > n {
            return Err(HistError::InvalidRebin { group, n_bins: n });
        }
        let n_new = n / group;
        let binning = match &self.binning {
            Binning::Uniform { min, .. } => Binning::Uniform {
                n: n_new,
                min: *min,
                max: self.low_edge(n_new * group + 1),
            },
            Binning::Variable { edges } => Binning::Variable {
                edges: edges.iter().step_by(group).take(n_new + 1).copied().collect(),
            },
        };
        Ok(Axis {
            binning,
            labels: None,
        })
    }

    pub fn scaled(&self, multiplier: f64) -> Result<Axis, HistError> {
        if !(multiplier > 0.0) {
            return Err(HistError::InvalidAxis(format!(
                "axis multiplier must be positive, got {multiplier}"
            )));
        }
        let binning = match &self.binning {
            Binning::Uniform { n, min, max } => Binning::Uniform {
                n: *n,
                min: min * multiplier,
                max: max * multiplier,
            },
            Binning::Variable { edges } => Binning::Variable {
                edges: edges.iter().map(|e| e * multiplier).collect(),
            },
        };
        Ok(Axis {
            binning,
            labels: self.labels.clone(),
        })
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/model/axis.rs"]
mod tests;
