use serde::{Deserialize, Serialize};

use crate::model::HistError;
use crate::model::axis::Axis;

/// One-dimensional binned spectrum. `contents` and `sumw2` hold `n + 2`
/// entries: underflow, the `n` in-range bins, overflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawHist1D")]
pub struct Hist1D {
    pub name: String,
    pub title: String,
    pub axis: Axis,
    pub contents: Vec<f64>,
    pub sumw2: Vec<f64>,
    pub entries: f64,
}

#[derive(Debug, Deserialize)]
struct RawHist1D {
    name: String,
    #[serde(default)]
    title: String,
    axis: Axis,
    contents: Vec<f64>,
    #[serde(default)]
    sumw2: Option<Vec<f64>>,
    #[serde(default)]
    entries: Option<f64>,
}

impl TryFrom<RawHist1D> for Hist1D {
    type Error = HistError;

    fn try_from(raw: RawHist1D) -> Result<Self, Self::Error> {
        raw.axis.validate()?;
        let n = raw.axis.n_bins();
        let contents = pad_flows(raw.contents, n, "contents")?;
        let sumw2 = match raw.sumw2 {
            Some(values) => pad_flows(values, n, "sumw2")?,
            None => contents.iter().map(|c| c.abs()).collect(),
        };
        let entries = raw.entries.unwrap_or_else(|| contents.iter().sum());
        Ok(Self {
            name: raw.name,
            title: raw.title,
            axis: raw.axis,
            contents,
            sumw2,
            entries,
        })
    }
}

/// Accepts either the in-range bins only or the full array with flows.
pub(crate) fn pad_flows(values: Vec<f64>, n: usize, what: &str) -> Result<Vec<f64>, HistError> {
    if values.len() == n + 2 {
        return Ok(values);
    }
    if values.len() == n {
        let mut out = Vec::with_capacity(n + 2);
        out.push(0.0);
        out.extend(values);
        out.push(0.0);
        return Ok(out);
    }
    Err(HistError::InvalidAxis(format!(
        "{what} has {} values, expected {n} or {}",
        values.len(),
        n + 2
    )))
}

impl Hist1D {
    pub fn new(name: impl Into<String>, axis: Axis) -> Self {
        let n = axis.n_bins();
        Self {
            name: name.into(),
            title: String::new(),
            axis,
            contents: vec![0.0; n + 2],
            sumw2: vec![0.0; n + 2],
            entries: 0.0,
        }
    }

    /// Builds a spectrum from in-range counts with Poisson errors.
    #[cfg(test)]
    pub fn from_counts(
        name: impl Into<String>,
        axis: Axis,
        counts: &[f64],
    ) -> Result<Self, HistError> {
        let contents = pad_flows(counts.to_vec(), axis.n_bins(), "counts")?;
        let sumw2 = contents.iter().map(|c| c.abs()).collect();
        let entries = contents.iter().sum();
        Ok(Self {
            name: name.into(),
            title: String::new(),
            axis,
            contents,
            sumw2,
            entries,
        })
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn renamed(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn n_bins(&self) -> usize {
        self.axis.n_bins()
    }

    pub fn content(&self, bin: usize) -> f64 {
        self.contents.get(bin).copied().unwrap_or(0.0)
    }

    pub fn error(&self, bin: usize) -> f64 {
        self.sumw2.get(bin).copied().unwrap_or(0.0).sqrt()
    }

    pub fn set_content(&mut self, bin: usize, value: f64) {
        if let Some(slot) = self.contents.get_mut(bin) {
            *slot = value;
        }
    }

    #[cfg(test)]
    pub fn set_error(&mut self, bin: usize, error: f64) {
        if let Some(slot) = self.sumw2.get_mut(bin) {
            *slot = error * error;
        }
    }

    pub fn find_bin(&self, x: f64) -> usize {
        self.axis.find_bin(x)
    }

    pub fn bin_width(&self, bin: usize) -> f64 {
        self.axis.width(bin)
    }

    pub fn bin_center(&self, bin: usize) -> f64 {
        self.axis.center(bin)
    }

    /// Sum of the in-range bins.
    pub fn integral(&self) -> f64 {
        self.integral_range(1, self.n_bins())
    }

    /// Sum of bins `first..=last`, clamped to the flow bins.
    pub fn integral_range(&self, first: usize, last: usize) -> f64 {
        let last = last.min(self.n_bins() + 1);
        if first > last {
            return 0.0;
        }
        self.contents[first..=last].iter().sum()
    }

    /// Content-weighted mean of the bin centers in `first..=last`, restricted
    /// to in-range bins. Zero when the range is empty.
    pub fn mean_range(&self, first: usize, last: usize) -> f64 {
        let (mut sum, mut total) = (0.0, 0.0);
        for bin in first.max(1)..=last.min(self.n_bins()) {
            let w = self.content(bin);
            sum += w * self.bin_center(bin);
            total += w;
        }
        if total == 0.0 { 0.0 } else { sum / total }
    }

    pub fn mean(&self) -> f64 {
        self.mean_range(1, self.n_bins())
    }

    pub fn check_compatible(&self, other: &Hist1D) -> Result<(), HistError> {
        if self.axis.same_binning(&other.axis) {
            Ok(())
        } else {
            Err(HistError::BinningMismatch {
                left: self.name.clone(),
                right: other.name.clone(),
            })
        }
    }

    /// `self += c * other`, bin by bin, flows included.
    pub fn add_scaled(&mut self, other: &Hist1D, c: f64) -> Result<(), HistError> {
        self.check_compatible(other)?;
        for bin in 0..self.contents.len() {
            self.contents[bin] += c * other.contents[bin];
            self.sumw2[bin] += c * c * other.sumw2[bin];
        }
        self.entries += other.entries;
        Ok(())
    }

    pub fn sum(&self, other: &Hist1D) -> Result<Hist1D, HistError> {
        let mut out = self.clone();
        out.add_scaled(other, 1.0)?;
        Ok(out)
    }

    pub fn scale(&mut self, c: f64) {
        for bin in 0..self.contents.len() {
            self.contents[bin] *= c;
            self.sumw2[bin] *= c * c;
        }
    }

    pub fn scaled(&self, c: f64) -> Hist1D {
        let mut out = self.clone();
        out.scale(c);
        out
    }

    /// Bin-wise ratio with uncorrelated error propagation. Bins with a zero
    /// denominator are set to zero.
    pub fn divided(&self, denominator: &Hist1D) -> Result<Hist1D, HistError> {
        self.check_compatible(denominator)?;
        let mut out = self.clone();
        for bin in 0..self.contents.len() {
            let c1 = self.contents[bin];
            let c2 = denominator.contents[bin];
            if c2 == 0.0 {
                out.contents[bin] = 0.0;
                out.sumw2[bin] = 0.0;
                continue;
            }
            let c2sq = c2 * c2;
            out.contents[bin] = c1 / c2;
            out.sumw2[bin] =
                (self.sumw2[bin] * c2sq + denominator.sumw2[bin] * c1 * c1) / (c2sq * c2sq);
        }
        Ok(out)
    }

    /// Merges groups of `group` bins. Bins beyond the last complete group are
    /// folded into the overflow.
    pub fn rebinned(&self, group: usize) -> Result<Hist1D, HistError> {
        if group == 1 {
            return Ok(self.clone());
        }
        let axis = self.axis.rebinned(group)?;
        let n_old = self.n_bins();
        let n_new = axis.n_bins();
        let mut out = Hist1D::new(self.name.clone(), axis);
        out.title = self.title.clone();
        out.entries = self.entries;
        out.contents[0] = self.contents[0];
        out.sumw2[0] = self.sumw2[0];
        for old in 1..=n_old + 1 {
            let new = if old > n_new * group {
                n_new + 1
            } else {
                (old - 1) / group + 1
            };
            out.contents[new] += self.contents[old];
            out.sumw2[new] += self.sumw2[old];
        }
        Ok(out)
    }

    pub fn reset(&mut self) {
        self.contents.iter_mut().for_each(|c| *c = 0.0);
        self.sumw2.iter_mut().for_each(|c| *c = 0.0);
        self.entries = 0.0;
    }

    pub fn zeroed_clone(&self, name: impl Into<String>) -> Hist1D {
        let mut out = self.clone().renamed(name);
        out.reset();
        out
    }

    /// Copy with the axis multiplied by `multiplier` (unit change), contents untouched.
    pub fn with_scaled_axis(
        &self,
        multiplier: f64,
        name: impl Into<String>,
    ) -> Result<Hist1D, HistError> {
        let mut out = self.clone().renamed(name);
        out.axis = self.axis.scaled(multiplier)?;
        Ok(out)
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/model/hist1d.rs"]
mod tests;
