use serde::{Deserialize, Serialize};

use crate::model::HistError;
use crate::model::axis::Axis;
use crate::model::hist1d::Hist1D;

/// Two-dimensional spectrum: `x` is the observable, `y` the multiplicity.
/// Cells are stored row-major in `y`, each row holding `nx + 2` cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawHist2D")]
pub struct Hist2D {
    pub name: String,
    pub title: String,
    pub x: Axis,
    pub y: Axis,
    pub contents: Vec<f64>,
    pub sumw2: Vec<f64>,
    pub entries: f64,
}

#[derive(Debug, Deserialize)]
struct RawHist2D {
    name: String,
    #[serde(default)]
    title: String,
    x: Axis,
    y: Axis,
    contents: Vec<f64>,
    #[serde(default)]
    sumw2: Option<Vec<f64>>,
    #[serde(default)]
    entries: Option<f64>,
}

impl TryFrom<RawHist2D> for Hist2D {
    type Error = HistError;

    fn try_from(raw: RawHist2D) -> Result<Self, Self::Error> {
        raw.x.validate()?;
        raw.y.validate()?;
        let nx = raw.x.n_bins();
        let ny = raw.y.n_bins();
        let contents = expand_cells(raw.contents, nx, ny, "contents")?;
        let sumw2 = match raw.sumw2 {
            Some(values) => expand_cells(values, nx, ny, "sumw2")?,
            None => contents.iter().map(|c| c.abs()).collect(),
        };
        let entries = raw.entries.unwrap_or_else(|| contents.iter().sum());
        Ok(Self {
            name: raw.name,
            title: raw.title,
            x: raw.x,
            y: raw.y,
            contents,
            sumw2,
            entries,
        })
    }
}

/// Accepts either the `nx * ny` in-range cells or the full `(nx + 2) * (ny + 2)` grid.
fn expand_cells(values: Vec<f64>, nx: usize, ny: usize, what: &str) -> Result<Vec<f64>, HistError> {
    let full = (nx + 2) * (ny + 2);
    if values.len() == full {
        return Ok(values);
    }
    if values.len() == nx * ny {
        let mut out = vec![0.0; full];
        for iy in 1..=ny {
            for ix in 1..=nx {
                out[iy * (nx + 2) + ix] = values[(iy - 1) * nx + (ix - 1)];
            }
        }
        return Ok(out);
    }
    Err(HistError::InvalidAxis(format!(
        "{what} has {} cells, expected {} or {full}",
        values.len(),
        nx * ny
    )))
}

impl Hist2D {
    pub fn new(name: impl Into<String>, x: Axis, y: Axis) -> Self {
        let cells = (x.n_bins() + 2) * (y.n_bins() + 2);
        Self {
            name: name.into(),
            title: String::new(),
            x,
            y,
            contents: vec![0.0; cells],
            sumw2: vec![0.0; cells],
            entries: 0.0,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn nx(&self) -> usize {
        self.x.n_bins()
    }

    pub fn ny(&self) -> usize {
        self.y.n_bins()
    }

    fn index(&self, ix: usize, iy: usize) -> Option<usize> {
        if ix > self.nx() + 1 || iy > self.ny() + 1 {
            return None;
        }
        Some(iy * (self.nx() + 2) + ix)
    }

    pub fn content(&self, ix: usize, iy: usize) -> f64 {
        self.index(ix, iy).map(|i| self.contents[i]).unwrap_or(0.0)
    }

    pub fn set_content(&mut self, ix: usize, iy: usize, value: f64) {
        if let Some(i) = self.index(ix, iy) {
            self.contents[i] = value;
        }
    }

    #[cfg(test)]
    pub fn set_error(&mut self, ix: usize, iy: usize, error: f64) {
        if let Some(i) = self.index(ix, iy) {
            self.sumw2[i] = error * error;
        }
    }

    /// Projects the rows `first_y..=last_y` (flows allowed) onto the x axis.
    /// x under/overflow cells are carried into the projection's flow bins.
    pub fn projection_x(&self, name: impl Into<String>, first_y: usize, last_y: usize) -> Hist1D {
        let mut out = Hist1D::new(name, self.x.clone());
        let last_y = last_y.min(self.ny() + 1);
        if first_y <= last_y {
            for iy in first_y..=last_y {
                for ix in 0..=self.nx() + 1 {
                    let i = iy * (self.nx() + 2) + ix;
                    out.contents[ix] += self.contents[i];
                    out.sumw2[ix] += self.sumw2[i];
                }
            }
        }
        out.entries = out.contents.iter().sum();
        out
    }

    /// Projects the columns `first_x..=last_x` (flows allowed) onto the y axis.
    pub fn projection_y(&self, name: impl Into<String>, first_x: usize, last_x: usize) -> Hist1D {
        let mut out = Hist1D::new(name, self.y.clone());
        let last_x = last_x.min(self.nx() + 1);
        if first_x <= last_x {
            for iy in 0..=self.ny() + 1 {
                let row = iy * (self.nx() + 2);
                out.contents[iy] = self.contents[row + first_x..=row + last_x].iter().sum();
                out.sumw2[iy] = self.sumw2[row + first_x..=row + last_x].iter().sum();
            }
        }
        out.entries = out.contents.iter().sum();
        out
    }

    /// Projection over every in-range row.
    pub fn projection_x_all(&self, name: impl Into<String>) -> Hist1D {
        self.projection_x(name, 1, self.ny())
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/model/hist2d.rs"]
mod tests;
