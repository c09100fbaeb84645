use std::collections::BTreeMap;

use thiserror::Error;

pub mod axis;
pub mod function;
pub mod graph;
pub mod hist1d;
pub mod hist2d;
pub mod observable;

pub use axis::{Axis, EDGE_EPSILON};
pub use function::Function;
pub use graph::{Graph, GraphPoint};
pub use hist1d::Hist1D;
pub use hist2d::Hist2D;
pub use observable::Observable;

/// Spectra keyed by pair label, then by region.
pub type PairMap<T> = BTreeMap<String, BTreeMap<String, T>>;

#[derive(Debug, Error)]
pub enum HistError {
    #[error("incompatible binning between {left} and {right}")]
    BinningMismatch { left: String, right: String },
    #[error("cannot rebin {n_bins} bins in groups of {group}")]
    InvalidRebin { group: usize, n_bins: usize },
    #[error("invalid axis: {0}")]
    InvalidAxis(String),
    #[error("invalid bin range [{first}, {last}) for an axis with {n_bins} bins plus flows")]
    InvalidRange {
        first: usize,
        last: usize,
        n_bins: usize,
    },
}
