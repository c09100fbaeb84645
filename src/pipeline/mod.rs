use thiserror::Error;

use crate::config::ConfigError;
use crate::input::{ContainerError, InputError};
use crate::model::HistError;

pub mod stage1_load;
pub mod stage2_reweight;
pub mod stage3_project;
pub mod stage4_combine;
pub mod stage5_cf;
pub mod stage6_write;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Hist(#[from] HistError),
    #[error(transparent)]
    Input(#[from] InputError),
    #[error(transparent)]
    Container(#[from] ContainerError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("{operation} is not implemented for {kind}")]
    Unsupported {
        operation: &'static str,
        kind: String,
    },
    #[error("missing {what} spectrum for pair {pair}, region {region}")]
    MissingSpectrum {
        what: &'static str,
        pair: String,
        region: String,
    },
    #[error("degenerate input: {0}")]
    Degenerate(String),
    #[error("cannot write reports: {0}")]
    Report(#[from] std::io::Error),
}

impl AnalysisError {
    pub fn unsupported(operation: &'static str, kind: impl Into<String>) -> Self {
        AnalysisError::Unsupported {
            operation,
            kind: kind.into(),
        }
    }
}
