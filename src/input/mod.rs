use std::path::Path;

use thiserror::Error;
use tracing::info;

pub mod container;
pub mod femtodream;

pub use container::{Container, ContainerError, Object};
pub use femtodream::{MultVsKstar, load_mult_vs_kstar, me_region};

#[derive(Debug, Error)]
pub enum InputError {
    #[error(transparent)]
    Container(#[from] ContainerError),
    #[error("unsupported input: {0}")]
    Unsupported(String),
}

pub fn open_container(path: &Path) -> Result<Container, InputError> {
    let container = Container::open(path)?;
    info!("loaded input container {}", path.display());
    Ok(container)
}
