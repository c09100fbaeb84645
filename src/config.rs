use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_yaml_ng::Value;
use thiserror::Error;

use crate::model::{Axis, EDGE_EPSILON};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read configuration {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("yaml configuration {path} could not be loaded, is it properly formatted? {source}")]
    Yaml {
        path: String,
        #[source]
        source: serde_yaml_ng::Error,
    },
    #[error("normalization method not implemented: {0}")]
    UnsupportedNorm(String),
    #[error("combination {target} must list exactly two source pairs, got {n}")]
    MalformedRecipe { target: String, n: usize },
    #[error("combination {target} refers to unknown pair {source_pair}")]
    UnknownPair { target: String, source_pair: String },
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

pub fn load_yaml<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_yaml(&text, &path.display().to_string())
}

pub fn parse_yaml<T: DeserializeOwned>(text: &str, origin: &str) -> Result<T, ConfigError> {
    serde_yaml_ng::from_str(text).map_err(|source| ConfigError::Yaml {
        path: origin.to_string(),
        source,
    })
}

/// Normalization window of a correlation function.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NormSpec {
    /// Full in-range yield.
    Yield,
    Range { min: f64, max: f64 },
}

impl NormSpec {
    pub fn from_value(value: &Value) -> Result<Self, ConfigError> {
        match value {
            Value::Null => Ok(NormSpec::Yield),
            Value::Sequence(items) if items.len() == 2 => {
                let min = items[0].as_f64();
                let max = items[1].as_f64();
                match (min, max) {
                    (Some(min), Some(max)) if min < max => Ok(NormSpec::Range { min, max }),
                    _ => Err(ConfigError::UnsupportedNorm(format!("{value:?}"))),
                }
            }
            other => Err(ConfigError::UnsupportedNorm(format!("{other:?}"))),
        }
    }

    pub fn bin_window(&self, axis: &Axis) -> (usize, usize) {
        match self {
            NormSpec::Yield => (1, axis.n_bins()),
            NormSpec::Range { min, max } => axis.bin_range_inclusive(*min, *max, EDGE_EPSILON),
        }
    }
}

impl fmt::Display for NormSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NormSpec::Yield => write!(f, "yield"),
            NormSpec::Range { min, max } => write!(f, "[{min}, {max}]"),
        }
    }
}

/// Which region set a combination iterates over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum RegionPolicy {
    /// Regions of the first source only.
    #[default]
    #[serde(rename = "first")]
    FirstSource,
    #[serde(rename = "union")]
    Union,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CombineRecipe {
    pub target: String,
    pub first: String,
    pub second: String,
}

pub fn default_recipes() -> Vec<CombineRecipe> {
    vec![
        CombineRecipe {
            target: "p02_13".to_string(),
            first: "p02".to_string(),
            second: "p13".to_string(),
        },
        CombineRecipe {
            target: "p03_12".to_string(),
            first: "p03".to_string(),
            second: "p12".to_string(),
        },
    ]
}

pub fn recipes_from_map(
    map: &BTreeMap<String, Vec<String>>,
) -> Result<Vec<CombineRecipe>, ConfigError> {
    map.iter()
        .map(|(target, sources)| match sources.as_slice() {
            [first, second] => Ok(CombineRecipe {
                target: target.clone(),
                first: first.clone(),
                second: second.clone(),
            }),
            _ => Err(ConfigError::MalformedRecipe {
                target: target.clone(),
                n: sources.len(),
            }),
        })
        .collect()
}

#[derive(Debug, Deserialize)]
struct RawCfFile {
    infile: PathBuf,
    odir: PathBuf,
    #[serde(default)]
    suffix: Value,
    #[serde(default)]
    runsuffix: Value,
    #[serde(default)]
    norm: Value,
    binwidth: f64,
    #[serde(default)]
    combine: Option<BTreeMap<String, Vec<String>>>,
    #[serde(default)]
    combine_regions: RegionPolicy,
    #[serde(default)]
    pairs: Option<Vec<String>>,
    #[serde(default)]
    regions: Option<Vec<String>>,
    #[serde(default)]
    femto_region: Option<[f64; 2]>,
}

#[derive(Debug, Clone)]
pub struct RawCfConfig {
    pub infile: PathBuf,
    pub odir: PathBuf,
    pub suffix: Option<String>,
    pub run_suffix: String,
    pub norm: NormSpec,
    pub binwidth_mev: f64,
    pub recipes: Vec<CombineRecipe>,
    pub region_policy: RegionPolicy,
    pub pairs: Vec<String>,
    pub regions: Vec<String>,
    pub femto_region: [f64; 2],
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

impl RawCfConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw: RawCfFile = load_yaml(path)?;
        Self::from_raw(raw)
    }

    #[cfg(test)]
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let raw: RawCfFile = parse_yaml(text, "<inline>")?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawCfFile) -> Result<Self, ConfigError> {
        let norm = NormSpec::from_value(&raw.norm)?;
        if !(raw.binwidth > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "binwidth must be positive, got {}",
                raw.binwidth
            )));
        }
        let recipes = match &raw.combine {
            Some(map) => recipes_from_map(map)?,
            None => default_recipes(),
        };
        let pairs = raw.pairs.unwrap_or_else(|| {
            ["p02", "p03", "p12", "p13"]
                .iter()
                .map(|s| s.to_string())
                .collect()
        });
        if let Some(recipe) = recipes.iter().find(|r| pairs.contains(&r.target)) {
            return Err(ConfigError::Invalid(format!(
                "combination target {} shadows an input pair",
                recipe.target
            )));
        }
        let femto_region = raw.femto_region.unwrap_or([0.0, 0.2]);
        if !(femto_region[0] < femto_region[1]) {
            return Err(ConfigError::Invalid(format!(
                "femto_region must be increasing, got {femto_region:?}"
            )));
        }
        Ok(Self {
            infile: raw.infile,
            odir: raw.odir,
            suffix: scalar_to_string(&raw.suffix),
            run_suffix: scalar_to_string(&raw.runsuffix).unwrap_or_default(),
            norm,
            binwidth_mev: raw.binwidth,
            recipes,
            region_policy: raw.combine_regions,
            pairs,
            regions: raw.regions.unwrap_or_else(|| vec!["sgn".to_string()]),
            femto_region,
        })
    }

    /// Every pair label written to the output: inputs first, then combinations.
    pub fn pair_order(&self) -> Vec<String> {
        let mut out = self.pairs.clone();
        out.extend(self.recipes.iter().map(|r| r.target.clone()));
        out
    }

    pub fn output_base_name(&self) -> String {
        match &self.suffix {
            Some(suffix) => format!("RawCF_{suffix}"),
            None => "RawCF".to_string(),
        }
    }

    pub fn output_path(&self) -> PathBuf {
        self.odir.join(format!("{}.json", self.output_base_name()))
    }
}

#[cfg(test)]
#[path = "../tests/src_inline/config.rs"]
mod tests;
