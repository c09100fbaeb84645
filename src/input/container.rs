use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::model::{Function, Graph, Hist1D, Hist2D, Observable};

#[derive(Debug, Error)]
pub enum ContainerError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed container {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("the container {container} does not contain an object named {segment} (path {path})")]
    MissingObject {
        container: String,
        path: String,
        segment: String,
    },
    #[error("{path} in {container} is not a directory")]
    NotADirectory { container: String, path: String },
    #[error("{path} is a {found}, expected a {expected}")]
    TypeMismatch {
        path: String,
        expected: &'static str,
        found: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Directory {
    #[serde(default)]
    pub entries: BTreeMap<String, Object>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Object {
    Dir(Directory),
    Th1(Hist1D),
    Th2(Hist2D),
    Graph(Graph),
    GraphAsymm(Graph),
    Function(Function),
}

impl Object {
    pub fn kind(&self) -> &'static str {
        match self {
            Object::Dir(_) => "directory",
            Object::Th1(_) => "1D histogram",
            Object::Th2(_) => "2D histogram",
            Object::Graph(_) => "graph",
            Object::GraphAsymm(_) => "asymmetric-error graph",
            Object::Function(_) => "function",
        }
    }

    pub fn is_hist(&self) -> bool {
        matches!(self, Object::Th1(_) | Object::Th2(_))
    }

    pub fn is_graph(&self) -> bool {
        matches!(self, Object::Graph(_) | Object::GraphAsymm(_))
    }

    /// Converts to the comparator view; directories and 2D spectra have none.
    pub fn to_observable(&self) -> Option<Observable> {
        match self {
            Object::Th1(h) => Some(Observable::Binned(h.clone())),
            Object::Graph(g) => Some(Observable::Graph(g.clone())),
            Object::GraphAsymm(g) => Some(Observable::AsymmGraph(g.clone())),
            Object::Function(f) => Some(Observable::Function(f.clone())),
            Object::Dir(_) | Object::Th2(_) => None,
        }
    }
}

impl From<Observable> for Object {
    fn from(value: Observable) -> Self {
        match value {
            Observable::Binned(h) => Object::Th1(h),
            Observable::Graph(g) => Object::Graph(g),
            Observable::AsymmGraph(g) => Object::GraphAsymm(g),
            Observable::Function(f) => Object::Function(f),
        }
    }
}

impl Directory {
    pub fn key_names(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    pub fn subdir_names(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(_, obj)| matches!(obj, Object::Dir(_)))
            .map(|(name, _)| name.as_str())
            .collect()
    }

    pub fn objects_in_dir(&self) -> Vec<(&str, &Object)> {
        self.entries
            .iter()
            .filter(|(_, obj)| !matches!(obj, Object::Dir(_)))
            .map(|(name, obj)| (name.as_str(), obj))
            .collect()
    }

    pub fn hists_in_dir(&self) -> Vec<(&str, &Object)> {
        self.objects_in_dir()
            .into_iter()
            .filter(|(_, obj)| obj.is_hist())
            .collect()
    }

    pub fn graphs_in_dir(&self) -> Vec<(&str, &Object)> {
        self.objects_in_dir()
            .into_iter()
            .filter(|(_, obj)| obj.is_graph())
            .collect()
    }
}

/// Hierarchical object store: directories of named spectra, graphs and functions.
#[derive(Debug, Clone, PartialEq)]
pub struct Container {
    pub name: String,
    pub root: Directory,
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty() && *s != ".")
}

fn is_gz(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "gz")
}

impl Container {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            root: Directory::default(),
        }
    }

    pub fn open(path: &Path) -> Result<Self, ContainerError> {
        let name = path.display().to_string();
        let file = File::open(path).map_err(|source| ContainerError::Io {
            path: name.clone(),
            source,
        })?;
        let reader: Box<dyn Read> = if is_gz(path) {
            Box::new(GzDecoder::new(file))
        } else {
            Box::new(file)
        };
        let root: Directory = serde_json::from_reader(BufReader::new(reader)).map_err(
            |source| ContainerError::Json {
                path: name.clone(),
                source,
            },
        )?;
        debug!("opened container {} ({} top-level keys)", name, root.entries.len());
        Ok(Self { name, root })
    }

    pub fn save(&self, path: &Path) -> Result<(), ContainerError> {
        let name = path.display().to_string();
        let io_err = |source| ContainerError::Io {
            path: name.clone(),
            source,
        };
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(io_err)?;
            }
        }
        let json_err = |source| ContainerError::Json {
            path: name.clone(),
            source,
        };
        let mut writer = BufWriter::new(File::create(path).map_err(io_err)?);
        if is_gz(path) {
            let mut encoder = GzEncoder::new(&mut writer, Compression::default());
            serde_json::to_writer(&mut encoder, &self.root).map_err(json_err)?;
            encoder.finish().map_err(io_err)?;
        } else {
            serde_json::to_writer(&mut writer, &self.root).map_err(json_err)?;
        }
        writer.flush().map_err(io_err)?;
        Ok(())
    }

    /// Resolves `path` segment by segment; `None` as soon as one is missing.
    pub fn get(&self, path: &str) -> Option<&Object> {
        let mut dir = &self.root;
        let mut found: Option<&Object> = None;
        for segment in segments(path) {
            if found.is_some() {
                match found {
                    Some(Object::Dir(d)) => dir = d,
                    _ => return None,
                }
            }
            found = Some(dir.entries.get(segment)?);
        }
        found
    }

    pub fn contains(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    /// Like [`Container::get`] but reports the first missing segment.
    pub fn load(&self, path: &str) -> Result<&Object, ContainerError> {
        let mut dir = &self.root;
        let mut walked = String::new();
        let mut found: Option<&Object> = None;
        for segment in segments(path) {
            if let Some(obj) = found {
                match obj {
                    Object::Dir(d) => dir = d,
                    _ => {
                        return Err(ContainerError::NotADirectory {
                            container: self.name.clone(),
                            path: walked,
                        });
                    }
                }
            }
            debug!(
                "trying to load {}:{}; available keys: {:?}",
                self.name,
                segment,
                dir.key_names()
            );
            let obj = dir
                .entries
                .get(segment)
                .ok_or_else(|| ContainerError::MissingObject {
                    container: self.name.clone(),
                    path: path.to_string(),
                    segment: segment.to_string(),
                })?;
            if !walked.is_empty() {
                walked.push('/');
            }
            walked.push_str(segment);
            found = Some(obj);
        }
        found.ok_or_else(|| ContainerError::MissingObject {
            container: self.name.clone(),
            path: path.to_string(),
            segment: String::new(),
        })
    }

    pub fn dir(&self, path: &str) -> Result<&Directory, ContainerError> {
        if segments(path).next().is_none() {
            return Ok(&self.root);
        }
        match self.load(path)? {
            Object::Dir(d) => Ok(d),
            other => Err(ContainerError::TypeMismatch {
                path: path.to_string(),
                expected: "directory",
                found: other.kind(),
            }),
        }
    }

    pub fn load_th1(&self, path: &str) -> Result<&Hist1D, ContainerError> {
        match self.load(path)? {
            Object::Th1(h) => Ok(h),
            other => Err(type_mismatch(path, "1D histogram", other)),
        }
    }

    pub fn load_th2(&self, path: &str) -> Result<&Hist2D, ContainerError> {
        match self.load(path)? {
            Object::Th2(h) => Ok(h),
            other => Err(type_mismatch(path, "2D histogram", other)),
        }
    }

    pub fn load_function(&self, path: &str) -> Result<&Function, ContainerError> {
        match self.load(path)? {
            Object::Function(f) => Ok(f),
            other => Err(type_mismatch(path, "function", other)),
        }
    }

    pub fn mkdir(&mut self, path: &str) -> Result<&mut Directory, ContainerError> {
        let mut dir = &mut self.root;
        let mut walked = String::new();
        for segment in segments(path) {
            if !walked.is_empty() {
                walked.push('/');
            }
            walked.push_str(segment);
            let entry = dir
                .entries
                .entry(segment.to_string())
                .or_insert_with(|| Object::Dir(Directory::default()));
            dir = match entry {
                Object::Dir(d) => d,
                _ => {
                    return Err(ContainerError::NotADirectory {
                        container: self.name.clone(),
                        path: walked,
                    });
                }
            };
        }
        Ok(dir)
    }

    /// Stores `obj` at `path`, creating intermediate directories. An existing
    /// object with the same name is replaced.
    pub fn insert(&mut self, path: &str, obj: Object) -> Result<(), ContainerError> {
        let (parent, name) = match path.trim_end_matches('/').rsplit_once('/') {
            Some((parent, name)) => (parent, name),
            None => ("", path.trim_end_matches('/')),
        };
        if name.is_empty() {
            return Err(ContainerError::MissingObject {
                container: self.name.clone(),
                path: path.to_string(),
                segment: String::new(),
            });
        }
        let dir = self.mkdir(parent)?;
        dir.entries.insert(name.to_string(), obj);
        Ok(())
    }
}

fn type_mismatch(path: &str, expected: &'static str, found: &Object) -> ContainerError {
    ContainerError::TypeMismatch {
        path: path.to_string(),
        expected,
        found: found.kind(),
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/input/container.rs"]
mod tests;
