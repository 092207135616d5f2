//! Run configuration for the deduplication engine.
//!
//! A single `DedupeConfig` is built per invocation and handed to every stage.
//! Overrides can be supplied through a `meshdedupe.toml` file placed in the
//! asset root; any field left out keeps its default.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// File name looked up in the asset root by [`DedupeConfig::load_or_default`].
pub const DEFAULT_CONFIG_FILE: &str = "meshdedupe.toml";

/// How geometry files are enumerated before grouping.
///
/// The first file of each group in this order becomes the canonical one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ordering {
    /// Lexicographic by file name; reproducible across machines.
    #[default]
    Sorted,
    /// Whatever order the filesystem listing yields.
    Listing,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DedupeConfig {
    #[serde(skip)]
    pub root: PathBuf,
    pub mesh_dir: PathBuf,
    pub geometry_extension: String,
    pub sidecar_extensions: Vec<String>,
    pub descriptor_extension: String,
    /// Descriptor key whose value names a geometry file.
    pub mesh_key: String,
    /// Lines starting with any of these are ignored when comparing geometry.
    pub stripped_prefixes: Vec<String>,
    pub ordering: Ordering,
}

impl Default for DedupeConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::new(),
            mesh_dir: PathBuf::from("mesh"),
            geometry_extension: String::from("obj"),
            sidecar_extensions: vec![String::from("mtl")],
            descriptor_extension: String::from("txt"),
            mesh_key: String::from("mesh"),
            stripped_prefixes: vec![String::from("mtllib"), String::from("o ")],
            ordering: Ordering::Sorted,
        }
    }
}

impl DedupeConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    pub fn with_mesh_dir(mut self, mesh_dir: impl Into<PathBuf>) -> Self {
        self.mesh_dir = mesh_dir.into();
        self
    }

    pub fn with_geometry_extension(mut self, extension: impl Into<String>) -> Self {
        self.geometry_extension = extension.into();
        self
    }

    pub fn with_sidecar_extensions(mut self, extensions: Vec<String>) -> Self {
        self.sidecar_extensions = extensions;
        self
    }

    pub fn with_ordering(mut self, ordering: Ordering) -> Self {
        self.ordering = ordering;
        self
    }

    /// Directory that holds the geometry files.
    pub fn mesh_path(&self) -> PathBuf {
        self.root.join(&self.mesh_dir)
    }

    /// Loads overrides from a TOML file. `root` is not part of the file and
    /// stays empty until set with [`DedupeConfig::with_root`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            source,
            path: path.to_path_buf(),
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            source,
            path: path.to_path_buf(),
        })
    }

    /// Uses `<root>/meshdedupe.toml` when it exists, defaults otherwise.
    pub fn load_or_default(root: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let root = root.into();
        let candidate = root.join(DEFAULT_CONFIG_FILE);
        if candidate.is_file() {
            log::debug!("loading configuration from {}", candidate.display());
            return Self::load(&candidate).map(|config| config.with_root(root));
        }
        Ok(Self::new(root))
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io {
        source: std::io::Error,
        path: PathBuf,
    },
    Parse {
        source: toml::de::Error,
        path: PathBuf,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { source, path } => {
                write!(f, "failed to read config {}: {}", path.display(), source)
            }
            Self::Parse { source, path } => {
                write!(f, "invalid config TOML in {}: {}", path.display(), source)
            }
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
        }
    }
}
