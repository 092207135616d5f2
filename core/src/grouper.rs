use crate::config::{DedupeConfig, Ordering};
use crate::normalizer::{content_digest, normalize_file, ContentDigest};
use indicatif::ProgressBar;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Geometry files sharing identical normalized content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquivalenceClass {
    pub digest: ContentDigest,
    /// File names inside the mesh directory, in enumeration order.
    pub members: Vec<String>,
}

impl EquivalenceClass {
    pub fn is_duplicate_group(&self) -> bool {
        self.members.len() > 1
    }
}

/// Every class found in one mesh directory, singletons included.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GroupingSummary {
    pub classes: Vec<EquivalenceClass>,
}

impl GroupingSummary {
    pub fn duplicate_groups(&self) -> impl Iterator<Item = &EquivalenceClass> {
        self.classes.iter().filter(|class| class.is_duplicate_group())
    }

    pub fn into_duplicate_groups(self) -> Vec<EquivalenceClass> {
        self.classes
            .into_iter()
            .filter(EquivalenceClass::is_duplicate_group)
            .collect()
    }

    pub fn file_count(&self) -> usize {
        self.classes.iter().map(|class| class.members.len()).sum()
    }
}

/// Lists geometry file names directly inside the mesh directory.
pub fn list_geometry_files(config: &DedupeConfig) -> Result<Vec<String>, GroupingError> {
    let mut walker = WalkDir::new(config.mesh_path()).min_depth(1).max_depth(1);
    if config.ordering == Ordering::Sorted {
        walker = walker.sort_by_file_name();
    }

    let mut names = Vec::new();
    for entry in walker {
        let entry = entry.map_err(GroupingError::Walk)?;
        let path = entry.path();
        if !path.is_file() || !has_extension(path, &config.geometry_extension) {
            continue;
        }
        match entry.file_name().to_str() {
            Some(name) => names.push(name.to_string()),
            None => log::warn!("skipping non UTF-8 file name {}", path.display()),
        }
    }
    Ok(names)
}

pub fn find_equivalence_classes(
    config: &DedupeConfig,
    progress_bar: &ProgressBar,
) -> Result<GroupingSummary, GroupingError> {
    let mesh_dir = config.mesh_path();
    let names = list_geometry_files(config)?;
    progress_bar.set_length(names.len() as u64);

    let mut classes: Vec<ClassState> = Vec::new();
    let mut buckets: FxHashMap<ContentDigest, Vec<usize>> = FxHashMap::default();
    for name in names {
        progress_bar.set_message(format!("Normalizing: {}", name));
        let path = mesh_dir.join(&name);
        let normalized = read_normalized(&path, config)?;
        let digest = content_digest(&normalized);
        insert_file(
            &mut classes,
            &mut buckets,
            &mesh_dir,
            config,
            name,
            digest,
            &normalized,
        )?;
        progress_bar.inc(1);
    }

    Ok(GroupingSummary {
        classes: classes
            .into_iter()
            .map(|state| EquivalenceClass {
                digest: state.digest,
                members: state.members,
            })
            .collect(),
    })
}

/// Classes with at least two members, in order of first appearance.
pub fn find_duplicate_groups(
    config: &DedupeConfig,
    progress_bar: &ProgressBar,
) -> Result<Vec<EquivalenceClass>, GroupingError> {
    find_equivalence_classes(config, progress_bar).map(GroupingSummary::into_duplicate_groups)
}

fn insert_file(
    classes: &mut Vec<ClassState>,
    buckets: &mut FxHashMap<ContentDigest, Vec<usize>>,
    mesh_dir: &Path,
    config: &DedupeConfig,
    name: String,
    digest: ContentDigest,
    normalized: &str,
) -> Result<(), GroupingError> {
    if let Some(indices) = buckets.get(&digest) {
        for &index in indices {
            // The digest only narrows the search; equal text decides membership.
            let representative = mesh_dir.join(&classes[index].members[0]);
            if read_normalized(&representative, config)? == normalized {
                log::debug!("{} matches {}", name, classes[index].members[0]);
                classes[index].members.push(name);
                return Ok(());
            }
        }
        log::debug!("digest collision for {} without matching content", name);
    }

    let index = classes.len();
    classes.push(ClassState {
        digest,
        members: vec![name],
    });
    buckets.entry(digest).or_default().push(index);
    Ok(())
}

fn read_normalized(path: &Path, config: &DedupeConfig) -> Result<String, GroupingError> {
    normalize_file(path, &config.stripped_prefixes).map_err(|source| GroupingError::Io {
        source,
        path: path.to_path_buf(),
    })
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext == extension)
        .unwrap_or(false)
}

struct ClassState {
    digest: ContentDigest,
    members: Vec<String>,
}

#[derive(Debug)]
pub enum GroupingError {
    Io {
        source: std::io::Error,
        path: PathBuf,
    },
    Walk(walkdir::Error),
}

impl Display for GroupingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { source, path } => {
                write!(f, "failed to read geometry {}: {}", path.display(), source)
            }
            Self::Walk(error) => write!(f, "failed to list mesh directory: {}", error),
        }
    }
}

impl Error for GroupingError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Walk(error) => Some(error),
        }
    }
}
