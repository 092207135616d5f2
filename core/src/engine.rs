//! Plan, rewrite, delete.
//!
//! The whole mapping is computed before anything on disk changes. Descriptors
//! are then rewritten, and only after every one of them points at a canonical
//! file are the superseded geometry files removed. Interrupting a run before
//! the deletion phase leaves a consistent pre-dedup tree; interrupting it
//! afterwards leaves a consistent post-dedup tree.
//!
//! Running two invocations against the same asset root at the same time is
//! not supported.

use crate::canonical::{build_mapping, select_canonical, CanonicalChoice, CanonicalMapping};
use crate::cleanup::{remove_duplicates, CleanupError};
use crate::config::DedupeConfig;
use crate::grouper::{find_duplicate_groups, GroupingError};
use crate::progress::start_phase;
use crate::reporting::StatusEvent;
use crate::rewriter::{rewrite_descriptors, RewriteError};
use indicatif::ProgressBar;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

/// Everything the run will do, decided before any mutation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DedupePlan {
    pub mesh_dir: PathBuf,
    pub groups: Vec<CanonicalChoice>,
    pub mapping: CanonicalMapping,
}

impl DedupePlan {
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn duplicate_count(&self) -> usize {
        self.mapping.len()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DedupeOutcome {
    pub plan: DedupePlan,
    pub descriptors_scanned: usize,
    pub updated_descriptors: Vec<PathBuf>,
    pub removed_geometry: Vec<String>,
    pub removed_sidecars: Vec<String>,
}

impl DedupeOutcome {
    fn unchanged(plan: DedupePlan) -> Self {
        Self {
            plan,
            ..Self::default()
        }
    }

    pub fn is_noop(&self) -> bool {
        self.updated_descriptors.is_empty()
            && self.removed_geometry.is_empty()
            && self.removed_sidecars.is_empty()
    }
}

/// Validates the asset root and groups its geometry files. Never mutates.
pub fn plan(
    config: &DedupeConfig,
    progress_bar: &ProgressBar,
) -> Result<DedupePlan, DedupeError> {
    if !config.root.exists() {
        return Err(DedupeError::InvalidRoot(config.root.clone()));
    }
    let mesh_dir = config.mesh_path();
    if !mesh_dir.is_dir() {
        return Err(DedupeError::MissingMeshDirectory(mesh_dir));
    }

    start_phase(progress_bar, "grouping", 0);
    let groups: Vec<CanonicalChoice> = find_duplicate_groups(config, progress_bar)?
        .iter()
        .filter_map(select_canonical)
        .collect();
    for group in &groups {
        log::debug!(
            "keeping {} over {}",
            group.canonical,
            group.removable.join(", ")
        );
    }
    let mapping = build_mapping(&groups);

    Ok(DedupePlan {
        mesh_dir,
        groups,
        mapping,
    })
}

/// Rewrites every descriptor, then deletes the superseded files.
///
/// `on_status` is called after each mutation, so the caller can report
/// progress that already reached the disk even when a later step fails.
pub fn apply(
    config: &DedupeConfig,
    plan: DedupePlan,
    progress_bar: &ProgressBar,
    on_status: &mut dyn FnMut(StatusEvent),
) -> Result<DedupeOutcome, DedupeError> {
    if plan.is_empty() {
        return Ok(DedupeOutcome::unchanged(plan));
    }

    start_phase(progress_bar, "rewriting", 0);
    let rewrite = rewrite_descriptors(config, &plan.mapping, progress_bar, on_status)?;

    start_phase(progress_bar, "cleanup", plan.mapping.len() as u64);
    let cleanup = remove_duplicates(
        &plan.mesh_dir,
        &plan.mapping,
        &config.sidecar_extensions,
        progress_bar,
        on_status,
    )?;

    Ok(DedupeOutcome {
        plan,
        descriptors_scanned: rewrite.scanned,
        updated_descriptors: rewrite.updated,
        removed_geometry: cleanup.removed_geometry,
        removed_sidecars: cleanup.removed_sidecars,
    })
}

pub fn run(
    config: &DedupeConfig,
    progress_bar: &ProgressBar,
) -> Result<DedupeOutcome, DedupeError> {
    let plan = plan(config, progress_bar)?;
    apply(config, plan, progress_bar, &mut |_| {})
}

#[derive(Debug)]
pub enum DedupeError {
    InvalidRoot(PathBuf),
    MissingMeshDirectory(PathBuf),
    Grouping(GroupingError),
    Rewrite(RewriteError),
    Cleanup(CleanupError),
}

impl DedupeError {
    /// True when the run stopped before touching the filesystem.
    pub fn is_precondition(&self) -> bool {
        matches!(self, Self::InvalidRoot(_) | Self::MissingMeshDirectory(_))
    }
}

impl Display for DedupeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidRoot(path) => write!(f, "path does not exist: {}", path.display()),
            Self::MissingMeshDirectory(path) => {
                write!(f, "mesh folder not found: {}", path.display())
            }
            Self::Grouping(error) => write!(f, "grouping failed: {}", error),
            Self::Rewrite(error) => write!(f, "reference rewrite failed: {}", error),
            Self::Cleanup(error) => write!(f, "cleanup failed: {}", error),
        }
    }
}

impl Error for DedupeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Grouping(error) => Some(error),
            Self::Rewrite(error) => Some(error),
            Self::Cleanup(error) => Some(error),
            _ => None,
        }
    }
}

impl From<GroupingError> for DedupeError {
    fn from(error: GroupingError) -> Self {
        Self::Grouping(error)
    }
}

impl From<RewriteError> for DedupeError {
    fn from(error: RewriteError) -> Self {
        Self::Rewrite(error)
    }
}

impl From<CleanupError> for DedupeError {
    fn from(error: CleanupError) -> Self {
        Self::Cleanup(error)
    }
}
