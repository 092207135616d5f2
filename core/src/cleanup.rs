use crate::canonical::CanonicalMapping;
use crate::reporting::StatusEvent;
use indicatif::ProgressBar;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

#[derive(Debug, Default)]
pub struct CleanupStats {
    pub removed_geometry: Vec<String>,
    pub removed_sidecars: Vec<String>,
}

#[derive(Debug)]
pub enum CleanupError {
    Io {
        source: std::io::Error,
        path: PathBuf,
    },
}

impl Display for CleanupError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { source, path } => {
                write!(f, "failed to remove {}: {}", path.display(), source)
            }
        }
    }
}

impl Error for CleanupError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
        }
    }
}

/// Deletes every superseded geometry file and the sidecars sharing its stem.
///
/// Must only run once all descriptors point at canonical files. Targets that
/// are already gone are skipped, so an interrupted run can simply be repeated.
pub fn remove_duplicates(
    mesh_dir: &Path,
    mapping: &CanonicalMapping,
    sidecar_extensions: &[String],
    progress_bar: &ProgressBar,
    on_status: &mut dyn FnMut(StatusEvent),
) -> Result<CleanupStats, CleanupError> {
    let mut stats = CleanupStats::default();
    for (removable, canonical) in mapping.iter() {
        if remove_if_present(&mesh_dir.join(removable))? {
            log::info!("removed duplicate {}", removable);
            on_status(StatusEvent::DuplicateRemoved(removable.to_string()));
            stats.removed_geometry.push(removable.to_string());
        }
        progress_bar.inc(1);
        progress_bar.set_message(format!("Removed: {}", removable));

        let removable_stem = file_stem(removable);
        if removable_stem == file_stem(canonical) {
            continue;
        }
        for extension in sidecar_extensions {
            let sidecar = format!("{}.{}", removable_stem, extension);
            if remove_if_present(&mesh_dir.join(&sidecar))? {
                log::info!("removed sidecar {}", sidecar);
                on_status(StatusEvent::SidecarRemoved(sidecar.clone()));
                stats.removed_sidecars.push(sidecar);
            }
        }
    }
    Ok(stats)
}

fn remove_if_present(path: &Path) -> Result<bool, CleanupError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(error) if error.kind() == ErrorKind::NotFound => {
            log::warn!("{} already absent", path.display());
            Ok(false)
        }
        Err(source) => Err(CleanupError::Io {
            source,
            path: path.to_path_buf(),
        }),
    }
}

fn file_stem(name: &str) -> &str {
    Path::new(name)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(name)
}
