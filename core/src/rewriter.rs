//! Descriptor reference rewriting.
//!
//! Descriptors are `key: value` text records written next to the mesh
//! directory. Only the mesh record may change; every other byte of a
//! descriptor, line endings included, is carried over unchanged. Files whose
//! content would not change are never written.

use crate::canonical::CanonicalMapping;
use crate::config::DedupeConfig;
use crate::reporting::StatusEvent;
use indicatif::ProgressBar;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use walkdir::WalkDir;

#[derive(Debug, Default)]
pub struct RewriteStats {
    pub scanned: usize,
    pub updated: Vec<PathBuf>,
}

/// Extracts the geometry file named by a mesh record.
///
/// `mesh: rock_002.obj` yields `rock_002.obj`. Anything following the
/// geometry extension is ignored, and a value without the extension is not a
/// reference at all.
pub fn referenced_geometry<'a>(line: &'a str, config: &DedupeConfig) -> Option<&'a str> {
    let value = line
        .strip_prefix(config.mesh_key.as_str())?
        .strip_prefix(':')?;
    let value = value.split(':').next().unwrap_or_default().trim();
    let suffix = format!(".{}", config.geometry_extension);
    let end = value.find(&suffix)? + suffix.len();
    let name = &value[..end];
    if name.len() == suffix.len() {
        return None;
    }
    Some(name)
}

/// Returns the rewritten descriptor text, or `None` when no record changed.
pub fn rewrite_descriptor_text(
    content: &str,
    config: &DedupeConfig,
    mapping: &CanonicalMapping,
) -> Option<String> {
    let mut output = String::with_capacity(content.len());
    let mut modified = false;

    for line in content.split_inclusive('\n') {
        let (body, terminator) = split_terminator(line);
        let replacement = referenced_geometry(body, config)
            .and_then(|name| mapping.canonical_for(name))
            .map(|canonical| format!("{}: {}", config.mesh_key, canonical));

        match replacement {
            Some(updated) if updated != body => {
                output.push_str(&updated);
                output.push_str(terminator);
                modified = true;
            }
            _ => output.push_str(line),
        }
    }

    modified.then_some(output)
}

/// Descriptor files directly under the asset root, sorted by name.
pub fn list_descriptors(config: &DedupeConfig) -> Result<Vec<PathBuf>, RewriteError> {
    let mut descriptors = Vec::new();
    for entry in WalkDir::new(&config.root)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(RewriteError::Walk)?;
        let path = entry.path();
        let matches_extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext == config.descriptor_extension)
            .unwrap_or(false);
        if matches_extension && path.is_file() {
            descriptors.push(path.to_path_buf());
        }
    }
    Ok(descriptors)
}

/// Points every descriptor that names a superseded geometry file at its
/// canonical replacement. `on_status` sees each rewrite as soon as it is on
/// disk, so a later failure cannot hide it.
pub fn rewrite_descriptors(
    config: &DedupeConfig,
    mapping: &CanonicalMapping,
    progress_bar: &ProgressBar,
    on_status: &mut dyn FnMut(StatusEvent),
) -> Result<RewriteStats, RewriteError> {
    let descriptors = list_descriptors(config)?;
    progress_bar.set_length(descriptors.len() as u64);

    let mut stats = RewriteStats::default();
    for path in descriptors {
        stats.scanned += 1;
        progress_bar.inc(1);
        if mapping.is_empty() {
            continue;
        }

        let content = fs::read_to_string(&path).map_err(|source| RewriteError::Io {
            source,
            path: path.clone(),
        })?;
        if let Some(updated) = rewrite_descriptor_text(&content, config, mapping) {
            write_atomically(&path, &updated)?;
            log::info!("updated references in {}", path.display());
            progress_bar.set_message(format!("Updated: {}", path.display()));
            on_status(StatusEvent::DescriptorUpdated(path.clone()));
            stats.updated.push(path);
        }
    }

    Ok(stats)
}

/// Replaces `path` through a temporary sibling so a crash never leaves a
/// truncated descriptor behind. The replacement keeps the original's
/// permissions.
fn write_atomically(path: &Path, contents: &str) -> Result<(), RewriteError> {
    let io_error = |source| RewriteError::Io {
        source,
        path: path.to_path_buf(),
    };
    let permissions = fs::metadata(path).map_err(io_error)?.permissions();
    let directory = path.parent().unwrap_or_else(|| Path::new("."));
    let mut file = NamedTempFile::new_in(directory).map_err(io_error)?;
    file.as_file().set_permissions(permissions).map_err(io_error)?;
    file.write_all(contents.as_bytes()).map_err(io_error)?;
    file.as_file().sync_all().map_err(io_error)?;
    file.persist(path).map_err(|error| io_error(error.error))?;
    Ok(())
}

fn split_terminator(line: &str) -> (&str, &str) {
    let body = line.strip_suffix('\n').unwrap_or(line);
    let body = body.strip_suffix('\r').unwrap_or(body);
    (body, &line[body.len()..])
}

#[derive(Debug)]
pub enum RewriteError {
    Io {
        source: std::io::Error,
        path: PathBuf,
    },
    Walk(walkdir::Error),
}

impl Display for RewriteError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { source, path } => {
                write!(f, "failed to rewrite {}: {}", path.display(), source)
            }
            Self::Walk(error) => write!(f, "failed to list descriptors: {}", error),
        }
    }
}

impl Error for RewriteError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Walk(error) => Some(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canonical::{build_mapping, CanonicalChoice};
    use tempfile::tempdir;

    fn mapping() -> CanonicalMapping {
        build_mapping(&[CanonicalChoice {
            canonical: String::from("rock_001.obj"),
            removable: vec![String::from("rock_002.obj")],
        }])
    }

    const ROCK_A: &str = "type: mesh\nname: Rock.A\nmesh: rock_002.obj\nlocation: 1.000000 0.000000 -2.500000\nrotation: 0.000000 1.570796 0.000000\nscale: 1.000000 1.000000 1.000000\n";

    #[test]
    fn extracts_referenced_geometry() {
        let config = DedupeConfig::default();
        assert_eq!(referenced_geometry("mesh: rock.obj", &config), Some("rock.obj"));
        assert_eq!(referenced_geometry("mesh:rock.obj  ", &config), Some("rock.obj"));
        assert_eq!(referenced_geometry("mesh: rock.obj.bak", &config), Some("rock.obj"));
        assert_eq!(referenced_geometry("mesh: rock", &config), None);
        assert_eq!(referenced_geometry("mesh: .obj", &config), None);
        assert_eq!(referenced_geometry("name: rock.obj", &config), None);
        assert_eq!(referenced_geometry(" mesh: rock.obj", &config), None);
        assert_eq!(referenced_geometry("meshes: rock.obj", &config), None);
    }

    #[test]
    fn rewrites_only_the_mesh_record() {
        let config = DedupeConfig::default();
        let updated = rewrite_descriptor_text(ROCK_A, &config, &mapping()).unwrap();
        assert_eq!(updated, ROCK_A.replace("mesh: rock_002.obj", "mesh: rock_001.obj"));
    }

    #[test]
    fn keeps_crlf_terminators() {
        let config = DedupeConfig::default();
        let content = "type: mesh\r\nmesh: rock_002.obj\r\nname: R\r\n";
        let updated = rewrite_descriptor_text(content, &config, &mapping()).unwrap();
        assert_eq!(updated, "type: mesh\r\nmesh: rock_001.obj\r\nname: R\r\n");
    }

    #[test]
    fn rewrites_final_record_without_newline() {
        let config = DedupeConfig::default();
        let updated =
            rewrite_descriptor_text("type: mesh\nmesh: rock_002.obj", &config, &mapping()).unwrap();
        assert_eq!(updated, "type: mesh\nmesh: rock_001.obj");
    }

    #[cfg(unix)]
    #[test]
    fn rewritten_descriptor_keeps_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let config = DedupeConfig::new(dir.path());
        let rock_a = dir.path().join("rock_a.txt");
        fs::write(&rock_a, ROCK_A).unwrap();
        fs::set_permissions(&rock_a, fs::Permissions::from_mode(0o644)).unwrap();

        let stats =
            rewrite_descriptors(&config, &mapping(), &ProgressBar::hidden(), &mut |_| {}).unwrap();

        assert_eq!(stats.updated, vec![rock_a.clone()]);
        let mode = fs::metadata(&rock_a).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o644);
    }

    #[test]
    fn unaffected_descriptors_are_left_alone() {
        let config = DedupeConfig::default();
        let light = "type: light\nlight_type: point\nname: Lamp\ncolor: 255 200 120\nstrength: 40\n";
        let canonical = "type: mesh\nmesh: rock_001.obj\n";
        assert!(rewrite_descriptor_text(light, &config, &mapping()).is_none());
        assert!(rewrite_descriptor_text(canonical, &config, &mapping()).is_none());
        assert!(rewrite_descriptor_text("mesh rock_002.obj\n", &config, &mapping()).is_none());
    }

    #[test]
    fn rewrites_files_on_disk_and_skips_untouched_ones() {
        let dir = tempdir().unwrap();
        let config = DedupeConfig::new(dir.path());
        let rock_a = dir.path().join("rock_a.txt");
        let lamp = dir.path().join("lamp.txt");
        let notes = dir.path().join("notes.md");
        fs::write(&rock_a, ROCK_A).unwrap();
        fs::write(&lamp, "type: light\nname: Lamp\n").unwrap();
        fs::write(&notes, "mesh: rock_002.obj\n").unwrap();
        let lamp_modified = fs::metadata(&lamp).unwrap().modified().unwrap();

        let mut events = Vec::new();
        let stats = rewrite_descriptors(&config, &mapping(), &ProgressBar::hidden(), &mut |event| {
            events.push(event)
        })
        .unwrap();

        assert_eq!(events, vec![StatusEvent::DescriptorUpdated(rock_a.clone())]);
        assert_eq!(stats.scanned, 2);
        assert_eq!(stats.updated, vec![rock_a.clone()]);
        assert_eq!(
            fs::read_to_string(&rock_a).unwrap(),
            ROCK_A.replace("rock_002", "rock_001")
        );
        assert_eq!(fs::read_to_string(&notes).unwrap(), "mesh: rock_002.obj\n");
        assert_eq!(
            fs::metadata(&lamp).unwrap().modified().unwrap(),
            lamp_modified
        );
        let leftovers = fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(leftovers, 3);
    }

    #[test]
    fn empty_mapping_writes_nothing() {
        let dir = tempdir().unwrap();
        let config = DedupeConfig::new(dir.path());
        fs::write(dir.path().join("rock_a.txt"), ROCK_A).unwrap();

        let stats = rewrite_descriptors(
            &config,
            &CanonicalMapping::default(),
            &ProgressBar::hidden(),
            &mut |_| {},
        )
        .unwrap();
        assert_eq!(stats.scanned, 1);
        assert!(stats.updated.is_empty());
    }
}
