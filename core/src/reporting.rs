use crate::engine::{DedupeOutcome, DedupePlan};
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// One filesystem mutation, emitted right after it happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusEvent {
    DescriptorUpdated(PathBuf),
    DuplicateRemoved(String),
    SidecarRemoved(String),
}

impl Display for StatusEvent {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DescriptorUpdated(path) => {
                let name = path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string());
                write!(f, "Updated references in {}", name)
            }
            Self::DuplicateRemoved(name) => write!(f, "Removed duplicate: {}", name),
            Self::SidecarRemoved(name) => write!(f, "Removed associated sidecar file: {}", name),
        }
    }
}

pub fn plan_lines(plan: &DedupePlan) -> Vec<String> {
    if plan.is_empty() {
        return vec![String::from("No duplicate geometry files found.")];
    }

    let mut lines = Vec::new();
    for group in &plan.groups {
        lines.push(format!("Keeping {} as canonical version", group.canonical));
        for duplicate in &group.removable {
            lines.push(format!("  duplicate: {}", duplicate));
        }
    }
    lines
}

/// Summary printed once every mutation has been reported.
pub fn outcome_lines(outcome: &DedupeOutcome) -> Vec<String> {
    if outcome.plan.is_empty() {
        return Vec::new();
    }
    vec![format!(
        "Deduplication complete: {} groups, {} duplicates removed, {} descriptors updated",
        outcome.plan.groups.len(),
        outcome.removed_geometry.len(),
        outcome.updated_descriptors.len()
    )]
}

pub fn print_scan_start(mesh_dir: &Path) {
    println!("Finding duplicate geometry files in {}...", mesh_dir.display());
}

pub fn print_plan(plan: &DedupePlan) {
    for line in plan_lines(plan) {
        println!("{}", line);
    }
    println!();
}

pub fn print_status(event: &StatusEvent) {
    println!("{}", event);
}

pub fn print_outcome(outcome: &DedupeOutcome) {
    for line in outcome_lines(outcome) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canonical::{build_mapping, CanonicalChoice};

    fn rock_plan() -> DedupePlan {
        let groups = vec![CanonicalChoice {
            canonical: String::from("rock_001.obj"),
            removable: vec![String::from("rock_002.obj")],
        }];
        let mapping = build_mapping(&groups);
        DedupePlan {
            mesh_dir: PathBuf::from("assets/mesh"),
            groups,
            mapping,
        }
    }

    #[test]
    fn empty_plan_reports_nothing_to_do() {
        assert_eq!(
            plan_lines(&DedupePlan::default()),
            vec!["No duplicate geometry files found."]
        );
        assert!(outcome_lines(&DedupeOutcome::default()).is_empty());
    }

    #[test]
    fn plan_lists_canonical_then_duplicates() {
        assert_eq!(
            plan_lines(&rock_plan()),
            vec!["Keeping rock_001.obj as canonical version", "  duplicate: rock_002.obj"]
        );
    }

    #[test]
    fn outcome_reports_summary() {
        let outcome = DedupeOutcome {
            plan: rock_plan(),
            descriptors_scanned: 3,
            updated_descriptors: vec![PathBuf::from("assets/rock_a.txt")],
            removed_geometry: vec![String::from("rock_002.obj")],
            removed_sidecars: vec![String::from("rock_002.mtl")],
        };
        assert_eq!(
            outcome_lines(&outcome),
            vec!["Deduplication complete: 1 groups, 1 duplicates removed, 1 descriptors updated"]
        );
    }

    #[test]
    fn status_events_render_as_status_lines() {
        let events = [
            StatusEvent::DescriptorUpdated(PathBuf::from("assets/rock_a.txt")),
            StatusEvent::DuplicateRemoved(String::from("rock_002.obj")),
            StatusEvent::SidecarRemoved(String::from("rock_002.mtl")),
        ];
        let lines: Vec<String> = events.iter().map(ToString::to_string).collect();
        assert_eq!(
            lines,
            vec![
                "Updated references in rock_a.txt",
                "Removed duplicate: rock_002.obj",
                "Removed associated sidecar file: rock_002.mtl",
            ]
        );
    }
}
