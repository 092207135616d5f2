//! Core deduplication engine for meshdedupe.
//!
//! Exported asset trees contain a `mesh` directory of OBJ files and a set of
//! descriptor files that reference them by name. This crate finds geometry
//! files that only differ in their producer-assigned header lines, keeps one
//! canonical file per group, repoints descriptors at it and deletes the rest
//! along with their material sidecars.

pub mod canonical;
pub mod cleanup;
pub mod config;
pub mod engine;
pub mod grouper;
pub mod normalizer;
pub mod progress;
pub mod reporting;
pub mod rewriter;

pub use canonical::{build_mapping, select_canonical, CanonicalChoice, CanonicalMapping};
pub use cleanup::{remove_duplicates, CleanupError, CleanupStats};
pub use config::{ConfigError, DedupeConfig, Ordering, DEFAULT_CONFIG_FILE};
pub use engine::{apply, plan, run, DedupeError, DedupeOutcome, DedupePlan};
pub use grouper::{
    find_duplicate_groups, find_equivalence_classes, list_geometry_files, EquivalenceClass,
    GroupingError, GroupingSummary,
};
pub use normalizer::{content_digest, normalize, normalize_file, ContentDigest};
pub use reporting::{print_outcome, print_plan, print_scan_start, print_status, StatusEvent};
pub use rewriter::{referenced_geometry, rewrite_descriptor_text, rewrite_descriptors, RewriteError};
