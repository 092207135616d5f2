use crate::grouper::EquivalenceClass;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The kept file of a duplicate group and the files it supersedes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalChoice {
    pub canonical: String,
    pub removable: Vec<String>,
}

/// Maps every superseded geometry file name to the name that replaces it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalMapping {
    replacements: BTreeMap<String, String>,
}

impl CanonicalMapping {
    pub fn canonical_for(&self, name: &str) -> Option<&str> {
        self.replacements.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.replacements.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.replacements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.replacements.is_empty()
    }

    /// `(removable, canonical)` pairs ordered by removable name.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.replacements
            .iter()
            .map(|(removable, canonical)| (removable.as_str(), canonical.as_str()))
    }

    fn insert(&mut self, removable: String, canonical: String) {
        debug_assert_ne!(removable, canonical);
        self.replacements.insert(removable, canonical);
    }
}

/// First member in enumeration order is kept; the rest are removable.
///
/// Returns `None` for an empty class.
pub fn select_canonical(class: &EquivalenceClass) -> Option<CanonicalChoice> {
    let (canonical, removable) = class.members.split_first()?;
    Some(CanonicalChoice {
        canonical: canonical.clone(),
        removable: removable.to_vec(),
    })
}

pub fn build_mapping(choices: &[CanonicalChoice]) -> CanonicalMapping {
    let mut mapping = CanonicalMapping::default();
    for choice in choices {
        for removable in &choice.removable {
            mapping.insert(removable.clone(), choice.canonical.clone());
        }
    }
    mapping
}

#[cfg(test)]
mod tests {
    use super::*;

    fn class(members: &[&str]) -> EquivalenceClass {
        EquivalenceClass {
            digest: 7,
            members: members.iter().map(|name| name.to_string()).collect(),
        }
    }

    #[test]
    fn first_member_is_canonical() {
        let choice = select_canonical(&class(&["rock_001.obj", "rock_002.obj", "rock_003.obj"]))
            .unwrap();
        assert_eq!(choice.canonical, "rock_001.obj");
        assert_eq!(choice.removable, vec!["rock_002.obj", "rock_003.obj"]);
    }

    #[test]
    fn empty_class_has_no_choice() {
        assert!(select_canonical(&class(&[])).is_none());
    }

    #[test]
    fn mapping_never_keys_a_canonical() {
        let choices = vec![
            select_canonical(&class(&["a.obj", "b.obj"])).unwrap(),
            select_canonical(&class(&["c.obj", "d.obj", "e.obj"])).unwrap(),
        ];
        let mapping = build_mapping(&choices);

        assert_eq!(mapping.len(), 3);
        assert_eq!(mapping.canonical_for("b.obj"), Some("a.obj"));
        assert_eq!(mapping.canonical_for("d.obj"), Some("c.obj"));
        assert_eq!(mapping.canonical_for("e.obj"), Some("c.obj"));
        assert!(!mapping.contains("a.obj"));
        assert!(!mapping.contains("c.obj"));
    }

    #[test]
    fn selection_is_stable_for_same_order() {
        let members = class(&["x.obj", "y.obj"]);
        assert_eq!(select_canonical(&members), select_canonical(&members));
    }
}
