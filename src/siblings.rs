//! sibling groups: who should serve together and who must be kept apart

use std::collections::{BTreeMap, BTreeSet};

use crate::config::{PairingRule, SiblingGroup};

/// how two people relate across all groups containing both
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairingIntent {
    /// a shared group prefers them on the same date
    TogetherPreferred,
    /// a shared group forbids them on the same date, overrides together
    SeparateForbidden,
    /// no shared group, or none with an opinion
    Neutral,
}

/// pair lookup over all sibling groups
#[derive(Debug, Default, Clone)]
pub struct SiblingIndex {
    together: BTreeMap<String, BTreeSet<String>>,
    separate: BTreeMap<String, BTreeSet<String>>,
}

impl SiblingIndex {
    pub fn new(groups: &[SiblingGroup]) -> Self {
        let mut index = Self::default();

        for group in groups {
            let map = match group.pairing_rule {
                PairingRule::Together => &mut index.together,
                PairingRule::Separate => &mut index.separate,
            };
            for a in &group.members {
                for b in &group.members {
                    if a != b {
                        map.entry(a.clone()).or_default().insert(b.clone());
                    }
                }
            }
        }

        // a pair marked separate anywhere is never a together pair
        let SiblingIndex { together, separate } = &mut index;
        for (person, partners) in separate.iter() {
            if let Some(preferred) = together.get_mut(person) {
                for partner in partners {
                    preferred.remove(partner);
                }
            }
        }

        index
    }

    /// union of all co-members across groups containing the person
    pub fn siblings_of(&self, person_id: &str) -> BTreeSet<String> {
        let mut siblings = BTreeSet::new();
        if let Some(partners) = self.together.get(person_id) {
            siblings.extend(partners.iter().cloned());
        }
        if let Some(partners) = self.separate.get(person_id) {
            siblings.extend(partners.iter().cloned());
        }
        siblings
    }

    pub fn pairing_intent(&self, a: &str, b: &str) -> PairingIntent {
        if self.is_separate(a, b) {
            PairingIntent::SeparateForbidden
        } else if self.is_together(a, b) {
            PairingIntent::TogetherPreferred
        } else {
            PairingIntent::Neutral
        }
    }

    pub fn is_separate(&self, a: &str, b: &str) -> bool {
        self.separate.get(a).is_some_and(|partners| partners.contains(b))
    }

    pub fn is_together(&self, a: &str, b: &str) -> bool {
        self.together.get(a).is_some_and(|partners| partners.contains(b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(id: &str, rule: PairingRule, members: &[&str]) -> SiblingGroup {
        SiblingGroup {
            id: id.to_string(),
            name: id.to_string(),
            pairing_rule: rule,
            members: members.iter().map(|m| m.to_string()).collect(),
        }
    }

    #[test]
    fn members_of_a_group_are_siblings() {
        let index = SiblingIndex::new(&[group("g", PairingRule::Together, &["ana", "luis"])]);

        assert_eq!(
            BTreeSet::from(["luis".to_string()]),
            index.siblings_of("ana")
        );
        assert_eq!(PairingIntent::TogetherPreferred, index.pairing_intent("ana", "luis"));
        assert_eq!(PairingIntent::TogetherPreferred, index.pairing_intent("luis", "ana"));
    }

    #[test]
    fn separate_dominates_together() {
        let index = SiblingIndex::new(&[
            group("choir", PairingRule::Together, &["ana", "luis"]),
            group("twins", PairingRule::Separate, &["ana", "luis"]),
        ]);

        assert_eq!(PairingIntent::SeparateForbidden, index.pairing_intent("ana", "luis"));
        assert!(index.is_separate("luis", "ana"));
        assert!(!index.is_together("ana", "luis"));
    }

    #[test]
    fn unrelated_people_are_neutral() {
        let index = SiblingIndex::new(&[group("g", PairingRule::Separate, &["ana", "luis"])]);

        assert_eq!(PairingIntent::Neutral, index.pairing_intent("ana", "eva"));
        assert!(index.siblings_of("eva").is_empty());
    }

    #[test]
    fn multiple_groups_union_their_members() {
        let index = SiblingIndex::new(&[
            group("a", PairingRule::Together, &["ana", "luis"]),
            group("b", PairingRule::Separate, &["ana", "eva"]),
        ]);

        assert_eq!(
            BTreeSet::from(["eva".to_string(), "luis".to_string()]),
            index.siblings_of("ana")
        );
    }
}
