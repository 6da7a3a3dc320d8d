//! Candidate words for each slot.
//!
//! Domains only ever shrink, except that the search can roll them back to an earlier
//! `Checkpoint`. Every change records the slot's previous domain on a trail, so a restore touches
//! exactly the slots modified since the checkpoint was taken.

use std::fmt::{Debug, Formatter};

use crate::grid_config::GridConfig;
use crate::word_list::WordList;
use crate::{SlotId, WordId};

/// A position in the undo trail returned by `DomainStore::checkpoint`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint(usize);

pub struct DomainStore {
    domains: Vec<Vec<WordId>>,
    trail: Vec<(SlotId, Vec<WordId>)>,
}

impl Debug for DomainStore {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DomainStore")
            .field(
                "sizes",
                &self.domains.iter().map(Vec::len).collect::<Vec<_>>(),
            )
            .field("trail", &format!("({} entries)", self.trail.len()))
            .finish()
    }
}

impl DomainStore {
    /// Every slot starts out with the whole word list, in list order.
    pub fn seeded(config: &GridConfig, words: &WordList) -> DomainStore {
        DomainStore::from_domains(
            (0..config.slot_count())
                .map(|_| (0..words.len()).collect())
                .collect(),
        )
    }

    /// Build a store from explicit per-slot domains, indexed by `SlotId`.
    pub fn from_domains(domains: Vec<Vec<WordId>>) -> DomainStore {
        DomainStore {
            domains,
            trail: vec![],
        }
    }

    /// Remove every word whose length differs from its slot's length.
    pub fn enforce_node_consistency(&mut self, config: &GridConfig, words: &WordList) {
        for (slot_id, slot) in config.slots().iter().enumerate() {
            self.retain(slot_id, |word_id| words.get(word_id).length() == slot.length);
        }
    }

    pub fn slot_count(&self) -> usize {
        self.domains.len()
    }

    pub fn domain(&self, slot_id: SlotId) -> &[WordId] {
        &self.domains[slot_id]
    }

    pub fn len(&self, slot_id: SlotId) -> usize {
        self.domains[slot_id].len()
    }

    pub fn is_empty(&self, slot_id: SlotId) -> bool {
        self.domains[slot_id].is_empty()
    }

    pub fn contains(&self, slot_id: SlotId, word_id: WordId) -> bool {
        self.domains[slot_id].contains(&word_id)
    }

    /// Does any slot have no candidates left?
    pub fn has_empty_domain(&self) -> bool {
        self.domains.iter().any(Vec::is_empty)
    }

    /// Total number of candidates across all slots.
    pub fn total_size(&self) -> usize {
        self.domains.iter().map(Vec::len).sum()
    }

    /// Keep only the words for which `keep` returns true, preserving order. Returns whether
    /// anything was removed.
    pub fn retain<F>(&mut self, slot_id: SlotId, mut keep: F) -> bool
    where
        F: FnMut(WordId) -> bool,
    {
        let domain = &self.domains[slot_id];
        let kept: Vec<WordId> = domain.iter().copied().filter(|&word_id| keep(word_id)).collect();

        if kept.len() == domain.len() {
            return false;
        }

        let previous = std::mem::replace(&mut self.domains[slot_id], kept);
        self.trail.push((slot_id, previous));
        true
    }

    /// Reduce a slot's domain to the single word chosen for it. Returns false if the word wasn't
    /// a candidate, in which case the domain ends up empty.
    pub fn restrict(&mut self, slot_id: SlotId, word_id: WordId) -> bool {
        self.retain(slot_id, |candidate| candidate == word_id);
        self.domains[slot_id].len() == 1
    }

    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint(self.trail.len())
    }

    /// Undo every change made since `checkpoint` was taken.
    pub fn restore(&mut self, checkpoint: Checkpoint) {
        while self.trail.len() > checkpoint.0 {
            if let Some((slot_id, previous)) = self.trail.pop() {
                self.domains[slot_id] = previous;
            }
        }
    }

    /// Drop the undo history, making the current domains the baseline. Checkpoints taken before
    /// this call must not be restored afterwards.
    pub fn commit(&mut self) {
        self.trail.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid_config::Structure;

    fn fixture() -> (GridConfig, WordList) {
        let structure = Structure::parse(
            "
            #_#
            ___
            #_#
            ",
        )
        .unwrap();
        let config = GridConfig::from_structure(structure).unwrap();
        let words = WordList::new(["cat", "horse", "dog", "ox", "art"]).unwrap();
        (config, words)
    }

    #[test]
    fn test_seeded_domains_hold_every_word() {
        let (config, words) = fixture();
        let domains = DomainStore::seeded(&config, &words);

        assert_eq!(domains.slot_count(), 2);
        assert_eq!(domains.domain(0), &[0, 1, 2, 3, 4]);
        assert_eq!(domains.domain(1), &[0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_node_consistency_filters_by_length() {
        let (config, words) = fixture();
        let mut domains = DomainStore::seeded(&config, &words);

        domains.enforce_node_consistency(&config, &words);

        for (slot_id, slot) in config.slots().iter().enumerate() {
            assert!(domains
                .domain(slot_id)
                .iter()
                .all(|&word_id| words.get(word_id).length() == slot.length));
        }
        assert_eq!(domains.domain(0), &[0, 2, 4]);
        assert!(domains.contains(0, 2));
        assert!(!domains.contains(0, 1));
    }

    #[test]
    fn test_node_consistency_can_leave_empty_domains() {
        let (config, _) = fixture();
        let words = WordList::new(["horse", "ox"]).unwrap();
        let mut domains = DomainStore::seeded(&config, &words);

        domains.enforce_node_consistency(&config, &words);

        assert!(domains.is_empty(0));
        assert!(domains.has_empty_domain());
    }

    #[test]
    fn test_restore_reverts_only_changes_since_checkpoint() {
        let mut domains = DomainStore::from_domains(vec![vec![0, 1, 2], vec![3, 4, 5], vec![6]]);

        domains.retain(0, |word_id| word_id != 1);
        let checkpoint = domains.checkpoint();

        assert!(domains.restrict(1, 4));
        assert!(domains.retain(0, |word_id| word_id == 2));
        assert!(!domains.retain(2, |_| true));
        assert_eq!(domains.domain(0), &[2]);
        assert_eq!(domains.domain(1), &[4]);

        domains.restore(checkpoint);

        assert_eq!(domains.domain(0), &[0, 2]);
        assert_eq!(domains.domain(1), &[3, 4, 5]);
        assert_eq!(domains.domain(2), &[6]);
    }

    #[test]
    fn test_restrict_to_missing_word_empties_domain() {
        let mut domains = DomainStore::from_domains(vec![vec![0, 1]]);

        assert!(!domains.restrict(0, 7));
        assert!(domains.is_empty(0));
    }

    #[test]
    fn test_commit_makes_current_state_the_baseline() {
        let mut domains = DomainStore::from_domains(vec![vec![0, 1, 2]]);

        domains.retain(0, |word_id| word_id > 0);
        domains.commit();
        let checkpoint = domains.checkpoint();
        domains.restore(checkpoint);

        assert_eq!(domains.domain(0), &[1, 2]);
        assert_eq!(domains.total_size(), 2);
    }
}
