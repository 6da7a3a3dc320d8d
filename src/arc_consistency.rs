//! Arc consistency using AC-3: every word left in a slot's domain must agree, at each crossing,
//! with at least one word left in the crossing slot's domain.

use std::collections::VecDeque;

use bit_set::BitSet;
use log::{debug, trace};
use rustc_hash::FxHashSet;

use crate::domains::DomainStore;
use crate::error::Error;
use crate::grid_config::GridConfig;
use crate::word_list::WordList;
use crate::SlotId;

/// An ordered pair `(x, y)` of crossing slots: every word in `x`'s domain needs a supporting word
/// in `y`'s domain.
pub type Arc = (SlotId, SlotId);

/// Worklist of arcs to revise. An arc that's already waiting isn't queued a second time.
#[derive(Debug)]
struct ArcQueue {
    slot_count: usize,
    queue: VecDeque<Arc>,
    queued: BitSet,
}

impl ArcQueue {
    fn with_initial_queue<Items>(slot_count: usize, items: Items) -> ArcQueue
    where
        Items: IntoIterator<Item = Arc>,
    {
        let mut queue = ArcQueue {
            slot_count,
            queue: VecDeque::new(),
            queued: BitSet::with_capacity(slot_count * slot_count),
        };
        for arc in items {
            queue.enqueue(arc);
        }
        queue
    }

    fn pop_front(&mut self) -> Option<Arc> {
        let arc = self.queue.pop_front()?;
        self.queued.remove(arc.0 * self.slot_count + arc.1);
        Some(arc)
    }

    fn enqueue(&mut self, arc: Arc) {
        if self.queued.insert(arc.0 * self.slot_count + arc.1) {
            self.queue.push_back(arc);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArcConsistencySuccess {
    pub revisions: usize,
}

/// `slot_id` is the slot whose domain ran out of words.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArcConsistencyFailure {
    pub slot_id: SlotId,
    pub revisions: usize,
}

pub type ArcConsistencyResult = Result<ArcConsistencySuccess, ArcConsistencyFailure>;

/// Make slot `x` arc-consistent with slot `y` by removing each word in `x`'s domain that has no
/// support in `y`'s domain. Words too short to reach the crossing have no support. Returns
/// whether `x`'s domain changed; slots that don't cross are left alone.
pub fn revise(
    config: &GridConfig,
    words: &WordList,
    domains: &mut DomainStore,
    x: SlotId,
    y: SlotId,
) -> bool {
    let Some(overlap) = config.overlap(x, y) else {
        return false;
    };

    // Which letters can `y` still put in the shared cell?
    let supported: FxHashSet<char> = domains
        .domain(y)
        .iter()
        .filter_map(|&word_id| words.get(word_id).letters.get(overlap.other_offset).copied())
        .collect();

    domains.retain(x, |word_id| {
        words
            .get(word_id)
            .letters
            .get(overlap.offset)
            .map_or(false, |letter| supported.contains(letter))
    })
}

/// Run AC-3 to a fixed point, starting from `arcs` or, if that's `None`, from every ordered pair of
/// crossing slots. Whenever revising `(x, y)` shrinks `x`, every arc `(z, x)` for the other
/// neighbors `z` of `x` goes back on the queue.
///
/// Callers are responsible for passing arcs between slots that exist in `config`.
pub fn establish_arc_consistency(
    config: &GridConfig,
    words: &WordList,
    domains: &mut DomainStore,
    arcs: Option<&[Arc]>,
) -> ArcConsistencyResult {
    let slot_count = config.slot_count();
    let mut queue = match arcs {
        Some(arcs) => ArcQueue::with_initial_queue(slot_count, arcs.iter().copied()),
        None => ArcQueue::with_initial_queue(slot_count, config.overlaps().arcs()),
    };
    let mut revisions = 0;

    while let Some((x, y)) = queue.pop_front() {
        revisions += 1;

        if !revise(config, words, domains, x, y) {
            continue;
        }

        if domains.is_empty(x) {
            trace!("slot {} wiped out by slot {}", x, y);
            return Err(ArcConsistencyFailure { slot_id: x, revisions });
        }

        for &z in config.neighbors(x) {
            if z != y {
                queue.enqueue((z, x));
            }
        }
    }

    // A domain may have been empty before we started, e.g. after node consistency.
    if let Some(slot_id) = (0..slot_count).find(|&slot_id| domains.is_empty(slot_id)) {
        return Err(ArcConsistencyFailure { slot_id, revisions });
    }

    debug!(
        "arc consistency reached after {} revisions, {} candidates remain",
        revisions,
        domains.total_size()
    );

    Ok(ArcConsistencySuccess { revisions })
}

/// AC-3 with the arcs checked up front. Returns `Ok(false)` if any domain ends up empty, which
/// means no fill exists under the current domains.
pub fn ac3(
    config: &GridConfig,
    words: &WordList,
    domains: &mut DomainStore,
    arcs: Option<&[Arc]>,
) -> Result<bool, Error> {
    if let Some(arcs) = arcs {
        for &(x, y) in arcs {
            config.try_slot(x)?;
            config.try_slot(y)?;
        }
    }

    Ok(establish_arc_consistency(config, words, domains, arcs).is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid_config::Structure;

    /// ___
    /// _#_
    /// _#_
    ///
    /// Slot 0 is 1-across, slot 1 is 1-down, slot 2 is 3-down.
    fn three_slot_config() -> GridConfig {
        GridConfig::from_structure(
            Structure::parse(
                "
                ___
                _#_
                _#_
                ",
            )
            .unwrap(),
        )
        .unwrap()
    }

    fn node_consistent_domains(config: &GridConfig, words: &WordList) -> DomainStore {
        let mut domains = DomainStore::seeded(config, words);
        domains.enforce_node_consistency(config, words);
        domains
    }

    fn strings(words: &WordList, domain: &[usize]) -> Vec<String> {
        domain.iter().map(|&word_id| words.get(word_id).string.clone()).collect()
    }

    fn assert_arc_consistent(config: &GridConfig, words: &WordList, domains: &DomainStore) {
        for (x, y) in config.overlaps().arcs() {
            let overlap = config.overlap(x, y).unwrap();
            for &word_id in domains.domain(x) {
                let letter = words.get(word_id).letters[overlap.offset];
                assert!(
                    domains
                        .domain(y)
                        .iter()
                        .any(|&other| words.get(other).letters[overlap.other_offset] == letter),
                    "{} in slot {} has no support in slot {}",
                    words.get(word_id).string,
                    x,
                    y,
                );
            }
        }
    }

    #[test]
    fn test_revise_removes_unsupported_words() {
        let config = three_slot_config();
        let words = WordList::new(["cat", "cow", "toe", "dog"]).unwrap();
        let mut domains = node_consistent_domains(&config, &words);

        assert!(revise(&config, &words, &mut domains, 0, 2));
        assert_eq!(strings(&words, domains.domain(0)), ["CAT"]);

        // Nothing left to remove the second time around.
        assert!(!revise(&config, &words, &mut domains, 0, 2));
    }

    #[test]
    fn test_revise_ignores_slots_that_dont_cross() {
        let config = three_slot_config();
        let words = WordList::new(["cat", "cow", "toe", "dog"]).unwrap();
        let mut domains = node_consistent_domains(&config, &words);

        assert!(!revise(&config, &words, &mut domains, 1, 2));
        assert_eq!(domains.len(1), 4);
    }

    #[test]
    fn test_ac3_propagates_to_a_fixed_point() {
        let config = three_slot_config();
        let words = WordList::new(["cat", "cow", "toe", "dog"]).unwrap();
        let mut domains = node_consistent_domains(&config, &words);

        let result = establish_arc_consistency(&config, &words, &mut domains, None);

        assert_eq!(result, Ok(ArcConsistencySuccess { revisions: 4 }));
        assert_eq!(strings(&words, domains.domain(0)), ["CAT"]);
        assert_eq!(strings(&words, domains.domain(1)), ["CAT", "COW"]);
        assert_eq!(strings(&words, domains.domain(2)), ["TOE"]);
        assert_arc_consistent(&config, &words, &domains);
    }

    #[test]
    fn test_ac3_only_shrinks_domains() {
        let config = three_slot_config();
        let words =
            WordList::new(["cat", "cow", "toe", "dog", "ton", "tic", "cot", "nit", "eon"]).unwrap();
        let mut domains = node_consistent_domains(&config, &words);
        let before: Vec<Vec<usize>> =
            (0..config.slot_count()).map(|slot_id| domains.domain(slot_id).to_vec()).collect();

        assert!(ac3(&config, &words, &mut domains, None).unwrap());

        for (slot_id, before) in before.iter().enumerate() {
            assert!(domains.len(slot_id) <= before.len());
            assert!(domains.domain(slot_id).iter().all(|word_id| before.contains(word_id)));
        }
        assert_arc_consistent(&config, &words, &domains);
    }

    #[test]
    fn test_ac3_reports_wipeout() {
        let config = three_slot_config();
        let words = WordList::new(["cat", "dog", "eel"]).unwrap();
        let mut domains = node_consistent_domains(&config, &words);

        assert!(!ac3(&config, &words, &mut domains, None).unwrap());
        assert!(domains.is_empty(0));
    }

    #[test]
    fn test_ac3_fails_on_domain_empty_from_the_start() {
        let config = three_slot_config();
        let words = WordList::new(["cats", "dogs"]).unwrap();
        let mut domains = node_consistent_domains(&config, &words);

        let result = establish_arc_consistency(&config, &words, &mut domains, None);

        assert_eq!(result, Err(ArcConsistencyFailure { slot_id: 0, revisions: 4 }));
    }

    #[test]
    fn test_ac3_with_explicit_arcs() {
        let config = three_slot_config();
        let words = WordList::new(["cat", "cow", "toe", "dog"]).unwrap();
        let mut domains = node_consistent_domains(&config, &words);

        // Revising (1, 0) alone finds nothing to remove since slot 0 still has every word.
        assert!(ac3(&config, &words, &mut domains, Some(&[(1, 0)][..])).unwrap());
        assert_eq!(domains.total_size(), 12);

        // Starting from (0, 2) shrinks slot 0, which pulls in (1, 0) and prunes slot 1 too.
        assert!(ac3(&config, &words, &mut domains, Some(&[(0, 2)][..])).unwrap());
        assert_eq!(strings(&words, domains.domain(0)), ["CAT"]);
        assert_eq!(strings(&words, domains.domain(1)), ["CAT", "COW"]);
        assert_eq!(domains.len(2), 4);
    }

    #[test]
    fn test_ac3_rejects_unknown_slots() {
        let config = three_slot_config();
        let words = WordList::new(["cat"]).unwrap();
        let mut domains = node_consistent_domains(&config, &words);

        assert!(matches!(
            ac3(&config, &words, &mut domains, Some(&[(0, 5)][..])),
            Err(Error::UnknownSlot(5))
        ));
    }
}
