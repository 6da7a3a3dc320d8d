//! Grid filling by backtracking search. Domains are pruned once with node consistency and AC-3,
//! then slots are filled one at a time: the slot with the fewest remaining candidates first (ties
//! go to the slot crossing the most others, then to the lowest slot id), trying the words that
//! rule out the fewest candidates in crossing slots first.

use std::cmp::Reverse;
use std::sync::atomic::{AtomicBool, Ordering};

use instant::{Duration, Instant};
use log::{debug, info, trace};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::arc_consistency::{self, establish_arc_consistency, Arc};
use crate::domains::DomainStore;
use crate::error::{Error, FillError};
use crate::grid_config::{GridConfig, Overlap};
use crate::word_list::WordList;
use crate::{SlotId, WordId, MAX_SLOT_LENGTH};

/// How many candidate words do we try between checks of the deadline?
pub const INTERRUPT_FREQUENCY: u64 = 64;

/// What the search does to the domains after tentatively choosing a word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Inference {
    /// Leave the domains as AC-3 left them; only the consistency check prunes.
    #[default]
    None,
    /// Maintain arc consistency: shrink the chosen slot's domain to the chosen word and propagate
    /// that to its neighbors, undoing it all on backtrack.
    ArcConsistency,
}

#[derive(Debug, Clone, Default)]
pub struct FillOptions {
    pub inference: Inference,
    /// Give up with `FillError::Timeout` once backtracking has run this long.
    pub timeout: Option<Duration>,
}

/// A struct tracking statistics about the filling process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Statistics {
    /// Slots selected for filling.
    pub states: u64,
    /// Tentative choices that were undone.
    pub backtracks: u64,
    /// Arc revisions performed by AC-3, up front and during inference.
    pub revisions: u64,
    pub duration: Duration,
}

/// A partial map from slot to word. At most one word per slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    word_ids: Vec<Option<WordId>>,
    filled_count: usize,
}

impl Assignment {
    /// An empty assignment for a grid with `slot_count` slots.
    pub fn new(slot_count: usize) -> Assignment {
        Assignment {
            word_ids: vec![None; slot_count],
            filled_count: 0,
        }
    }

    pub fn slot_count(&self) -> usize {
        self.word_ids.len()
    }

    /// Number of slots that have a word.
    pub fn len(&self) -> usize {
        self.filled_count
    }

    pub fn is_empty(&self) -> bool {
        self.filled_count == 0
    }

    pub fn is_complete(&self) -> bool {
        self.filled_count == self.word_ids.len()
    }

    pub fn get(&self, slot_id: SlotId) -> Option<WordId> {
        self.word_ids[slot_id]
    }

    pub fn is_assigned(&self, slot_id: SlotId) -> bool {
        self.word_ids[slot_id].is_some()
    }

    /// Set the word for a slot, replacing any previous choice.
    pub fn assign(&mut self, slot_id: SlotId, word_id: WordId) {
        if self.word_ids[slot_id].replace(word_id).is_none() {
            self.filled_count += 1;
        }
    }

    pub fn unassign(&mut self, slot_id: SlotId) {
        if self.word_ids[slot_id].take().is_some() {
            self.filled_count -= 1;
        }
    }

    /// The assigned (slot, word) pairs in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (SlotId, WordId)> + '_ {
        self.word_ids
            .iter()
            .enumerate()
            .filter_map(|(slot_id, word_id)| word_id.map(|word_id| (slot_id, word_id)))
    }

    /// Check every constraint at once: lengths match, crossing letters agree, and no word is used
    /// twice.
    pub fn is_consistent(&self, config: &GridConfig, words: &WordList) -> bool {
        self.iter().all(|(slot_id, word_id)| {
            words.get(word_id).length() == config.slot(slot_id).length
                && self.iter().all(|(other_slot_id, other_word_id)| {
                    other_slot_id == slot_id
                        || (other_word_id != word_id
                            && letters_agree(
                                words,
                                config.overlap(slot_id, other_slot_id),
                                word_id,
                                other_word_id,
                            ))
                })
        })
    }
}

/// Do two words agree at the cell where their slots cross? Slots that don't cross always agree.
fn letters_agree(
    words: &WordList,
    overlap: Option<Overlap>,
    word_id: WordId,
    other_word_id: WordId,
) -> bool {
    match overlap {
        Some(overlap) => {
            let letter = words.get(word_id).letters.get(overlap.offset);
            letter.is_some()
                && letter == words.get(other_word_id).letters.get(overlap.other_offset)
        }
        None => true,
    }
}

/// The result of `find_fill`: the fill, if one exists, and how much work it took.
#[derive(Debug, Clone)]
pub struct FillOutcome {
    pub assignment: Option<Assignment>,
    pub statistics: Statistics,
}

/// Solves one grid. The solver owns the domain store; the grid and word list are borrowed and
/// never change.
pub struct Solver<'a> {
    config: &'a GridConfig,
    words: &'a WordList,
    domains: DomainStore,
    options: FillOptions,
    abort: Option<&'a AtomicBool>,
    deadline: Option<Instant>,
    trials: u64,
    statistics: Statistics,
}

impl<'a> Solver<'a> {
    /// Every slot starts with the whole word list as its domain.
    pub fn new(config: &'a GridConfig, words: &'a WordList) -> Solver<'a> {
        Solver {
            config,
            words,
            domains: DomainStore::seeded(config, words),
            options: FillOptions::default(),
            abort: None,
            deadline: None,
            trials: 0,
            statistics: Statistics::default(),
        }
    }

    pub fn with_options(mut self, options: FillOptions) -> Solver<'a> {
        self.options = options;
        self
    }

    /// Stop with `FillError::Aborted` once `abort` is set, e.g. from another thread.
    pub fn with_abort_flag(mut self, abort: &'a AtomicBool) -> Solver<'a> {
        self.abort = Some(abort);
        self
    }

    pub fn domains(&self) -> &DomainStore {
        &self.domains
    }

    pub fn statistics(&self) -> &Statistics {
        &self.statistics
    }

    pub fn enforce_node_consistency(&mut self) {
        self.domains.enforce_node_consistency(self.config, self.words);
    }

    pub fn revise(&mut self, x: SlotId, y: SlotId) -> bool {
        self.statistics.revisions += 1;
        arc_consistency::revise(self.config, self.words, &mut self.domains, x, y)
    }

    /// Run AC-3 from `arcs`, or from every arc if `None`. `Ok(false)` means some domain is empty.
    pub fn ac3(&mut self, arcs: Option<&[Arc]>) -> Result<bool, Error> {
        for &(x, y) in arcs.unwrap_or_default() {
            self.config.try_slot(x)?;
            self.config.try_slot(y)?;
        }

        match establish_arc_consistency(self.config, self.words, &mut self.domains, arcs) {
            Ok(success) => {
                self.statistics.revisions += success.revisions as u64;
                Ok(true)
            }
            Err(failure) => {
                self.statistics.revisions += failure.revisions as u64;
                Ok(false)
            }
        }
    }

    /// Pick the unassigned slot with the fewest candidates left, preferring the slot with the
    /// most neighbors and then the lowest id on ties.
    pub fn select_unassigned_variable(&self, assignment: &Assignment) -> Option<SlotId> {
        (0..self.config.slot_count())
            .filter(|&slot_id| !assignment.is_assigned(slot_id))
            .min_by_key(|&slot_id| {
                (
                    self.domains.len(slot_id),
                    Reverse(self.config.neighbors(slot_id).len()),
                )
            })
    }

    /// The candidates for `slot_id`, ordered by how many words each would rule out of the domains
    /// of unassigned neighbors, fewest first. Ties keep their domain order.
    pub fn order_domain_values(&self, slot_id: SlotId, assignment: &Assignment) -> Vec<WordId> {
        let neighbors: SmallVec<[(SlotId, Overlap); MAX_SLOT_LENGTH]> = self
            .config
            .neighbors(slot_id)
            .iter()
            .filter(|&&neighbor| !assignment.is_assigned(neighbor))
            .filter_map(|&neighbor| {
                self.config
                    .overlap(slot_id, neighbor)
                    .map(|overlap| (neighbor, overlap))
            })
            .collect();

        // For each neighbor, how many of its candidates put each letter in the shared cell?
        let letter_counts: Vec<FxHashMap<char, usize>> = neighbors
            .iter()
            .map(|&(neighbor, overlap)| {
                let mut counts: FxHashMap<char, usize> = FxHashMap::default();
                for &word_id in self.domains.domain(neighbor) {
                    let letters = &self.words.get(word_id).letters;
                    if let Some(&letter) = letters.get(overlap.other_offset) {
                        *counts.entry(letter).or_default() += 1;
                    }
                }
                counts
            })
            .collect();

        let mut scored: Vec<(usize, WordId)> = self
            .domains
            .domain(slot_id)
            .iter()
            .map(|&word_id| {
                let letters = &self.words.get(word_id).letters;
                let ruled_out = neighbors
                    .iter()
                    .zip(&letter_counts)
                    .map(|(&(neighbor, overlap), counts)| {
                        let kept = letters
                            .get(overlap.offset)
                            .and_then(|letter| counts.get(letter))
                            .copied()
                            .unwrap_or(0);
                        self.domains.len(neighbor) - kept
                    })
                    .sum();
                (ruled_out, word_id)
            })
            .collect();

        // `sort_by_key` is stable, so equal scores stay in domain order.
        scored.sort_by_key(|&(ruled_out, _)| ruled_out);
        scored.into_iter().map(|(_, word_id)| word_id).collect()
    }

    /// Would assigning `word_id` to `slot_id` keep `assignment` consistent? The word has to fit
    /// the slot, agree with every assigned crossing slot, and not already be in use.
    pub fn consistent(&self, assignment: &Assignment, slot_id: SlotId, word_id: WordId) -> bool {
        if self.words.get(word_id).length() != self.config.slot(slot_id).length {
            return false;
        }

        assignment
            .iter()
            .filter(|&(other_slot_id, _)| other_slot_id != slot_id)
            .all(|(other_slot_id, other_word_id)| {
                other_word_id != word_id
                    && letters_agree(
                        self.words,
                        self.config.overlap(slot_id, other_slot_id),
                        word_id,
                        other_word_id,
                    )
            })
    }

    /// Extend `assignment` to a complete, consistent assignment if possible. `Ok(None)` means
    /// there isn't one under the current domains. Domains are left as they were found, unless the
    /// search is interrupted.
    pub fn backtrack(&mut self, assignment: Assignment) -> Result<Option<Assignment>, FillError> {
        let mut assignment = assignment;
        self.trials = 0;
        // A timeout too large to represent is the same as no timeout.
        self.deadline = self
            .options
            .timeout
            .and_then(|timeout| Instant::now().checked_add(timeout));

        if self.search(&mut assignment)? {
            Ok(Some(assignment))
        } else {
            Ok(None)
        }
    }

    fn search(&mut self, assignment: &mut Assignment) -> Result<bool, FillError> {
        let Some(slot_id) = self.select_unassigned_variable(assignment) else {
            return Ok(true);
        };
        self.statistics.states += 1;

        for word_id in self.order_domain_values(slot_id, assignment) {
            self.check_interrupt()?;

            if !self.consistent(assignment, slot_id, word_id) {
                continue;
            }

            let checkpoint = self.domains.checkpoint();
            assignment.assign(slot_id, word_id);

            let outcome = if self.infer(slot_id, word_id) {
                self.search(assignment)
            } else {
                Ok(false)
            };
            if let Ok(true) = outcome {
                return outcome;
            }

            self.domains.restore(checkpoint);
            assignment.unassign(slot_id);
            outcome?;

            self.statistics.backtracks += 1;
            trace!("backtracking from word {} in slot {}", word_id, slot_id);
        }

        Ok(false)
    }

    /// Apply the configured inference after choosing `word_id` for `slot_id`. Returns false if
    /// that leaves some slot without candidates.
    fn infer(&mut self, slot_id: SlotId, word_id: WordId) -> bool {
        match self.options.inference {
            Inference::None => true,
            Inference::ArcConsistency => {
                if !self.domains.restrict(slot_id, word_id) {
                    return false;
                }

                let arcs: SmallVec<[Arc; MAX_SLOT_LENGTH]> = self
                    .config
                    .neighbors(slot_id)
                    .iter()
                    .map(|&neighbor| (neighbor, slot_id))
                    .collect();

                match establish_arc_consistency(
                    self.config,
                    self.words,
                    &mut self.domains,
                    Some(&arcs[..]),
                ) {
                    Ok(success) => {
                        self.statistics.revisions += success.revisions as u64;
                        true
                    }
                    Err(failure) => {
                        self.statistics.revisions += failure.revisions as u64;
                        trace!("choice for slot {} empties slot {}", slot_id, failure.slot_id);
                        false
                    }
                }
            }
        }
    }

    fn check_interrupt(&mut self) -> Result<(), FillError> {
        if self.abort.map_or(false, |abort| abort.load(Ordering::Relaxed)) {
            return Err(FillError::Aborted);
        }

        if let Some(deadline) = self.deadline {
            if self.trials % INTERRUPT_FREQUENCY == 0 && Instant::now() >= deadline {
                return Err(FillError::Timeout);
            }
        }
        self.trials += 1;

        Ok(())
    }

    /// Enforce node consistency and arc consistency, then search from an empty assignment.
    pub fn solve(&mut self) -> Result<Option<Assignment>, FillError> {
        let start = Instant::now();
        info!(
            "filling {} slots from {} words",
            self.config.slot_count(),
            self.words.len()
        );

        self.enforce_node_consistency();
        debug!(
            "{} candidates remain after node consistency",
            self.domains.total_size()
        );

        match establish_arc_consistency(self.config, self.words, &mut self.domains, None) {
            Ok(success) => self.statistics.revisions += success.revisions as u64,
            Err(failure) => {
                self.statistics.revisions += failure.revisions as u64;
                self.statistics.duration = start.elapsed();
                info!("no fill: slot {} has no candidates", failure.slot_id);
                return Ok(None);
            }
        }
        self.domains.commit();

        let result = self.backtrack(Assignment::new(self.config.slot_count()));
        self.statistics.duration = start.elapsed();

        match &result {
            Ok(Some(_)) => info!("found a fill: {:?}", self.statistics),
            Ok(None) => info!("no fill: {:?}", self.statistics),
            Err(err) => info!("{}: {:?}", err, self.statistics),
        }

        result
    }
}

/// Search for a valid fill for the given grid.
pub fn find_fill(
    config: &GridConfig,
    words: &WordList,
    options: FillOptions,
) -> Result<FillOutcome, FillError> {
    let mut solver = Solver::new(config, words).with_options(options);
    let assignment = solver.solve()?;

    Ok(FillOutcome {
        assignment,
        statistics: solver.statistics().clone(),
    })
}
