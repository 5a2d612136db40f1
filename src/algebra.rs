//! Move sequences, commutators, and the macro library.
//!
//! A [`Sequence`] pairs a list of turn indices with the net permutation the
//! turns induce on a solved state. Two different turn lists with the same
//! net effect are interchangeable, which is what the macro library exploits:
//! it indexes discovered sequences by effect and answers "is there a shorter
//! sequence that does the same thing" and "which known sequence is closest
//! to this effect".

use std::cmp::Ordering;

use rustc_hash::FxHashMap;

use crate::permutation::{Permutation, PermutationTrie};
use crate::puzzle::TwistyPuzzle;
use crate::Error;

/// Flow control for [`traverse_combinations`].
pub enum TraverseResult {
    /// Do not expand the current combination's children; move to its sibling.
    Skip,
    /// Expand children (up to the depth limit).
    Continue,
    /// Stop the whole traversal.
    Break,
}

struct StateToExpand<Combined> {
    combined_previous: Combined,
    item_index: usize,
}

/// Depth-first traversal of all item combinations up to `depth_limit`,
/// building each combination incrementally with `combiner` and reporting it
/// to `visit`. The initial (empty) combination is reported first.
pub fn traverse_combinations<Item, Combined, Combiner, Visit>(
    items: &[Item],
    depth_limit: usize,
    initial_combined: Combined,
    combiner: Combiner,
    visit: &mut Visit,
) where
    Combiner: Fn(&Combined, &Item) -> Combined,
    Visit: FnMut(&Combined) -> TraverseResult,
{
    if items.is_empty() {
        visit(&initial_combined);
        return;
    }
    if let TraverseResult::Break = visit(&initial_combined) {
        return;
    }
    let mut fringe_stack: Vec<StateToExpand<Combined>> = vec![StateToExpand {
        combined_previous: initial_combined,
        item_index: 0,
    }];

    while let Some(state_to_expand) = fringe_stack.last() {
        if fringe_stack.len() < depth_limit + 1 {
            let combined = combiner(
                &state_to_expand.combined_previous,
                &items[state_to_expand.item_index],
            );
            match visit(&combined) {
                TraverseResult::Skip => increment(&mut fringe_stack, items.len()),
                TraverseResult::Continue => fringe_stack.push(StateToExpand {
                    combined_previous: combined,
                    item_index: 0,
                }),
                TraverseResult::Break => break,
            }
        } else {
            increment(&mut fringe_stack, items.len());
        }
    }
}

fn increment<Combined>(fringe_stack: &mut Vec<StateToExpand<Combined>>, num_items: usize) {
    while let Some(state_to_increment) = fringe_stack.last_mut() {
        if state_to_increment.item_index < num_items - 1 {
            state_to_increment.item_index += 1;
            break;
        } else {
            fringe_stack.pop();
        }
    }
}

/// A move sequence together with its net effect on a solved state.
#[derive(Debug, Clone)]
pub struct Sequence {
    /// Turn indices, in application order.
    pub turns: Vec<usize>,
    /// Net slot permutation, in pull form.
    pub effect: Permutation,
    /// Number of pieces the net effect displaces or reorients.
    pub affected_pieces: usize,
}

impl Sequence {
    /// The identity sequence.
    pub fn empty(puzzle: &TwistyPuzzle) -> Self {
        Sequence {
            turns: vec![],
            effect: Permutation::identity(puzzle.num_stickers()),
            affected_pieces: 0,
        }
    }

    /// Builds a sequence from turns and a precomputed effect. The caller is
    /// responsible for the effect actually matching the turns.
    pub fn new(puzzle: &TwistyPuzzle, turns: Vec<usize>, effect: Permutation) -> Self {
        let affected_pieces = puzzle.num_pieces() - puzzle.num_solved_pieces(&effect);
        Sequence {
            turns,
            effect,
            affected_pieces,
        }
    }

    /// Builds a sequence from turn indices, computing the net effect.
    pub fn from_turns(puzzle: &TwistyPuzzle, turns: &[usize]) -> Result<Self, Error> {
        let mut effect = Permutation::identity(puzzle.num_stickers());
        for &turn_index in turns {
            let turn = puzzle
                .turns()
                .get(turn_index)
                .ok_or(Error::IllegalMove {
                    turn_index,
                    num_turns: puzzle.num_turns(),
                })?;
            effect = effect.then(&turn.permutation);
        }
        Ok(Sequence::new(puzzle, turns.to_vec(), effect))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// `self` followed by `other`.
    pub fn compose(&self, puzzle: &TwistyPuzzle, other: &Sequence) -> Sequence {
        let turns = self
            .turns
            .iter()
            .chain(other.turns.iter())
            .copied()
            .collect();
        Sequence::new(puzzle, turns, self.effect.then(&other.effect))
    }

    /// Reversed turns, each replaced by its inverse.
    pub fn invert(&self, puzzle: &TwistyPuzzle) -> Sequence {
        let turns = self
            .turns
            .iter()
            .rev()
            .map(|&turn_index| puzzle.inverse_turn(turn_index))
            .collect();
        Sequence::new(puzzle, turns, self.effect.invert())
    }

    /// `setup, body, setup⁻¹`. The conjugate relocates `body`'s effect to
    /// wherever `setup` moved the targeted pieces from, without changing the
    /// effect's cycle structure.
    pub fn conjugate(puzzle: &TwistyPuzzle, setup: &Sequence, body: &Sequence) -> Sequence {
        setup
            .compose(puzzle, body)
            .compose(puzzle, &setup.invert(puzzle))
    }

    /// The commutator pattern `A, B, C, B⁻¹, C⁻¹, A⁻¹`.
    ///
    /// With B a 3-cycle and C a single-piece reorienter sharing exactly one
    /// piece, the middle four moves twist that piece and untwist its cycle
    /// partners, and the setup A chooses which pieces those are.
    pub fn commutator(
        puzzle: &TwistyPuzzle,
        setup: &Sequence,
        b: &Sequence,
        c: &Sequence,
    ) -> Sequence {
        let core = b
            .compose(puzzle, c)
            .compose(puzzle, &b.invert(puzzle))
            .compose(puzzle, &c.invert(puzzle));
        Sequence::conjugate(puzzle, setup, &core)
    }
}

impl PartialEq for Sequence {
    // Compared by turns, not by effect: different turn lists with the same
    // net effect are still different sequences.
    fn eq(&self, other: &Self) -> bool {
        self.turns == other.turns
    }
}
impl Eq for Sequence {}

impl PartialOrd for Sequence {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for Sequence {
    fn cmp(&self, other: &Self) -> Ordering {
        self.affected_pieces
            .cmp(&other.affected_pieces)
            .then(self.turns.len().cmp(&other.turns.len()))
            .then(self.turns.cmp(&other.turns).reverse())
    }
}

/// Enumerates all turn combinations up to `max_turns` whose net effect moves
/// at least one piece and passes `filter`, sorted fewest-affected-first.
///
/// Combinations whose last turn cancels the one before it are pruned along
/// with everything they would expand into.
pub fn discover_macros<Filter>(
    puzzle: &TwistyPuzzle,
    filter: Filter,
    max_turns: usize,
) -> Vec<Sequence>
where
    Filter: Fn(&Sequence) -> bool,
{
    let mut found: Vec<Sequence> = vec![];
    let turns: Vec<usize> = (0..puzzle.num_turns()).collect();

    traverse_combinations(
        &turns,
        max_turns,
        Sequence::empty(puzzle),
        |previous: &Sequence, &turn_index: &usize| {
            let effect = previous
                .effect
                .then(&puzzle.turns()[turn_index].permutation);
            let new_turns = previous
                .turns
                .iter()
                .chain(std::iter::once(&turn_index))
                .copied()
                .collect();
            Sequence::new(puzzle, new_turns, effect)
        },
        &mut |sequence| {
            if sequence.turns.len() <= 1 {
                return TraverseResult::Continue;
            }
            let last = sequence.turns[sequence.turns.len() - 1];
            let previous = sequence.turns[sequence.turns.len() - 2];
            if last == puzzle.inverse_turn(previous) {
                return TraverseResult::Skip;
            }
            if sequence.affected_pieces > 0 && filter(sequence) {
                found.push(sequence.clone());
            }
            TraverseResult::Continue
        },
    );

    found.sort();
    found
}

/// Collapses sequences with identical net effect, keeping the shortest.
pub fn dedup_by_effect(sequences: Vec<Sequence>) -> Vec<Sequence> {
    let mut by_effect: FxHashMap<Vec<usize>, Sequence> = FxHashMap::default();
    for sequence in sequences {
        match by_effect.entry(sequence.effect.0.clone()) {
            std::collections::hash_map::Entry::Vacant(entry) => {
                entry.insert(sequence);
            }
            std::collections::hash_map::Entry::Occupied(mut entry) => {
                if entry.get().turns.len() > sequence.turns.len() {
                    entry.insert(sequence);
                }
            }
        }
    }
    let mut deduped: Vec<Sequence> = by_effect.into_values().collect();
    deduped.sort();
    deduped
}

/// A library of known short sequences, indexed by net effect.
#[derive(Debug)]
pub struct MacroLibrary {
    macros: Vec<Sequence>,
    index: PermutationTrie<usize>,
}

impl MacroLibrary {
    /// Discovers all macros up to `max_turns` turns and indexes them.
    ///
    /// Single turns are seeded in as one-turn sequences so the library can
    /// answer "this long sequence is really just one turn".
    pub fn build(puzzle: &TwistyPuzzle, max_turns: usize) -> Self {
        let mut sequences: Vec<Sequence> = (0..puzzle.num_turns())
            .map(|turn_index| {
                Sequence::new(
                    puzzle,
                    vec![turn_index],
                    puzzle.turns()[turn_index].permutation.clone(),
                )
            })
            .collect();
        sequences.extend(discover_macros(puzzle, |_| true, max_turns));
        Self::from_sequences(dedup_by_effect(sequences))
    }

    pub fn from_sequences(macros: Vec<Sequence>) -> Self {
        let mut index = PermutationTrie::new();
        for (position, sequence) in macros.iter().enumerate() {
            index.insert(&sequence.effect, position);
        }
        MacroLibrary { macros, index }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.macros.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.macros.is_empty()
    }

    #[inline]
    pub fn macros(&self) -> &[Sequence] {
        &self.macros
    }

    /// Streams library entries in ascending order of how far their effect is
    /// from `effect` (an exact match first, with difference 0).
    pub fn most_similar<'a>(
        &'a self,
        effect: &Permutation,
    ) -> impl Iterator<Item = (usize, &'a Sequence)> + 'a {
        self.index
            .most_similar(effect)
            .map(move |(differences, &position)| (differences, &self.macros[position]))
    }

    /// A known strictly-shorter sequence with the same net effect as
    /// `sequence`, along with how many turns it saves.
    pub fn shorter_equivalent(&self, sequence: &Sequence) -> Option<(&Sequence, usize)> {
        let known = &self.macros[*self.index.get(&sequence.effect)?];
        if known.turns.len() < sequence.turns.len() {
            Some((known, sequence.turns.len() - known.turns.len()))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::families::Family;

    #[test]
    fn invert_round_trips() {
        let puzzle = Family::Cube3.build();
        let sequence = Sequence::from_turns(&puzzle, &[1, 3, 5, 7]).unwrap();
        assert_eq!(sequence.invert(&puzzle).turns, vec![6, 4, 2, 0]);
        assert!(sequence
            .compose(&puzzle, &sequence.invert(&puzzle))
            .effect
            .is_identity());
    }

    #[test]
    fn from_turns_rejects_bad_index() {
        let puzzle = Family::Cube2.build();
        assert!(matches!(
            Sequence::from_turns(&puzzle, &[0, 99]),
            Err(Error::IllegalMove { turn_index: 99, .. })
        ));
    }

    #[test]
    fn effect_matches_turn_application() {
        let puzzle = Family::Cube2.build();
        let sequence = Sequence::from_turns(&puzzle, &[0, 2, 5, 1]).unwrap();
        let from_turns = puzzle
            .apply_sequence(&puzzle.solved_state(), &sequence.turns)
            .unwrap();
        assert_eq!(puzzle.solved_state().then(&sequence.effect), from_turns);
    }

    #[test]
    fn conjugate_preserves_cycle_structure() {
        let puzzle = Family::Cube3.build();
        let setup = Sequence::from_turns(&puzzle, &[2, 4]).unwrap();
        let body = Sequence::from_turns(&puzzle, &[0]).unwrap();
        let conjugated = Sequence::conjugate(&puzzle, &setup, &body);

        let mut body_lengths: Vec<usize> =
            body.effect.cycles().iter().map(|c| c.len()).collect();
        let mut conj_lengths: Vec<usize> =
            conjugated.effect.cycles().iter().map(|c| c.len()).collect();
        body_lengths.sort_unstable();
        conj_lengths.sort_unstable();
        assert_eq!(body_lengths, conj_lengths);
    }

    #[test]
    fn commutator_layout() {
        let puzzle = Family::Cube3.build();
        let a = Sequence::from_turns(&puzzle, &[4]).unwrap();
        let b = Sequence::from_turns(&puzzle, &[0, 2]).unwrap();
        let c = Sequence::from_turns(&puzzle, &[6]).unwrap();
        let pattern = Sequence::commutator(&puzzle, &a, &b, &c);
        assert_eq!(pattern.turns, vec![4, 0, 2, 6, 3, 1, 7, 5]);
        let rebuilt = Sequence::from_turns(&puzzle, &pattern.turns).unwrap();
        assert_eq!(rebuilt.effect, pattern.effect);
    }

    #[test]
    fn discover_macros_cube2_depth_two() {
        let puzzle = Family::Cube2.build();
        let macros = discover_macros(&puzzle, |_| true, 2);
        // 6*6 two-turn combinations minus the 6 that cancel outright
        assert_eq!(macros.len(), 30);
        for sequence in &macros {
            let rebuilt = Sequence::from_turns(&puzzle, &sequence.turns).unwrap();
            assert_eq!(rebuilt.effect, sequence.effect);
            assert!(sequence.affected_pieces > 0);
        }
    }

    #[test]
    fn dedup_keeps_shortest_per_effect() {
        let puzzle = Family::Cube2.build();
        let library = MacroLibrary::build(&puzzle, 3);
        let mut seen = std::collections::HashSet::new();
        for sequence in library.macros() {
            assert!(seen.insert(sequence.effect.0.clone()), "duplicate effect");
        }
        // a single turn's effect is never stored under a longer sequence
        let single = Sequence::from_turns(&puzzle, &[0]).unwrap();
        let (differences, best) = library.most_similar(&single.effect).next().unwrap();
        assert_eq!(differences, 0);
        assert_eq!(best.turns.len(), 1);
    }

    #[test]
    fn shorter_equivalent_finds_triple_turn() {
        let puzzle = Family::Cube2.build();
        let library = MacroLibrary::build(&puzzle, 3);
        // three quarter-turns of one face equal the single reverse turn
        let triple = Sequence::from_turns(&puzzle, &[0, 0, 0]).unwrap();
        let (known, saved) = library.shorter_equivalent(&triple).unwrap();
        assert_eq!(known.turns, vec![1]);
        assert_eq!(saved, 2);
    }
}
