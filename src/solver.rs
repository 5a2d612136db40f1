//! Phased commutator solver.
//!
//! Solving runs in stages. A bounded iterative-deepening search first
//! handles states within a few turns of solved. Anything deeper goes through
//! per-piece-type phases: each phase positions and orients one piece type
//! using setup-conjugated 3-cycles and commutator patterns discovered from
//! the macro library, preserving the types already finished. Because a
//! 3-cycle can never improve a state with exactly two pieces of the target
//! type left, every phase also carries an endgame pool (tool conjugates and
//! surgical macros, tried in pairs) and, as a last resort, reshuffles the
//! final two pieces with the parity flipper under rotating setups until a
//! productive arrangement appears. A final reduction pass rewrites the
//! solution against the library, replacing any window with a shorter known
//! equivalent and dropping windows that cancel outright.
//!
//! Phase tools (the 3-cycle B and parity flipper per piece type) are
//! discovered once at construction and reused for every solve.

use std::rc::Rc;

use log::{debug, info};
use rustc_hash::FxHashSet;

use crate::algebra::{dedup_by_effect, traverse_combinations, MacroLibrary, Sequence, TraverseResult};
use crate::permutation::{Permutation, PermutationTrie};
use crate::puzzle::{PieceType, PuzzleState, TwistyPuzzle};
use crate::Error;

/// Iteration cap per phase; hitting it means the phase stalled.
const MAX_PHASE_ITERATIONS: usize = 60;

/// Full passes over the phase list before giving up. Later passes see the
/// states produced by earlier kicks, so they are not retreads.
const MAX_SOLVE_ROUNDS: usize = 4;

/// Longest solution window the reduction pass rewrites at once.
const REDUCTION_WINDOW: usize = 6;

/// Cap on starting points for the pairwise 3-cycle discovery.
const MAX_DISCOVERY_STARTS: usize = 400;

/// Cap on similarity candidates examined per starting point.
const MAX_SIMILARITY_CANDIDATES: usize = 2500;

/// Library macros carried into each phase's endgame pool; the library is
/// sorted fewest-affected-first, so the head holds the most surgical ones.
const MAX_POOL_MACROS: usize = 150;

/// Cap on a phase's endgame pool after dedup.
const MAX_ENDGAME_POOL: usize = 900;

pub struct Solver {
    puzzle: Rc<TwistyPuzzle>,
    library: MacroLibrary,
    phases: Vec<Phase>,
    /// Each turn wrapped as a one-turn sequence, reused by the setup search.
    turn_sequences: Vec<Sequence>,
    direct_depth: usize,
    setup_depth: usize,
}

/// One solving phase: fix every piece of one type while preserving the
/// types already solved.
struct Phase {
    /// Index into the puzzle's piece type table.
    target: usize,
    /// Piece type indices that must stay solved.
    preserve: Vec<usize>,
    three_cycle: Option<Sequence>,
    parity_flipper: Option<Sequence>,
    /// Tool conjugates and surgical preserving macros, tried in pairs when
    /// the conjugate tiers cannot improve (the two-piece endgame).
    endgame_pool: Vec<Sequence>,
}

/// Running best candidate while scanning one phase step's tiers.
///
/// A candidate is accepted only if it raises the target type's solved count
/// without dropping any preserved type below its current count. The scan is
/// greedy: the first improvement wins the tier.
struct StepSearch<'a> {
    puzzle: &'a TwistyPuzzle,
    state: &'a PuzzleState,
    target: &'a PieceType,
    preserve: &'a [usize],
    preserved_now: &'a [usize],
    best: Option<Sequence>,
    best_score: usize,
}

impl StepSearch<'_> {
    fn consider(&mut self, candidate: Sequence) -> TraverseResult {
        let next = self.state.then(&candidate.effect);
        let keeps_preserved = self
            .preserve
            .iter()
            .zip(self.preserved_now)
            .all(|(&piece_type, &count)| {
                self.puzzle
                    .num_solved_of_type(&next, &self.puzzle.piece_types()[piece_type])
                    >= count
            });
        if !keeps_preserved {
            return TraverseResult::Continue;
        }
        let score = self.puzzle.num_solved_of_type(&next, self.target);
        if score > self.best_score {
            self.best_score = score;
            self.best = Some(candidate);
            return TraverseResult::Break;
        }
        TraverseResult::Continue
    }
}

impl Solver {
    pub fn new(puzzle: Rc<TwistyPuzzle>) -> Self {
        let num_turns = puzzle.num_turns();
        let macro_depth = if num_turns <= 12 { 4 } else { 2 };
        let direct_depth = if num_turns <= 12 { 4 } else { 3 };
        let setup_depth = if num_turns <= 12 { 4 } else { 2 };
        let pool_setup_depth = match num_turns {
            0..=6 => 3,
            7..=12 => 2,
            _ => 1,
        };

        let library = MacroLibrary::build(&puzzle, macro_depth);
        info!(
            "macro library: {} distinct effects up to {} turns",
            library.len(),
            macro_depth
        );

        let turn_sequences: Vec<Sequence> = (0..num_turns)
            .map(|turn_index| {
                Sequence::new(
                    &puzzle,
                    vec![turn_index],
                    puzzle.turns()[turn_index].permutation.clone(),
                )
            })
            .collect();

        let mut phases = Vec::new();
        let mut preserve: Vec<usize> = Vec::new();
        for (type_index, piece_type) in puzzle.piece_types().iter().enumerate() {
            let phase = build_phase(
                &puzzle,
                &library,
                &turn_sequences,
                type_index,
                preserve.clone(),
                pool_setup_depth,
            );
            info!(
                "phase {}: target {} ({} pieces), 3-cycle {}, parity flipper {}, pool {}",
                phases.len(),
                piece_type.name,
                piece_type.pieces.len(),
                phase
                    .three_cycle
                    .as_ref()
                    .map_or("none".to_string(), |s| format!("{} turns", s.len())),
                phase
                    .parity_flipper
                    .as_ref()
                    .map_or("none".to_string(), |s| format!("{} turns", s.len())),
                phase.endgame_pool.len(),
            );
            phases.push(phase);
            preserve.push(type_index);
        }

        Solver {
            puzzle,
            library,
            phases,
            turn_sequences,
            direct_depth,
            setup_depth,
        }
    }

    /// Finds a turn sequence driving `state` to solved.
    ///
    /// Returns an empty sequence for an already-solved state. States not
    /// assembled from whole pieces, and states the bounded search cannot
    /// finish, fail with [`Error::UnsolvableState`].
    pub fn solve(&self, state: &PuzzleState) -> Result<Vec<usize>, Error> {
        self.puzzle.placements(state)?;
        if self.puzzle.is_solved(state) {
            return Ok(vec![]);
        }

        if let Some(direct) = direct_search(&self.puzzle, state, self.direct_depth) {
            debug!("direct search solved in {} turns", direct.len());
            return Ok(self.reduce(direct));
        }

        let mut current = state.clone();
        let mut solution: Vec<usize> = Vec::new();
        let mut kick_counter = 0;
        let mut solved = false;

        for round in 0..MAX_SOLVE_ROUNDS {
            let before = current.clone();
            for (phase_index, phase) in self.phases.iter().enumerate() {
                self.run_phase(phase_index, phase, &mut current, &mut solution, &mut kick_counter);
            }
            if self.puzzle.is_solved(&current) {
                solved = true;
                break;
            }
            // phases got close but stalled; a short exact search from here
            // is cheap compared to what came before
            if let Some(tail) = direct_search(&self.puzzle, &current, self.direct_depth) {
                current = self.puzzle.apply_sequence(&current, &tail)?;
                solution.extend(tail);
                solved = true;
                break;
            }
            if current == before {
                break;
            }
            debug!("round {round} ended unsolved; continuing from the kicked state");
        }

        if !solved {
            return Err(Error::UnsolvableState {
                reason: "search budget exhausted before reaching solved",
            });
        }
        Ok(self.reduce(solution))
    }

    /// Rewrites `turns` against the macro library: any window with an
    /// identity net effect is dropped, and any window whose net effect the
    /// library knows under fewer turns is replaced. Repeats to a fixed
    /// point; every rewrite strictly shortens the sequence.
    pub fn reduce(&self, mut turns: Vec<usize>) -> Vec<usize> {
        let before = turns.len();
        loop {
            let mut rewrite: Option<(usize, usize, Vec<usize>)> = None;
            'scan: for start in 0..turns.len() {
                let limit = turns.len().min(start + REDUCTION_WINDOW);
                for end in (start + 2..=limit).rev() {
                    let Ok(window) = Sequence::from_turns(&self.puzzle, &turns[start..end]) else {
                        continue;
                    };
                    if window.effect.is_identity() {
                        rewrite = Some((start, end, vec![]));
                        break 'scan;
                    }
                    if let Some((known, _)) = self.library.shorter_equivalent(&window) {
                        rewrite = Some((start, end, known.turns.clone()));
                        break 'scan;
                    }
                }
            }
            match rewrite {
                Some((start, end, replacement)) => {
                    turns.splice(start..end, replacement);
                }
                None => break,
            }
        }
        if turns.len() < before {
            debug!("reduction: {before} turns -> {}", turns.len());
        }
        turns
    }

    /// Drives one phase until its type is fully solved, its iteration budget
    /// runs out, or it revisits a state (a kick loop).
    fn run_phase(
        &self,
        phase_index: usize,
        phase: &Phase,
        current: &mut PuzzleState,
        solution: &mut Vec<usize>,
        kick_counter: &mut usize,
    ) {
        let target = &self.puzzle.piece_types()[phase.target];
        let mut seen: FxHashSet<PuzzleState> = FxHashSet::default();
        for _ in 0..MAX_PHASE_ITERATIONS {
            let solved = self.puzzle.num_solved_of_type(current, target);
            if solved == target.pieces.len() {
                break;
            }
            if !seen.insert(current.clone()) {
                debug!("phase {phase_index} revisited a state; stopping");
                break;
            }
            let step = match self.best_step(phase, current) {
                Some(step) => step,
                None => match self.kick(phase, current, kick_counter) {
                    Some(kick) => {
                        debug!(
                            "phase {phase_index}: no improving step at {solved}/{} {}; kicking",
                            target.pieces.len(),
                            target.name
                        );
                        kick
                    }
                    None => {
                        debug!(
                            "phase {phase_index} stalled at {solved}/{} {}",
                            target.pieces.len(),
                            target.name
                        );
                        break;
                    }
                },
            };
            *current = current.then(&step.effect);
            solution.extend(step.turns);
        }
    }

    /// The next sequence to apply for `phase`, or `None` when no candidate
    /// improves the phase's solved count.
    fn best_step(&self, phase: &Phase, state: &PuzzleState) -> Option<Sequence> {
        let puzzle = self.puzzle.as_ref();
        let target = &puzzle.piece_types()[phase.target];
        let solved = puzzle.num_solved_of_type(state, target);
        let unsolved = target.pieces.len() - solved;
        let preserved_now: Vec<usize> = phase
            .preserve
            .iter()
            .map(|&pt| puzzle.num_solved_of_type(state, &puzzle.piece_types()[pt]))
            .collect();
        let mut search = StepSearch {
            puzzle,
            state,
            target,
            preserve: &phase.preserve,
            preserved_now: &preserved_now,
            best: None,
            best_score: solved,
        };

        // Setup-conjugated bodies, both directions of each tool. The parity
        // flipper joins once at most two pieces remain (a lone swap or twist
        // pair is out of reach of any 3-cycle).
        let mut bodies: Vec<Sequence> = Vec::new();
        if let Some(three_cycle) = &phase.three_cycle {
            bodies.push(three_cycle.clone());
            bodies.push(three_cycle.invert(puzzle));
        }
        if unsolved <= 2 {
            if let Some(flipper) = &phase.parity_flipper {
                bodies.push(flipper.clone());
                bodies.push(flipper.invert(puzzle));
            }
        }
        if !bodies.is_empty() {
            traverse_combinations(
                &self.turn_sequences,
                self.setup_depth,
                Sequence::empty(puzzle),
                |setup: &Sequence, turn: &Sequence| setup.compose(puzzle, turn),
                &mut |setup| {
                    for body in &bodies {
                        if let TraverseResult::Break =
                            search.consider(Sequence::conjugate(puzzle, setup, body))
                        {
                            return TraverseResult::Break;
                        }
                    }
                    TraverseResult::Continue
                },
            );
        }

        // Orientation corrections the plain conjugates missed: the full
        // commutator pattern A B C B' C' A' with single-turn reorienters C.
        if search.best.is_none() {
            if let Some(three_cycle) = &phase.three_cycle {
                traverse_combinations(
                    &self.turn_sequences,
                    2,
                    Sequence::empty(puzzle),
                    |setup: &Sequence, turn: &Sequence| setup.compose(puzzle, turn),
                    &mut |setup| {
                        for reorienter in &self.turn_sequences {
                            let candidate =
                                Sequence::commutator(puzzle, setup, three_cycle, reorienter);
                            if let TraverseResult::Break = search.consider(candidate) {
                                return TraverseResult::Break;
                            }
                        }
                        TraverseResult::Continue
                    },
                );
            }
        }

        // Endgame: pairs from the pool. Two conjugated 3-cycles fix a twist
        // pair, and a conjugated flipper paired with anything covers the
        // arrangements the single-body tier missed.
        if search.best.is_none() && !phase.endgame_pool.is_empty() {
            traverse_combinations(
                &phase.endgame_pool,
                2,
                Sequence::empty(puzzle),
                |previous: &Sequence, next: &Sequence| previous.compose(puzzle, next),
                &mut |candidate| search.consider(candidate.clone()),
            );
        }

        search.best
    }

    /// Last-resort reshuffle when nothing improves and at most two pieces of
    /// the target type remain: applies the parity flipper under a rotating
    /// setup so the next iteration sees a different arrangement. Preserved
    /// types are never allowed to drop.
    fn kick(&self, phase: &Phase, state: &PuzzleState, counter: &mut usize) -> Option<Sequence> {
        let flipper = phase.parity_flipper.as_ref()?;
        let puzzle = self.puzzle.as_ref();
        let target = &puzzle.piece_types()[phase.target];
        let unsolved = target.pieces.len() - puzzle.num_solved_of_type(state, target);
        if unsolved == 0 || unsolved > 2 {
            return None;
        }
        let preserved_now: Vec<usize> = phase
            .preserve
            .iter()
            .map(|&pt| puzzle.num_solved_of_type(state, &puzzle.piece_types()[pt]))
            .collect();

        for _ in 0..=self.turn_sequences.len() {
            let setup_index = *counter % (self.turn_sequences.len() + 1);
            *counter += 1;
            let candidate = if setup_index == 0 {
                flipper.clone()
            } else {
                Sequence::conjugate(puzzle, &self.turn_sequences[setup_index - 1], flipper)
            };
            let next = state.then(&candidate.effect);
            if next == *state {
                continue;
            }
            let keeps_preserved = phase
                .preserve
                .iter()
                .zip(&preserved_now)
                .all(|(&pt, &count)| {
                    puzzle.num_solved_of_type(&next, &puzzle.piece_types()[pt]) >= count
                });
            if keeps_preserved {
                return Some(candidate);
            }
        }
        None
    }
}

/// Builds the tools for one phase: a 3-cycle on the target type, a parity
/// flipper when one exists in range, and the endgame pool.
fn build_phase(
    puzzle: &TwistyPuzzle,
    library: &MacroLibrary,
    turn_sequences: &[Sequence],
    target: usize,
    preserve: Vec<usize>,
    pool_setup_depth: usize,
) -> Phase {
    let target_type = &puzzle.piece_types()[target];
    let preserving: Vec<Sequence> = library
        .macros()
        .iter()
        .filter(|sequence| preserves(puzzle, &sequence.effect, &preserve))
        .cloned()
        .collect();

    let mut three_cycle: Option<Sequence> = None;
    let mut parity_flipper: Option<Sequence> = None;

    // Cheapest first: the library may already hold the tools. Types outside
    // target and preserve are sacrificial; only the target count matters.
    for sequence in &preserving {
        if three_cycle.is_none()
            && affected_of_type(puzzle, &sequence.effect, target_type) == 3
        {
            three_cycle = Some(sequence.clone());
        }
        if parity_flipper.is_none()
            && has_single_even_cycle(&sequence.effect, &target_type.sticker_mask)
        {
            parity_flipper = Some(sequence.clone());
        }
        if three_cycle.is_some() && parity_flipper.is_some() {
            break;
        }
    }

    // Otherwise combine near-identical macros from the whole library: if two
    // sequences move the target type's stickers almost the same way, one
    // composed with the other's inverse cancels most of the motion and
    // leaves a short cycle. The halves may disturb the preserved types as
    // long as the combination does not.
    if three_cycle.is_none() || parity_flipper.is_none() {
        let mut trie = PermutationTrie::new();
        for (position, sequence) in library.macros().iter().enumerate() {
            trie.insert(&sequence.effect.mask(&target_type.sticker_mask), position);
        }
        for initial in library.macros().iter().take(MAX_DISCOVERY_STARTS) {
            let masked = initial.effect.mask(&target_type.sticker_mask);
            let combined = trie
                .most_similar(&masked)
                .take(MAX_SIMILARITY_CANDIDATES)
                .find_map(|(differences, &position)| {
                    if differences == 0 {
                        return None;
                    }
                    let combined =
                        initial.compose(puzzle, &library.macros()[position].invert(puzzle));
                    if preserves(puzzle, &combined.effect, &preserve)
                        && affected_of_type(puzzle, &combined.effect, target_type) > 0
                    {
                        Some(combined)
                    } else {
                        None
                    }
                });
            let Some(combined) = combined else { continue };
            if three_cycle.is_none()
                && affected_of_type(puzzle, &combined.effect, target_type) == 3
            {
                three_cycle = Some(combined);
            } else if parity_flipper.is_none()
                && has_single_even_cycle(&combined.effect, &target_type.sticker_mask)
            {
                parity_flipper = Some(combined);
            }
            if three_cycle.is_some() && parity_flipper.is_some() {
                break;
            }
        }
    }

    let endgame_pool = build_endgame_pool(
        puzzle,
        turn_sequences,
        &preserving,
        three_cycle.as_ref(),
        parity_flipper.as_ref(),
        pool_setup_depth,
    );

    Phase {
        target,
        preserve,
        three_cycle,
        parity_flipper,
        endgame_pool,
    }
}

/// Candidate pool for the two-piece endgame: every tool conjugated by every
/// short setup, both directions, plus the most surgical preserving macros.
fn build_endgame_pool(
    puzzle: &TwistyPuzzle,
    turn_sequences: &[Sequence],
    preserving: &[Sequence],
    three_cycle: Option<&Sequence>,
    parity_flipper: Option<&Sequence>,
    setup_depth: usize,
) -> Vec<Sequence> {
    let mut tools: Vec<Sequence> = Vec::new();
    for tool in [three_cycle, parity_flipper].into_iter().flatten() {
        tools.push(tool.clone());
        tools.push(tool.invert(puzzle));
    }

    let mut pool: Vec<Sequence> = preserving.iter().take(MAX_POOL_MACROS).cloned().collect();
    if !tools.is_empty() {
        traverse_combinations(
            turn_sequences,
            setup_depth,
            Sequence::empty(puzzle),
            |setup: &Sequence, turn: &Sequence| setup.compose(puzzle, turn),
            &mut |setup| {
                for tool in &tools {
                    pool.push(Sequence::conjugate(puzzle, setup, tool));
                }
                TraverseResult::Continue
            },
        );
    }
    let mut pool = dedup_by_effect(pool);
    pool.retain(|sequence| sequence.affected_pieces > 0);
    pool.truncate(MAX_ENDGAME_POOL);
    pool
}

/// True if every piece of every listed type is solved under `effect`.
fn preserves(puzzle: &TwistyPuzzle, effect: &Permutation, preserve: &[usize]) -> bool {
    preserve.iter().all(|&type_index| {
        let piece_type = &puzzle.piece_types()[type_index];
        puzzle.num_solved_of_type(effect, piece_type) == piece_type.pieces.len()
    })
}

/// Number of pieces of `piece_type` displaced or reoriented by `effect`.
fn affected_of_type(puzzle: &TwistyPuzzle, effect: &Permutation, piece_type: &PieceType) -> usize {
    piece_type.pieces.len() - puzzle.num_solved_of_type(effect, piece_type)
}

/// True if exactly one cycle of `effect` is an even-length cycle inside the
/// masked slots. Such an effect swaps a pair, which a 3-cycle never can.
fn has_single_even_cycle(effect: &Permutation, mask: &[bool]) -> bool {
    effect
        .cycles()
        .iter()
        .filter(|cycle| mask[cycle[0]] && cycle.len() % 2 == 0)
        .count()
        == 1
}

/// Exhaustive iterative-deepening search for an exact solution within
/// `depth` turns. The bound shrinks each time a solution is found, so the
/// result is the shortest within the limit.
fn direct_search(puzzle: &TwistyPuzzle, state: &PuzzleState, depth: usize) -> Option<Vec<usize>> {
    struct StateToExpand {
        puzzle_state: PuzzleState,
        turn_index: usize,
    }

    fn increment(fringe_stack: &mut Vec<StateToExpand>, num_turns: usize) {
        while let Some(state_to_increment) = fringe_stack.last_mut() {
            if state_to_increment.turn_index < num_turns - 1 {
                state_to_increment.turn_index += 1;
                break;
            } else {
                fringe_stack.pop();
            }
        }
    }

    let num_turns = puzzle.num_turns();
    if num_turns == 0 {
        return None;
    }
    let mut max_size = depth + 1;
    let mut best: Option<Vec<usize>> = None;
    let mut fringe_stack = vec![StateToExpand {
        puzzle_state: state.clone(),
        turn_index: 0,
    }];

    while let Some(state_to_expand) = fringe_stack.last() {
        if fringe_stack.len() < max_size {
            let derived = state_to_expand
                .puzzle_state
                .then(&puzzle.turns()[state_to_expand.turn_index].permutation);
            if puzzle.is_solved(&derived) {
                best = Some(fringe_stack.iter().map(|s| s.turn_index).collect());
                max_size = fringe_stack.len();
                increment(&mut fringe_stack, num_turns);
            } else {
                fringe_stack.push(StateToExpand {
                    puzzle_state: derived,
                    turn_index: 0,
                });
            }
        } else {
            increment(&mut fringe_stack, num_turns);
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::families::Family;
    use crate::scramble::scramble_seeded;

    #[test]
    fn solved_state_solves_to_empty() {
        let puzzle = Rc::new(Family::Cube2.build());
        let solver = Solver::new(Rc::clone(&puzzle));
        assert_eq!(solver.solve(&puzzle.solved_state()), Ok(vec![]));
    }

    #[test]
    fn single_turn_scramble_is_undone() {
        let puzzle = Rc::new(Family::Cube3.build());
        let solver = Solver::new(Rc::clone(&puzzle));
        let state = puzzle.apply_turn(&puzzle.solved_state(), 0).unwrap();
        let solution = solver.solve(&state).unwrap();
        let end = puzzle.apply_sequence(&state, &solution).unwrap();
        assert!(puzzle.is_solved(&end));
        // the net effect must undo the scrambling turn
        let net = Sequence::from_turns(&puzzle, &solution).unwrap();
        assert_eq!(net.effect, puzzle.turns()[0].permutation.invert());
    }

    #[test]
    fn shallow_scramble_is_solved() {
        let puzzle = Rc::new(Family::Cube2.build());
        let solver = Solver::new(Rc::clone(&puzzle));
        let (state, _) = scramble_seeded(&puzzle, &puzzle.solved_state(), 3, 11);
        let solution = solver.solve(&state).unwrap();
        let end = puzzle.apply_sequence(&state, &solution).unwrap();
        assert!(puzzle.is_solved(&end));
    }

    #[test]
    fn deep_scramble_cube2_is_solved() {
        let puzzle = Rc::new(Family::Cube2.build());
        let solver = Solver::new(Rc::clone(&puzzle));
        for seed in [5, 25] {
            let (state, _) = scramble_seeded(&puzzle, &puzzle.solved_state(), 25, seed);
            let solution = solver.solve(&state).unwrap();
            let end = puzzle.apply_sequence(&state, &solution).unwrap();
            assert!(puzzle.is_solved(&end), "seed {seed} not solved");
        }
    }

    #[test]
    fn deep_scramble_cube3_is_solved() {
        let puzzle = Rc::new(Family::Cube3.build());
        let solver = Solver::new(Rc::clone(&puzzle));
        let (state, _) = scramble_seeded(&puzzle, &puzzle.solved_state(), 25, 5);
        let solution = solver.solve(&state).unwrap();
        let end = puzzle.apply_sequence(&state, &solution).unwrap();
        assert!(puzzle.is_solved(&end));
    }

    #[test]
    fn malformed_state_is_rejected() {
        let puzzle = Rc::new(Family::Cube3.build());
        let solver = Solver::new(Rc::clone(&puzzle));
        // move a single sticker without the rest of its piece
        let mut state = puzzle.solved_state();
        let piece_of_zero = puzzle
            .pieces()
            .iter()
            .position(|piece| piece.stickers.contains(&0))
            .unwrap();
        let foreign_slot = (0..puzzle.num_stickers())
            .find(|slot| !puzzle.pieces()[piece_of_zero].stickers.contains(slot))
            .unwrap();
        state.0.swap(0, foreign_slot);
        assert!(matches!(
            solver.solve(&state),
            Err(Error::UnsolvableState { .. })
        ));
    }

    #[test]
    fn reduce_drops_cancelling_turns() {
        let puzzle = Rc::new(Family::Cube2.build());
        let solver = Solver::new(Rc::clone(&puzzle));
        assert_eq!(solver.reduce(vec![0, 2, 3, 1]), Vec::<usize>::new());
    }

    #[test]
    fn reduce_collapses_triple_turn() {
        let puzzle = Rc::new(Family::Cube2.build());
        let solver = Solver::new(Rc::clone(&puzzle));
        let reduced = solver.reduce(vec![0, 0, 0]);
        assert_eq!(reduced, vec![1]);
        let original = Sequence::from_turns(&puzzle, &[0, 0, 0]).unwrap();
        let rewritten = Sequence::from_turns(&puzzle, &reduced).unwrap();
        assert_eq!(original.effect, rewritten.effect);
    }

    #[test]
    fn reduce_preserves_net_effect() {
        let puzzle = Rc::new(Family::Cube2.build());
        let solver = Solver::new(Rc::clone(&puzzle));
        let turns = vec![0, 2, 2, 2, 4, 5, 1];
        let reduced = solver.reduce(turns.clone());
        assert!(reduced.len() < turns.len());
        let original = Sequence::from_turns(&puzzle, &turns).unwrap();
        let rewritten = Sequence::from_turns(&puzzle, &reduced).unwrap();
        assert_eq!(original.effect, rewritten.effect);
    }

    #[test]
    fn conjugated_three_cycle_stays_a_three_cycle() {
        let puzzle = Rc::new(Family::Cube2.build());
        let solver = Solver::new(Rc::clone(&puzzle));
        for phase in &solver.phases {
            let Some(three_cycle) = &phase.three_cycle else {
                continue;
            };
            let setup = Sequence::from_turns(&puzzle, &[0, 2]).unwrap();
            let conjugated = Sequence::conjugate(&puzzle, &setup, three_cycle);
            assert_eq!(conjugated.affected_pieces, three_cycle.affected_pieces);
        }
    }
}
