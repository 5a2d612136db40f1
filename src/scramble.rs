//! Seeded random scrambling.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::puzzle::{PuzzleState, TwistyPuzzle};

/// Applies `num_turns` uniformly drawn turns, never drawing two consecutive
/// turns on the same cut (a turn followed by its inverse or by more of
/// itself cancels or merges, which weakens the mix). Returns the scrambled
/// state and the turns applied.
pub fn scramble<R: Rng>(
    puzzle: &TwistyPuzzle,
    initial_state: &PuzzleState,
    num_turns: usize,
    rng: &mut R,
) -> (PuzzleState, Vec<usize>) {
    let mut state = initial_state.clone();
    let mut turns = Vec::with_capacity(num_turns);
    let mut previous_cut: Option<usize> = None;

    for _ in 0..num_turns {
        let turn_index = loop {
            let candidate = rng.random_range(0..puzzle.num_turns());
            if Some(puzzle.turns()[candidate].cut) != previous_cut {
                break candidate;
            }
        };
        previous_cut = Some(puzzle.turns()[turn_index].cut);
        state = state.then(&puzzle.turns()[turn_index].permutation);
        turns.push(turn_index);
    }

    (state, turns)
}

/// Deterministic scramble: the same seed and turn count always produce the
/// same state.
pub fn scramble_seeded(
    puzzle: &TwistyPuzzle,
    initial_state: &PuzzleState,
    num_turns: usize,
    seed: u64,
) -> (PuzzleState, Vec<usize>) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    scramble(puzzle, initial_state, num_turns, &mut rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::families::Family;

    #[test]
    fn seeded_scramble_is_deterministic() {
        let puzzle = Family::Cube3.build();
        let solved = puzzle.solved_state();
        let (a, turns_a) = scramble_seeded(&puzzle, &solved, 50, 7);
        let (b, turns_b) = scramble_seeded(&puzzle, &solved, 50, 7);
        assert_eq!(a, b);
        assert_eq!(turns_a, turns_b);
        let (c, _) = scramble_seeded(&puzzle, &solved, 50, 8);
        assert_ne!(a, c);
    }

    #[test]
    fn consecutive_turns_use_different_cuts() {
        let puzzle = Family::Megaminx.build();
        let (_, turns) = scramble_seeded(&puzzle, &puzzle.solved_state(), 200, 3);
        assert_eq!(turns.len(), 200);
        for pair in turns.windows(2) {
            assert_ne!(
                puzzle.turns()[pair[0]].cut,
                puzzle.turns()[pair[1]].cut,
                "consecutive turns share a cut"
            );
        }
    }

    #[test]
    fn scrambled_state_is_reachable() {
        let puzzle = Family::Cube2.build();
        let (state, turns) = scramble_seeded(&puzzle, &puzzle.solved_state(), 30, 42);
        let replayed = puzzle.apply_sequence(&puzzle.solved_state(), &turns).unwrap();
        assert_eq!(state, replayed);
        assert!(puzzle.placements(&state).is_ok());
    }
}
