//! Twisty Puzzle Engine
//!
//! Builds cube- and dodecahedron-family twisty puzzles by slicing regular
//! polyhedra with cut planes, tracks state as exact integer permutations of
//! sticker slots, scrambles and solves with commutator-based search, and
//! projects the 3D geometry to a flat 2D polygon buffer for rendering.
//!
//! The [`engine::Engine`] type is the intended entry point: it owns one
//! puzzle plus its camera and solver, and exposes the full operation set
//! behind a plain-data boundary.

pub mod algebra;
pub mod engine;
pub mod families;
pub mod geometry;
pub mod permutation;
pub mod project;
pub mod puzzle;
pub mod scramble;
pub mod solver;

pub use engine::Engine;
pub use families::Family;
pub use permutation::Permutation;
pub use puzzle::{PuzzleState, TwistyPuzzle};

/// Errors surfaced across the engine boundary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A turn index outside the puzzle's move table.
    #[error("illegal move: turn index {turn_index} out of range (puzzle has {num_turns} turns)")]
    IllegalMove { turn_index: usize, num_turns: usize },

    /// A move name that matches nothing in the puzzle's move table.
    #[error("unknown move name {name:?}")]
    UnknownMove { name: String },

    /// A state the solver cannot make progress on, either because it is
    /// not reachable by any turn sequence or because the search budget
    /// ran out before reaching the solved state.
    #[error("unsolvable state: {reason}")]
    UnsolvableState { reason: &'static str },

    /// A polygon buffer whose record structure does not add up.
    #[error("malformed polygon buffer at offset {offset}: {detail}")]
    MalformedBuffer { offset: usize, detail: &'static str },
}
