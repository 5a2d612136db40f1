//! Puzzle model: sticker slots, pieces, turns, and state transitions.
//!
//! A puzzle is built once by slicing a regular polyhedron with cut planes.
//! Every slice of surface becomes a sticker slot; stickers that are moved by
//! exactly the same set of cuts form a piece. Each cut yields a forward and a
//! reverse turn, and each turn is derived as an exact permutation of sticker
//! slots by rotating slot centroids and matching them against the slot table.
//!
//! State is the permutation from the solved configuration; applying a turn is
//! pure integer arithmetic, so arbitrarily long move sequences cannot drift.

use rustc_hash::FxHashMap;

use crate::geometry::{approx_eq, centroid, Plane, Polygon, Polyhedron, Ray, Vec3};
use crate::geometry::rotate_about_axis;
use crate::permutation::Permutation;
use crate::Error;

/// Gap between the two faces of a cut, so sliced stickers separate visibly.
const CUT_GAP: f64 = 0.005;

/// Index into a puzzle's color palette (one color per polyhedron face).
pub type ColorIndex = usize;

/// Current configuration of a puzzle: the sticker permutation from solved.
///
/// `state.0[slot]` is the home slot of the sticker currently shown at `slot`.
pub type PuzzleState = Permutation;

/// A cut plane with the rotation angle of one twist along it.
#[derive(Debug)]
pub struct Cut<'a> {
    name: Option<&'a str>,
    plane: Plane,
    angle: f64,
}

impl<'a> Cut<'a> {
    pub fn new(name: &'a str, plane: Plane, angle: f64) -> Self {
        Cut {
            name: Some(name),
            plane,
            angle,
        }
    }

    /// Cut whose turns are named automatically (`A`, `B`, ... in cut order).
    pub fn unnamed(plane: Plane, angle: f64) -> Self {
        Cut {
            name: None,
            plane,
            angle,
        }
    }
}

/// A fixed sticker slot: its polygon, home color, and the cuts that move it.
#[derive(Debug, Clone)]
pub struct Sticker {
    pub polygon: Polygon,
    pub home_color: ColorIndex,
    /// Cut indices whose turns displace this slot.
    affecting_cuts: Vec<usize>,
}

/// One twist of the puzzle: a slot permutation plus its physical rotation.
#[derive(Debug)]
pub struct Turn {
    /// Slot permutation in pull form (`perm[new] = old`).
    pub permutation: Permutation,
    /// The cut this turn rotates along. Forward and reverse turns of the
    /// same cut share it; the scrambler uses it to avoid trivial cancels.
    pub cut: usize,
    pub name: String,
    pub axis: Vec3,
    pub axis_point: Vec3,
    pub angle: f64,
}

/// A piece: sticker slots listed in cyclic order around the piece centroid.
#[derive(Debug)]
pub struct Piece {
    pub stickers: Vec<usize>,
}

/// Pieces that carry the same number of stickers (corners, edges, ...).
#[derive(Debug)]
pub struct PieceType {
    pub name: String,
    pub sticker_count: usize,
    /// Piece indices of this type.
    pub pieces: Vec<usize>,
    /// `mask[slot]` is true for slots belonging to pieces of this type.
    pub sticker_mask: Vec<bool>,
}

/// Where one piece currently sits, in the piece/orientation view of state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    /// Piece identity: the position it occupies when solved.
    pub home: usize,
    /// Position it occupies now.
    pub position: usize,
    /// Cyclic rotation away from home, in `0..symmetry`.
    pub orientation: usize,
    /// Rotational symmetry count (sticker count) of the piece.
    pub symmetry: usize,
}

/// A twisty puzzle's fixed tables: slots, turns, pieces, and piece types.
#[derive(Debug)]
pub struct TwistyPuzzle {
    stickers: Vec<Sticker>,
    turns: Vec<Turn>,
    pieces: Vec<Piece>,
    piece_types: Vec<PieceType>,
    /// `slot -> piece index` lookup.
    sticker_piece: Vec<usize>,
}

impl TwistyPuzzle {
    /// Builds a puzzle by slicing `polyhedron` with `cuts`.
    pub fn new(polyhedron: &Polyhedron, cuts: &[Cut]) -> Self {
        let mut stickers: Vec<Sticker> = polyhedron
            .faces
            .iter()
            .enumerate()
            .map(|(color, face)| Sticker {
                polygon: face.clone(),
                home_color: color,
                affecting_cuts: Vec::new(),
            })
            .collect();

        for (cut_index, cut) in cuts.iter().enumerate() {
            stickers = slice_stickers(&stickers, cut_index, &cut.plane);
        }

        let (pieces, sticker_piece) = group_pieces(&stickers);
        let piece_types = group_piece_types(&pieces, stickers.len());
        let turns = derive_turns(&stickers, cuts);

        log::debug!(
            "built puzzle: {} stickers, {} pieces ({} types), {} turns",
            stickers.len(),
            pieces.len(),
            piece_types.len(),
            turns.len()
        );

        TwistyPuzzle {
            stickers,
            turns,
            pieces,
            piece_types,
            sticker_piece,
        }
    }

    /// The solved configuration.
    pub fn solved_state(&self) -> PuzzleState {
        Permutation::identity(self.stickers.len())
    }

    /// True iff every piece sits at home with orientation zero.
    pub fn is_solved(&self, state: &PuzzleState) -> bool {
        state.is_identity()
    }

    /// All legal turns. Fixed per family; independent of state.
    #[inline]
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    #[inline]
    pub fn num_turns(&self) -> usize {
        self.turns.len()
    }

    /// The turn undoing `turn_index`.
    ///
    /// Turns are laid out in forward/reverse pairs, so this is an XOR.
    #[inline]
    pub fn inverse_turn(&self, turn_index: usize) -> usize {
        turn_index ^ 1
    }

    /// Looks a turn up by display name (e.g. `U`, `U'`, `B`).
    pub fn turn_by_name(&self, name: &str) -> Option<usize> {
        self.turns.iter().position(|turn| turn.name == name)
    }

    /// Applies one turn, rejecting selectors outside this family's table.
    pub fn apply_turn(&self, state: &PuzzleState, turn_index: usize) -> Result<PuzzleState, Error> {
        let turn = self.turns.get(turn_index).ok_or(Error::IllegalMove {
            turn_index,
            num_turns: self.turns.len(),
        })?;
        Ok(state.then(&turn.permutation))
    }

    /// Applies a whole sequence left to right.
    pub fn apply_sequence(&self, state: &PuzzleState, turns: &[usize]) -> Result<PuzzleState, Error> {
        turns
            .iter()
            .try_fold(state.clone(), |state, &turn| self.apply_turn(&state, turn))
    }

    #[inline]
    pub fn num_stickers(&self) -> usize {
        self.stickers.len()
    }

    #[inline]
    pub fn num_pieces(&self) -> usize {
        self.pieces.len()
    }

    #[inline]
    pub fn pieces(&self) -> &[Piece] {
        &self.pieces
    }

    /// Piece types in solving order: most stickers per piece first.
    #[inline]
    pub fn piece_types(&self) -> &[PieceType] {
        &self.piece_types
    }

    #[inline]
    pub fn stickers(&self) -> &[Sticker] {
        &self.stickers
    }

    /// Color currently shown at `slot`.
    #[inline]
    pub fn color_at(&self, state: &PuzzleState, slot: usize) -> ColorIndex {
        self.stickers[state.0[slot]].home_color
    }

    /// Turn indices whose cut moves `slot`.
    pub fn turns_affecting(&self, slot: usize) -> Vec<usize> {
        self.turns
            .iter()
            .enumerate()
            .filter(|(_, turn)| self.stickers[slot].affecting_cuts.contains(&turn.cut))
            .map(|(index, _)| index)
            .collect()
    }

    /// True if the piece is exactly home: position and orientation.
    pub fn piece_solved(&self, state: &PuzzleState, piece: usize) -> bool {
        self.pieces[piece]
            .stickers
            .iter()
            .all(|&slot| state.0[slot] == slot)
    }

    /// True if the piece occupying this position came from this position,
    /// regardless of orientation.
    pub fn piece_positioned(&self, state: &PuzzleState, piece: usize) -> bool {
        self.pieces[piece]
            .stickers
            .iter()
            .all(|&slot| self.sticker_piece[state.0[slot]] == piece)
    }

    /// Number of pieces exactly home.
    pub fn num_solved_pieces(&self, state: &PuzzleState) -> usize {
        (0..self.pieces.len())
            .filter(|&piece| self.piece_solved(state, piece))
            .count()
    }

    /// Number of pieces of one type exactly home.
    pub fn num_solved_of_type(&self, state: &PuzzleState, piece_type: &PieceType) -> usize {
        piece_type
            .pieces
            .iter()
            .filter(|&&piece| self.piece_solved(state, piece))
            .count()
    }

    /// Number of pieces of one type in their home position, any orientation.
    pub fn num_positioned_of_type(&self, state: &PuzzleState, piece_type: &PieceType) -> usize {
        piece_type
            .pieces
            .iter()
            .filter(|&&piece| self.piece_positioned(state, piece))
            .count()
    }

    /// Fraction of pieces exactly home, for progress reporting.
    pub fn solved_fraction(&self, state: &PuzzleState) -> f64 {
        self.num_solved_pieces(state) as f64 / self.pieces.len() as f64
    }

    /// The piece/orientation view of a state: one [`Placement`] per piece,
    /// indexed by current position.
    ///
    /// Fails with [`Error::UnsolvableState`] when the state was not assembled
    /// from whole pieces — stickers of one piece scattered across positions,
    /// or a sticker cycle that no rigid rotation produces.
    pub fn placements(&self, state: &PuzzleState) -> Result<Vec<Placement>, Error> {
        if state.len() != self.stickers.len() {
            return Err(Error::UnsolvableState {
                reason: "state length does not match the sticker table",
            });
        }
        let mut seen_home = vec![false; self.pieces.len()];
        let mut placements = Vec::with_capacity(self.pieces.len());
        for (position, piece) in self.pieces.iter().enumerate() {
            let origins: Vec<usize> = piece.stickers.iter().map(|&slot| state.0[slot]).collect();
            let home = self.sticker_piece[origins[0]];
            let home_cycle = &self.pieces[home].stickers;
            if home_cycle.len() != origins.len() {
                return Err(Error::UnsolvableState {
                    reason: "position holds stickers from a differently-sized piece",
                });
            }
            let offset = home_cycle
                .iter()
                .position(|&slot| slot == origins[0])
                .ok_or(Error::UnsolvableState {
                    reason: "sticker origin missing from its own piece",
                })?;
            let aligned = (0..origins.len())
                .all(|i| origins[i] == home_cycle[(offset + i) % home_cycle.len()]);
            if !aligned {
                return Err(Error::UnsolvableState {
                    reason: "sticker cycle is not a rigid rotation of a piece",
                });
            }
            if std::mem::replace(&mut seen_home[home], true) {
                return Err(Error::UnsolvableState {
                    reason: "two positions claim the same piece",
                });
            }
            placements.push(Placement {
                home,
                position,
                orientation: offset,
                symmetry: origins.len(),
            });
        }
        Ok(placements)
    }
}

/// Splits every sticker crossing the cut plane; the side along the normal is
/// marked as moved by this cut.
fn slice_stickers(stickers: &[Sticker], cut_index: usize, plane: &Plane) -> Vec<Sticker> {
    let outer_plane = plane.offset(CUT_GAP);
    let inner_plane = plane.offset(-CUT_GAP);
    let mut sliced = Vec::with_capacity(stickers.len());

    for sticker in stickers {
        let mut above = VertexChain::new();
        let mut below = VertexChain::new();
        let vertices = &sticker.polygon.vertices;
        // pair each vertex with its side, repeating the first vertex so the
        // closing edge is walked too
        let tagged: Vec<(Vec3, bool)> = vertices
            .iter()
            .chain(std::iter::once(&vertices[0]))
            .map(|&v| (v, plane.side(&v) > 0.0))
            .collect();

        for edge in tagged.windows(2) {
            let (vertex_a, a_above) = edge[0];
            let (vertex_b, b_above) = edge[1];
            if a_above && b_above {
                above.push(vertex_a);
            } else if !a_above && !b_above {
                below.push(vertex_a);
            } else {
                // edge crosses the cut: split it against both gap planes
                if a_above {
                    above.push(vertex_a);
                } else {
                    below.push(vertex_a);
                }
                let edge_ray = Ray {
                    point: vertex_a,
                    direction: vertex_a - vertex_b,
                };
                above.push(outer_plane.intersection(&edge_ray));
                below.push(inner_plane.intersection(&edge_ray));
            }
        }

        let above = above.into_vec();
        let below = below.into_vec();
        if above.len() > 2 {
            let mut affecting_cuts = sticker.affecting_cuts.clone();
            affecting_cuts.push(cut_index);
            sliced.push(Sticker {
                polygon: Polygon { vertices: above },
                home_color: sticker.home_color,
                affecting_cuts,
            });
        }
        if below.len() > 2 {
            sliced.push(Sticker {
                polygon: Polygon { vertices: below },
                home_color: sticker.home_color,
                affecting_cuts: sticker.affecting_cuts.clone(),
            });
        }
    }

    sliced
}

/// Groups slots into pieces: slots moved by the same set of cuts move as one
/// rigid unit. Stickers of each piece are then ordered cyclically around the
/// piece centroid so orientation becomes a plain rotation offset.
fn group_pieces(stickers: &[Sticker]) -> (Vec<Piece>, Vec<usize>) {
    let mut groups: FxHashMap<Vec<usize>, Vec<usize>> = FxHashMap::default();
    for (slot, sticker) in stickers.iter().enumerate() {
        let mut key = sticker.affecting_cuts.clone();
        key.sort_unstable();
        groups.entry(key).or_default().push(slot);
    }

    // deterministic piece numbering regardless of hash order
    let mut pieces: Vec<Vec<usize>> = groups.into_values().collect();
    pieces.sort_by_key(|slots| slots[0]);

    let mut sticker_piece = vec![0; stickers.len()];
    let pieces: Vec<Piece> = pieces
        .into_iter()
        .enumerate()
        .map(|(piece_index, slots)| {
            for &slot in &slots {
                sticker_piece[slot] = piece_index;
            }
            Piece {
                stickers: cyclic_order(&slots, stickers),
            }
        })
        .collect();

    (pieces, sticker_piece)
}

/// Orders a piece's slots by angle around the outward axis through the piece
/// centroid. Rigid turns preserve this cyclic order, which is what makes the
/// orientation offset in [`Placement`] well defined.
fn cyclic_order(slots: &[usize], stickers: &[Sticker]) -> Vec<usize> {
    if slots.len() <= 2 {
        return slots.to_vec();
    }
    let slot_centroids: Vec<Vec3> = slots
        .iter()
        .map(|&slot| stickers[slot].polygon.centroid())
        .collect();
    let piece_centroid = centroid(&slot_centroids);
    let axis = piece_centroid.normalize();
    let reference = (slot_centroids[0] - axis * slot_centroids[0].dot(&axis)).normalize();
    let binormal = axis.cross(&reference);

    let mut ordered: Vec<(f64, usize)> = slots
        .iter()
        .zip(slot_centroids.iter())
        .map(|(&slot, point)| {
            let angle = point.dot(&binormal).atan2(point.dot(&reference));
            (angle, slot)
        })
        .collect();
    ordered.sort_by(|a, b| a.0.total_cmp(&b.0));
    ordered.into_iter().map(|(_, slot)| slot).collect()
}

/// Splits pieces into types by sticker count, most stickers first.
fn group_piece_types(pieces: &[Piece], num_stickers: usize) -> Vec<PieceType> {
    let mut by_count: FxHashMap<usize, Vec<usize>> = FxHashMap::default();
    for (index, piece) in pieces.iter().enumerate() {
        by_count.entry(piece.stickers.len()).or_default().push(index);
    }

    let mut counts: Vec<usize> = by_count.keys().copied().collect();
    counts.sort_unstable_by(|a, b| b.cmp(a));

    counts
        .into_iter()
        .map(|sticker_count| {
            let mut members = by_count.remove(&sticker_count).unwrap_or_default();
            members.sort_unstable();
            let mut sticker_mask = vec![false; num_stickers];
            for &piece in &members {
                for &slot in &pieces[piece].stickers {
                    sticker_mask[slot] = true;
                }
            }
            PieceType {
                name: match sticker_count {
                    1 => "centers".to_string(),
                    2 => "edges".to_string(),
                    3 => "corners".to_string(),
                    n => format!("{n}-sticker pieces"),
                },
                sticker_count,
                pieces: members,
                sticker_mask,
            }
        })
        .collect()
}

/// Derives the forward/reverse turn pair of every cut by rotating affected
/// slot centroids and matching them back against the slot table.
fn derive_turns(stickers: &[Sticker], cuts: &[Cut]) -> Vec<Turn> {
    let slot_centroids: Vec<Vec3> = stickers
        .iter()
        .map(|sticker| sticker.polygon.centroid())
        .collect();

    let mut inferred_name = b'A';
    let mut turns = Vec::with_capacity(cuts.len() * 2);
    for (cut_index, cut) in cuts.iter().enumerate() {
        let base_name = match cut.name {
            Some(name) => name.to_string(),
            None => {
                let name = (inferred_name as char).to_string();
                inferred_name += 1;
                name
            }
        };
        let axis = cut.plane.normal.normalize();

        for (name, angle) in [
            (base_name.clone(), -cut.angle),
            (format!("{base_name}'"), cut.angle),
        ] {
            let destinations: Vec<usize> = stickers
                .iter()
                .enumerate()
                .map(|(slot, sticker)| {
                    if !sticker.affecting_cuts.contains(&cut_index) {
                        return slot;
                    }
                    let moved =
                        rotate_about_axis(&slot_centroids[slot], &axis, angle, &cut.plane.point);
                    slot_centroids
                        .iter()
                        .position(|other| approx_eq(other, &moved))
                        // a centroid that lands nowhere maps to itself; only
                        // possible if the cut geometry is degenerate
                        .unwrap_or(slot)
                })
                .collect();
            turns.push(Turn {
                // destinations[old] = new; pull form wants perm[new] = old
                permutation: Permutation(destinations).invert(),
                cut: cut_index,
                name,
                axis,
                axis_point: cut.plane.point,
                angle,
            });
        }
    }
    turns
}

/// Vertex accumulator that drops approximate duplicates, including a
/// duplicate closing vertex.
struct VertexChain {
    vertices: Vec<Vec3>,
}

impl VertexChain {
    fn new() -> Self {
        VertexChain {
            vertices: Vec::new(),
        }
    }

    fn push(&mut self, vertex: Vec3) {
        match self.vertices.last() {
            Some(last) if approx_eq(last, &vertex) => {}
            _ => self.vertices.push(vertex),
        }
    }

    fn into_vec(mut self) -> Vec<Vec3> {
        if let (Some(first), Some(last)) = (self.vertices.first(), self.vertices.last()) {
            if approx_eq(first, last) {
                self.vertices.pop();
            }
        }
        self.vertices
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::families::Family;

    #[test]
    fn turn_and_inverse_round_trip() {
        let puzzle = Family::Cube3.build();
        let solved = puzzle.solved_state();

        for turn in 0..puzzle.num_turns() {
            let turned = puzzle.apply_turn(&solved, turn).unwrap();
            assert!(!puzzle.is_solved(&turned));
            let restored = puzzle
                .apply_turn(&turned, puzzle.inverse_turn(turn))
                .unwrap();
            assert!(puzzle.is_solved(&restored));
        }
    }

    #[test]
    fn quarter_turn_has_order_four() {
        let puzzle = Family::Cube3.build();
        let mut state = puzzle.solved_state();
        for _ in 0..4 {
            state = puzzle.apply_turn(&state, 0).unwrap();
        }
        assert!(puzzle.is_solved(&state));
    }

    #[test]
    fn illegal_selector_is_rejected_before_mutation() {
        let puzzle = Family::Cube2.build();
        let solved = puzzle.solved_state();
        let err = puzzle.apply_turn(&solved, 999).unwrap_err();
        assert!(matches!(err, Error::IllegalMove { turn_index: 999, .. }));
        assert!(puzzle.is_solved(&solved));
    }

    #[test]
    fn placements_of_solved_state_are_all_home() {
        let puzzle = Family::Cube3.build();
        let placements = puzzle.placements(&puzzle.solved_state()).unwrap();
        assert_eq!(placements.len(), puzzle.num_pieces());
        for placement in placements {
            assert_eq!(placement.home, placement.position);
            assert_eq!(placement.orientation, 0);
        }
    }

    #[test]
    fn placements_after_turn_form_a_bijection() {
        let puzzle = Family::Cube3.build();
        let state = puzzle.apply_turn(&puzzle.solved_state(), 2).unwrap();
        let placements = puzzle.placements(&state).unwrap();

        let mut seen = vec![false; puzzle.num_pieces()];
        for placement in &placements {
            assert!(!seen[placement.home]);
            seen[placement.home] = true;
            assert!(placement.orientation < placement.symmetry);
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn scattered_state_is_rejected() {
        let puzzle = Family::Cube3.build();
        let mut scrambled = puzzle.solved_state();
        // swap two stickers of different pieces: no rigid assembly produces this
        let (a, b) = (0, puzzle.num_stickers() - 1);
        scrambled.0.swap(a, b);
        assert!(puzzle.placements(&scrambled).is_err());
    }

    #[test]
    fn turn_moves_only_slots_on_its_cut() {
        let puzzle = Family::Cube3.build();
        for (turn_index, turn) in puzzle.turns().iter().enumerate() {
            for (new_slot, &old_slot) in turn.permutation.0.iter().enumerate() {
                if new_slot != old_slot {
                    assert!(
                        puzzle.turns_affecting(new_slot).contains(&turn_index),
                        "moved slot must list its turn"
                    );
                }
            }
        }
    }
}
