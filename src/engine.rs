//! The compute boundary: one puzzle instance behind plain-data calls.
//!
//! An [`Engine`] owns a puzzle's state, the interactive camera, and a
//! lazily-built solver. Hosts drive it entirely through the boundary calls:
//! [`Engine::render`] for a camera-offset view, [`Engine::get_points`] for
//! pointer-driven interaction (orbit drags and turn gestures), plus
//! scramble/solve/apply. Every call runs to completion; nothing is cached
//! across render calls.

use std::rc::Rc;

use log::{debug, info};

use crate::families::Family;
use crate::geometry::{rotate_about_axis, Vec3};
use crate::project::{self, Camera, PolygonBuffer};
use crate::puzzle::{PuzzleState, TwistyPuzzle};
use crate::scramble;
use crate::solver::Solver;
use crate::Error;

/// Default eye position; render offsets are added to it.
const DEFAULT_EYE: (f64, f64, f64) = (4.0, 2.0, 2.0);

/// Drags shorter than this many pixels are not a turn gesture.
const MIN_DRAG_DISTANCE: f64 = 5.0;

/// Turn count used by [`Engine::scramble`].
const SCRAMBLE_TURNS: usize = 200;

pub struct Engine {
    puzzle: Rc<TwistyPuzzle>,
    state: PuzzleState,
    solver: Option<Solver>,
    camera: Camera,
    cursor_down: bool,
    cursor_start: (f64, f64),
    /// Sticker slot under the cursor when the press started a turn gesture.
    gesture_slot: Option<usize>,
}

impl Engine {
    pub fn new(family: Family) -> Engine {
        let puzzle = Rc::new(family.build());
        info!(
            "{family}: {} stickers, {} pieces, {} turns",
            puzzle.num_stickers(),
            puzzle.num_pieces(),
            puzzle.num_turns()
        );
        let state = puzzle.solved_state();
        Engine {
            puzzle,
            state,
            solver: None,
            camera: project::default_camera(),
            cursor_down: false,
            cursor_start: (0.0, 0.0),
            gesture_slot: None,
        }
    }

    #[inline]
    pub fn puzzle(&self) -> &TwistyPuzzle {
        &self.puzzle
    }

    #[inline]
    pub fn state(&self) -> &PuzzleState {
        &self.state
    }

    pub fn is_solved(&self) -> bool {
        self.puzzle.is_solved(&self.state)
    }

    pub fn solved_fraction(&self) -> f64 {
        self.puzzle.solved_fraction(&self.state)
    }

    /// Renders the current state from the default eye moved by the given
    /// offsets. Pure: no engine state changes.
    pub fn render(
        &self,
        width: f64,
        height: f64,
        camera_x: f64,
        camera_y: f64,
        camera_z: f64,
    ) -> PolygonBuffer {
        let eye = Vec3::new(
            DEFAULT_EYE.0 + camera_x,
            DEFAULT_EYE.1 + camera_y,
            DEFAULT_EYE.2 + camera_z,
        );
        let camera = Camera::new_towards(eye, Vec3::zeros());
        project::render(&self.puzzle, &self.state, &camera, width, height)
    }

    /// Renders under pointer control, interpreting presses and drags.
    ///
    /// A press on a sticker starts a turn gesture: on release, the turn
    /// whose motion best matches the drag direction is applied. A press on
    /// the background orbits the camera instead. The returned buffer
    /// reflects any state change this call made.
    pub fn get_points(
        &mut self,
        width: f64,
        height: f64,
        pointer_x: f64,
        pointer_y: f64,
        pointer_down: bool,
    ) -> PolygonBuffer {
        let cursor = (pointer_x, pointer_y);

        if !self.cursor_down && pointer_down {
            self.cursor_down = true;
            self.cursor_start = cursor;
            self.gesture_slot = self.pick_sticker(width, height, cursor);
            debug!("press at {cursor:?}, sticker {:?}", self.gesture_slot);
        }

        let mut camera = self.camera;
        if self.cursor_down && pointer_down && self.gesture_slot.is_none() {
            camera = self.camera.orbit(width, height, self.cursor_start, cursor);
        }

        if self.cursor_down && !pointer_down {
            self.cursor_down = false;
            match self.gesture_slot.take() {
                Some(slot) => {
                    if let Some(turn_index) = self.pick_turn(slot, self.cursor_start, cursor) {
                        debug!("gesture turn {}", self.puzzle.turns()[turn_index].name);
                        self.state = self.state.then(&self.puzzle.turns()[turn_index].permutation);
                    }
                }
                None => {
                    self.camera = self.camera.orbit(width, height, self.cursor_start, cursor);
                    camera = self.camera;
                }
            }
        }

        project::render(&self.puzzle, &self.state, &camera, width, height)
    }

    /// Applies one turn by move-table index.
    pub fn apply_turn(&mut self, turn_index: usize) -> Result<(), Error> {
        self.state = self.puzzle.apply_turn(&self.state, turn_index)?;
        Ok(())
    }

    /// Applies one turn by name, e.g. `U` or `U'`.
    pub fn apply_turn_by_name(&mut self, name: &str) -> Result<(), Error> {
        let turn_index = self
            .puzzle
            .turn_by_name(name)
            .ok_or_else(|| Error::UnknownMove {
                name: name.to_string(),
            })?;
        self.apply_turn(turn_index)
    }

    /// Scrambles with a fixed turn count; deterministic per seed.
    pub fn scramble(&mut self, seed: u64) -> Vec<usize> {
        let (state, turns) = scramble::scramble_seeded(&self.puzzle, &self.state, SCRAMBLE_TURNS, seed);
        self.state = state;
        turns
    }

    /// Solves the current state, applies the solution, and returns it.
    ///
    /// The solver is built on first use and reused afterwards.
    pub fn solve(&mut self) -> Result<Vec<usize>, Error> {
        if self.solver.is_none() {
            info!("building solver");
            self.solver = Some(Solver::new(Rc::clone(&self.puzzle)));
        }
        let solver = self.solver.as_ref().ok_or(Error::UnsolvableState {
            reason: "solver unavailable",
        })?;
        let solution = solver.solve(&self.state)?;
        self.state = self.puzzle.apply_sequence(&self.state, &solution)?;
        Ok(solution)
    }

    /// Resets to the solved state.
    pub fn reset(&mut self) {
        self.state = self.puzzle.solved_state();
    }

    /// The frontmost sticker under the cursor, if any.
    fn pick_sticker(&self, width: f64, height: f64, cursor: (f64, f64)) -> Option<usize> {
        let target = (cursor.0 - width / 2.0, cursor.1 - height / 2.0);
        let mut best: Option<(usize, f64)> = None;
        for (slot, sticker) in self.puzzle.stickers().iter().enumerate() {
            let mut points = Vec::with_capacity(sticker.polygon.vertices.len());
            let mut visible = true;
            for vertex in &sticker.polygon.vertices {
                match self.camera.see_point(vertex) {
                    Some(point) => points.push(point),
                    None => {
                        visible = false;
                        break;
                    }
                }
            }
            if !visible || !point_in_polygon(&points, target) {
                continue;
            }
            let distance = (sticker.polygon.centroid() - self.camera.eye()).norm();
            if best.map_or(true, |(_, best_distance)| distance < best_distance) {
                best = Some((slot, distance));
            }
        }
        best.map(|(slot, _)| slot)
    }

    /// The turn moving `slot` whose sticker motion best aligns with the
    /// drag, or `None` for drags too short or against every turn.
    fn pick_turn(&self, slot: usize, start: (f64, f64), end: (f64, f64)) -> Option<usize> {
        let drag = (end.0 - start.0, end.1 - start.1);
        if (drag.0 * drag.0 + drag.1 * drag.1).sqrt() < MIN_DRAG_DISTANCE {
            return None;
        }

        let centroid = self.puzzle.stickers()[slot].polygon.centroid();
        let projected = self.camera.see_point(&centroid)?;
        let mut best: Option<(usize, f64)> = None;
        for turn_index in self.puzzle.turns_affecting(slot) {
            let turn = &self.puzzle.turns()[turn_index];
            let moved = rotate_about_axis(&centroid, &turn.axis, turn.angle, &turn.axis_point);
            let Some(moved_projected) = self.camera.see_point(&moved) else {
                continue;
            };
            let motion = (
                moved_projected.0 - projected.0,
                moved_projected.1 - projected.1,
            );
            let alignment = motion.0 * drag.0 + motion.1 * drag.1;
            if alignment > 0.0
                && best.map_or(true, |(_, best_alignment)| alignment > best_alignment)
            {
                best = Some((turn_index, alignment));
            }
        }
        best.map(|(turn_index, _)| turn_index)
    }
}

/// Even-odd test against a closed polygon in screen space.
fn point_in_polygon(points: &[(f64, f64)], (x, y): (f64, f64)) -> bool {
    let mut inside = false;
    let mut j = points.len().wrapping_sub(1);
    for i in 0..points.len() {
        let (xi, yi) = points[i];
        let (xj, yj) = points[j];
        if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}
