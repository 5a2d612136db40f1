//! The fixed catalog of supported puzzle families.
//!
//! Each family is a recipe: a base polyhedron plus cut planes. Cube-family
//! puzzles cut parallel to faces; the dino-family cuts point through
//! vertices. All geometry and move tables are derived once at build time;
//! nothing here is consulted again per operation.

use std::f64::consts::TAU;
use std::fmt;

use crate::geometry::{Plane, Polyhedron};
use crate::puzzle::{Cut, TwistyPuzzle};

/// Turn names for face cuts of the cube, in face generation order.
const CUBE_CUT_NAMES: [&str; 6] = ["U", "F", "R", "B", "L", "D"];

/// A supported puzzle family.
///
/// A closed set: puzzle model, solver, and projector all work through the
/// generic sticker/turn tables and branch on the family only right here,
/// at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    /// 2x2x2 pocket cube: three face cuts through the cube's center planes.
    Cube2,
    /// 3x3x3 cube: six face cuts.
    Cube3,
    /// Dodecahedron with shallow face cuts.
    Megaminx,
    /// Dodecahedron with vertex cuts.
    Dino,
    /// Dodecahedron with deep face cuts.
    Starminx,
}

impl Family {
    pub const ALL: [Family; 5] = [
        Family::Cube2,
        Family::Cube3,
        Family::Megaminx,
        Family::Dino,
        Family::Starminx,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Family::Cube2 => "cube2",
            Family::Cube3 => "cube3",
            Family::Megaminx => "megaminx",
            Family::Dino => "dino",
            Family::Starminx => "starminx",
        }
    }

    /// Parses a family name as used by the CLI.
    pub fn parse(name: &str) -> Result<Family, String> {
        Family::ALL
            .iter()
            .copied()
            .find(|family| family.name() == name)
            .ok_or_else(|| {
                format!(
                    "unknown family {name:?}; expected one of: {}",
                    Family::ALL.map(Family::name).join(", ")
                )
            })
    }

    /// Builds this family's puzzle tables.
    pub fn build(self) -> TwistyPuzzle {
        match self {
            Family::Cube2 => {
                let cube = Polyhedron::generate(4, 3);
                let cuts: Vec<Cut> = cube.faces[0..=2]
                    .iter()
                    .enumerate()
                    .map(|(i, face)| {
                        Cut::new(CUBE_CUT_NAMES[i], face.plane().offset(-0.5), TAU / 4.0)
                    })
                    .collect();
                TwistyPuzzle::new(&cube, &cuts)
            }
            Family::Cube3 => {
                let cube = Polyhedron::generate(4, 3);
                let cuts: Vec<Cut> = cube
                    .faces
                    .iter()
                    .enumerate()
                    .map(|(i, face)| {
                        Cut::new(CUBE_CUT_NAMES[i], face.plane().offset(-0.33), TAU / 4.0)
                    })
                    .collect();
                TwistyPuzzle::new(&cube, &cuts)
            }
            Family::Megaminx => {
                let dodecahedron = Polyhedron::generate(5, 3);
                let cuts: Vec<Cut> = dodecahedron
                    .faces
                    .iter()
                    .map(|face| Cut::unnamed(face.plane().offset(-0.33), TAU / 5.0))
                    .collect();
                TwistyPuzzle::new(&dodecahedron, &cuts)
            }
            Family::Dino => {
                let dodecahedron = Polyhedron::generate(5, 3);
                let cuts: Vec<Cut> = dodecahedron
                    .vertices
                    .iter()
                    .map(|&vertex| {
                        let plane = Plane {
                            point: vertex,
                            normal: vertex,
                        };
                        Cut::unnamed(plane.offset(-0.3), TAU / 3.0)
                    })
                    .collect();
                TwistyPuzzle::new(&dodecahedron, &cuts)
            }
            Family::Starminx => {
                let dodecahedron = Polyhedron::generate(5, 3);
                let cuts: Vec<Cut> = dodecahedron
                    .faces
                    .iter()
                    .map(|face| Cut::unnamed(face.plane().offset(-0.75), TAU / 5.0))
                    .collect();
                TwistyPuzzle::new(&dodecahedron, &cuts)
            }
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
