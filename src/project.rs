//! 3D-to-2D projection and the flat polygon wire format.
//!
//! The projector turns the current sticker geometry into a [`PolygonBuffer`]:
//! a flat `f64` sequence holding one record per polygon, back-to-front, that
//! a host can rasterize without knowing anything about puzzles. Polygons are
//! depth-sorted by mean vertex distance from the camera (painter's
//! algorithm), which is enough for a convex shell.

use crate::geometry::{rotate_about_origin, Plane, Ray, Vec3, EPSILON};
use crate::puzzle::{PuzzleState, TwistyPuzzle};
use crate::Error;

/// Pixels per world unit in the camera plane.
const PROJECTION_SCALE: f64 = 1200.0;

/// Fraction of the smaller canvas dimension used as the orbit sphere radius.
const ORBIT_SPHERE_RADIUS: f64 = 0.4;

/// A flat-shaded polygon color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Color {
        Color { r, g, b }
    }

    /// 24-bit RGB packing, exactly representable as an `f64`.
    #[inline]
    pub fn packed(self) -> u32 {
        (self.r as u32) << 16 | (self.g as u32) << 8 | self.b as u32
    }

    #[inline]
    pub fn from_packed(packed: u32) -> Color {
        Color {
            r: (packed >> 16) as u8,
            g: (packed >> 8) as u8,
            b: packed as u8,
        }
    }
}

/// Sticker colors, indexed by home color modulo the palette length.
pub const PALETTE: [Color; 8] = [
    Color::new(231, 224, 220), // white
    Color::new(45, 81, 157),   // blue
    Color::new(254, 133, 57),  // orange
    Color::new(35, 168, 74),   // green
    Color::new(221, 30, 18),   // red
    Color::new(219, 226, 35),  // yellow
    Color::new(197, 107, 197), // purple
    Color::new(143, 33, 25),   // dark red
];

/// A perspective camera: an eye point and an image plane one unit towards
/// the target, with `u_right`/`u_up` spanning the plane.
#[derive(Debug, Clone, Copy)]
pub struct Camera {
    plane: Plane,
    u_right: Vec3,
    u_up: Vec3,
    point: Vec3,
}

impl Camera {
    /// A camera at `point` looking at `target`, with z as the up reference.
    pub fn new_towards(point: Vec3, target: Vec3) -> Camera {
        let u_towards = (target - point).normalize();
        let u_z = Vec3::new(0.0, 0.0, 1.0);
        let u_right = u_towards.cross(&u_z);
        let u_up = u_right.cross(&u_towards);
        Camera {
            plane: Plane {
                normal: u_towards,
                point: point + u_towards,
            },
            u_right,
            u_up,
            point,
        }
    }

    /// The eye position.
    #[inline]
    pub fn eye(&self) -> Vec3 {
        self.point
    }

    /// Projects a world point onto the image plane, in pixels relative to
    /// the canvas center. `None` when the point is behind the camera.
    pub fn see_point(&self, point: &Vec3) -> Option<(f64, f64)> {
        let ray_to_camera = Ray {
            point: *point,
            direction: self.point - point,
        };
        if ray_to_camera.direction.dot(&self.plane.normal) >= 0.0 {
            return None;
        }
        let plane_intersection = self.plane.intersection(&ray_to_camera);
        let in_plane = plane_intersection - self.point;
        Some((
            PROJECTION_SCALE * in_plane.dot(&self.u_right),
            PROJECTION_SCALE * in_plane.dot(&-self.u_up),
        ))
    }

    /// The camera after an orbit drag from `start_cursor` to `end_cursor`
    /// over a `width` x `height` canvas. Cursor positions are mapped onto a
    /// sphere around the origin and the whole camera frame is rotated by
    /// the angle between them.
    pub fn orbit(
        &self,
        width: f64,
        height: f64,
        start_cursor: (f64, f64),
        end_cursor: (f64, f64),
    ) -> Camera {
        let start = cursor_to_sphere(width, height, start_cursor);
        let end = cursor_to_sphere(width, height, end_cursor);
        let axis = start.cross(&end);
        if axis.norm() < EPSILON {
            return *self;
        }
        let cos_angle = (start.dot(&end) / (start.norm() * end.norm())).clamp(-1.0, 1.0);
        self.rotated(&axis.normalize(), cos_angle.acos())
    }

    /// The whole camera frame rotated about an axis through the origin.
    fn rotated(&self, axis: &Vec3, angle: f64) -> Camera {
        Camera {
            plane: Plane {
                point: rotate_about_origin(&self.plane.point, axis, angle),
                normal: rotate_about_origin(&self.plane.normal, axis, angle),
            },
            u_right: rotate_about_origin(&self.u_right, axis, angle),
            u_up: rotate_about_origin(&self.u_up, axis, angle),
            point: rotate_about_origin(&self.point, axis, angle),
        }
    }
}

/// Maps a cursor position to a point on the orbit sphere. Cursors outside
/// the sphere land on its rim (z = 0).
fn cursor_to_sphere(width: f64, height: f64, (cursor_x, cursor_y): (f64, f64)) -> Vec3 {
    let sphere_radius = ORBIT_SPHERE_RADIUS * width.min(height);
    let x = cursor_x - width / 2.0;
    let y = cursor_y - height / 2.0;
    let z_squared = sphere_radius * sphere_radius - x * x - y * y;
    let z = if z_squared >= 0.0 { z_squared.sqrt() } else { 0.0 };
    Vec3::new(x, y, z)
}

struct SeenPolygon {
    points: Vec<(f64, f64)>,
    color: Color,
    distance_from_camera: f64,
}

/// The serialized render output: for each polygon, back to front,
/// `[point_count, packed_color, x1, y1, ..., x_n, y_n]`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PolygonBuffer(pub Vec<f64>);

impl PolygonBuffer {
    pub fn new() -> PolygonBuffer {
        PolygonBuffer(Vec::new())
    }

    fn push_polygon(&mut self, color: Color, points: &[(f64, f64)]) {
        self.0.reserve(2 + 2 * points.len());
        self.0.push(points.len() as f64);
        self.0.push(color.packed() as f64);
        for &(x, y) in points {
            self.0.push(x);
            self.0.push(y);
        }
    }

    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Walks the buffer record by record, driven by each record's own point
    /// count, until it is exhausted.
    ///
    /// Fails with [`Error::MalformedBuffer`] instead of reading past the
    /// end when a record's point count overruns the remaining length.
    pub fn records(&self) -> Result<Vec<PolygonRecord>, Error> {
        let mut records = Vec::new();
        let mut offset = 0;
        while offset < self.0.len() {
            if self.0.len() - offset < 2 {
                return Err(Error::MalformedBuffer {
                    offset,
                    detail: "record header is truncated",
                });
            }
            let point_count = self.0[offset];
            if !(point_count.is_finite() && point_count >= 1.0 && point_count.fract() == 0.0) {
                return Err(Error::MalformedBuffer {
                    offset,
                    detail: "point count is not a positive integer",
                });
            }
            // bounds-check before narrowing: a count near 2^63 would wrap
            // the record arithmetic below
            let remaining_points = (self.0.len() - offset - 2) / 2;
            if point_count > remaining_points as f64 {
                return Err(Error::MalformedBuffer {
                    offset,
                    detail: "record extends past the end of the buffer",
                });
            }
            let point_count = point_count as usize;
            let packed = self.0[offset + 1];
            if !(packed.is_finite() && packed >= 0.0 && packed < (1 << 24) as f64) {
                return Err(Error::MalformedBuffer {
                    offset: offset + 1,
                    detail: "packed color is out of 24-bit range",
                });
            }
            let points = (0..point_count)
                .map(|i| {
                    (
                        self.0[offset + 2 + 2 * i],
                        self.0[offset + 2 + 2 * i + 1],
                    )
                })
                .collect();
            records.push(PolygonRecord {
                color: Color::from_packed(packed as u32),
                points,
            });
            offset += 2 + 2 * point_count;
        }
        Ok(records)
    }
}

/// One deserialized polygon record.
#[derive(Debug, Clone, PartialEq)]
pub struct PolygonRecord {
    pub color: Color,
    pub points: Vec<(f64, f64)>,
}

/// Projects the puzzle in `state` through `camera` and serializes every
/// visible sticker polygon, back to front, in canvas coordinates.
///
/// Pure: identical state and camera always produce an identical buffer.
pub fn render(
    puzzle: &TwistyPuzzle,
    state: &PuzzleState,
    camera: &Camera,
    width: f64,
    height: f64,
) -> PolygonBuffer {
    let mut seen: Vec<SeenPolygon> = puzzle
        .stickers()
        .iter()
        .enumerate()
        .filter_map(|(slot, sticker)| {
            let color = PALETTE[puzzle.color_at(state, slot) % PALETTE.len()];
            let mut points = Vec::with_capacity(sticker.polygon.vertices.len());
            let mut sum_distance = 0.0;
            for vertex in &sticker.polygon.vertices {
                sum_distance += (vertex - camera.point).norm();
                points.push(camera.see_point(vertex)?);
            }
            Some(SeenPolygon {
                distance_from_camera: sum_distance / sticker.polygon.vertices.len() as f64,
                points,
                color,
            })
        })
        .collect();

    seen.sort_by(|a, b| b.distance_from_camera.total_cmp(&a.distance_from_camera));

    let mut buffer = PolygonBuffer::new();
    for polygon in &seen {
        let centered: Vec<(f64, f64)> = polygon
            .points
            .iter()
            .map(|&(x, y)| (x + width / 2.0, y + height / 2.0))
            .collect();
        buffer.push_polygon(polygon.color, &centered);
    }
    buffer
}

/// The default viewpoint, before any camera offset or orbiting.
pub fn default_camera() -> Camera {
    Camera::new_towards(Vec3::new(4.0, 2.0, 2.0), Vec3::zeros())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::families::Family;

    #[test]
    fn packed_color_round_trips() {
        for color in PALETTE {
            assert_eq!(Color::from_packed(color.packed()), color);
        }
        assert_eq!(Color::new(255, 255, 255).packed(), 0xffffff);
    }

    #[test]
    fn render_is_deterministic() {
        let puzzle = Family::Cube3.build();
        let state = puzzle.apply_turn(&puzzle.solved_state(), 2).unwrap();
        let camera = default_camera();
        let a = render(&puzzle, &state, &camera, 800.0, 600.0);
        let b = render(&puzzle, &state, &camera, 800.0, 600.0);
        assert_eq!(a, b);
    }

    #[test]
    fn buffer_walks_to_exactly_one_record_per_sticker() {
        let puzzle = Family::Megaminx.build();
        let camera = default_camera();
        let buffer = render(&puzzle, &puzzle.solved_state(), &camera, 640.0, 480.0);
        let records = buffer.records().unwrap();
        assert_eq!(records.len(), puzzle.num_stickers());
        for record in &records {
            assert!(record.points.len() >= 3);
        }
    }

    #[test]
    fn truncated_buffer_is_rejected() {
        let puzzle = Family::Cube2.build();
        let camera = default_camera();
        let mut buffer = render(&puzzle, &puzzle.solved_state(), &camera, 400.0, 400.0);
        buffer.0.pop();
        assert!(matches!(
            buffer.records(),
            Err(Error::MalformedBuffer { .. })
        ));
    }

    #[test]
    fn oversized_point_count_is_rejected() {
        let buffer = PolygonBuffer(vec![4.0, 0.0, 1.0, 2.0]);
        assert_eq!(
            buffer.records(),
            Err(Error::MalformedBuffer {
                offset: 0,
                detail: "record extends past the end of the buffer",
            })
        );
    }

    #[test]
    fn huge_point_count_is_rejected() {
        // 2^63 survives the integer check and must hit the bounds check
        // before it is narrowed to usize
        let buffer = PolygonBuffer(vec![9_223_372_036_854_775_808.0, 0.0, 1.0, 2.0]);
        assert_eq!(
            buffer.records(),
            Err(Error::MalformedBuffer {
                offset: 0,
                detail: "record extends past the end of the buffer",
            })
        );
    }

    #[test]
    fn point_behind_camera_is_invisible() {
        let camera = default_camera();
        assert!(camera.see_point(&Vec3::new(8.0, 4.0, 4.0)).is_none());
        assert!(camera.see_point(&Vec3::zeros()).is_some());
    }

    #[test]
    fn projection_is_stable_for_identical_cameras() {
        let camera_a = default_camera();
        let camera_b = default_camera();
        let point = Vec3::new(0.3, -0.2, 0.9);
        assert_eq!(camera_a.see_point(&point), camera_b.see_point(&point));
    }

    #[test]
    fn orbit_without_drag_leaves_the_camera_unchanged() {
        let camera = default_camera();
        let orbited = camera.orbit(800.0, 600.0, (100.0, 100.0), (100.0, 100.0));
        assert_eq!(camera.point, orbited.point);
        assert_eq!(camera.u_right, orbited.u_right);
    }

    #[test]
    fn empty_buffer_has_no_records() {
        assert_eq!(PolygonBuffer::new().records(), Ok(vec![]));
    }
}
