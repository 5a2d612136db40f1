//! 3D geometry kernel: planes, rays, axis rotations, and regular polyhedra.
//!
//! Pure math with no puzzle semantics. Puzzle construction carves these
//! polyhedra with cut planes; the projector reuses the same primitives to
//! map vertices onto the camera plane.

use std::collections::VecDeque;
use std::f64::consts::{PI, TAU};

use nalgebra::{Unit, UnitQuaternion, Vector3};

/// Scalar 3D vector used throughout the engine.
pub type Vec3 = Vector3<f64>;

/// Tolerance for matching vertices and edges produced by rotations.
pub const EPSILON: f64 = 1e-6;

/// Componentwise approximate equality within [`EPSILON`].
#[inline]
pub fn approx_eq(a: &Vec3, b: &Vec3) -> bool {
    (a - b).norm() < EPSILON
}

/// Mean of a set of points.
pub fn centroid(points: &[Vec3]) -> Vec3 {
    points.iter().sum::<Vec3>() / points.len() as f64
}

/// Rotates `point` by `angle` radians around the axis through the origin.
pub fn rotate_about_origin(point: &Vec3, axis: &Vec3, angle: f64) -> Vec3 {
    if angle == 0.0 {
        return *point;
    }
    UnitQuaternion::from_axis_angle(&Unit::new_normalize(*axis), angle) * point
}

/// Rotates `point` by `angle` radians around an axis through `axis_point`.
pub fn rotate_about_axis(point: &Vec3, axis: &Vec3, angle: f64, axis_point: &Vec3) -> Vec3 {
    rotate_about_origin(&(point - axis_point), axis, angle) + axis_point
}

/// A half-line used for plane intersections.
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    pub point: Vec3,
    pub direction: Vec3,
}

/// An oriented plane given by a point on it and its normal.
#[derive(Debug, Clone, Copy)]
pub struct Plane {
    pub point: Vec3,
    pub normal: Vec3,
}

impl Plane {
    /// Intersection of the ray's supporting line with the plane.
    ///
    /// The caller must ensure the ray is not parallel to the plane.
    pub fn intersection(&self, ray: &Ray) -> Vec3 {
        let diff = ray.point - self.point;
        let t = diff.dot(&self.normal) / ray.direction.dot(&self.normal);
        ray.point - ray.direction * t
    }

    /// The plane shifted by `offset` along its unit normal.
    pub fn offset(&self, offset: f64) -> Plane {
        Plane {
            point: self.point + self.normal.normalize() * offset,
            normal: self.normal,
        }
    }

    /// Signed side of the plane `point` lies on (positive = along normal).
    #[inline]
    pub fn side(&self, point: &Vec3) -> f64 {
        (point - self.point).dot(&self.normal)
    }
}

/// A planar convex polygon, vertices in winding order.
#[derive(Debug, Clone)]
pub struct Polygon {
    pub vertices: Vec<Vec3>,
}

impl Polygon {
    /// Edges as ordered vertex pairs, wrapping from last back to first.
    pub fn edges(&self) -> impl Iterator<Item = Edge> + '_ {
        self.vertices
            .iter()
            .enumerate()
            .map(move |(i, &a)| Edge(a, self.vertices[(i + 1) % self.vertices.len()]))
    }

    /// Rotates the polygon around a positioned axis.
    ///
    /// The vertex order is reversed afterwards: rotating flips which side the
    /// fold continues from, and the winding must stay stable when faces are
    /// folded out repeatedly during polyhedron generation.
    pub fn rotate_about_axis(&self, axis: &Vec3, angle: f64, axis_point: &Vec3) -> Polygon {
        Polygon {
            vertices: self
                .vertices
                .iter()
                .map(|v| rotate_about_axis(v, axis, angle, axis_point))
                .rev()
                .collect(),
        }
    }

    /// The supporting plane, with the normal following the winding order.
    pub fn plane(&self) -> Plane {
        let edge_a = self.vertices[1] - self.vertices[0];
        let edge_b = self.vertices[2] - self.vertices[1];
        Plane {
            point: centroid(&self.vertices),
            normal: edge_a.cross(&edge_b),
        }
    }

    /// Mean of the vertices.
    pub fn centroid(&self) -> Vec3 {
        centroid(&self.vertices)
    }
}

/// An undirected edge between two vertices.
#[derive(Debug, Clone, Copy)]
pub struct Edge(pub Vec3, pub Vec3);

impl Edge {
    fn approx_eq(&self, other: &Edge) -> bool {
        (approx_eq(&self.0, &other.0) && approx_eq(&self.1, &other.1))
            || (approx_eq(&self.0, &other.1) && approx_eq(&self.1, &other.0))
    }
}

/// A regular convex polyhedron centered on the origin.
#[derive(Debug)]
pub struct Polyhedron {
    pub faces: Vec<Polygon>,
    pub vertices: Vec<Vec3>,
    /// Distance from the origin to the center of a face.
    pub inradius: f64,
}

/// An edge with one attached face, waiting for its second face.
struct QueuedEdge {
    edge: Edge,
    face_index: usize,
}

impl Polyhedron {
    /// Generates the regular polyhedron with Schläfli symbol {p, q}:
    /// p-sided faces, q faces meeting at each vertex. Edge length is 1.
    ///
    /// Construction folds outward from a base face: every open edge gets a
    /// copy of its face rotated by the dihedral angle until no open edges
    /// remain. This closes exactly for the five platonic solids.
    pub fn generate(p: usize, q: usize) -> Polyhedron {
        let dihedral_angle = 2.0 * ((PI / q as f64).cos() / (PI / p as f64).sin()).asin();
        let edge_length = 1.0;
        let dihedral_cos = dihedral_angle.cos();
        let inradius = edge_length / (2.0 * (PI / p as f64).tan())
            * ((1.0 - dihedral_cos) / (1.0 + dihedral_cos)).sqrt();

        let vertex_angle = TAU / p as f64;
        // sin(vertex_angle / 2) = (edge_length / 2) / circumradius of the face
        let face_circumradius = (edge_length / 2.0) / (vertex_angle / 2.0).sin();

        // base face in the z = inradius plane
        let base_vertices: Vec<Vec3> = (0..p)
            .map(|i| {
                rotate_about_origin(
                    &Vec3::new(face_circumradius, 0.0, inradius),
                    &Vec3::z(),
                    vertex_angle * i as f64,
                )
            })
            .collect();

        let mut faces = vec![Polygon {
            vertices: base_vertices,
        }];
        let mut vertices: Vec<Vec3> = Vec::new();
        let mut open_edges: VecDeque<QueuedEdge> = VecDeque::new();
        for edge in faces[0].edges() {
            vertices.push(edge.0);
            open_edges.push_back(QueuedEdge {
                edge,
                face_index: 0,
            });
        }

        while let Some(queued) = open_edges.pop_front() {
            let Edge(vertex_a, vertex_b) = queued.edge;
            let fold_axis = (vertex_a - vertex_b).normalize();
            let new_face =
                faces[queued.face_index].rotate_about_axis(&fold_axis, dihedral_angle, &vertex_a);

            let new_face_index = faces.len();
            for edge in new_face.edges() {
                if edge.approx_eq(&queued.edge) {
                    continue;
                }
                // a new face can close an edge that was already open; that
                // edge now has both faces and leaves the queue
                let already_open = open_edges.iter().position(|open| edge.approx_eq(&open.edge));
                if let Some(index) = already_open {
                    open_edges.remove(index);
                } else {
                    if !vertices.iter().any(|v| approx_eq(v, &edge.0)) {
                        vertices.push(edge.0);
                    }
                    open_edges.push_back(QueuedEdge {
                        edge,
                        face_index: new_face_index,
                    });
                }
            }
            faces.push(new_face);
        }

        Polyhedron {
            faces,
            vertices,
            inradius,
        }
    }
}
