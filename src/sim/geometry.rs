//! Outline geometry for participants
//!
//! An outline is a simple polygon in the participant's local frame. It is
//! ear-clipped once at construction; the triangles are rotated and translated
//! along with the polygon, so world-space overlap tests never re-triangulate.
//!
//! Two outlines collide when their filled areas share a region of nonzero
//! area. Outlines that only touch along an edge or at a vertex do not.

use glam::Vec2;

/// Overlap below this (world units) counts as touching, not colliding
const EPSILON: f32 = 1e-4;

pub type Triangle = [Vec2; 3];

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    pub fn from_points(points: &[Vec2]) -> Self {
        let mut min = Vec2::splat(f32::MAX);
        let mut max = Vec2::splat(f32::MIN);
        for p in points {
            min = min.min(*p);
            max = max.max(*p);
        }
        Self { min, max }
    }

    /// Strict overlap (shared edges don't count)
    #[inline]
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.x < other.max.x
            && other.min.x < self.max.x
            && self.min.y < other.max.y
            && other.min.y < self.max.y
    }
}

/// A local-space outline with its cached triangulation
#[derive(Debug, Clone, PartialEq)]
pub struct Outline {
    points: Vec<Vec2>,
    triangles: Vec<Triangle>,
}

impl Outline {
    pub fn new(points: Vec<Vec2>) -> Self {
        let triangles = triangulate(&points);
        Self { points, triangles }
    }

    pub fn from_coords(coords: &[(f32, f32)]) -> Self {
        Self::new(coords.iter().map(|&(x, y)| Vec2::new(x, y)).collect())
    }

    /// Regular polygon approximating an ellipse inside the given box
    pub fn ellipse(origin: Vec2, size: Vec2, segments: usize) -> Self {
        let center = origin + size / 2.0;
        let radii = size / 2.0;
        let points = (0..segments)
            .map(|i| {
                let theta = i as f32 / segments as f32 * std::f32::consts::TAU;
                center + Vec2::new(theta.cos() * radii.x, theta.sin() * radii.y)
            })
            .collect();
        Self::new(points)
    }

    /// Uniformly scaled copy
    pub fn scaled(&self, scale: f32) -> Self {
        Self {
            points: self.points.iter().map(|p| *p * scale).collect(),
            triangles: self
                .triangles
                .iter()
                .map(|t| [t[0] * scale, t[1] * scale, t[2] * scale])
                .collect(),
        }
    }

    pub fn points(&self) -> &[Vec2] {
        &self.points
    }

    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    /// Rotate then translate into world space
    pub fn transformed(&self, position: Vec2, rotation: f32) -> WorldOutline {
        let rot = Vec2::from_angle(rotation);
        let xf = |p: Vec2| position + rot.rotate(p);
        let points: Vec<Vec2> = self.points.iter().map(|p| xf(*p)).collect();
        let triangles = self
            .triangles
            .iter()
            .map(|t| [xf(t[0]), xf(t[1]), xf(t[2])])
            .collect();
        WorldOutline {
            bounds: Aabb::from_points(&points),
            points,
            triangles,
        }
    }
}

/// An outline placed in world space, ready for drawing and collision
#[derive(Debug, Clone)]
pub struct WorldOutline {
    pub points: Vec<Vec2>,
    pub triangles: Vec<Triangle>,
    pub bounds: Aabb,
}

impl WorldOutline {
    /// Nonzero-area intersection of the two filled outlines
    pub fn overlaps(&self, other: &WorldOutline) -> bool {
        if !self.bounds.overlaps(&other.bounds) {
            return false;
        }
        self.triangles
            .iter()
            .any(|a| other.triangles.iter().any(|b| triangles_overlap(a, b)))
    }
}

/// Twice the signed area (positive for counter-clockwise)
pub fn signed_area(points: &[Vec2]) -> f32 {
    let n = points.len();
    (0..n)
        .map(|i| points[i].perp_dot(points[(i + 1) % n]))
        .sum::<f32>()
        * 0.5
}

#[inline]
fn cross(o: Vec2, a: Vec2, b: Vec2) -> f32 {
    (a - o).perp_dot(b - o)
}

/// Inclusive point-in-triangle for a counter-clockwise triangle
fn point_in_triangle(p: Vec2, a: Vec2, b: Vec2, c: Vec2) -> bool {
    cross(a, b, p) >= -EPSILON && cross(b, c, p) >= -EPSILON && cross(c, a, p) >= -EPSILON
}

/// Ear-clipping triangulation of a simple polygon (either winding)
pub fn triangulate(points: &[Vec2]) -> Vec<Triangle> {
    if points.len() < 3 {
        return Vec::new();
    }

    let mut ring: Vec<usize> = (0..points.len()).collect();
    if signed_area(points) < 0.0 {
        ring.reverse();
    }

    let mut triangles = Vec::with_capacity(points.len() - 2);
    while ring.len() > 3 {
        let m = ring.len();
        let ear = (0..m).find(|&i| {
            let (ia, ib, ic) = (ring[(i + m - 1) % m], ring[i], ring[(i + 1) % m]);
            let (a, b, c) = (points[ia], points[ib], points[ic]);
            if cross(a, b, c) <= EPSILON {
                return false;
            }
            !ring.iter().any(|&j| {
                j != ia && j != ib && j != ic && point_in_triangle(points[j], a, b, c)
            })
        });

        match ear {
            Some(i) => {
                let ia = ring[(i + m - 1) % m];
                let ic = ring[(i + 1) % m];
                triangles.push([points[ia], points[ring[i]], points[ic]]);
                ring.remove(i);
            }
            None => {
                // Collinear vertices are never ears; drop one and retry
                let flat = (0..m).find(|&i| {
                    let a = points[ring[(i + m - 1) % m]];
                    let c = points[ring[(i + 1) % m]];
                    cross(a, points[ring[i]], c).abs() <= EPSILON
                });
                match flat {
                    Some(i) => {
                        ring.remove(i);
                    }
                    None => {
                        // Not a simple polygon; fan what is left
                        for k in 1..m - 1 {
                            triangles.push([points[ring[0]], points[ring[k]], points[ring[k + 1]]]);
                        }
                        ring.clear();
                    }
                }
            }
        }
    }
    if ring.len() == 3 {
        triangles.push([points[ring[0]], points[ring[1]], points[ring[2]]]);
    }

    triangles.retain(|t| cross(t[0], t[1], t[2]).abs() > EPSILON);
    triangles
}

/// Project a triangle onto an axis
#[inline]
fn project(tri: &Triangle, axis: Vec2) -> (f32, f32) {
    let d0 = tri[0].dot(axis);
    let d1 = tri[1].dot(axis);
    let d2 = tri[2].dot(axis);
    (d0.min(d1).min(d2), d0.max(d1).max(d2))
}

/// Separating axis test requiring positive overlap on every axis
pub fn triangles_overlap(a: &Triangle, b: &Triangle) -> bool {
    for tri in [a, b] {
        for i in 0..3 {
            let axis = (tri[(i + 1) % 3] - tri[i]).perp().normalize_or_zero();
            if axis == Vec2::ZERO {
                continue;
            }
            let (amin, amax) = project(a, axis);
            let (bmin, bmax) = project(b, axis);
            if amax.min(bmax) - amin.max(bmin) <= EPSILON {
                return false;
            }
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    fn square(size: f32) -> Outline {
        Outline::from_coords(&[(0.0, 0.0), (size, 0.0), (size, size), (0.0, size)])
    }

    #[test]
    fn test_triangulate_convex() {
        let outline = square(10.0);
        assert_eq!(outline.triangles().len(), 2);
        let area: f32 = outline
            .triangles()
            .iter()
            .map(|t| cross(t[0], t[1], t[2]).abs() / 2.0)
            .sum();
        assert!((area - 100.0).abs() < 0.01);
    }

    #[test]
    fn test_triangulate_concave_preserves_area() {
        // Arrow-like concave outline, clockwise
        let points = vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(0.0, 10.0),
            Vec2::new(5.0, 5.0),
            Vec2::new(10.0, 10.0),
            Vec2::new(10.0, 0.0),
        ];
        let expected = signed_area(&points).abs();
        let tris = triangulate(&points);
        let area: f32 = tris.iter().map(|t| cross(t[0], t[1], t[2]).abs() / 2.0).sum();
        assert!((area - expected).abs() < 0.01);
    }

    #[test]
    fn test_triangulate_drops_collinear_vertices() {
        let points = vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(5.0, 0.0),
            Vec2::new(10.0, 0.0),
            Vec2::new(10.0, 10.0),
            Vec2::new(0.0, 10.0),
        ];
        let tris = triangulate(&points);
        let area: f32 = tris.iter().map(|t| cross(t[0], t[1], t[2]).abs() / 2.0).sum();
        assert!((area - 100.0).abs() < 0.01);
    }

    #[test]
    fn test_transform_rotates_then_translates() {
        let outline = Outline::from_coords(&[(10.0, 0.0), (0.0, 1.0), (0.0, -1.0)]);
        let world = outline.transformed(Vec2::new(100.0, 100.0), PI / 2.0);
        // (10, 0) rotated 90° is (0, 10)
        assert!((world.points[0] - Vec2::new(100.0, 110.0)).length() < 0.001);
    }

    #[test]
    fn test_overlap_and_miss() {
        let a = square(10.0).transformed(Vec2::ZERO, 0.0);
        let b = square(10.0).transformed(Vec2::new(5.0, 5.0), 0.0);
        let c = square(10.0).transformed(Vec2::new(50.0, 0.0), 0.0);
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
        assert!(!a.overlaps(&c));
    }

    #[test]
    fn test_touching_edges_do_not_collide() {
        let a = square(10.0).transformed(Vec2::ZERO, 0.0);
        let b = square(10.0).transformed(Vec2::new(10.0, 0.0), 0.0);
        let corner = square(10.0).transformed(Vec2::new(10.0, 10.0), 0.0);
        assert!(!a.overlaps(&b));
        assert!(!a.overlaps(&corner));
    }

    #[test]
    fn test_identical_outlines_collide() {
        let a = square(1.0).transformed(Vec2::new(3.0, 3.0), 0.3);
        assert!(a.overlaps(&a.clone()));
    }

    #[test]
    fn test_concave_notch_is_not_filled() {
        // U shape: a small square sitting in the notch does not collide
        let u = Outline::from_coords(&[
            (0.0, 0.0),
            (30.0, 0.0),
            (30.0, 30.0),
            (20.0, 30.0),
            (20.0, 10.0),
            (10.0, 10.0),
            (10.0, 30.0),
            (0.0, 30.0),
        ])
        .transformed(Vec2::ZERO, 0.0);
        let inside_notch = square(4.0).transformed(Vec2::new(13.0, 20.0), 0.0);
        let in_arm = square(4.0).transformed(Vec2::new(3.0, 20.0), 0.0);
        assert!(u.bounds.overlaps(&inside_notch.bounds));
        assert!(!u.overlaps(&inside_notch));
        assert!(u.overlaps(&in_arm));
    }

    #[test]
    fn test_containment_collides() {
        let big = square(100.0).transformed(Vec2::ZERO, 0.0);
        let small = square(1.0).transformed(Vec2::new(50.0, 50.0), 0.0);
        assert!(big.overlaps(&small));
    }
}
