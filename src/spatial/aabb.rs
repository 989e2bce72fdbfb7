//! Axis-aligned boxes.

use macroquad::prelude::*;

/// Axis-aligned box. `position` is the minimum corner.
///
/// The same type is used for tile-local pixel boxes (Y down) and for baked
/// world boxes in meters (Y up); the owning context says which.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Aabb {
    /// Minimum corner.
    pub position: Vec2,
    /// Width and height, never negative.
    pub size: Vec2,
}

impl Aabb {
    /// Box with minimum corner `(x, y)`.
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Aabb {
            position: vec2(x, y),
            size: vec2(width, height),
        }
    }

    /// Maximum corner.
    #[inline]
    pub fn max(&self) -> Vec2 {
        self.position + self.size
    }

    /// Separating-axis overlap test. Touching edges do not count.
    pub fn intersects(&self, other: &Aabb) -> bool {
        let x = self.position.x + self.size.x > other.position.x
            && self.position.x < other.position.x + other.size.x;
        let y = self.position.y + self.size.y > other.position.y
            && self.position.y < other.position.y + other.size.y;
        x && y
    }

    /// Translate+scale matrix mapping the unit quad onto this box.
    pub fn transform(&self) -> Mat4 {
        Mat4::from_translation(vec3(self.position.x, self.position.y, 0.0))
            * Mat4::from_scale(vec3(self.size.x, self.size.y, 1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlapping_boxes_intersect() {
        let a = Aabb::new(0.0, 0.0, 2.0, 2.0);
        let b = Aabb::new(1.0, 1.0, 2.0, 2.0);
        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
    }

    #[test]
    fn touching_edges_do_not_intersect() {
        let a = Aabb::new(0.0, 0.0, 1.0, 1.0);
        let b = Aabb::new(1.0, 0.0, 1.0, 1.0);
        assert!(!a.intersects(&b));
    }

    #[test]
    fn transform_maps_unit_quad_corners() {
        let b = Aabb::new(3.0, -2.0, 0.5, 0.25);
        let m = b.transform();
        let origin = m.transform_point3(vec3(0.0, 0.0, 0.0));
        let corner = m.transform_point3(vec3(1.0, 1.0, 0.0));
        assert!((origin - vec3(3.0, -2.0, 0.0)).length() < 1e-6);
        assert!((corner - vec3(3.5, -1.75, 0.0)).length() < 1e-6);
    }
}
