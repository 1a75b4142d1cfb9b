//! Collision detection for the runner
//!
//! Everything in the runner is an axis-aligned box or a circle, so the
//! checks here are simple overlap tests in world space (y up).

use glam::Vec2;

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    /// Box from its bottom-left corner and size
    pub fn from_origin_size(origin: Vec2, size: Vec2) -> Self {
        Self {
            min: origin,
            max: origin + size,
        }
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }

    /// Shrink on every side (forgiving hitboxes)
    pub fn shrink(&self, amount: f32) -> Self {
        let half = self.size() * 0.5;
        let amount = amount.min(half.x).min(half.y);
        Self {
            min: self.min + Vec2::splat(amount),
            max: self.max - Vec2::splat(amount),
        }
    }

    /// Strict overlap; touching edges do not count
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
    }

    /// Closest point inside the box to `p`
    pub fn closest_point(&self, p: Vec2) -> Vec2 {
        p.clamp(self.min, self.max)
    }
}

/// Circle vs box overlap
pub fn circle_aabb_overlap(center: Vec2, radius: f32, aabb: &Aabb) -> bool {
    let closest = aabb.closest_point(center);
    (center - closest).length_squared() < radius * radius
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlap() {
        let a = Aabb::from_origin_size(Vec2::ZERO, Vec2::new(2.0, 2.0));
        let b = Aabb::from_origin_size(Vec2::new(1.0, 1.0), Vec2::new(2.0, 2.0));
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
    }

    #[test]
    fn test_touching_edges_do_not_overlap() {
        let a = Aabb::from_origin_size(Vec2::ZERO, Vec2::ONE);
        let b = Aabb::from_origin_size(Vec2::new(1.0, 0.0), Vec2::ONE);
        assert!(!a.overlaps(&b));
    }

    #[test]
    fn test_shrink_never_inverts() {
        let a = Aabb::from_origin_size(Vec2::ZERO, Vec2::new(1.0, 0.2));
        let s = a.shrink(5.0);
        assert!(s.min.x <= s.max.x && s.min.y <= s.max.y);
        assert_eq!(s.center(), a.center());
    }

    #[test]
    fn test_circle_overlap() {
        let b = Aabb::from_origin_size(Vec2::ZERO, Vec2::ONE);
        assert!(circle_aabb_overlap(Vec2::new(1.2, 0.5), 0.3, &b));
        assert!(!circle_aabb_overlap(Vec2::new(1.5, 0.5), 0.3, &b));
        // Inside counts
        assert!(circle_aabb_overlap(Vec2::new(0.5, 0.5), 0.1, &b));
    }
}
