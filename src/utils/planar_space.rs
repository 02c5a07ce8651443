//! Planar state space with circular and rectangular obstacles
//!
//! The reference `StateSpace` implementation: an axis-aligned bounded
//! region of the plane, Euclidean distance, and exact segment collision
//! tests against the obstacle set.

use rand::rngs::StdRng;
use rand::Rng;

use crate::common::{AreaBounds, Point2D, StateSpace};

/// A static obstacle in the plane
#[derive(Debug, Clone, Copy)]
pub enum Obstacle {
    Circle { x: f64, y: f64, radius: f64 },
    Rectangle { xmin: f64, ymin: f64, xmax: f64, ymax: f64 },
}

impl Obstacle {
    pub fn circle(x: f64, y: f64, radius: f64) -> Self {
        Obstacle::Circle { x, y, radius }
    }

    pub fn rectangle(xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> Self {
        Obstacle::Rectangle { xmin, ymin, xmax, ymax }
    }

    /// Whether the obstacle contains a point
    pub fn contains(&self, p: &Point2D) -> bool {
        match *self {
            Obstacle::Circle { x, y, radius } => {
                p.distance_squared(&Point2D::new(x, y)) <= radius * radius
            }
            Obstacle::Rectangle { xmin, ymin, xmax, ymax } => {
                p.x >= xmin && p.x <= xmax && p.y >= ymin && p.y <= ymax
            }
        }
    }

    /// Whether the obstacle intersects the segment from `a` to `b`
    pub fn intersects_segment(&self, a: &Point2D, b: &Point2D) -> bool {
        match *self {
            Obstacle::Circle { x, y, radius } => {
                let dd = distance_squared_point_to_segment(
                    [a.x, a.y],
                    [b.x, b.y],
                    [x, y],
                );
                dd <= radius * radius
            }
            Obstacle::Rectangle { xmin, ymin, xmax, ymax } => {
                segment_intersects_aabb(a, b, xmin, ymin, xmax, ymax)
            }
        }
    }
}

fn distance_squared_point_to_segment(v: [f64; 2], w: [f64; 2], p: [f64; 2]) -> f64 {
    if v[0] == w[0] && v[1] == w[1] {
        return (p[0] - v[0]).powi(2) + (p[1] - v[1]).powi(2);
    }

    let l2 = (w[0] - v[0]).powi(2) + (w[1] - v[1]).powi(2);
    let t = (((p[0] - v[0]) * (w[0] - v[0]) + (p[1] - v[1]) * (w[1] - v[1])) / l2)
        .max(0.0)
        .min(1.0);
    let projection = [v[0] + t * (w[0] - v[0]), v[1] + t * (w[1] - v[1])];
    (p[0] - projection[0]).powi(2) + (p[1] - projection[1]).powi(2)
}

/// Slab-clipping segment/AABB intersection test
fn segment_intersects_aabb(a: &Point2D, b: &Point2D, xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> bool {
    let d = [b.x - a.x, b.y - a.y];
    let mut t0 = 0.0_f64;
    let mut t1 = 1.0_f64;

    let checks = [
        (-d[0], a.x - xmin),
        (d[0], xmax - a.x),
        (-d[1], a.y - ymin),
        (d[1], ymax - a.y),
    ];

    for &(p, q) in &checks {
        if p == 0.0 {
            if q < 0.0 {
                return false;
            }
        } else {
            let r = q / p;
            if p < 0.0 {
                if r > t1 {
                    return false;
                }
                if r > t0 {
                    t0 = r;
                }
            } else {
                if r < t0 {
                    return false;
                }
                if r < t1 {
                    t1 = r;
                }
            }
        }
    }

    t0 <= t1
}

/// Bounded planar state space with a static obstacle set
#[derive(Debug, Clone)]
pub struct PlanarSpace {
    bounds: AreaBounds,
    obstacles: Vec<Obstacle>,
}

impl PlanarSpace {
    pub fn new(bounds: AreaBounds, obstacles: Vec<Obstacle>) -> Self {
        PlanarSpace { bounds, obstacles }
    }

    /// Obstacle-free space over the given bounds
    pub fn free(bounds: AreaBounds) -> Self {
        PlanarSpace { bounds, obstacles: Vec::new() }
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }
}

impl StateSpace for PlanarSpace {
    fn measure(&self) -> f64 {
        self.bounds.measure()
    }

    fn bounds(&self) -> AreaBounds {
        self.bounds
    }

    fn distance(&self, a: &Point2D, b: &Point2D) -> f64 {
        a.distance(b)
    }

    fn interpolate(&self, a: &Point2D, b: &Point2D, t: f64) -> Point2D {
        a.lerp(b, t)
    }

    fn is_valid(&self, p: &Point2D) -> bool {
        self.bounds.contains(p) && !self.obstacles.iter().any(|o| o.contains(p))
    }

    fn check_motion(&self, a: &Point2D, b: &Point2D) -> bool {
        if !self.is_valid(a) || !self.is_valid(b) {
            return false;
        }
        !self.obstacles.iter().any(|o| o.intersects_segment(a, b))
    }

    fn sample_uniform(&self, rng: &mut StdRng) -> Point2D {
        Point2D::new(
            rng.gen_range(self.bounds.xmin..=self.bounds.xmax),
            rng.gen_range(self.bounds.ymin..=self.bounds.ymax),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn unit_square() -> AreaBounds {
        AreaBounds::new([0.0, 1.0, 0.0, 1.0])
    }

    #[test]
    fn test_circle_blocks_segment() {
        let space = PlanarSpace::new(unit_square(), vec![Obstacle::circle(0.5, 0.5, 0.1)]);
        assert!(!space.check_motion(&Point2D::new(0.0, 0.5), &Point2D::new(1.0, 0.5)));
        assert!(space.check_motion(&Point2D::new(0.0, 0.0), &Point2D::new(1.0, 0.0)));
    }

    #[test]
    fn test_rectangle_blocks_segment() {
        let space = PlanarSpace::new(
            unit_square(),
            vec![Obstacle::rectangle(0.3, 0.3, 0.7, 0.7)],
        );
        assert!(!space.check_motion(&Point2D::new(0.0, 0.0), &Point2D::new(1.0, 1.0)));
        // skirting below the box is fine
        assert!(space.check_motion(&Point2D::new(0.0, 0.1), &Point2D::new(1.0, 0.1)));
        assert!(!space.is_valid(&Point2D::new(0.5, 0.5)));
    }

    #[test]
    fn test_validity_respects_bounds() {
        let space = PlanarSpace::free(unit_square());
        assert!(space.is_valid(&Point2D::new(0.5, 0.5)));
        assert!(!space.is_valid(&Point2D::new(1.5, 0.5)));
    }

    #[test]
    fn test_sample_uniform_in_bounds() {
        let space = PlanarSpace::free(unit_square());
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let p = space.sample_uniform(&mut rng);
            assert!(space.bounds().contains(&p));
        }
    }

    #[test]
    fn test_interpolate_midpoint() {
        let space = PlanarSpace::free(unit_square());
        let m = space.interpolate(&Point2D::new(0.0, 0.0), &Point2D::new(1.0, 1.0), 0.5);
        assert!((m.x - 0.5).abs() < 1e-12);
        assert!((m.y - 0.5).abs() < 1e-12);
    }
}
