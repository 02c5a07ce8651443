//! Informed sampling of the planning domain
//!
//! Once a solution of cost `c_best` exists, only states whose
//! lower-bound total cost stays below `c_best` can improve it. For
//! path-length objectives that subset is the prolate hyperspheroid with
//! the start and goal as foci, which `EllipsoidSampler` draws from
//! directly; `RejectionSampler` covers objectives without a direct
//! scheme by uniform sampling with a lower-bound rejection test.

use std::f64::consts::PI;

use rand::rngs::StdRng;
use rand::Rng;

use crate::common::{AreaBounds, Cost, InformedSampler, Point2D};

/// Attempts per draw before giving up on the informed subset and
/// returning a plain uniform sample
const MAX_SAMPLE_ATTEMPTS: usize = 100;

/// Direct sampler of the prolate hyperspheroid for path-length-like
/// objectives
pub struct EllipsoidSampler {
    bounds: AreaBounds,
    space_measure: f64,
    /// Theoretical minimum cost: the distance between the foci
    c_min: f64,
    center: [f64; 2],
    rotation: [[f64; 2]; 2],
}

impl EllipsoidSampler {
    pub fn new(start: Point2D, goal: Point2D, bounds: AreaBounds, space_measure: f64) -> Self {
        let c_min = start.distance(&goal);
        let center = [(start.x + goal.x) / 2.0, (start.y + goal.y) / 2.0];

        // rotation from the ellipse frame into the world frame, aligned
        // with the transverse axis
        let e_theta = (goal.y - start.y).atan2(goal.x - start.x);
        let cos_theta = e_theta.cos();
        let sin_theta = e_theta.sin();
        let rotation = [[cos_theta, -sin_theta], [sin_theta, cos_theta]];

        EllipsoidSampler {
            bounds,
            space_measure,
            c_min,
            center,
            rotation,
        }
    }

    fn sample_unit_ball(rng: &mut StdRng) -> [f64; 2] {
        let a: f64 = rng.gen();
        let b: f64 = rng.gen();
        let (a, b) = if b < a { (b, a) } else { (a, b) };
        [
            b * (2.0 * PI * a / b).cos(),
            b * (2.0 * PI * a / b).sin(),
        ]
    }

    fn sample_uniform(&self, rng: &mut StdRng) -> Point2D {
        Point2D::new(
            rng.gen_range(self.bounds.xmin..=self.bounds.xmax),
            rng.gen_range(self.bounds.ymin..=self.bounds.ymax),
        )
    }
}

impl InformedSampler for EllipsoidSampler {
    fn sample(&self, rng: &mut StdRng, max_cost: Cost) -> Point2D {
        if !max_cost.is_finite() {
            return self.sample_uniform(rng);
        }

        let c_max = max_cost.value().max(self.c_min);
        let r = [
            c_max / 2.0,
            ((c_max * c_max - self.c_min * self.c_min).max(0.0)).sqrt() / 2.0,
        ];

        for _ in 0..MAX_SAMPLE_ATTEMPTS {
            let ball = Self::sample_unit_ball(rng);
            let scaled = [r[0] * ball[0], r[1] * ball[1]];
            let rotated = [
                self.rotation[0][0] * scaled[0] + self.rotation[0][1] * scaled[1],
                self.rotation[1][0] * scaled[0] + self.rotation[1][1] * scaled[1],
            ];
            let state = Point2D::new(rotated[0] + self.center[0], rotated[1] + self.center[1]);
            if self.bounds.contains(&state) {
                return state;
            }
        }
        // the spheroid barely overlaps the bounds; a uniform draw keeps
        // the planner moving
        self.sample_uniform(rng)
    }

    fn informed_measure(&self, max_cost: Cost) -> f64 {
        if !max_cost.is_finite() {
            return self.space_measure;
        }
        let c_max = max_cost.value().max(self.c_min);
        // planar prolate hyperspheroid: an ellipse with transverse
        // diameter c_max and conjugate diameter sqrt(c_max^2 - c_min^2)
        let conjugate = ((c_max * c_max - self.c_min * self.c_min).max(0.0)).sqrt();
        let ellipse = PI / 4.0 * c_max * conjugate;
        ellipse.min(self.space_measure)
    }
}

/// Fallback sampler for objectives without a direct informed scheme:
/// uniform draws filtered by the admissible lower bound
pub struct RejectionSampler {
    bounds: AreaBounds,
    space_measure: f64,
    lower_bound: Box<dyn Fn(&Point2D) -> Cost>,
}

impl RejectionSampler {
    /// `lower_bound` must give the admissible through-state cost bound
    /// (cost-to-come estimate plus cost-to-go estimate)
    pub fn new(
        bounds: AreaBounds,
        space_measure: f64,
        lower_bound: Box<dyn Fn(&Point2D) -> Cost>,
    ) -> Self {
        RejectionSampler {
            bounds,
            space_measure,
            lower_bound,
        }
    }

    fn sample_uniform(&self, rng: &mut StdRng) -> Point2D {
        Point2D::new(
            rng.gen_range(self.bounds.xmin..=self.bounds.xmax),
            rng.gen_range(self.bounds.ymin..=self.bounds.ymax),
        )
    }
}

impl InformedSampler for RejectionSampler {
    fn sample(&self, rng: &mut StdRng, max_cost: Cost) -> Point2D {
        if !max_cost.is_finite() {
            return self.sample_uniform(rng);
        }
        let mut state = self.sample_uniform(rng);
        for _ in 0..MAX_SAMPLE_ATTEMPTS {
            if (self.lower_bound)(&state).value() <= max_cost.value() {
                break;
            }
            state = self.sample_uniform(rng);
        }
        state
    }

    fn informed_measure(&self, _max_cost: Cost) -> f64 {
        // no closed form; the full domain is the only safe answer
        self.space_measure
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn unit_bounds() -> AreaBounds {
        AreaBounds::new([0.0, 1.0, 0.0, 1.0])
    }

    #[test]
    fn test_infinite_bound_samples_whole_domain() {
        let sampler = EllipsoidSampler::new(
            Point2D::new(0.1, 0.1),
            Point2D::new(0.9, 0.9),
            unit_bounds(),
            1.0,
        );
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..200 {
            let p = sampler.sample(&mut rng, Cost(f64::INFINITY));
            assert!(unit_bounds().contains(&p));
        }
    }

    #[test]
    fn test_finite_bound_stays_inside_spheroid() {
        let start = Point2D::new(0.2, 0.5);
        let goal = Point2D::new(0.8, 0.5);
        let sampler = EllipsoidSampler::new(start, goal, unit_bounds(), 1.0);
        let c_best = 0.8;
        let mut rng = StdRng::seed_from_u64(2);
        for _ in 0..200 {
            let p = sampler.sample(&mut rng, Cost(c_best));
            let through = start.distance(&p) + p.distance(&goal);
            assert!(through <= c_best + 1e-9, "sample outside the informed set: {}", through);
        }
    }

    #[test]
    fn test_informed_measure_shrinks_with_bound() {
        let sampler = EllipsoidSampler::new(
            Point2D::new(0.0, 0.0),
            Point2D::new(1.0, 1.0),
            unit_bounds(),
            1.0,
        );
        let loose = sampler.informed_measure(Cost(5.0));
        let tight = sampler.informed_measure(Cost(1.5));
        assert!(tight < loose || (loose == 1.0 && tight <= 1.0));
        assert!(sampler.informed_measure(Cost(f64::INFINITY)) == 1.0);
        // never larger than the domain
        assert!(loose <= 1.0);
    }

    #[test]
    fn test_rejection_sampler_respects_bound() {
        let start = Point2D::new(0.2, 0.5);
        let goal = Point2D::new(0.8, 0.5);
        let sampler = RejectionSampler::new(
            unit_bounds(),
            1.0,
            Box::new(move |p| Cost(start.distance(p) + p.distance(&goal))),
        );
        let mut rng = StdRng::seed_from_u64(3);
        let mut inside = 0;
        for _ in 0..100 {
            let p = sampler.sample(&mut rng, Cost(0.9));
            if start.distance(&p) + p.distance(&goal) <= 0.9 {
                inside += 1;
            }
        }
        // rejection caps out after a fixed number of attempts, so allow
        // the occasional miss
        assert!(inside >= 95);
    }
}
