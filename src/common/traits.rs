//! Common traits defining the planner's collaborator interfaces

use rand::rngs::StdRng;

use crate::common::error::PlannerError;
use crate::common::objective::Cost;
use crate::common::types::{AreaBounds, Path2D, Point2D};

/// Trait for path planning algorithms
pub trait PathPlanner {
    /// Plan a path from start to goal
    fn plan(&mut self, start: Point2D, goal: Point2D) -> Result<Path2D, PlannerError>;
}

/// Interface of the state space the planner searches
///
/// The planner never does geometry itself; validity, motion checks,
/// interpolation, and measure all come through this trait.
pub trait StateSpace {
    /// Dimension of the space
    fn dimension(&self) -> usize {
        2
    }

    /// Lebesgue measure of the bounded domain
    fn measure(&self) -> f64;

    /// Bounds of the domain
    fn bounds(&self) -> AreaBounds;

    /// Distance between two states
    fn distance(&self, a: &Point2D, b: &Point2D) -> f64;

    /// State at fraction `t` along the motion from `a` to `b`
    fn interpolate(&self, a: &Point2D, b: &Point2D, t: f64) -> Point2D;

    /// Whether a single state is collision-free and within bounds
    fn is_valid(&self, p: &Point2D) -> bool;

    /// Whether the whole motion between two states is collision-free
    fn check_motion(&self, a: &Point2D, b: &Point2D) -> bool;

    /// Draw a state uniformly from the bounded domain
    fn sample_uniform(&self, rng: &mut StdRng) -> Point2D;
}

/// Interface of an informed sampler
///
/// Draws states from the subset whose lower-bound total cost does not
/// exceed `max_cost`; an infinite bound degenerates to uniform sampling
/// over the whole domain.
pub trait InformedSampler {
    /// Draw one state from the admissible subset
    fn sample(&self, rng: &mut StdRng, max_cost: Cost) -> Point2D;

    /// Lebesgue measure of the admissible subset for a given cost bound,
    /// clamped to the measure of the full domain
    fn informed_measure(&self, max_cost: Cost) -> f64;
}

/// Interface of a nearest-neighbor index over planner-owned states
///
/// Entries are identified by the owning vertex id; the distance function
/// is supplied at construction.
pub trait NearestNeighbors {
    fn add(&mut self, id: usize, state: Point2D);

    /// Remove an entry; panics if the id is not present
    fn remove(&mut self, id: usize);

    /// Ids of all entries within `radius` of the query state
    fn nearest_r(&self, query: &Point2D, radius: f64) -> Vec<usize>;

    /// Ids of the `k` entries closest to the query state
    fn nearest_k(&self, query: &Point2D, k: usize) -> Vec<usize>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Ids of all entries, in insertion order
    fn ids(&self) -> Vec<usize>;
}
