//! BIT* (Batch Informed Trees) Module
//!
//! An anytime, asymptotically optimal sampling-based motion planner.
//! BIT* processes batches of informed samples with a Lifelong Planning
//! A*-style search over the implicit random geometric graph the samples
//! form, striking a balance between algorithms like RRT* and FMT*.
//!
//! # Components
//!
//! - `cost`: strict, tolerance-free cost comparisons for queue ordering
//! - `vertex`: the id-indexed search-tree arena with cascading cost
//!   updates
//! - `heuristics`: admissible and current estimates over the objective
//! - `queue`: the integrated vertex-expansion / edge-processing queue
//! - `sampler`: direct (prolate hyperspheroid) and rejection informed
//!   samplers
//! - `planner`: the batch loop driving sampling, search, rewiring, and
//!   pruning
//!
//! # Example
//!
//! ```no_run
//! use batch_informed_trees::common::{AreaBounds, PathLengthObjective, Point2D};
//! use batch_informed_trees::path_planning::bit_star::{
//!     BitStarConfig, BitStarPlanner, TerminationCondition,
//! };
//! use batch_informed_trees::utils::{Obstacle, PlanarSpace};
//!
//! let space = PlanarSpace::new(
//!     AreaBounds::new([0.0, 1.0, 0.0, 1.0]),
//!     vec![Obstacle::circle(0.5, 0.5, 0.2)],
//! );
//! let mut planner =
//!     BitStarPlanner::new(space, PathLengthObjective, BitStarConfig::default()).unwrap();
//! let solution = planner
//!     .solve(
//!         Point2D::new(0.0, 0.0),
//!         Point2D::new(1.0, 1.0),
//!         TerminationCondition::Batches(10),
//!     )
//!     .unwrap();
//! println!("best cost: {:.4}", solution.cost.value());
//! ```
//!
//! # References
//!
//! - Gammell, J. D., Srinivasa, S. S., & Barfoot, T. D. (2015).
//!   "Batch Informed Trees (BIT*): Sampling-based Optimal Planning via
//!   the Heuristically Guided Search of Implicit Random Geometric
//!   Graphs", ICRA 2015. arXiv:1405.5848

pub mod cost;
pub mod vertex;
pub mod heuristics;
pub mod queue;
pub mod sampler;
pub mod planner;

// Re-exports
pub use heuristics::Heuristics;
pub use planner::{
    BitStarConfig, BitStarPlanner, PlannerSolution, PlannerStats, PlannerStatus,
    TerminationCondition,
};
pub use queue::{IntegratedQueue, NearCriteria, QueueContext};
pub use sampler::{EllipsoidSampler, RejectionSampler};
pub use vertex::{SearchGraph, VertexId};
