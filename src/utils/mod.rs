//! Utility modules for batch_informed_trees

pub mod nearest_neighbors;
pub mod planar_space;
pub mod visualization;

pub use nearest_neighbors::{euclidean_distance, DistanceFn, LinearNearestNeighbors};
pub use planar_space::{Obstacle, PlanarSpace};
pub use visualization::{colors, PathStyle, PointStyle, Visualizer};
