//! Error types for batch_informed_trees
//!
//! Configuration problems are reported before the search starts;
//! invariant violations inside the search panic instead (they mean the
//! queue and the graph have desynchronized and nothing can be salvaged).

use std::fmt;

use crate::common::types::Point2D;

/// Failure modes reported by the planner
#[derive(Debug)]
pub enum PlannerError {
    /// A start or goal state lies outside free space
    InvalidProblem {
        what: &'static str,
        state: Point2D,
    },
    /// A tunable was set outside its valid range
    InvalidParameter {
        name: &'static str,
        value: f64,
        expected: &'static str,
    },
    /// The search ended without an exact solution; carries how far the
    /// closest connected state remained from the goal
    NoSolution { approximate_diff: f64 },
    /// Rendering the tree or a path failed
    VisualizationError(String),
}

impl fmt::Display for PlannerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlannerError::InvalidProblem { what, state } => write!(
                f,
                "{} at ({:.3}, {:.3}) is not in free space",
                what, state.x, state.y
            ),
            PlannerError::InvalidParameter { name, value, expected } => {
                write!(f, "{} = {} is invalid, expected {}", name, value, expected)
            }
            PlannerError::NoSolution { approximate_diff } => write!(
                f,
                "no exact solution, closest approach ended {:.3} from the goal",
                approximate_diff
            ),
            PlannerError::VisualizationError(msg) => write!(f, "visualization failed: {}", msg),
        }
    }
}

impl std::error::Error for PlannerError {}

/// Result type alias for planner operations
pub type PlannerResult<T> = Result<T, PlannerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_parameter_names_the_tunable() {
        let err = PlannerError::InvalidParameter {
            name: "prune_fraction",
            value: 1.5,
            expected: "a fraction within [0, 1]",
        };
        let message = format!("{}", err);
        assert!(message.contains("prune_fraction"));
        assert!(message.contains("1.5"));
    }

    #[test]
    fn test_invalid_problem_reports_the_state() {
        let err = PlannerError::InvalidProblem {
            what: "start state",
            state: Point2D::new(0.25, -1.0),
        };
        assert_eq!(
            format!("{}", err),
            "start state at (0.250, -1.000) is not in free space"
        );
    }

    #[test]
    fn test_no_solution_reports_the_gap() {
        let err = PlannerError::NoSolution { approximate_diff: 0.42 };
        assert!(format!("{}", err).contains("0.420"));
    }
}
