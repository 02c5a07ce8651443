//! Heuristic estimates used to order the search
//!
//! All estimates are layered on the optimization objective: admissible
//! cost-to-come and cost-to-go bounds, admissible edge-cost bounds, and
//! their "current" variants that substitute the cached cost-to-come of a
//! tree vertex for the admissible bound.

use crate::common::{Cost, OptimizationObjective, Point2D};
use crate::path_planning::bit_star::vertex::{SearchGraph, VertexId};

/// A view of the heuristic suite for a fixed start/goal pair
#[derive(Clone, Copy)]
pub struct Heuristics<'a> {
    opt: &'a dyn OptimizationObjective,
    start: Point2D,
    goal: Point2D,
}

impl<'a> Heuristics<'a> {
    pub fn new(opt: &'a dyn OptimizationObjective, start: Point2D, goal: Point2D) -> Self {
        Heuristics { opt, start, goal }
    }

    pub fn objective(&self) -> &'a dyn OptimizationObjective {
        self.opt
    }

    /// Admissible cost-to-come bound from the start
    pub fn cost_to_come(&self, graph: &SearchGraph, v: VertexId) -> Cost {
        self.opt.motion_cost_heuristic(&self.start, &graph.state(v))
    }

    /// Admissible cost-to-go bound to the goal
    pub fn cost_to_go(&self, graph: &SearchGraph, v: VertexId) -> Cost {
        self.opt.cost_to_go(&graph.state(v), &self.goal)
    }

    /// Admissible bound on the cost of an edge
    pub fn edge_cost(&self, graph: &SearchGraph, u: VertexId, v: VertexId) -> Cost {
        self.opt
            .motion_cost_heuristic(&graph.state(u), &graph.state(v))
    }

    /// Bound on a solution constrained through `v`, ignoring the tree
    pub fn lower_bound_vertex(&self, graph: &SearchGraph, v: VertexId) -> Cost {
        self.opt
            .combine(self.cost_to_come(graph, v), self.cost_to_go(graph, v))
    }

    /// Estimate of a solution through `v` using its current cost-to-come
    pub fn current_vertex(&self, graph: &SearchGraph, v: VertexId) -> Cost {
        self.opt.combine(graph.cost(v), self.cost_to_go(graph, v))
    }

    /// Bound on a solution constrained through the edge `(u, v)`
    pub fn lower_bound_edge(&self, graph: &SearchGraph, u: VertexId, v: VertexId) -> Cost {
        let through = self
            .opt
            .combine(self.cost_to_come(graph, u), self.edge_cost(graph, u, v));
        self.opt.combine(through, self.cost_to_go(graph, v))
    }

    /// Estimate of a solution through `(u, v)` using the parent's current
    /// cost-to-come
    pub fn current_edge(&self, graph: &SearchGraph, u: VertexId, v: VertexId) -> Cost {
        let through = self.opt.combine(graph.cost(u), self.edge_cost(graph, u, v));
        self.opt.combine(through, self.cost_to_go(graph, v))
    }

    /// Estimate of reaching the edge target through `(u, v)`
    pub fn current_edge_target(&self, graph: &SearchGraph, u: VertexId, v: VertexId) -> Cost {
        self.opt.combine(graph.cost(u), self.edge_cost(graph, u, v))
    }

    /// Exact cost of the motion along the edge
    pub fn true_edge_cost(&self, graph: &SearchGraph, u: VertexId, v: VertexId) -> Cost {
        self.opt.motion_cost(&graph.state(u), &graph.state(v))
    }

    pub fn identity_cost(&self) -> Cost {
        self.opt.identity_cost()
    }

    pub fn infinite_cost(&self) -> Cost {
        self.opt.infinite_cost()
    }
}
