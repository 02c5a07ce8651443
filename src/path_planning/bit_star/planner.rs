//! The BIT* batch loop
//!
//! The driver owns the search graph, the integrated queue, the two
//! nearest-neighbor indices, and the informed sampler, and wires them
//! together: draw a batch of samples, let the queue surface the best
//! edge, collision-check it, splice it into the tree (possibly rewiring
//! and cascading costs), publish improved solutions, and prune what can
//! no longer help. Termination is cooperative: the condition is polled
//! once per iteration and the planner imposes no timeouts of its own.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::common::{
    Cost, InformedSampler, NearestNeighbors, OptimizationObjective, Path2D, PathPlanner,
    PlannerError, PlannerResult, Point2D, StateSpace,
};
use crate::path_planning::bit_star::cost::fractional_change;
use crate::path_planning::bit_star::heuristics::Heuristics;
use crate::path_planning::bit_star::queue::{IntegratedQueue, NearCriteria, QueueContext};
use crate::path_planning::bit_star::sampler::{EllipsoidSampler, RejectionSampler};
use crate::path_planning::bit_star::vertex::{SearchGraph, VertexId};
use crate::utils::nearest_neighbors::{euclidean_distance, LinearNearestNeighbors};

/// Tunables of the planner
#[derive(Debug, Clone)]
pub struct BitStarConfig {
    /// States drawn per batch
    pub samples_per_batch: usize,
    /// Scale factor on the minimum RGG connection term (> 1 preserves
    /// asymptotic optimality with margin)
    pub rewire_factor: f64,
    /// k-nearest connections instead of an r-disc
    pub use_k_nearest: bool,
    /// Resort the queue as soon as a rewiring stales it, instead of at
    /// the batch boundary
    pub use_strict_queue_ordering: bool,
    /// Remember failed edges so they never re-enter the queue
    pub use_failure_tracking: bool,
    /// Prune states that cannot improve the current solution
    pub use_pruning: bool,
    /// Fractional cost decrease required before pruning is worthwhile
    pub prune_fraction: f64,
    /// Return from `solve` on every solution improvement
    pub stop_on_solution_change: bool,
    /// Fixed seed for reproducible runs; entropy when absent
    pub rng_seed: Option<u64>,
    /// Print progress messages
    pub verbose: bool,
}

impl Default for BitStarConfig {
    fn default() -> Self {
        Self {
            samples_per_batch: 100,
            rewire_factor: 1.1,
            use_k_nearest: false,
            use_strict_queue_ordering: false,
            use_failure_tracking: false,
            use_pruning: true,
            prune_fraction: 0.05,
            stop_on_solution_change: false,
            rng_seed: None,
            verbose: false,
        }
    }
}

/// When to stop `solve`; polled at iteration boundaries
#[derive(Debug, Clone, Copy)]
pub enum TerminationCondition {
    Iterations(u64),
    Batches(u64),
    Duration(Duration),
    Never,
}

impl TerminationCondition {
    fn is_satisfied(&self, iterations: u64, batches: u64, started: Instant) -> bool {
        match *self {
            TerminationCondition::Iterations(n) => iterations >= n,
            TerminationCondition::Batches(n) => batches >= n,
            TerminationCondition::Duration(limit) => started.elapsed() >= limit,
            TerminationCondition::Never => false,
        }
    }
}

/// Outcome class of a `solve` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlannerStatus {
    ExactSolution,
    ApproximateSolution,
    Timeout,
}

/// The published result of a `solve` call
#[derive(Debug, Clone)]
pub struct PlannerSolution {
    pub status: PlannerStatus,
    /// Start-to-goal states for an exact solution; start to the closest
    /// connected vertex otherwise
    pub path: Path2D,
    pub cost: Cost,
    /// Distance from the path's end to the goal; -1.0 for exact
    /// solutions
    pub approximate_diff: f64,
}

/// Numeric progress properties
#[derive(Debug, Clone, Default)]
pub struct PlannerStats {
    pub iterations: u64,
    pub batches: u64,
    pub prunings: u64,
    pub total_samples: u64,
    pub total_vertices: u64,
    pub pruned_samples: u64,
    pub disconnected_vertices: u64,
    pub rewirings: u64,
    pub state_collision_checks: u64,
    pub edge_collision_checks: u64,
    pub nearest_neighbor_queries: u64,
    /// Every published solution cost, in order
    pub solution_costs: Vec<f64>,
}

fn make_ctx<'a>(
    objective: &'a dyn OptimizationObjective,
    start: Point2D,
    goal: Point2D,
    free_nn: &'a mut LinearNearestNeighbors,
    vertex_nn: &'a mut LinearNearestNeighbors,
    near: NearCriteria,
) -> QueueContext<'a> {
    QueueContext {
        heuristics: Heuristics::new(objective, start, goal),
        samples: free_nn,
        vertices: vertex_nn,
        near,
    }
}

/// Lebesgue measure of the d-dimensional unit ball
fn unit_n_ball_measure(dim: usize) -> f64 {
    match dim {
        0 => 1.0,
        1 => 2.0,
        _ => 2.0 * std::f64::consts::PI / dim as f64 * unit_n_ball_measure(dim - 2),
    }
}

/// Batch Informed Trees (BIT*) planner
///
/// An anytime, asymptotically optimal sampling-based planner that
/// searches the implicit random geometric graph over batches of
/// informed samples with a lazily expanded, heuristically ordered queue.
///
/// Reference: Gammell, Srinivasa, Barfoot, "Batch Informed Trees (BIT*):
/// Sampling-based Optimal Planning via the Heuristically Guided Search
/// of Implicit Random Geometric Graphs", ICRA 2015. arXiv:1405.5848
pub struct BitStarPlanner<S: StateSpace, O: OptimizationObjective> {
    space: S,
    objective: O,
    config: BitStarConfig,

    graph: SearchGraph,
    queue: IntegratedQueue,
    free_nn: LinearNearestNeighbors,
    vertex_nn: LinearNearestNeighbors,
    sampler: Option<Box<dyn InformedSampler>>,
    rng: StdRng,

    start: Point2D,
    goal: Point2D,
    start_id: VertexId,
    goal_id: VertexId,

    /// Current r-disc connection radius
    r: f64,
    /// Current k-nearest connection count
    k: usize,
    /// Minimum k-nearest term; a function of dimension only
    k_rgg: f64,

    best_cost: Cost,
    pruned_cost: Cost,
    min_cost: Cost,
    cost_sampled: Cost,
    has_solution: bool,
    best_path: Option<Path2D>,
    closest_vertex: Option<VertexId>,
    closest_distance: f64,

    stats: PlannerStats,
}

impl<S: StateSpace, O: OptimizationObjective + Clone + 'static> BitStarPlanner<S, O> {
    pub fn new(space: S, objective: O, config: BitStarConfig) -> PlannerResult<Self> {
        if config.samples_per_batch == 0 {
            return Err(PlannerError::InvalidParameter {
                name: "samples_per_batch",
                value: 0.0,
                expected: "a positive sample count",
            });
        }
        if config.rewire_factor < 1.0 {
            return Err(PlannerError::InvalidParameter {
                name: "rewire_factor",
                value: config.rewire_factor,
                expected: "a scale factor of at least 1.0",
            });
        }
        if !(0.0..=1.0).contains(&config.prune_fraction) {
            return Err(PlannerError::InvalidParameter {
                name: "prune_fraction",
                value: config.prune_fraction,
                expected: "a fraction within [0, 1]",
            });
        }

        Ok(BitStarPlanner {
            space,
            objective,
            config,
            graph: SearchGraph::new(),
            queue: IntegratedQueue::new(0, 0, false),
            free_nn: LinearNearestNeighbors::new(euclidean_distance),
            vertex_nn: LinearNearestNeighbors::new(euclidean_distance),
            sampler: None,
            rng: StdRng::seed_from_u64(0),
            start: Point2D::origin(),
            goal: Point2D::origin(),
            start_id: 0,
            goal_id: 0,
            r: 0.0,
            k: 0,
            k_rgg: 0.0,
            best_cost: Cost(f64::INFINITY),
            pruned_cost: Cost(f64::INFINITY),
            min_cost: Cost(f64::INFINITY),
            cost_sampled: Cost(f64::INFINITY),
            has_solution: false,
            best_path: None,
            closest_vertex: None,
            closest_distance: f64::INFINITY,
            stats: PlannerStats::default(),
        })
    }

    pub fn config(&self) -> &BitStarConfig {
        &self.config
    }

    /// Changes take effect on the next `solve`
    pub fn config_mut(&mut self) -> &mut BitStarConfig {
        &mut self.config
    }

    /// Search for a path from `start` to `goal` until the termination
    /// condition fires or no better solution is reachable
    pub fn solve(
        &mut self,
        start: Point2D,
        goal: Point2D,
        ptc: TerminationCondition,
    ) -> PlannerResult<PlannerSolution> {
        if !self.space.is_valid(&start) {
            return Err(PlannerError::InvalidProblem {
                what: "start state",
                state: start,
            });
        }
        if !self.space.is_valid(&goal) {
            return Err(PlannerError::InvalidProblem {
                what: "goal state",
                state: goal,
            });
        }

        self.initialize(start, goal);
        let started = Instant::now();

        while !ptc.is_satisfied(self.stats.iterations, self.stats.batches, started)
            && self.min_cost.is_better_than(self.best_cost)
        {
            if !self.iterate() {
                break;
            }
        }

        Ok(self.current_solution())
    }

    fn initialize(&mut self, start: Point2D, goal: Point2D) {
        self.graph = SearchGraph::new();
        self.free_nn = LinearNearestNeighbors::new(euclidean_distance);
        self.vertex_nn = LinearNearestNeighbors::new(euclidean_distance);
        self.rng = match self.config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        self.stats = PlannerStats::default();

        self.start = start;
        self.goal = goal;
        self.start_id = self.graph.new_root(start, self.objective.identity_cost());
        self.vertex_nn.add(self.start_id, start);
        self.goal_id = self.graph.new_sample(goal, self.objective.infinite_cost());
        self.free_nn.add(self.goal_id, goal);
        self.stats.total_vertices = 1;

        self.queue = IntegratedQueue::new(
            self.start_id,
            self.goal_id,
            self.config.use_failure_tracking,
        );

        self.best_cost = self.objective.infinite_cost();
        self.pruned_cost = self.objective.infinite_cost();
        self.min_cost = self.objective.combine(
            self.objective.motion_cost_heuristic(&start, &goal),
            self.objective.cost_to_go(&goal, &goal),
        );
        self.cost_sampled = self.min_cost;
        self.has_solution = false;
        self.best_path = None;
        self.closest_vertex = None;
        self.closest_distance = f64::INFINITY;

        let bounds = self.space.bounds();
        let measure = self.space.measure();
        self.sampler = Some(if self.objective.has_direct_informed_sampler() {
            Box::new(EllipsoidSampler::new(start, goal, bounds, measure))
        } else {
            let objective = self.objective.clone();
            Box::new(RejectionSampler::new(
                bounds,
                measure,
                Box::new(move |p| {
                    objective.combine(
                        objective.motion_cost_heuristic(&start, p),
                        objective.cost_to_go(p, &goal),
                    )
                }),
            ))
        });

        self.initialize_nearest_terms();

        let near = self.near_criteria();
        let mut ctx = make_ctx(
            &self.objective,
            self.start,
            self.goal,
            &mut self.free_nn,
            &mut self.vertex_nn,
            near,
        );
        self.queue.insert_vertex(&mut self.graph, &mut ctx, self.start_id);
    }

    /// One unit of work: a batch turnover or one edge processed.
    /// Returns false when the caller should stop.
    fn iterate(&mut self) -> bool {
        self.stats.iterations += 1;
        if self.config.verbose && self.stats.iterations % 500 == 0 {
            println!(
                "Iter: {}, vertices: {}, samples: {}, best cost: {:.4}",
                self.stats.iterations,
                self.vertex_nn.len(),
                self.free_nn.len(),
                self.best_cost.value()
            );
        }

        let near = self.near_criteria();
        let queue_empty = {
            let mut ctx = make_ctx(
                &self.objective,
                self.start,
                self.goal,
                &mut self.free_nn,
                &mut self.vertex_nn,
                near,
            );
            self.queue.is_empty(&mut self.graph, &mut ctx)
        };
        if queue_empty {
            self.new_batch();
            return true;
        }

        if self.config.use_strict_queue_ordering && !self.queue.is_sorted() {
            self.resort();
            // the resort can prune the remainder of the frontier
            let mut ctx = make_ctx(
                &self.objective,
                self.start,
                self.goal,
                &mut self.free_nn,
                &mut self.vertex_nn,
                near,
            );
            if self.queue.is_empty(&mut self.graph, &mut ctx) {
                return true;
            }
        }

        let (u, v) = {
            let mut ctx = make_ctx(
                &self.objective,
                self.start,
                self.goal,
                &mut self.free_nn,
                &mut self.vertex_nn,
                near,
            );
            self.queue.pop_front_edge(&mut self.graph, &mut ctx)
        };

        let h = Heuristics::new(&self.objective, self.start, self.goal);

        // no queued edge can beat the incumbent: the batch is done
        if h.current_edge(&self.graph, u, v)
            .is_worse_than_or_equivalent_to(self.best_cost)
        {
            self.queue.finish();
            return true;
        }

        // the child is already reached at least as cheaply
        if h.current_edge_target(&self.graph, u, v)
            .is_worse_than_or_equivalent_to(self.graph.cost(v))
        {
            return true;
        }

        if !self.check_edge(u, v) {
            if self.config.use_failure_tracking {
                self.graph.mark_failed(u, v);
            }
            return true;
        }

        let h = Heuristics::new(&self.objective, self.start, self.goal);
        let actual = h.true_edge_cost(&self.graph, u, v);

        // re-test with the true edge cost
        if self
            .objective
            .combine(self.graph.cost(u), actual)
            .is_worse_than_or_equivalent_to(self.graph.cost(v))
        {
            return true;
        }
        let through = self.objective.combine(
            self.objective.combine(h.cost_to_come(&self.graph, u), actual),
            h.cost_to_go(&self.graph, v),
        );
        if through.is_worse_than_or_equivalent_to(self.best_cost) {
            return true;
        }

        let was_free = !self.graph.is_connected(v);
        self.add_edge(u, v, actual, was_free, true);

        // a rewire can improve the goal through its ancestors without an
        // edge landing on the goal itself, so test the goal's cost
        if self.graph.is_connected(self.goal_id)
            && self.graph.cost(self.goal_id).is_better_than(self.best_cost)
        {
            self.update_solution();
            if self.config.stop_on_solution_change {
                return false;
            }
        }
        true
    }

    ///////////////////////////////////////////////////////////////////
    // BIT* primitives

    /// Turn over the batch: resort, optionally prune, draw new samples,
    /// refresh the connection terms, and rewind the expansion token
    fn new_batch(&mut self) {
        if !self.queue.is_sorted() {
            self.resort();
        }
        self.stats.batches += 1;

        if self.config.use_pruning
            && self.has_solution
            && fractional_change(self.best_cost, self.pruned_cost) >= self.config.prune_fraction
        {
            self.prune();
        }

        if self.config.verbose {
            println!(
                "Batch {}: {} vertices, {} free samples, best cost: {:.4}",
                self.stats.batches,
                self.vertex_nn.len(),
                self.free_nn.len(),
                self.best_cost.value()
            );
        }

        self.update_samples();
        self.initialize_nearest_terms();
        self.queue.reset();
    }

    /// Draw the batch from the informed subset, keeping only valid
    /// states
    fn update_samples(&mut self) {
        let max_cost = self.best_cost;
        let sampler = self
            .sampler
            .as_ref()
            .expect("the sampler is created before the first batch");

        let mut added = 0;
        let mut attempts = 0;
        // a fully blocked informed set must not spin forever
        let attempt_cap = self.config.samples_per_batch * 100;
        while added < self.config.samples_per_batch && attempts < attempt_cap {
            attempts += 1;
            let state = sampler.sample(&mut self.rng, max_cost);
            self.stats.total_samples += 1;
            self.stats.state_collision_checks += 1;
            if self.space.is_valid(&state) {
                let id = self.graph.new_sample(state, self.objective.infinite_cost());
                self.free_nn.add(id, state);
                added += 1;
            }
        }
        self.cost_sampled = max_cost;
    }

    /// Remove everything that can no longer improve the solution
    fn prune(&mut self) {
        self.stats.prunings += 1;
        self.prune_samples();

        let near = self.near_criteria();
        let (disconnected, pruned) = {
            let mut ctx = make_ctx(
                &self.objective,
                self.start,
                self.goal,
                &mut self.free_nn,
                &mut self.vertex_nn,
                near,
            );
            self.queue.prune(&mut self.graph, &mut ctx)
        };
        self.stats.disconnected_vertices += disconnected as u64;
        self.stats.pruned_samples += pruned as u64;
        self.pruned_cost = self.best_cost;
    }

    /// Drop free samples whose lower-bound through cost cannot beat the
    /// incumbent
    fn prune_samples(&mut self) {
        let h = Heuristics::new(&self.objective, self.start, self.goal);
        for id in self.free_nn.ids() {
            if self.queue.sample_prune_condition(&self.graph, &h, id) {
                self.free_nn.remove(id);
                self.graph.mark_pruned(id);
                self.stats.pruned_samples += 1;
            }
        }
    }

    /// Reposition every stale vertex in the queue
    fn resort(&mut self) {
        let near = self.near_criteria();
        let (disconnected, pruned) = {
            let mut ctx = make_ctx(
                &self.objective,
                self.start,
                self.goal,
                &mut self.free_nn,
                &mut self.vertex_nn,
                near,
            );
            self.queue.resort(&mut self.graph, &mut ctx)
        };
        self.stats.disconnected_vertices += disconnected as u64;
        self.stats.pruned_samples += pruned as u64;
    }

    /// Collision-check a motion, counting the test
    fn check_edge(&mut self, u: VertexId, v: VertexId) -> bool {
        self.stats.edge_collision_checks += 1;
        let from = self.graph.state(u);
        let to = self.graph.state(v);
        self.space.check_motion(&from, &to)
    }

    /// Splice an accepted edge into the tree: promote a free sample, or
    /// rewire an existing vertex onto a cheaper parent
    fn add_edge(
        &mut self,
        u: VertexId,
        v: VertexId,
        edge_cost: Cost,
        remove_from_free: bool,
        update_expansion_queue: bool,
    ) {
        if self.graph.parent(v).is_some() {
            self.replace_parent(u, v, edge_cost);
        } else {
            self.graph.add_child(u, v);
            self.graph
                .set_parent(v, u, edge_cost, &self.objective, false);
            self.add_vertex(v, remove_from_free, update_expansion_queue);
        }
    }

    /// Rewire `v` onto the cheaper parent `u`, cascading the improvement
    /// into the subtree and invalidating stale queue entries
    fn replace_parent(&mut self, u: VertexId, v: VertexId, edge_cost: Cost) {
        self.stats.rewirings += 1;
        self.queue.mark_vertex_unsorted(v);

        let old_parent = self
            .graph
            .parent(v)
            .expect("replace_parent requires a connected child");
        self.graph.remove_child(old_parent, v, false, &self.objective);
        self.graph.remove_parent(v, &self.objective, false);

        // queued edges into v are stale; survivors reappear on the next
        // expansion
        self.queue.remove_edges_to(v);

        self.graph.add_child(u, v);
        self.graph.set_parent(v, u, edge_cost, &self.objective, true);
    }

    /// Promote a state into the tree and the expansion queue
    fn add_vertex(&mut self, v: VertexId, remove_from_free: bool, update_expansion_queue: bool) {
        if remove_from_free {
            self.free_nn.remove(v);
        }
        let state = self.graph.state(v);
        self.vertex_nn.add(v, state);
        self.stats.total_vertices += 1;

        if update_expansion_queue {
            let near = self.near_criteria();
            let mut ctx = make_ctx(
                &self.objective,
                self.start,
                self.goal,
                &mut self.free_nn,
                &mut self.vertex_nn,
                near,
            );
            self.queue.insert_vertex(&mut self.graph, &mut ctx, v);
        }
        self.update_nearest_terms();

        let distance_to_goal = self.space.distance(&state, &self.goal);
        if distance_to_goal < self.closest_distance {
            self.closest_distance = distance_to_goal;
            self.closest_vertex = Some(v);
        }
    }

    /// Record and publish an improved solution
    fn update_solution(&mut self) {
        self.best_cost = self.graph.cost(self.goal_id);
        self.has_solution = true;
        self.queue.set_threshold(self.best_cost);
        self.stats.solution_costs.push(self.best_cost.value());
        self.publish_solution();
        if self.config.verbose {
            println!(
                "Found a solution with cost {:.4} after {} iterations",
                self.best_cost.value(),
                self.stats.iterations
            );
        }
    }

    fn publish_solution(&mut self) {
        self.best_path = Some(self.path_to(self.goal_id));
    }

    fn path_to(&self, v: VertexId) -> Path2D {
        let mut points = Vec::new();
        let mut current = Some(v);
        while let Some(id) = current {
            points.push(self.graph.state(id));
            current = self.graph.parent(id);
        }
        points.reverse();
        Path2D::from_states(points)
    }

    fn current_solution(&self) -> PlannerSolution {
        if self.has_solution {
            PlannerSolution {
                status: PlannerStatus::ExactSolution,
                path: self
                    .best_path
                    .clone()
                    .expect("an exact solution is always published"),
                cost: self.best_cost,
                approximate_diff: -1.0,
            }
        } else if let Some(closest) = self.closest_vertex {
            PlannerSolution {
                status: PlannerStatus::ApproximateSolution,
                path: self.path_to(closest),
                cost: self.graph.cost(closest),
                approximate_diff: self.closest_distance,
            }
        } else {
            PlannerSolution {
                status: PlannerStatus::Timeout,
                path: Path2D::new(),
                cost: Cost(f64::INFINITY),
                approximate_diff: f64::INFINITY,
            }
        }
    }

    ///////////////////////////////////////////////////////////////////
    // RGG connection terms

    fn initialize_nearest_terms(&mut self) {
        self.k_rgg = self.minimum_rgg_k();
        self.update_nearest_terms();
    }

    fn update_nearest_terms(&mut self) {
        let n = self.vertex_nn.len() + self.free_nn.len();
        if self.config.use_k_nearest {
            self.k = self.k_of(n);
        } else {
            self.r = self.r_of(n);
        }
    }

    fn near_criteria(&self) -> NearCriteria {
        if self.config.use_k_nearest {
            NearCriteria::KNearest(self.k)
        } else {
            NearCriteria::Radius(self.r)
        }
    }

    /// r-disc radius for a graph of `n` uniformly distributed states
    fn r_of(&self, n: usize) -> f64 {
        if n < 2 {
            let bounds = self.space.bounds();
            return (bounds.xmax - bounds.xmin).hypot(bounds.ymax - bounds.ymin);
        }
        let d = self.space.dimension() as f64;
        let term = ((n as f64).ln() / n as f64).powf(1.0 / d);
        self.config.rewire_factor * self.minimum_rgg_r() * term
    }

    /// k-nearest count for a graph of `n` uniformly distributed states
    fn k_of(&self, n: usize) -> usize {
        if n < 2 {
            return 1;
        }
        (self.config.rewire_factor * self.k_rgg * (n as f64).ln()).ceil() as usize
    }

    /// Lower-bound r-disc term for asymptotic optimality (Karaman and
    /// Frazzoli), over the measure of the informed subset
    fn minimum_rgg_r(&self) -> f64 {
        let dim = self.space.dimension();
        let d = dim as f64;
        let measure = match &self.sampler {
            Some(sampler) => sampler.informed_measure(self.best_cost),
            None => self.space.measure(),
        };
        2.0 * ((1.0 + 1.0 / d) * (measure / unit_n_ball_measure(dim))).powf(1.0 / d)
    }

    /// Lower-bound k-nearest term; a function of dimension only
    fn minimum_rgg_k(&self) -> f64 {
        let d = self.space.dimension() as f64;
        std::f64::consts::E + std::f64::consts::E / d
    }

    ///////////////////////////////////////////////////////////////////
    // Introspection

    pub fn best_cost(&self) -> Cost {
        self.best_cost
    }

    /// Theoretical minimum solution cost: the heuristic value of the
    /// goal
    pub fn min_cost(&self) -> Cost {
        self.min_cost
    }

    /// The total-heuristic bound the last batch was sampled under
    pub fn cost_sampled(&self) -> Cost {
        self.cost_sampled
    }

    pub fn has_solution(&self) -> bool {
        self.has_solution
    }

    pub fn solution_path(&self) -> Option<&Path2D> {
        self.best_path.as_ref()
    }

    /// Snapshot of the numeric progress properties
    pub fn stats(&self) -> PlannerStats {
        let mut stats = self.stats.clone();
        stats.nearest_neighbor_queries =
            self.free_nn.query_count() + self.vertex_nn.query_count();
        stats
    }

    pub fn num_free_samples(&self) -> usize {
        self.free_nn.len()
    }

    pub fn num_graph_vertices(&self) -> usize {
        self.vertex_nn.len()
    }

    pub fn vertex_queue_remaining(&self) -> usize {
        self.queue.num_vertices()
    }

    pub fn edge_queue_size(&self) -> usize {
        self.queue.num_edges()
    }

    /// Every connected vertex with the index of its parent, start first
    pub fn planner_data(&self) -> Vec<(Point2D, Option<usize>)> {
        let mut index_of = HashMap::new();
        let mut ids = Vec::new();
        for id in 0..self.graph.len() {
            if !self.graph.is_pruned(id) && self.graph.is_connected(id) {
                index_of.insert(id, ids.len());
                ids.push(id);
            }
        }
        ids.iter()
            .map(|&id| {
                let parent = self.graph.parent(id).map(|p| index_of[&p]);
                (self.graph.state(id), parent)
            })
            .collect()
    }

    /// The next edge the search would process; expands vertices as a
    /// side effect
    pub fn next_edge_in_queue(&mut self) -> Option<(Point2D, Point2D)> {
        let near = self.near_criteria();
        let mut ctx = make_ctx(
            &self.objective,
            self.start,
            self.goal,
            &mut self.free_nn,
            &mut self.vertex_nn,
            near,
        );
        if self.queue.is_empty(&mut self.graph, &mut ctx) {
            return None;
        }
        let (u, v) = self.queue.front_edge(&mut self.graph, &mut ctx);
        Some((self.graph.state(u), self.graph.state(v)))
    }

    /// The key of the next edge; expands vertices as a side effect
    pub fn next_edge_value_in_queue(&mut self) -> Option<(Cost, Cost)> {
        let near = self.near_criteria();
        let mut ctx = make_ctx(
            &self.objective,
            self.start,
            self.goal,
            &mut self.free_nn,
            &mut self.vertex_nn,
            near,
        );
        if self.queue.is_empty(&mut self.graph, &mut ctx) {
            return None;
        }
        Some(self.queue.front_edge_value(&mut self.graph, &mut ctx))
    }

    /// Unexpanded vertex states in queue order
    pub fn vertex_queue_contents(&self) -> Vec<Point2D> {
        self.queue
            .list_vertices()
            .into_iter()
            .map(|v| self.graph.state(v))
            .collect()
    }

    /// Queued edges as state pairs in queue order
    pub fn edge_queue_contents(&self) -> Vec<(Point2D, Point2D)> {
        self.queue
            .list_edges()
            .into_iter()
            .map(|(u, v)| (self.graph.state(u), self.graph.state(v)))
            .collect()
    }
}

impl<S: StateSpace, O: OptimizationObjective + Clone + 'static> PathPlanner
    for BitStarPlanner<S, O>
{
    fn plan(&mut self, start: Point2D, goal: Point2D) -> Result<Path2D, PlannerError> {
        let solution = self.solve(start, goal, TerminationCondition::Batches(10))?;
        match solution.status {
            PlannerStatus::ExactSolution => Ok(solution.path),
            _ => Err(PlannerError::NoSolution {
                approximate_diff: solution.approximate_diff,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{AreaBounds, PathLengthObjective};
    use crate::utils::planar_space::{Obstacle, PlanarSpace};
    use itertools::Itertools;

    fn unit_square(obstacles: Vec<Obstacle>) -> PlanarSpace {
        PlanarSpace::new(AreaBounds::new([0.0, 1.0, 0.0, 1.0]), obstacles)
    }

    fn planner(
        space: PlanarSpace,
        seed: u64,
        configure: impl FnOnce(&mut BitStarConfig),
    ) -> BitStarPlanner<PlanarSpace, PathLengthObjective> {
        let mut config = BitStarConfig {
            samples_per_batch: 100,
            rewire_factor: 1.1,
            rng_seed: Some(seed),
            ..Default::default()
        };
        configure(&mut config);
        BitStarPlanner::new(space, PathLengthObjective, config).unwrap()
    }

    /// Tree integrity: parent/child symmetry, depth arithmetic, and
    /// cost-to-come telescoping along every parent chain
    fn assert_tree_consistent(p: &BitStarPlanner<PlanarSpace, PathLengthObjective>) {
        for id in 0..p.graph.len() {
            if p.graph.is_pruned(id) || !p.graph.is_connected(id) {
                continue;
            }
            if let Some(parent) = p.graph.parent(id) {
                assert!(p.graph.children(parent).contains(&id));
                assert_eq!(p.graph.depth(id), p.graph.depth(parent) + 1);
                let edge = p.graph.state(parent).distance(&p.graph.state(id));
                let expected = p.graph.cost(parent).value() + edge;
                assert!(
                    (p.graph.cost(id).value() - expected).abs() < 1e-9,
                    "cached cost diverged from the parent chain"
                );
            } else {
                assert!(p.graph.is_root(id));
                assert_eq!(p.graph.depth(id), 0);
                assert_eq!(p.graph.cost(id).value(), 0.0);
            }
        }
    }

    /// Every record is in exactly one of: the free set, the tree, or
    /// the pruned state
    fn assert_states_reconcile(p: &BitStarPlanner<PlanarSpace, PathLengthObjective>) {
        let mut pruned = 0;
        for id in 0..p.graph.len() {
            let in_free = p.free_nn.contains(id);
            let in_tree = p.vertex_nn.contains(id);
            if p.graph.is_pruned(id) {
                pruned += 1;
                assert!(!in_free && !in_tree, "pruned vertex {} still indexed", id);
            } else {
                assert!(
                    in_free ^ in_tree,
                    "vertex {} must be exactly one of free or connected",
                    id
                );
            }
        }
        assert_eq!(p.graph.len(), pruned + p.free_nn.len() + p.vertex_nn.len());
    }

    #[test]
    fn test_s1_open_space_converges_near_optimal() {
        let mut p = planner(unit_square(vec![]), 42, |_| {});
        let solution = p
            .solve(
                Point2D::new(0.0, 0.0),
                Point2D::new(1.0, 1.0),
                TerminationCondition::Batches(5),
            )
            .unwrap();

        assert_eq!(solution.status, PlannerStatus::ExactSolution);
        let optimal = 2.0_f64.sqrt();
        assert!(
            solution.cost.value() <= 1.05 * optimal,
            "cost {} not within 5% of {}",
            solution.cost.value(),
            optimal
        );
        assert!(solution.cost.value() >= optimal - 1e-9);

        // the published path is the goal chain and its accumulated cost
        // matches the reported cost
        let recomputed = solution.path.cost(&PathLengthObjective);
        assert!((recomputed.value() - solution.cost.value()).abs() < 1e-9);
        assert_eq!(solution.path.points[0], Point2D::new(0.0, 0.0));
        assert_eq!(*solution.path.points.last().unwrap(), Point2D::new(1.0, 1.0));

        assert_tree_consistent(&p);
        assert_states_reconcile(&p);
    }

    #[test]
    fn test_s2_single_obstacle_detour() {
        let space = unit_square(vec![Obstacle::rectangle(0.3, 0.3, 0.7, 0.7)]);
        let mut p = planner(space, 7, |_| {});
        let solution = p
            .solve(
                Point2D::new(0.0, 0.0),
                Point2D::new(1.0, 1.0),
                TerminationCondition::Batches(5),
            )
            .unwrap();

        assert_eq!(solution.status, PlannerStatus::ExactSolution);
        // shortest detour hugs a box corner: twice the start-to-corner
        // distance
        let optimal = 2.0 * (0.7_f64.powi(2) + 0.3_f64.powi(2)).sqrt();
        assert!(
            solution.cost.value() <= 1.10 * optimal,
            "cost {} not within 10% of {}",
            solution.cost.value(),
            optimal
        );
        assert!(solution.cost.value() >= optimal - 1e-9);
        assert_tree_consistent(&p);
    }

    #[test]
    fn test_s3_infeasible_reports_approximate() {
        // a wall across the whole domain
        let space = unit_square(vec![Obstacle::rectangle(-0.1, 0.45, 1.1, 0.55)]);
        let mut p = planner(space, 3, |_| {});
        let solution = p
            .solve(
                Point2D::new(0.0, 0.0),
                Point2D::new(1.0, 1.0),
                TerminationCondition::Batches(3),
            )
            .unwrap();

        assert_eq!(solution.status, PlannerStatus::ApproximateSolution);
        assert!(!p.has_solution());
        assert!(solution.approximate_diff > 0.4);
        assert_tree_consistent(&p);
        assert_states_reconcile(&p);
    }

    #[test]
    fn test_s4_pruning_discards_hopeless_states() {
        let mut p = planner(unit_square(vec![]), 11, |config| {
            config.prune_fraction = 0.01;
        });
        p.solve(
            Point2D::new(0.0, 0.0),
            Point2D::new(1.0, 1.0),
            TerminationCondition::Batches(4),
        )
        .unwrap();

        let stats = p.stats();
        assert!(stats.prunings >= 1);
        assert!(stats.pruned_samples >= 1);

        // prune monotonicity: directly after a prune, nothing hopeless
        // survives
        if !p.queue.is_sorted() {
            p.resort();
        }
        p.prune();
        let h = Heuristics::new(&PathLengthObjective, p.start, p.goal);
        for id in p.vertex_nn.ids() {
            assert!(
                !h.lower_bound_vertex(&p.graph, id)
                    .is_worse_than(p.best_cost),
                "tree vertex {} should have been pruned",
                id
            );
        }
        for id in p.free_nn.ids() {
            assert!(
                h.lower_bound_vertex(&p.graph, id).is_better_than(p.best_cost),
                "free sample {} should have been pruned",
                id
            );
        }
        assert_tree_consistent(&p);
        assert_states_reconcile(&p);
    }

    #[test]
    fn test_s5_seeded_runs_are_identical() {
        let run = || {
            let mut p = planner(unit_square(vec![]), 1234, |_| {});
            let solution = p
                .solve(
                    Point2D::new(0.0, 0.0),
                    Point2D::new(1.0, 1.0),
                    TerminationCondition::Batches(3),
                )
                .unwrap();
            (p.stats().solution_costs, solution.path.points)
        };

        let (costs_a, path_a) = run();
        let (costs_b, path_b) = run();
        assert_eq!(costs_a, costs_b);
        assert_eq!(path_a.len(), path_b.len());
        for (a, b) in path_a.iter().zip(path_b.iter()) {
            assert_eq!(a.x, b.x);
            assert_eq!(a.y, b.y);
        }
    }

    #[test]
    fn test_s6_stop_on_solution_change() {
        let mut p = planner(unit_square(vec![]), 5, |config| {
            config.stop_on_solution_change = true;
        });
        let solution = p
            .solve(
                Point2D::new(0.0, 0.0),
                Point2D::new(1.0, 1.0),
                TerminationCondition::Never,
            )
            .unwrap();

        assert_eq!(solution.status, PlannerStatus::ExactSolution);
        assert_eq!(p.stats().solution_costs.len(), 1);
        assert_eq!(*solution.path.points.last().unwrap(), Point2D::new(1.0, 1.0));
    }

    #[test]
    fn test_solution_costs_strictly_improve() {
        let mut p = planner(unit_square(vec![]), 99, |_| {});
        p.solve(
            Point2D::new(0.0, 0.0),
            Point2D::new(1.0, 1.0),
            TerminationCondition::Batches(5),
        )
        .unwrap();

        let costs = p.stats().solution_costs;
        assert!(!costs.is_empty());
        for (a, b) in costs.iter().tuple_windows() {
            assert!(b < a, "solution costs must strictly improve: {} then {}", a, b);
        }
    }

    #[test]
    fn test_k_nearest_variant_finds_solution() {
        let mut p = planner(unit_square(vec![]), 21, |config| {
            config.use_k_nearest = true;
        });
        let solution = p
            .solve(
                Point2D::new(0.0, 0.0),
                Point2D::new(1.0, 1.0),
                TerminationCondition::Batches(3),
            )
            .unwrap();
        assert_eq!(solution.status, PlannerStatus::ExactSolution);
        assert_tree_consistent(&p);
    }

    #[test]
    fn test_strict_ordering_variant_finds_solution() {
        let space = unit_square(vec![Obstacle::circle(0.5, 0.5, 0.15)]);
        let mut p = planner(space, 8, |config| {
            config.use_strict_queue_ordering = true;
            config.use_failure_tracking = true;
        });
        let solution = p
            .solve(
                Point2D::new(0.0, 0.0),
                Point2D::new(1.0, 1.0),
                TerminationCondition::Batches(4),
            )
            .unwrap();
        assert_eq!(solution.status, PlannerStatus::ExactSolution);
        assert_tree_consistent(&p);
        assert_states_reconcile(&p);
    }

    #[test]
    fn test_zero_iterations_times_out() {
        let mut p = planner(unit_square(vec![]), 1, |_| {});
        let solution = p
            .solve(
                Point2D::new(0.0, 0.0),
                Point2D::new(1.0, 1.0),
                TerminationCondition::Iterations(0),
            )
            .unwrap();
        assert_eq!(solution.status, PlannerStatus::Timeout);
    }

    #[test]
    fn test_invalid_start_is_a_configuration_error() {
        let space = unit_square(vec![Obstacle::circle(0.0, 0.0, 0.1)]);
        let mut p = planner(space, 1, |_| {});
        let result = p.solve(
            Point2D::new(0.0, 0.0),
            Point2D::new(1.0, 1.0),
            TerminationCondition::Batches(1),
        );
        assert!(matches!(
            result,
            Err(PlannerError::InvalidProblem { what: "start state", .. })
        ));
    }

    #[test]
    fn test_invalid_parameters_are_rejected() {
        let config = BitStarConfig {
            samples_per_batch: 0,
            ..Default::default()
        };
        assert!(matches!(
            BitStarPlanner::new(unit_square(vec![]), PathLengthObjective, config),
            Err(PlannerError::InvalidParameter { name: "samples_per_batch", .. })
        ));

        let config = BitStarConfig {
            rewire_factor: 0.5,
            ..Default::default()
        };
        assert!(matches!(
            BitStarPlanner::new(unit_square(vec![]), PathLengthObjective, config),
            Err(PlannerError::InvalidParameter { name: "rewire_factor", .. })
        ));
    }

    #[test]
    fn test_planner_data_tree_dump() {
        let mut p = planner(unit_square(vec![]), 17, |_| {});
        p.solve(
            Point2D::new(0.0, 0.0),
            Point2D::new(1.0, 1.0),
            TerminationCondition::Batches(2),
        )
        .unwrap();

        let tree = p.planner_data();
        assert_eq!(tree.len(), p.num_graph_vertices());
        // exactly one root, and every parent index is in range
        let roots = tree.iter().filter(|(_, parent)| parent.is_none()).count();
        assert_eq!(roots, 1);
        for &(_, parent) in &tree {
            if let Some(index) = parent {
                assert!(index < tree.len());
            }
        }
    }

    #[test]
    fn test_path_planner_trait_interface() {
        let mut p = planner(unit_square(vec![]), 2, |_| {});
        let path = p.plan(Point2D::new(0.1, 0.1), Point2D::new(0.9, 0.9)).unwrap();
        assert!(path.len() >= 2);
        assert!(path.cost(&PathLengthObjective).value() < 1.5);
    }
}
