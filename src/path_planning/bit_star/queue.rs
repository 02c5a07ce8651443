//! The integrated vertex-expansion / edge-processing queue
//!
//! Two coupled frontiers drive the search: a vertex queue ordered on the
//! current through-goal estimate of each tree vertex, and an edge queue
//! ordered lexicographically on (through-edge estimate, parent
//! cost-to-come). Vertices are expanded lazily — only far enough that no
//! unexpanded vertex could still put a better edge in front of the best
//! queued edge. An expansion token partitions the vertex queue: every
//! entry strictly before the token has been expanded exactly once since
//! the last `reset`.
//!
//! Both queues live in `BTreeMap`s keyed on (cost value, insertion
//! serial). The serial breaks ties deterministically in insertion order
//! and gives every entry a stable handle that survives unrelated
//! insertions and removals; the id-indexed lookups hold these keys.

use std::collections::{BTreeMap, HashMap};
use std::ops::Bound::{Excluded, Unbounded};

use ordered_float::OrderedFloat;

use crate::common::{Cost, NearestNeighbors, Point2D};
use crate::path_planning::bit_star::heuristics::Heuristics;
use crate::path_planning::bit_star::vertex::{SearchGraph, VertexId};

/// Key of a vertex-queue entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct VertexQueueKey {
    value: OrderedFloat<f64>,
    serial: u64,
}

/// Key of an edge-queue entry; ordered on (value, tiebreak, serial)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct EdgeQueueKey {
    value: OrderedFloat<f64>,
    tiebreak: OrderedFloat<f64>,
    serial: u64,
}

/// How "near" is defined for neighborhood queries
#[derive(Debug, Clone, Copy)]
pub enum NearCriteria {
    Radius(f64),
    KNearest(usize),
}

/// Per-call view of the driver's collaborators
///
/// The queue calls back into the driver through this bundle: the
/// heuristic suite and the two nearest-neighbor indices (free samples
/// and tree vertices) with the current near definition. It is rebuilt
/// for every queue call rather than stored, which keeps the queue
/// decoupled from the driver's containers.
pub struct QueueContext<'a> {
    pub heuristics: Heuristics<'a>,
    pub samples: &'a mut dyn NearestNeighbors,
    pub vertices: &'a mut dyn NearestNeighbors,
    pub near: NearCriteria,
}

impl QueueContext<'_> {
    fn near_samples(&self, state: &Point2D) -> Vec<VertexId> {
        match self.near {
            NearCriteria::Radius(r) => self.samples.nearest_r(state, r),
            NearCriteria::KNearest(k) => self.samples.nearest_k(state, k),
        }
    }

    fn near_vertices(&self, state: &Point2D) -> Vec<VertexId> {
        match self.near {
            NearCriteria::Radius(r) => self.vertices.nearest_r(state, r),
            NearCriteria::KNearest(k) => self.vertices.nearest_k(state, k),
        }
    }
}

/// The dual-queue search frontier
pub struct IntegratedQueue {
    start: VertexId,
    goal: VertexId,
    vertex_queue: BTreeMap<VertexQueueKey, VertexId>,
    /// Key of the next vertex to expand; `None` means everything before
    /// the end has been expanded
    token: Option<VertexQueueKey>,
    edge_queue: BTreeMap<EdgeQueueKey, (VertexId, VertexId)>,
    vertex_lookup: HashMap<VertexId, VertexQueueKey>,
    outgoing_edges: HashMap<VertexId, Vec<EdgeQueueKey>>,
    incoming_edges: HashMap<VertexId, Vec<EdgeQueueKey>>,
    resort_list: Vec<VertexId>,
    cost_threshold: Cost,
    next_serial: u64,
    use_failure_tracking: bool,
}

impl IntegratedQueue {
    pub fn new(start: VertexId, goal: VertexId, use_failure_tracking: bool) -> Self {
        IntegratedQueue {
            start,
            goal,
            vertex_queue: BTreeMap::new(),
            token: None,
            edge_queue: BTreeMap::new(),
            vertex_lookup: HashMap::new(),
            outgoing_edges: HashMap::new(),
            incoming_edges: HashMap::new(),
            resort_list: Vec::new(),
            cost_threshold: Cost(f64::INFINITY),
            next_serial: 0,
            use_failure_tracking,
        }
    }

    fn serial(&mut self) -> u64 {
        let serial = self.next_serial;
        self.next_serial += 1;
        serial
    }

    /// Record the cost of the best known solution; all prune conditions
    /// test against it
    pub fn set_threshold(&mut self, cost: Cost) {
        self.cost_threshold = cost;
    }

    pub fn threshold(&self) -> Cost {
        self.cost_threshold
    }

    ///////////////////////////////////////////////////////////////////
    // Insertion

    /// Add a vertex to the expansion queue, expanding it immediately if
    /// it sorts in front of the token
    pub fn insert_vertex(&mut self, graph: &mut SearchGraph, ctx: &mut QueueContext, v: VertexId) {
        self.vertex_insert_helper(graph, ctx, v, true);
    }

    /// Add an edge to the edge queue
    pub fn insert_edge(&mut self, graph: &SearchGraph, h: &Heuristics, edge: (VertexId, VertexId)) {
        self.edge_insert_helper(graph, h, edge);
    }

    ///////////////////////////////////////////////////////////////////
    // Front access

    /// The best unexpanded vertex, after bringing the frontier up to date
    pub fn front_vertex(&mut self, graph: &mut SearchGraph, ctx: &mut QueueContext) -> VertexId {
        assert!(
            !self.is_empty(graph, ctx),
            "Attempted to access the first element of an empty IntegratedQueue"
        );
        self.update_queue(graph, ctx);
        *self
            .vertex_queue
            .first_key_value()
            .expect("vertex queue empty after update")
            .1
    }

    pub fn front_vertex_value(&mut self, graph: &mut SearchGraph, ctx: &mut QueueContext) -> Cost {
        assert!(
            !self.is_empty(graph, ctx),
            "Attempted to access the first element of an empty IntegratedQueue"
        );
        self.update_queue(graph, ctx);
        Cost(
            self.vertex_queue
                .first_key_value()
                .expect("vertex queue empty after update")
                .0
                .value
                .0,
        )
    }

    /// The best queued edge, after bringing the frontier up to date
    pub fn front_edge(
        &mut self,
        graph: &mut SearchGraph,
        ctx: &mut QueueContext,
    ) -> (VertexId, VertexId) {
        assert!(
            !self.is_empty(graph, ctx),
            "Attempted to access the first element of an empty IntegratedQueue"
        );
        self.update_queue(graph, ctx);
        *self
            .edge_queue
            .first_key_value()
            .expect("edge queue empty after update")
            .1
    }

    /// The (estimate, parent-cost) key of the best queued edge
    pub fn front_edge_value(&mut self, graph: &mut SearchGraph, ctx: &mut QueueContext) -> (Cost, Cost) {
        assert!(
            !self.is_empty(graph, ctx),
            "Attempted to access the first element of an empty IntegratedQueue"
        );
        self.update_queue(graph, ctx);
        let key = self
            .edge_queue
            .first_key_value()
            .expect("edge queue empty after update")
            .0;
        (Cost(key.value.0), Cost(key.tiebreak.0))
    }

    /// Remove and return the best queued edge
    pub fn pop_front_edge(
        &mut self,
        graph: &mut SearchGraph,
        ctx: &mut QueueContext,
    ) -> (VertexId, VertexId) {
        assert!(
            !self.is_empty(graph, ctx),
            "Attempted to pop an empty IntegratedQueue"
        );
        self.update_queue(graph, ctx);
        let (&key, &edge) = self
            .edge_queue
            .first_key_value()
            .expect("edge queue empty after update");
        self.edge_remove_helper(key, true, true);
        edge
    }

    ///////////////////////////////////////////////////////////////////
    // Expansion

    /// Expand vertices until none could beat the best queued edge
    pub fn update_queue(&mut self, graph: &mut SearchGraph, ctx: &mut QueueContext) {
        loop {
            let Some(token_key) = self.token else {
                break;
            };
            let expand = match self.edge_queue.first_key_value() {
                // any edge is better than none
                None => true,
                // the vertex could still put a better edge in the queue
                Some((edge_key, _)) => token_key.value <= edge_key.value,
            };
            if expand {
                self.expand_next_vertex(graph, ctx);
            } else {
                break;
            }
        }
    }

    fn expand_next_vertex(&mut self, graph: &mut SearchGraph, ctx: &mut QueueContext) {
        let token_key = self.token.expect("no vertex left to expand");
        let v = *self
            .vertex_queue
            .get(&token_key)
            .expect("expansion token does not name a queue entry");
        if !self.vertex_prune_condition(graph, &ctx.heuristics, v) {
            self.expand_vertex(graph, ctx, v);
            self.token = self
                .vertex_queue
                .range((Excluded(token_key), Unbounded))
                .next()
                .map(|(&k, _)| k);
        } else {
            // everything from here on would be pruned anyway
            self.token = None;
        }
    }

    /// Queue up the outgoing edges of a vertex: always to nearby free
    /// samples, and on first expansion also to nearby tree vertices as
    /// rewiring candidates
    pub fn expand_vertex(&mut self, graph: &mut SearchGraph, ctx: &mut QueueContext, v: VertexId) {
        if self.vertex_prune_condition(graph, &ctx.heuristics, v) {
            return;
        }
        let state = graph.state(v);
        let h = ctx.heuristics;

        for sample in ctx.near_samples(&state) {
            self.queueup_edge(graph, &h, v, sample);
        }

        if graph.is_new(v) {
            let parent = graph.parent(v);
            for neighbor in ctx.near_vertices(&state) {
                if graph.is_root(neighbor) || neighbor == v {
                    continue;
                }
                if graph.parent(neighbor) == Some(v) || parent == Some(neighbor) {
                    continue;
                }
                self.queueup_edge(graph, &h, v, neighbor);
            }
            graph.mark_old(v);
        }
    }

    /// Insert an edge unless it has already failed or cannot improve the
    /// solution
    pub fn queueup_edge(
        &mut self,
        graph: &SearchGraph,
        h: &Heuristics,
        parent: VertexId,
        child: VertexId,
    ) {
        if self.use_failure_tracking && graph.has_already_failed(parent, child) {
            return;
        }
        if !self.edge_prune_condition(graph, h, (parent, child)) {
            self.edge_insert_helper(graph, h, (parent, child));
        }
    }

    ///////////////////////////////////////////////////////////////////
    // Resorting

    /// Note that a vertex's queue key may be stale
    pub fn mark_vertex_unsorted(&mut self, v: VertexId) {
        self.resort_list.push(v);
    }

    pub fn is_sorted(&self) -> bool {
        self.resort_list.is_empty()
    }

    /// Reposition every stale vertex (and, transitively, its children),
    /// pruning branches that can no longer improve the solution.
    /// Returns (vertices disconnected, samples pruned).
    pub fn resort(&mut self, graph: &mut SearchGraph, ctx: &mut QueueContext) -> (usize, usize) {
        let mut pruned = (0, 0);
        if self.resort_list.is_empty() {
            return pruned;
        }

        // Group by depth so parents are repositioned before their
        // children and no branch is processed twice.
        let mut by_depth: BTreeMap<usize, std::collections::BTreeSet<VertexId>> = BTreeMap::new();
        for v in std::mem::take(&mut self.resort_list) {
            by_depth.entry(graph.depth(v)).or_default().insert(v);
        }

        while let Some((&depth, _)) = by_depth.iter().next() {
            let group = by_depth.remove(&depth).expect("depth group disappeared");
            for v in group {
                // may have been pruned or disconnected by an earlier
                // branch prune in this very resort
                if graph.is_pruned(v) || !graph.is_connected(v) {
                    continue;
                }
                if self.vertex_prune_condition(graph, &ctx.heuristics, v) {
                    let n = self.prune_branch(graph, ctx, v);
                    pruned.0 += n.0;
                    pruned.1 += n.1;
                } else {
                    if graph.has_children(v) {
                        let deeper = by_depth.entry(depth + 1).or_default();
                        for child in graph.children(v) {
                            deeper.insert(child);
                        }
                    }
                    self.reinsert_vertex(graph, ctx, v);
                }
            }
        }
        pruned
    }

    /// Remove and re-add a vertex at its current key, preserving its
    /// expanded/unexpanded status, and re-evaluate its outgoing edges
    fn reinsert_vertex(&mut self, graph: &mut SearchGraph, ctx: &mut QueueContext, v: VertexId) {
        let key = *self
            .vertex_lookup
            .get(&v)
            .unwrap_or_else(|| panic!("Vertex {} to reinsert is not in the lookup", v));

        let already_expanded = match self.token {
            // the token is at the end, so the vertex sits in front of it
            None => true,
            Some(token_key) => key < token_key,
        };

        let h = ctx.heuristics;
        self.vertex_remove_helper(graph, &h, None, v, false);
        self.vertex_insert_helper(graph, ctx, v, !already_expanded);

        // reinsert surviving outgoing edges at their current keys
        let old_keys = self
            .outgoing_edges
            .get_mut(&v)
            .map(std::mem::take)
            .unwrap_or_default();
        for old_key in old_keys {
            let edge = *self
                .edge_queue
                .get(&old_key)
                .expect("outgoing lookup names a missing edge entry");
            if !self.edge_prune_condition(graph, &h, edge) {
                self.edge_insert_helper(graph, &h, edge);
            }
            Self::rm_edge_lookup(&mut self.incoming_edges, edge.1, old_key);
            self.edge_queue.remove(&old_key);
        }
    }

    ///////////////////////////////////////////////////////////////////
    // Pruning

    /// Walk the queue from just after the goal vertex and prune every
    /// branch whose root can no longer improve the solution.
    /// Returns (vertices disconnected, samples pruned).
    pub fn prune(&mut self, graph: &mut SearchGraph, ctx: &mut QueueContext) -> (usize, usize) {
        assert!(self.is_sorted(), "Prune cannot be called on an unsorted queue");

        // The queue is ordered on current cost-to-come, an upper bound on
        // the lower-bound value pruning tests, so nothing at or before
        // the goal entry can be prunable.
        let goal_key = *self
            .vertex_lookup
            .get(&self.goal)
            .expect("the goal vertex is not in the queue");

        let mut pruned = (0, 0);
        let mut cursor = goal_key;
        loop {
            let next = self
                .vertex_queue
                .range((Excluded(cursor), Unbounded))
                .next()
                .map(|(&k, &v)| (k, v));
            let Some((key, v)) = next else {
                break;
            };
            if self.vertex_prune_condition(graph, &ctx.heuristics, v) {
                let n = self.prune_branch(graph, ctx, v);
                pruned.0 += n.0;
                pruned.1 += n.1;
                // the cursor entry survives; rescan from it
            } else {
                cursor = key;
            }
        }
        pruned
    }

    /// Disconnect a whole subtree, returning each vertex to the free set
    /// or pruning it outright.
    /// Returns (vertices disconnected, samples pruned).
    fn prune_branch(
        &mut self,
        graph: &mut SearchGraph,
        ctx: &mut QueueContext,
        branch_base: VertexId,
    ) -> (usize, usize) {
        assert!(branch_base != self.goal, "Trying to prune the goal vertex");
        assert!(branch_base != self.start, "Trying to prune the start vertex");
        assert!(
            graph.is_connected(branch_base),
            "Trying to prune a disconnected vertex"
        );

        self.disconnect_parent(graph, ctx, branch_base, false);
        let children = graph.children(branch_base);

        let mut pruned = (1, 0);
        let h = ctx.heuristics;
        pruned.1 += self.vertex_remove_helper(
            graph,
            &h,
            Some((&mut *ctx.vertices, &mut *ctx.samples)),
            branch_base,
            true,
        );
        for child in children {
            let n = self.prune_branch(graph, ctx, child);
            pruned.0 += n.0;
            pruned.1 += n.1;
        }
        pruned
    }

    /// Detach a vertex from its parent, optionally cascading the
    /// now-infinite cost into its subtree
    fn disconnect_parent(
        &mut self,
        graph: &mut SearchGraph,
        ctx: &QueueContext,
        v: VertexId,
        cascade_cost_updates: bool,
    ) {
        let parent = graph
            .parent(v)
            .expect("an orphaned vertex has been passed for disconnection");
        // the parent may already be pruned when disconnections cascade
        if !graph.is_pruned(parent) {
            graph.remove_child(parent, v, false, ctx.heuristics.objective());
        }
        graph.remove_parent(v, ctx.heuristics.objective(), cascade_cost_updates);
    }

    ///////////////////////////////////////////////////////////////////
    // Edge-queue maintenance

    /// Drop every queued edge whose child is `v`
    pub fn remove_edges_to(&mut self, v: VertexId) {
        if self.edge_queue.is_empty() {
            return;
        }
        let keys = self
            .incoming_edges
            .get_mut(&v)
            .map(std::mem::take)
            .unwrap_or_default();
        for key in keys {
            let (parent, _) = *self
                .edge_queue
                .get(&key)
                .expect("incoming lookup names a missing edge entry");
            Self::rm_edge_lookup(&mut self.outgoing_edges, parent, key);
            self.edge_queue.remove(&key);
        }
    }

    /// Drop every queued edge whose parent is `u`
    pub fn remove_edges_from(&mut self, u: VertexId) {
        if self.edge_queue.is_empty() {
            return;
        }
        let keys = self
            .outgoing_edges
            .get_mut(&u)
            .map(std::mem::take)
            .unwrap_or_default();
        for key in keys {
            let (_, child) = *self
                .edge_queue
                .get(&key)
                .expect("outgoing lookup names a missing edge entry");
            Self::rm_edge_lookup(&mut self.incoming_edges, child, key);
            self.edge_queue.remove(&key);
        }
    }

    /// Drop the queued edges into `v` that can no longer improve it
    pub fn prune_edges_to(&mut self, graph: &SearchGraph, h: &Heuristics, v: VertexId) {
        if self.edge_queue.is_empty() {
            return;
        }
        let keys: Vec<EdgeQueueKey> = self.incoming_edges.get(&v).cloned().unwrap_or_default();
        for key in keys {
            let edge = *self
                .edge_queue
                .get(&key)
                .expect("incoming lookup names a missing edge entry");
            if self.edge_prune_condition(graph, h, edge) {
                Self::rm_edge_lookup(&mut self.outgoing_edges, edge.0, key);
                Self::rm_edge_lookup(&mut self.incoming_edges, v, key);
                self.edge_queue.remove(&key);
            }
        }
    }

    /// Drop the queued edges out of `u` that can no longer improve their
    /// targets
    pub fn prune_edges_from(&mut self, graph: &SearchGraph, h: &Heuristics, u: VertexId) {
        if self.edge_queue.is_empty() {
            return;
        }
        let keys: Vec<EdgeQueueKey> = self.outgoing_edges.get(&u).cloned().unwrap_or_default();
        for key in keys {
            let edge = *self
                .edge_queue
                .get(&key)
                .expect("outgoing lookup names a missing edge entry");
            if self.edge_prune_condition(graph, h, edge) {
                Self::rm_edge_lookup(&mut self.incoming_edges, edge.1, key);
                Self::rm_edge_lookup(&mut self.outgoing_edges, u, key);
                self.edge_queue.remove(&key);
            }
        }
    }

    ///////////////////////////////////////////////////////////////////
    // Lifecycle

    /// End the batch: clear the edge queue and its lookups, keeping the
    /// vertex queue, the vertex lookup, and any pending resorts
    pub fn finish(&mut self) {
        self.edge_queue.clear();
        self.outgoing_edges.clear();
        self.incoming_edges.clear();
    }

    /// `finish`, then move the token back to the front so every vertex
    /// re-expands against the next batch's denser graph
    pub fn reset(&mut self) {
        self.finish();
        self.token = self.vertex_queue.first_key_value().map(|(&k, _)| k);
    }

    /// Discard everything and restore the infinite threshold
    pub fn clear(&mut self) {
        self.vertex_queue.clear();
        self.token = None;
        self.edge_queue.clear();
        self.vertex_lookup.clear();
        self.outgoing_edges.clear();
        self.incoming_edges.clear();
        self.resort_list.clear();
        self.cost_threshold = Cost(f64::INFINITY);
    }

    ///////////////////////////////////////////////////////////////////
    // Prune conditions

    /// A tree vertex is prunable when even its lower-bound through cost
    /// is strictly worse than the threshold
    pub fn vertex_prune_condition(&self, graph: &SearchGraph, h: &Heuristics, v: VertexId) -> bool {
        h.lower_bound_vertex(graph, v)
            .is_worse_than(self.cost_threshold)
    }

    /// A free sample is prunable when it cannot *strictly* improve the
    /// threshold
    pub fn sample_prune_condition(&self, graph: &SearchGraph, h: &Heuristics, v: VertexId) -> bool {
        h.lower_bound_vertex(graph, v)
            .is_worse_than_or_equivalent_to(self.cost_threshold)
    }

    /// An edge is prunable when its lower-bound through cost is worse
    /// than the threshold, or when it cannot strictly improve the
    /// cost-to-come of an already-connected child
    pub fn edge_prune_condition(
        &self,
        graph: &SearchGraph,
        h: &Heuristics,
        edge: (VertexId, VertexId),
    ) -> bool {
        let (u, v) = edge;
        let mut prunable = h
            .lower_bound_edge(graph, u, v)
            .is_worse_than(self.cost_threshold);
        if !prunable && graph.parent(v).is_some() {
            prunable = h
                .current_edge_target(graph, u, v)
                .is_worse_than_or_equivalent_to(graph.cost(v));
        }
        prunable
    }

    ///////////////////////////////////////////////////////////////////
    // Introspection

    pub fn num_edges(&self) -> usize {
        self.edge_queue.len()
    }

    /// Number of vertices still awaiting expansion
    pub fn num_vertices(&self) -> usize {
        match self.token {
            None => 0,
            Some(token_key) => self.vertex_queue.range(token_key..).count(),
        }
    }

    pub fn num_edges_to(&self, v: VertexId) -> usize {
        self.incoming_edges.get(&v).map_or(0, |keys| keys.len())
    }

    pub fn num_edges_from(&self, u: VertexId) -> usize {
        self.outgoing_edges.get(&u).map_or(0, |keys| keys.len())
    }

    /// Expand as needed to answer whether any edge remains to process
    pub fn is_empty(&mut self, graph: &mut SearchGraph, ctx: &mut QueueContext) -> bool {
        while self.edge_queue.is_empty() && self.token.is_some() {
            self.expand_next_vertex(graph, ctx);
        }
        self.edge_queue.is_empty()
    }

    /// Unexpanded vertices in queue order
    pub fn list_vertices(&self) -> Vec<VertexId> {
        match self.token {
            None => Vec::new(),
            Some(token_key) => self.vertex_queue.range(token_key..).map(|(_, &v)| v).collect(),
        }
    }

    /// Queued edges in queue order
    pub fn list_edges(&self) -> Vec<(VertexId, VertexId)> {
        self.edge_queue.values().copied().collect()
    }

    ///////////////////////////////////////////////////////////////////
    // Helpers

    fn vertex_queue_key(&mut self, graph: &SearchGraph, h: &Heuristics, v: VertexId) -> VertexQueueKey {
        VertexQueueKey {
            value: OrderedFloat(h.current_vertex(graph, v).value()),
            serial: self.serial(),
        }
    }

    fn vertex_insert_helper(
        &mut self,
        graph: &mut SearchGraph,
        ctx: &mut QueueContext,
        v: VertexId,
        expand_if_before_token: bool,
    ) {
        let key = self.vertex_queue_key(graph, &ctx.heuristics, v);
        self.vertex_queue.insert(key, v);
        self.vertex_lookup.insert(v, key);

        if self.vertex_queue.len() == 1 {
            // the first vertex; the token starts on it
            self.token = Some(key);
        } else if expand_if_before_token {
            // Three-ish cases relative to the token: immediately before
            // it (shift the token back onto the new vertex), strictly
            // before it with expanded vertices in between (expand now to
            // keep the token invariant), or at/after it (nothing to do).
            match self.token {
                None => {
                    let (&last_key, _) = self
                        .vertex_queue
                        .last_key_value()
                        .expect("vertex queue cannot be empty here");
                    if last_key == key {
                        self.token = Some(key);
                    } else {
                        self.expand_vertex(graph, ctx, v);
                    }
                }
                Some(token_key) => {
                    let pre_token = self
                        .vertex_queue
                        .range(..token_key)
                        .next_back()
                        .map(|(&k, _)| k);
                    if pre_token == Some(key) {
                        self.token = Some(key);
                    } else if key < token_key {
                        self.expand_vertex(graph, ctx, v);
                    }
                }
            }
        }
    }

    /// Remove a vertex from the queue and lookups; when given the
    /// nearest-neighbor indices it also migrates the vertex to the free
    /// set or prunes it outright. Returns 1 if the underlying sample was
    /// pruned.
    fn vertex_remove_helper(
        &mut self,
        graph: &mut SearchGraph,
        h: &Heuristics,
        nn: Option<(&mut dyn NearestNeighbors, &mut dyn NearestNeighbors)>,
        v: VertexId,
        remove_lookups: bool,
    ) -> usize {
        assert!(
            graph.parent(v).is_none() || !remove_lookups,
            "Cannot fully remove vertex {} while it is still connected to a parent",
            v
        );
        assert!(!self.vertex_queue.is_empty(), "Removing a vertex from an empty queue");

        let key = *self
            .vertex_lookup
            .get(&v)
            .unwrap_or_else(|| panic!("Removed vertex {} is not found in the lookup", v));

        if self.token == Some(key) {
            self.token = self
                .vertex_queue
                .range((Excluded(key), Unbounded))
                .next()
                .map(|(&k, _)| k);
        }
        self.vertex_queue
            .remove(&key)
            .unwrap_or_else(|| panic!("Removed vertex {} is not in the queue", v));

        if remove_lookups {
            self.vertex_lookup.remove(&v);
            self.remove_edges_from(v);
        }

        let mut sample_pruned = 0;
        if let Some((vertex_nn, free_nn)) = nn {
            if self.sample_prune_condition(graph, h, v) {
                // not even useful as a sample
                sample_pruned = 1;
                if remove_lookups {
                    self.remove_edges_to(v);
                }
                vertex_nn.remove(v);
                graph.mark_pruned(v);
            } else {
                // still useful: back to the free set
                vertex_nn.remove(v);
                free_nn.add(v, graph.state(v));
            }
        }
        sample_pruned
    }

    fn edge_insert_helper(&mut self, graph: &SearchGraph, h: &Heuristics, edge: (VertexId, VertexId)) {
        let (u, v) = edge;
        let key = EdgeQueueKey {
            value: OrderedFloat(h.current_edge(graph, u, v).value()),
            tiebreak: OrderedFloat(graph.cost(u).value()),
            serial: self.serial(),
        };
        self.edge_queue.insert(key, edge);
        self.outgoing_edges.entry(u).or_default().push(key);
        self.incoming_edges.entry(v).or_default().push(key);
    }

    fn edge_remove_helper(&mut self, key: EdgeQueueKey, rm_incoming: bool, rm_outgoing: bool) {
        let (u, v) = *self
            .edge_queue
            .get(&key)
            .expect("removed edge is not in the queue");
        if rm_incoming {
            Self::rm_edge_lookup(&mut self.incoming_edges, v, key);
        }
        if rm_outgoing {
            Self::rm_edge_lookup(&mut self.outgoing_edges, u, key);
        }
        self.edge_queue.remove(&key);
    }

    fn rm_edge_lookup(
        lookup: &mut HashMap<VertexId, Vec<EdgeQueueKey>>,
        id: VertexId,
        key: EdgeQueueKey,
    ) {
        let keys = lookup
            .get_mut(&id)
            .unwrap_or_else(|| panic!("Vertex {} not found in the edge lookup", id));
        let position = keys
            .iter()
            .position(|&k| k == key)
            .unwrap_or_else(|| panic!("Edge entry not found under vertex {} in the lookup", id));
        keys.remove(position);
    }
}
