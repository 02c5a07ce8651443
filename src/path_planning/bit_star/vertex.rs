//! Search-tree vertices stored in an id-indexed arena
//!
//! Every state the planner owns — connected tree vertices and free
//! samples alike — is a record in the `SearchGraph`. Tree structure is
//! encoded by parent/children ids; a free sample is simply a record with
//! no parent and no children. Costs-to-come are cached on each record
//! and kept consistent by cascading updates.
//!
//! Invariant violations (touching a pruned record, double parents,
//! removing a non-child) panic: they mean the queue and the graph have
//! desynchronized, which is never recoverable.

use std::collections::HashSet;

use crate::common::{Cost, OptimizationObjective, Point2D};

/// Arena index of a vertex
pub type VertexId = usize;

#[derive(Debug, Clone)]
struct Vertex {
    state: Point2D,
    cost: Cost,
    /// Cost of the edge from the current parent; meaningless while
    /// disconnected
    edge_cost: Cost,
    parent: Option<VertexId>,
    children: Vec<VertexId>,
    depth: usize,
    is_root: bool,
    is_new: bool,
    pruned: bool,
    failed_children: HashSet<VertexId>,
}

/// Arena of all vertices and free samples owned by the planner
#[derive(Debug, Default)]
pub struct SearchGraph {
    vertices: Vec<Vertex>,
}

impl SearchGraph {
    pub fn new() -> Self {
        SearchGraph { vertices: Vec::new() }
    }

    /// Number of records ever created, pruned ones included
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Create the root of the tree
    pub fn new_root(&mut self, state: Point2D, identity_cost: Cost) -> VertexId {
        self.push(state, identity_cost, true)
    }

    /// Create a free sample
    pub fn new_sample(&mut self, state: Point2D, infinite_cost: Cost) -> VertexId {
        self.push(state, infinite_cost, false)
    }

    fn push(&mut self, state: Point2D, cost: Cost, is_root: bool) -> VertexId {
        let id = self.vertices.len();
        self.vertices.push(Vertex {
            state,
            cost,
            edge_cost: Cost(f64::NAN),
            parent: None,
            children: Vec::new(),
            depth: 0,
            is_root,
            is_new: true,
            pruned: false,
            failed_children: HashSet::new(),
        });
        id
    }

    fn v(&self, id: VertexId) -> &Vertex {
        let vertex = &self.vertices[id];
        assert!(!vertex.pruned, "Attempted to access pruned vertex {}", id);
        vertex
    }

    fn v_mut(&mut self, id: VertexId) -> &mut Vertex {
        let vertex = &mut self.vertices[id];
        assert!(!vertex.pruned, "Attempted to access pruned vertex {}", id);
        vertex
    }

    pub fn state(&self, id: VertexId) -> Point2D {
        self.v(id).state
    }

    pub fn cost(&self, id: VertexId) -> Cost {
        self.v(id).cost
    }

    pub fn depth(&self, id: VertexId) -> usize {
        self.v(id).depth
    }

    pub fn parent(&self, id: VertexId) -> Option<VertexId> {
        self.v(id).parent
    }

    pub fn children(&self, id: VertexId) -> Vec<VertexId> {
        self.v(id).children.clone()
    }

    pub fn has_children(&self, id: VertexId) -> bool {
        !self.v(id).children.is_empty()
    }

    pub fn is_root(&self, id: VertexId) -> bool {
        self.v(id).is_root
    }

    /// Whether the vertex is part of the tree (root or parented)
    pub fn is_connected(&self, id: VertexId) -> bool {
        let vertex = self.v(id);
        vertex.is_root || vertex.parent.is_some()
    }

    /// May be asked of any record, pruned ones included
    pub fn is_pruned(&self, id: VertexId) -> bool {
        self.vertices[id].pruned
    }

    pub fn is_new(&self, id: VertexId) -> bool {
        self.v(id).is_new
    }

    /// Flip the one-shot new flag after the first expansion
    pub fn mark_old(&mut self, id: VertexId) {
        self.v_mut(id).is_new = false;
    }

    /// Terminal: the record may never be touched again
    pub fn mark_pruned(&mut self, id: VertexId) {
        self.v_mut(id).pruned = true;
    }

    pub fn has_already_failed(&self, parent: VertexId, child: VertexId) -> bool {
        self.v(parent).failed_children.contains(&child)
    }

    pub fn mark_failed(&mut self, parent: VertexId, child: VertexId) {
        self.v_mut(parent).failed_children.insert(child);
    }

    pub fn add_child(&mut self, parent: VertexId, child: VertexId) {
        self.v_mut(parent).children.push(child);
    }

    /// Remove `child` from `parent`'s children; panics if absent
    pub fn remove_child(
        &mut self,
        parent: VertexId,
        child: VertexId,
        cascade: bool,
        opt: &dyn OptimizationObjective,
    ) {
        let children = &mut self.v_mut(parent).children;
        let position = children
            .iter()
            .position(|&c| c == child)
            .unwrap_or_else(|| panic!("Vertex {} is not a child of vertex {}", child, parent));
        children.remove(position);
        if cascade {
            self.update_cost(child, opt, true);
        }
    }

    /// Connect `child` under `parent` with the given edge cost
    ///
    /// The child must currently be parentless and must not be the root.
    pub fn set_parent(
        &mut self,
        child: VertexId,
        parent: VertexId,
        edge_cost: Cost,
        opt: &dyn OptimizationObjective,
        cascade: bool,
    ) {
        assert!(!self.v(child).is_root, "Attempted to give the root vertex a parent");
        assert!(
            self.v(child).parent.is_none(),
            "Vertex {} already has a parent",
            child
        );
        let parent_cost = self.v(parent).cost;
        let parent_depth = self.v(parent).depth;
        let vertex = self.v_mut(child);
        vertex.parent = Some(parent);
        vertex.edge_cost = edge_cost;
        vertex.cost = opt.combine(parent_cost, edge_cost);
        vertex.depth = parent_depth + 1;
        if cascade {
            for grandchild in self.children(child) {
                self.update_cost(grandchild, opt, true);
            }
        }
    }

    /// Clear the parent link; panics if there is none
    ///
    /// With `cascade`, the vertex cost becomes infinite and the whole
    /// subtree is recomputed (it is about to be disconnected or rewired).
    pub fn remove_parent(&mut self, child: VertexId, opt: &dyn OptimizationObjective, cascade: bool) {
        assert!(
            self.v(child).parent.is_some(),
            "Vertex {} has no parent to remove",
            child
        );
        self.v_mut(child).parent = None;
        if cascade {
            self.v_mut(child).cost = opt.infinite_cost();
            for grandchild in self.children(child) {
                self.update_cost(grandchild, opt, true);
            }
        }
    }

    /// Recompute the cached cost (and depth) from the parent chain
    pub fn update_cost(&mut self, id: VertexId, opt: &dyn OptimizationObjective, cascade: bool) {
        let vertex = self.v(id);
        if vertex.is_root {
            let vertex = self.v_mut(id);
            vertex.cost = opt.identity_cost();
            vertex.depth = 0;
        } else if let Some(parent) = vertex.parent {
            let parent_cost = self.v(parent).cost;
            let parent_depth = self.v(parent).depth;
            let edge_cost = self.v(id).edge_cost;
            let vertex = self.v_mut(id);
            vertex.cost = opt.combine(parent_cost, edge_cost);
            vertex.depth = parent_depth + 1;
        } else {
            self.v_mut(id).cost = opt.infinite_cost();
        }
        if cascade {
            for child in self.children(id) {
                self.update_cost(child, opt, true);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::PathLengthObjective;

    fn chain() -> (SearchGraph, VertexId, VertexId, VertexId) {
        let opt = PathLengthObjective;
        let mut graph = SearchGraph::new();
        let root = graph.new_root(Point2D::new(0.0, 0.0), opt.identity_cost());
        let a = graph.new_sample(Point2D::new(1.0, 0.0), opt.infinite_cost());
        let b = graph.new_sample(Point2D::new(2.0, 0.0), opt.infinite_cost());
        graph.add_child(root, a);
        graph.set_parent(a, root, Cost(1.0), &opt, false);
        graph.add_child(a, b);
        graph.set_parent(b, a, Cost(1.0), &opt, false);
        (graph, root, a, b)
    }

    #[test]
    fn test_tree_integrity() {
        let (graph, root, a, b) = chain();
        assert_eq!(graph.parent(a), Some(root));
        assert!(graph.children(root).contains(&a));
        assert_eq!(graph.depth(b), 2);
        assert!((graph.cost(b).value() - 2.0).abs() < 1e-12);
        assert!(graph.is_connected(b));
    }

    #[test]
    fn test_cascading_cost_update() {
        let opt = PathLengthObjective;
        let (mut graph, root, a, b) = chain();
        // rewire a onto the root with a cheaper edge
        graph.remove_child(root, a, false, &opt);
        graph.remove_parent(a, &opt, false);
        graph.add_child(root, a);
        graph.set_parent(a, root, Cost(0.5), &opt, true);
        assert!((graph.cost(a).value() - 0.5).abs() < 1e-12);
        assert!((graph.cost(b).value() - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_remove_parent_cascade_makes_subtree_infinite() {
        let opt = PathLengthObjective;
        let (mut graph, root, a, b) = chain();
        graph.remove_child(root, a, false, &opt);
        graph.remove_parent(a, &opt, true);
        assert!(!graph.cost(a).is_finite());
        assert!(!graph.cost(b).is_finite());
        assert!(!graph.is_connected(a));
    }

    #[test]
    #[should_panic(expected = "already has a parent")]
    fn test_double_parent_panics() {
        let opt = PathLengthObjective;
        let (mut graph, root, _, b) = chain();
        graph.set_parent(b, root, Cost(1.0), &opt, false);
    }

    #[test]
    #[should_panic(expected = "is not a child")]
    fn test_remove_non_child_panics() {
        let opt = PathLengthObjective;
        let (mut graph, root, _, b) = chain();
        graph.remove_child(root, b, false, &opt);
    }

    #[test]
    #[should_panic(expected = "pruned")]
    fn test_pruned_access_panics() {
        let (mut graph, _, a, _) = chain();
        let opt = PathLengthObjective;
        graph.remove_child(graph.parent(a).unwrap(), a, false, &opt);
        graph.remove_parent(a, &opt, false);
        graph.mark_pruned(a);
        let _ = graph.cost(a);
    }

    #[test]
    fn test_failed_children_memory() {
        let (mut graph, root, a, _) = chain();
        assert!(!graph.has_already_failed(root, a));
        graph.mark_failed(root, a);
        assert!(graph.has_already_failed(root, a));
    }

    #[test]
    fn test_new_flag_is_one_shot() {
        let (mut graph, root, _, _) = chain();
        assert!(graph.is_new(root));
        graph.mark_old(root);
        assert!(!graph.is_new(root));
    }
}
