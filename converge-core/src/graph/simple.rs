//! Directed Graph Storage
//!
//! [`Graph`] stores vertices in an arena indexed by [`VertexId`] and labelled
//! edges in a second arena indexed by [`EdgeId`]. For every vertex it keeps
//! both adjacency directions, keyed by neighbour, so a vertex's dependencies
//! and dependents are equally cheap to find.
//!
//! Several labelled edges may connect the same ordered pair; adjacency
//! queries still report that neighbour once.
//!
//! Every walk is iterative, so deep chains of thousands of resources never
//! touch the call stack.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt::{self, Write as _};
use std::hash::Hash;

use indexmap::IndexMap;
use smallvec::SmallVec;

use super::relationship::{EventSpec, Relationship};
use super::vertex::{Direction, EdgeId, VertexId};
use crate::error::{GraphError, Result};

/// Edges from one vertex to each neighbour, in first-insertion order.
type Adjacency = IndexMap<VertexId, SmallVec<[EdgeId; 1]>>;

/// A labelled directed edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge<L> {
    source: VertexId,
    target: VertexId,
    label: L,
}

impl<L> Edge<L> {
    /// The vertex that must finish first.
    pub fn source(&self) -> VertexId {
        self.source
    }

    /// The vertex that waits for the source.
    pub fn target(&self) -> VertexId {
        self.target
    }

    /// The edge's label.
    pub fn label(&self) -> &L {
        &self.label
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    White,
    Gray,
    Black,
}

/// A directed graph whose edges point from dependency to dependent.
///
/// The graph does not reject cycles; use [`Graph::is_cyclic`] or
/// [`Graph::find_cycles`] to decide what to do about them.
#[derive(Debug, Clone)]
pub struct Graph<V, L = Relationship> {
    /// Vertex arena. Removed vertices leave `None` behind.
    slots: Vec<Option<V>>,

    /// Vertex value to its id.
    index: HashMap<V, VertexId>,

    /// Per vertex: neighbours with an edge leading into it.
    in_to: Vec<Adjacency>,

    /// Per vertex: neighbours reached by an edge leading out of it.
    out_from: Vec<Adjacency>,

    /// Edge arena. Removed edges leave `None` behind.
    edges: Vec<Option<Edge<L>>>,

    vertex_count: usize,
    edge_count: usize,

    /// Memoized transitive closures, dropped on every mutation.
    closures: RefCell<HashMap<(Direction, VertexId), Vec<VertexId>>>,
}

impl<V, L> Default for Graph<V, L> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            index: HashMap::new(),
            in_to: Vec::new(),
            out_from: Vec::new(),
            edges: Vec::new(),
            vertex_count: 0,
            edge_count: 0,
            closures: RefCell::new(HashMap::new()),
        }
    }
}

impl<V, L> Graph<V, L>
where
    V: Clone + Eq + Hash,
{
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live vertices.
    pub fn len(&self) -> usize {
        self.vertex_count
    }

    pub fn is_empty(&self) -> bool {
        self.vertex_count == 0
    }

    /// Number of live edges.
    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// Add a vertex, or return the id it already has.
    pub fn add_vertex(&mut self, vertex: V) -> VertexId {
        if let Some(&id) = self.index.get(&vertex) {
            return id;
        }
        self.invalidate();

        let id = VertexId::new(self.slots.len());
        self.slots.push(Some(vertex.clone()));
        self.in_to.push(Adjacency::new());
        self.out_from.push(Adjacency::new());
        self.index.insert(vertex, id);
        self.vertex_count += 1;
        id
    }

    /// Find the id of a vertex value.
    pub fn lookup(&self, vertex: &V) -> Option<VertexId> {
        self.index.get(vertex).copied()
    }

    /// Whether `vertex` is in the graph.
    pub fn contains(&self, vertex: &V) -> bool {
        self.index.contains_key(vertex)
    }

    /// Whether `id` refers to a live vertex.
    pub fn has_vertex(&self, id: VertexId) -> bool {
        matches!(self.slots.get(id.index()), Some(Some(_)))
    }

    /// The vertex stored under `id`, if it is live.
    pub fn vertex(&self, id: VertexId) -> Option<&V> {
        self.slots.get(id.index()).and_then(Option::as_ref)
    }

    /// Ids of all live vertices, in insertion order.
    pub fn vertex_ids(&self) -> impl Iterator<Item = VertexId> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_some())
            .map(|(index, _)| VertexId::new(index))
    }

    /// All live vertices with their ids, in insertion order.
    pub fn vertices(&self) -> impl Iterator<Item = (VertexId, &V)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_ref().map(|v| (VertexId::new(index), v)))
    }

    /// Remove a vertex and every edge touching it.
    ///
    /// Returns the removed value, or `None` if the vertex was not present.
    pub fn remove_vertex(&mut self, id: VertexId) -> Option<V> {
        if !self.has_vertex(id) {
            return None;
        }
        self.invalidate();

        let incident: Vec<EdgeId> = self.in_to[id.index()]
            .values()
            .chain(self.out_from[id.index()].values())
            .flatten()
            .copied()
            .collect();
        for edge in incident {
            self.remove_edge(edge);
        }

        let vertex = self.slots[id.index()].take()?;
        self.index.remove(&vertex);
        self.in_to[id.index()].clear();
        self.out_from[id.index()].clear();
        self.vertex_count -= 1;
        Some(vertex)
    }

    /// Add an edge between two vertex values, adding either endpoint if missing.
    pub fn add_edge(&mut self, source: V, target: V, label: L) -> EdgeId {
        let source = self.add_vertex(source);
        let target = self.add_vertex(target);
        self.link(source, target, label)
    }

    /// Add an edge between two existing vertices.
    pub fn add_edge_between(&mut self, source: VertexId, target: VertexId, label: L) -> Result<EdgeId> {
        for id in [source, target] {
            if !self.has_vertex(id) {
                return Err(GraphError::UnknownVertex(id));
            }
        }
        Ok(self.link(source, target, label))
    }

    /// Add an edge between two ids the caller knows to be live.
    pub(crate) fn link(&mut self, source: VertexId, target: VertexId, label: L) -> EdgeId {
        self.invalidate();

        let id = EdgeId::new(self.edges.len());
        self.edges.push(Some(Edge { source, target, label }));
        self.out_from[source.index()].entry(target).or_default().push(id);
        self.in_to[target.index()].entry(source).or_default().push(id);
        self.edge_count += 1;
        id
    }

    /// Remove one edge. Returns it, or `None` if it was already gone.
    pub fn remove_edge(&mut self, id: EdgeId) -> Option<Edge<L>> {
        let edge = self.edges.get_mut(id.index())?.take()?;
        self.invalidate();

        Self::unlink(&mut self.out_from[edge.source.index()], edge.target, id);
        Self::unlink(&mut self.in_to[edge.target.index()], edge.source, id);
        self.edge_count -= 1;
        Some(edge)
    }

    fn unlink(adjacency: &mut Adjacency, neighbour: VertexId, edge: EdgeId) {
        if let Some(edges) = adjacency.get_mut(&neighbour) {
            edges.retain(|e| *e != edge);
            if edges.is_empty() {
                adjacency.shift_remove(&neighbour);
            }
        }
    }

    /// The edge stored under `id`, if it is live.
    pub fn edge(&self, id: EdgeId) -> Option<&Edge<L>> {
        self.edges.get(id.index()).and_then(Option::as_ref)
    }

    /// All live edges, in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = (EdgeId, &Edge<L>)> + '_ {
        self.edges
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_ref().map(|e| (EdgeId::new(index), e)))
    }

    /// Every edge leading from `source` to `target`.
    pub fn edges_between(&self, source: VertexId, target: VertexId) -> &[EdgeId] {
        self.out_from
            .get(source.index())
            .and_then(|adjacency| adjacency.get(&target))
            .map(|edges| edges.as_slice())
            .unwrap_or(&[])
    }

    /// Whether at least one edge leads from `source` to `target`.
    pub fn has_edge(&self, source: VertexId, target: VertexId) -> bool {
        !self.edges_between(source, target).is_empty()
    }

    fn adjacency(&self, id: VertexId, direction: Direction) -> Option<&Adjacency> {
        match direction {
            Direction::In => self.in_to.get(id.index()),
            Direction::Out => self.out_from.get(id.index()),
        }
    }

    /// Neighbours one hop away in `direction`, each reported once.
    pub fn adjacent(&self, id: VertexId, direction: Direction) -> Vec<VertexId> {
        self.adjacency(id, direction)
            .map(|adjacency| adjacency.keys().copied().collect())
            .unwrap_or_default()
    }

    /// Edges one hop away in `direction`.
    pub fn adjacent_edges(&self, id: VertexId, direction: Direction) -> Vec<EdgeId> {
        self.adjacency(id, direction)
            .map(|adjacency| adjacency.values().flatten().copied().collect())
            .unwrap_or_default()
    }

    /// Vertices that must finish before `id` starts.
    pub fn direct_dependencies_of(&self, id: VertexId) -> Vec<VertexId> {
        self.adjacent(id, Direction::In)
    }

    /// Vertices waiting on `id`.
    pub fn direct_dependents_of(&self, id: VertexId) -> Vec<VertexId> {
        self.adjacent(id, Direction::Out)
    }

    /// Number of distinct direct dependencies of `id`.
    pub fn dependency_count(&self, id: VertexId) -> usize {
        self.adjacency(id, Direction::In).map_or(0, IndexMap::len)
    }

    /// Every vertex that transitively depends on `id`.
    pub fn dependents(&self, id: VertexId) -> Vec<VertexId> {
        self.closure(id, Direction::Out)
    }

    /// Every vertex `id` transitively depends on.
    pub fn dependencies(&self, id: VertexId) -> Vec<VertexId> {
        self.closure(id, Direction::In)
    }

    fn closure(&self, id: VertexId, direction: Direction) -> Vec<VertexId> {
        if !self.has_vertex(id) {
            return Vec::new();
        }
        if let Some(cached) = self.closures.borrow().get(&(direction, id)) {
            return cached.clone();
        }

        let mut reached = Vec::new();
        self.walk(id, direction, |_, next| reached.push(next));
        let mut seen = HashSet::new();
        reached.retain(|v| seen.insert(*v));

        self.closures.borrow_mut().insert((direction, id), reached.clone());
        reached
    }

    /// Breadth-first walk from `start`, calling `visit(parent, child)` for
    /// every edge followed. Each vertex is expanded at most once.
    pub fn walk<F>(&self, start: VertexId, direction: Direction, mut visit: F)
    where
        F: FnMut(VertexId, VertexId),
    {
        let mut queue = VecDeque::from([start]);
        let mut seen = HashSet::new();

        while let Some(vertex) = queue.pop_front() {
            if !seen.insert(vertex) {
                continue;
            }
            for next in self.adjacent(vertex, direction) {
                visit(vertex, next);
                queue.push_back(next);
            }
        }
    }

    /// Map each vertex reachable from `start` to the vertex it was reached from.
    pub fn tree_from_vertex(&self, start: VertexId, direction: Direction) -> IndexMap<VertexId, VertexId> {
        let mut predecessor = IndexMap::new();
        self.walk(start, direction, |parent, child| {
            predecessor.insert(child, parent);
        });
        predecessor
    }

    /// Reachable vertices with nothing further to reach in `direction`.
    pub fn leaves(&self, start: VertexId, direction: Direction) -> Vec<VertexId> {
        self.tree_from_vertex(start, direction)
            .keys()
            .copied()
            .filter(|v| self.adjacency(*v, direction).map_or(true, IndexMap::is_empty))
            .collect()
    }

    /// The edge sets along a shortest path from `from` to `to`.
    ///
    /// Each element holds every edge between two consecutive vertices of the
    /// path. Empty when `from == to`; `None` when `to` is unreachable.
    pub fn path_between(&self, from: VertexId, to: VertexId) -> Option<Vec<Vec<EdgeId>>> {
        if from == to {
            return Some(Vec::new());
        }

        let mut predecessor: HashMap<VertexId, VertexId> = HashMap::new();
        let mut queue = VecDeque::from([from]);
        while let Some(vertex) = queue.pop_front() {
            if vertex == to {
                break;
            }
            for next in self.direct_dependents_of(vertex) {
                if next != from && !predecessor.contains_key(&next) {
                    predecessor.insert(next, vertex);
                    queue.push_back(next);
                }
            }
        }

        let mut hops = Vec::new();
        let mut current = to;
        while current != from {
            let previous = *predecessor.get(&current)?;
            hops.push(self.edges_between(previous, current).to_vec());
            current = previous;
        }
        hops.reverse();
        Some(hops)
    }

    /// Whether the graph contains a directed cycle.
    ///
    /// Depth-first search with gray/black marking on an explicit stack.
    pub fn is_cyclic(&self) -> bool {
        let mut color = vec![Color::White; self.slots.len()];

        for root in self.vertex_ids() {
            if color[root.index()] != Color::White {
                continue;
            }
            color[root.index()] = Color::Gray;
            let mut stack: Vec<(VertexId, usize)> = vec![(root, 0)];

            while let Some(frame) = stack.last_mut() {
                let (vertex, next) = *frame;
                match self.out_from[vertex.index()].get_index(next) {
                    Some((&child, _)) => {
                        frame.1 += 1;
                        match color[child.index()] {
                            Color::Gray => return true,
                            Color::White => {
                                color[child.index()] = Color::Gray;
                                stack.push((child, 0));
                            }
                            Color::Black => {}
                        }
                    }
                    None => {
                        color[vertex.index()] = Color::Black;
                        stack.pop();
                    }
                }
            }
        }
        false
    }

    /// Remove every vertex and edge. Ids are not reused afterwards.
    pub fn clear(&mut self) {
        self.invalidate();
        for slot in &mut self.slots {
            *slot = None;
        }
        for adjacency in self.in_to.iter_mut().chain(self.out_from.iter_mut()) {
            adjacency.clear();
        }
        for edge in &mut self.edges {
            *edge = None;
        }
        self.index.clear();
        self.vertex_count = 0;
        self.edge_count = 0;
    }

    fn invalidate(&mut self) {
        self.closures.get_mut().clear();
    }
}

impl<V, L> Graph<V, L>
where
    V: Clone + Eq + Hash,
    L: Clone,
{
    /// A copy of this graph with every edge flipped. Labels are kept.
    pub fn reversal(&self) -> Self {
        let mut reversed = Self::new();
        for vertex in self.slots.iter().flatten() {
            reversed.add_vertex(vertex.clone());
        }
        for (_, edge) in self.edges() {
            if let (Some(source), Some(target)) = (self.vertex(edge.source), self.vertex(edge.target)) {
                reversed.add_edge(target.clone(), source.clone(), edge.label.clone());
            }
        }
        reversed
    }
}

impl<V> Graph<V, Relationship>
where
    V: Clone + Eq + Hash,
{
    /// Out-edges of `source` along which `event` propagates.
    pub fn matching_edges(&self, source: VertexId, event: &EventSpec) -> Vec<EdgeId> {
        self.adjacent_edges(source, Direction::Out)
            .into_iter()
            .filter(|id| self.edge(*id).is_some_and(|edge| edge.label.matches(event)))
            .collect()
    }
}

impl<V, L> Graph<V, L>
where
    V: Clone + Eq + Hash + fmt::Display,
    L: fmt::Display,
{
    /// Display label of a vertex, falling back to its id.
    pub fn label(&self, id: VertexId) -> String {
        match self.vertex(id) {
            Some(vertex) => vertex.to_string(),
            None => id.to_string(),
        }
    }

    /// Render the graph in Graphviz dot syntax.
    pub fn to_dot(&self, name: &str) -> String {
        let mut dot = String::new();
        let _ = writeln!(dot, "digraph {} {{", quote(name));
        let _ = writeln!(dot, "  label = {};", quote(name));
        for (_, vertex) in self.vertices() {
            let _ = writeln!(dot, "  {} [fontsize = 8];", quote(&vertex.to_string()));
        }
        for (_, edge) in self.edges() {
            let label = edge.label.to_string();
            let _ = write!(dot, "  {} -> {}", quote(&self.label(edge.source)), quote(&self.label(edge.target)));
            if label.is_empty() {
                let _ = writeln!(dot, ";");
            } else {
                let _ = writeln!(dot, " [label = {}];", quote(&label));
            }
        }
        dot.push('}');
        dot.push('\n');
        dot
    }
}

/// Quote a string for dot output.
pub(crate) fn quote(text: &str) -> String {
    format!("\"{}\"", text.replace('\\', "\\\\").replace('"', "\\\""))
}
