//! Cycle Discovery
//!
//! When a graph turns out to be cyclic the operator needs to know where.
//! Cycles are found as strongly connected components (Tarjan's algorithm,
//! run on an explicit stack), then a few short closed paths are traced
//! through each component so the report names concrete edges.
//!
//! Reports are sorted so the same catalog always produces the same text.

use std::collections::{HashMap, VecDeque};
use std::fmt::{self, Write as _};
use std::fs;
use std::hash::Hash;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::warn;

use super::simple::{quote, Graph};
use super::vertex::VertexId;
use crate::config::TraversalConfig;
use crate::error::{GraphError, Result};

/// One strongly connected component that forms a cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CycleInfo {
    /// Ids of the vertices in the component, sorted by label.
    pub ids: Vec<VertexId>,

    /// Labels of the vertices in the component, sorted.
    pub vertices: Vec<String>,

    /// Closed paths through the component, as vertex labels.
    ///
    /// The last label of each path repeats an earlier one.
    pub paths: Vec<Vec<String>>,
}

/// Structured description of every cycle in a graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    pub cycles: Vec<CycleInfo>,

    /// Where the cycle graph was written, if a graph directory is configured.
    pub dot_file: Option<PathBuf>,
}

impl CycleReport {
    /// Number of distinct cycles found.
    pub fn len(&self) -> usize {
        self.cycles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cycles.is_empty()
    }
}

impl fmt::Display for CycleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let count = self.cycles.len();
        let noun = if count == 1 { "cycle" } else { "cycles" };
        write!(f, "Found {count} dependency {noun}:")?;
        for cycle in &self.cycles {
            for path in &cycle.paths {
                write!(f, "\n({})", path.join(" => "))?;
            }
        }
        if let Some(file) = &self.dot_file {
            write!(f, "\nCycle graph written to {}.", file.display())?;
        }
        Ok(())
    }
}

/// Per-vertex bookkeeping for Tarjan's algorithm.
#[derive(Default)]
struct Tarjan {
    next_index: usize,
    index: HashMap<VertexId, usize>,
    lowlink: HashMap<VertexId, usize>,
    on_stack: HashMap<VertexId, bool>,
    stack: Vec<VertexId>,
    components: Vec<Vec<VertexId>>,
}

/// A suspended visit: the vertex, its children, and how far through them we are.
struct Frame {
    vertex: VertexId,
    children: Vec<VertexId>,
    next: usize,
    /// Child we descended into and must fold back into our lowlink.
    pending: Option<VertexId>,
}

impl<V, L> Graph<V, L>
where
    V: Clone + Eq + Hash + fmt::Display,
    L: fmt::Display,
{
    /// Every cycle in the graph, as sorted groups of vertex ids.
    ///
    /// A component counts as a cycle when it has more than one vertex, or a
    /// single vertex with an edge to itself.
    pub fn find_cycles(&self) -> Vec<Vec<VertexId>> {
        let mut state = Tarjan::default();

        // Catalogs are rarely connected, so every unvisited vertex is a root.
        for root in self.vertex_ids() {
            if !state.index.contains_key(&root) {
                self.strong_connect(root, &mut state);
            }
        }

        let mut cycles: Vec<Vec<VertexId>> = state
            .components
            .into_iter()
            .filter(|component| component.len() > 1 || self.has_edge(component[0], component[0]))
            .map(|mut component| {
                component.sort_by_cached_key(|id| (self.label(*id), *id));
                component
            })
            .collect();
        cycles.sort_by_cached_key(|component| component.iter().map(|id| self.label(*id)).collect::<Vec<_>>());
        cycles
    }

    fn strong_connect(&self, root: VertexId, state: &mut Tarjan) {
        let mut frames = vec![self.enter(root, state)];

        while let Some(frame) = frames.last_mut() {
            let vertex = frame.vertex;

            if let Some(child) = frame.pending.take() {
                let low = state.lowlink[&vertex].min(state.lowlink[&child]);
                state.lowlink.insert(vertex, low);
            }

            if let Some(&child) = frame.children.get(frame.next) {
                frame.next += 1;
                if !state.index.contains_key(&child) {
                    frame.pending = Some(child);
                    let next = self.enter(child, state);
                    frames.push(next);
                } else if state.on_stack.get(&child).copied().unwrap_or(false) {
                    let low = state.lowlink[&vertex].min(state.index[&child]);
                    state.lowlink.insert(vertex, low);
                }
                continue;
            }

            if state.lowlink[&vertex] == state.index[&vertex] {
                let mut component = Vec::new();
                while let Some(top) = state.stack.pop() {
                    state.on_stack.insert(top, false);
                    component.push(top);
                    if top == vertex {
                        break;
                    }
                }
                state.components.push(component);
            }
            frames.pop();
        }
    }

    fn enter(&self, vertex: VertexId, state: &mut Tarjan) -> Frame {
        state.index.insert(vertex, state.next_index);
        state.lowlink.insert(vertex, state.next_index);
        state.next_index += 1;
        state.stack.push(vertex);
        state.on_stack.insert(vertex, true);

        Frame {
            vertex,
            children: self.direct_dependents_of(vertex),
            next: 0,
            pending: None,
        }
    }

    /// Up to `max_paths` closed paths through one cycle, shortest first.
    ///
    /// Only edges between members of `cycle` are followed. Each path ends by
    /// repeating the vertex that closes it.
    pub fn paths_in_cycle(&self, cycle: &[VertexId], max_paths: usize) -> Result<Vec<Vec<VertexId>>> {
        if max_paths == 0 {
            return Err(GraphError::InvalidArgument("max_paths must be positive".to_string()));
        }
        let Some(&start) = cycle.first() else {
            return Ok(Vec::new());
        };

        let adjacency: HashMap<VertexId, Vec<VertexId>> = cycle
            .iter()
            .map(|v| {
                let inside = self.direct_dependents_of(*v).into_iter().filter(|n| cycle.contains(n)).collect();
                (*v, inside)
            })
            .collect();

        let mut found = Vec::new();
        let mut queue = VecDeque::from([(start, Vec::new())]);
        while let Some((vertex, mut path)) = queue.pop_front() {
            if path.contains(&vertex) {
                path.push(vertex);
                found.push(path);
                if found.len() >= max_paths {
                    break;
                }
                continue;
            }
            path.push(vertex);
            for next in adjacency.get(&vertex).into_iter().flatten() {
                queue.push_back((*next, path.clone()));
            }
        }

        found.sort_by_cached_key(|path| path.iter().map(|id| self.label(*id)).collect::<Vec<_>>());
        Ok(found)
    }

    /// Describe every cycle, or `None` when the graph is acyclic.
    ///
    /// With a graph directory configured, the cycles are also written to
    /// `cycles.dot` there. Failing to write that file is logged, not fatal.
    pub fn report_cycles(&self, config: &TraversalConfig) -> Option<CycleReport> {
        let cycles = self.find_cycles();
        if cycles.is_empty() {
            return None;
        }

        let report_paths = config.report_paths.max(1);
        let mut report = CycleReport::default();
        for cycle in &cycles {
            let paths = self.paths_in_cycle(cycle, report_paths).unwrap_or_default();
            report.cycles.push(CycleInfo {
                ids: cycle.clone(),
                vertices: cycle.iter().map(|id| self.label(*id)).collect(),
                paths: paths.iter().map(|path| self.labels(path)).collect(),
            });
        }

        if let Some(dir) = &config.graph_dir {
            match self.write_cycles(&cycles, dir, config.dot_paths.max(1)) {
                Ok(file) => report.dot_file = Some(file),
                Err(err) => warn!(dir = %dir.display(), error = %err, "could not write cycle graph"),
            }
        }
        Some(report)
    }

    fn labels(&self, path: &[VertexId]) -> Vec<String> {
        path.iter().map(|id| self.label(*id)).collect()
    }

    fn write_cycles(&self, cycles: &[Vec<VertexId>], dir: &Path, dot_paths: usize) -> std::io::Result<PathBuf> {
        let mut dot = String::from("digraph Resource_Cycles {\n  label = \"Resource Cycles\"\n");
        for cycle in cycles {
            for path in self.paths_in_cycle(cycle, dot_paths).unwrap_or_default() {
                let hops: Vec<String> = path.iter().map(|id| quote(&self.label(*id))).collect();
                let _ = writeln!(dot, "  {}", hops.join(" -> "));
            }
        }
        dot.push_str("}\n");

        fs::create_dir_all(dir)?;
        let file = dir.join("cycles.dot");
        fs::write(&file, dot)?;
        Ok(file)
    }
}
