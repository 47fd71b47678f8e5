//! Build plan for a set of root units.
//!
//! The plan is a static view of the import graph: it resolves every reachable
//! unit up front, rejects cycles, and groups units into waves that could be
//! compiled in parallel. It never runs a stage.

mod types;

use std::collections::{HashMap, HashSet};

use petgraph::Direction;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};

use crate::cache::StaleCheck;
use crate::unit::{CompilationUnit, Resolver, Scope, StdLib, UnitKey};

pub use types::*;

/// Import graph with an edge from each dependency to its dependent.
pub struct ImportGraph {
  graph: DiGraph<CompilationUnit, ()>,
  nodes: HashMap<UnitKey, NodeIndex>,
}

impl ImportGraph {
  /// Resolve the transitive imports of `roots`, skipping `stdlib`.
  ///
  /// # Errors
  ///
  /// `Resolve` if an import cannot be resolved, `Cycle` if the graph loops.
  pub fn from_roots(resolver: &dyn Resolver, stdlib: &StdLib, roots: &[CompilationUnit]) -> Result<Self, PlanError> {
    let mut graph = DiGraph::new();
    let mut nodes: HashMap<UnitKey, NodeIndex> = HashMap::new();
    let mut pending: Vec<NodeIndex> = Vec::new();

    for root in roots {
      if !nodes.contains_key(&root.key()) {
        let idx = graph.add_node(root.clone());
        nodes.insert(root.key(), idx);
        pending.push(idx);
      }
    }

    while let Some(idx) = pending.pop() {
      let imports: Vec<String> = graph[idx]
        .imports
        .iter()
        .filter(|import| !stdlib.contains(import))
        .cloned()
        .collect();

      for import in imports {
        let key = UnitKey::new(Scope::Normal, import.as_str());
        let dep_idx = match nodes.get(&key) {
          Some(&dep_idx) => dep_idx,
          None => {
            let unit = resolver
              .resolve(&import, Scope::Normal)
              .map_err(|source| PlanError::Resolve {
                import_path: import.clone(),
                source,
              })?;
            let dep_idx = graph.add_node(unit);
            nodes.insert(key, dep_idx);
            pending.push(dep_idx);
            dep_idx
          }
        };
        graph.update_edge(dep_idx, idx, ());
      }
    }

    let plan = Self { graph, nodes };
    plan.topological()?;
    Ok(plan)
  }

  /// Units with dependencies before dependents.
  pub fn topological(&self) -> Result<Vec<&CompilationUnit>, PlanError> {
    let sorted = toposort(&self.graph, None)
      .map_err(|cycle| PlanError::Cycle(self.graph[cycle.node_id()].import_path.clone()))?;
    Ok(sorted.into_iter().map(|idx| &self.graph[idx]).collect())
  }

  /// Units grouped into parallel waves, each wave sorted by key.
  pub fn waves(&self) -> Result<Vec<Vec<&CompilationUnit>>, PlanError> {
    let mut in_degree: HashMap<NodeIndex, usize> = self
      .graph
      .node_indices()
      .map(|idx| (idx, self.graph.neighbors_directed(idx, Direction::Incoming).count()))
      .collect();
    let mut remaining: HashSet<NodeIndex> = self.graph.node_indices().collect();
    let mut waves = Vec::new();

    while !remaining.is_empty() {
      let mut ready: Vec<NodeIndex> = remaining.iter().filter(|idx| in_degree[*idx] == 0).copied().collect();
      if ready.is_empty() {
        let stuck = remaining.iter().map(|&idx| self.graph[idx].import_path.clone()).min().unwrap_or_default();
        return Err(PlanError::Cycle(stuck));
      }

      for &idx in &ready {
        remaining.remove(&idx);
        for dependent in self.graph.neighbors_directed(idx, Direction::Outgoing) {
          if let Some(deg) = in_degree.get_mut(&dependent) {
            *deg = deg.saturating_sub(1);
          }
        }
      }

      ready.sort_by_key(|&idx| self.graph[idx].key());
      waves.push(ready.into_iter().map(|idx| &self.graph[idx]).collect());
    }

    Ok(waves)
  }

  /// Direct non-stdlib dependencies of the unit at `key`, sorted.
  pub fn dependencies(&self, key: &UnitKey) -> Vec<&CompilationUnit> {
    let Some(&idx) = self.nodes.get(key) else {
      return Vec::new();
    };
    let mut deps: Vec<_> = self
      .graph
      .neighbors_directed(idx, Direction::Incoming)
      .map(|dep| &self.graph[dep])
      .collect();
    deps.sort_by_key(|unit| unit.key());
    deps
  }

  pub fn unit(&self, key: &UnitKey) -> Option<&CompilationUnit> {
    self.nodes.get(key).map(|&idx| &self.graph[idx])
  }

  pub fn len(&self) -> usize {
    self.nodes.len()
  }

  pub fn is_empty(&self) -> bool {
    self.nodes.is_empty()
  }

  /// The waves annotated with each unit's stale state.
  pub fn plan(&self, stale: &dyn StaleCheck) -> Result<Plan, PlanError> {
    let waves = self
      .waves()?
      .into_iter()
      .map(|wave| {
        wave
          .into_iter()
          .map(|unit| PlanUnit {
            import_path: unit.import_path.clone(),
            scope: unit.scope,
            command: unit.command,
            stale: stale.is_stale(unit),
            error: unit.metadata.as_ref().err().map(ToString::to_string),
          })
          .collect()
      })
      .collect();
    Ok(Plan { waves })
  }
}
