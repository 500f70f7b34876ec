//! Per-instance cell arena.
//!
//! [`Cells`] owns one [`NodeCell`] per declared node, keyed by node name in
//! declaration order. Listener edges are [`NodeId`] indices into the same
//! arena, so propagation never holds references between cells.
//!
//! # Propagation
//!
//! - `set_value` stores a value and then invalidates every listener,
//!   unconditionally. A recompute that yields the same value still dirties
//!   the whole downstream closure.
//! - `update` marks a cell dirty and keeps going downstream, unless the cell
//!   is overridden.
//! - `reset` drops the value and override. Listeners keep whatever they
//!   cached until something upstream notifies them, which at the latest is
//!   the recompute of the reset node itself. `reset_and_invalidate` also
//!   dirties the downstream closure right away.
//!
//! Recursion depth is bounded by the longest listener chain. Registration
//! rejects cyclic listener graphs, so propagation always terminates.
//!
//! # Confinement
//!
//! Cells have no internal synchronization. An instance must be confined to
//! one thread at a time; wrap it in [`Shared`](crate::node::Shared) when it
//! has to be reached from several.

use indexmap::IndexMap;
use smallvec::SmallVec;

use super::cell::{NodeCell, NodeId, NodeState};
use crate::error::{NodeError, Result};
use crate::schema::DependencyMap;

/// The wired cells of one graph instance.
#[derive(Debug, Default)]
pub struct Cells {
    cells: IndexMap<&'static str, NodeCell>,
    /// Nodes whose computation is running, outermost first.
    active: SmallVec<[NodeId; 8]>,
}

impl Cells {
    /// Build a fresh, fully wired set of cells.
    ///
    /// Every cell starts dirty-empty. Edges are added only after all cells
    /// exist, since a node may read nodes declared after it. Reads of names
    /// that are not nodes produce no edge.
    pub fn wire(nodes: &[&'static str], dependencies: &DependencyMap) -> Self {
        let mut cells: IndexMap<&'static str, NodeCell> = nodes
            .iter()
            .map(|name| (*name, NodeCell::new()))
            .collect();

        let mut edges = 0;
        for (upstream, listeners) in dependencies.iter() {
            let Some(upstream) = cells.get_index_of(upstream) else {
                continue;
            };
            for listener in listeners {
                if let Some(listener) = cells.get_index_of(*listener) {
                    cells[upstream].add_listener(NodeId::new(listener));
                    edges += 1;
                }
            }
        }

        tracing::debug!(nodes = cells.len(), edges, "wired node cells");
        Self {
            cells,
            active: SmallVec::new(),
        }
    }

    /// Resolve a node name to its id.
    pub fn lookup(&self, name: &str) -> Result<NodeId> {
        self.cells
            .get_index_of(name)
            .map(NodeId::new)
            .ok_or_else(|| NodeError::UnknownNode(name.to_string()))
    }

    /// Name of the node behind `id`.
    pub(crate) fn name(&self, id: NodeId) -> &'static str {
        self.entry(id).0
    }

    pub(crate) fn cell(&self, id: NodeId) -> &NodeCell {
        self.entry(id).1
    }

    /// The cell of a node, by name.
    pub fn get(&self, name: &str) -> Result<&NodeCell> {
        let id = self.lookup(name)?;
        Ok(self.cell(id))
    }

    pub fn state(&self, name: &str) -> Result<NodeState> {
        let id = self.lookup(name)?;
        Ok(self.cell(id).state())
    }

    /// Names and states of every node, in declaration order.
    pub fn snapshot(&self) -> IndexMap<&'static str, NodeState> {
        self.cells
            .iter()
            .map(|(name, cell)| (*name, cell.state()))
            .collect()
    }

    /// Number of cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Mark `id` dirty because something it reads changed, then pass it on.
    pub(crate) fn update(&mut self, id: NodeId) {
        if self.cell_mut(id).invalidate() {
            tracing::trace!(node = self.name(id), "invalidated");
            self.notify(id);
        }
    }

    /// Invalidate every listener of `id`, in listener order.
    pub(crate) fn notify(&mut self, id: NodeId) {
        let listeners: SmallVec<[NodeId; 4]> = SmallVec::from_slice(self.cell(id).listeners());
        for listener in listeners {
            self.update(listener);
        }
    }

    /// Store a computed (`manual == false`) or assigned value, then notify.
    pub(crate) fn set_value(&mut self, id: NodeId, value: Box<dyn std::any::Any + Send>, manual: bool) {
        self.cell_mut(id).store(value, manual);
        self.notify(id);
    }

    /// Drop the value and override of `id`. Listeners are left alone.
    pub(crate) fn reset(&mut self, id: NodeId) {
        self.cell_mut(id).clear();
    }

    /// Like `reset`, then invalidate every listener.
    pub(crate) fn reset_and_invalidate(&mut self, id: NodeId) {
        self.reset(id);
        self.notify(id);
    }

    /// Mark the computation of `id` as running.
    ///
    /// Fails if it already is, which means the node ended up reading itself.
    pub(crate) fn enter(&mut self, id: NodeId) -> Result<()> {
        if self.cell_mut(id).enter() {
            self.active.push(id);
            return Ok(());
        }
        let name = self.name(id);
        tracing::warn!(node = name, "re-entrant read");
        // The cycle is the call chain from the first entry of `id` onwards
        let first = self.active.iter().position(|active| *active == id).unwrap_or(0);
        let mut path: Vec<String> = self.active[first..]
            .iter()
            .map(|active| self.name(*active).to_string())
            .collect();
        path.push(name.to_string());
        Err(NodeError::CircularDependency { path })
    }

    pub(crate) fn exit(&mut self, id: NodeId) {
        self.cell_mut(id).exit();
        if let Some(pos) = self.active.iter().rposition(|active| *active == id) {
            self.active.remove(pos);
        }
    }

    fn entry(&self, id: NodeId) -> (&&'static str, &NodeCell) {
        // Ids are only minted by `lookup` against this arena's own schema.
        self.cells
            .get_index(id.index())
            .unwrap_or_else(|| panic!("node id {} out of range", id.index()))
    }

    fn cell_mut(&mut self, id: NodeId) -> &mut NodeCell {
        &mut self.cells[id.index()]
    }
}
