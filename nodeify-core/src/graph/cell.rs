//! Node Cells
//!
//! A cell is the per-instance cache behind one node: the last value, a dirty
//! flag, an override flag, and the indices of the cells that read it.
//!
//! Cells never touch each other directly. Anything that has to walk listener
//! edges lives on [`Cells`](super::Cells), which owns the whole arena.

use std::any::Any;
use std::fmt;

use serde::Serialize;
use smallvec::SmallVec;

/// Index of a cell inside one instance's [`Cells`](super::Cells).
///
/// Ids follow declaration order, so the same id names the same node on every
/// instance of a type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    /// Get the raw index.
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Observable state of a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeState {
    /// Never computed, or reset. The next read computes.
    DirtyEmpty,

    /// Holds a value that an upstream write has invalidated.
    DirtyStale,

    /// Holds a computed value that is still valid.
    Clean,

    /// Holds a manually assigned value, immune to upstream invalidation.
    Overridden,
}

impl NodeState {
    /// Whether the next read must run the node's computation.
    pub fn is_dirty(&self) -> bool {
        matches!(self, Self::DirtyEmpty | Self::DirtyStale)
    }
}

/// Runtime state backing one node of one instance.
pub struct NodeCell {
    /// Last computed or assigned value; `None` until the first success.
    value: Option<Box<dyn Any + Send>>,

    dirty: bool,

    /// Set by manual writes. Implies `!dirty`.
    overridden: bool,

    /// True while this node's computation is on the stack.
    computing: bool,

    /// Cells whose computation reads this one, in wiring order.
    listeners: SmallVec<[NodeId; 4]>,
}

impl NodeCell {
    /// Create a cell in the dirty-empty state.
    pub fn new() -> Self {
        Self {
            value: None,
            dirty: true,
            overridden: false,
            computing: false,
            listeners: SmallVec::new(),
        }
    }

    pub fn state(&self) -> NodeState {
        match (self.overridden, self.dirty, self.value.is_some()) {
            (true, _, _) => NodeState::Overridden,
            (false, false, true) => NodeState::Clean,
            (false, _, true) => NodeState::DirtyStale,
            (false, _, false) => NodeState::DirtyEmpty,
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn is_overridden(&self) -> bool {
        self.overridden
    }

    pub fn has_value(&self) -> bool {
        self.value.is_some()
    }

    /// Whether a read has to run the computation first.
    pub fn needs_compute(&self) -> bool {
        self.dirty && !self.overridden
    }

    pub fn listeners(&self) -> &[NodeId] {
        &self.listeners
    }

    /// Borrow the cached value as `T`.
    ///
    /// Returns `None` when the cell is empty, `Some(None)` when the value is
    /// of another type.
    pub fn value<T: 'static>(&self) -> Option<Option<&T>> {
        self.value.as_ref().map(|value| value.downcast_ref::<T>())
    }

    pub(crate) fn add_listener(&mut self, listener: NodeId) {
        if !self.listeners.contains(&listener) {
            self.listeners.push(listener);
        }
    }

    /// Mark the cell dirty in response to an upstream change.
    ///
    /// Returns `false` when the cell is overridden and the change stops here.
    pub(crate) fn invalidate(&mut self) -> bool {
        if self.overridden {
            return false;
        }
        self.dirty = true;
        true
    }

    /// Store a value. `manual` installs an override.
    pub(crate) fn store(&mut self, value: Box<dyn Any + Send>, manual: bool) {
        self.value = Some(value);
        self.overridden = manual;
        self.dirty = false;
    }

    /// Drop the value and any override, back to dirty-empty.
    pub(crate) fn clear(&mut self) {
        self.overridden = false;
        self.value = None;
        self.dirty = true;
    }

    /// Flag the computation as running. Returns `false` if it already was.
    pub(crate) fn enter(&mut self) -> bool {
        !std::mem::replace(&mut self.computing, true)
    }

    pub(crate) fn exit(&mut self) {
        self.computing = false;
    }
}

impl Default for NodeCell {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for NodeCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeCell")
            .field("state", &self.state())
            .field("listeners", &self.listeners)
            .finish()
    }
}
