//! Accessor Implementation
//!
//! An accessor binds a node name to the function that computes it. It holds
//! no state of its own: every read or write goes to the cell of the instance
//! it is given, so one accessor serves every instance of the type.
//!
//! # Reads
//!
//! 1. If the cell is dirty and not overridden, run the computation against
//!    the instance and store the result. This may recursively read (and
//!    recompute) upstream nodes.
//! 2. Return a clone of the cached value, or `ValueNotComputable` if there
//!    still is none.
//!
//! # Writes
//!
//! A write stores the value as an override and invalidates everything
//! downstream. The node keeps the value until the next write or `reset`.
//!
//! `reset` only empties the node itself. Downstream nodes keep their cached
//! values until the reset node is recomputed, which notifies them as any
//! recompute does. Use `reset_and_invalidate` to dirty them immediately.

use std::any::type_name;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use super::Graph;
use crate::error::{NodeError, Result};
use crate::graph::NodeState;

/// Computation behind a derived node.
pub type Compute<O, T> = fn(&mut O) -> Result<T>;

/// Read/write handle for one node of graph type `O`, holding values of `T`.
///
/// Accessors are `Copy` and can be built in `const` items:
///
/// ```rust,ignore
/// const TOTAL: Accessor<Cart, f64> = Accessor::new("total", |cart| {
///     Ok(PRICE.get(cart)? * QUANTITY.get(cart)? as f64)
/// });
/// ```
pub struct Accessor<O, T> {
    name: &'static str,
    compute: Option<Compute<O, T>>,
}

impl<O, T> Accessor<O, T> {
    /// A derived node computed by `compute`.
    pub const fn new(name: &'static str, compute: Compute<O, T>) -> Self {
        Self {
            name,
            compute: Some(compute),
        }
    }

    /// A node with no computation. Reading it before a write fails.
    pub const fn input(name: &'static str) -> Self {
        Self { name, compute: None }
    }

    pub const fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_input(&self) -> bool {
        self.compute.is_none()
    }
}

impl<O, T> Accessor<O, T>
where
    O: Graph,
    T: Clone + Send + 'static,
{
    /// Read the node, recomputing it first if it is dirty.
    pub fn get(&self, graph: &mut O) -> Result<T> {
        let id = graph.cells().lookup(self.name)?;

        if graph.cells().cell(id).needs_compute() {
            if let Some(compute) = self.compute {
                graph.cells_mut().enter(id)?;
                tracing::trace!(node = self.name, "recomputing");
                // A panicking computation must not leave the node marked as running
                let result = match panic::catch_unwind(AssertUnwindSafe(|| compute(graph))) {
                    Ok(result) => result,
                    Err(payload) => {
                        graph.cells_mut().exit(id);
                        panic::resume_unwind(payload);
                    }
                };
                graph.cells_mut().exit(id);
                graph.cells_mut().set_value(id, Box::new(result?), false);
            }
        }

        match graph.cells().cell(id).value::<T>() {
            Some(Some(value)) => Ok(value.clone()),
            Some(None) => Err(NodeError::TypeMismatch {
                node: self.name.to_string(),
                expected: type_name::<T>(),
            }),
            None => Err(NodeError::ValueNotComputable(self.name.to_string())),
        }
    }

    /// Pin the node to `value` and invalidate everything downstream.
    pub fn set(&self, graph: &mut O, value: T) -> Result<()> {
        let id = graph.cells().lookup(self.name)?;
        tracing::trace!(node = self.name, "override installed");
        graph.cells_mut().set_value(id, Box::new(value), true);
        Ok(())
    }

    /// Drop any value or override; the next read recomputes.
    ///
    /// Downstream nodes are not invalidated by the reset itself.
    pub fn reset(&self, graph: &mut O) -> Result<()> {
        let id = graph.cells().lookup(self.name)?;
        tracing::trace!(node = self.name, "reset");
        graph.cells_mut().reset(id);
        Ok(())
    }

    /// [`reset`](Self::reset), then mark everything downstream dirty.
    pub fn reset_and_invalidate(&self, graph: &mut O) -> Result<()> {
        let id = graph.cells().lookup(self.name)?;
        tracing::trace!(node = self.name, "reset with invalidation");
        graph.cells_mut().reset_and_invalidate(id);
        Ok(())
    }

    pub fn state(&self, graph: &O) -> Result<NodeState> {
        graph.cells().state(self.name)
    }

    pub fn is_dirty(&self, graph: &O) -> Result<bool> {
        Ok(self.state(graph)?.is_dirty())
    }

    pub fn is_overridden(&self, graph: &O) -> Result<bool> {
        Ok(self.state(graph)? == NodeState::Overridden)
    }
}

impl<O, T> Clone for Accessor<O, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<O, T> Copy for Accessor<O, T> {}

impl<O, T> fmt::Debug for Accessor<O, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Accessor")
            .field("name", &self.name)
            .field("value", &type_name::<T>())
            .field("input", &self.is_input())
            .finish()
    }
}
