//! Node Graph
//!
//! This module holds the per-instance half of the system: the cells that
//! cache node values and the listener edges between them.
//!
//! # Overview
//!
//! Each instance owns a [`Cells`] arena with one [`NodeCell`] per declared
//! node. If node A reads node B, B's cell lists A as a listener:
//!
//! - Writing B stores the value and marks A (and everything downstream of A)
//!   dirty. Nothing is recomputed yet.
//! - Reading A recomputes it only if it is dirty, which in turn reads B.
//!
//! Edges come from the type's [`DependencyMap`](crate::schema::DependencyMap)
//! and are fixed once the cells are wired.

mod cell;
mod cells;

pub use cell::{NodeCell, NodeId, NodeState};
pub use cells::Cells;
