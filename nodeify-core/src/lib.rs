//! Nodeify Core
//!
//! This crate provides lazily re-evaluating computation graphs attached to
//! ordinary Rust types. Some of a type's values are declared as *nodes*,
//! derived from other nodes of the same instance:
//!
//! - Reading a node returns its cached value, recomputing it first only if
//!   something it reads has changed.
//! - Writing a node pins it to a manual value and marks every node that
//!   depends on it, transitively, as stale.
//! - Resetting a node drops the manual value; the next read recomputes.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `schema`: per-type registration. Analyzes each computation body for the
//!   nodes it reads and inverts that into a dependency map, once per type.
//! - `graph`: per-instance node cells and the invalidation protocol that
//!   runs over their listener edges.
//! - `node`: the `Graph` trait, accessors, and two-phase instance building.
//!
//! Nothing is synchronized internally. An instance belongs to one thread at
//! a time unless it is wrapped in [`Shared`].
//!
//! # Example
//!
//! ```rust,ignore
//! use nodeify_core::{nodes, Cells, Graph};
//!
//! pub struct Klass {
//!     cells: Cells,
//! }
//!
//! nodes! {
//!     impl Klass(cells) in pub mod klass {
//!         pub x: i64 = |_this| Ok(10);
//!         pub y: i64 = |_this| Ok(20);
//!         pub a: i64 = |this| Ok(this.x()? + this.y()?);
//!     }
//! }
//!
//! let mut k = Klass::builder()?.build(|cells| Klass { cells });
//! assert_eq!(k.a()?, 30);
//!
//! klass::x.set(&mut k, 60)?;
//! klass::y.set(&mut k, 9)?;
//! assert_eq!(k.a()?, 69);
//! ```

mod macros;

pub mod error;
pub mod graph;
pub mod node;
pub mod schema;

pub use error::{BoxError, NodeError, Result};
pub use graph::{Cells, NodeCell, NodeId, NodeState};
pub use node::{Accessor, Compute, Graph, InstanceBuilder, Shared};
pub use schema::{analyze, AnalysisError, Body, DependencyMap, Schema, SchemaBuilder};
