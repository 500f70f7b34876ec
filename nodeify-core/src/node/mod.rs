//! Node Access
//!
//! This module is the object-facing side of the system: the [`Graph`] trait
//! a type implements to carry nodes, the [`Accessor`] used to read and write
//! them, and the [`InstanceBuilder`] that wires a new instance.
//!
//! # Concepts
//!
//! ## Derived nodes
//!
//! A derived node has a computation. Reading it returns the cached value, or
//! recomputes first if something it reads has changed since.
//!
//! ## Inputs
//!
//! An input has no computation and must be written before it is read.
//!
//! ## Overrides
//!
//! Writing any node, derived or input, pins it to the written value. Upstream
//! changes no longer touch it until it is [reset](Accessor::reset).
//!
//! # Threading
//!
//! Instances are not synchronized. Confine each one to a single thread, or
//! share it through [`Shared`], which puts the whole instance behind one lock.

mod accessor;
mod builder;
mod shared;

pub use accessor::{Accessor, Compute};
pub use builder::{Graph, InstanceBuilder};
pub use shared::Shared;
