//! Graph Schemas
//!
//! A schema is everything about a graph type that does not change between
//! instances: the declared node names, in order, and the [`DependencyMap`]
//! derived from their computation bodies.
//!
//! # Registration
//!
//! [`Schema::of`] builds the schema for a [`Graph`] type the first time it is
//! asked for and hands out the same `Arc` afterwards:
//!
//! 1. [`Graph::declare`] lists the nodes and their [`Body`].
//! 2. Each source body runs through the [analyzer](analyze).
//! 3. The reads are inverted into a [`DependencyMap`].
//! 4. The listener graph is checked for cycles.
//!
//! Any failure aborts registration; nothing is cached and no instance can be
//! built until the declaration is fixed.

mod analyzer;
mod dependency_map;
mod registry;

pub use analyzer::{analyze, AnalysisError};
pub use dependency_map::DependencyMap;

use std::any::type_name;
use std::borrow::Cow;
use std::collections::HashSet;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use serde::Serialize;

use crate::error::{NodeError, Result};
use crate::graph::Cells;
use crate::node::{Accessor, Graph};

/// What the analyzer gets to see of a node's computation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    /// Source text of the computation, with the name its receiver is bound to.
    Source {
        receiver: Cow<'static, str>,
        text: Cow<'static, str>,
    },

    /// Upstream names given explicitly. Not analyzed.
    Reads(Vec<String>),
}

impl Body {
    pub fn source(receiver: impl Into<Cow<'static, str>>, text: impl Into<Cow<'static, str>>) -> Self {
        Self::Source {
            receiver: receiver.into(),
            text: text.into(),
        }
    }

    pub fn reads<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::Reads(names.into_iter().map(|n| n.as_ref().to_string()).collect())
    }

    /// Names read by this body.
    fn resolve(&self, node: &str) -> Result<Vec<String>> {
        match self {
            Self::Source { receiver, text } => {
                analyze(receiver, text).map_err(|err| NodeError::UnanalyzableComputation {
                    node: node.to_string(),
                    reason: err.to_string(),
                })
            }
            Self::Reads(names) => Ok(names.clone()),
        }
    }
}

/// Collects node declarations for one graph type.
pub struct SchemaBuilder<O> {
    nodes: Vec<(&'static str, Body)>,
    strict: bool,
    _graph: PhantomData<fn() -> O>,
}

impl<O> SchemaBuilder<O> {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            strict: false,
            _graph: PhantomData,
        }
    }

    /// Declare a derived node.
    pub fn node<T>(&mut self, accessor: &Accessor<O, T>, body: Body) -> &mut Self {
        self.nodes.push((accessor.name(), body));
        self
    }

    /// Declare a node that has to be written before it can be read.
    pub fn input<T>(&mut self, accessor: &Accessor<O, T>) -> &mut Self {
        self.nodes.push((accessor.name(), Body::Reads(Vec::new())));
        self
    }

    /// Reject reads of names that are not declared nodes.
    ///
    /// Off by default, so computations can read plain fields and helpers.
    pub fn strict(&mut self, strict: bool) -> &mut Self {
        self.strict = strict;
        self
    }

    pub fn build(self) -> Result<Schema<O>> {
        let mut seen = HashSet::new();
        for (name, _) in &self.nodes {
            if !seen.insert(*name) {
                return Err(NodeError::DuplicateNode(name.to_string()));
            }
        }

        let mut reads = Vec::with_capacity(self.nodes.len());
        for (name, body) in &self.nodes {
            let attributes = body.resolve(name)?;
            if self.strict {
                if let Some(unknown) = attributes.iter().find(|a| !seen.contains(a.as_str())) {
                    return Err(NodeError::UnknownDependency {
                        node: name.to_string(),
                        read: unknown.clone(),
                    });
                }
            }
            reads.push((*name, attributes));
        }

        let nodes: Vec<&'static str> = self.nodes.iter().map(|(name, _)| *name).collect();
        let dependencies = DependencyMap::from_reads(reads);
        if let Some(path) = dependencies.find_cycle(&nodes) {
            return Err(NodeError::CircularDependency { path });
        }

        tracing::debug!(
            graph = type_name::<O>(),
            nodes = nodes.len(),
            attributes = dependencies.len(),
            "registered graph schema"
        );

        Ok(Schema {
            nodes,
            dependencies,
            _graph: PhantomData,
        })
    }
}

impl<O> Default for SchemaBuilder<O> {
    fn default() -> Self {
        Self::new()
    }
}

/// Registered, immutable description of a graph type.
pub struct Schema<O> {
    nodes: Vec<&'static str>,
    dependencies: DependencyMap,
    _graph: PhantomData<fn() -> O>,
}

#[derive(Serialize)]
struct Manifest<'a> {
    graph: &'static str,
    nodes: &'a [&'static str],
    dependencies: &'a DependencyMap,
}

impl<O: Graph> Schema<O> {
    /// Get the schema for `O`, registering the type on first use.
    pub fn of() -> Result<Arc<Self>> {
        registry::schema_of::<O>()
    }
}

impl<O> Schema<O> {
    /// Declared node names, in declaration order.
    pub fn nodes(&self) -> &[&'static str] {
        &self.nodes
    }

    pub fn dependencies(&self) -> &DependencyMap {
        &self.dependencies
    }

    /// Allocate and wire a fresh set of cells for one instance.
    pub fn wire(&self) -> Cells {
        Cells::wire(&self.nodes, &self.dependencies)
    }

    /// Nodes and dependency map as JSON.
    ///
    /// The `dependencies` object can be fed back as explicit
    /// [`Body::reads`] declarations.
    pub fn manifest_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&Manifest {
            graph: type_name::<O>(),
            nodes: &self.nodes,
            dependencies: &self.dependencies,
        })
    }
}

impl<O> fmt::Debug for Schema<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("graph", &type_name::<O>())
            .field("nodes", &self.nodes)
            .field("dependencies", &self.dependencies)
            .finish()
    }
}
