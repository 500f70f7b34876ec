//! Graph types and two-phase construction.
//!
//! Building an instance happens in two steps:
//!
//! 1. [`InstanceBuilder`] fetches (or registers) the type's schema and wires
//!    a fresh [`Cells`] arena, every cell dirty-empty.
//! 2. The caller turns the cells into the object and, optionally, runs an
//!    initializer against it. Writes made by the initializer already land
//!    in a fully wired graph.

use std::sync::Arc;

use crate::error::Result;
use crate::graph::Cells;
use crate::schema::{Schema, SchemaBuilder};

/// A type carrying a lazily re-evaluating node graph.
///
/// Implementors own a [`Cells`] field and list their nodes in
/// [`declare`](Graph::declare). The [`nodes!`](crate::nodes) macro writes
/// this impl for you.
pub trait Graph: Sized + 'static {
    /// List this type's nodes. Called once per process.
    fn declare(nodes: &mut SchemaBuilder<Self>);

    fn cells(&self) -> &Cells;

    fn cells_mut(&mut self) -> &mut Cells;

    /// The registered schema for this type.
    fn schema() -> Result<Arc<Schema<Self>>> {
        Schema::of()
    }

    /// Start building an instance.
    fn builder() -> Result<InstanceBuilder<Self>> {
        InstanceBuilder::new()
    }
}

/// Wires cells for new instances of `O`.
#[derive(Debug)]
pub struct InstanceBuilder<O> {
    schema: Arc<Schema<O>>,
}

impl<O: Graph> InstanceBuilder<O> {
    /// Registers `O` if needed; fails if its declaration is invalid.
    pub fn new() -> Result<Self> {
        Ok(Self { schema: Schema::of()? })
    }

    pub fn schema(&self) -> &Arc<Schema<O>> {
        &self.schema
    }

    /// Hand freshly wired cells to `make`.
    ///
    /// `make` must store the cells it is given as the object's
    /// [`Graph::cells`].
    pub fn build<F>(&self, make: F) -> O
    where
        F: FnOnce(Cells) -> O,
    {
        let graph = make(self.schema.wire());
        debug_assert_eq!(
            graph.cells().len(),
            self.schema.nodes().len(),
            "`make` must keep the cells it was given"
        );
        graph
    }

    /// Like [`build`](Self::build), then run `init` on the wired object.
    pub fn build_with<F, I>(&self, make: F, init: I) -> Result<O>
    where
        F: FnOnce(Cells) -> O,
        I: FnOnce(&mut O) -> Result<()>,
    {
        let mut graph = self.build(make);
        init(&mut graph)?;
        Ok(graph)
    }
}

impl<O> Clone for InstanceBuilder<O> {
    fn clone(&self) -> Self {
        Self {
            schema: Arc::clone(&self.schema),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NodeError;
    use crate::graph::NodeState;
    use crate::node::Accessor;
    use crate::schema::Body;

    struct Pair {
        cells: Cells,
    }

    const LEFT: Accessor<Pair, i32> = Accessor::new("left", left);
    const SUM: Accessor<Pair, i32> = Accessor::new("sum", sum);
    // Declared after its reader; wiring must not depend on order
    const RIGHT: Accessor<Pair, i32> = Accessor::input("right");

    fn left(_: &mut Pair) -> Result<i32> {
        Ok(1)
    }

    fn sum(this: &mut Pair) -> Result<i32> {
        Ok(LEFT.get(this)? + RIGHT.get(this)?)
    }

    impl Graph for Pair {
        fn declare(nodes: &mut SchemaBuilder<Self>) {
            nodes
                .node(&LEFT, Body::Reads(Vec::new()))
                .node(&SUM, Body::reads(["left", "right"]))
                .input(&RIGHT);
        }

        fn cells(&self) -> &Cells {
            &self.cells
        }

        fn cells_mut(&mut self) -> &mut Cells {
            &mut self.cells
        }
    }

    #[test]
    fn each_instance_gets_fresh_cells() {
        let builder = Pair::builder().unwrap();
        let mut first = builder.build(|cells| Pair { cells });
        let second = builder.build(|cells| Pair { cells });

        LEFT.get(&mut first).unwrap();
        assert_eq!(LEFT.state(&first).unwrap(), NodeState::Clean);
        assert_eq!(LEFT.state(&second).unwrap(), NodeState::DirtyEmpty);
    }

    #[test]
    fn initializer_writes_into_wired_graph() {
        let builder = Pair::builder().unwrap();
        let mut pair = builder
            .build_with(|cells| Pair { cells }, |pair| RIGHT.set(pair, 41))
            .unwrap();

        assert_eq!(SUM.get(&mut pair).unwrap(), 42);
        assert_eq!(RIGHT.state(&pair).unwrap(), NodeState::Overridden);

        RIGHT.set(&mut pair, 1).unwrap();
        assert!(SUM.is_dirty(&pair).unwrap());
        assert_eq!(SUM.get(&mut pair).unwrap(), 2);
    }

    #[test]
    fn initializer_errors_propagate() {
        let builder = Pair::builder().unwrap();
        let result = builder.build_with(
            |cells| Pair { cells },
            |pair| SUM.get(pair).map(|_| ()),
        );
        assert!(matches!(result, Err(NodeError::ValueNotComputable(name)) if name == "right"));
    }

    #[test]
    fn schema_is_shared_between_builders() {
        let a = Pair::builder().unwrap();
        let b = a.clone();
        assert!(Arc::ptr_eq(a.schema(), b.schema()));
        assert!(Arc::ptr_eq(a.schema(), &Pair::schema().unwrap()));
    }
}
