//! Cross-thread access to one graph instance.
//!
//! Cells are not synchronized, and a read can mutate any number of them, so
//! every access has to go through a single lock per instance.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use super::{Accessor, Graph};
use crate::error::Result;

/// A graph instance behind one mutex, cheap to clone and share.
pub struct Shared<O> {
    inner: Arc<Mutex<O>>,
}

impl<O: Graph + Send> Shared<O> {
    pub fn new(graph: O) -> Self {
        Self {
            inner: Arc::new(Mutex::new(graph)),
        }
    }

    /// Run `f` with exclusive access to the instance.
    ///
    /// Use this to batch several reads and writes under one lock.
    pub fn with<R>(&self, f: impl FnOnce(&mut O) -> R) -> R {
        let mut guard = self.inner.lock();
        f(&mut guard)
    }

    pub fn get<T>(&self, accessor: &Accessor<O, T>) -> Result<T>
    where
        T: Clone + Send + 'static,
    {
        self.with(|graph| accessor.get(graph))
    }

    pub fn set<T>(&self, accessor: &Accessor<O, T>, value: T) -> Result<()>
    where
        T: Clone + Send + 'static,
    {
        self.with(|graph| accessor.set(graph, value))
    }

    pub fn reset<T>(&self, accessor: &Accessor<O, T>) -> Result<()>
    where
        T: Clone + Send + 'static,
    {
        self.with(|graph| accessor.reset(graph))
    }

    /// Take the instance back if this is the last handle.
    pub fn try_unwrap(self) -> std::result::Result<O, Self> {
        Arc::try_unwrap(self.inner)
            .map(Mutex::into_inner)
            .map_err(|inner| Self { inner })
    }
}

impl<O> Clone for Shared<O> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<O> fmt::Debug for Shared<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Shared")
            .field("handles", &Arc::strong_count(&self.inner))
            .field("locked", &self.inner.is_locked())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    use crate::graph::Cells;
    use crate::schema::{Body, SchemaBuilder};

    struct Counter {
        cells: Cells,
        computed: usize,
    }

    const STEP: Accessor<Counter, u64> = Accessor::input("step");
    const TOTAL: Accessor<Counter, u64> = Accessor::new("total", total);

    fn total(this: &mut Counter) -> Result<u64> {
        this.computed += 1;
        Ok(STEP.get(this)? * 10)
    }

    impl Graph for Counter {
        fn declare(nodes: &mut SchemaBuilder<Self>) {
            nodes.input(&STEP).node(&TOTAL, Body::reads(["step"]));
        }

        fn cells(&self) -> &Cells {
            &self.cells
        }

        fn cells_mut(&mut self) -> &mut Cells {
            &mut self.cells
        }
    }

    #[test]
    fn threads_share_one_instance() {
        let counter = Counter::builder()
            .unwrap()
            .build_with(|cells| Counter { cells, computed: 0 }, |c| STEP.set(c, 1))
            .unwrap();
        let shared = Shared::new(counter);

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let shared = shared.clone();
                thread::spawn(move || shared.get(&TOTAL).unwrap())
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), 10);
        }

        shared.set(&STEP, 2).unwrap();
        assert_eq!(shared.get(&TOTAL).unwrap(), 20);

        let counter = shared.try_unwrap().unwrap();
        assert_eq!(counter.computed, 2);
    }

    #[test]
    fn try_unwrap_fails_while_shared() {
        let counter = Counter::builder()
            .unwrap()
            .build(|cells| Counter { cells, computed: 0 });
        let shared = Shared::new(counter);
        let other = shared.clone();

        let Err(shared) = shared.try_unwrap() else {
            panic!("unwrapped while another handle was alive");
        };
        drop(other);
        assert!(shared.try_unwrap().is_ok());
    }
}
