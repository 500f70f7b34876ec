//! Process-wide schema cache.
//!
//! Maps a graph type's `TypeId` to its registered [`Schema`]. Entries are
//! never removed or replaced, so every instance of a type shares one schema.

use std::any::{type_name, Any, TypeId};
use std::sync::{Arc, OnceLock};

use dashmap::DashMap;

use super::{Schema, SchemaBuilder};
use crate::error::Result;
use crate::node::Graph;

type Entry = Arc<dyn Any + Send + Sync>;

static SCHEMAS: OnceLock<DashMap<TypeId, Entry>> = OnceLock::new();

fn schemas() -> &'static DashMap<TypeId, Entry> {
    SCHEMAS.get_or_init(DashMap::new)
}

/// Fetch the schema for `O`, declaring and building it on first use.
///
/// Failed registrations are not cached; the next call tries again and
/// reports the same error.
pub(crate) fn schema_of<O: Graph>() -> Result<Arc<Schema<O>>> {
    let key = TypeId::of::<O>();
    if let Some(entry) = schemas().get(&key) {
        return Ok(downcast(entry.value().clone()));
    }

    // Built without holding a shard lock: `declare` is user code.
    let mut builder = SchemaBuilder::new();
    O::declare(&mut builder);
    let schema: Entry = Arc::new(builder.build()?);

    // A racing thread may have registered first; its schema wins.
    let entry = schemas().entry(key).or_insert(schema).value().clone();
    Ok(downcast(entry))
}

/// Whether `O` has been registered successfully.
#[cfg(test)]
fn is_registered<O: Graph>() -> bool {
    schemas().contains_key(&TypeId::of::<O>())
}

fn downcast<O: Graph>(entry: Entry) -> Arc<Schema<O>> {
    entry
        .downcast::<Schema<O>>()
        .unwrap_or_else(|_| panic!("schema registry entry for {} has the wrong type", type_name::<O>()))
}
