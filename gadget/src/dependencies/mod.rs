//! Table to table dependencies derived from foreign keys.
//!
//! A table `a` depends on a table `b` when `a` has a foreign key referencing `b`.

use std::collections::{BTreeMap, BTreeSet};
use tracing::trace;
use crate::{PostgresForeignKey, PostgresTable};

mod graph_export;
mod topological_sort;

pub use graph_export::render_graph;
pub use topological_sort::topological_order;

/// Maps every table name to the names of the tables it references.
pub type DependencyGraph = BTreeMap<String, BTreeSet<String>>;

/// Builds the dependency graph for `tables`.
///
/// Every table gets an entry, even without foreign keys. Several foreign keys
/// between the same pair of tables give a single edge. Foreign keys owned by
/// tables that are not in `tables` are ignored.
pub fn build_dependencies(
    tables: &BTreeMap<String, PostgresTable>,
    foreign_keys: &BTreeMap<String, Vec<PostgresForeignKey>>,
) -> DependencyGraph {
    let mut graph = DependencyGraph::new();

    for table_name in tables.keys() {
        let dependencies = graph.entry(table_name.clone()).or_default();

        for fk in foreign_keys.get(table_name).into_iter().flatten() {
            if fk.is_self_reference(table_name) {
                trace!(table = %table_name, foreign_key = %fk.name, "table references itself");
            }
            dependencies.insert(fk.referenced_table.clone());
        }
    }

    graph
}
