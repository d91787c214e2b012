use std::collections::{btree_set, HashMap};
use super::DependencyGraph;
use crate::{GadgetError, Result};

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
enum VisitState {
    InProgress,
    Done,
}

/// A table being visited together with the dependencies still to look at.
struct Frame<'a> {
    table: &'a str,
    dependencies: btree_set::Iter<'a, String>,
}

struct Sorter<'a> {
    graph: &'a DependencyGraph,
    state: HashMap<&'a str, VisitState>,
    /// Tables currently being visited, outermost first.
    path: Vec<Frame<'a>>,
    order: Vec<String>,
}

/// Orders the tables of `graph` so every table comes after the tables it depends on.
///
/// Tables are visited depth first in key order and emitted after their
/// dependencies, so tables without an edge between them keep their relative
/// key order. Any cycle, including a table referencing itself, is an error.
pub fn topological_order(graph: &DependencyGraph) -> Result<Vec<String>> {
    let mut sorter = Sorter {
        graph,
        state: HashMap::with_capacity(graph.len()),
        path: Vec::new(),
        order: Vec::with_capacity(graph.len()),
    };

    for table in graph.keys() {
        sorter.visit(table)?;
    }

    Ok(sorter.order)
}

impl<'a> Sorter<'a> {
    /// Visits `root` and everything reachable from it. The path lives on the heap,
    /// so long foreign key chains do not grow the call stack.
    fn visit(&mut self, root: &'a str) -> Result {
        self.enter(root)?;

        while let Some(frame) = self.path.last_mut() {
            let table = frame.table;

            match frame.dependencies.next() {
                Some(dependency) => {
                    if !self.graph.contains_key(dependency) {
                        return Err(GadgetError::UnknownDependency {
                            table: table.to_string(),
                            dependency: dependency.clone(),
                        });
                    }

                    self.enter(dependency)?;
                }
                None => {
                    self.path.pop();
                    self.state.insert(table, VisitState::Done);
                    self.order.push(table.to_string());
                }
            }
        }

        Ok(())
    }

    /// Pushes `table` on the path unless it is already done.
    fn enter(&mut self, table: &'a str) -> Result {
        match self.state.get(table) {
            Some(VisitState::Done) => return Ok(()),
            Some(VisitState::InProgress) => return Err(self.cycle_error(table)),
            None => {}
        }

        let graph = self.graph;
        let Some((table, dependencies)) = graph.get_key_value(table) else {
            return Ok(());
        };

        self.state.insert(table, VisitState::InProgress);
        self.path.push(Frame {
            table,
            dependencies: dependencies.iter(),
        });

        Ok(())
    }

    /// The part of the current path starting at `table`, closed by `table` again.
    fn cycle_error(&self, table: &str) -> GadgetError {
        let start = self.path.iter().position(|f| f.table == table).unwrap_or(0);

        let mut cycle: Vec<String> = self.path[start..].iter().map(|f| f.table.to_string()).collect();
        cycle.push(table.to_string());

        GadgetError::CycleDetected { cycle }
    }
}
