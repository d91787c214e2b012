use std::collections::BTreeMap;
use tracing::{debug, instrument};
use crate::catalog_client::{CatalogClient, FromCatalogRow};
use crate::dependencies::{build_dependencies, render_graph, topological_order, DependencyGraph};
use crate::Result;

mod constraint;
mod foreign_key;
mod function;
mod pg_type;
mod sequence;
mod table;
mod table_column;
#[cfg(test)]
mod tests;
mod trigger;

pub use table_column::ColumnListOptions;

/// Options shared by every listing of a [`SchemaReader`].
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ReaderOptions {
    /// The schema all listings are scoped to.
    pub schema_name: String,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            schema_name: "public".to_string(),
        }
    }
}

/// Reads typed catalog records for a single schema.
///
/// The reader only borrows the connection and keeps no state between calls,
/// every listing is read fresh from the catalog.
pub struct SchemaReader<'a, C: CatalogClient> {
    connection: &'a C,
    options: ReaderOptions,
}

impl<'a, C: CatalogClient> SchemaReader<'a, C> {
    pub fn new(connection: &'a C) -> Self {
        Self::with_options(connection, ReaderOptions::default())
    }

    pub fn with_options(connection: &'a C, options: ReaderOptions) -> Self {
        SchemaReader { connection, options }
    }

    pub fn schema_name(&self) -> &str {
        &self.options.schema_name
    }

    async fn get_results<T: FromCatalogRow>(&self, sql: &str, params: &[&str]) -> Result<Vec<T>> {
        let rows = self.connection.query(sql, params).await?;

        let mut output = Vec::with_capacity(rows.len());
        for row in rows {
            output.push(T::from_catalog_row(row)?);
        }

        Ok(output)
    }

    /// The tables of the schema, each mapped to the tables it references through foreign keys.
    #[instrument(skip_all)]
    pub async fn dependencies(&self) -> Result<DependencyGraph> {
        let tables = self.list_tables().await?;
        let foreign_keys = self.list_foreign_keys(None).await?;

        let graph = build_dependencies(&tables, &foreign_keys);
        debug!(tables = graph.len(), "built dependency graph");

        Ok(graph)
    }

    /// All tables, with every table after the tables it references.
    #[instrument(skip_all)]
    pub async fn tables_in_dependency_order(&self) -> Result<Vec<String>> {
        let graph = self.dependencies().await?;
        topological_order(&graph)
    }

    /// The dependency graph in Graphviz dot format.
    #[instrument(skip_all)]
    pub async fn dependency_graph(&self) -> Result<String> {
        let graph = self.dependencies().await?;
        Ok(render_graph(&graph))
    }
}

/// Narrows `sql` to a single table when one is given, binding it as the next parameter.
fn filter_by_table<'p>(sql: &mut String, params: &mut Vec<&'p str>, column: &str, table_name: Option<&'p str>) {
    if let Some(table_name) = table_name {
        params.push(table_name);
        sql.push_str(&format!("\n  and {column} = ${}", params.len()));
    }
}

/// Groups `items` by the table they belong to, keeping their order within each table.
fn group_by_table<T>(items: impl IntoIterator<Item = (String, T)>) -> BTreeMap<String, Vec<T>> {
    let mut grouped: BTreeMap<String, Vec<T>> = BTreeMap::new();
    for (table_name, item) in items {
        grouped.entry(table_name).or_default().push(item);
    }
    grouped
}

macro_rules! define_working_query {
    ($fn_name:ident, $result:ident, $query:literal) => {
        impl<C: $crate::catalog_client::CatalogClient> $crate::schema_reader::SchemaReader<'_, C> {
            #[tracing::instrument(skip_all)]
            pub(in crate::schema_reader) async fn $fn_name(&self) -> $crate::Result<Vec<$result>> {
                self.get_results($query, &[self.schema_name()]).await
            }
        }
    };
}

pub(crate) use define_working_query;
