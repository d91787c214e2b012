use std::collections::BTreeMap;
use itertools::Itertools;
use tracing::instrument;
use crate::catalog_client::{CatalogClient, CatalogRow, FromCatalogRow};
use crate::schema_reader::{filter_by_table, SchemaReader};
use crate::PostgresTable;

/// Options for [`SchemaReader::list_columns`].
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub struct ColumnListOptions {
    /// Also list dropped columns, under the placeholder name Postgres gives them.
    ///
    /// Foreign key column positions can only be resolved against this full list.
    pub include_dropped: bool,
}

#[derive(Debug, Eq, PartialEq)]
pub struct TableColumnsResult {
    pub oid: i64,
    pub table_name: String,
    pub column_name: String,
    pub position: i64,
}

impl FromCatalogRow for TableColumnsResult {
    fn from_catalog_row(row: CatalogRow) -> crate::Result<Self> {
        Ok(TableColumnsResult {
            oid: row.try_get_int("oid")?,
            table_name: row.try_get_text("table_name")?,
            column_name: row.try_get_text("column_name")?,
            position: row.try_get_int("position")?,
        })
    }
}

//language=postgresql
const COLUMNS_QUERY: &str = r#"
select c.oid::bigint    as oid,
       c.relname::text  as table_name,
       a.attname::text  as column_name,
       a.attnum::bigint as position
from pg_catalog.pg_attribute a
         join pg_catalog.pg_class c on a.attrelid = c.oid
         join pg_catalog.pg_namespace ns on c.relnamespace = ns.oid
where c.relkind in ('r', 'p')
  and a.attnum >= 0
  and ns.nspname = $1"#;

impl<C: CatalogClient> SchemaReader<'_, C> {
    #[instrument(skip_all)]
    pub(in crate::schema_reader) async fn get_columns(&self, table_name: Option<&str>, options: ColumnListOptions) -> crate::Result<Vec<TableColumnsResult>> {
        let mut sql = COLUMNS_QUERY.to_string();
        let mut params = vec![self.schema_name()];

        if !options.include_dropped {
            sql.push_str("\n  and not a.attisdropped");
        }
        filter_by_table(&mut sql, &mut params, "c.relname", table_name);
        sql.push_str("\norder by c.relname, a.attnum;");

        self.get_results(&sql, &params).await
    }

    /// The columns of every table, or only of `table_name`, in attribute number order.
    ///
    /// System columns are never listed. Tables without any listed column are absent.
    #[instrument(skip_all)]
    pub async fn list_columns(&self, table_name: Option<&str>, options: ColumnListOptions) -> crate::Result<BTreeMap<String, PostgresTable>> {
        let columns = self.get_columns(table_name, options).await?;

        let mut tables: BTreeMap<String, PostgresTable> = BTreeMap::new();
        for column in columns.into_iter().sorted_by_key(|c| c.position) {
            let table = tables
                .entry(column.table_name.clone())
                .or_insert_with(|| PostgresTable {
                    name: column.table_name.clone(),
                    oid: column.oid,
                    columns: vec![],
                });

            table.columns.push(column.column_name);
        }

        Ok(tables)
    }
}
