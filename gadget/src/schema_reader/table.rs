use std::collections::BTreeMap;
use tracing::instrument;
use crate::catalog_client::{CatalogClient, CatalogRow, FromCatalogRow};
use crate::schema_reader::{define_working_query, SchemaReader};
use crate::PostgresTable;

#[derive(Debug, Eq, PartialEq)]
pub struct TablesResult {
    pub oid: i64,
    pub table_name: String,
}

impl FromCatalogRow for TablesResult {
    fn from_catalog_row(row: CatalogRow) -> crate::Result<Self> {
        Ok(TablesResult {
            oid: row.try_get_int("oid")?,
            table_name: row.try_get_text("table_name")?,
        })
    }
}

//language=postgresql
define_working_query!(get_tables, TablesResult, r#"
select c.oid::bigint   as oid,
       c.relname::text as table_name
from pg_catalog.pg_class c
         join pg_catalog.pg_namespace ns on c.relnamespace = ns.oid
where c.relkind in ('r', 'p')
  and ns.nspname = $1
order by c.relname;
"#);

impl<C: CatalogClient> SchemaReader<'_, C> {
    /// Every table in the schema. The column lists are left empty, see [`SchemaReader::list_columns`].
    #[instrument(skip_all)]
    pub async fn list_tables(&self) -> crate::Result<BTreeMap<String, PostgresTable>> {
        let tables = self.get_tables().await?;

        Ok(tables
            .into_iter()
            .map(|t| {
                let table = PostgresTable {
                    name: t.table_name.clone(),
                    oid: t.oid,
                    columns: vec![],
                };
                (t.table_name, table)
            })
            .collect())
    }
}
