use std::collections::BTreeMap;
use tracing::instrument;
use crate::catalog_client::{CatalogClient, CatalogRow, FromCatalogRow};
use crate::schema_reader::{filter_by_table, group_by_table, SchemaReader};
use crate::PostgresTrigger;

pub struct TriggerResult {
    pub oid: i64,
    pub name: String,
    pub table_name: String,
    pub function_name: String,
}

impl FromCatalogRow for TriggerResult {
    fn from_catalog_row(row: CatalogRow) -> crate::Result<Self> {
        Ok(Self {
            oid: row.try_get_int("oid")?,
            name: row.try_get_text("trigger_name")?,
            table_name: row.try_get_text("table_name")?,
            function_name: row.try_get_text("function_name")?,
        })
    }
}

// Triggers backing foreign keys have tgconstrrelid set and are left out.
//language=postgresql
const TRIGGERS_QUERY: &str = r#"
select tg.oid::bigint    as oid,
       tg.tgname::text   as trigger_name,
       c.relname::text   as table_name,
       p.proname::text   as function_name
from pg_catalog.pg_trigger tg
         join pg_catalog.pg_class c on tg.tgrelid = c.oid
         join pg_catalog.pg_namespace ns on c.relnamespace = ns.oid
         join pg_catalog.pg_proc p on tg.tgfoid = p.oid
where tg.tgconstrrelid = 0
  and c.relkind in ('r', 'p')
  and ns.nspname = $1"#;

impl<C: CatalogClient> SchemaReader<'_, C> {
    #[instrument(skip_all)]
    pub(in crate::schema_reader) async fn get_triggers(&self, table_name: Option<&str>) -> crate::Result<Vec<TriggerResult>> {
        let mut sql = TRIGGERS_QUERY.to_string();
        let mut params = vec![self.schema_name()];

        filter_by_table(&mut sql, &mut params, "c.relname", table_name);
        sql.push_str("\norder by c.relname, tg.tgname;");

        self.get_results(&sql, &params).await
    }

    /// The triggers of every table, or only of `table_name`, ordered by trigger name.
    ///
    /// Trigger names are only unique per table, so the same name can show up under several tables.
    #[instrument(skip_all)]
    pub async fn list_triggers(&self, table_name: Option<&str>) -> crate::Result<BTreeMap<String, Vec<PostgresTrigger>>> {
        let triggers = self.get_triggers(table_name).await?;

        Ok(group_by_table(triggers.into_iter().map(|t| {
            (
                t.table_name.clone(),
                PostgresTrigger {
                    name: t.name,
                    oid: t.oid,
                    table_name: t.table_name,
                    function_name: t.function_name,
                },
            )
        })))
    }
}
