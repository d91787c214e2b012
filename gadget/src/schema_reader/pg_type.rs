use std::collections::BTreeMap;
use tracing::instrument;
use crate::catalog_client::{CatalogClient, CatalogRow, FromCatalogRow};
use crate::schema_reader::{define_working_query, SchemaReader};
use crate::PostgresType;

pub struct TypeResult {
    pub oid: i64,
    pub type_name: String,
}

impl FromCatalogRow for TypeResult {
    fn from_catalog_row(row: CatalogRow) -> crate::Result<Self> {
        Ok(Self {
            oid: row.try_get_int("oid")?,
            type_name: row.try_get_text("type_name")?,
        })
    }
}

//language=postgresql
define_working_query!(get_types, TypeResult, r#"
select t.oid::bigint   as oid,
       t.typname::text as type_name
from pg_catalog.pg_type t
         join pg_catalog.pg_namespace ns on t.typnamespace = ns.oid
where ns.nspname = $1
order by t.typname;
"#);

impl<C: CatalogClient> SchemaReader<'_, C> {
    /// The types of the schema, including the row and array types Postgres creates for tables.
    #[instrument(skip_all)]
    pub async fn list_types(&self) -> crate::Result<BTreeMap<String, PostgresType>> {
        let types = self.get_types().await?;

        Ok(types
            .into_iter()
            .map(|t| {
                let pg_type = PostgresType {
                    name: t.type_name.clone(),
                    oid: t.oid,
                };
                (t.type_name, pg_type)
            })
            .collect())
    }
}
