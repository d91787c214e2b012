use std::collections::BTreeMap;
use tracing::instrument;
use crate::catalog_client::{CatalogClient, CatalogRow, FromCatalogRow};
use crate::schema_reader::{define_working_query, SchemaReader};
use crate::PostgresSequence;

pub struct SequenceResult {
    pub oid: i64,
    pub sequence_name: String,
}

impl FromCatalogRow for SequenceResult {
    fn from_catalog_row(row: CatalogRow) -> crate::Result<Self> {
        Ok(Self {
            oid: row.try_get_int("oid")?,
            sequence_name: row.try_get_text("sequence_name")?,
        })
    }
}

//language=postgresql
define_working_query!(get_sequences, SequenceResult, r#"
select c.oid::bigint   as oid,
       c.relname::text as sequence_name
from pg_catalog.pg_class c
         join pg_catalog.pg_namespace ns on c.relnamespace = ns.oid
where c.relkind = 'S'
  and ns.nspname = $1
order by c.relname;
"#);

impl<C: CatalogClient> SchemaReader<'_, C> {
    #[instrument(skip_all)]
    pub async fn list_sequences(&self) -> crate::Result<BTreeMap<String, PostgresSequence>> {
        let sequences = self.get_sequences().await?;

        Ok(sequences
            .into_iter()
            .map(|s| {
                let sequence = PostgresSequence {
                    name: s.sequence_name.clone(),
                    oid: s.oid,
                };
                (s.sequence_name, sequence)
            })
            .collect())
    }
}
