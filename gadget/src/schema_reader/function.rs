use std::collections::BTreeMap;
use tracing::instrument;
use crate::catalog_client::{CatalogClient, CatalogRow, FromCatalogRow};
use crate::schema_reader::{define_working_query, SchemaReader};
use crate::{GadgetError, PostgresFunction};

pub struct FunctionResult {
    pub oid: i64,
    pub function_name: String,
    pub arg_types: Vec<i64>,
}

impl FromCatalogRow for FunctionResult {
    fn from_catalog_row(row: CatalogRow) -> crate::Result<Self> {
        Ok(Self {
            oid: row.try_get_int("oid")?,
            function_name: row.try_get_text("function_name")?,
            arg_types: parse_oid_vector(&row.try_get_text("arg_types")?)?,
        })
    }
}

/// Parses an `oidvector` printed as text: space separated, empty without arguments.
fn parse_oid_vector(raw: &str) -> crate::Result<Vec<i64>> {
    raw.split_whitespace()
        .map(|oid| {
            oid.parse().map_err(|_| GadgetError::MalformedValue {
                value: raw.to_string(),
                reason: "expected space separated type oids",
            })
        })
        .collect()
}

//language=postgresql
define_working_query!(get_functions, FunctionResult, r#"
select p.oid::bigint          as oid,
       p.proname::text        as function_name,
       p.proargtypes::text    as arg_types
from pg_catalog.pg_proc p
         join pg_catalog.pg_namespace ns on p.pronamespace = ns.oid
where ns.nspname = $1
order by p.proname, p.oid;
"#);

impl<C: CatalogClient> SchemaReader<'_, C> {
    /// The functions of the schema. Overloads share a name, the one with the highest oid is kept.
    #[instrument(skip_all)]
    pub async fn list_functions(&self) -> crate::Result<BTreeMap<String, PostgresFunction>> {
        let functions = self.get_functions().await?;

        Ok(functions
            .into_iter()
            .map(|f| {
                let function = PostgresFunction {
                    name: f.function_name.clone(),
                    oid: f.oid,
                    arg_types: f.arg_types,
                };
                (f.function_name, function)
            })
            .collect())
    }
}
