use std::collections::BTreeMap;
use tracing::instrument;
use crate::catalog_client::{CatalogClient, CatalogRow, FromCatalogRow};
use crate::schema_reader::{filter_by_table, group_by_table, SchemaReader};
use crate::{ConstraintKind, PostgresConstraint};

pub struct ConstraintResult {
    pub table_name: String,
    pub constraint_name: String,
    pub constraint_type: ConstraintKind,
}

impl FromCatalogRow for ConstraintResult {
    fn from_catalog_row(row: CatalogRow) -> crate::Result<Self> {
        Ok(Self {
            table_name: row.try_get_text("table_name")?,
            constraint_name: row.try_get_text("constraint_name")?,
            constraint_type: row.try_get_enum_value("constraint_type")?,
        })
    }
}

//language=postgresql
const CONSTRAINTS_QUERY: &str = r#"
select c.relname::text    as table_name,
       con.conname::text  as constraint_name,
       con.contype::text  as constraint_type
from pg_catalog.pg_constraint con
         join pg_catalog.pg_class c on con.conrelid = c.oid
         join pg_catalog.pg_namespace ns on c.relnamespace = ns.oid
where c.relkind in ('r', 'p')
  and ns.nspname = $1"#;

impl<C: CatalogClient> SchemaReader<'_, C> {
    #[instrument(skip_all)]
    pub(in crate::schema_reader) async fn get_constraints(&self, table_name: Option<&str>) -> crate::Result<Vec<ConstraintResult>> {
        let mut sql = CONSTRAINTS_QUERY.to_string();
        let mut params = vec![self.schema_name()];

        filter_by_table(&mut sql, &mut params, "c.relname", table_name);
        sql.push_str("\norder by c.relname, con.conname;");

        self.get_results(&sql, &params).await
    }

    /// The constraints of every table, or only of `table_name`.
    ///
    /// Constraint types this crate does not know end up as [`ConstraintKind::Unknown`].
    #[instrument(skip_all)]
    pub async fn list_constraints(&self, table_name: Option<&str>) -> crate::Result<BTreeMap<String, Vec<PostgresConstraint>>> {
        let constraints = self.get_constraints(table_name).await?;

        Ok(group_by_table(constraints.into_iter().map(|c| {
            (
                c.table_name,
                PostgresConstraint {
                    name: c.constraint_name,
                    kind: c.constraint_type,
                },
            )
        })))
    }
}
