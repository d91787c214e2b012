use std::collections::BTreeMap;
use tracing::{instrument, trace};
use crate::catalog_client::{CatalogClient, CatalogRow, FromCatalogRow};
use crate::schema_reader::{filter_by_table, group_by_table, ColumnListOptions, SchemaReader};
use crate::{GadgetError, PostgresForeignKey, PostgresTable, Result};

pub struct ForeignKeyResult {
    pub constraint_name: String,
    pub source_table_name: String,
    /// Attribute numbers of the source columns, as the catalog prints them, e.g. `{1,3}`.
    pub source_columns: String,
    pub target_table_name: String,
    pub target_columns: String,
}

impl FromCatalogRow for ForeignKeyResult {
    fn from_catalog_row(row: CatalogRow) -> Result<Self> {
        Ok(Self {
            constraint_name: row.try_get_text("constraint_name")?,
            source_table_name: row.try_get_text("source_table_name")?,
            source_columns: row.try_get_text("source_columns")?,
            target_table_name: row.try_get_text("target_table_name")?,
            target_columns: row.try_get_text("target_columns")?,
        })
    }
}

//language=postgresql
const FOREIGN_KEYS_QUERY: &str = r#"
select con.conname::text  as constraint_name,
       tab.relname::text  as source_table_name,
       con.conkey::text   as source_columns,
       target.relname::text as target_table_name,
       con.confkey::text  as target_columns
from pg_catalog.pg_constraint con
         join pg_catalog.pg_class tab on con.conrelid = tab.oid
         join pg_catalog.pg_namespace tab_ns on tab.relnamespace = tab_ns.oid
         join pg_catalog.pg_class target on con.confrelid = target.oid
         join pg_catalog.pg_namespace target_ns on target.relnamespace = target_ns.oid
where con.contype = 'f'
  and tab.relkind in ('r', 'p')
  and target.relkind in ('r', 'p')
  and tab_ns.nspname = $1
  and target_ns.nspname = $1"#;

impl<C: CatalogClient> SchemaReader<'_, C> {
    #[instrument(skip_all)]
    pub(in crate::schema_reader) async fn get_foreign_keys(&self, table_name: Option<&str>) -> Result<Vec<ForeignKeyResult>> {
        let mut sql = FOREIGN_KEYS_QUERY.to_string();
        let mut params = vec![self.schema_name()];

        filter_by_table(&mut sql, &mut params, "tab.relname", table_name);
        sql.push_str("\norder by tab.relname, con.conname;");

        self.get_results(&sql, &params).await
    }

    /// The foreign keys of every table, or only of `table_name`, with column positions resolved to names.
    #[instrument(skip_all)]
    pub async fn list_foreign_keys(&self, table_name: Option<&str>) -> Result<BTreeMap<String, Vec<PostgresForeignKey>>> {
        let foreign_keys = self.get_foreign_keys(table_name).await?;
        if foreign_keys.is_empty() {
            return Ok(BTreeMap::new());
        }

        // Positions count dropped columns too, so resolve against the full column list.
        let columns = self
            .list_columns(None, ColumnListOptions { include_dropped: true })
            .await?;

        let mut resolved = Vec::with_capacity(foreign_keys.len());
        for fk in foreign_keys {
            let local_columns = resolve_column_positions(
                &fk.constraint_name,
                &fk.source_table_name,
                columns_of(&columns, &fk.source_table_name),
                &fk.source_columns,
            )?;
            let referenced_columns = resolve_column_positions(
                &fk.constraint_name,
                &fk.target_table_name,
                columns_of(&columns, &fk.target_table_name),
                &fk.target_columns,
            )?;

            if local_columns.len() != referenced_columns.len() {
                return Err(GadgetError::MismatchedForeignKeyColumns {
                    constraint_name: fk.constraint_name,
                    table_name: fk.source_table_name,
                    columns: local_columns.len(),
                    referenced_columns: referenced_columns.len(),
                });
            }

            let foreign_key = PostgresForeignKey {
                name: fk.constraint_name,
                columns: local_columns,
                referenced_table: fk.target_table_name,
                referenced_columns,
            };

            trace!(
                table = %fk.source_table_name,
                foreign_key = %foreign_key.name,
                columns = ?foreign_key.column_pairs().collect::<Vec<_>>(),
                "resolved foreign key"
            );

            resolved.push((fk.source_table_name, foreign_key));
        }

        Ok(group_by_table(resolved))
    }
}

fn columns_of<'c>(columns: &'c BTreeMap<String, PostgresTable>, table_name: &str) -> &'c [String] {
    columns
        .get(table_name)
        .map(|t| t.columns.as_slice())
        .unwrap_or_default()
}

/// Parses a catalog `int2[]` printed as text, such as `{1,3}`.
pub(crate) fn parse_position_array(raw: &str) -> Result<Vec<i64>> {
    let malformed = |reason| GadgetError::MalformedValue {
        value: raw.to_string(),
        reason,
    };

    let inner = raw
        .trim()
        .strip_prefix('{')
        .and_then(|s| s.strip_suffix('}'))
        .ok_or_else(|| malformed("expected an array enclosed in braces"))?;

    if inner.trim().is_empty() {
        return Ok(vec![]);
    }

    inner
        .split(',')
        .map(|p| p.trim().parse::<i64>().map_err(|_| malformed("expected integer positions")))
        .collect()
}

/// Maps 1-based column positions to the names in `columns`.
///
/// `columns` has to be the complete column list of the table, dropped columns included.
pub(crate) fn resolve_column_positions(
    constraint_name: &str,
    table_name: &str,
    columns: &[String],
    raw_positions: &str,
) -> Result<Vec<String>> {
    parse_position_array(raw_positions)?
        .into_iter()
        .map(|position| {
            usize::try_from(position)
                .ok()
                .and_then(|p| p.checked_sub(1))
                .and_then(|idx| columns.get(idx))
                .cloned()
                .ok_or_else(|| GadgetError::UnresolvedColumnReference {
                    constraint_name: constraint_name.to_string(),
                    table_name: table_name.to_string(),
                    position,
                })
        })
        .collect()
}
