use tokio::task::JoinHandle;
use tokio_postgres::types::{FromSqlOwned, ToSql, Type};
use tokio_postgres::{Client, NoTls, Row};
use tracing::debug;
use crate::catalog_client::{CatalogClient, CatalogRow, CatalogValue};
use crate::{GadgetError, Result};

pub struct PostgresClientWrapper {
    client: Client,
    join_handle: JoinHandle<Result<()>>,
    version: i32,
}

impl PostgresClientWrapper {
    pub async fn new(connection_string: &str) -> Result<Self> {
        let (client, connection) =
            tokio_postgres::connect(connection_string, NoTls).await?;

        // The connection object performs the actual communication with the database,
        // so spawn it off to run on its own.
        let join_handle = tokio::spawn(async move {
            match connection.await {
                Err(e) => Err(GadgetError::PostgresError(e)),
                Ok(_) => Ok(())
            }
        });

        let mut wrapper = PostgresClientWrapper {
            client,
            join_handle,
            version: 0,
        };

        let server_version_num: String = wrapper.get_single_result("SHOW server_version_num;").await?;
        wrapper.version = parse_server_version(&server_version_num)?;

        Ok(wrapper)
    }

    pub async fn execute_non_query(&self, sql: &str) -> Result {
        self.client.batch_execute(sql).await.map_err(|e| GadgetError::PostgresErrorWithQuery {
            source: e,
            query: sql.to_string(),
        })?;

        Ok(())
    }

    pub async fn get_single_results<T: FromSqlOwned>(&self, sql: &str) -> Result<Vec<T>> {
        let rows = self.client.query(sql, &[]).await.map_err(|e| GadgetError::PostgresErrorWithQuery {
            source: e,
            query: sql.to_string(),
        })?;

        let mut output = Vec::with_capacity(rows.len());
        for row in rows {
            output.push(row.try_get(0)?);
        }

        Ok(output)
    }

    pub async fn get_single_result<T: FromSqlOwned>(&self, sql: &str) -> Result<T> {
        let results = self.get_single_results(sql).await?;
        if results.len() != 1 {
            return Err(GadgetError::InvalidNumberOfResults {
                actual: results.len(),
                expected: 1,
            });
        }

        results.into_iter().next().ok_or(GadgetError::InvalidNumberOfResults {
            actual: 0,
            expected: 1,
        })
    }

    /// The server version as `major * 10`, so 16.x gives `160`.
    pub fn version(&self) -> i32 {
        self.version
    }
}

impl CatalogClient for PostgresClientWrapper {
    async fn query(&self, sql: &str, params: &[&str]) -> Result<Vec<CatalogRow>> {
        let params: Vec<&(dyn ToSql + Sync)> = params.iter().map(|p| p as &(dyn ToSql + Sync)).collect();

        let rows = self.client.query(sql, &params).await.map_err(|e| GadgetError::PostgresErrorWithQuery {
            source: e,
            query: sql.to_string(),
        })?;

        debug!(rows = rows.len(), "catalog query finished");

        rows.iter().map(to_catalog_row).collect()
    }
}

/// Turns `server_version_num`, e.g. `160004`, into `major * 10`.
fn parse_server_version(server_version_num: &str) -> Result<i32> {
    let version: i32 = server_version_num
        .trim()
        .parse()
        .map_err(|_| GadgetError::InvalidPostgresVersionResponse)?;

    if version < 120000 {
        return Err(GadgetError::UnsupportedPostgresVersion(version));
    }

    Ok(version / 1000)
}

fn to_catalog_row(row: &Row) -> Result<CatalogRow> {
    let mut catalog_row = CatalogRow::default();

    for (idx, column) in row.columns().iter().enumerate() {
        let ty = column.type_();

        let value: CatalogValue = if *ty == Type::INT2 {
            row.try_get::<_, Option<i16>>(idx)?.map(i64::from).into()
        } else if *ty == Type::INT4 {
            row.try_get::<_, Option<i32>>(idx)?.map(i64::from).into()
        } else if *ty == Type::INT8 {
            row.try_get::<_, Option<i64>>(idx)?.into()
        } else if *ty == Type::OID {
            row.try_get::<_, Option<u32>>(idx)?.map(i64::from).into()
        } else if *ty == Type::TEXT || *ty == Type::VARCHAR || *ty == Type::NAME || *ty == Type::BPCHAR {
            row.try_get::<_, Option<String>>(idx)?.into()
        } else if *ty == Type::CHAR {
            row.try_get::<_, Option<i8>>(idx)?
                .map(|c| (c as u8 as char).to_string())
                .into()
        } else {
            return Err(GadgetError::UnsupportedColumnType {
                column: column.name().to_string(),
                type_name: ty.name().to_string(),
            });
        };

        catalog_row.insert(column.name(), value);
    }

    Ok(catalog_row)
}

impl Drop for PostgresClientWrapper {
    fn drop(&mut self) {
        self.join_handle.abort();
    }
}
