use anyhow::Result;
use gadget::PostgresClientWrapper;

/// Drops the databases left behind by failed `pg_test` runs on every local test instance.
#[tokio::main]
async fn main() -> Result<()> {
    let pg_ports = 12..=17u16;

    for version in pg_ports {
        let port = 5400 + version;
        let conn_str = format!(
            "host=localhost port={} user=postgres password=passw0rd dbname=postgres",
            port
        );

        let conn = match PostgresClientWrapper::new(&conn_str).await {
            Ok(conn) => conn,
            Err(e) => {
                println!("Skipping port {}: {}", port, e);
                continue;
            }
        };

        let databases = conn
            .get_single_results::<String>(
                "select datname::text from pg_database
where datname like 'test_db_%'
",
            )
            .await?;

        for db_name in databases {
            println!("Dropping database {}", db_name);

            if conn.version() >= 130 {
                conn.execute_non_query(&format!("drop database {} with (force);", db_name))
                    .await?;
            } else {
                conn.execute_non_query(&format!("SELECT pg_terminate_backend(pid) FROM pg_stat_activity WHERE datname = '{}' AND pid != pg_backend_pid()", db_name)).await?;
                conn.execute_non_query(&format!("drop database {};", db_name))
                    .await?;
            }
        }

        println!("Finished port {}", port);
    }

    Ok(())
}
