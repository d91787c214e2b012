use crate::cli::{Commands, DbArgs};
use clap::Parser;
use gadget::{ColumnListOptions, PostgresClientWrapper, ReaderOptions, Result, SchemaReader};
use serde::Serialize;
use std::io::Write;
use tracing::instrument;
use tracing_subscriber::EnvFilter;

mod cli;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = cli::Cli::parse();

    let stdout = std::io::stdout();
    run(cli, &mut stdout.lock()).await?;

    Ok(())
}

#[instrument(skip_all)]
async fn run(cli: cli::Cli, out: &mut impl Write) -> Result<()> {
    let connection = connect(&cli.db_args).await?;
    let reader = SchemaReader::with_options(
        &connection,
        ReaderOptions {
            schema_name: cli.db_args.schema.clone(),
        },
    );

    match cli.command {
        Commands::Tables => write_json(out, &reader.list_tables().await?)?,
        Commands::Columns { table, include_dropped } => {
            let columns = reader
                .list_columns(table.as_deref(), ColumnListOptions { include_dropped })
                .await?;
            write_json(out, &columns)?
        }
        Commands::ForeignKeys { table } => write_json(out, &reader.list_foreign_keys(table.as_deref()).await?)?,
        Commands::Constraints { table } => write_json(out, &reader.list_constraints(table.as_deref()).await?)?,
        Commands::Functions => write_json(out, &reader.list_functions().await?)?,
        Commands::Sequences => write_json(out, &reader.list_sequences().await?)?,
        Commands::Triggers { table } => write_json(out, &reader.list_triggers(table.as_deref()).await?)?,
        Commands::Types => write_json(out, &reader.list_types().await?)?,
        Commands::Dependencies => write_json(out, &reader.dependencies().await?)?,
        Commands::Order => {
            for table in reader.tables_in_dependency_order().await? {
                writeln!(out, "{}", table)?;
            }
        }
        Commands::Graph => write!(out, "{}", reader.dependency_graph().await?)?,
    }

    out.flush()?;

    Ok(())
}

async fn connect(db_args: &DbArgs) -> Result<PostgresClientWrapper> {
    let connection_string = db_args.get_connection_string();

    PostgresClientWrapper::new(&connection_string).await
}

fn write_json<T: Serialize>(out: &mut impl Write, value: &T) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, value).map_err(std::io::Error::from)?;
    writeln!(out)?;
    Ok(())
}
