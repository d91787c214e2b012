use thiserror::Error;

#[derive(Error, Debug)]
pub enum GadgetError {
    #[error("Error from postgres: `{0}`")]
    PostgresError(#[from] tokio_postgres::Error),

    #[error("Error from postgres: `{query}` when executing query: `{source}`")]
    PostgresErrorWithQuery {
        query: String,
        #[source]
        source: tokio_postgres::Error,
    },

    #[error("Postgres version {0} is not supported, at least 12 is required")]
    UnsupportedPostgresVersion(i32),

    #[error("Could not read the server version from the postgres response")]
    InvalidPostgresVersionResponse,

    #[error("Invalid number of results returned from query. Expected `{expected}`, got `{actual}`")]
    InvalidNumberOfResults {
        actual: usize,
        expected: usize,
    },

    #[error("Column `{0}` is missing from the catalog row")]
    MissingColumn(String),

    #[error("Column `{column}` has an unexpected value, expected {expected}")]
    UnexpectedValueType {
        column: String,
        expected: &'static str,
    },

    #[error("Column `{column}` has the type `{type_name}` which cannot be read from the catalog")]
    UnsupportedColumnType {
        column: String,
        type_name: String,
    },

    #[error("Malformed catalog value `{value}`: {reason}")]
    MalformedValue {
        value: String,
        reason: &'static str,
    },

    #[error("Foreign key `{constraint_name}` on `{table_name}` has {columns} local columns but {referenced_columns} referenced columns")]
    MismatchedForeignKeyColumns {
        constraint_name: String,
        table_name: String,
        columns: usize,
        referenced_columns: usize,
    },

    #[error("Foreign key `{constraint_name}` refers to column position {position} of `{table_name}`, which does not exist")]
    UnresolvedColumnReference {
        constraint_name: String,
        table_name: String,
        position: i64,
    },

    #[error("Dependency cycle detected: {}", .cycle.join(" -> "))]
    CycleDetected {
        cycle: Vec<String>,
    },

    #[error("Table `{table}` depends on `{dependency}`, which is not part of the dependency graph")]
    UnknownDependency {
        table: String,
        dependency: String,
    },

    #[error("io error: `{0}`")]
    IoError(#[from] std::io::Error),
}

pub type Result<T = ()> = std::result::Result<T, GadgetError>;
