use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about)]
#[command(propagate_version = true)]
/// Reads the Postgres catalog of a single schema: tables, columns, constraints and
/// the order tables have to be created in to satisfy their foreign keys.
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub db_args: DbArgs,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// List the tables of the schema
    Tables,
    /// List the columns of every table, in column order
    Columns {
        /// Only list the columns of this table
        #[arg(long)]
        table: Option<String>,

        /// Include dropped columns, which Postgres keeps around under a placeholder name
        #[arg(long)]
        include_dropped: bool,
    },
    /// List the foreign keys of every table, with their columns resolved
    ForeignKeys {
        /// Only list the foreign keys of this table
        #[arg(long)]
        table: Option<String>,
    },
    /// List the constraints of every table
    Constraints {
        /// Only list the constraints of this table
        #[arg(long)]
        table: Option<String>,
    },
    /// List the functions of the schema
    Functions,
    /// List the sequences of the schema
    Sequences,
    /// List the user defined triggers of every table
    Triggers {
        /// Only list the triggers of this table
        #[arg(long)]
        table: Option<String>,
    },
    /// List the types of the schema
    Types,
    /// Print every table together with the tables it references
    Dependencies,
    /// Print the tables in an order where every table comes after the tables it references
    Order,
    /// Print the dependency graph in Graphviz dot format
    Graph,
}

#[derive(Args, Debug, Clone)]
pub struct DbArgs {
    /// The host of the database to read
    #[arg(long, global = true, env = "GADGET_DB_HOST", default_value = "localhost")]
    pub db_host: String,

    /// The port of the database to read
    #[arg(long, global = true, env = "GADGET_DB_PORT", default_value_t = 5432)]
    pub db_port: u16,

    /// The username to use when connecting to the database
    #[arg(long, global = true, env = "GADGET_DB_USER", default_value = "postgres")]
    pub db_user: String,

    /// The password to use when connecting to the database
    #[arg(long, global = true, env = "GADGET_DB_PASSWORD", default_value = "")]
    pub db_password: String,

    /// The name of the database to read
    #[arg(long, global = true, env = "GADGET_DB_NAME", default_value = "postgres")]
    pub db_name: String,

    /// The schema to read
    #[arg(long, global = true, env = "GADGET_SCHEMA", default_value = "public")]
    pub schema: String,
}

impl DbArgs {
    pub(crate) fn get_connection_string(&self) -> String {
        let mut connection_string = format!("host={} port={} user={} dbname={}", self.db_host, self.db_port, self.db_user, self.db_name);

        if !self.db_password.is_empty() {
            connection_string.push_str(&format!(" password={}", self.db_password));
        }

        connection_string
    }

    #[cfg(test)]
    pub(crate) fn from_test_helper(helper: &gadget::test_helpers::TestHelper) -> Self {
        Self {
            db_host: "localhost".to_string(),
            db_port: helper.port,
            db_user: "postgres".to_string(),
            db_password: "passw0rd".to_string(),
            db_name: helper.test_db_name.clone(),
            schema: "public".to_string(),
        }
    }
}
