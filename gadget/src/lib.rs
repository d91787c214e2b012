#[cfg(any(test, feature = "test_utilities"))]
pub mod test_helpers;

mod catalog_client;
mod dependencies;
mod error;
mod models;
mod postgres_client_wrapper;
mod schema_reader;

pub use catalog_client::{CatalogClient, CatalogRow, CatalogValue, FromCatalogRow};
pub use dependencies::*;
pub use error::*;
pub use models::*;
pub use postgres_client_wrapper::PostgresClientWrapper;
pub use schema_reader::{ColumnListOptions, ReaderOptions, SchemaReader};
