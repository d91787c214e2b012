use serde::Serialize;

#[derive(Debug, Eq, PartialEq, Default, Clone, Serialize)]
pub struct PostgresTable {
    pub name: String,
    pub oid: i64,
    /// Column names in attribute number order.
    pub columns: Vec<String>,
}
