use serde::Serialize;

#[derive(Debug, Eq, PartialEq, Default, Clone, Serialize)]
pub struct PostgresFunction {
    pub name: String,
    pub oid: i64,
    /// Type OIDs of the declared arguments, in order.
    pub arg_types: Vec<i64>,
}
