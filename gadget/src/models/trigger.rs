use serde::Serialize;

#[derive(Debug, Eq, PartialEq, Default, Clone, Serialize)]
pub struct PostgresTrigger {
    pub name: String,
    pub oid: i64,
    pub table_name: String,
    pub function_name: String,
}
