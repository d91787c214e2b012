use serde::Serialize;

#[derive(Debug, Eq, PartialEq, Default, Clone, Serialize)]
pub struct PostgresSequence {
    pub name: String,
    pub oid: i64,
}
