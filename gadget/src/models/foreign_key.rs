use serde::Serialize;

/// A foreign key owned by a single table.
///
/// `columns[i]` is the local column matching `referenced_columns[i]` in `referenced_table`.
#[derive(Debug, Eq, PartialEq, Default, Clone, Serialize)]
pub struct PostgresForeignKey {
    pub name: String,
    pub columns: Vec<String>,
    pub referenced_table: String,
    pub referenced_columns: Vec<String>,
}

impl PostgresForeignKey {
    pub fn column_pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.columns
            .iter()
            .zip(self.referenced_columns.iter())
            .map(|(local, referenced)| (local.as_str(), referenced.as_str()))
    }

    pub fn is_self_reference(&self, owning_table: &str) -> bool {
        self.referenced_table == owning_table
    }
}
