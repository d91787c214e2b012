use std::collections::HashMap;
use std::future::Future;
use crate::{GadgetError, Result};

/// A single value read from a catalog row.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum CatalogValue {
    Text(String),
    Int(i64),
    Null,
}

impl From<&str> for CatalogValue {
    fn from(value: &str) -> Self {
        CatalogValue::Text(value.to_string())
    }
}

impl From<String> for CatalogValue {
    fn from(value: String) -> Self {
        CatalogValue::Text(value)
    }
}

impl From<i64> for CatalogValue {
    fn from(value: i64) -> Self {
        CatalogValue::Int(value)
    }
}

impl<T: Into<CatalogValue>> From<Option<T>> for CatalogValue {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => v.into(),
            None => CatalogValue::Null,
        }
    }
}

/// One row returned by a catalog query, keyed by column name.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct CatalogRow {
    values: HashMap<String, CatalogValue>,
}

impl CatalogRow {
    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<CatalogValue>) {
        self.values.insert(column.into(), value.into());
    }

    pub fn get(&self, column: &str) -> Option<&CatalogValue> {
        self.values.get(column)
    }

    fn try_get_value(&self, column: &str) -> Result<&CatalogValue> {
        self.get(column)
            .ok_or_else(|| GadgetError::MissingColumn(column.to_string()))
    }

    pub fn try_get_text(&self, column: &str) -> Result<String> {
        match self.try_get_value(column)? {
            CatalogValue::Text(s) => Ok(s.clone()),
            _ => Err(GadgetError::UnexpectedValueType {
                column: column.to_string(),
                expected: "text",
            }),
        }
    }

    /// Reads an integer, accepting the textual form the catalog prints as well.
    pub fn try_get_int(&self, column: &str) -> Result<i64> {
        let unexpected = || GadgetError::UnexpectedValueType {
            column: column.to_string(),
            expected: "integer",
        };

        match self.try_get_value(column)? {
            CatalogValue::Int(i) => Ok(*i),
            CatalogValue::Text(s) => s.trim().parse().map_err(|_| unexpected()),
            CatalogValue::Null => Err(unexpected()),
        }
    }

    pub(crate) fn try_get_enum_value<T: FromPgChar>(&self, column: &str) -> Result<T> {
        let value = self.try_get_text(column)?;
        let mut chars = value.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => T::from_pg_char(c),
            _ => Err(GadgetError::MalformedValue {
                value,
                reason: "expected a single character catalog code",
            }),
        }
    }
}

impl<K: Into<String>, V: Into<CatalogValue>> FromIterator<(K, V)> for CatalogRow {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut row = CatalogRow::default();
        for (k, v) in iter {
            row.insert(k, v);
        }
        row
    }
}

/// The seam between the metadata extractor and whatever actually talks to the database.
///
/// Implementations run read-only, parameterized queries and hand back fully
/// materialized rows. Connection lifecycle belongs to the implementation.
pub trait CatalogClient {
    fn query(&self, sql: &str, params: &[&str]) -> impl Future<Output = Result<Vec<CatalogRow>>>;
}

pub trait FromCatalogRow: Sized {
    fn from_catalog_row(row: CatalogRow) -> Result<Self>;
}

pub(crate) trait FromPgChar: Sized {
    fn from_pg_char(c: char) -> Result<Self>;
}
