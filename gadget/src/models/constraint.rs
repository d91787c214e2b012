use std::fmt::{Display, Formatter};
use serde::{Serialize, Serializer};
use tracing::warn;
use crate::catalog_client::FromPgChar;

#[derive(Debug, Eq, PartialEq, Default, Clone, Serialize)]
pub struct PostgresConstraint {
    pub name: String,
    pub kind: ConstraintKind,
}

#[derive(Debug, Eq, PartialEq, Copy, Clone, Default)]
pub enum ConstraintKind {
    #[default]
    Check,
    ForeignKey,
    PrimaryKey,
    Trigger,
    Unique,
    Exclusion,
    /// A `contype` code this crate does not know about yet.
    Unknown(char),
}

impl FromPgChar for ConstraintKind {
    fn from_pg_char(c: char) -> crate::Result<Self> {
        Ok(match c {
            'c' => ConstraintKind::Check,
            'f' => ConstraintKind::ForeignKey,
            'p' => ConstraintKind::PrimaryKey,
            't' => ConstraintKind::Trigger,
            'u' => ConstraintKind::Unique,
            'x' => ConstraintKind::Exclusion,
            _ => {
                warn!(code = %c, "unknown constraint type");
                ConstraintKind::Unknown(c)
            }
        })
    }
}

impl Display for ConstraintKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ConstraintKind::Check => f.write_str("check"),
            ConstraintKind::ForeignKey => f.write_str("foreign key"),
            ConstraintKind::PrimaryKey => f.write_str("primary key"),
            ConstraintKind::Trigger => f.write_str("trigger"),
            ConstraintKind::Unique => f.write_str("unique"),
            ConstraintKind::Exclusion => f.write_str("exclusion"),
            ConstraintKind::Unknown(c) => write!(f, "*** unknown: \"{c}\""),
        }
    }
}

impl Serialize for ConstraintKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
