//! Per-database SQL vocabulary
//!
//! Each driver owns a constant column type table keyed by semantic type key
//! (`int32`, `string`, `time.Time-date`, ...) and an operator table keyed by
//! lookup name (`exact`, `icontains`, ...). Type templates may contain `%d`
//! placeholders for sizes and precisions and `%COL%` for the column name.

mod mysql;
mod oracle;
mod postgres;
mod sqlite;

use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Supported database drivers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Driver {
    MySQL,
    #[serde(alias = "sqlite3")]
    SQLite,
    Oracle,
    #[serde(alias = "postgres")]
    PostgreSQL,
    TiDB,
}

impl std::fmt::Display for Driver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Driver::MySQL => write!(f, "mysql"),
            Driver::SQLite => write!(f, "sqlite3"),
            Driver::Oracle => write!(f, "oracle"),
            Driver::PostgreSQL => write!(f, "postgres"),
            Driver::TiDB => write!(f, "tidb"),
        }
    }
}

impl std::str::FromStr for Driver {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mysql" => Ok(Driver::MySQL),
            "sqlite" | "sqlite3" => Ok(Driver::SQLite),
            "oracle" | "oci8" => Ok(Driver::Oracle),
            "postgres" | "postgresql" => Ok(Driver::PostgreSQL),
            "tidb" => Ok(Driver::TiDB),
            _ => Err(ConfigError::InvalidValue {
                field: "driver".to_string(),
                value: s.to_string(),
                expected: "mysql, sqlite3, oracle, postgres or tidb".to_string(),
            }),
        }
    }
}

impl Driver {
    pub const ALL: [Driver; 5] = [
        Driver::MySQL,
        Driver::SQLite,
        Driver::Oracle,
        Driver::PostgreSQL,
        Driver::TiDB,
    ];

    /// Identifier quote character for tables and columns
    pub fn quote(&self) -> &'static str {
        match self {
            Driver::MySQL | Driver::SQLite | Driver::TiDB => "`",
            Driver::PostgreSQL | Driver::Oracle => "\"",
        }
    }

    pub fn type_map(&self) -> &'static DialectTypeMap {
        match self {
            Driver::MySQL | Driver::TiDB => &MYSQL,
            Driver::SQLite => &SQLITE,
            Driver::Oracle => &ORACLE,
            Driver::PostgreSQL => &POSTGRES,
        }
    }

    /// Only MySQL tables carry an `ENGINE=` clause
    pub fn supports_engine(&self) -> bool {
        matches!(self, Driver::MySQL)
    }

    /// Drivers whose auto clause already contains the column type
    pub fn auto_includes_type(&self) -> bool {
        matches!(self, Driver::SQLite | Driver::PostgreSQL)
    }

    pub fn supports_json(&self) -> bool {
        matches!(self, Driver::PostgreSQL)
    }
}

/// Read-only column type and operator tables of one dialect
#[derive(Debug)]
pub struct DialectTypeMap {
    types: HashMap<&'static str, &'static str>,
    operators: HashMap<&'static str, &'static str>,
}

impl DialectTypeMap {
    fn from_tables(types: &[(&'static str, &'static str)], operators: &[(&'static str, &'static str)]) -> Self {
        Self {
            types: types.iter().copied().collect(),
            operators: operators.iter().copied().collect(),
        }
    }

    /// Native type template for a type key
    pub fn get(&self, key: &str) -> Option<&'static str> {
        self.types.get(key).copied()
    }

    /// SQL fragment for a lookup operator, `None` when the dialect lacks it
    pub fn operator(&self, name: &str) -> Option<&'static str> {
        self.operators.get(name).copied()
    }

    pub fn operator_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.operators.keys().copied()
    }
}

static MYSQL: Lazy<DialectTypeMap> =
    Lazy::new(|| DialectTypeMap::from_tables(mysql::TYPES, mysql::OPERATORS));
static SQLITE: Lazy<DialectTypeMap> =
    Lazy::new(|| DialectTypeMap::from_tables(sqlite::TYPES, sqlite::OPERATORS));
static POSTGRES: Lazy<DialectTypeMap> =
    Lazy::new(|| DialectTypeMap::from_tables(postgres::TYPES, postgres::OPERATORS));
static ORACLE: Lazy<DialectTypeMap> =
    Lazy::new(|| DialectTypeMap::from_tables(oracle::TYPES, oracle::OPERATORS));

/// Replace `%d` placeholders in order with the given numbers
pub(crate) fn fill_placeholders(template: &str, values: &[u32]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut values = values.iter();
    let mut rest = template;
    while let Some(pos) = rest.find("%d") {
        out.push_str(&rest[..pos]);
        match values.next() {
            Some(v) => out.push_str(&v.to_string()),
            None => out.push_str("%d"),
        }
        rest = &rest[pos + 2..];
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_driver_from_str() {
        assert_eq!("mysql".parse::<Driver>().unwrap(), Driver::MySQL);
        assert_eq!("SQLite3".parse::<Driver>().unwrap(), Driver::SQLite);
        assert_eq!("postgresql".parse::<Driver>().unwrap(), Driver::PostgreSQL);
        assert_eq!("tidb".parse::<Driver>().unwrap(), Driver::TiDB);
        assert!("mssql".parse::<Driver>().is_err());
    }

    #[test]
    fn test_driver_display_round_trips() {
        for driver in Driver::ALL {
            assert_eq!(driver.to_string().parse::<Driver>().unwrap(), driver);
        }
    }

    #[test]
    fn test_quotes() {
        assert_eq!(Driver::MySQL.quote(), "`");
        assert_eq!(Driver::SQLite.quote(), "`");
        assert_eq!(Driver::PostgreSQL.quote(), "\"");
        assert_eq!(Driver::Oracle.quote(), "\"");
    }

    #[test]
    fn test_every_dialect_has_core_types() {
        for driver in Driver::ALL {
            let map = driver.type_map();
            for key in ["auto", "pk", "string", "int32", "int64", "float64-decimal"] {
                assert!(map.get(key).is_some(), "{} lacks {}", driver, key);
            }
        }
    }

    #[test]
    fn test_tidb_shares_mysql_tables() {
        assert_eq!(Driver::TiDB.type_map().get("string-text"), Some("longtext"));
        assert_eq!(Driver::TiDB.type_map().operator("contains"), Some("LIKE BINARY ?"));
        assert!(!Driver::TiDB.supports_engine());
    }

    #[test]
    fn test_operators() {
        assert_eq!(Driver::PostgreSQL.type_map().operator("iexact"), Some("= UPPER(?)"));
        assert_eq!(Driver::SQLite.type_map().operator("icontains"), Some("LIKE ? ESCAPE '\\'"));
        assert_eq!(Driver::Oracle.type_map().operator("contains"), None);
        assert_eq!(Driver::Oracle.type_map().operator_names().count(), 5);
    }

    #[test]
    fn test_fill_placeholders() {
        assert_eq!(fill_placeholders("varchar(%d)", &[30]), "varchar(30)");
        assert_eq!(fill_placeholders("numeric(%d, %d)", &[10, 2]), "numeric(10, 2)");
        assert_eq!(fill_placeholders("decimal", &[10, 2]), "decimal");
    }
}
