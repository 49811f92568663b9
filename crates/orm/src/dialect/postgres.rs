//! PostgreSQL vocabulary
//!
//! Postgres has no unsigned or one-byte integers, so those kinds become
//! checked `smallint`/`integer`/`bigint` columns. `%COL%` is replaced with the
//! column name when the column definition is rendered.

pub(super) const TYPES: &[(&str, &str)] = &[
    ("auto", "serial NOT NULL PRIMARY KEY"),
    ("pk", "NOT NULL PRIMARY KEY"),
    ("bool", "bool"),
    ("string", "varchar(%d)"),
    ("string-char", "char(%d)"),
    ("string-text", "text"),
    ("time.Time-clock", "time"),
    ("time.Time-date", "date"),
    ("time.Time", "timestamp with time zone"),
    ("time.Time-precision", "timestamp(%d) with time zone"),
    ("int8", r#"smallint CHECK("%COL%" >= -127 AND "%COL%" <= 128)"#),
    ("int16", "smallint"),
    ("int32", "integer"),
    ("int64", "bigint"),
    ("uint8", r#"smallint CHECK("%COL%" >= 0 AND "%COL%" <= 255)"#),
    ("uint16", r#"integer CHECK("%COL%" >= 0)"#),
    ("uint32", r#"bigint CHECK("%COL%" >= 0)"#),
    ("uint64", r#"bigint CHECK("%COL%" >= 0)"#),
    ("float64", "double precision"),
    ("float64-decimal", "numeric(%d, %d)"),
    ("json", "json"),
    ("jsonb", "jsonb"),
];

pub(super) const OPERATORS: &[(&str, &str)] = &[
    ("exact", "= ?"),
    ("iexact", "= UPPER(?)"),
    ("contains", "LIKE ?"),
    ("icontains", "LIKE UPPER(?)"),
    ("gt", "> ?"),
    ("gte", ">= ?"),
    ("lt", "< ?"),
    ("lte", "<= ?"),
    ("eq", "= ?"),
    ("ne", "!= ?"),
    ("startswith", "LIKE ?"),
    ("endswith", "LIKE ?"),
    ("istartswith", "LIKE UPPER(?)"),
    ("iendswith", "LIKE UPPER(?)"),
];
