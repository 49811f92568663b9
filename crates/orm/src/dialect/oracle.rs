//! Oracle vocabulary
//!
//! Oracle has no TIME type; clock values are stored as TIMESTAMP.

pub(super) const TYPES: &[(&str, &str)] = &[
    ("auto", "GENERATED BY DEFAULT AS IDENTITY NOT NULL PRIMARY KEY"),
    ("pk", "NOT NULL PRIMARY KEY"),
    ("bool", "bool"),
    ("string", "VARCHAR2(%d)"),
    ("string-char", "CHAR(%d)"),
    ("string-text", "VARCHAR2(%d)"),
    ("time.Time-clock", "TIMESTAMP"),
    ("time.Time-date", "DATE"),
    ("time.Time", "TIMESTAMP"),
    ("time.Time-precision", "TIMESTAMP(%d)"),
    ("int8", "INTEGER"),
    ("int16", "INTEGER"),
    ("int32", "INTEGER"),
    ("int64", "INTEGER"),
    ("uint8", "INTEGER"),
    ("uint16", "INTEGER"),
    ("uint32", "INTEGER"),
    ("uint64", "INTEGER"),
    ("float64", "NUMBER"),
    ("float64-decimal", "NUMBER(%d, %d)"),
];

pub(super) const OPERATORS: &[(&str, &str)] = &[
    ("exact", "= ?"),
    ("gt", "> ?"),
    ("gte", ">= ?"),
    ("lt", "< ?"),
    ("lte", "<= ?"),
];
