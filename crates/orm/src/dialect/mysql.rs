//! MySQL vocabulary, also used for TiDB

pub(super) const TYPES: &[(&str, &str)] = &[
    ("auto", "AUTO_INCREMENT NOT NULL PRIMARY KEY"),
    ("pk", "NOT NULL PRIMARY KEY"),
    ("bool", "bool"),
    ("string", "varchar(%d)"),
    ("string-char", "char(%d)"),
    ("string-text", "longtext"),
    ("time.Time-clock", "time"),
    ("time.Time-date", "date"),
    ("time.Time", "datetime"),
    ("time.Time-precision", "datetime(%d)"),
    ("int8", "tinyint"),
    ("int16", "smallint"),
    ("int32", "integer"),
    ("int64", "bigint"),
    ("uint8", "tinyint unsigned"),
    ("uint16", "smallint unsigned"),
    ("uint32", "integer unsigned"),
    ("uint64", "bigint unsigned"),
    ("float64", "double precision"),
    ("float64-decimal", "numeric(%d, %d)"),
];

pub(super) const OPERATORS: &[(&str, &str)] = &[
    ("exact", "= ?"),
    ("iexact", "LIKE ?"),
    ("contains", "LIKE BINARY ?"),
    ("icontains", "LIKE ?"),
    ("gt", "> ?"),
    ("gte", ">= ?"),
    ("lt", "< ?"),
    ("lte", "<= ?"),
    ("eq", "= ?"),
    ("ne", "!= ?"),
    ("startswith", "LIKE BINARY ?"),
    ("endswith", "LIKE BINARY ?"),
    ("istartswith", "LIKE ?"),
    ("iendswith", "LIKE ?"),
];
