pub(super) const TYPES: &[(&str, &str)] = &[
    ("auto", "integer NOT NULL PRIMARY KEY AUTOINCREMENT"),
    ("pk", "NOT NULL PRIMARY KEY"),
    ("bool", "bool"),
    ("string", "varchar(%d)"),
    ("string-char", "char(%d)"),
    ("string-text", "text"),
    ("time.Time-clock", "time"),
    ("time.Time-date", "date"),
    ("time.Time", "datetime"),
    ("int8", "tinyint"),
    ("int16", "smallint"),
    ("int32", "integer"),
    ("int64", "bigint"),
    ("uint8", "tinyint unsigned"),
    ("uint16", "smallint unsigned"),
    ("uint32", "integer unsigned"),
    ("uint64", "bigint unsigned"),
    ("float64", "real"),
    ("float64-decimal", "decimal"),
];

// LIKE is case-insensitive for ASCII in SQLite, so both variants share a form
pub(super) const OPERATORS: &[(&str, &str)] = &[
    ("exact", "= ?"),
    ("iexact", "LIKE ? ESCAPE '\\'"),
    ("contains", "LIKE ? ESCAPE '\\'"),
    ("icontains", "LIKE ? ESCAPE '\\'"),
    ("gt", "> ?"),
    ("gte", ">= ?"),
    ("lt", "< ?"),
    ("lte", "<= ?"),
    ("eq", "= ?"),
    ("ne", "!= ?"),
    ("startswith", "LIKE ? ESCAPE '\\'"),
    ("endswith", "LIKE ? ESCAPE '\\'"),
    ("istartswith", "LIKE ? ESCAPE '\\'"),
    ("iendswith", "LIKE ? ESCAPE '\\'"),
];
