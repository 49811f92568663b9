//! Schema generation - CREATE/DROP/INDEX statements for registered models
//!
//! The generator reads a bootstrapped registry and renders one
//! `CREATE TABLE IF NOT EXISTS` statement per model, in registration order,
//! together with the `CREATE INDEX` statements of the table.

use tracing::debug;

use crate::dialect::{fill_placeholders, DialectTypeMap, Driver};
use crate::error::{OrmResult, SchemaError};
use crate::metadata::{FieldInfo, FieldKind, ModelInfo};
use crate::registry::{ModelRegistry, RegistryView};

const HEADER_RULE_WIDTH: usize = 50;

/// Size used by dialects whose text type needs an explicit length
const TEXT_COLUMN_SIZE: u32 = 4000;

/// DDL of a single table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDdl {
    pub table: String,
    pub create: String,
    pub indexes: Vec<String>,
}

/// Renders DDL for every model of a registry
#[derive(Debug, Clone, Copy)]
pub struct SchemaGenerator<'a> {
    registry: &'a ModelRegistry,
}

impl<'a> SchemaGenerator<'a> {
    pub fn new(registry: &'a ModelRegistry) -> Self {
        Self { registry }
    }

    /// CREATE TABLE and CREATE INDEX statements of every table, in
    /// registration order
    ///
    /// Bootstraps the registry first; a failed bootstrap is returned as is.
    pub fn tables(&self, driver: Driver) -> OrmResult<Vec<TableDdl>> {
        let view = self.resolved_view()?;
        let builder = TableBuilder {
            driver,
            types: driver.type_map(),
            view: &view,
            default_engine: &self.registry.config().mysql_engine,
        };

        let tables = view
            .all_ordered()
            .map(|mi| builder.build(mi))
            .collect::<Result<Vec<_>, _>>()?;

        debug!(
            "Generated {} DDL for {} tables",
            driver,
            tables.len()
        );
        Ok(tables)
    }

    pub fn create_statements(&self, driver: Driver) -> OrmResult<Vec<String>> {
        Ok(self
            .tables(driver)?
            .into_iter()
            .map(|table| table.create)
            .collect())
    }

    pub fn index_statements(&self, driver: Driver) -> OrmResult<Vec<String>> {
        Ok(self
            .tables(driver)?
            .into_iter()
            .flat_map(|table| table.indexes)
            .collect())
    }

    /// `DROP TABLE IF EXISTS` per table, in registration order
    pub fn drop_statements(&self, driver: Driver) -> OrmResult<Vec<String>> {
        let view = self.resolved_view()?;
        let q = driver.quote();
        let statements: Vec<String> = view
            .all_ordered()
            .map(|mi| format!("DROP TABLE IF EXISTS {q}{}{q}", mi.table))
            .collect();

        debug!("Generated {} drop statements", statements.len());
        Ok(statements)
    }

    /// Complete creation script: each table followed by its indexes
    pub fn sql_all(&self, driver: Driver) -> OrmResult<String> {
        let script = self
            .tables(driver)?
            .into_iter()
            .map(|table| {
                let mut queries = vec![table.create];
                queries.extend(table.indexes);
                queries.join("\n")
            })
            .collect::<Vec<_>>()
            .join("\n\n");
        Ok(script)
    }

    /// Driver configured on the registry (`OrmConfig::driver`)
    pub fn default_driver(&self) -> Driver {
        self.registry.config().driver
    }

    pub fn create_statements_default(&self) -> OrmResult<Vec<String>> {
        self.create_statements(self.default_driver())
    }

    pub fn drop_statements_default(&self) -> OrmResult<Vec<String>> {
        self.drop_statements(self.default_driver())
    }

    pub fn sql_all_default(&self) -> OrmResult<String> {
        self.sql_all(self.default_driver())
    }

    fn resolved_view(&self) -> OrmResult<RegistryView<'a>> {
        if self.registry.is_empty() {
            return Err(SchemaError::EmptyRegistry.into());
        }
        self.registry.bootstrap()?;
        Ok(self.registry.view())
    }
}

/// Renders the DDL of one model for one dialect
struct TableBuilder<'g, 'v> {
    driver: Driver,
    types: &'static DialectTypeMap,
    view: &'g RegistryView<'v>,
    default_engine: &'g str,
}

impl TableBuilder<'_, '_> {
    fn build(&self, mi: &ModelInfo) -> Result<TableDdl, SchemaError> {
        let q = self.driver.quote();
        let mut columns = Vec::new();
        let mut comments = Vec::new();
        let mut indexes: Vec<Vec<String>> = Vec::new();

        for fi in mi.fields.db_fields() {
            columns.push(self.column(fi, &mut indexes));
            if !fi.description.is_empty()
                && matches!(self.driver, Driver::PostgreSQL | Driver::Oracle)
            {
                comments.push(format!(
                    "COMMENT ON COLUMN {q}{}{q}.{q}{}{q} is '{}';",
                    mi.table,
                    fi.column,
                    escape(&fi.description)
                ));
            }
        }

        for group in mi.unique_groups() {
            let cols = resolve_columns(mi, group, "unique")?;
            columns.push(format!("    UNIQUE ({q}{}{q})", cols.join(&format!("{q}, {q}"))));
        }

        for group in &mi.indexes {
            indexes.push(resolve_columns(mi, group, "index")?);
        }

        let rule = "-".repeat(HEADER_RULE_WIDTH);
        let mut sql = format!("-- {rule}\n--  Table Structure for `{}`\n-- {rule}\n", mi.full_name);
        sql.push_str(&format!("CREATE TABLE IF NOT EXISTS {q}{}{q} (\n", mi.table));
        sql.push_str(&columns.join(",\n"));
        sql.push_str("\n)");
        if self.driver.supports_engine() {
            let engine = mi.engine.as_deref().unwrap_or(self.default_engine);
            sql.push_str(&format!(" ENGINE={}", engine));
        }
        sql.push(';');
        for comment in comments {
            sql.push('\n');
            sql.push_str(&comment);
        }

        let indexes = indexes
            .iter()
            .map(|cols| {
                format!(
                    "CREATE INDEX {q}{}_{}{q} ON {q}{}{q} ({q}{}{q});",
                    mi.table,
                    cols.join("_"),
                    mi.table,
                    cols.join(&format!("{q}, {q}"))
                )
            })
            .collect();

        Ok(TableDdl {
            table: mi.table.clone(),
            create: sql,
            indexes,
        })
    }

    fn column(&self, fi: &FieldInfo, indexes: &mut Vec<Vec<String>>) -> String {
        let q = self.driver.quote();
        let mut column = format!("    {q}{}{q} ", fi.column);

        if let Some(db_type) = &fi.db_type {
            column.push_str(db_type);
        } else if fi.auto {
            if self.driver.auto_includes_type() {
                column.push_str(self.template("auto"));
            } else {
                column.push_str(&format!("{} {}", self.column_type(fi), self.template("auto")));
            }
        } else if fi.pk {
            column.push_str(&format!("{} {}", self.column_type(fi), self.template("pk")));
        } else {
            column.push_str(&self.column_type(fi));
            if !fi.null {
                column.push_str(" NOT NULL");
            }
            column.push_str(&column_default(fi));
            if fi.unique {
                column.push_str(" UNIQUE");
            }
            if fi.index {
                indexes.push(vec![fi.column.clone()]);
            }
        }

        let mut column = column.replace("%COL%", &fi.column);
        if !fi.description.is_empty() && matches!(self.driver, Driver::MySQL | Driver::TiDB) {
            column.push_str(&format!(" COMMENT '{}'", escape(&fi.description)));
        }
        column
    }

    fn template(&self, key: &str) -> &'static str {
        self.types.get(key).unwrap_or_default()
    }

    /// Native type of a column; FK and one-to-one columns take the type of
    /// the related primary key
    fn column_type(&self, fi: &FieldInfo) -> String {
        let fi = if fi.relation.is_column_link() {
            fi.related_model
                .and_then(|id| self.view.model(id))
                .and_then(ModelInfo::pk)
                .unwrap_or(fi)
        } else {
            fi
        };

        let t = |key: &str| self.template(key).to_string();
        match fi.kind {
            FieldKind::Boolean => t("bool"),
            FieldKind::VarChar if self.driver == Driver::PostgreSQL && fi.to_text => t("string-text"),
            FieldKind::VarChar => fill_placeholders(self.template("string"), &[fi.size]),
            FieldKind::Char => fill_placeholders(self.template("string-char"), &[fi.size]),
            FieldKind::Text => fill_placeholders(self.template("string-text"), &[TEXT_COLUMN_SIZE]),
            FieldKind::Time => t("time.Time-clock"),
            FieldKind::Date => t("time.Time-date"),
            FieldKind::DateTime => match fi.precision {
                Some(precision) if precision > 0 && self.driver != Driver::SQLite => {
                    fill_placeholders(self.template("time.Time-precision"), &[precision])
                }
                _ => t("time.Time"),
            },
            FieldKind::Bit => t("int8"),
            FieldKind::SmallInteger => t("int16"),
            FieldKind::Integer => t("int32"),
            FieldKind::BigInteger if self.driver == Driver::SQLite => t("int32"),
            FieldKind::BigInteger => t("int64"),
            FieldKind::PositiveBit => t("uint8"),
            FieldKind::PositiveSmallInteger => t("uint16"),
            FieldKind::PositiveInteger => t("uint32"),
            FieldKind::PositiveBigInteger => t("uint64"),
            FieldKind::Float => t("float64"),
            FieldKind::Decimal => {
                fill_placeholders(self.template("float64-decimal"), &[fi.digits, fi.decimals])
            }
            FieldKind::Json | FieldKind::Jsonb if !self.driver.supports_json() => {
                fill_placeholders(self.template("string"), &[fi.size])
            }
            FieldKind::Json => t("json"),
            FieldKind::Jsonb => t("jsonb"),
            // only reachable for links whose target has no primary key
            FieldKind::Relation => t("int64"),
        }
    }
}

/// DEFAULT clause of a plain column
///
/// An explicit default always applies; otherwise NOT NULL columns get the
/// zero value of their kind. Time and text columns never carry one.
fn column_default(fi: &FieldInfo) -> String {
    if fi.is_rel() || fi.is_reverse() {
        return String::new();
    }

    let (quoted, zero) = match fi.kind {
        FieldKind::Time | FieldKind::Date | FieldKind::DateTime | FieldKind::Text => {
            return String::new()
        }
        kind if kind.is_numeric() => (false, "0"),
        FieldKind::Boolean => (false, "FALSE"),
        FieldKind::Json | FieldKind::Jsonb => (true, "{}"),
        _ => (true, ""),
    };

    let value = match &fi.default {
        Some(value) => value.as_str(),
        None if !fi.null => zero,
        None => return String::new(),
    };

    if quoted {
        format!(" DEFAULT '{}' ", escape(value))
    } else {
        format!(" DEFAULT {} ", value)
    }
}

fn escape(value: &str) -> String {
    value.replace('\'', "''")
}

/// Map field names or columns of a declared group to physical columns
fn resolve_columns(
    mi: &ModelInfo,
    names: &[String],
    clause: &'static str,
) -> Result<Vec<String>, SchemaError> {
    names
        .iter()
        .map(|name| {
            mi.fields
                .get_by_any(name)
                .filter(|fi| fi.db_col)
                .map(|fi| fi.column.clone())
                .ok_or_else(|| SchemaError::UnknownColumn {
                    model: mi.full_name.clone(),
                    column: name.clone(),
                    clause,
                })
        })
        .collect()
}
