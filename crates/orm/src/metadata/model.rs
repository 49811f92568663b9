//! Table-level metadata of a registered model

use tracing::debug;

use super::field::{FieldInfo, FieldKind, Fields, RelationKind};
use super::ModelId;
use crate::config::is_engine_name;
use crate::descriptor::ModelDescriptor;
use crate::error::{RegistrationError, ResolutionError};
use crate::naming::{camel_string, NameStrategy};
use crate::tags::TagParser;

/// Metadata of one table
#[derive(Debug, Clone, PartialEq)]
pub struct ModelInfo {
    /// Position in the owning registry, assigned on insertion
    pub id: ModelId,
    pub name: String,
    pub full_name: String,
    pub pkg: String,
    pub table: String,
    pub fields: Fields,
    /// Backs a many-to-many relation
    pub is_through: bool,
    /// Declared by user code rather than synthesized by bootstrap
    pub manual: bool,
    pub engine: Option<String>,
    pub indexes: Vec<Vec<String>>,
    pub uniques: Vec<Vec<String>>,
    /// Column pair made unique on synthesized junction tables
    pub through_unique: Vec<String>,
}

impl ModelInfo {
    /// Build the metadata of a declared model
    ///
    /// Walks the descriptor's fields in order, applies the tag rules and
    /// resolves the primary key, promoting an integer `id` field to an
    /// auto-increment key when none is marked.
    pub(crate) fn from_descriptor(
        desc: &ModelDescriptor,
        table: String,
        parser: &dyn TagParser,
        strategy: NameStrategy,
    ) -> Result<Self, RegistrationError> {
        let (pkg, name) = desc.split_type_name();
        let engine = desc.engine.as_deref().map(str::trim).filter(|e| !e.is_empty());
        if let Some(engine) = engine.filter(|e| !is_engine_name(e)) {
            return Err(RegistrationError::InvalidEngine {
                model: desc.type_name.clone(),
                engine: engine.to_string(),
            });
        }

        let mut mi = ModelInfo {
            id: ModelId(0),
            name: name.to_string(),
            full_name: desc.type_name.clone(),
            pkg: pkg.to_string(),
            table,
            fields: Fields::new(),
            is_through: false,
            manual: true,
            engine: engine.map(str::to_string),
            indexes: desc.indexes.clone(),
            uniques: desc.uniques.clone(),
            through_unique: Vec::new(),
        };

        for field_desc in &desc.fields {
            let tag = parser.parse(&field_desc.tag);
            let Some(fi) = FieldInfo::from_descriptor(&mi.full_name, field_desc, &tag, strategy)? else {
                continue;
            };

            let is_pk = fi.pk;
            let index = mi.fields.add(fi).map_err(|fi| {
                RegistrationError::invalid_field(
                    fi.full_name,
                    format!("duplicate field name or column `{}`", fi.column),
                )
            })?;

            if is_pk {
                if mi.fields.pk_index().is_some() {
                    return Err(RegistrationError::invalid_field(
                        mi.fields[index].full_name.clone(),
                        "one model must have one pk field only",
                    ));
                }
                mi.fields.set_pk(index);
            }
        }

        if mi.fields.pk_index().is_none() {
            let promoted = mi.fields.iter().position(|fi| {
                fi.db_col
                    && fi.name.eq_ignore_ascii_case("id")
                    && fi.relation == RelationKind::None
                    && fi.kind.supports_auto()
            });
            match promoted {
                Some(index) => {
                    let fi = &mut mi.fields[index];
                    fi.auto = true;
                    fi.pk = true;
                    fi.null = false;
                    fi.index = false;
                    fi.unique = false;
                    fi.default = None;
                    mi.fields.set_pk(index);
                    debug!("Promoted `{}` to auto primary key", mi.fields[index].full_name);
                }
                None => return Err(RegistrationError::MissingPrimaryKey(mi.full_name)),
            }
        }

        Ok(mi)
    }

    /// Synthesize the junction model of a many-to-many relation between
    /// `left` (the declaring model) and `right`
    ///
    /// The table defaults to `<left>_<right>s`; the two link fields are named
    /// after the side tables, or `from_<t>`/`to_<t>` when both sides are the
    /// same table. `field` is the relation field the junction backs; a link
    /// clashing with the junction's own `id` is a table name collision.
    pub fn new_m2m(
        left: &ModelInfo,
        right: &ModelInfo,
        table: Option<&str>,
        field: &str,
    ) -> Result<Self, ResolutionError> {
        let table = table
            .map(str::to_string)
            .unwrap_or_else(|| format!("{}_{}s", left.table, right.table));
        let name = camel_string(&table);
        let full_name = if left.pkg.is_empty() {
            name.clone()
        } else {
            format!("{}::{}", left.pkg, name)
        };

        let (left_name, right_name) = if left.table == right.table {
            (format!("from_{}", left.table), format!("to_{}", right.table))
        } else {
            (left.table.clone(), right.table.clone())
        };

        let mut pk = FieldInfo::new("id", "id", FieldKind::BigInteger);
        pk.auto = true;
        pk.pk = true;
        pk.db_col = true;
        pk.full_name = format!("{}.id", full_name);

        let link = |field_name: &str, side: &ModelInfo| {
            let mut fi = FieldInfo::new(field_name, format!("{}_id", field_name), FieldKind::Relation);
            fi.full_name = format!("{}.{}", full_name, field_name);
            fi.relation = RelationKind::ForeignKey;
            fi.db_col = true;
            fi.rel_table = Some(side.table.clone());
            fi.target = Some(side.full_name.clone());
            fi.related_model = Some(side.id);
            fi.on_delete = Some(Default::default());
            fi
        };
        let left_link = link(&left_name, left);
        let right_link = link(&right_name, right);

        let mut fields = Fields::new();
        let mut through_unique = Vec::with_capacity(2);
        for fi in [pk, left_link, right_link] {
            let column = fi.column.clone();
            let is_pk = fi.pk;
            let index = fields
                .add(fi)
                .map_err(|_| ResolutionError::TableNameCollision {
                    field: field.to_string(),
                    table: table.clone(),
                })?;
            if is_pk {
                fields.set_pk(index);
            } else {
                through_unique.push(column);
            }
        }

        Ok(ModelInfo {
            id: ModelId(0),
            name,
            full_name,
            pkg: left.pkg.clone(),
            table,
            fields,
            is_through: true,
            manual: false,
            engine: None,
            indexes: Vec::new(),
            uniques: Vec::new(),
            through_unique,
        })
    }

    pub fn pk(&self) -> Option<&FieldInfo> {
        self.fields.pk()
    }

    /// Every composite UNIQUE group of the table, declared groups first
    pub fn unique_groups(&self) -> impl Iterator<Item = &Vec<String>> {
        self.uniques
            .iter()
            .chain(Some(&self.through_unique).filter(|u| !self.manual && !u.is_empty()))
    }
}
