//! Column and relation metadata for a single model field

use std::collections::HashMap;

use indexmap::IndexMap;

use super::{FieldLink, ModelId};
use crate::descriptor::{FieldDescriptor, ShapeKind};
use crate::error::RegistrationError;
use crate::naming::NameStrategy;
use crate::tags::ParsedTag;

/// Size given to string columns declared without `size(..)`
pub const DEFAULT_STRING_SIZE: u32 = 255;

/// Semantic column kind of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Boolean,
    VarChar,
    Char,
    Text,
    Time,
    Date,
    DateTime,
    Bit,
    SmallInteger,
    Integer,
    BigInteger,
    PositiveBit,
    PositiveSmallInteger,
    PositiveInteger,
    PositiveBigInteger,
    Float,
    Decimal,
    Json,
    Jsonb,
    /// Relation fields; the column type of FK and one-to-one fields is the
    /// related model's primary key type
    Relation,
}

impl FieldKind {
    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            FieldKind::Bit
                | FieldKind::SmallInteger
                | FieldKind::Integer
                | FieldKind::BigInteger
                | FieldKind::PositiveBit
                | FieldKind::PositiveSmallInteger
                | FieldKind::PositiveInteger
                | FieldKind::PositiveBigInteger
        )
    }

    /// Kinds that may carry `auto` or be promoted to an implicit `id` key
    pub fn supports_auto(&self) -> bool {
        matches!(
            self,
            FieldKind::Integer
                | FieldKind::BigInteger
                | FieldKind::PositiveInteger
                | FieldKind::PositiveBigInteger
        )
    }

    pub fn is_time(&self) -> bool {
        matches!(self, FieldKind::Time | FieldKind::Date | FieldKind::DateTime)
    }

    pub fn is_numeric(&self) -> bool {
        self.is_integer() || matches!(self, FieldKind::Float | FieldKind::Decimal)
    }

    pub fn is_sized_string(&self) -> bool {
        matches!(
            self,
            FieldKind::VarChar | FieldKind::Char | FieldKind::Json | FieldKind::Jsonb
        )
    }
}

/// Relation role of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RelationKind {
    #[default]
    None,
    ForeignKey,
    OneToOne,
    ManyToMany,
    ReverseOne,
    ReverseMany,
}

impl RelationKind {
    /// Declared on the owning side (`rel(..)`)
    pub fn is_forward(&self) -> bool {
        matches!(
            self,
            RelationKind::ForeignKey | RelationKind::OneToOne | RelationKind::ManyToMany
        )
    }

    /// Traversal back from the referenced side (`reverse(..)`)
    pub fn is_reverse(&self) -> bool {
        matches!(self, RelationKind::ReverseOne | RelationKind::ReverseMany)
    }

    /// Forward relations stored as a column on the owning table
    pub fn is_column_link(&self) -> bool {
        matches!(self, RelationKind::ForeignKey | RelationKind::OneToOne)
    }

    pub fn is_to_many(&self) -> bool {
        matches!(self, RelationKind::ManyToMany | RelationKind::ReverseMany)
    }
}

/// Referential action of a foreign key column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OnDelete {
    #[default]
    Cascade,
    SetNull,
    SetDefault,
    DoNothing,
}

impl std::fmt::Display for OnDelete {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OnDelete::Cascade => write!(f, "cascade"),
            OnDelete::SetNull => write!(f, "set_null"),
            OnDelete::SetDefault => write!(f, "set_default"),
            OnDelete::DoNothing => write!(f, "do_nothing"),
        }
    }
}

/// Metadata of one struct field
#[derive(Debug, Clone, PartialEq)]
pub struct FieldInfo {
    pub name: String,
    pub full_name: String,
    pub column: String,
    pub kind: FieldKind,
    pub relation: RelationKind,

    pub pk: bool,
    pub auto: bool,
    pub null: bool,
    pub unique: bool,
    pub index: bool,
    /// Backed by a physical column
    pub db_col: bool,
    /// Declared on the struct rather than synthesized by bootstrap
    pub in_model: bool,
    /// String declared without an explicit size
    pub to_text: bool,
    pub auto_now: bool,
    pub auto_now_add: bool,

    pub size: u32,
    pub digits: u32,
    pub decimals: u32,
    pub precision: Option<u32>,
    pub default: Option<String>,
    pub description: String,
    pub db_type: Option<String>,
    pub on_delete: Option<OnDelete>,

    pub rel_table: Option<String>,
    pub rel_through: Option<String>,
    /// Full type name of the related struct
    pub target: Option<String>,

    pub related_model: Option<ModelId>,
    pub through_model: Option<ModelId>,
    pub reverse_field: Option<FieldLink>,
    pub reverse_field_two: Option<FieldLink>,
    pub reverse_field_m2m: Option<FieldLink>,
}

impl FieldInfo {
    /// Bare field with every flag cleared
    pub fn new(name: impl Into<String>, column: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            full_name: String::new(),
            column: column.into(),
            kind,
            relation: RelationKind::None,
            pk: false,
            auto: false,
            null: false,
            unique: false,
            index: false,
            db_col: false,
            in_model: false,
            to_text: false,
            auto_now: false,
            auto_now_add: false,
            size: 0,
            digits: 0,
            decimals: 0,
            precision: None,
            default: None,
            description: String::new(),
            db_type: None,
            on_delete: None,
            rel_table: None,
            rel_through: None,
            target: None,
            related_model: None,
            through_model: None,
            reverse_field: None,
            reverse_field_two: None,
            reverse_field_m2m: None,
        }
    }

    pub fn is_rel(&self) -> bool {
        self.relation.is_forward()
    }

    pub fn is_reverse(&self) -> bool {
        self.relation.is_reverse()
    }

    /// The field on the other model this one is paired with after bootstrap
    pub fn paired_field(&self) -> Option<&FieldLink> {
        match self.relation {
            RelationKind::ManyToMany => self.reverse_field_m2m.as_ref(),
            RelationKind::ReverseMany if self.reverse_field_m2m.is_some() => {
                self.reverse_field_m2m.as_ref()
            }
            _ => self.reverse_field.as_ref(),
        }
    }

    /// Build the metadata of a declared field, `Ok(None)` for skipped fields
    pub(crate) fn from_descriptor(
        model_full_name: &str,
        desc: &FieldDescriptor,
        tag: &ParsedTag,
        strategy: NameStrategy,
    ) -> Result<Option<FieldInfo>, RegistrationError> {
        if tag.is_skipped() {
            return Ok(None);
        }

        let full_name = format!("{}.{}", model_full_name, desc.name);
        let wrong_tag = |name: &str, reason: &str| RegistrationError::Tag {
            field: full_name.clone(),
            tag: name.to_string(),
            value: tag.get(name).unwrap_or_default().to_string(),
            reason: reason.to_string(),
        };

        let relation = match (tag.non_empty("rel"), tag.non_empty("reverse")) {
            (Some("fk"), _) => RelationKind::ForeignKey,
            (Some("one"), _) => RelationKind::OneToOne,
            (Some("m2m"), _) => RelationKind::ManyToMany,
            (Some(_), _) => return Err(wrong_tag("rel", "rel only allow these value: fk, one, m2m")),
            (None, Some("one")) => RelationKind::ReverseOne,
            (None, Some("many")) => RelationKind::ReverseMany,
            (None, Some(_)) => {
                return Err(wrong_tag("reverse", "reverse only allow these value: one, many"))
            }
            (None, None) => RelationKind::None,
        };

        let (digits_tag, decimals_tag) = split_digits(tag);

        let (kind, target) = match (&desc.shape.kind, relation) {
            (ShapeKind::Column(kind), RelationKind::None) => {
                (refine_kind(*kind, tag, digits_tag.is_some() || decimals_tag.is_some()), None)
            }
            (
                ShapeKind::One(target),
                RelationKind::ForeignKey | RelationKind::OneToOne | RelationKind::ReverseOne,
            ) => (FieldKind::Relation, Some(target.to_string())),
            (ShapeKind::Many(target), RelationKind::ManyToMany | RelationKind::ReverseMany) => {
                (FieldKind::Relation, Some(target.to_string()))
            }
            (_, RelationKind::ForeignKey | RelationKind::OneToOne | RelationKind::ReverseOne) => {
                return Err(RegistrationError::invalid_field(
                    &full_name,
                    "rel/reverse:one field must be a Box<Model> or Option<Box<Model>>",
                ))
            }
            (_, RelationKind::ManyToMany | RelationKind::ReverseMany) => {
                return Err(RegistrationError::invalid_field(
                    &full_name,
                    "rel/reverse:many field must be a Vec<Model>",
                ))
            }
            (_, RelationKind::None) => {
                return Err(RegistrationError::invalid_field(
                    &full_name,
                    "unsupported field type, may be missing a rel/reverse tag",
                ))
            }
        };

        let explicit_column = tag.non_empty("column");
        let column = match relation {
            RelationKind::ManyToMany | RelationKind::ReverseMany | RelationKind::ReverseOne => {
                desc.name.clone()
            }
            RelationKind::ForeignKey | RelationKind::OneToOne => match explicit_column {
                Some(col) => col.to_string(),
                None => format!("{}_id", strategy.apply(&desc.name)),
            },
            RelationKind::None => explicit_column
                .map(str::to_string)
                .unwrap_or_else(|| strategy.apply(&desc.name)),
        };

        let mut fi = FieldInfo::new(desc.name.clone(), column, kind);
        fi.full_name = full_name.clone();
        fi.relation = relation;
        fi.target = target;
        fi.in_model = true;
        fi.description = tag.get("description").unwrap_or_default().to_string();
        fi.db_type = tag.non_empty("db_type").map(str::to_string);
        fi.null = tag.has("null") || desc.shape.nullable;
        fi.index = tag.has("index");
        fi.auto = tag.has("auto");
        fi.pk = tag.has("pk");
        fi.unique = tag.has("unique");

        let mut initial = tag.get("default").map(str::to_string);

        if relation.is_to_many() {
            fi.rel_table = tag.non_empty("rel_table").map(str::to_string);
            if fi.rel_table.is_none() {
                fi.rel_through = tag.non_empty("rel_through").map(str::to_string);
            }
        }

        match relation {
            RelationKind::ManyToMany | RelationKind::ReverseMany | RelationKind::ReverseOne => {
                fi.null = false;
                fi.index = false;
                fi.auto = false;
                fi.pk = false;
                fi.unique = false;
            }
            _ => fi.db_col = true,
        }

        if relation == RelationKind::OneToOne {
            fi.unique = true;
        }

        if relation.is_column_link() {
            let on_delete = match tag.non_empty("on_delete") {
                None | Some("cascade") => OnDelete::Cascade,
                Some("do_nothing") => OnDelete::DoNothing,
                Some("set_default") => {
                    if initial.is_none() {
                        return Err(RegistrationError::invalid_field(
                            &full_name,
                            "on_delete: set_default need set field a default value",
                        ));
                    }
                    OnDelete::SetDefault
                }
                Some("set_null") => {
                    if !fi.null {
                        return Err(RegistrationError::invalid_field(
                            &full_name,
                            "on_delete: set_null need set field null",
                        ));
                    }
                    OnDelete::SetNull
                }
                Some(_) => {
                    return Err(wrong_tag(
                        "on_delete",
                        "expected one of cascade, set_null, set_default, do_nothing",
                    ))
                }
            };
            fi.on_delete = Some(on_delete);
        }

        match kind {
            kind if kind.is_sized_string() => match tag.non_empty("size") {
                Some(size) => {
                    fi.size = size
                        .parse()
                        .map_err(|_| wrong_tag("size", "size must be a positive integer"))?;
                }
                None => match desc.shape.size {
                    Some(size) => fi.size = size,
                    None => {
                        fi.size = DEFAULT_STRING_SIZE;
                        fi.to_text = true;
                    }
                },
            },
            FieldKind::Text => {
                fi.index = false;
                fi.unique = false;
            }
            FieldKind::Time | FieldKind::Date | FieldKind::DateTime => {
                if kind == FieldKind::DateTime {
                    if let Some(precision) = tag.non_empty("precision") {
                        fi.precision = Some(precision.parse().map_err(|_| {
                            wrong_tag("precision", "precision must be a positive integer")
                        })?);
                    }
                }
                if tag.has("auto_now") {
                    fi.auto_now = true;
                } else if tag.has("auto_now_add") {
                    fi.auto_now_add = true;
                }
            }
            FieldKind::Decimal => {
                let parse = |v: Option<&str>| v.and_then(|v| v.trim().parse::<u32>().ok());
                match (parse(digits_tag.as_deref()), parse(decimals_tag.as_deref())) {
                    (Some(digits), Some(decimals)) => {
                        fi.digits = digits;
                        fi.decimals = decimals;
                    }
                    _ => {
                        return Err(wrong_tag(
                            "digits",
                            "decimal fields need both digits(n) and decimals(m)",
                        ))
                    }
                }
            }
            _ => {}
        }

        if fi.auto && !kind.is_integer() {
            return Err(RegistrationError::invalid_field(
                &full_name,
                "non-integer type cannot set auto",
            ));
        }

        if fi.auto || fi.pk {
            if fi.auto {
                if !kind.supports_auto() {
                    return Err(RegistrationError::invalid_field(
                        &full_name,
                        "auto primary key only support i32, i64, isize, u32, u64, usize",
                    ));
                }
                fi.pk = true;
            }
            fi.null = false;
            fi.index = false;
            fi.unique = false;
        }

        if fi.unique {
            fi.index = false;
        }

        if fi.auto || fi.pk || fi.unique || kind.is_time() {
            initial = None;
        }

        if let Some(value) = &initial {
            if !default_matches_kind(kind, value) {
                return Err(wrong_tag("default", "default value does not match the field type"));
            }
        }
        fi.default = initial;

        Ok(Some(fi))
    }
}

/// `digits(10,2)` is shorthand for `digits(10);decimals(2)`
fn split_digits(tag: &ParsedTag) -> (Option<String>, Option<String>) {
    let decimals = tag.non_empty("decimals").map(str::to_string);
    match tag.non_empty("digits") {
        Some(digits) => match digits.split_once(',') {
            Some((d, m)) => (
                Some(d.trim().to_string()),
                decimals.or_else(|| Some(m.trim().to_string())),
            ),
            None => (Some(digits.to_string()), decimals),
        },
        None => (None, decimals),
    }
}

fn refine_kind(kind: FieldKind, tag: &ParsedTag, has_digits: bool) -> FieldKind {
    let type_tag = tag.non_empty("type");
    match (kind, type_tag) {
        (FieldKind::VarChar, Some("char")) => FieldKind::Char,
        (FieldKind::VarChar, Some("text")) => FieldKind::Text,
        (FieldKind::VarChar, Some("json")) => FieldKind::Json,
        (FieldKind::VarChar | FieldKind::Json, Some("jsonb")) => FieldKind::Jsonb,
        (FieldKind::Float, _) if has_digits => FieldKind::Decimal,
        (FieldKind::DateTime, Some("date")) => FieldKind::Date,
        (FieldKind::DateTime, Some("time")) => FieldKind::Time,
        _ => kind,
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}

fn default_matches_kind(kind: FieldKind, value: &str) -> bool {
    match kind {
        FieldKind::Boolean => parse_bool(value).is_some(),
        FieldKind::Float | FieldKind::Decimal => value.parse::<f64>().is_ok(),
        FieldKind::Bit => value.parse::<i8>().is_ok(),
        FieldKind::SmallInteger => value.parse::<i16>().is_ok(),
        FieldKind::Integer => value.parse::<i32>().is_ok(),
        FieldKind::BigInteger => value.parse::<i64>().is_ok(),
        FieldKind::PositiveBit => value.parse::<u8>().is_ok(),
        FieldKind::PositiveSmallInteger => value.parse::<u16>().is_ok(),
        FieldKind::PositiveInteger => value.parse::<u32>().is_ok(),
        FieldKind::PositiveBigInteger => value.parse::<u64>().is_ok(),
        _ => true,
    }
}

/// Ordered field set of a model with name and column lookups
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fields {
    items: IndexMap<String, FieldInfo>,
    columns: HashMap<String, usize>,
    pk: Option<usize>,
}

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a field; hands it back when its name or column is taken
    pub fn add(&mut self, field: FieldInfo) -> Result<usize, FieldInfo> {
        if self.items.contains_key(&field.name) || self.columns.contains_key(&field.column) {
            return Err(field);
        }
        let index = self.items.len();
        self.columns.insert(field.column.clone(), index);
        self.items.insert(field.name.clone(), field);
        Ok(index)
    }

    pub fn get(&self, name: &str) -> Option<&FieldInfo> {
        self.items.get(name)
    }

    pub fn get_by_column(&self, column: &str) -> Option<&FieldInfo> {
        self.columns.get(column).and_then(|&i| self.at(i))
    }

    /// Lookup by field name, full name or column
    pub fn get_by_any(&self, name: &str) -> Option<&FieldInfo> {
        self.get(name)
            .or_else(|| self.items.values().find(|f| f.full_name == name))
            .or_else(|| self.get_by_column(name))
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.items.get_index_of(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.items.contains_key(name)
    }

    pub fn at(&self, index: usize) -> Option<&FieldInfo> {
        self.items.get_index(index).map(|(_, f)| f)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldInfo> {
        self.items.values()
    }

    /// Fields backed by a physical column, in declaration order
    pub fn db_fields(&self) -> impl Iterator<Item = &FieldInfo> {
        self.iter().filter(|f| f.db_col)
    }

    pub fn by_relation(&self, relation: RelationKind) -> impl Iterator<Item = (usize, &FieldInfo)> {
        self.items
            .values()
            .enumerate()
            .filter(move |(_, f)| f.relation == relation)
    }

    pub fn pk(&self) -> Option<&FieldInfo> {
        self.pk.and_then(|i| self.at(i))
    }

    pub fn pk_index(&self) -> Option<usize> {
        self.pk
    }

    pub(crate) fn set_pk(&mut self, index: usize) {
        self.pk = Some(index);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl std::ops::Index<usize> for Fields {
    type Output = FieldInfo;

    fn index(&self, index: usize) -> &FieldInfo {
        &self.items[index]
    }
}

impl std::ops::IndexMut<usize> for Fields {
    fn index_mut(&mut self, index: usize) -> &mut FieldInfo {
        &mut self.items[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{FieldShape, FieldType};
    use crate::tags::{OrmTagParser, TagParser};

    fn build<T: FieldType>(name: &str, tag: &str) -> Result<Option<FieldInfo>, RegistrationError> {
        let desc = FieldDescriptor::of::<T>(name, tag);
        FieldInfo::from_descriptor("app::Thing", &desc, &OrmTagParser.parse(tag), NameStrategy::Snake)
    }

    fn field<T: FieldType>(name: &str, tag: &str) -> FieldInfo {
        build::<T>(name, tag).unwrap().unwrap()
    }

    fn relation_field(name: &str, shape: FieldShape, tag: &str) -> Result<Option<FieldInfo>, RegistrationError> {
        let desc = FieldDescriptor::new(name, shape, tag);
        FieldInfo::from_descriptor("app::Thing", &desc, &OrmTagParser.parse(tag), NameStrategy::Snake)
    }

    #[test]
    fn test_scalar_defaults() {
        let fi = field::<String>("user_name", "");
        assert_eq!(fi.kind, FieldKind::VarChar);
        assert_eq!(fi.column, "user_name");
        assert_eq!(fi.full_name, "app::Thing.user_name");
        assert_eq!(fi.size, DEFAULT_STRING_SIZE);
        assert!(fi.to_text);
        assert!(fi.db_col);
        assert!(!fi.null);
    }

    #[test]
    fn test_skip_tag() {
        assert!(build::<String>("cache", "-").unwrap().is_none());
    }

    #[test]
    fn test_size_and_unique() {
        let fi = field::<String>("email", "size(100);unique;index");
        assert_eq!(fi.size, 100);
        assert!(!fi.to_text);
        assert!(fi.unique);
        assert!(!fi.index);
    }

    #[test]
    fn test_wrong_size_is_a_tag_error() {
        let err = build::<String>("email", "size(big)").unwrap_err();
        assert!(matches!(err, RegistrationError::Tag { ref tag, .. } if tag == "size"));
    }

    #[test]
    fn test_type_refinements() {
        assert_eq!(field::<String>("a", "type(text)").kind, FieldKind::Text);
        assert_eq!(field::<String>("a", "type(char);size(2)").kind, FieldKind::Char);
        assert_eq!(field::<String>("a", "type(jsonb)").kind, FieldKind::Jsonb);
        assert_eq!(
            field::<chrono::NaiveDateTime>("a", "type(date)").kind,
            FieldKind::Date
        );
    }

    #[test]
    fn test_decimal_from_digits() {
        let fi = field::<f64>("price", "digits(12);decimals(4)");
        assert_eq!(fi.kind, FieldKind::Decimal);
        assert_eq!((fi.digits, fi.decimals), (12, 4));

        let fi = field::<f64>("price", "digits(10,2)");
        assert_eq!((fi.digits, fi.decimals), (10, 2));

        assert!(build::<f64>("price", "digits(10)").is_err());
    }

    #[test]
    fn test_auto_implies_pk_and_clears_flags() {
        let fi = field::<i64>("id", "auto;null;unique;index");
        assert!(fi.auto && fi.pk);
        assert!(!fi.null && !fi.unique && !fi.index);
    }

    #[test]
    fn test_auto_rejected_on_non_integer_and_small_ints() {
        let err = build::<String>("code", "auto").unwrap_err();
        assert!(err.to_string().contains("non-integer type cannot set auto"));

        let err = build::<i16>("code", "auto").unwrap_err();
        assert!(err.to_string().contains("auto primary key only support"));
    }

    #[test]
    fn test_option_is_nullable() {
        let fi = field::<Option<i32>>("age", "");
        assert!(fi.null);
        assert_eq!(fi.kind, FieldKind::Integer);
    }

    #[test]
    fn test_text_clears_index_and_unique() {
        let fi = field::<String>("body", "type(text);unique;index");
        assert!(!fi.unique && !fi.index);
    }

    #[test]
    fn test_default_validation() {
        assert_eq!(field::<i32>("count", "default(7)").default.as_deref(), Some("7"));
        assert!(build::<i32>("count", "default(seven)").is_err());
        assert!(build::<bool>("flag", "default(maybe)").is_err());
        assert_eq!(field::<bool>("flag", "default(true)").default.as_deref(), Some("true"));
        assert_eq!(field::<i32>("count", "default(7);unique").default, None);
        assert_eq!(field::<chrono::NaiveDate>("born", "default(2020-01-01)").default, None);
    }

    #[test]
    fn test_datetime_precision_and_auto_now() {
        let fi = field::<chrono::DateTime<chrono::Utc>>("created", "precision(3);auto_now_add");
        assert_eq!(fi.precision, Some(3));
        assert!(fi.auto_now_add);
        assert!(!fi.auto_now);
    }

    #[test]
    fn test_foreign_key_column_and_on_delete() {
        let shape = FieldShape::one("app::User");
        let fi = relation_field("author", shape.clone(), "rel(fk)").unwrap().unwrap();
        assert_eq!(fi.relation, RelationKind::ForeignKey);
        assert_eq!(fi.column, "author_id");
        assert_eq!(fi.on_delete, Some(OnDelete::Cascade));
        assert_eq!(fi.target.as_deref(), Some("app::User"));

        let fi = relation_field("author", shape.clone(), "rel(fk);column(writer)").unwrap().unwrap();
        assert_eq!(fi.column, "writer");

        assert!(relation_field("author", shape.clone(), "rel(fk);on_delete(set_null)").is_err());
        let fi = relation_field("author", shape.nullable(), "rel(fk);on_delete(set_null)")
            .unwrap()
            .unwrap();
        assert_eq!(fi.on_delete, Some(OnDelete::SetNull));
        assert!(relation_field("author", FieldShape::one("app::User"), "rel(fk);on_delete(set_default)").is_err());
        assert!(relation_field("author", FieldShape::one("app::User"), "rel(fk);on_delete(explode)").is_err());
    }

    #[test]
    fn test_one_to_one_is_unique() {
        let fi = relation_field("profile", FieldShape::one("app::Profile"), "rel(one)")
            .unwrap()
            .unwrap();
        assert!(fi.unique);
        assert_eq!(fi.column, "profile_id");
    }

    #[test]
    fn test_many_to_many_is_virtual() {
        let fi = relation_field("roles", FieldShape::many("app::Role"), "rel(m2m);null;rel_table(user_role)")
            .unwrap()
            .unwrap();
        assert!(!fi.db_col);
        assert!(!fi.null);
        assert_eq!(fi.column, "roles");
        assert_eq!(fi.rel_table.as_deref(), Some("user_role"));
        assert_eq!(fi.rel_through, None);
    }

    #[test]
    fn test_relation_shape_mismatch() {
        assert!(relation_field("roles", FieldShape::one("app::Role"), "rel(m2m)").is_err());
        assert!(relation_field("author", FieldShape::many("app::User"), "rel(fk)").is_err());
        assert!(relation_field("author", FieldShape::one("app::User"), "").is_err());
        assert!(relation_field("author", FieldShape::one("app::User"), "rel(belongs)").is_err());
        assert!(relation_field("posts", FieldShape::many("app::Post"), "reverse(all)").is_err());
    }

    #[test]
    fn test_fields_collection() {
        let mut fields = Fields::new();
        let id = field::<i64>("id", "auto");
        assert_eq!(fields.add(id).unwrap(), 0);
        fields.set_pk(0);
        fields.add(field::<String>("name", "")).unwrap();

        // same column under another name
        let clash = field::<String>("alias", "column(name)");
        assert!(fields.add(clash).is_err());

        assert_eq!(fields.len(), 2);
        assert_eq!(fields.pk().map(|f| f.name.as_str()), Some("id"));
        assert_eq!(fields.get_by_any("app::Thing.name").map(|f| f.column.as_str()), Some("name"));
        assert_eq!(fields.index_of("name"), Some(1));
        assert_eq!(fields.db_fields().count(), 2);
    }
}
