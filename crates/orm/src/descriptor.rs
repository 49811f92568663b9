//! Compile-time model descriptions
//!
//! A [`ModelDescriptor`] is what registration consumes: the struct's type
//! name, optional table hooks and its fields with their raw tags. It is
//! normally produced by the [`model!`](crate::model) macro, which implements
//! [`Model`] for the declared struct, but it can also be built by hand.

use crate::metadata::FieldKind;

/// A struct that maps to a table
pub trait Model: 'static {
    fn describe() -> ModelDescriptor;
}

/// What a Rust field type looks like to the registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShapeKind {
    /// Plain value stored in a column
    Column(FieldKind),
    /// Single related model, by full type name
    One(&'static str),
    /// Collection of related models, by full type name
    Many(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldShape {
    pub kind: ShapeKind,
    pub nullable: bool,
    /// Natural column size used when the tag gives none
    pub size: Option<u32>,
}

impl FieldShape {
    pub fn column(kind: FieldKind) -> Self {
        Self {
            kind: ShapeKind::Column(kind),
            nullable: false,
            size: None,
        }
    }

    pub fn one(target: &'static str) -> Self {
        Self {
            kind: ShapeKind::One(target),
            nullable: false,
            size: None,
        }
    }

    pub fn many(target: &'static str) -> Self {
        Self {
            kind: ShapeKind::Many(target),
            nullable: false,
            size: None,
        }
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn with_size(mut self, size: u32) -> Self {
        self.size = Some(size);
        self
    }
}

/// Rust types usable as model fields
pub trait FieldType {
    fn shape() -> FieldShape;
}

macro_rules! impl_column_type {
    ($($ty:ty => $kind:ident),* $(,)?) => {
        $(
            impl FieldType for $ty {
                fn shape() -> FieldShape {
                    FieldShape::column(FieldKind::$kind)
                }
            }
        )*
    };
}

impl_column_type! {
    bool => Boolean,
    i8 => Bit,
    i16 => SmallInteger,
    i32 => Integer,
    isize => Integer,
    i64 => BigInteger,
    u8 => PositiveBit,
    u16 => PositiveSmallInteger,
    u32 => PositiveInteger,
    usize => PositiveInteger,
    u64 => PositiveBigInteger,
    f32 => Float,
    f64 => Float,
    String => VarChar,
    chrono::NaiveDateTime => DateTime,
    chrono::DateTime<chrono::Utc> => DateTime,
    chrono::DateTime<chrono::FixedOffset> => DateTime,
    chrono::NaiveDate => Date,
    chrono::NaiveTime => Time,
    serde_json::Value => Json,
}

impl FieldType for uuid::Uuid {
    fn shape() -> FieldShape {
        FieldShape::column(FieldKind::Char).with_size(36)
    }
}

impl<T: FieldType> FieldType for Option<T> {
    fn shape() -> FieldShape {
        T::shape().nullable()
    }
}

impl<M: Model> FieldType for Box<M> {
    fn shape() -> FieldShape {
        FieldShape::one(std::any::type_name::<M>())
    }
}

impl<M: Model> FieldType for Vec<M> {
    fn shape() -> FieldShape {
        FieldShape::many(std::any::type_name::<M>())
    }
}

/// One declared struct field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: String,
    pub shape: FieldShape,
    pub tag: String,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, shape: FieldShape, tag: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            shape,
            tag: tag.into(),
        }
    }

    pub fn of<T: FieldType>(name: impl Into<String>, tag: impl Into<String>) -> Self {
        Self::new(name, T::shape(), tag)
    }
}

/// Everything registration needs to know about a model type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelDescriptor {
    /// Full type path, `crate::module::Type`
    pub type_name: String,
    pub table_name: Option<String>,
    pub engine: Option<String>,
    /// Composite index groups, by field name or column
    pub indexes: Vec<Vec<String>>,
    /// Composite UNIQUE groups, by field name or column
    pub uniques: Vec<Vec<String>>,
    pub fields: Vec<FieldDescriptor>,
}

impl ModelDescriptor {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            table_name: None,
            engine: None,
            indexes: Vec::new(),
            uniques: Vec::new(),
            fields: Vec::new(),
        }
    }

    /// Descriptor named after `T`'s type path
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self::new(std::any::type_name::<T>())
    }

    pub fn table(mut self, name: impl Into<String>) -> Self {
        self.table_name = Some(name.into());
        self
    }

    pub fn engine(mut self, engine: impl Into<String>) -> Self {
        self.engine = Some(engine.into());
        self
    }

    pub fn index(mut self, columns: &[&str]) -> Self {
        self.indexes
            .push(columns.iter().map(|c| c.to_string()).collect());
        self
    }

    pub fn unique(mut self, columns: &[&str]) -> Self {
        self.uniques
            .push(columns.iter().map(|c| c.to_string()).collect());
        self
    }

    pub fn field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    /// `(package, name)` split of the type path
    pub fn split_type_name(&self) -> (&str, &str) {
        split_type_name(&self.type_name)
    }

    /// Type paths that name an indirection rather than a struct
    pub fn is_indirection(&self) -> bool {
        let name = self.type_name.trim();
        name.starts_with('&')
            || name.starts_with('*')
            || ["alloc::boxed::Box<", "alloc::rc::Rc<", "alloc::sync::Arc<", "core::option::Option<"]
                .iter()
                .any(|prefix| name.starts_with(prefix))
    }
}

/// Split `a::b::Type<..>` into `("a::b", "Type<..>")`
pub fn split_type_name(type_name: &str) -> (&str, &str) {
    let base_len = type_name.find('<').unwrap_or(type_name.len());
    match type_name[..base_len].rfind("::") {
        Some(i) => (&type_name[..i], &type_name[i + 2..]),
        None => ("", type_name),
    }
}

#[doc(hidden)]
#[macro_export]
macro_rules! __orm_field_tag {
    () => {
        ""
    };
    ($tag:literal) => {
        $tag
    };
}

/// Emits the struct of a [`model!`](crate::model) declaration, dropping the
/// `orm` tags and keeping every other field attribute
#[doc(hidden)]
#[macro_export]
macro_rules! __orm_struct {
    (@munch [$($head:tt)*] [$($done:tt)*]) => {
        $($head)* {
            $($done)*
        }
    };
    (@munch $head:tt [$($done:tt)*] #[orm($tag:literal)] $($rest:tt)*) => {
        $crate::__orm_struct! { @munch $head [$($done)*] $($rest)* }
    };
    (@munch $head:tt [$($done:tt)*] #[$($attr:tt)*] $($rest:tt)*) => {
        $crate::__orm_struct! { @munch $head [$($done)* #[$($attr)*]] $($rest)* }
    };
    (@munch $head:tt [$($done:tt)*] $fvis:vis $field:ident : $ty:ty $(, $($rest:tt)*)?) => {
        $crate::__orm_struct! { @munch $head [$($done)* $fvis $field: $ty,] $($($rest)*)? }
    };
}

/// Chains one `.field(..)` call per declared field onto a descriptor
#[doc(hidden)]
#[macro_export]
macro_rules! __orm_describe_fields {
    ($descriptor:expr; $tag:tt;) => {
        $descriptor
    };
    ($descriptor:expr; $prev:tt; #[orm($tag:literal)] $($rest:tt)*) => {
        $crate::__orm_describe_fields!($descriptor; [$tag]; $($rest)*)
    };
    ($descriptor:expr; $tag:tt; #[$($attr:tt)*] $($rest:tt)*) => {
        $crate::__orm_describe_fields!($descriptor; $tag; $($rest)*)
    };
    ($descriptor:expr; [$($tag:literal)?]; $fvis:vis $field:ident : $ty:ty $(, $($rest:tt)*)?) => {
        $crate::__orm_describe_fields!(
            $descriptor.field($crate::descriptor::FieldDescriptor::of::<$ty>(
                stringify!($field),
                $crate::__orm_field_tag!($($tag)?),
            ));
            [];
            $($($rest)*)?
        )
    };
}

/// Declare a model struct and implement [`Model`] for it
///
/// Fields take an optional `#[orm("...")]` tag next to any other attribute.
///
/// ```
/// tagorm::model! {
///     #[derive(Debug, Default)]
///     pub struct Author {
///         #[orm("auto")]
///         pub id: i64,
///         /// Display name
///         #[orm("size(100);unique")]
///         pub name: String,
///     }
///     table_name = "authors";
/// }
///
/// use tagorm::Model;
/// let desc = Author::describe();
/// assert_eq!(desc.table_name.as_deref(), Some("authors"));
/// assert_eq!(desc.fields.len(), 2);
/// ```
#[macro_export]
macro_rules! model {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $($body:tt)*
        }
        $(table_name = $table:expr;)?
        $(engine = $engine:expr;)?
        $(index = [$([$($icol:expr),* $(,)?]),* $(,)?];)?
        $(unique = [$([$($ucol:expr),* $(,)?]),* $(,)?];)?
    ) => {
        $crate::__orm_struct! {
            @munch [$(#[$meta])* $vis struct $name] [] $($body)*
        }

        impl $crate::descriptor::Model for $name {
            fn describe() -> $crate::descriptor::ModelDescriptor {
                let descriptor = $crate::descriptor::ModelDescriptor::of::<$name>();
                $(let descriptor = descriptor.table($table);)?
                $(let descriptor = descriptor.engine($engine);)?
                $($(let descriptor = descriptor.index(&[$($icol),*]);)*)?
                $($(let descriptor = descriptor.unique(&[$($ucol),*]);)*)?
                $crate::__orm_describe_fields!(descriptor; []; $($body)*)
            }
        }
    };
}
