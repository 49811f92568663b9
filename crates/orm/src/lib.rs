//! # tagorm: model registry, relation bootstrap and DDL generation
//!
//! Structs are described once (usually through [`model!`]), registered into a
//! [`ModelRegistry`], cross-linked by a single [`ModelRegistry::bootstrap`]
//! and then read concurrently, for example by the [`SchemaGenerator`] to
//! produce `CREATE TABLE`/`DROP TABLE`/`CREATE INDEX` statements for one of
//! the supported [`Driver`]s.
//!
//! ```
//! use tagorm::{Driver, ModelRegistry, SchemaGenerator};
//!
//! tagorm::model! {
//!     pub struct User {
//!         pub id: i64,
//!         #[orm("size(40);unique")]
//!         pub name: String,
//!     }
//! }
//!
//! let registry = ModelRegistry::new();
//! tagorm::register_models!(registry => User).unwrap();
//!
//! let sql = SchemaGenerator::new(&registry)
//!     .create_statements(Driver::SQLite)
//!     .unwrap();
//! assert!(sql[0].contains("CREATE TABLE IF NOT EXISTS `user`"));
//! ```

pub mod bootstrap;
pub mod config;
pub mod descriptor;
pub mod dialect;
pub mod error;
pub mod metadata;
pub mod naming;
pub mod registry;
pub mod schema;
pub mod tags;

pub use bootstrap::BootstrapSummary;
pub use config::OrmConfig;
pub use descriptor::{FieldDescriptor, FieldShape, FieldType, Model, ModelDescriptor, ShapeKind};
pub use dialect::{DialectTypeMap, Driver};
pub use error::{
    ConfigError, LifecycleError, OrmError, OrmResult, RegistrationError, ResolutionError,
    SchemaError,
};
pub use metadata::{
    FieldId, FieldInfo, FieldKind, FieldLink, Fields, ModelId, ModelInfo, OnDelete, RelationKind,
};
pub use naming::NameStrategy;
pub use registry::{
    global_registry, register_model, register_model_with_prefix, register_model_with_suffix,
    reset_model_cache, ModelRegistry, RegistryView,
};
pub use schema::{SchemaGenerator, TableDdl};
pub use tags::{OrmTagParser, ParsedTag, TagParser};
