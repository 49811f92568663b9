//! Table and column metadata built at registration time and cross-linked by
//! bootstrap

pub mod field;
pub mod model;

pub use field::{FieldInfo, FieldKind, Fields, OnDelete, RelationKind};
pub use model::ModelInfo;

/// Position of a model in its registry (insertion order)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModelId(pub usize);

/// Position of a field inside a model of the same registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldId {
    pub model: ModelId,
    pub index: usize,
}

impl FieldId {
    pub fn new(model: ModelId, index: usize) -> Self {
        Self { model, index }
    }
}

/// Named handle to a field that another field is paired with
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldLink {
    pub name: String,
    pub id: FieldId,
}

impl FieldLink {
    pub fn new(name: impl Into<String>, id: FieldId) -> Self {
        Self {
            name: name.into(),
            id,
        }
    }
}

impl std::fmt::Display for ModelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}
